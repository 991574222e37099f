/// Constants for terrain analysis and routing
/// Slope analysis window (cells per side, centred on the sampled cell)
pub const SLOPE_WINDOW: u32 = 5;
pub const DEFAULT_SLOPE_THRESHOLD: i32 = 2;

/// Lowest height the log-stripping pass will descend to
pub const WORLD_FLOOR_Y: i32 = -64;

/// Pathfinding constants
pub const ASTAR_CARDINAL_COST: u32 = 10;
pub const ASTAR_DIAGONAL_COST: u32 = 14;

/// Default values for road and bridge routing
pub const DEFAULT_MAX_ROAD_STEP: i32 = 2;
pub const DEFAULT_BRIDGE_PROBE_STEP: u32 = 3;
pub const DEFAULT_MAX_BRIDGE_SPAN: u32 = 15;
pub const DEFAULT_BRIDGE_CELL_PREMIUM: u32 = 20;

/// Default values for site selection
pub const DEFAULT_RETRY_MULTIPLIER: u32 = 200;
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.9;
pub const NEUTRAL_SITE_SCORE: f64 = 0.5;
pub const DEFAULT_LAMP_SPACING: u32 = 40;
pub const DEFAULT_FOOTPRINT: u32 = 5;
