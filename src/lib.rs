pub mod config;
pub mod diagnostics;
pub mod encyclopedia;
pub mod errors;
pub mod map;
pub mod pathfinding;
pub mod planning;
pub mod terrain;
pub mod terrain_generation;
pub mod world;

// Selective re-exports for external consumers

// Errors and configuration - every caller needs these
pub use config::PlannerConfig;
pub use errors::{PlannerError, PlannerResult};

// Planning entry points and the plan they produce
pub use map::{BridgeSegment, Connection, PlacedBuilding, VillagePlan};
pub use planning::{PlanningContext, plan_village};

// Collaborator contracts
pub use terrain::{BuildArea, GridCell, RasterTerrainSource, TerrainSource};
pub use world::{StructureCatalog, WorldWriter};
