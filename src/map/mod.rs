use crate::encyclopedia::ArchetypeId;
use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::{BuildArea, GridCell, Raster};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod dressing;

pub use dressing::{Foundation, RoadOrientation, RoadTile};

/// How a placed building joined the road network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connection {
    /// First building of the plan; nothing to connect to
    Root,
    Connected,
    /// Router exhausted the grid without reaching the network
    Unreachable,
}

/// A building accepted by the site selector. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBuilding {
    pub position: GridCell,
    pub archetype: ArchetypeId,
    pub connection: Connection,
}

/// Road raster plus the companion layer of cells occupied by buildings.
///
/// Both layers only ever grow during a planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadNetwork {
    roads: Raster<bool>,
    occupied: Raster<bool>,
}

impl RoadNetwork {
    pub fn new(width: u32, depth: u32) -> Self {
        Self {
            roads: Raster::filled(width, depth, false),
            occupied: Raster::filled(width, depth, false),
        }
    }

    pub fn width(&self) -> u32 {
        self.roads.width()
    }

    pub fn depth(&self) -> u32 {
        self.roads.depth()
    }

    /// Mark a road cell, returning true if it was newly added
    pub fn mark_road(&mut self, cell: GridCell) -> bool {
        match self.roads.get_mut(cell) {
            Some(value) if !*value => {
                *value = true;
                true
            }
            _ => false,
        }
    }

    pub fn mark_occupied(&mut self, cell: GridCell) -> bool {
        match self.occupied.get_mut(cell) {
            Some(value) if !*value => {
                *value = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_road(&self, cell: GridCell) -> bool {
        self.roads.value(cell).unwrap_or(false)
    }

    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.occupied.value(cell).unwrap_or(false)
    }

    /// Road or building cell: a valid place for a new road to end
    pub fn is_network(&self, cell: GridCell) -> bool {
        self.is_road(cell) || self.is_occupied(cell)
    }

    pub fn road_cell_count(&self) -> usize {
        self.roads.iter().filter(|(_, road)| **road).count()
    }

    pub fn roads(&self) -> &Raster<bool> {
        &self.roads
    }

    pub fn occupied(&self) -> &Raster<bool> {
        &self.occupied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeOrientation {
    AlongX,
    AlongZ,
}

/// One deck block of a bridge, in local x/z with absolute height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgePoint {
    pub x: u32,
    pub y: i32,
    pub z: u32,
}

/// Straight, level bridge between two dry-land cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSegment {
    pub points: Vec<BridgePoint>,
    pub orientation: BridgeOrientation,
}

impl BridgeSegment {
    /// Deck from `from` to `to` inclusive. None unless the endpoints share exactly one axis.
    pub fn between(from: GridCell, to: GridCell, deck: i32) -> Option<Self> {
        let orientation = if from.z == to.z && from.x != to.x {
            BridgeOrientation::AlongX
        } else if from.x == to.x && from.z != to.z {
            BridgeOrientation::AlongZ
        } else {
            return None;
        };

        let span = from.chebyshev_distance(&to) as i32;
        let (step_x, step_z) = match orientation {
            BridgeOrientation::AlongX => ((to.x as i64 - from.x as i64).signum() as i32, 0),
            BridgeOrientation::AlongZ => (0, (to.z as i64 - from.z as i64).signum() as i32),
        };
        let points = (0..=span)
            .filter_map(|k| from.offset(step_x * k, step_z * k))
            .map(|cell| BridgePoint {
                x: cell.x,
                y: deck,
                z: cell.z,
            })
            .collect();
        Some(Self {
            points,
            orientation,
        })
    }

    pub fn height(&self) -> Option<i32> {
        self.points.first().map(|p| p.y)
    }

    pub fn start(&self) -> Option<GridCell> {
        self.points.first().map(|p| GridCell::new(p.x, p.z))
    }

    pub fn end(&self) -> Option<GridCell> {
        self.points.last().map(|p| GridCell::new(p.x, p.z))
    }
}

/// Complete planner output handed to a world writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillagePlan {
    /// Global region the local grid is anchored to
    pub area: BuildArea,
    /// Archetype names indexed by `ArchetypeId`
    pub archetype_names: Vec<String>,
    /// In acceptance order
    pub buildings: Vec<PlacedBuilding>,
    pub network: RoadNetwork,
    pub bridges: Vec<BridgeSegment>,
    /// One per building, same order
    pub foundations: Vec<Foundation>,
    pub road_tiles: Vec<RoadTile>,
}

impl VillagePlan {
    /// A plan with no buildings over `area` (zero-sized grid if the area is empty)
    pub fn empty(area: BuildArea, archetype_names: Vec<String>) -> Self {
        let (width, depth) = area.dimensions().unwrap_or((0, 0));
        Self {
            area,
            archetype_names,
            buildings: Vec::new(),
            network: RoadNetwork::new(width, depth),
            bridges: Vec::new(),
            foundations: Vec::new(),
            road_tiles: Vec::new(),
        }
    }

    pub fn archetype_name(&self, building: &PlacedBuilding) -> Option<&str> {
        self.archetype_names
            .get(building.archetype.index())
            .map(String::as_str)
    }

    /// Buildings with their global x/z coordinates
    pub fn global_positions(&self) -> impl Iterator<Item = (&PlacedBuilding, (i32, i32))> + '_ {
        self.buildings
            .iter()
            .map(|b| (b, self.area.local_to_global(b.position)))
    }

    pub fn unreachable_count(&self) -> usize {
        self.buildings
            .iter()
            .filter(|b| b.connection == Connection::Unreachable)
            .count()
    }

    /// Check internal consistency of a plan read from disk
    pub fn check_consistency(&self) -> PlannerResult<()> {
        let (width, depth) = self.area.dimensions().unwrap_or((0, 0));
        if self.network.width() != width || self.network.depth() != depth {
            return Err(PlannerError::CorruptedPlanFile {
                reason: format!(
                    "Road raster {}x{} does not match build area {}x{}",
                    self.network.width(),
                    self.network.depth(),
                    width,
                    depth
                ),
            });
        }
        for building in &self.buildings {
            if !self.network.roads().contains(building.position) {
                return Err(PlannerError::CorruptedPlanFile {
                    reason: format!("Building at {:?} lies outside the grid", building.position),
                });
            }
            if building.archetype.index() >= self.archetype_names.len() {
                return Err(PlannerError::CorruptedPlanFile {
                    reason: format!("Unknown archetype id {}", building.archetype),
                });
            }
        }
        Ok(())
    }

    /// Get the plans directory path
    pub fn get_plans_dir() -> PlannerResult<PathBuf> {
        std::env::current_dir()
            .map_err(PlannerError::Io)
            .map(|dir| dir.join("plans"))
    }

    /// Load a plan from the plans directory
    pub fn load_from_file<P: AsRef<Path>>(filename: P) -> PlannerResult<Self> {
        let plans_dir = Self::get_plans_dir()?;
        Self::load_from_path(plans_dir.join(filename))
    }

    /// Save the plan to the plans directory
    pub fn save_to_file<P: AsRef<Path>>(&self, filename: P) -> PlannerResult<PathBuf> {
        let plans_dir = Self::get_plans_dir()?;
        let file_path = plans_dir.join(filename);
        self.save_to_path(&file_path)?;
        Ok(file_path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let file_path = path.as_ref();
        if !file_path.exists() {
            return Err(PlannerError::PlanFileNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let data = std::fs::read(file_path)?;
        let (plan, _): (VillagePlan, usize) =
            bincode::serde::decode_from_slice(&data, bincode::config::standard()).map_err(|e| {
                PlannerError::CorruptedPlanFile {
                    reason: format!("Failed to deserialize plan data: {e}"),
                }
            })?;

        plan.check_consistency()?;
        Ok(plan)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> PlannerResult<()> {
        let file_path = path.as_ref();
        // Create parent directories for the file path if they don't exist
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data =
            bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
                PlannerError::CorruptedPlanFile {
                    reason: format!("Failed to serialize plan: {e}"),
                }
            })?;

        std::fs::write(file_path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_network_only_grows() {
        let mut network = RoadNetwork::new(4, 4);
        let cell = GridCell::new(1, 2);
        assert!(network.mark_road(cell));
        assert!(!network.mark_road(cell));
        assert!(network.is_road(cell));
        assert!(!network.mark_road(GridCell::new(9, 9)));
        assert_eq!(network.road_cell_count(), 1);
    }

    #[test]
    fn test_network_includes_occupied_cells() {
        let mut network = RoadNetwork::new(4, 4);
        let cell = GridCell::new(3, 3);
        assert!(!network.is_network(cell));
        network.mark_occupied(cell);
        assert!(network.is_network(cell));
        assert!(!network.is_road(cell));
    }

    #[test]
    fn test_bridge_between_along_x() {
        let bridge = BridgeSegment::between(GridCell::new(8, 2), GridCell::new(5, 2), 70).unwrap();
        assert_eq!(bridge.orientation, BridgeOrientation::AlongX);
        assert_eq!(bridge.points.len(), 4);
        assert_eq!(bridge.start(), Some(GridCell::new(8, 2)));
        assert_eq!(bridge.end(), Some(GridCell::new(5, 2)));
        assert!(bridge.points.iter().all(|p| p.y == 70 && p.z == 2));
    }

    #[test]
    fn test_bridge_between_along_z() {
        let bridge = BridgeSegment::between(GridCell::new(1, 0), GridCell::new(1, 6), 64).unwrap();
        assert_eq!(bridge.orientation, BridgeOrientation::AlongZ);
        assert_eq!(bridge.height(), Some(64));
        assert_eq!(bridge.points.len(), 7);
    }

    #[test]
    fn test_bridge_between_rejects_diagonal() {
        assert!(BridgeSegment::between(GridCell::new(0, 0), GridCell::new(3, 3), 64).is_none());
        assert!(BridgeSegment::between(GridCell::new(2, 2), GridCell::new(2, 2), 64).is_none());
    }

    #[test]
    fn test_empty_plan_over_empty_area() {
        let plan = VillagePlan::empty(BuildArea::new(5, 5, 5, 9), vec![]);
        assert!(plan.buildings.is_empty());
        assert_eq!(plan.network.width(), 0);
        assert!(plan.check_consistency().is_ok());
    }

    #[test]
    fn test_plan_file_round_trip() {
        let mut plan = VillagePlan::empty(BuildArea::new(100, 100, 110, 108), vec!["farm".into()]);
        plan.buildings.push(PlacedBuilding {
            position: GridCell::new(4, 4),
            archetype: ArchetypeId::new(0),
            connection: Connection::Root,
        });
        plan.network.mark_occupied(GridCell::new(4, 4));
        plan.network.mark_road(GridCell::new(5, 4));

        let dir = std::env::temp_dir().join(format!("village_planner_plan_{}", std::process::id()));
        let path = dir.join("nested").join("plan.bin");
        plan.save_to_path(&path).unwrap();
        let loaded = VillagePlan::load_from_path(&path).unwrap();
        assert_eq!(loaded, plan);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_plan_file() {
        assert!(matches!(
            VillagePlan::load_from_path("/nonexistent/plan.bin"),
            Err(PlannerError::PlanFileNotFound { .. })
        ));
    }

    #[test]
    fn test_inconsistent_plan_rejected() {
        let mut plan = VillagePlan::empty(BuildArea::new(0, 0, 4, 4), vec!["farm".into()]);
        plan.buildings.push(PlacedBuilding {
            position: GridCell::new(1, 1),
            archetype: ArchetypeId::new(3),
            connection: Connection::Root,
        });
        assert!(plan.check_consistency().is_err());
    }
}
