//! Planning run orchestration: one [`PlanningContext`] per run owns every piece
//! of mutable state (random source, road network, placed buildings).

use crate::config::PlannerConfig;
use crate::encyclopedia::Encyclopedia;
use crate::errors::PlannerResult;
use crate::map::{RoadNetwork, VillagePlan};
use crate::map::dressing::{dress_roads, plan_foundation};
use crate::terrain::{BuildArea, TerrainModel, TerrainSource};
use bevy::log::{info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg64;

pub mod site_selector;

pub use site_selector::{SelectionReport, SiteSelector, TrialOutcome};

/// Everything a planning run reads or mutates
pub struct PlanningContext {
    pub terrain: TerrainModel,
    pub encyclopedia: Encyclopedia,
    pub config: PlannerConfig,
    pub rng: Pcg64,
    pub plan: VillagePlan,
}

impl PlanningContext {
    /// Start a run over an analysed terrain; the random source is seeded from the config
    pub fn new(
        terrain: TerrainModel,
        encyclopedia: Encyclopedia,
        config: PlannerConfig,
        area: BuildArea,
    ) -> Self {
        let mut plan = VillagePlan::empty(area, encyclopedia.names());
        plan.network = RoadNetwork::new(terrain.width(), terrain.depth());
        Self {
            rng: Pcg64::seed_from_u64(config.seed),
            terrain,
            encyclopedia,
            config,
            plan,
        }
    }

    pub fn from_source(
        source: &dyn TerrainSource,
        area: BuildArea,
        config: &PlannerConfig,
    ) -> PlannerResult<Self> {
        let encyclopedia = Encyclopedia::from_config(config)?;
        let terrain = TerrainModel::from_source(source, &area, config.slope_threshold)?;
        Ok(Self::new(terrain, encyclopedia, config.clone(), area))
    }

    /// Derive foundations and road dressing, then hand over the plan
    pub fn finish(self) -> VillagePlan {
        let mut plan = self.plan;
        plan.foundations = plan
            .buildings
            .iter()
            .filter_map(|building| {
                let footprint = self.encyclopedia.archetype(building.archetype)?.footprint;
                plan_foundation(&self.terrain.heights, building.position, footprint)
            })
            .collect();
        plan.road_tiles = dress_roads(plan.network.roads(), self.config.lamp_spacing);
        plan
    }
}

/// Plan a village over `area` of `source`.
///
/// Configuration problems are errors. An empty or out-of-bounds area and a
/// goal of zero produce an empty plan, as does a run that exhausts its retry
/// budget before placing anything.
pub fn plan_village(
    source: &dyn TerrainSource,
    area: BuildArea,
    config: &PlannerConfig,
) -> PlannerResult<VillagePlan> {
    config.check()?;
    let encyclopedia = Encyclopedia::from_config(config)?;

    if area.is_empty() || !area.within(&source.bounds()) {
        warn!(
            "Build area {:?} is empty or outside terrain bounds {:?}; returning an empty plan",
            area,
            source.bounds()
        );
        return Ok(VillagePlan::empty(area, encyclopedia.names()));
    }
    if config.goal_buildings == 0 {
        info!("Goal is zero buildings; returning an empty plan");
        return Ok(VillagePlan::empty(area, encyclopedia.names()));
    }

    let terrain = TerrainModel::from_source(source, &area, config.slope_threshold)?;
    let mut context = PlanningContext::new(terrain, encyclopedia, config.clone(), area);
    let report = SiteSelector::new(&mut context).seed_buildings();

    let plan = context.finish();
    info!(
        "Plan finished: {}/{} buildings after {} trials, {} road cells, {} bridges, {} unreachable",
        plan.buildings.len(),
        config.goal_buildings,
        report.trials,
        plan.network.road_cell_count(),
        plan.bridges.len(),
        plan.unreachable_count()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::range_types::RetryMultiplier;
    use crate::map::Connection;
    use crate::terrain::{GridCell, Raster, RasterTerrainSource};
    use std::collections::{HashSet, VecDeque};

    fn flat_config(goal: u32, seed: u64) -> PlannerConfig {
        PlannerConfig {
            goal_buildings: goal,
            seed,
            ..PlannerConfig::default()
        }
    }

    /// Cells reachable from `start` over 8-connected road or building cells
    fn network_component(plan: &VillagePlan, start: GridCell) -> HashSet<GridCell> {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    let Some(next) = cell.offset(dx, dz) else {
                        continue;
                    };
                    if plan.network.is_network(next) && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    #[test]
    fn test_flat_region_places_three_connected_buildings() {
        let source = RasterTerrainSource::flat(50, 50, 64);
        let area = BuildArea::new(0, 0, 50, 50);
        let plan = plan_village(&source, area, &flat_config(3, 11)).unwrap();

        assert_eq!(plan.buildings.len(), 3);
        assert_eq!(plan.buildings[0].connection, Connection::Root);
        assert!(plan.buildings[1..].iter().all(|b| b.connection == Connection::Connected));
        assert!(plan.bridges.is_empty());

        for (i, a) in plan.buildings.iter().enumerate() {
            for b in &plan.buildings[i + 1..] {
                let distance = a.position.distance(&b.position);
                assert!((7.0..=100.0).contains(&distance), "distance {distance}");
            }
        }

        let component = network_component(&plan, plan.buildings[0].position);
        for building in &plan.buildings {
            assert!(component.contains(&building.position));
        }
        assert_eq!(plan.foundations.len(), 3);
        assert_eq!(plan.road_tiles.len(), plan.network.road_cell_count());
    }

    #[test]
    fn test_accepted_sites_have_clearance() {
        let source = RasterTerrainSource::flat(50, 50, 64);
        let area = BuildArea::new(0, 0, 50, 50);
        let plan = plan_village(&source, area, &flat_config(4, 5)).unwrap();
        // Default archetypes use radius 7, so centres stay 6 cells from the border
        for building in &plan.buildings {
            assert!((6..=43).contains(&building.position.x));
            assert!((6..=43).contains(&building.position.z));
        }
    }

    #[test]
    fn test_same_seed_same_plan() {
        let heights = Raster::from_fn(60, 60, |cell| 64 + ((cell.x / 12 + cell.z / 15) % 3) as i32);
        let source = RasterTerrainSource::dry(heights);
        let area = BuildArea::new(0, 0, 60, 60);
        let config = flat_config(5, 1234);

        let first = plan_village(&source, area, &config).unwrap();
        let second = plan_village(&source, area, &config).unwrap();
        assert_eq!(first, second);

        let first_bytes = bincode::serde::encode_to_vec(&first, bincode::config::standard()).unwrap();
        let second_bytes = bincode::serde::encode_to_vec(&second, bincode::config::standard()).unwrap();
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let source = RasterTerrainSource::flat(50, 50, 64);
        let area = BuildArea::new(0, 0, 50, 50);
        let a = plan_village(&source, area, &flat_config(3, 1)).unwrap();
        let b = plan_village(&source, area, &flat_config(3, 2)).unwrap();
        assert_ne!(a.buildings, b.buildings);
    }

    #[test]
    fn test_zero_goal_returns_empty_plan() {
        let source = RasterTerrainSource::flat(50, 50, 64);
        let area = BuildArea::new(0, 0, 50, 50);
        let plan = plan_village(&source, area, &flat_config(0, 3)).unwrap();
        assert!(plan.buildings.is_empty());
        assert_eq!(plan.network.road_cell_count(), 0);
        assert_eq!(plan.network.width(), 50);
    }

    #[test]
    fn test_area_outside_terrain_returns_empty_plan() {
        let source = RasterTerrainSource::flat(50, 50, 64);
        let plan = plan_village(&source, BuildArea::new(40, 40, 90, 90), &flat_config(3, 3)).unwrap();
        assert!(plan.buildings.is_empty());

        let plan = plan_village(&source, BuildArea::new(10, 10, 10, 30), &flat_config(3, 3)).unwrap();
        assert!(plan.buildings.is_empty());
    }

    #[test]
    fn test_unbuildable_terrain_exhausts_budget() {
        // Ridges every other column: slope everywhere exceeds the threshold
        let heights = Raster::from_fn(30, 30, |cell| if cell.x % 2 == 0 { 64 } else { 70 });
        let source = RasterTerrainSource::dry(heights);
        let mut config = flat_config(2, 9);
        config.retry_multiplier = RetryMultiplier::new(10);
        let plan = plan_village(&source, BuildArea::new(0, 0, 30, 30), &config).unwrap();
        assert!(plan.buildings.is_empty());
    }

    #[test]
    fn test_malformed_interest_table_fails() {
        let source = RasterTerrainSource::flat(50, 50, 64);
        let mut config = flat_config(3, 3);
        config.interest.pop();
        assert!(plan_village(&source, BuildArea::new(0, 0, 50, 50), &config).is_err());
    }

    #[test]
    fn test_plan_uses_global_area_offset() {
        let surface = Raster::filled(50, 50, 64);
        let source = RasterTerrainSource::new(1000, -500, surface.clone(), surface).unwrap();
        let area = BuildArea::new(1000, -500, 1050, -450);
        let plan = plan_village(&source, area, &flat_config(2, 8)).unwrap();
        assert_eq!(plan.buildings.len(), 2);
        for (building, (x, z)) in plan.global_positions() {
            assert_eq!(x, 1000 + building.position.x as i32);
            assert_eq!(z, -500 + building.position.z as i32);
        }
    }
}
