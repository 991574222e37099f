use super::PlanningContext;
use crate::config::UnreachablePolicy;
use crate::encyclopedia::{ArchetypeId, Suitability};
use crate::map::{Connection, PlacedBuilding};
use crate::pathfinding::connect;
use crate::terrain::GridCell;
use bevy::log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

/// Result of one candidate trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Candidate cell is not buildable or already part of the network
    Unbuildable,
    /// No archetype has enough buildable clearance around the cell
    NoClearance,
    /// Every archetype with clearance violates a spacing bound
    Unsuitable,
    /// Scored, but the acceptance draw fell short
    Declined,
    /// Accepted, but no road could reach the network and the policy discards it
    Unreachable,
    Accepted {
        archetype: ArchetypeId,
        connection: Connection,
    },
}

impl TrialOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TrialOutcome::Accepted { .. })
    }
}

/// Tally of one selection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReport {
    pub trials: u64,
    pub accepted: u32,
    pub unbuildable: u64,
    pub no_clearance: u64,
    pub unsuitable: u64,
    pub declined: u64,
    pub unreachable: u64,
    /// Stopped on the retry budget rather than the goal
    pub budget_exhausted: bool,
}

impl SelectionReport {
    fn record(&mut self, outcome: TrialOutcome) {
        self.trials += 1;
        match outcome {
            TrialOutcome::Unbuildable => self.unbuildable += 1,
            TrialOutcome::NoClearance => self.no_clearance += 1,
            TrialOutcome::Unsuitable => self.unsuitable += 1,
            TrialOutcome::Declined => self.declined += 1,
            TrialOutcome::Unreachable => self.unreachable += 1,
            TrialOutcome::Accepted { connection, .. } => {
                self.accepted += 1;
                if connection == Connection::Unreachable {
                    self.unreachable += 1;
                }
            }
        }
    }
}

/// Stochastic accept/reject placement loop over a planning context
pub struct SiteSelector<'a> {
    context: &'a mut PlanningContext,
    priority_groups: Vec<Vec<ArchetypeId>>,
}

impl<'a> SiteSelector<'a> {
    pub fn new(context: &'a mut PlanningContext) -> Self {
        let priority_groups = context.encyclopedia.priority_groups();
        Self {
            context,
            priority_groups,
        }
    }

    /// Sample until the goal is met or `goal * retry_multiplier` consecutive trials fail
    pub fn seed_buildings(&mut self) -> SelectionReport {
        let goal = self.context.config.goal_buildings as usize;
        let budget = self
            .context
            .config
            .retry_multiplier
            .budget_for(self.context.config.goal_buildings);
        let mut report = SelectionReport::default();
        let mut consecutive_failures = 0u64;

        while self.context.plan.buildings.len() < goal {
            if consecutive_failures >= budget {
                warn!(
                    "Retry budget of {budget} trials exhausted with {}/{goal} buildings placed",
                    self.context.plan.buildings.len()
                );
                report.budget_exhausted = true;
                break;
            }
            let outcome = self.run_trial();
            if outcome.is_accepted() {
                consecutive_failures = 0;
            } else {
                consecutive_failures += 1;
            }
            report.record(outcome);
        }

        debug!("Selection finished: {report:?}");
        report
    }

    /// Draw one candidate cell and try to place a building there
    pub fn run_trial(&mut self) -> TrialOutcome {
        let (width, depth) = (self.context.terrain.width(), self.context.terrain.depth());
        if width == 0 || depth == 0 {
            return TrialOutcome::Unbuildable;
        }
        let cell = GridCell::new(
            self.context.rng.gen_range(0..width),
            self.context.rng.gen_range(0..depth),
        );
        if !self.context.terrain.is_buildable(cell) || self.context.plan.network.is_network(cell) {
            return TrialOutcome::Unbuildable;
        }

        let mut any_clearance = false;
        for archetype in self.archetype_order() {
            let Some(radius) = self
                .context
                .encyclopedia
                .archetype(archetype)
                .map(|a| a.exclusion_radius.get())
            else {
                continue;
            };
            if !self.has_clearance(cell, radius) {
                continue;
            }
            any_clearance = true;

            let suitability =
                self.context
                    .encyclopedia
                    .score_site(archetype, cell, &self.context.plan.buildings);
            let Suitability::Score(score) = suitability else {
                continue;
            };
            let draw = self.context.rng.gen_range(score..=1.0);
            if draw < self.context.config.accept_threshold.get() {
                return TrialOutcome::Declined;
            }
            return self.accept(cell, archetype);
        }

        if any_clearance {
            TrialOutcome::Unsuitable
        } else {
            TrialOutcome::NoClearance
        }
    }

    /// Priority groups in descending order, each shuffled with the run's random source
    fn archetype_order(&mut self) -> Vec<ArchetypeId> {
        let mut order = Vec::new();
        for group in &self.priority_groups {
            let mut group = group.clone();
            group.shuffle(&mut self.context.rng);
            order.extend(group);
        }
        order
    }

    /// Every cell with |dx| < radius and |dz| < radius is inside the grid and buildable
    fn has_clearance(&self, cell: GridCell, radius: u32) -> bool {
        let reach = radius.saturating_sub(1) as i32;
        for dz in -reach..=reach {
            for dx in -reach..=reach {
                let buildable = cell
                    .offset(dx, dz)
                    .is_some_and(|neighbor| self.context.terrain.is_buildable(neighbor));
                if !buildable {
                    return false;
                }
            }
        }
        true
    }

    /// Route to the network (unless this is the first building), then record the building
    fn accept(&mut self, cell: GridCell, archetype: ArchetypeId) -> TrialOutcome {
        let context = &mut *self.context;
        let connection = if context.plan.buildings.is_empty() {
            Connection::Root
        } else {
            let targets: Vec<GridCell> = context.plan.buildings.iter().map(|b| b.position).collect();
            let route = connect(
                &context.terrain,
                &mut context.plan.network,
                &mut context.plan.bridges,
                &context.config.router,
                cell,
                &targets,
            );
            match (route, context.config.unreachable) {
                (Some(_), _) => Connection::Connected,
                (None, UnreachablePolicy::Keep) => {
                    warn!("No road from {cell:?} reaches the network; keeping it disconnected");
                    Connection::Unreachable
                }
                (None, UnreachablePolicy::Discard) => {
                    warn!("No road from {cell:?} reaches the network; discarding the site");
                    return TrialOutcome::Unreachable;
                }
            }
        };

        context.plan.network.mark_occupied(cell);
        context.plan.buildings.push(PlacedBuilding {
            position: cell,
            archetype,
            connection,
        });
        info!(
            "Placed building {} ({}) at {:?}",
            context.plan.buildings.len(),
            context
                .encyclopedia
                .archetype(archetype)
                .map_or("?", |a| a.name.as_str()),
            cell
        );
        TrialOutcome::Accepted {
            archetype,
            connection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::config::range_types::{AcceptThreshold, SlopeThreshold};
    use crate::encyclopedia::Encyclopedia;
    use crate::terrain::{BuildArea, Raster, TerrainModel};

    fn context_for(heights: Raster<i32>, floor: Raster<i32>, config: PlannerConfig) -> PlanningContext {
        let area = BuildArea::new(0, 0, heights.width() as i32, heights.depth() as i32);
        let terrain = TerrainModel::from_rasters(heights, &floor, SlopeThreshold::new(2)).unwrap();
        let encyclopedia = Encyclopedia::from_config(&config).unwrap();
        PlanningContext::new(terrain, encyclopedia, config, area)
    }

    fn flat_context(size: u32, config: PlannerConfig) -> PlanningContext {
        let heights = Raster::filled(size, size, 64);
        context_for(heights.clone(), heights, config)
    }

    /// Two dry strips separated by water far wider than any bridge
    fn islands_context(config: PlannerConfig) -> PlanningContext {
        let heights = Raster::filled(60, 20, 62);
        let floor = Raster::from_fn(60, 20, |cell| if (15..45).contains(&cell.x) { 40 } else { 62 });
        context_for(heights, floor, config)
    }

    #[test]
    fn test_clearance_square() {
        let heights = Raster::filled(20, 20, 64);
        let floor = Raster::from_fn(20, 20, |cell| if cell == GridCell::new(10, 14) { 50 } else { 64 });
        let mut context = context_for(heights, floor, PlannerConfig::default());
        let selector = SiteSelector::new(&mut context);

        // Water at dz = 7 is just outside the square, at dz = 6 just inside
        assert!(selector.has_clearance(GridCell::new(10, 7), 7));
        assert!(!selector.has_clearance(GridCell::new(10, 8), 7));
        // Grid edge
        assert!(!selector.has_clearance(GridCell::new(3, 10), 7));
        assert!(selector.has_clearance(GridCell::new(6, 6), 7));
        assert!(selector.has_clearance(GridCell::new(0, 0), 1));
    }

    #[test]
    fn test_archetype_order_respects_priority() {
        let mut context = flat_context(20, PlannerConfig::default());
        let house = context.encyclopedia.lookup("small_house").unwrap();
        let farm = context.encyclopedia.lookup("farm").unwrap();
        let mut selector = SiteSelector::new(&mut context);
        for _ in 0..10 {
            assert_eq!(selector.archetype_order(), vec![house, farm]);
        }
    }

    #[test]
    fn test_first_building_is_root() {
        let mut context = flat_context(30, PlannerConfig::default());
        let house = context.encyclopedia.lookup("small_house").unwrap();
        let outcome = SiteSelector::new(&mut context).accept(GridCell::new(15, 15), house);
        assert_eq!(
            outcome,
            TrialOutcome::Accepted {
                archetype: house,
                connection: Connection::Root
            }
        );
        assert!(context.plan.network.is_occupied(GridCell::new(15, 15)));
        assert_eq!(context.plan.network.road_cell_count(), 0);
    }

    #[test]
    fn test_second_building_gets_a_road() {
        let mut context = flat_context(40, PlannerConfig::default());
        let house = context.encyclopedia.lookup("small_house").unwrap();
        let mut selector = SiteSelector::new(&mut context);
        selector.accept(GridCell::new(10, 10), house);
        let outcome = selector.accept(GridCell::new(25, 10), house);
        assert!(outcome.is_accepted());
        assert!(context.plan.network.is_road(GridCell::new(18, 10)));
        assert_eq!(context.plan.buildings[1].connection, Connection::Connected);
    }

    #[test]
    fn test_unreachable_keep_policy() {
        let mut context = islands_context(PlannerConfig::default());
        let house = context.encyclopedia.lookup("small_house").unwrap();
        let mut selector = SiteSelector::new(&mut context);
        selector.accept(GridCell::new(5, 10), house);
        let outcome = selector.accept(GridCell::new(52, 10), house);
        assert_eq!(
            outcome,
            TrialOutcome::Accepted {
                archetype: house,
                connection: Connection::Unreachable
            }
        );
        assert_eq!(context.plan.buildings.len(), 2);
        assert_eq!(context.plan.unreachable_count(), 1);
    }

    #[test]
    fn test_unreachable_discard_policy() {
        let config = PlannerConfig {
            unreachable: UnreachablePolicy::Discard,
            ..PlannerConfig::default()
        };
        let mut context = islands_context(config);
        let house = context.encyclopedia.lookup("small_house").unwrap();
        let mut selector = SiteSelector::new(&mut context);
        selector.accept(GridCell::new(5, 10), house);
        let outcome = selector.accept(GridCell::new(52, 10), house);
        assert_eq!(outcome, TrialOutcome::Unreachable);
        assert_eq!(context.plan.buildings.len(), 1);
        assert!(!context.plan.network.is_occupied(GridCell::new(52, 10)));
    }

    #[test]
    fn test_road_raster_never_shrinks() {
        let config = PlannerConfig {
            goal_buildings: 6,
            seed: 77,
            ..PlannerConfig::default()
        };
        let mut context = flat_context(60, config);
        let mut selector = SiteSelector::new(&mut context);
        let mut previous = selector.context.plan.network.roads().clone();
        for _ in 0..3000 {
            selector.run_trial();
            let current = selector.context.plan.network.roads();
            for (cell, was_road) in previous.iter() {
                if *was_road {
                    assert_eq!(current.value(cell), Some(true));
                }
            }
            previous = current.clone();
            if selector.context.plan.buildings.len() >= 6 {
                break;
            }
        }
    }

    #[test]
    fn test_zero_threshold_accepts_first_scored_site() {
        let config = PlannerConfig {
            accept_threshold: AcceptThreshold::new(0.0),
            ..PlannerConfig::default()
        };
        let mut context = flat_context(30, config);
        let mut selector = SiteSelector::new(&mut context);
        let outcome = loop {
            let outcome = selector.run_trial();
            if !matches!(outcome, TrialOutcome::Unbuildable | TrialOutcome::NoClearance) {
                break outcome;
            }
        };
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_budget_counts_consecutive_failures() {
        let config = PlannerConfig {
            goal_buildings: 3,
            ..PlannerConfig::default()
        };
        // Too small for any clearance square
        let mut context = flat_context(8, config);
        let report = SiteSelector::new(&mut context).seed_buildings();
        assert!(report.budget_exhausted);
        assert_eq!(report.trials, 600);
        assert_eq!(report.accepted, 0);
        assert_eq!(report.no_clearance, 600);
    }
}
