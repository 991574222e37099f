use crate::config::RouterConfig;
use crate::map::{BridgeSegment, RoadNetwork};
use crate::terrain::constants::{ASTAR_CARDINAL_COST, ASTAR_DIAGONAL_COST};
use crate::terrain::{GridCell, TerrainModel};
use bevy::log::debug;
use pathfinding::prelude::astar;

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

const CARDINAL_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// How a path step was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Flat,
    /// Elevated jump from the previous step
    Bridge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub cell: GridCell,
    pub kind: SegmentKind,
}

/// A path from a new building to the existing network, start first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub steps: Vec<PathStep>,
    pub cost: u32,
}

impl Route {
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.steps.iter().map(|step| step.cell)
    }

    /// (take-off, landing) pairs of every bridged step
    pub fn bridge_spans(&self) -> Vec<(GridCell, GridCell)> {
        self.steps
            .windows(2)
            .filter(|pair| pair[1].kind == SegmentKind::Bridge)
            .map(|pair| (pair[0].cell, pair[1].cell))
            .collect()
    }

    pub fn has_bridges(&self) -> bool {
        self.steps.iter().any(|step| step.kind == SegmentKind::Bridge)
    }
}

/// Octile distance in step-cost units
pub fn octile_distance(a: GridCell, b: GridCell) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dz = a.z.abs_diff(b.z);
    let (long, short) = if dx > dz { (dx, dz) } else { (dz, dx) };
    ASTAR_DIAGONAL_COST * short + ASTAR_CARDINAL_COST * (long - short)
}

/// Road cost multiplier for a height difference: 1 when level, `dh^dh` otherwise
pub fn slope_penalty(height_delta: u32) -> u32 {
    if height_delta == 0 {
        1
    } else {
        height_delta.saturating_pow(height_delta)
    }
}

/// Single-source road search over one snapshot of the network.
///
/// A fresh search runs per call; nothing but the borrowed network carries over.
pub struct Router<'a> {
    terrain: &'a TerrainModel,
    network: &'a RoadNetwork,
    config: &'a RouterConfig,
}

impl<'a> Router<'a> {
    pub fn new(terrain: &'a TerrainModel, network: &'a RoadNetwork, config: &'a RouterConfig) -> Self {
        Self {
            terrain,
            network,
            config,
        }
    }

    /// Cost of a flat road step between neighbouring cells, None if untraversable
    pub fn step_cost(&self, from: GridCell, to: GridCell) -> Option<u32> {
        let from_height = self.terrain.height_at(from)?;
        let to_height = self.terrain.height_at(to)?;
        if !self.terrain.is_land(to) {
            return None;
        }
        let height_delta = from_height.abs_diff(to_height);
        if height_delta > self.config.max_road_step.max(0) as u32 {
            return None;
        }
        if self.network.is_road(to) {
            return Some(0);
        }
        let base = if from.x != to.x && from.z != to.z {
            ASTAR_DIAGONAL_COST
        } else {
            ASTAR_CARDINAL_COST
        };
        Some(base.saturating_mul(slope_penalty(height_delta)))
    }

    fn flat_successors(&self, cell: GridCell) -> impl Iterator<Item = (GridCell, u32)> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dz)| {
            let neighbor = cell.offset(dx, dz)?;
            self.step_cost(cell, neighbor).map(|cost| (neighbor, cost))
        })
    }

    /// Shortest viable bridge in each cardinal direction whose flat step is blocked
    fn bridge_successors(&self, cell: GridCell) -> Vec<(GridCell, u32)> {
        let Some(deck) = self.terrain.height_at(cell) else {
            return Vec::new();
        };
        let probe_step = self.config.bridge_probe_step.max(1);
        let mut bridges = Vec::new();

        for &(dx, dz) in &CARDINAL_OFFSETS {
            let Some(next) = cell.offset(dx, dz) else {
                continue;
            };
            if !self.terrain.contains(next) || self.step_cost(cell, next).is_some() {
                continue;
            }

            let mut span = probe_step;
            while span <= self.config.max_bridge_span {
                let Some(landing) = cell.offset(dx * span as i32, dz * span as i32) else {
                    break;
                };
                if !self.terrain.contains(landing) {
                    break;
                }
                if self.terrain.is_land(landing) && self.terrain.height_at(landing) == Some(deck) {
                    if let Some(cost) = self.bridge_cost(cell, (dx, dz), span, deck) {
                        bridges.push((landing, cost));
                    }
                    break;
                }
                span += probe_step;
            }
        }
        bridges
    }

    /// Per intermediate cell: clearance to the deck plus the premium; then one step to land
    fn bridge_cost(&self, from: GridCell, (dx, dz): (i32, i32), span: u32, deck: i32) -> Option<u32> {
        let mut cost = ASTAR_CARDINAL_COST;
        for k in 1..span as i32 {
            let under = from.offset(dx * k, dz * k)?;
            let ground = self.terrain.height_at(under)?;
            cost = cost
                .saturating_add(deck.abs_diff(ground))
                .saturating_add(self.config.bridge_cell_premium);
        }
        Some(cost)
    }

    fn successors(&self, cell: GridCell) -> Vec<(GridCell, u32)> {
        let mut next: Vec<(GridCell, u32)> = self.flat_successors(cell).collect();
        next.extend(self.bridge_successors(cell));
        next
    }

    /// Search from `start` to the nearest road or building cell.
    ///
    /// `buildings` steer the heuristic (octile distance to the closest one).
    /// Returns None when the network cannot be reached.
    pub fn find_route(&self, start: GridCell, buildings: &[GridCell]) -> Option<Route> {
        if !self.terrain.contains(start) {
            return None;
        }
        let heuristic = |cell: &GridCell| {
            buildings
                .iter()
                .map(|target| octile_distance(*cell, *target))
                .min()
                .unwrap_or(0)
        };

        let (path, cost) = astar(
            &start,
            |cell| self.successors(*cell),
            heuristic,
            |cell| *cell != start && self.network.is_network(*cell),
        )?;

        let mut steps = Vec::with_capacity(path.len());
        let mut previous: Option<GridCell> = None;
        for cell in path {
            let kind = match previous {
                Some(prev) if prev.chebyshev_distance(&cell) > 1 => SegmentKind::Bridge,
                _ => SegmentKind::Flat,
            };
            steps.push(PathStep { cell, kind });
            previous = Some(cell);
        }
        Some(Route { steps, cost })
    }
}

/// Route from `start` and commit the result: every path cell joins the road
/// raster, every jump becomes a bridge segment at the take-off height.
pub fn connect(
    terrain: &TerrainModel,
    network: &mut RoadNetwork,
    bridges: &mut Vec<BridgeSegment>,
    config: &RouterConfig,
    start: GridCell,
    buildings: &[GridCell],
) -> Option<Route> {
    let route = Router::new(terrain, network, config).find_route(start, buildings)?;

    let added = route.cells().filter(|cell| network.mark_road(*cell)).count();
    let mut new_bridges = 0;
    for (take_off, landing) in route.bridge_spans() {
        let Some(deck) = terrain.height_at(take_off) else {
            continue;
        };
        if let Some(segment) = BridgeSegment::between(take_off, landing, deck) {
            bridges.push(segment);
            new_bridges += 1;
        }
    }
    debug!(
        "Routed {:?}: {} steps, cost {}, {} new road cells, {} bridges",
        start,
        route.steps.len(),
        route.cost,
        added,
        new_bridges
    );
    Some(route)
}
