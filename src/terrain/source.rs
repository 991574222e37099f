//! Terrain sources: where raw elevation and water data come from

use super::{BuildArea, GridCell, Raster};
use crate::errors::{PlannerError, PlannerResult};
use std::collections::HashSet;

/// Raw rasters for one build area, as delivered by a terrain source
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSample {
    /// Surface height ignoring leaves (trees still included)
    pub surface: Raster<i32>,
    /// Height of the top solid block, below any water column
    pub ocean_floor: Raster<i32>,
}

impl TerrainSample {
    pub fn new(surface: Raster<i32>, ocean_floor: Raster<i32>) -> PlannerResult<Self> {
        if !surface.same_shape(&ocean_floor) {
            return Err(PlannerError::InvalidTerrain {
                reason: format!(
                    "Surface raster {}x{} does not match ocean floor raster {}x{}",
                    surface.width(),
                    surface.depth(),
                    ocean_floor.width(),
                    ocean_floor.depth()
                ),
            });
        }
        Ok(Self {
            surface,
            ocean_floor,
        })
    }
}

/// Supplies height and water rasters for a rectangular region.
///
/// Queried once per planning run.
pub trait TerrainSource {
    /// Global extent this source can answer for
    fn bounds(&self) -> BuildArea;

    /// Sample the rasters for `area`; dimensions must equal `area.dimensions()`
    fn sample(&self, area: &BuildArea) -> PlannerResult<TerrainSample>;

    /// Whether the block at local `cell`, height `y` is a tree trunk
    fn is_log(&self, _area: &BuildArea, _cell: GridCell, _y: i32) -> bool {
        false
    }
}

/// In-memory terrain source backed by full-extent rasters
#[derive(Debug, Clone)]
pub struct RasterTerrainSource {
    bounds: BuildArea,
    surface: Raster<i32>,
    ocean_floor: Raster<i32>,
    /// Log blocks in global (x, y, z)
    logs: HashSet<(i32, i32, i32)>,
}

impl RasterTerrainSource {
    /// Create a source whose rasters start at global (`origin_x`, `origin_z`)
    pub fn new(
        origin_x: i32,
        origin_z: i32,
        surface: Raster<i32>,
        ocean_floor: Raster<i32>,
    ) -> PlannerResult<Self> {
        let sample = TerrainSample::new(surface, ocean_floor)?;
        let bounds = BuildArea::new(
            origin_x,
            origin_z,
            origin_x + sample.surface.width() as i32,
            origin_z + sample.surface.depth() as i32,
        );
        Ok(Self {
            bounds,
            surface: sample.surface,
            ocean_floor: sample.ocean_floor,
            logs: HashSet::new(),
        })
    }

    /// Create a dry source of uniform height
    pub fn flat(width: u32, depth: u32, height: i32) -> Self {
        let surface = Raster::filled(width, depth, height);
        Self {
            bounds: BuildArea::new(0, 0, width as i32, depth as i32),
            ocean_floor: surface.clone(),
            surface,
            logs: HashSet::new(),
        }
    }

    /// Create a dry source from a height raster (ocean floor equals surface)
    pub fn dry(surface: Raster<i32>) -> Self {
        Self {
            bounds: BuildArea::new(0, 0, surface.width() as i32, surface.depth() as i32),
            ocean_floor: surface.clone(),
            surface,
            logs: HashSet::new(),
        }
    }

    /// Register a log block at global coordinates
    pub fn add_log(&mut self, x: i32, y: i32, z: i32) {
        self.logs.insert((x, y, z));
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    fn crop(&self, raster: &Raster<i32>, area: &BuildArea) -> PlannerResult<Raster<i32>> {
        let (width, depth) = area.dimensions().ok_or_else(|| PlannerError::InvalidTerrain {
            reason: format!("Build area {area:?} is empty"),
        })?;
        if !area.within(&self.bounds) {
            return Err(PlannerError::InvalidTerrain {
                reason: format!(
                    "Build area {area:?} lies outside terrain bounds {:?}",
                    self.bounds
                ),
            });
        }

        let offset_x = (area.start_x - self.bounds.start_x) as u32;
        let offset_z = (area.start_z - self.bounds.start_z) as u32;
        let mut cells = Vec::with_capacity((width as usize) * (depth as usize));
        for z in 0..depth {
            for x in 0..width {
                let source_cell = GridCell::new(x + offset_x, z + offset_z);
                let value = raster.value(source_cell).ok_or_else(|| PlannerError::InvalidTerrain {
                    reason: format!("Missing terrain data at {source_cell:?}"),
                })?;
                cells.push(value);
            }
        }
        Raster::from_vec(width, depth, cells)
    }
}

impl TerrainSource for RasterTerrainSource {
    fn bounds(&self) -> BuildArea {
        self.bounds
    }

    fn sample(&self, area: &BuildArea) -> PlannerResult<TerrainSample> {
        TerrainSample::new(
            self.crop(&self.surface, area)?,
            self.crop(&self.ocean_floor, area)?,
        )
    }

    fn is_log(&self, area: &BuildArea, cell: GridCell, y: i32) -> bool {
        let (x, z) = area.local_to_global(cell);
        self.logs.contains(&(x, y, z))
    }
}
