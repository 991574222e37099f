//! Terrain analysis: tree-stripped heights and the buildability mask

use super::constants::{SLOPE_WINDOW, WORLD_FLOOR_Y};
use super::source::{TerrainSample, TerrainSource};
use super::{BuildArea, GridCell, Raster};
use crate::config::range_types::SlopeThreshold;
use crate::errors::{PlannerError, PlannerResult};
use bevy::log::{debug, info};

/// Strip tree trunks from a raw surface raster.
///
/// For each cell, the height is lowered while the block just below it is a log.
/// Cells without logs keep their original height.
pub fn derive_buildable_height(
    raw: &Raster<i32>,
    is_log: impl Fn(GridCell, i32) -> bool,
) -> Raster<i32> {
    Raster::from_fn(raw.width(), raw.depth(), |cell| {
        let original = raw.value(cell).unwrap_or(WORLD_FLOOR_Y);
        let mut height = original;
        while height > WORLD_FLOOR_Y && is_log(cell, height - 1) {
            height -= 1;
        }
        height.min(original)
    })
}

/// Dry-land flag per cell: the ocean floor reaches the surface
pub fn derive_land_mask(heights: &Raster<i32>, ocean_floor: &Raster<i32>) -> PlannerResult<Raster<bool>> {
    ensure_same_shape(heights, ocean_floor, "ocean floor")?;
    Ok(Raster::from_fn(heights.width(), heights.depth(), |cell| {
        match (ocean_floor.value(cell), heights.value(cell)) {
            (Some(floor), Some(height)) => floor >= height,
            _ => false,
        }
    }))
}

/// Local slope as (max - min) height over a square window centred on each cell.
///
/// The window is clipped at the raster edges.
pub fn local_slope(heights: &Raster<i32>, window: u32) -> Raster<i32> {
    let radius = window / 2;
    Raster::from_fn(heights.width(), heights.depth(), |cell| {
        let mut min = i32::MAX;
        let mut max = i32::MIN;
        for neighbor in heights.window(cell, radius) {
            if let Some(height) = heights.value(neighbor) {
                min = min.min(height);
                max = max.max(height);
            }
        }
        if min > max { 0 } else { max - min }
    })
}

/// A cell is buildable iff its local slope is within `threshold` and it is dry land
pub fn derive_buildability_mask(
    heights: &Raster<i32>,
    land: &Raster<bool>,
    threshold: SlopeThreshold,
) -> PlannerResult<Raster<bool>> {
    ensure_same_shape(heights, land, "land mask")?;
    let slope = local_slope(heights, SLOPE_WINDOW);
    Ok(Raster::from_fn(heights.width(), heights.depth(), |cell| {
        let flat_enough = slope.value(cell).is_some_and(|s| s <= threshold.get());
        flat_enough && land.value(cell).unwrap_or(false)
    }))
}

fn ensure_same_shape<A, B>(a: &Raster<A>, b: &Raster<B>, what: &str) -> PlannerResult<()> {
    if a.same_shape(b) {
        return Ok(());
    }
    Err(PlannerError::InvalidTerrain {
        reason: format!(
            "Height raster {}x{} does not match {what} raster {}x{}",
            a.width(),
            a.depth(),
            b.width(),
            b.depth()
        ),
    })
}

/// Static terrain rasters for one planning run
#[derive(Debug, Clone)]
pub struct TerrainModel {
    /// Tree-stripped surface heights
    pub heights: Raster<i32>,
    /// True where the cell is dry land
    pub land: Raster<bool>,
    /// True where buildings may be placed
    pub buildable: Raster<bool>,
}

impl TerrainModel {
    /// Analyse already tree-stripped heights
    pub fn from_rasters(
        heights: Raster<i32>,
        ocean_floor: &Raster<i32>,
        threshold: SlopeThreshold,
    ) -> PlannerResult<Self> {
        let land = derive_land_mask(&heights, ocean_floor)?;
        let buildable = derive_buildability_mask(&heights, &land, threshold)?;
        Ok(Self {
            heights,
            land,
            buildable,
        })
    }

    /// Query a terrain source once and analyse the result
    pub fn from_source(
        source: &dyn TerrainSource,
        area: &BuildArea,
        threshold: SlopeThreshold,
    ) -> PlannerResult<Self> {
        let TerrainSample {
            surface,
            ocean_floor,
        } = source.sample(area)?;
        let heights = derive_buildable_height(&surface, |cell, y| source.is_log(area, cell, y));
        let stripped = surface
            .iter()
            .filter(|(cell, height)| heights.value(*cell) != Some(**height))
            .count();
        debug!("Stripped tree trunks from {stripped} cells");

        let model = Self::from_rasters(heights, &ocean_floor, threshold)?;
        info!(
            "Terrain analysed: {}x{} cells, {} buildable, {} under water",
            model.width(),
            model.depth(),
            model.buildable_count(),
            model.land.iter().filter(|(_, dry)| !**dry).count()
        );
        Ok(model)
    }

    pub fn width(&self) -> u32 {
        self.heights.width()
    }

    pub fn depth(&self) -> u32 {
        self.heights.depth()
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.heights.contains(cell)
    }

    pub fn height_at(&self, cell: GridCell) -> Option<i32> {
        self.heights.value(cell)
    }

    pub fn is_land(&self, cell: GridCell) -> bool {
        self.land.value(cell).unwrap_or(false)
    }

    pub fn is_buildable(&self, cell: GridCell) -> bool {
        self.buildable.value(cell).unwrap_or(false)
    }

    pub fn buildable_count(&self) -> usize {
        self.buildable.iter().filter(|(_, b)| **b).count()
    }
}
