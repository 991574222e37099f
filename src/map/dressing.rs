//! Per-cell detail derived from a finished plan: road tiles and building foundations

use crate::terrain::{GridCell, Raster};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadOrientation {
    AlongX,
    AlongZ,
    Diagonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadTile {
    pub cell: GridCell,
    pub orientation: RoadOrientation,
    pub lamp: bool,
}

/// Leveled pad under a building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Foundation {
    /// Inclusive corners of the footprint, clipped to the grid
    pub min: GridCell,
    pub max: GridCell,
    /// Height of the top foundation block
    pub floor_y: i32,
    /// Sum of absolute deviations from the most common height; 0 is perfectly flat
    pub flatness: u64,
}

impl Foundation {
    pub fn cell_count(&self) -> u64 {
        (self.max.x - self.min.x + 1) as u64 * (self.max.z - self.min.z + 1) as u64
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        (self.min.x..=self.max.x).contains(&cell.x) && (self.min.z..=self.max.z).contains(&cell.z)
    }
}

pub fn road_orientation(roads: &Raster<bool>, cell: GridCell) -> RoadOrientation {
    let is_road = |dx: i32, dz: i32| {
        cell.offset(dx, dz)
            .and_then(|neighbor| roads.value(neighbor))
            .unwrap_or(false)
    };
    if is_road(-1, 0) || is_road(1, 0) {
        RoadOrientation::AlongX
    } else if is_road(0, -1) || is_road(0, 1) {
        RoadOrientation::AlongZ
    } else {
        RoadOrientation::Diagonal
    }
}

/// Orient every road cell and put a lamp on every `lamp_spacing`-th one in scan order
pub fn dress_roads(roads: &Raster<bool>, lamp_spacing: u32) -> Vec<RoadTile> {
    let spacing = lamp_spacing.max(1) as usize;
    roads
        .iter()
        .filter(|(_, road)| **road)
        .enumerate()
        .map(|(index, (cell, _))| RoadTile {
            cell,
            orientation: road_orientation(roads, cell),
            lamp: (index + 1) % spacing == 0,
        })
        .collect()
}

/// Square footprint of edge `footprint` centred on `center`
pub fn plan_foundation(heights: &Raster<i32>, center: GridCell, footprint: u32) -> Option<Foundation> {
    if !heights.contains(center) || footprint == 0 {
        return None;
    }
    let half = footprint / 2;
    let min = GridCell::new(center.x.saturating_sub(half), center.z.saturating_sub(half));
    let max = GridCell::new(
        (min.x + footprint - 1).min(heights.width() - 1),
        (min.z + footprint - 1).min(heights.depth() - 1),
    );

    let mut samples = Vec::new();
    for z in min.z..=max.z {
        for x in min.x..=max.x {
            if let Some(height) = heights.value(GridCell::new(x, z)) {
                samples.push(height);
            }
        }
    }
    if samples.is_empty() {
        return None;
    }

    let mean = samples.iter().map(|&h| h as f64).sum::<f64>() / samples.len() as f64;
    let floor_y = mean.round() as i32 - 1;

    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for &height in &samples {
        *counts.entry(height).or_default() += 1;
    }
    // Ties resolve to the lowest height
    let mode = counts
        .iter()
        .fold((i32::MIN, 0usize), |best, (&height, &count)| {
            if count > best.1 { (height, count) } else { best }
        })
        .0;
    let flatness = samples.iter().map(|&h| h.abs_diff(mode) as u64).sum();

    Some(Foundation {
        min,
        max,
        floor_y,
        flatness,
    })
}
