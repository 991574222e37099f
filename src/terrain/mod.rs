use crate::errors::{PlannerError, PlannerResult};
use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod constants;
pub mod source;

pub use analysis::TerrainModel;
pub use source::{RasterTerrainSource, TerrainSample, TerrainSource};

/// Local grid coordinates inside a build area (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: u32,
    pub z: u32,
}

impl GridCell {
    pub fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Offset this cell, returning None when the result would be negative
    pub fn offset(&self, dx: i32, dz: i32) -> Option<GridCell> {
        let x = self.x as i64 + dx as i64;
        let z = self.z as i64 + dz as i64;
        if x < 0 || z < 0 || x > u32::MAX as i64 || z > u32::MAX as i64 {
            return None;
        }
        Some(GridCell::new(x as u32, z as u32))
    }

    /// Euclidean distance to another cell
    pub fn distance(&self, other: &GridCell) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dz = self.z as f64 - other.z as f64;
        (dx * dx + dz * dz).sqrt()
    }

    /// Largest of the per-axis distances
    pub fn chebyshev_distance(&self, other: &GridCell) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }
}

/// Row-major 2D grid over a build area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raster<T> {
    width: u32,
    depth: u32,
    cells: Vec<T>,
}

impl<T: Clone> Raster<T> {
    /// Create a raster with every cell set to `value`
    pub fn filled(width: u32, depth: u32, value: T) -> Self {
        Self {
            width,
            depth,
            cells: vec![value; (width as usize) * (depth as usize)],
        }
    }

    /// Wrap a flattened row-major vector, checking its length
    pub fn from_vec(width: u32, depth: u32, cells: Vec<T>) -> PlannerResult<Self> {
        let expected = (width as usize) * (depth as usize);
        if cells.len() != expected {
            return Err(PlannerError::InvalidTerrain {
                reason: format!(
                    "Raster data size {} does not match dimensions {}x{} (expected {})",
                    cells.len(),
                    width,
                    depth,
                    expected
                ),
            });
        }
        Ok(Self {
            width,
            depth,
            cells,
        })
    }

    /// Build a raster by evaluating `f` on every cell
    pub fn from_fn(width: u32, depth: u32, mut f: impl FnMut(GridCell) -> T) -> Self {
        let mut cells = Vec::with_capacity((width as usize) * (depth as usize));
        for z in 0..depth {
            for x in 0..width {
                cells.push(f(GridCell::new(x, z)));
            }
        }
        Self {
            width,
            depth,
            cells,
        }
    }

    pub fn map<U: Clone>(&self, mut f: impl FnMut(&T) -> U) -> Raster<U> {
        Raster {
            width: self.width,
            depth: self.depth,
            cells: self.cells.iter().map(&mut f).collect(),
        }
    }
}

impl<T> Raster<T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn same_shape<U>(&self, other: &Raster<U>) -> bool {
        self.width == other.width && self.depth == other.depth
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        cell.x < self.width && cell.z < self.depth
    }

    fn index(&self, cell: GridCell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some((cell.z as usize) * (self.width as usize) + cell.x as usize)
    }

    pub fn get(&self, cell: GridCell) -> Option<&T> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    pub fn get_mut(&mut self, cell: GridCell) -> Option<&mut T> {
        self.index(cell).and_then(move |index| self.cells.get_mut(index))
    }

    /// Iterate over every cell together with its coordinates, in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (GridCell, &T)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(index, value)| {
            let index = index as u32;
            (GridCell::new(index % width, index / width), value)
        })
    }

    /// Iterate over the in-bounds neighbours of a cell within a square radius (including itself)
    pub fn window(&self, center: GridCell, radius: u32) -> impl Iterator<Item = GridCell> + '_ {
        let min_x = center.x.saturating_sub(radius);
        let min_z = center.z.saturating_sub(radius);
        let max_x = center.x.saturating_add(radius).min(self.width.saturating_sub(1));
        let max_z = center.z.saturating_add(radius).min(self.depth.saturating_sub(1));
        (min_z..=max_z)
            .flat_map(move |z| (min_x..=max_x).map(move |x| GridCell::new(x, z)))
            .filter(move |cell| self.contains(*cell))
    }
}

impl<T: Copy> Raster<T> {
    pub fn value(&self, cell: GridCell) -> Option<T> {
        self.get(cell).copied()
    }
}

/// Rectangular region of the world, in global block coordinates.
///
/// The local grid spans `end - start` cells per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArea {
    pub start_x: i32,
    pub start_z: i32,
    pub end_x: i32,
    pub end_z: i32,
}

impl BuildArea {
    pub fn new(start_x: i32, start_z: i32, end_x: i32, end_z: i32) -> Self {
        Self {
            start_x,
            start_z,
            end_x,
            end_z,
        }
    }

    pub fn length_x(&self) -> i64 {
        self.end_x as i64 - self.start_x as i64
    }

    pub fn length_z(&self) -> i64 {
        self.end_z as i64 - self.start_z as i64
    }

    /// Local grid dimensions, or None for an empty or inverted area
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (length_x, length_z) = (self.length_x(), self.length_z());
        if length_x <= 0 || length_z <= 0 || length_x > u32::MAX as i64 || length_z > u32::MAX as i64
        {
            return None;
        }
        Some((length_x as u32, length_z as u32))
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().is_none()
    }

    /// Check that this area lies entirely inside `outer`
    pub fn within(&self, outer: &BuildArea) -> bool {
        self.start_x >= outer.start_x
            && self.start_z >= outer.start_z
            && self.end_x <= outer.end_x
            && self.end_z <= outer.end_z
    }

    pub fn local_to_global(&self, cell: GridCell) -> (i32, i32) {
        (
            self.start_x.wrapping_add(cell.x as i32),
            self.start_z.wrapping_add(cell.z as i32),
        )
    }

    pub fn global_to_local(&self, x: i32, z: i32) -> Option<GridCell> {
        let local_x = x as i64 - self.start_x as i64;
        let local_z = z as i64 - self.start_z as i64;
        if local_x < 0 || local_z < 0 || local_x >= self.length_x() || local_z >= self.length_z() {
            return None;
        }
        Some(GridCell::new(local_x as u32, local_z as u32))
    }
}
