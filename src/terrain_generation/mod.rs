use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::{GridCell, Raster, RasterTerrainSource};
use noise::{MultiFractal, NoiseFn, Perlin, RidgedMulti};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Terrain generation algorithms
#[derive(Debug, Clone)]
pub enum TerrainAlgorithm {
    Flat,
    Perlin {
        amplitude: f64,
        frequency: f64,
        octaves: u32,
    },
    Ridged {
        amplitude: f64,
        frequency: f64,
        octaves: u32,
    },
}

/// Synthetic block terrain with optional sea and tree trunks
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    pub seed: u32,
    pub algorithm: TerrainAlgorithm,
    /// Ground height the noise is added to
    pub base_height: i32,
    /// Ground below this height is flooded up to it
    pub sea_level: Option<i32>,
    /// Chance that a dry cell carries a tree trunk
    pub tree_density: f64,
}

const TRUNK_HEIGHTS: std::ops::RangeInclusive<i32> = 4..=6;

impl TerrainGenerator {
    /// Create a new terrain generator
    pub fn new(seed: u32, algorithm: TerrainAlgorithm) -> Self {
        Self {
            seed,
            algorithm,
            base_height: 64,
            sea_level: None,
            tree_density: 0.0,
        }
    }

    pub fn with_base_height(mut self, base_height: i32) -> Self {
        self.base_height = base_height;
        self
    }

    pub fn with_sea_level(mut self, sea_level: i32) -> Self {
        self.sea_level = Some(sea_level);
        self
    }

    pub fn with_trees(mut self, density: f64) -> Self {
        self.tree_density = density.clamp(0.0, 1.0);
        self
    }

    /// Ground heights before water and trees
    pub fn ground(&self, width: u32, depth: u32) -> Raster<i32> {
        let base = self.base_height;
        match &self.algorithm {
            TerrainAlgorithm::Flat => Raster::filled(width, depth, base),
            TerrainAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            } => {
                let perlin = Perlin::new(self.seed);
                Raster::from_fn(width, depth, |cell| {
                    let mut noise_value = 0.0;
                    let mut current_amplitude = *amplitude;
                    let mut current_frequency = *frequency;
                    for _ in 0..*octaves {
                        noise_value += perlin.get([
                            cell.x as f64 * current_frequency,
                            cell.z as f64 * current_frequency,
                        ]) * current_amplitude;
                        current_amplitude *= 0.5; // Persistence
                        current_frequency *= 2.0; // Lacunarity
                    }
                    base + noise_value.round() as i32
                })
            }
            TerrainAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            } => {
                let ridged = RidgedMulti::<Perlin>::new(self.seed)
                    .set_octaves(*octaves as usize)
                    .set_frequency(*frequency);
                Raster::from_fn(width, depth, |cell| {
                    let value = ridged.get([cell.x as f64, cell.z as f64]) * *amplitude;
                    base + value.round() as i32
                })
            }
        }
    }

    /// Generate a terrain source anchored at global (`origin_x`, `origin_z`)
    pub fn generate(
        &self,
        origin_x: i32,
        origin_z: i32,
        width: u32,
        depth: u32,
    ) -> PlannerResult<RasterTerrainSource> {
        if width == 0 || depth == 0 {
            return Err(PlannerError::InvalidTerrain {
                reason: format!("Cannot generate a {width}x{depth} terrain"),
            });
        }
        let ground = self.ground(width, depth);
        let mut rng = Pcg64::seed_from_u64(self.seed as u64);
        let mut trunks: Vec<(GridCell, i32, i32)> = Vec::new();

        let surface = Raster::from_fn(width, depth, |cell| {
            let height = ground.value(cell).unwrap_or(self.base_height);
            if let Some(sea) = self.sea_level.filter(|sea| height < *sea) {
                return sea;
            }
            if self.tree_density > 0.0 && rng.gen_bool(self.tree_density) {
                let trunk = rng.gen_range(TRUNK_HEIGHTS);
                trunks.push((cell, height, trunk));
                return height + trunk;
            }
            height
        });
        // Top solid block: the seabed under water, the trunk top on land
        let ocean_floor = Raster::from_fn(width, depth, |cell| {
            let height = ground.value(cell).unwrap_or(self.base_height);
            match self.sea_level {
                Some(sea) if height < sea => height,
                _ => surface.value(cell).unwrap_or(height),
            }
        });

        let mut source = RasterTerrainSource::new(origin_x, origin_z, surface, ocean_floor)?;
        for (cell, ground_height, trunk) in trunks {
            for y in ground_height..ground_height + trunk {
                source.add_log(origin_x + cell.x as i32, y, origin_z + cell.z as i32);
            }
        }
        Ok(source)
    }
}

/// Get a predefined terrain preset
pub fn get_terrain_preset(name: &str, seed: Option<u32>) -> Option<TerrainGenerator> {
    let seed = seed.unwrap_or_else(rand::random);

    match name {
        "flat" => Some(TerrainGenerator::new(seed, TerrainAlgorithm::Flat)),
        "hills" => Some(
            TerrainGenerator::new(
                seed,
                TerrainAlgorithm::Perlin {
                    amplitude: 6.0,
                    frequency: 0.02,
                    octaves: 3,
                },
            )
            .with_trees(0.01),
        ),
        "lakes" => Some(
            TerrainGenerator::new(
                seed,
                TerrainAlgorithm::Perlin {
                    amplitude: 8.0,
                    frequency: 0.015,
                    octaves: 3,
                },
            )
            .with_sea_level(62)
            .with_trees(0.01),
        ),
        "mountains" => Some(
            TerrainGenerator::new(
                seed,
                TerrainAlgorithm::Ridged {
                    amplitude: 20.0,
                    frequency: 0.01,
                    octaves: 5,
                },
            )
            .with_trees(0.005),
        ),
        "valleys" => Some(
            TerrainGenerator::new(
                seed,
                TerrainAlgorithm::Ridged {
                    amplitude: -12.0, // Negative amplitude creates valleys
                    frequency: 0.012,
                    octaves: 4,
                },
            )
            .with_sea_level(58),
        ),
        _ => None,
    }
}

pub fn preset_names() -> &'static [&'static str] {
    &["flat", "hills", "lakes", "mountains", "valleys"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::range_types::SlopeThreshold;
    use crate::terrain::{BuildArea, TerrainModel, TerrainSource};

    #[test]
    fn test_flat_terrain_generation() {
        let generator = TerrainGenerator::new(12345, TerrainAlgorithm::Flat).with_base_height(70);
        let source = generator.generate(0, 0, 10, 10).unwrap();
        let sample = source.sample(&BuildArea::new(0, 0, 10, 10)).unwrap();
        assert!(sample.surface.iter().all(|(_, h)| *h == 70));
        assert_eq!(sample.surface, sample.ocean_floor);
        assert_eq!(source.log_count(), 0);
    }

    #[test]
    fn test_perlin_terrain_varies() {
        let generator = TerrainGenerator::new(
            12345,
            TerrainAlgorithm::Perlin {
                amplitude: 10.0,
                frequency: 0.1,
                octaves: 2,
            },
        );
        let ground = generator.ground(16, 16);
        let first = ground.value(GridCell::new(0, 0)).unwrap();
        assert!(ground.iter().any(|(_, h)| *h != first));
    }

    #[test]
    fn test_sea_level_floods_low_ground() {
        let generator = TerrainGenerator::new(1, TerrainAlgorithm::Flat)
            .with_base_height(55)
            .with_sea_level(62);
        let source = generator.generate(0, 0, 8, 8).unwrap();
        let model =
            TerrainModel::from_source(&source, &BuildArea::new(0, 0, 8, 8), SlopeThreshold::new(2))
                .unwrap();
        assert_eq!(model.height_at(GridCell::new(3, 3)), Some(62));
        assert!(!model.is_land(GridCell::new(3, 3)));
        assert_eq!(model.buildable_count(), 0);
    }

    #[test]
    fn test_trees_are_stripped_by_analysis() {
        let generator = TerrainGenerator::new(42, TerrainAlgorithm::Flat)
            .with_base_height(64)
            .with_trees(0.05);
        let source = generator.generate(100, 100, 40, 40).unwrap();
        assert!(source.log_count() > 0);

        let area = BuildArea::new(100, 100, 140, 140);
        let sample = source.sample(&area).unwrap();
        assert!(sample.surface.iter().any(|(_, h)| *h > 64));

        let model = TerrainModel::from_source(&source, &area, SlopeThreshold::new(2)).unwrap();
        assert!(model.heights.iter().all(|(_, h)| *h == 64));
        assert_eq!(model.buildable_count(), 1600);
    }

    #[test]
    fn test_terrain_presets() {
        for name in preset_names() {
            let generator = get_terrain_preset(name, Some(123)).unwrap();
            assert_eq!(generator.seed, 123);
        }
        assert!(get_terrain_preset("invalid", Some(123)).is_none());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = get_terrain_preset("lakes", Some(9)).unwrap();
        let a = generator.generate(0, 0, 32, 32).unwrap();
        let b = generator.generate(0, 0, 32, 32).unwrap();
        let area = BuildArea::new(0, 0, 32, 32);
        assert_eq!(a.sample(&area).unwrap(), b.sample(&area).unwrap());
        assert_eq!(a.log_count(), b.log_count());
    }

    #[test]
    fn test_empty_generation_rejected() {
        let generator = TerrainGenerator::new(1, TerrainAlgorithm::Flat);
        assert!(generator.generate(0, 0, 0, 10).is_err());
    }
}
