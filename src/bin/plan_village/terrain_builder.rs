use village_planner::errors::{PlannerError, PlannerResult};
use village_planner::terrain_generation::{
    TerrainAlgorithm, TerrainGenerator, get_terrain_preset, preset_names,
};

const DEFAULT_AMPLITUDE: f64 = 10.0;
const DEFAULT_FREQUENCY: f64 = 0.02;
const DEFAULT_OCTAVES: u32 = 4;

pub struct TerrainBuilder {
    terrain_type: String,
    seed: Option<u32>,
    amplitude: f64,
    frequency: f64,
    octaves: u32,
    sea_level: Option<i32>,
    tree_density: Option<f64>,
}

impl TerrainBuilder {
    pub fn new(terrain_type: String) -> Self {
        Self {
            terrain_type,
            seed: None,
            amplitude: DEFAULT_AMPLITUDE,
            frequency: DEFAULT_FREQUENCY,
            octaves: DEFAULT_OCTAVES,
            sea_level: None,
            tree_density: None,
        }
    }

    pub fn seed(mut self, seed: Option<u32>) -> Self {
        self.seed = seed;
        self
    }

    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn sea_level(mut self, sea_level: Option<i32>) -> Self {
        self.sea_level = sea_level;
        self
    }

    pub fn trees(mut self, density: Option<f64>) -> Self {
        self.tree_density = density;
        self
    }

    fn noise_overridden(&self) -> bool {
        (self.amplitude, self.frequency, self.octaves)
            != (DEFAULT_AMPLITUDE, DEFAULT_FREQUENCY, DEFAULT_OCTAVES)
    }

    /// Preset by name, else a bare `perlin` or `ridged` generator from the noise arguments
    pub fn build(self) -> PlannerResult<TerrainGenerator> {
        let seed = self.seed.unwrap_or_else(rand::random);

        let mut generator = match get_terrain_preset(&self.terrain_type, Some(seed)) {
            Some(mut preset) => {
                if self.noise_overridden() {
                    preset.algorithm = self.with_noise_args(preset.algorithm);
                }
                preset
            }
            None => {
                let custom = match self.terrain_type.as_str() {
                    "perlin" => TerrainAlgorithm::Perlin {
                        amplitude: self.amplitude,
                        frequency: self.frequency,
                        octaves: self.octaves,
                    },
                    "ridged" => TerrainAlgorithm::Ridged {
                        amplitude: self.amplitude,
                        frequency: self.frequency,
                        octaves: self.octaves,
                    },
                    other => {
                        return Err(PlannerError::InvalidConfig {
                            reason: format!(
                                "Unknown terrain type '{other}'; expected one of {} or perlin, ridged",
                                preset_names().join(", ")
                            ),
                        });
                    }
                };
                TerrainGenerator::new(seed, custom)
            }
        };

        if let Some(level) = self.sea_level {
            generator = generator.with_sea_level(level);
        }
        if let Some(density) = self.tree_density {
            generator = generator.with_trees(density);
        }
        Ok(generator)
    }

    /// Same algorithm family, parameters taken from the command line. Flat ignores them.
    fn with_noise_args(&self, algorithm: TerrainAlgorithm) -> TerrainAlgorithm {
        let (amplitude, frequency, octaves) = (self.amplitude, self.frequency, self.octaves);
        match algorithm {
            TerrainAlgorithm::Flat => {
                println!("Warning: noise parameters have no effect on flat terrain");
                TerrainAlgorithm::Flat
            }
            TerrainAlgorithm::Perlin { .. } => TerrainAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            },
            TerrainAlgorithm::Ridged { .. } => TerrainAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            },
        }
    }
}
