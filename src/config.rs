pub mod planner_config;
pub mod range_types;

pub use planner_config::{
    ArchetypeConfig, InterestConfig, PlannerConfig, RouterConfig, UnreachablePolicy,
};

use crate::errors::{PlannerError, PlannerResult};
use bevy::log::warn;
use std::fs;
use std::path::{Path, PathBuf};

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|mut path| {
            path.push("village_planner");
            fs::create_dir_all(&path).ok()?;
            path.push("planner.toml");
            Some(path)
        })
        .flatten()
}

/// Load and validate a planner configuration from a TOML file
pub fn load_config_from(path: &Path) -> PlannerResult<PlannerConfig> {
    if !path.exists() {
        return Err(PlannerError::ConfigFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path)?;
    let config: PlannerConfig = toml::from_str(&contents)?;
    config.check()?;
    Ok(config)
}

/// Load the user configuration, falling back to defaults when absent or broken
pub fn load_config() -> PlannerConfig {
    if let Some(config_path) = get_config_path() {
        if config_path.exists() {
            match load_config_from(&config_path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config at {}: {e}", config_path.display()),
            }
        }
    }
    PlannerConfig::default()
}

pub fn save_config(config: &PlannerConfig) -> PlannerResult<()> {
    let config_path = get_config_path().ok_or(PlannerError::ConfigDirNotFound)?;
    save_config_to(config, &config_path)
}

pub fn save_config_to(config: &PlannerConfig, path: &Path) -> PlannerResult<()> {
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}
