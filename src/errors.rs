use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    // Config-related errors
    #[error("Failed to get config directory")]
    ConfigDirNotFound,

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] toml::ser::Error),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(#[from] toml::de::Error),

    #[error("Config file not found at path: {path}")]
    ConfigFileNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Interest table errors
    #[error("Unknown archetype '{name}' referenced in interest table")]
    UnknownArchetype { name: String },

    #[error("Archetype '{name}' is declared more than once")]
    DuplicateArchetype { name: String },

    #[error("Missing interest entry for archetype pair ({from} -> {to})")]
    MissingInterest { from: String, to: String },

    #[error("Conflicting interest entries for archetype pair ({from} -> {to})")]
    DuplicateInterest { from: String, to: String },

    // Terrain and plan errors
    #[error("Invalid terrain data: {reason}")]
    InvalidTerrain { reason: String },

    #[error("Plan file not found at path: {path}")]
    PlanFileNotFound { path: PathBuf },

    #[error("Corrupted plan file: {reason}")]
    CorruptedPlanFile { reason: String },

    #[error("Failed to write diagnostic image: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for all operations
pub type PlannerResult<T> = Result<T, PlannerError>;
