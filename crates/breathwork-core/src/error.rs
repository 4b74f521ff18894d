//! Core error types for breathwork-core.
//!
//! The engine itself has no recoverable runtime errors: durations and scales
//! are fixed by the catalog. What remains is programmer misuse (unknown
//! pattern identifiers, malformed phase lists) and configuration I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An unknown breathing pattern identifier was supplied
    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    /// A phase list failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised when text does not name one of the catalog patterns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown breathing pattern '{input}' (expected one of: coherence, relax-478, box-focus)")]
pub struct InvalidPatternError {
    /// The rejected input, verbatim.
    pub input: String,
}

/// Phase list validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A pattern must contain at least one phase
    #[error("a breathing pattern needs at least one phase")]
    EmptyPattern,

    /// A phase carries an unusable duration or scale
    #[error("phase {index} is invalid: {message}")]
    InvalidPhase { index: usize, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Config directory could not be created
    #[error("Failed to prepare config directory: {0}")]
    DataDir(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
