//! Error types for configuration loading.

use thiserror::Error;

/// Errors emitted while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value was outside its permitted range.
    #[error("invalid deployer configuration: {0}")]
    InvalidConfig(&'static str),
    /// The configuration file could not be read.
    #[error("i/o error reading configuration: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// The configuration text was not valid JSON for the schema.
    #[error("configuration parse error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
