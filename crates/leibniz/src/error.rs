//! Error types for the Leibniz application.

use std::path::PathBuf;

use leibniz_core::CoreError;
use thiserror::Error;

/// Errors loading or validating a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for a config.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The config could not be written as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// The main error type for the application.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Event loop or worker thread error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
    /// Terminal I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for application operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_passes_through() {
        let err: Error = ConfigError::Invalid("poll_interval_ms must be greater than 0".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid config: poll_interval_ms must be greater than 0"
        );
    }

    #[test]
    fn test_core_error_wrapped() {
        let err: Error = CoreError::LoopExited.into();
        assert_eq!(err.to_string(), "Core error: The event loop has already exited");
    }
}
