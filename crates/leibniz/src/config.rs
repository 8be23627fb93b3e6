//! Application configuration.
//!
//! Settings are read from an optional TOML file; every key may be omitted and
//! falls back to its default. Command line flags are applied on top by the
//! binary.
//!
//! ```toml
//! title = "2: MainWindow"
//! iterations = 5
//! step_delay_ms = 1000
//! poll_interval_ms = 100
//! variant = "signals"
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which concurrency driver runs the series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Compute on the UI thread. The window freezes until the run ends.
    Blocking,
    /// A worker object on its own event loop thread, talking through signals.
    #[default]
    Signals,
    /// A plain thread with an in-queue and an out-queue polled by a UI timer.
    Polling,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Blocking => "blocking",
            Variant::Signals => "signals",
            Variant::Polling => "polling",
        })
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window title.
    pub title: String,
    /// Number of series terms per run.
    pub iterations: u32,
    /// Pause after each step, in milliseconds.
    pub step_delay_ms: u64,
    /// Interval of the polling driver's queue check, in milliseconds.
    pub poll_interval_ms: u64,
    /// Driver to use.
    pub variant: Variant,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "2: MainWindow".to_string(),
            iterations: 5,
            step_delay_ms: 1000,
            poll_interval_ms: 100,
            variant: Variant::default(),
        }
    }
}

impl Config {
    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: "leibniz::config", path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.iterations, 5);
        assert_eq!(config.step_delay(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.variant, Variant::Signals);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip() {
        let config = Config {
            variant: Variant::Polling,
            iterations: 12,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("variant = \"polling\""));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml_str("iterations = 3\nvariant = \"blocking\"\n").unwrap();
        assert_eq!(config.iterations, 3);
        assert_eq!(config.variant, Variant::Blocking);
        assert_eq!(config.step_delay_ms, 1000);
        assert_eq!(config.title, "2: MainWindow");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml_str("poll_interval_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("variant = \"threads\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_toml_str("iterations = -1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "step_delay_ms = 0").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.step_delay(), Duration::ZERO);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(Variant::Blocking.to_string(), "blocking");
        assert_eq!(Variant::Signals.to_string(), "signals");
        assert_eq!(Variant::Polling.to_string(), "polling");
    }
}
