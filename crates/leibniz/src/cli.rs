//! Command line options of the `leibniz` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, Variant};
use crate::error::ConfigError;

/// Approximate pi one slow term at a time without freezing the window.
#[derive(Debug, Parser)]
#[command(name = "leibniz")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Concurrency driver
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// Number of series terms per run
    #[arg(short = 'n', long)]
    pub iterations: Option<u32>,

    /// Pause after each step (milliseconds)
    #[arg(long)]
    pub step_delay_ms: Option<u64>,

    /// Queue check interval of the polling driver (milliseconds)
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// TOML config file; flags given here take precedence over it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load the config file (or defaults), apply the flags and validate.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite every setting that was given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(step_delay_ms) = self.step_delay_ms {
            config.step_delay_ms = step_delay_ms;
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.poll_interval_ms = poll_interval_ms;
        }
    }
}
