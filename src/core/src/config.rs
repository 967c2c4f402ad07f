//! Configuration management.
//!
//! Values are layered: built-in defaults, then an optional file, then
//! environment variables prefixed with `FACTS_TOTAL` and using `__` as the
//! nesting separator (e.g. `FACTS_TOTAL__TOTALING__MISSING=skip-missing`).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::telemetry::LoggingConfig;
use crate::total::TotalOptions;
use crate::window::{YearWindow, DEFAULT_YEAR_DIMENSION};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FACTS_TOTAL";

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Totaling options
    #[serde(default)]
    pub totaling: TotalOptions,

    /// Year window applied to inputs
    #[serde(default)]
    pub window: WindowConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Name of the year dimension
    #[serde(default = "default_year_dimension")]
    pub dimension: String,

    /// First year of the window
    pub start: Option<i64>,

    /// Last year of the window
    pub end: Option<i64>,

    /// Expected year step
    pub step: Option<i64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            dimension: default_year_dimension(),
            start: None,
            end: None,
            step: None,
        }
    }
}

impl WindowConfig {
    /// The window, when start, end and step are all set.
    pub fn year_window(&self) -> Option<YearWindow> {
        match (self.start, self.end, self.step) {
            (Some(start), Some(end), Some(step)) => {
                Some(YearWindow::new(start, end, step).with_dimension(&self.dimension))
            }
            _ => None,
        }
    }
}

fn default_year_dimension() -> String {
    DEFAULT_YEAR_DIMENSION.to_string()
}

impl Config {
    /// Load configuration from the environment only.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }
}
