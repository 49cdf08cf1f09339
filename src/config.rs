//! Engine configuration

use crate::error::{Result, TaxError};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Default collapse window, in milliseconds
pub const DEFAULT_COLLAPSE_WINDOW_MS: i64 = 1_000;

/// Largest accepted collapse window (one day), in milliseconds
pub const MAX_COLLAPSE_WINDOW_MS: i64 = 86_400_000;

/// Rate engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Custom-rate writes closer than this (in milliseconds) to an existing
    /// entry of the same commodity overwrite that entry
    pub collapse_window_ms: i64,
}

impl EngineConfig {
    pub fn new(collapse_window_ms: i64) -> Result<Self> {
        let config = Self { collapse_window_ms };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collapse_window_ms < 0 {
            return Err(TaxError::Config(format!(
                "collapse_window_ms must be non-negative, got: {}",
                self.collapse_window_ms
            )));
        }
        if self.collapse_window_ms > MAX_COLLAPSE_WINDOW_MS {
            return Err(TaxError::Config(format!(
                "collapse_window_ms must be at most {}, got: {}",
                MAX_COLLAPSE_WINDOW_MS, self.collapse_window_ms
            )));
        }
        Ok(())
    }

    pub fn collapse_window(&self) -> Duration {
        Duration::milliseconds(self.collapse_window_ms)
    }

    /// Parse a TOML document such as `collapse_window_ms = 500`
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "config-file")]
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collapse_window_ms: DEFAULT_COLLAPSE_WINDOW_MS,
        }
    }
}
