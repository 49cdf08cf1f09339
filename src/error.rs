//! Error types for the tax-rate engine

use thiserror::Error;

/// Main error type for tax-rate operations
#[derive(Error, Debug)]
pub enum TaxError {
    #[error("Invalid tax rate: {rate} (must be within [0, 1])")]
    InvalidRate { rate: f64 },

    #[error("Unknown commodity: {0}")]
    UnknownCommodity(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate script line {line}: {source}")]
    Script {
        line: u64,
        #[source]
        source: Box<TaxError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TaxError {
    /// Whether this is the engine's rate validation failure
    pub fn is_invalid_rate(&self) -> bool {
        match self {
            TaxError::InvalidRate { .. } => true,
            TaxError::Script { source, .. } => source.is_invalid_rate(),
            _ => false,
        }
    }
}

/// Result type alias for tax-rate operations
pub type Result<T> = std::result::Result<T, TaxError>;
