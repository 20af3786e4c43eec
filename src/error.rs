//! Error types for configuration resolution and data loading

use thiserror::Error;

/// Main error type for llamatune operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested peft method is not in the method registry
    #[error("Peft config not found: {0}")]
    UnknownMethod(String),

    /// The requested peft method exists but is deliberately disabled
    #[error("Peft method `{method}` is not supported: {reason}")]
    UnsupportedMethod {
        /// Registry name of the method
        method: String,
        /// Why the method is disabled
        reason: String,
    },

    /// Two individually valid settings that cannot be combined
    #[error("`{first}` is not supported in combination with `{second}`")]
    IncompatibleCombination {
        /// First offending setting
        first: String,
        /// Second offending setting
        second: String,
    },

    /// The requested dataset is not in the dataset registry
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    /// The batching strategy string matches neither `padding` nor `packing`
    #[error("Unknown batching strategy: {0}")]
    UnknownBatchingStrategy(String),

    /// Batch collation error
    #[error("Collation error: {0}")]
    Collation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tensor operation error
    #[error("Tensor operation error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for llamatune operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a collation error
    pub fn collation(msg: impl Into<String>) -> Self {
        Self::Collation(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
