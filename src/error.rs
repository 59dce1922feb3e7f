//! Error types for the attention forecaster

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, ModelError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum ModelError {
    /// A tensor dimension violated a component's contract
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Architecture hyperparameters are inconsistent
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error while saving or loading model parameters
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error in model persistence
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Shorthand for a shape violation with a formatted message
    pub fn shape(msg: impl Into<String>) -> Self {
        ModelError::Shape(msg.into())
    }

    /// Shorthand for a configuration violation with a formatted message
    pub fn config(msg: impl Into<String>) -> Self {
        ModelError::Config(msg.into())
    }
}
