//! Unified error type for sushi-scout.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Structurally invalid input: negative price, min > max, missing field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong shape at a collaborator boundary (e.g. unparsable batch payload).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
