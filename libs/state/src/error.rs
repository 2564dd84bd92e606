//! Error types for state parsing.

use thiserror::Error;

/// Errors raised while reading an engine state document.
#[derive(Debug, Error)]
pub enum StateError {
    /// The document is not valid JSON.
    #[error("state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A resource entry lacks a required field.
    #[error("state resource is missing '{field}'")]
    MissingField { field: &'static str },

    /// A resource address could not be split into type and name.
    #[error("invalid resource address '{0}'")]
    InvalidAddress(String),
}
