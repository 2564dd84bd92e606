//! SDK error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from client construction and read calls.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The configuration is incomplete or inconsistent.
    #[error("invalid cloud configuration: {0}")]
    Config(String),

    /// The configured credentials cannot be used for read-back.
    #[error("unsupported authentication: {0}")]
    UnsupportedAuth(String),

    /// No endpoint layout is known for this service and version.
    #[error("{service} does not expose API version {version}")]
    UnsupportedVersion {
        service: &'static str,
        version: &'static str,
    },

    /// The token exchange was rejected.
    #[error("authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// The object does not exist.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The API answered with an unexpected status.
    #[error("unexpected status {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Reading TLS material failed.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SdkError {
    /// Returns true for "object does not exist" answers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::NotFound { .. })
    }

    pub(crate) fn decode(url: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
