//! Error types for registry initialisation and harness settings.

use thiserror::Error;

/// Errors raised while resolving the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// Neither a region nor a project/tenant name to derive it from was set.
    #[error("region cannot be resolved: set OS_REGION_NAME, OS_PROJECT_NAME or OS_TENANT_NAME")]
    RegionUnresolvable,

    /// A variable is set but is not valid UTF-8.
    #[error("{name} must be valid UTF-8")]
    InvalidUnicode { name: String },

    /// A harness setting failed validation.
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

impl EnvError {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            message: message.into(),
        }
    }
}
