//! # otc-acc-sdk
//!
//! Read-only OpenTelekomCloud REST access for acceptance checks.
//!
//! Checks use this crate to confirm that what the engine recorded actually
//! exists in the cloud, and the destroy verifier uses it to confirm that it
//! no longer does. Nothing here creates or mutates cloud objects.
//!
//! ```ignore
//! let session = CloudSession::new(CloudConfig::from_registry(&registry)?)?;
//! let vpc = session.client(Service::Vpc, ApiVersion::V1).await?;
//! let body = vpc.get_json("vpcs/abc").await?;
//! ```

mod auth;
mod client;
mod config;
mod endpoint;
mod error;
mod tags;

pub use auth::AuthToken;
pub use client::{CloudSession, ServiceClient};
pub use config::{
    is_inline_pem, load_pem, AuthMethod, CloudConfig, TlsOptions, DEFAULT_REQUEST_TIMEOUT,
};
pub use endpoint::{cloud_domain, service_root, ApiVersion, Service};
pub use error::SdkError;
pub use tags::{parse_tags, TagShape};
