//! Service endpoints.
//!
//! Public OTC endpoints follow `https://{service}.{region}.{cloud_domain}`,
//! where the cloud domain is taken from the identity endpoint
//! (`https://iam.eu-de.otc.t-systems.com/v3` → `otc.t-systems.com`). Each
//! service then exposes one path prefix per API version.

use std::fmt;

use crate::error::SdkError;

/// Cloud services the harness reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Service {
    Compute,
    Network,
    Vpc,
    AntiDdos,
    Dns,
    Cce,
    BlockStorage,
    Dds,
    Mrs,
    Kms,
    Rds,
    Dms,
    Dcs,
    Lts,
    Vbs,
}

impl Service {
    /// Endpoint host label.
    pub const fn host(self) -> &'static str {
        match self {
            Service::Compute => "ecs",
            Service::Network | Service::Vpc => "vpc",
            Service::AntiDdos => "antiddos",
            Service::Dns => "dns",
            Service::Cce => "cce",
            Service::BlockStorage => "evs",
            Service::Dds => "dds",
            Service::Mrs => "mrs",
            Service::Kms => "kms",
            Service::Rds => "rds",
            Service::Dms => "dms",
            Service::Dcs => "dcs",
            Service::Lts => "lts",
            Service::Vbs => "vbs",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Service::Compute => "compute",
            Service::Network => "network",
            Service::Vpc => "vpc",
            Service::AntiDdos => "antiddos",
            Service::Dns => "dns",
            Service::Cce => "cce",
            Service::BlockStorage => "blockstorage",
            Service::Dds => "dds",
            Service::Mrs => "mrs",
            Service::Kms => "kms",
            Service::Rds => "rds",
            Service::Dms => "dms",
            Service::Dcs => "dcs",
            Service::Lts => "lts",
            Service::Vbs => "vbs",
        }
    }

    /// Path prefix for an API version. `{project_id}` is substituted by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::UnsupportedVersion`] for unknown combinations.
    pub fn path_prefix(self, version: ApiVersion) -> Result<&'static str, SdkError> {
        use ApiVersion::*;
        let prefix = match (self, version) {
            (Service::Compute, V2_1) => "v2.1/{project_id}",
            (Service::Compute, V1) => "v1/{project_id}",
            (Service::Network, V2_0) => "v2.0",
            (Service::Vpc, V1) => "v1/{project_id}",
            (Service::Vpc, V2_0) => "v2.0/{project_id}",
            (Service::AntiDdos, V1) => "v1/{project_id}",
            (Service::Dns, V2) => "v2",
            (Service::Cce, V3) => "api/v3/projects/{project_id}",
            (Service::BlockStorage, V2) => "v2/{project_id}",
            (Service::BlockStorage, V3) => "v3/{project_id}",
            (Service::Dds, V3) => "v3/{project_id}",
            (Service::Mrs, V1_1) => "v1.1/{project_id}",
            (Service::Kms, V1_0) => "v1.0/{project_id}",
            (Service::Rds, V3) => "v3/{project_id}",
            (Service::Dms, V1_0) => "v1.0/{project_id}",
            (Service::Dcs, V1_0) => "v1.0/{project_id}",
            (Service::Lts, V2) => "v2/{project_id}",
            (Service::Vbs, V2) => "v2/{project_id}",
            _ => {
                return Err(SdkError::UnsupportedVersion {
                    service: self.name(),
                    version: version.as_str(),
                })
            }
        };
        Ok(prefix)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// REST API versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V1,
    V1_0,
    V1_1,
    V2,
    V2_0,
    V2_1,
    V3,
}

impl ApiVersion {
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1_0 => "v1.0",
            ApiVersion::V1_1 => "v1.1",
            ApiVersion::V2 => "v2",
            ApiVersion::V2_0 => "v2.0",
            ApiVersion::V2_1 => "v2.1",
            ApiVersion::V3 => "v3",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud domain behind an identity endpoint.
///
/// # Errors
///
/// Fails when the URL has no host.
pub fn cloud_domain(auth_url: &str, region: &str) -> Result<String, SdkError> {
    let without_scheme = auth_url
        .split_once("://")
        .map_or(auth_url, |(_, rest)| rest);
    let host = without_scheme
        .split(['/', ':'])
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| SdkError::Config(format!("auth_url has no host: {auth_url}")))?;

    let host = host.strip_prefix("iam.").unwrap_or(host);
    let region_label = format!("{region}.");
    Ok(host.strip_prefix(&region_label).unwrap_or(host).to_string())
}

/// Service root URL (scheme and host, no path).
pub fn service_root(service: Service, region: &str, domain: &str) -> String {
    format!("https://{}.{}.{}", service.host(), region, domain)
}
