//! Live-object probes.
//!
//! A [`CloudProbe`] answers "what does the cloud say about this state
//! entry". [`SdkProbe`] resolves through the kind table and the read-back
//! SDK; the runner tests substitute a scripted probe.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use otc_acc_env::EnvRegistry;
use otc_acc_sdk::{ApiVersion, CloudConfig, CloudSession, SdkError, Service, ServiceClient};
use otc_acc_state::ResourceState;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ProbeError;
use crate::kinds::{lookup_kind, render_path, CloudObjectHandle, KindSpec, Lookup};

/// Read-only access to live objects.
#[async_trait]
pub trait CloudProbe: Send + Sync {
    /// The live object behind a state entry. "Gone" is an error for which
    /// [`ProbeError::is_not_found`] holds.
    async fn fetch(&self, resource: &ResourceState) -> Result<Value, ProbeError>;

    /// Tags attached to the live object.
    async fn tags(&self, resource: &ResourceState) -> Result<BTreeMap<String, String>, ProbeError>;

    /// A raw client, for caller-supplied fetches.
    async fn client(&self, service: Service, version: ApiVersion)
        -> Result<ServiceClient, ProbeError>;
}

fn spec_for(resource: &ResourceState) -> Result<&'static KindSpec, ProbeError> {
    lookup_kind(&resource.kind).ok_or_else(|| ProbeError::UnknownKind(resource.kind.clone()))
}

/// Probe backed by an SDK session.
///
/// Built from a registry, the session is created on first use so that
/// cases which never read back need no credentials.
#[derive(Debug)]
pub struct SdkProbe {
    registry: Option<Arc<EnvRegistry>>,
    session: OnceCell<Arc<CloudSession>>,
}

impl SdkProbe {
    pub fn new(session: Arc<CloudSession>) -> Self {
        Self {
            registry: None,
            session: OnceCell::new_with(Some(session)),
        }
    }

    pub fn from_registry(registry: Arc<EnvRegistry>) -> Self {
        Self {
            registry: Some(registry),
            session: OnceCell::new(),
        }
    }

    /// The session, created from the registry if needed.
    ///
    /// # Errors
    ///
    /// Fails when the registry lacks an identity endpoint or credentials.
    pub async fn session(&self) -> Result<&CloudSession, SdkError> {
        let session = self
            .session
            .get_or_try_init(|| async {
                let registry = self
                    .registry
                    .as_deref()
                    .ok_or_else(|| SdkError::Config("probe has no session source".into()))?;
                let config = CloudConfig::from_registry(registry)?;
                Ok::<_, SdkError>(Arc::new(CloudSession::new(config)?))
            })
            .await?;
        Ok(session.as_ref())
    }
}

#[async_trait]
impl CloudProbe for SdkProbe {
    async fn fetch(&self, resource: &ResourceState) -> Result<Value, ProbeError> {
        let spec = spec_for(resource)?;
        let handle = CloudObjectHandle::locate(spec.locator, resource)?;
        let client = self.session().await?.client(spec.service, spec.version).await?;
        let path = render_path(spec.path, &handle, resource, client.project_id())?;
        debug!(address = %resource.address, %path, "reading live object");

        let object = match spec.lookup {
            Lookup::Get => client.get_json(&path).await?,
            Lookup::ListFilter {
                items_key,
                id_field,
            } => client
                .list_json(&path, items_key)
                .await?
                .into_iter()
                .find(|item| item.get(id_field).and_then(Value::as_str) == Some(handle.id()))
                .ok_or_else(|| SdkError::NotFound {
                    url: format!("{}/{path}", client.base_url()),
                })?,
        };

        match spec.envelope {
            None => Ok(object),
            Some(key) => object.get(key).cloned().ok_or_else(|| {
                ProbeError::Sdk(SdkError::Decode {
                    url: format!("{}/{path}", client.base_url()),
                    message: format!("missing '{key}' envelope"),
                })
            }),
        }
    }

    async fn tags(&self, resource: &ResourceState) -> Result<BTreeMap<String, String>, ProbeError> {
        let spec = spec_for(resource)?;
        let endpoint = spec.tags.ok_or_else(|| ProbeError::Locator {
            address: resource.address.clone(),
            message: format!("{} has no tag endpoint", spec.kind),
        })?;
        let handle = CloudObjectHandle::locate(spec.locator, resource)?;
        let client = self.session().await?.client(spec.service, endpoint.version).await?;
        let path = render_path(endpoint.path, &handle, resource, client.project_id())?;
        Ok(client.list_tags(&path, endpoint.shape).await?)
    }

    async fn client(
        &self,
        service: Service,
        version: ApiVersion,
    ) -> Result<ServiceClient, ProbeError> {
        Ok(self.session().await?.client(service, version).await?)
    }
}

/// Status of a live object according to its kind's status pointer.
pub fn live_status(spec: &KindSpec, object: &Value) -> Option<String> {
    let pointer = spec.status?;
    object.pointer(pointer).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
