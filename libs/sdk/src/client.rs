//! Authenticated sessions and per-service clients.

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::auth::{issue_token, AuthToken};
use crate::config::CloudConfig;
use crate::endpoint::{cloud_domain, service_root, ApiVersion, Service};
use crate::error::SdkError;
use crate::tags::{parse_tags, TagShape};

/// A session shared by every read-back in a case.
///
/// The token is obtained lazily on first use and reused afterwards.
#[derive(Debug)]
pub struct CloudSession {
    config: CloudConfig,
    http: reqwest::Client,
    domain: String,
    token: OnceCell<AuthToken>,
}

impl CloudSession {
    /// Build a session. No network traffic happens until [`authenticate`].
    ///
    /// [`authenticate`]: CloudSession::authenticate
    ///
    /// # Errors
    ///
    /// Fails on unreadable TLS material or an identity URL without a host.
    pub fn new(config: CloudConfig) -> Result<Self, SdkError> {
        let http = config.http_client()?;
        let domain = cloud_domain(&config.auth_url, &config.region)?;
        Ok(Self {
            config,
            http,
            domain,
            token: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Obtain (once) and return the scoped token.
    ///
    /// # Errors
    ///
    /// See [`SdkError::Auth`] and [`SdkError::UnsupportedAuth`].
    pub async fn authenticate(&self) -> Result<&AuthToken, SdkError> {
        self.token
            .get_or_try_init(|| async {
                let token = issue_token(&self.http, &self.config).await?;
                debug!(project_id = %token.project_id, "session authenticated");
                Ok(token)
            })
            .await
    }

    /// A client for one service at one API version.
    ///
    /// # Errors
    ///
    /// Fails when authentication fails or the version is unknown for the
    /// service.
    pub async fn client(
        &self,
        service: Service,
        version: ApiVersion,
    ) -> Result<ServiceClient, SdkError> {
        let prefix = service.path_prefix(version)?;
        let token = self.authenticate().await?;

        let root = match self.config.endpoint_overrides.get(&service) {
            Some(root) => root.trim_end_matches('/').to_string(),
            None => service_root(service, &self.config.region, &self.domain),
        };
        let base_url = format!(
            "{root}/{}",
            prefix.replace("{project_id}", &token.project_id)
        );

        Ok(ServiceClient {
            http: self.http.clone(),
            base_url,
            token: token.value.clone(),
            project_id: token.project_id.clone(),
        })
    }
}

/// Read-only calls against one service endpoint.
#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    project_id: String,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document.
    ///
    /// # Errors
    ///
    /// 404 maps to [`SdkError::NotFound`]; any other non-success status to
    /// [`SdkError::Status`].
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn get_json(&self, path: &str) -> Result<Value, SdkError> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        self.handle_response(&url, response).await
    }

    /// GET a list and return the array stored under `items_key`.
    ///
    /// # Errors
    ///
    /// As [`get_json`](Self::get_json), plus [`SdkError::Decode`] when the
    /// member is missing or not an array.
    pub async fn list_json(&self, path: &str, items_key: &str) -> Result<Vec<Value>, SdkError> {
        let body = self.get_json(path).await?;
        match body.get(items_key) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(SdkError::decode(
                &self.url(path),
                format!("expected a list under '{items_key}'"),
            )),
        }
    }

    /// GET the tags attached to an object.
    ///
    /// # Errors
    ///
    /// As [`get_json`](Self::get_json), plus shape errors.
    pub async fn list_tags(
        &self,
        path: &str,
        shape: TagShape,
    ) -> Result<BTreeMap<String, String>, SdkError> {
        let body = self.get_json(path).await?;
        parse_tags(&body, shape, &self.url(path))
    }

    async fn handle_response(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<Value, SdkError> {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&text).map_err(|e| SdkError::decode(url, e.to_string()))
        } else {
            self.handle_error(url, response).await
        }
    }

    async fn handle_error<T>(&self, url: &str, response: reqwest::Response) -> Result<T, SdkError> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status == 404 {
            return Err(SdkError::NotFound {
                url: url.to_string(),
            });
        }

        Err(SdkError::Status {
            url: url.to_string(),
            status,
            body,
        })
    }
}
