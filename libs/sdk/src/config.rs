//! Client configuration.
//!
//! A [`CloudConfig`] is built either from the environment registry (the usual
//! path for read-back) or from a raw provider-style key/value map (the SSL
//! configuration family, which exercises the same options the plugin
//! accepts).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use otc_acc_env::{EnvKey, EnvRegistry};

use crate::endpoint::Service;
use crate::error::SdkError;

/// Default request timeout for read-back calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How the session obtains a token.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Keystone v3 password exchange.
    Password { user_name: String, password: String },
    /// A pre-issued token.
    Token(String),
    /// Access/secret key pair. Request signing is not implemented.
    AkSk { access_key: String },
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Password { user_name, .. } => f
                .debug_struct("Password")
                .field("user_name", user_name)
                .finish_non_exhaustive(),
            AuthMethod::Token(_) => f.write_str("Token(<redacted>)"),
            AuthMethod::AkSk { access_key } => f
                .debug_struct("AkSk")
                .field("access_key", access_key)
                .finish_non_exhaustive(),
        }
    }
}

/// TLS material. Each value is either a file path or inline PEM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub ca_cert: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
    pub insecure: bool,
}

/// Everything needed to build an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub auth_url: String,
    pub region: String,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub domain_name: Option<String>,
    pub auth: AuthMethod,
    pub tls: TlsOptions,
    pub request_timeout: Duration,
    /// Per-service root URL overrides (scheme and host).
    pub endpoint_overrides: BTreeMap<Service, String>,
}

impl CloudConfig {
    /// Build from the environment registry.
    ///
    /// # Errors
    ///
    /// Fails when the identity endpoint or every credential is missing.
    pub fn from_registry(registry: &EnvRegistry) -> Result<Self, SdkError> {
        let get = |key: EnvKey| registry.get(key).map(str::to_string);

        let auth_url = get(EnvKey::AuthUrl)
            .ok_or_else(|| SdkError::Config("OS_AUTH_URL is not set".into()))?;
        let auth = auth_method(
            get(EnvKey::Token),
            get(EnvKey::UserName),
            get(EnvKey::Password),
            get(EnvKey::AccessKey),
            get(EnvKey::SecretKey),
        )?;

        Ok(Self {
            auth_url,
            region: registry.region().to_string(),
            project_name: get(EnvKey::ProjectName),
            project_id: get(EnvKey::TenantId),
            domain_name: get(EnvKey::DomainName),
            auth,
            tls: TlsOptions {
                ca_cert: get(EnvKey::CaCert),
                client_cert: get(EnvKey::Cert),
                client_key: get(EnvKey::Key),
                insecure: false,
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoint_overrides: BTreeMap::new(),
        })
    }

    /// Build from a raw provider configuration map.
    ///
    /// Recognised keys: `auth_url`, `region`, `tenant_name`, `tenant_id`,
    /// `domain_name`, `user_name`, `password`, `token`, `access_key`,
    /// `secret_key`, `cacert_file`, `cert`, `key`, `insecure`.
    ///
    /// # Errors
    ///
    /// Fails on missing identity endpoint, unresolvable region, missing
    /// credentials, a `cert` without `key` (or vice versa), or an invalid
    /// `insecure` value.
    pub fn from_raw(raw: &BTreeMap<String, String>) -> Result<Self, SdkError> {
        let get = |name: &str| raw.get(name).filter(|v| !v.is_empty()).cloned();

        let auth_url =
            get("auth_url").ok_or_else(|| SdkError::Config("auth_url is required".into()))?;
        let project_name = get("tenant_name");
        let region = get("region")
            .or_else(|| {
                project_name
                    .as_deref()
                    .map(|p| p.split_once('_').map_or(p, |(r, _)| r).to_string())
            })
            .ok_or_else(|| SdkError::Config("region or tenant_name is required".into()))?;

        let client_cert = get("cert");
        let client_key = get("key");
        if client_cert.is_some() != client_key.is_some() {
            return Err(SdkError::Config(
                "cert and key must be configured together".into(),
            ));
        }
        let insecure = match get("insecure").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(SdkError::Config(format!(
                    "insecure must be true or false, got '{other}'"
                )))
            }
        };

        Ok(Self {
            auth_url,
            region,
            project_name,
            project_id: get("tenant_id"),
            domain_name: get("domain_name"),
            auth: auth_method(
                get("token"),
                get("user_name"),
                get("password"),
                get("access_key"),
                get("secret_key"),
            )?,
            tls: TlsOptions {
                ca_cert: get("cacert_file"),
                client_cert,
                client_key,
                insecure,
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoint_overrides: BTreeMap::new(),
        })
    }

    /// Route a service to a specific root URL.
    #[must_use]
    pub fn with_endpoint(mut self, service: Service, root: impl Into<String>) -> Self {
        self.endpoint_overrides.insert(service, root.into());
        self
    }

    /// Build the underlying HTTP client, applying TLS options.
    ///
    /// # Errors
    ///
    /// Fails when TLS material cannot be read or parsed.
    pub fn http_client(&self) -> Result<reqwest::Client, SdkError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(concat!("otc-acc/", env!("CARGO_PKG_VERSION")));

        if let Some(ca) = &self.tls.ca_cert {
            let pem = load_pem(ca)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        if let (Some(cert), Some(key)) = (&self.tls.client_cert, &self.tls.client_key) {
            let mut pem = load_pem(cert)?;
            pem.push(b'\n');
            pem.extend(load_pem(key)?);
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
        }
        if self.tls.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}

fn auth_method(
    token: Option<String>,
    user_name: Option<String>,
    password: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
) -> Result<AuthMethod, SdkError> {
    if let Some(token) = token {
        return Ok(AuthMethod::Token(token));
    }
    if let (Some(user_name), Some(password)) = (user_name, password) {
        return Ok(AuthMethod::Password {
            user_name,
            password,
        });
    }
    if let (Some(access_key), Some(_)) = (access_key, secret_key) {
        return Ok(AuthMethod::AkSk { access_key });
    }
    Err(SdkError::Config(
        "no credentials: set a token, user name and password, or access and secret key".into(),
    ))
}

/// Whether a value holds PEM text rather than a path.
pub fn is_inline_pem(value: &str) -> bool {
    value.trim_start().starts_with("-----BEGIN")
}

/// Read PEM bytes from inline text or a file path.
///
/// # Errors
///
/// Fails when the path cannot be read.
pub fn load_pem(value: &str) -> Result<Vec<u8>, SdkError> {
    if is_inline_pem(value) {
        return Ok(value.as_bytes().to_vec());
    }
    let path = Path::new(value);
    std::fs::read(path).map_err(|source| SdkError::Io {
        path: PathBuf::from(path),
        source,
    })
}
