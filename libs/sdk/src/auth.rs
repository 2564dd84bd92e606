//! Identity (Keystone v3) token exchange.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{AuthMethod, CloudConfig};
use crate::error::SdkError;

const SUBJECT_TOKEN: &str = "X-Subject-Token";
const AUTH_TOKEN: &str = "X-Auth-Token";

/// A scoped token.
#[derive(Clone)]
pub struct AuthToken {
    pub value: String,
    pub project_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("project_id", &self.project_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    project: Option<ProjectRef>,
}

#[derive(Debug, Deserialize)]
struct ProjectRef {
    id: String,
}

/// The `/v3/auth/tokens` URL for an identity endpoint.
pub(crate) fn tokens_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        format!("{base}/auth/tokens")
    } else {
        format!("{base}/v3/auth/tokens")
    }
}

fn scope(config: &CloudConfig) -> Result<Value, SdkError> {
    if let Some(id) = &config.project_id {
        return Ok(json!({ "project": { "id": id } }));
    }
    match &config.project_name {
        Some(name) => {
            let domain = config.domain_name.as_deref().unwrap_or_default();
            Ok(json!({ "project": { "name": name, "domain": { "name": domain } } }))
        }
        None => Err(SdkError::Config(
            "a project name or id is required to scope the token".into(),
        )),
    }
}

/// Obtain a project-scoped token for the configured credentials.
///
/// # Errors
///
/// - [`SdkError::UnsupportedAuth`] for access/secret key credentials
/// - [`SdkError::Auth`] when the identity service rejects the request
pub(crate) async fn issue_token(
    http: &reqwest::Client,
    config: &CloudConfig,
) -> Result<AuthToken, SdkError> {
    let url = tokens_url(&config.auth_url);

    let response = match &config.auth {
        AuthMethod::Password {
            user_name,
            password,
        } => {
            let domain = config.domain_name.as_deref().ok_or_else(|| {
                SdkError::Config("OS_DOMAIN_NAME is required for password authentication".into())
            })?;
            let body = json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": user_name,
                                "password": password,
                                "domain": { "name": domain }
                            }
                        }
                    },
                    "scope": scope(config)?
                }
            });
            debug!(%url, user = %user_name, "requesting password token");
            http.post(&url).json(&body).send().await?
        }
        AuthMethod::Token(token) => {
            debug!(%url, "validating supplied token");
            http.get(&url)
                .header(AUTH_TOKEN, token)
                .header(SUBJECT_TOKEN, token)
                .send()
                .await?
        }
        AuthMethod::AkSk { .. } => {
            return Err(SdkError::UnsupportedAuth(
                "read-back needs a token or user credentials, AK/SK is not supported".into(),
            ))
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SdkError::Auth {
            status: status.as_u16(),
            body,
        });
    }

    let value = match &config.auth {
        AuthMethod::Token(token) => token.clone(),
        _ => response
            .headers()
            .get(SUBJECT_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| SdkError::decode(&url, format!("missing {SUBJECT_TOKEN} header")))?,
    };

    let envelope: TokenEnvelope = response
        .json()
        .await
        .map_err(|e| SdkError::decode(&url, e.to_string()))?;

    let project_id = envelope
        .token
        .project
        .map(|p| p.id)
        .or_else(|| config.project_id.clone())
        .ok_or_else(|| SdkError::decode(&url, "token is not scoped to a project"))?;

    Ok(AuthToken {
        value,
        project_id,
        expires_at: envelope.token.expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://iam.eu-de.otc.t-systems.com/v3",
        "https://iam.eu-de.otc.t-systems.com/v3/auth/tokens"
    )]
    #[case(
        "https://iam.eu-de.otc.t-systems.com/v3/",
        "https://iam.eu-de.otc.t-systems.com/v3/auth/tokens"
    )]
    #[case("http://127.0.0.1:5000", "http://127.0.0.1:5000/v3/auth/tokens")]
    fn test_tokens_url(#[case] auth_url: &str, #[case] expected: &str) {
        assert_eq!(tokens_url(auth_url), expected);
    }
}
