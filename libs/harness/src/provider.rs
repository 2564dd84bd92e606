//! Provider factory.
//!
//! The provider is bound and validated once per process and then shared by
//! every case. Cases reference it through the stable local name
//! [`PROVIDER_ALIAS`]; the factory supplies the `required_providers`
//! preamble that binds that name.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use otc_acc_env::HarnessSettings;
use otc_acc_sdk::{is_inline_pem, CloudConfig, CloudSession};
use serde_json::Value;
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::engine::{Engine, WorkRoot};
use crate::error::ProviderError;

/// Registry source address of the provider.
pub const PROVIDER_SOURCE: &str = "opentelekomcloud/opentelekomcloud";

/// Local name templates use for the provider.
pub const PROVIDER_ALIAS: &str = "opentelekomcloud";

const REGISTRY_HOST: &str = "registry.terraform.io";

/// How the engine finds the provider plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderBinding {
    /// A locally built plugin in `dir`, bound through CLI-config overrides.
    DevOverride { dir: PathBuf },
    /// Installation from the registry, optionally pinned.
    Registry { version: Option<String> },
}

impl ProviderBinding {
    pub fn from_settings(settings: &HarnessSettings) -> Self {
        match &settings.provider_dir {
            Some(dir) => ProviderBinding::DevOverride { dir: dir.clone() },
            None => ProviderBinding::Registry {
                version: settings.provider_version.clone(),
            },
        }
    }

    fn cli_config(&self) -> Option<String> {
        match self {
            ProviderBinding::DevOverride { dir } => Some(format!(
                "provider_installation {{\n  dev_overrides {{\n    \"{PROVIDER_SOURCE}\" = \"{}\"\n  }}\n  direct {{}}\n}}\n",
                dir.display()
            )),
            ProviderBinding::Registry { .. } => None,
        }
    }
}

/// The validated, shared provider.
#[derive(Debug)]
pub struct ProviderInstance {
    binding: ProviderBinding,
    preamble: String,
    env: BTreeMap<String, String>,
    resource_kinds: BTreeSet<String>,
    // Keeps the CLI config file alive for the life of the process.
    _config_dir: Option<TempDir>,
}

impl ProviderInstance {
    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    /// The `terraform { required_providers { ... } }` block.
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Environment every engine process needs to resolve the provider.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Resource types the provider's schema declares.
    pub fn resource_kinds(&self) -> &BTreeSet<String> {
        &self.resource_kinds
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.resource_kinds.contains(kind)
    }

    /// Prefix a rendered configuration with the preamble.
    pub fn document(&self, rendered: &str) -> String {
        format!("{}\n{rendered}", self.preamble)
    }
}

fn preamble(binding: &ProviderBinding) -> String {
    let version = match binding {
        ProviderBinding::Registry {
            version: Some(version),
        } => format!("\n      version = \"{version}\""),
        _ => String::new(),
    };
    format!(
        "terraform {{\n  required_providers {{\n    {PROVIDER_ALIAS} = {{\n      source  = \"{PROVIDER_SOURCE}\"{version}\n    }}\n  }}\n}}\n"
    )
}

/// Extract resource types from `providers schema -json` output.
///
/// # Errors
///
/// Fails when the provider is absent or declares no resources.
pub fn validate_schema(schema: &Value) -> Result<BTreeSet<String>, ProviderError> {
    let schemas = schema
        .get("provider_schemas")
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderError::Schema("no provider_schemas in engine output".into()))?;

    let full_source = format!("{REGISTRY_HOST}/{PROVIDER_SOURCE}");
    let provider = schemas
        .iter()
        .find(|(source, _)| source.as_str() == full_source || source.ends_with(PROVIDER_SOURCE))
        .map(|(_, v)| v)
        .ok_or_else(|| ProviderError::Schema(format!("{PROVIDER_SOURCE} is not installed")))?;

    let kinds: BTreeSet<String> = provider
        .get("resource_schemas")
        .and_then(Value::as_object)
        .map(|resources| resources.keys().cloned().collect())
        .unwrap_or_default();
    if kinds.is_empty() {
        return Err(ProviderError::Schema(format!(
            "{PROVIDER_SOURCE} declares no resources"
        )));
    }
    Ok(kinds)
}

/// Builds the shared [`ProviderInstance`] on first use.
pub struct ProviderFactory {
    binding: ProviderBinding,
    engine: Arc<dyn Engine>,
    instance: OnceCell<Arc<ProviderInstance>>,
}

impl ProviderFactory {
    pub fn new(binding: ProviderBinding, engine: Arc<dyn Engine>) -> Self {
        Self {
            binding,
            engine,
            instance: OnceCell::new(),
        }
    }

    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    /// The shared instance. Bound and validated exactly once; concurrent
    /// callers wait for the first.
    ///
    /// # Errors
    ///
    /// Fails when the binding cannot be written, the engine cannot load the
    /// provider, or the schema does not describe it. A failed attempt is
    /// retried by the next caller.
    pub async fn instance(&self) -> Result<Arc<ProviderInstance>, ProviderError> {
        self.instance
            .get_or_try_init(|| async { self.build().await.map(Arc::new) })
            .await
            .cloned()
    }

    async fn build(&self) -> Result<ProviderInstance, ProviderError> {
        let mut env = BTreeMap::new();
        let config_dir = match self.binding.cli_config() {
            Some(contents) => {
                let dir = tempfile::Builder::new()
                    .prefix("otc-acc-provider-")
                    .tempdir()
                    .map_err(|source| ProviderError::Io {
                        path: std::env::temp_dir(),
                        source,
                    })?;
                let path = dir.path().join("dev.tfrc");
                std::fs::write(&path, contents).map_err(|source| ProviderError::Io {
                    path: path.clone(),
                    source,
                })?;
                env.insert(
                    "TF_CLI_CONFIG_FILE".to_string(),
                    path.display().to_string(),
                );
                Some(dir)
            }
            None => None,
        };

        let preamble = preamble(&self.binding);

        let root = WorkRoot::create("provider-schema", false)?;
        let workspace = root.workspace("schema", &env)?;
        workspace.write_config(&preamble)?;
        self.engine.init(&workspace).await?;
        let schema = self.engine.provider_schema(&workspace).await?;
        let resource_kinds = validate_schema(&schema)?;

        info!(
            binding = ?self.binding,
            resources = resource_kinds.len(),
            "provider validated"
        );

        Ok(ProviderInstance {
            binding: self.binding.clone(),
            preamble,
            env,
            resource_kinds,
            _config_dir: config_dir,
        })
    }

    /// Configure a client directly from a raw provider configuration map and
    /// authenticate it.
    ///
    /// Independent of the shared instance: each call builds its own session.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, unreadable TLS material, or a rejected
    /// token exchange.
    pub async fn configure_raw(
        raw: &BTreeMap<String, String>,
    ) -> Result<CloudSession, ProviderError> {
        let config = CloudConfig::from_raw(raw)?;
        debug!(auth_url = %config.auth_url, region = %config.region, "configuring from raw map");
        let session = CloudSession::new(config)?;
        session.authenticate().await?;
        Ok(session)
    }
}

/// TLS material from an environment pointer: an existing file path, or
/// inline PEM written to a temporary file that is removed on drop.
#[derive(Debug)]
pub enum PemSource {
    Path(PathBuf),
    Inline(NamedTempFile),
}

impl PemSource {
    /// Detect whether `value` is inline PEM or a path.
    ///
    /// # Errors
    ///
    /// Fails when inline contents cannot be written out.
    pub fn from_value(value: &str) -> Result<Self, ProviderError> {
        if !is_inline_pem(value) {
            return Ok(PemSource::Path(PathBuf::from(value)));
        }
        let io_err = |source| ProviderError::Io {
            path: std::env::temp_dir(),
            source,
        };
        let mut file = tempfile::Builder::new()
            .prefix("otc-acc-")
            .suffix(".pem")
            .tempfile()
            .map_err(io_err)?;
        std::io::Write::write_all(&mut file, value.as_bytes()).map_err(io_err)?;
        Ok(PemSource::Inline(file))
    }

    pub fn path(&self) -> &Path {
        match self {
            PemSource::Path(path) => path,
            PemSource::Inline(file) => file.path(),
        }
    }

    /// The path as a raw-config value.
    pub fn to_config_value(&self) -> String {
        self.path().display().to_string()
    }
}

/// An explicit `provider "opentelekomcloud"` block.
///
/// Attributes set here take precedence over the `OS_*` variables the plugin
/// reads on its own, so a case can drive the plugin's configure step with
/// specific TLS material. Multi-line values (inline PEM) render as heredocs.
#[derive(Debug, Clone, Default)]
pub struct ProviderBlock {
    attrs: BTreeMap<String, BlockValue>,
}

#[derive(Debug, Clone)]
enum BlockValue {
    Text(String),
    Bool(bool),
}

impl ProviderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), BlockValue::Text(value.into()));
        self
    }

    /// Set a boolean attribute.
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.attrs.insert(name.into(), BlockValue::Bool(value));
        self
    }

    /// Point `name` at TLS material: the file path for a path source, the
    /// PEM text itself for `inline`.
    ///
    /// # Errors
    ///
    /// Fails when `inline` is requested and the file cannot be read.
    pub fn pem(
        self,
        name: impl Into<String>,
        source: &PemSource,
        inline: bool,
    ) -> Result<Self, ProviderError> {
        if !inline {
            return Ok(self.attr(name, source.to_config_value()));
        }
        let path = source.path();
        let contents = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.attr(name, contents))
    }

    pub fn render(&self) -> String {
        let mut out = format!("provider \"{PROVIDER_ALIAS}\" {{\n");
        for (name, value) in &self.attrs {
            match value {
                BlockValue::Bool(flag) => out.push_str(&format!("  {name} = {flag}\n")),
                BlockValue::Text(text) if text.contains('\n') => {
                    let mut body = escape_template(text);
                    if !body.ends_with('\n') {
                        body.push('\n');
                    }
                    out.push_str(&format!("  {name} = <<EOT\n{body}EOT\n"));
                }
                BlockValue::Text(text) => {
                    let quoted = text.replace('\\', "\\\\").replace('"', "\\\"");
                    let quoted = escape_template(&quoted);
                    out.push_str(&format!("  {name} = \"{quoted}\"\n"));
                }
            }
        }
        out.push_str("}\n");
        out
    }
}

fn escape_template(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}
