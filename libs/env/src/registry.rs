//! The environment registry.
//!
//! A registry is resolved once from the process environment and is read-only
//! afterwards. Cases receive it by reference; there is no global mutable copy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::error::EnvError;
use crate::keys::{EnvFlag, EnvKey};

/// Resolved settings and feature flags.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvRegistry {
    values: BTreeMap<EnvKey, String>,
    flags: BTreeSet<EnvFlag>,
}

impl EnvRegistry {
    /// Resolves the registry from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when a relevant variable is not valid UTF-8 or when no region
    /// can be resolved.
    pub fn from_env() -> Result<Self, EnvError> {
        let mut raw = BTreeMap::new();
        let names = EnvKey::ALL
            .iter()
            .flat_map(|k| std::iter::once(k.env_var()).chain(k.aliases().iter().copied()))
            .chain(EnvFlag::ALL.iter().map(|f| f.env_var()));
        for name in names {
            if let Some(value) = std::env::var_os(name) {
                let value = value.into_string().map_err(|_| EnvError::InvalidUnicode {
                    name: name.to_string(),
                })?;
                raw.insert(name.to_string(), value);
            }
        }
        Self::from_lookup(|name| raw.get(name).cloned())
    }

    /// Resolves the registry through an arbitrary variable lookup.
    ///
    /// Canonical variables win over aliases. Empty or whitespace-only values
    /// count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::RegionUnresolvable`] when neither a region nor a
    /// project/tenant name is available.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nonempty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut values = BTreeMap::new();
        for key in EnvKey::ALL.iter().copied() {
            let found = std::iter::once(key.env_var())
                .chain(key.aliases().iter().copied())
                .find_map(|name| nonempty(name));
            if let Some(value) = found {
                values.insert(key, value.trim().to_string());
            }
        }

        if !values.contains_key(&EnvKey::Region) {
            let project = values
                .get(&EnvKey::ProjectName)
                .ok_or(EnvError::RegionUnresolvable)?;
            let region = derive_region(project);
            debug!(%region, project = %project, "derived region from project name");
            values.insert(EnvKey::Region, region);
        }

        let flags = EnvFlag::ALL
            .iter()
            .copied()
            .filter(|flag| nonempty(flag.env_var()).is_some())
            .collect();

        Ok(Self { values, flags })
    }

    /// Builds a registry from `(variable, value)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`EnvRegistry::from_lookup`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(|name| map.get(name).cloned())
    }

    /// Value for a key, if set.
    #[must_use]
    pub fn get(&self, key: EnvKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Value for a logical name such as `vpc_id`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        EnvKey::from_name(name).and_then(|key| self.get(key))
    }

    /// Whether a key has a value.
    #[must_use]
    pub fn is_set(&self, key: EnvKey) -> bool {
        self.values.contains_key(&key)
    }

    /// The resolved region. Always present after initialisation.
    #[must_use]
    pub fn region(&self) -> &str {
        self.get(EnvKey::Region).unwrap_or_default()
    }

    /// Whether a feature flag is set.
    #[must_use]
    pub fn flag(&self, flag: EnvFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Iterates over every set key and its value.
    pub fn iter(&self) -> impl Iterator<Item = (EnvKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Iterates over every set flag.
    pub fn flags(&self) -> impl Iterator<Item = EnvFlag> + '_ {
        self.flags.iter().copied()
    }
}

impl fmt::Debug for EnvRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if key.is_secret() {
                map.entry(&key.name(), &"<redacted>");
            } else {
                map.entry(&key.name(), value);
            }
        }
        map.entry(&"flags", &self.flags);
        map.finish()
    }
}

/// OTC project names follow `{region}_{suffix}`; the bare region name is the
/// region's default project.
fn derive_region(project: &str) -> String {
    project
        .split_once('_')
        .map_or(project, |(region, _)| region)
        .to_string()
}
