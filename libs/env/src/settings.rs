//! Harness settings.
//!
//! These control how the harness drives the engine, as opposed to the
//! registry, which describes the cloud under test.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::EnvError;

/// Default budget for a single apply, plan, import, or destroy.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const TF_ACC: &str = "TF_ACC";
const TERRAFORM_PATH: &str = "TF_ACC_TERRAFORM_PATH";
const PROVIDER_DIR: &str = "TF_ACC_PROVIDER_DIR";
const PROVIDER_VERSION: &str = "TF_ACC_PROVIDER_VERSION";
const STEP_TIMEOUT_SECS: &str = "OTC_ACC_STEP_TIMEOUT_SECS";
const KEEP_WORKDIR: &str = "OTC_ACC_KEEP_WORKDIR";

/// Engine and runner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Acceptance cases only run when `TF_ACC` is set.
    pub acceptance_enabled: bool,

    /// Engine binary.
    pub terraform_path: PathBuf,

    /// Directory with a locally built provider binary.
    pub provider_dir: Option<PathBuf>,

    /// Registry version constraint used when no local binary is given.
    pub provider_version: Option<String>,

    /// Minimum per-step timeout, overriding shorter explicit ones.
    pub step_timeout_override: Option<Duration>,

    /// Keep per-case working directories after teardown.
    pub keep_workdir: bool,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            acceptance_enabled: false,
            terraform_path: PathBuf::from("terraform"),
            provider_dir: None,
            provider_version: None,
            step_timeout_override: None,
            keep_workdir: false,
        }
    }
}

impl HarnessSettings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Fails on a non-numeric or zero timeout or an unparsable boolean.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HarnessSettings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let step_timeout_override = read(STEP_TIMEOUT_SECS)
            .map(|raw| parse_timeout_secs(STEP_TIMEOUT_SECS, &raw))
            .transpose()?;
        let keep_workdir = read(KEEP_WORKDIR)
            .map(|raw| parse_bool(KEEP_WORKDIR, &raw))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            acceptance_enabled: read(TF_ACC).is_some(),
            terraform_path: read(TERRAFORM_PATH)
                .map_or_else(|| PathBuf::from("terraform"), PathBuf::from),
            provider_dir: read(PROVIDER_DIR).map(PathBuf::from),
            provider_version: read(PROVIDER_VERSION),
            step_timeout_override,
            keep_workdir,
        })
    }

    /// Effective timeout for a step that asked for `requested`.
    #[must_use]
    pub fn resolve_timeout(&self, requested: Duration) -> Duration {
        match self.step_timeout_override {
            Some(floor) => requested.max(floor),
            None => requested,
        }
    }
}

fn parse_timeout_secs(name: &'static str, raw: &str) -> Result<Duration, EnvError> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| EnvError::invalid(name, "must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(EnvError::invalid(name, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, EnvError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(EnvError::invalid(
            name,
            format!("expected true/false or 1/0, got '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<HarnessSettings, EnvError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HarnessSettings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s, HarnessSettings::default());
        assert!(!s.acceptance_enabled);
    }

    #[test]
    fn test_tf_acc_enables_cases() {
        assert!(settings(&[("TF_ACC", "1")]).unwrap().acceptance_enabled);
        assert!(!settings(&[("TF_ACC", "")]).unwrap().acceptance_enabled);
    }

    #[test]
    fn test_timeout_override_is_a_floor() {
        let s = settings(&[("OTC_ACC_STEP_TIMEOUT_SECS", "900")]).unwrap();
        assert_eq!(
            s.resolve_timeout(Duration::from_secs(60)),
            Duration::from_secs(900)
        );
        assert_eq!(
            s.resolve_timeout(Duration::from_secs(3600)),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        assert!(settings(&[("OTC_ACC_STEP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(settings(&[("OTC_ACC_STEP_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_keep_workdir_parsing() {
        assert!(settings(&[("OTC_ACC_KEEP_WORKDIR", "TRUE")]).unwrap().keep_workdir);
        assert!(!settings(&[("OTC_ACC_KEEP_WORKDIR", "0")]).unwrap().keep_workdir);
        assert!(settings(&[("OTC_ACC_KEEP_WORKDIR", "maybe")]).is_err());
    }
}
