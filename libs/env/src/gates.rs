//! Precondition gates.
//!
//! A gate inspects the registry before any engine work starts and decides
//! whether the case proceeds, is skipped, or fails. Feature gates always run
//! the required-env gate first, so a misconfigured environment fails loudly
//! instead of silently skipping.

use std::fmt;
use std::sync::Arc;

use crate::keys::{EnvFlag, EnvKey};
use crate::registry::EnvRegistry;

/// Settings every resource case needs.
pub const REQUIRED_KEYS: &[EnvKey] = &[
    EnvKey::AuthUrl,
    EnvKey::Region,
    EnvKey::PoolName,
    EnvKey::VpcId,
    EnvKey::SubnetId,
    EnvKey::NetworkId,
    EnvKey::AvailabilityZone,
    EnvKey::ExtgwId,
];

/// Result of evaluating a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Run the case.
    Proceed,
    /// End the case successfully without running it.
    Skip(String),
    /// Fail the case before any setup.
    Fail(String),
}

impl GateOutcome {
    /// Returns true if the case may proceed.
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Optional service families, each opened by environment settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Dcs,
    Dms,
    Mrs,
    Swift,
    Vpn,
    BmsNic,
    AdminOnly,
    SslTests,
    S3,
    Maas,
    Deprecated,
}

impl Feature {
    pub const ALL: &'static [Feature] = &[
        Self::Dcs,
        Self::Dms,
        Self::Mrs,
        Self::Swift,
        Self::Vpn,
        Self::BmsNic,
        Self::AdminOnly,
        Self::SslTests,
        Self::S3,
        Self::Maas,
        Self::Deprecated,
    ];

    /// Short name used in skip reasons.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dcs => "dcs",
            Self::Dms => "dms",
            Self::Mrs => "mrs",
            Self::Swift => "swift",
            Self::Vpn => "vpn",
            Self::BmsNic => "bms_nic",
            Self::AdminOnly => "admin_only",
            Self::SslTests => "ssl_tests",
            Self::S3 => "s3",
            Self::Maas => "maas",
            Self::Deprecated => "deprecated",
        }
    }

    /// Variables that must all be set for the feature to be enabled.
    fn requirements(self) -> Requirements {
        match self {
            Self::Dcs => Requirements::Flag(EnvFlag::Dcs),
            Self::Dms => Requirements::Flag(EnvFlag::Dms),
            Self::Mrs => Requirements::Flag(EnvFlag::Mrs),
            Self::Swift => Requirements::Flag(EnvFlag::Swift),
            Self::Vpn => Requirements::Flag(EnvFlag::Vpn),
            Self::Maas => Requirements::Flag(EnvFlag::Maas),
            Self::SslTests => Requirements::Flag(EnvFlag::SslTests),
            Self::AdminOnly => Requirements::Flag(EnvFlag::TenantAdmin),
            Self::Deprecated => Requirements::Flag(EnvFlag::Deprecated),
            Self::BmsNic => Requirements::Keys(&[EnvKey::NicId, EnvKey::BmsFlavorName]),
            Self::S3 => Requirements::Keys(&[EnvKey::AccessKey, EnvKey::SecretKey]),
        }
    }

    fn missing(self, registry: &EnvRegistry) -> Vec<&'static str> {
        match self.requirements() {
            Requirements::Flag(flag) if registry.flag(flag) => Vec::new(),
            Requirements::Flag(flag) => vec![flag.env_var()],
            Requirements::Keys(keys) => keys
                .iter()
                .filter(|key| !registry.is_set(**key))
                .map(|key| key.env_var())
                .collect(),
        }
    }
}

enum Requirements {
    Flag(EnvFlag),
    Keys(&'static [EnvKey]),
}

type GateFn = dyn Fn(&EnvRegistry) -> GateOutcome + Send + Sync;

/// A named predicate over the registry.
#[derive(Clone)]
pub enum Gate {
    /// Fails when any of [`REQUIRED_KEYS`] or both flavor settings are missing.
    RequiredEnv,
    /// Fails when the endpoint or region is missing. For cases that only
    /// exercise client construction.
    Credentials,
    /// Required-env gate, then skip unless the feature is enabled.
    Feature(Feature),
    /// Evaluates gates in order; the first non-proceed outcome wins.
    All(Vec<Gate>),
    /// Caller-supplied predicate.
    Custom { name: String, check: Arc<GateFn> },
}

impl Gate {
    /// Creates a feature gate.
    pub fn feature(feature: Feature) -> Self {
        Self::Feature(feature)
    }

    /// Creates a custom gate.
    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&EnvRegistry) -> GateOutcome + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Gate name for reports.
    pub fn name(&self) -> String {
        match self {
            Self::RequiredEnv => "required_env".to_string(),
            Self::Credentials => "credentials".to_string(),
            Self::Feature(feature) => feature.name().to_string(),
            Self::All(gates) => gates
                .iter()
                .map(Gate::name)
                .collect::<Vec<_>>()
                .join("+"),
            Self::Custom { name, .. } => name.clone(),
        }
    }

    /// Evaluates the gate.
    pub fn evaluate(&self, registry: &EnvRegistry) -> GateOutcome {
        match self {
            Self::RequiredEnv => required_env(registry),
            Self::Credentials => missing_outcome(
                [EnvKey::AuthUrl, EnvKey::Region]
                    .iter()
                    .filter(|key| !registry.is_set(**key))
                    .map(|key| key.env_var())
                    .collect(),
            ),
            Self::Feature(feature) => {
                let base = required_env(registry);
                if !base.is_proceed() {
                    return base;
                }
                let missing = feature.missing(registry);
                if missing.is_empty() {
                    GateOutcome::Proceed
                } else {
                    GateOutcome::Skip(format!(
                        "{} tests disabled: {} not set",
                        feature.name(),
                        missing.join(", ")
                    ))
                }
            }
            Self::All(gates) => gates
                .iter()
                .map(|gate| gate.evaluate(registry))
                .find(|outcome| !outcome.is_proceed())
                .unwrap_or(GateOutcome::Proceed),
            Self::Custom { check, .. } => check(registry),
        }
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gate({})", self.name())
    }
}

fn required_env(registry: &EnvRegistry) -> GateOutcome {
    let mut missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .filter(|key| !registry.is_set(**key))
        .map(|key| key.env_var())
        .collect();
    if !registry.is_set(EnvKey::FlavorId) && !registry.is_set(EnvKey::FlavorName) {
        missing.push("OS_FLAVOR_ID or OS_FLAVOR_NAME");
    }
    missing_outcome(missing)
}

fn missing_outcome(missing: Vec<&'static str>) -> GateOutcome {
    if missing.is_empty() {
        GateOutcome::Proceed
    } else {
        GateOutcome::Fail(format!(
            "missing required environment: {}",
            missing.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: &[(&str, &str)] = &[
        ("OS_AUTH_URL", "https://iam.eu-de.otc.t-systems.com/v3"),
        ("OS_REGION_NAME", "eu-de"),
        ("OS_POOL_NAME", "admin_external_net"),
        ("OS_VPC_ID", "vpc-1"),
        ("OS_SUBNET_ID", "subnet-1"),
        ("OS_NETWORK_ID", "net-1"),
        ("OS_AVAILABILITY_ZONE", "eu-de-01"),
        ("OS_EXTGW_ID", "ext-1"),
        ("OS_FLAVOR_NAME", "s2.medium.1"),
    ];

    fn registry_without(skip: &str, extra: &[(&str, &str)]) -> EnvRegistry {
        let pairs = FULL
            .iter()
            .chain(extra.iter())
            .filter(|(name, _)| *name != skip)
            .copied();
        EnvRegistry::from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_required_env_proceeds_with_full_env() {
        let reg = registry_without("", &[]);
        assert_eq!(Gate::RequiredEnv.evaluate(&reg), GateOutcome::Proceed);
    }

    #[rstest]
    #[case("OS_AUTH_URL")]
    #[case("OS_POOL_NAME")]
    #[case("OS_VPC_ID")]
    #[case("OS_SUBNET_ID")]
    #[case("OS_NETWORK_ID")]
    #[case("OS_AVAILABILITY_ZONE")]
    #[case("OS_EXTGW_ID")]
    fn test_required_env_fails_for_each_missing_variable(#[case] var: &str) {
        let reg = registry_without(var, &[]);
        match Gate::RequiredEnv.evaluate(&reg) {
            GateOutcome::Fail(reason) => assert!(reason.contains(var), "{reason}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_either_flavor_setting_satisfies_gate() {
        let reg = registry_without("OS_FLAVOR_NAME", &[("OS_FLAVOR_ID", "flv-1")]);
        assert!(Gate::RequiredEnv.evaluate(&reg).is_proceed());

        let reg = registry_without("OS_FLAVOR_NAME", &[]);
        assert!(matches!(
            Gate::RequiredEnv.evaluate(&reg),
            GateOutcome::Fail(reason) if reason.contains("OS_FLAVOR_ID or OS_FLAVOR_NAME")
        ));
    }

    #[test]
    fn test_feature_gate_skips_when_flag_absent() {
        let reg = registry_without("", &[]);
        assert!(matches!(
            Gate::feature(Feature::Dcs).evaluate(&reg),
            GateOutcome::Skip(reason) if reason.contains("OS_DCS_ENVIRONMENT")
        ));
    }

    #[test]
    fn test_feature_gate_treats_empty_flag_as_unset() {
        let reg = registry_without("", &[("OS_VPN_ENVIRONMENT", "")]);
        assert!(matches!(
            Gate::feature(Feature::Vpn).evaluate(&reg),
            GateOutcome::Skip(_)
        ));
    }

    #[test]
    fn test_feature_gate_proceeds_when_flag_set() {
        let reg = registry_without("", &[("OS_MRS_ENVIRONMENT", "true")]);
        assert!(Gate::feature(Feature::Mrs).evaluate(&reg).is_proceed());
    }

    #[test]
    fn test_feature_gate_runs_base_gate_first() {
        let reg = registry_without("OS_VPC_ID", &[]);
        assert!(matches!(
            Gate::feature(Feature::Dcs).evaluate(&reg),
            GateOutcome::Fail(_)
        ));
    }

    #[test]
    fn test_key_backed_features() {
        let reg = registry_without("", &[("OS_NIC_ID", "nic-1")]);
        assert!(matches!(
            Gate::feature(Feature::BmsNic).evaluate(&reg),
            GateOutcome::Skip(reason) if reason.contains("OS_BMS_FLAVOR_NAME")
        ));

        let reg = registry_without("", &[("OS_ACCESS_KEY", "ak"), ("OS_SECRET_KEY", "sk")]);
        assert!(Gate::feature(Feature::S3).evaluate(&reg).is_proceed());
    }

    #[test]
    fn test_all_returns_first_non_proceed() {
        let reg = registry_without("", &[]);
        let gate = Gate::All(vec![
            Gate::RequiredEnv,
            Gate::custom("first", |_| GateOutcome::Skip("first".into())),
            Gate::custom("second", |_| GateOutcome::Fail("second".into())),
        ]);
        assert_eq!(gate.evaluate(&reg), GateOutcome::Skip("first".into()));
        assert_eq!(gate.name(), "required_env+first+second");
    }

    #[test]
    fn test_credentials_gate_ignores_shared_infrastructure() {
        let reg = EnvRegistry::from_pairs([
            ("OS_AUTH_URL", "https://iam.eu-de.otc.t-systems.com/v3"),
            ("OS_REGION_NAME", "eu-de"),
        ])
        .unwrap();
        assert!(Gate::Credentials.evaluate(&reg).is_proceed());
        assert!(!Gate::RequiredEnv.evaluate(&reg).is_proceed());
    }
}
