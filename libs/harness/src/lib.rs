//! # otc-acc-harness
//!
//! Acceptance-test harness for the OpenTelekomCloud provider.
//!
//! A [`TestCase`] is a list of [`Step`]s: apply a rendered configuration and
//! check the result, dry-run a configuration, or re-import an applied
//! resource. The [`Harness`] runs cases against a real engine and cloud and
//! always tears down what it created.
//!
//! ## Seams
//!
//! - [`Engine`]: the infrastructure engine ([`TerraformCli`] in practice)
//! - [`CloudProbe`]: live-object reads ([`SdkProbe`] in practice)
//!
//! Both are traits so the runner can be exercised without a cloud.
//!
//! ## Invariants
//!
//! - Steps run in declaration order; the first failure stops the case
//! - Teardown runs whenever the case got as far as creating a work directory
//! - The provider is validated once per [`Harness`]

pub mod case;
pub mod check;
pub mod destroy;
pub mod engine;
pub mod error;
pub mod import;
pub mod kinds;
pub mod logging;
pub mod names;
pub mod probe;
pub mod provider;
pub mod report;
pub mod runner;

pub use case::{
    ApplyStep, ImportStep, PlanExpectation, PlanOnlyStep, Step, TestCase, TestCaseBuilder,
};
pub use destroy::DestroyVerifier;
pub use engine::{Engine, PlanSummary, TerraformCli, WorkRoot, Workspace};
pub use error::{
    CaseError, CheckError, EngineError, ProbeError, ProviderError, Residual, ResidualReason,
};
pub use import::{import_diff, ImportIdentity};
pub use kinds::{lookup_kind, CloudObjectHandle, KindSpec};
pub use logging::init_test_logging;
pub use names::rand_name;
pub use probe::{CloudProbe, SdkProbe};
pub use provider::{
    PemSource, ProviderBinding, ProviderBlock, ProviderFactory, ProviderInstance, PROVIDER_ALIAS,
    PROVIDER_SOURCE,
};
pub use report::{CaseOutcome, CaseReport, StepOutcome, StepReport};
pub use runner::Harness;

// Crates cases always need alongside the harness.
pub use otc_acc_env::{EnvKey, EnvRegistry, Feature, Gate, GateOutcome, HarnessSettings};
pub use otc_acc_template::ConfigTemplate;
