//! Harness error types.
//!
//! [`CaseError`] is what a case reports. Every variant maps to a stable
//! [`kind`](CaseError::kind) code so reports can be grouped without parsing
//! messages.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use otc_acc_sdk::SdkError;
use otc_acc_state::{AttributeDiff, StateError};
use otc_acc_template::RenderError;
use thiserror::Error;

// =============================================================================
// Engine
// =============================================================================

/// Failures driving the infrastructure engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine binary could not be started.
    #[error("failed to start {binary:?}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and exited unsuccessfully.
    #[error("`{command}` exited with {code:?}: {stderr}")]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The state printed by the engine could not be parsed.
    #[error("invalid engine state: {0}")]
    State(#[from] StateError),

    /// Engine output that is not state (schema, plan) could not be parsed.
    #[error("invalid engine output: {0}")]
    Output(String),

    /// Working directory I/O failed.
    #[error("workspace I/O on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// The text an `expect_error` pattern is matched against.
    pub fn message(&self) -> String {
        match self {
            EngineError::Command { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Failures constructing or configuring the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The provider schema is missing or does not describe the provider.
    #[error("provider schema validation failed: {0}")]
    Schema(String),

    /// Configuring a client from a raw map failed.
    #[error(transparent)]
    Configure(#[from] SdkError),

    #[error("provider setup I/O on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Read-back probes
// =============================================================================

/// Failures locating or reading a live object.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Sdk(#[from] SdkError),

    /// The resource type has no row in the kind table.
    #[error("no read-back is registered for {0}")]
    UnknownKind(String),

    /// The resource lacks an attribute its locator needs.
    #[error("{address}: cannot locate live object: {message}")]
    Locator { address: String, message: String },
}

impl ProbeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProbeError::Sdk(e) if e.is_not_found())
    }
}

// =============================================================================
// Checks
// =============================================================================

/// A check that disagreed with observed state.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{address}: not in state")]
    NotInState { address: String },

    #[error("{address}: empty primary identity")]
    EmptyPrimaryIdentity { address: String },

    #[error("{address}: attribute {path} is not set")]
    AttributeMissing { address: String, path: String },

    #[error("{address}: attribute {path} is empty")]
    AttributeEmpty { address: String, path: String },

    #[error("{address}: attribute {path}: expected {expected:?}, observed {observed:?}")]
    AttributeMismatch {
        address: String,
        path: String,
        observed: String,
        expected: String,
    },

    #[error("{address}: attribute {path}: {observed:?} does not match /{pattern}/")]
    PatternMismatch {
        address: String,
        path: String,
        observed: String,
        pattern: String,
    },

    #[error("invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(
        "{address_a}.{path_a} = {value_a:?} differs from {address_b}.{path_b} = {value_b:?}"
    )]
    PairMismatch {
        address_a: String,
        path_a: String,
        value_a: Option<String>,
        address_b: String,
        path_b: String,
        value_b: Option<String>,
    },

    /// The live object is gone.
    #[error("{address}: live object not found: {message}")]
    BackReadNotFound { address: String, message: String },

    /// The read-back failed for a reason other than "not found".
    #[error("{address}: read-back failed: {message}")]
    BackReadTransport { address: String, message: String },

    #[error("{address}: {message}")]
    BackReadAssertion { address: String, message: String },

    #[error("{address}: tag {key:?} is missing")]
    TagMissing { address: String, key: String },

    #[error("{address}: tag {key:?}: expected {expected:?}, observed {observed:?}")]
    TagMismatch {
        address: String,
        key: String,
        observed: String,
        expected: String,
    },

    #[error("{address}: tag {key:?} is still attached with value {observed:?}")]
    TagPresent {
        address: String,
        key: String,
        observed: String,
    },

    #[error("nothing bound under {name:?}")]
    ScratchMissing { name: String },

    #[error("{name}{pointer}: expected {expected:?}, observed {observed:?}")]
    ScratchMismatch {
        name: String,
        pointer: String,
        observed: Option<String>,
        expected: String,
    },
}

impl CheckError {
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::BackReadNotFound { .. } => "back_read_not_found",
            CheckError::BackReadTransport { .. } => "back_read_transport_error",
            _ => "check_failure",
        }
    }

    pub(crate) fn from_probe(address: &str, err: ProbeError) -> Self {
        if err.is_not_found() {
            CheckError::BackReadNotFound {
                address: address.to_string(),
                message: err.to_string(),
            }
        } else {
            CheckError::BackReadTransport {
                address: address.to_string(),
                message: err.to_string(),
            }
        }
    }
}

// =============================================================================
// Destroy verification
// =============================================================================

/// Why a resource counts as not destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidualReason {
    /// The object is still returned, with its status if the kind has one.
    StillPresent { status: Option<String> },
    /// The probe failed for a reason other than "not found".
    ProbeFailed(String),
    /// The kind was named for verification but has no probe.
    UnknownKind,
}

/// One resource the destroy verifier could not confirm absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residual {
    pub address: String,
    pub kind: String,
    pub id: Option<String>,
    pub reason: ResidualReason,
}

impl fmt::Display for Residual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.as_deref().unwrap_or("<no id>");
        match &self.reason {
            ResidualReason::StillPresent { status: Some(status) } => {
                write!(f, "{} ({id}) still exists with status {status}", self.address)
            }
            ResidualReason::StillPresent { status: None } => {
                write!(f, "{} ({id}) still exists", self.address)
            }
            ResidualReason::ProbeFailed(message) => {
                write!(f, "{} ({id}) could not be probed: {message}", self.address)
            }
            ResidualReason::UnknownKind => {
                write!(f, "{}: no destroy probe for {}", self.address, self.kind)
            }
        }
    }
}

// =============================================================================
// Cases
// =============================================================================

/// Why a case failed. Step and check numbers are 1-based.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("missing required environment: {0}")]
    MissingEnv(String),

    /// The case itself is malformed (no steps, import before apply, ...).
    #[error("invalid case definition: {0}")]
    Definition(String),

    #[error("step {step}: {source}")]
    Render {
        step: usize,
        #[source]
        source: RenderError,
    },

    #[error("step {step}: engine rejected the configuration: {message}")]
    Apply { step: usize, message: String },

    #[error("step {step}: expected an error matching /{pattern}/, {}", describe_observed(.observed))]
    ExpectedError {
        step: usize,
        pattern: String,
        observed: Option<String>,
    },

    #[error("step {step}: {}", describe_plan(.expected_changes))]
    UnexpectedPlan { step: usize, expected_changes: bool },

    #[error("step {step}, check {check} ({description}): {source}")]
    Check {
        step: usize,
        check: usize,
        description: String,
        #[source]
        source: CheckError,
    },

    #[error("destroy verification failed: {}", join_residuals(.residuals))]
    DestroyResidual { residuals: Vec<Residual> },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        step: Option<usize>,
        operation: &'static str,
        after: Duration,
    },

    #[error("step {step}: import of {address} diverged: {}", join_diffs(.diffs))]
    ImportDiff {
        step: usize,
        address: String,
        diffs: Vec<AttributeDiff>,
    },

    #[error("{}engine: {source}", step_prefix(.step))]
    Engine {
        step: Option<usize>,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl CaseError {
    /// Stable category code.
    pub fn kind(&self) -> &'static str {
        match self {
            CaseError::MissingEnv(_) => "missing_env",
            CaseError::Definition(_) => "definition_error",
            CaseError::Render { .. } => "render_error",
            CaseError::Apply { .. } => "apply_error",
            CaseError::ExpectedError { .. } => "expect_error_mismatch",
            CaseError::UnexpectedPlan { .. } => "unexpected_plan",
            CaseError::Check { source, .. } => source.kind(),
            CaseError::DestroyResidual { .. } => "destroy_residual",
            CaseError::Timeout { .. } => "timeout",
            CaseError::ImportDiff { .. } => "import_diff",
            CaseError::Engine { .. } | CaseError::Provider(_) => "engine_error",
        }
    }

    /// The step the failure is attributed to, if any.
    pub fn step(&self) -> Option<usize> {
        match self {
            CaseError::Render { step, .. }
            | CaseError::Apply { step, .. }
            | CaseError::ExpectedError { step, .. }
            | CaseError::UnexpectedPlan { step, .. }
            | CaseError::Check { step, .. }
            | CaseError::ImportDiff { step, .. } => Some(*step),
            CaseError::Timeout { step, .. } | CaseError::Engine { step, .. } => *step,
            _ => None,
        }
    }
}

fn describe_observed(observed: &Option<String>) -> String {
    match observed {
        Some(message) => format!("got: {message}"),
        None => "but the engine reported no error".to_string(),
    }
}

fn join_residuals(residuals: &[Residual]) -> String {
    residuals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_diffs(diffs: &[AttributeDiff]) -> String {
    diffs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_plan(expected_changes: &bool) -> &'static str {
    if *expected_changes {
        "expected a non-empty plan, got no changes"
    } else {
        "plan is not empty after apply"
    }
}

fn step_prefix(step: &Option<usize>) -> String {
    step.map(|s| format!("step {s}: ")).unwrap_or_default()
}
