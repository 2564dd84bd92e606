//! Case definitions.
//!
//! A [`TestCase`] is an ordered, non-empty list of [`Step`]s plus an
//! optional precheck gate and destroy verifier. Cases are immutable once
//! built; the runner owns their lifecycle.

use std::collections::BTreeMap;
use std::time::Duration;

use otc_acc_env::Gate;
use otc_acc_template::ConfigTemplate;
use regex::Regex;

use crate::check::Check;
use crate::destroy::DestroyVerifier;
use crate::error::CaseError;
use crate::import::ImportIdentity;

/// Render, apply, then check.
pub struct ApplyStep {
    pub(crate) template: ConfigTemplate,
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) checks: Vec<Box<dyn Check>>,
    pub(crate) expect_error: Option<String>,
    pub(crate) expect_nonempty_plan: bool,
    pub(crate) timeout: Option<Duration>,
}

impl ApplyStep {
    /// Set a template parameter for this step.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Append a check. Checks run in the order they were added.
    #[must_use]
    pub fn check<C: Check + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    #[must_use]
    pub fn checks<I>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Check>>,
    {
        self.checks.extend(checks);
        self
    }

    /// Expect the engine to reject the configuration with a message
    /// matching `pattern`. Checks are skipped when it does.
    #[must_use]
    pub fn expect_error(mut self, pattern: impl Into<String>) -> Self {
        self.expect_error = Some(pattern.into());
        self
    }

    /// Skip the empty-plan assertion after a successful apply.
    #[must_use]
    pub fn expect_nonempty_plan(mut self) -> Self {
        self.expect_nonempty_plan = true;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What a dry run must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanExpectation {
    /// No changes.
    Empty,
    /// At least one change.
    NonEmpty,
    /// An engine error whose message matches the pattern.
    Error(String),
}

/// Render and dry-run without changing anything.
pub struct PlanOnlyStep {
    pub(crate) template: ConfigTemplate,
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) expectation: PlanExpectation,
    pub(crate) timeout: Option<Duration>,
}

impl PlanOnlyStep {
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn expect_error(mut self, pattern: impl Into<String>) -> Self {
        self.expectation = PlanExpectation::Error(pattern.into());
        self
    }

    #[must_use]
    pub fn expect_nonempty_plan(mut self) -> Self {
        self.expectation = PlanExpectation::NonEmpty;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Re-import an applied resource and compare.
pub struct ImportStep {
    pub(crate) address: String,
    pub(crate) identity: ImportIdentity,
    pub(crate) ignore: Vec<String>,
    pub(crate) timeout: Option<Duration>,
}

impl ImportStep {
    #[must_use]
    pub fn identity(mut self, identity: ImportIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Attribute paths to elide before comparing. A path also covers its
    /// children (`flavor` covers `flavor.0.num`).
    #[must_use]
    pub fn ignore<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One unit of a case.
pub enum Step {
    Apply(ApplyStep),
    PlanOnly(PlanOnlyStep),
    Import(ImportStep),
}

impl Step {
    pub fn apply(template: impl Into<ConfigTemplate>) -> ApplyStep {
        ApplyStep {
            template: template.into(),
            params: BTreeMap::new(),
            checks: Vec::new(),
            expect_error: None,
            expect_nonempty_plan: false,
            timeout: None,
        }
    }

    /// A dry run that must produce an empty plan unless told otherwise.
    pub fn plan_only(template: impl Into<ConfigTemplate>) -> PlanOnlyStep {
        PlanOnlyStep {
            template: template.into(),
            params: BTreeMap::new(),
            expectation: PlanExpectation::Empty,
            timeout: None,
        }
    }

    /// Import the resource at `address` by its primary identity.
    pub fn import(address: impl Into<String>) -> ImportStep {
        ImportStep {
            address: address.into(),
            identity: ImportIdentity::Primary,
            ignore: Vec::new(),
            timeout: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::Apply(_) => "apply",
            Step::PlanOnly(_) => "plan_only",
            Step::Import(_) => "import",
        }
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        match self {
            Step::Apply(s) => s.timeout,
            Step::PlanOnly(s) => s.timeout,
            Step::Import(s) => s.timeout,
        }
    }

    fn error_pattern(&self) -> Option<&str> {
        match self {
            Step::Apply(s) => s.expect_error.as_deref(),
            Step::PlanOnly(PlanOnlyStep {
                expectation: PlanExpectation::Error(p),
                ..
            }) => Some(p),
            _ => None,
        }
    }
}

impl From<ApplyStep> for Step {
    fn from(step: ApplyStep) -> Self {
        Step::Apply(step)
    }
}

impl From<PlanOnlyStep> for Step {
    fn from(step: PlanOnlyStep) -> Self {
        Step::PlanOnly(step)
    }
}

impl From<ImportStep> for Step {
    fn from(step: ImportStep) -> Self {
        Step::Import(step)
    }
}

/// A named scenario.
pub struct TestCase {
    name: String,
    precheck: Option<Gate>,
    params: BTreeMap<String, String>,
    steps: Vec<Step>,
    destroy_verifier: Option<DestroyVerifier>,
    timeout: Option<Duration>,
}

impl TestCase {
    pub fn builder(name: impl Into<String>) -> TestCaseBuilder {
        TestCaseBuilder {
            name: name.into(),
            precheck: None,
            params: BTreeMap::new(),
            steps: Vec::new(),
            destroy_verifier: None,
            timeout: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn precheck(&self) -> Option<&Gate> {
        self.precheck.as_ref()
    }

    /// Template parameters shared by every step.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn destroy_verifier(&self) -> Option<&DestroyVerifier> {
        self.destroy_verifier.as_ref()
    }

    /// Case-wide default for step and destroy timeouts.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("steps", &self.steps.len())
            .field("destroy_verifier", &self.destroy_verifier)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TestCase`].
pub struct TestCaseBuilder {
    name: String,
    precheck: Option<Gate>,
    params: BTreeMap<String, String>,
    steps: Vec<Step>,
    destroy_verifier: Option<DestroyVerifier>,
    timeout: Option<Duration>,
}

impl TestCaseBuilder {
    #[must_use]
    pub fn precheck(mut self, gate: Gate) -> Self {
        self.precheck = Some(gate);
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    #[must_use]
    pub fn destroy_verifier(mut self, verifier: DestroyVerifier) -> Self {
        self.destroy_verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate and freeze the case.
    ///
    /// # Errors
    ///
    /// [`CaseError::Definition`] when there are no steps, an import step has
    /// no earlier apply step, or an error pattern does not compile.
    pub fn build(self) -> Result<TestCase, CaseError> {
        if self.steps.is_empty() {
            return Err(CaseError::Definition(format!(
                "case {} has no steps",
                self.name
            )));
        }

        let mut applied = false;
        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            match step {
                Step::Apply(_) => applied = true,
                Step::Import(_) if !applied => {
                    return Err(CaseError::Definition(format!(
                        "step {number}: import needs an earlier apply step"
                    )))
                }
                _ => {}
            }
            if let Some(pattern) = step.error_pattern() {
                Regex::new(pattern).map_err(|e| {
                    CaseError::Definition(format!("step {number}: invalid error pattern: {e}"))
                })?;
            }
        }

        Ok(TestCase {
            name: self.name,
            precheck: self.precheck,
            params: self.params,
            steps: self.steps,
            destroy_verifier: self.destroy_verifier,
            timeout: self.timeout,
        })
    }
}
