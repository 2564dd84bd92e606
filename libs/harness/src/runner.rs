//! Step runner.
//!
//! [`Harness::run`] drives one case through its lifecycle:
//!
//! 1. `TF_ACC` and the precheck gate decide whether the case runs at all.
//! 2. The shared provider instance is bound (once per process).
//! 3. Steps run strictly in order in a fresh per-case work directory; the
//!    first failure stops the sequence.
//! 4. Teardown always runs once the work directory exists: engine destroy,
//!    destroy verification against the last observed state, then a final
//!    destroy sweep.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use otc_acc_env::{EnvRegistry, GateOutcome, HarnessSettings, DEFAULT_STEP_TIMEOUT};
use otc_acc_state::{diff_attributes, StateSnapshot};
use otc_acc_template::{fingerprint, ConfigTemplate, RenderContext};
use regex::Regex;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::case::{ApplyStep, ImportStep, PlanExpectation, PlanOnlyStep, Step, TestCase};
use crate::check::{CheckContext, Scratchpad};
use crate::engine::{Engine, TerraformCli, WorkRoot, Workspace};
use crate::error::{CaseError, EngineError};
use crate::import::import_diff;
use crate::probe::{CloudProbe, SdkProbe};
use crate::provider::{ProviderBinding, ProviderFactory, ProviderInstance};
use crate::report::{CaseOutcome, CaseReport, StepOutcome, StepReport};

/// Runs cases against one registry, engine and provider.
///
/// Share one `Harness` across the cases of a test binary so the provider is
/// bound once.
pub struct Harness {
    registry: Arc<EnvRegistry>,
    settings: HarnessSettings,
    engine: Arc<dyn Engine>,
    provider: Arc<ProviderFactory>,
    probe: Option<Arc<dyn CloudProbe>>,
}

impl Harness {
    /// A harness driving the engine binary named in `settings`.
    pub fn new(registry: Arc<EnvRegistry>, settings: HarnessSettings) -> Self {
        let engine: Arc<dyn Engine> = Arc::new(TerraformCli::new(settings.terraform_path.clone()));
        Self::with_engine(registry, settings, engine)
    }

    pub fn with_engine(
        registry: Arc<EnvRegistry>,
        settings: HarnessSettings,
        engine: Arc<dyn Engine>,
    ) -> Self {
        let provider = Arc::new(ProviderFactory::new(
            ProviderBinding::from_settings(&settings),
            Arc::clone(&engine),
        ));
        Self {
            registry,
            settings,
            engine,
            provider,
            probe: None,
        }
    }

    /// Use `probe` for every case instead of an SDK session per case.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn CloudProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn registry(&self) -> &EnvRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn provider(&self) -> &ProviderFactory {
        &self.provider
    }

    /// Run a case to completion. Never panics on case failure; inspect the
    /// report or call [`CaseReport::assert_ok`].
    pub async fn run(&self, case: &TestCase) -> CaseReport {
        let span = info_span!("case", name = %case.name());
        async {
            let clock = Instant::now();
            let mut report = CaseReport::new(case.name(), Utc::now());
            self.drive(case, &mut report).await;
            report.duration = clock.elapsed();

            match &report.outcome {
                CaseOutcome::Passed => {
                    info!(duration_ms = report.duration.as_millis() as u64, "case passed")
                }
                CaseOutcome::Skipped(reason) => info!(%reason, "case skipped"),
                CaseOutcome::Failed(err) => {
                    error!(kind = err.kind(), step = ?err.step(), error = %err, "case failed")
                }
            }
            report
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, case: &TestCase, report: &mut CaseReport) {
        if !self.settings.acceptance_enabled {
            report.outcome = CaseOutcome::Skipped("TF_ACC not set".to_string());
            return;
        }

        if let Some(gate) = case.precheck() {
            match gate.evaluate(&self.registry) {
                GateOutcome::Proceed => debug!(gate = %gate.name(), "precheck passed"),
                GateOutcome::Skip(reason) => {
                    report.outcome = CaseOutcome::Skipped(reason);
                    return;
                }
                GateOutcome::Fail(reason) => {
                    report.outcome = CaseOutcome::Failed(CaseError::MissingEnv(reason));
                    return;
                }
            }
        }

        let provider = match self.provider.instance().await {
            Ok(provider) => provider,
            Err(err) => {
                report.outcome = CaseOutcome::Failed(err.into());
                return;
            }
        };

        let setup = WorkRoot::create(case.name(), self.settings.keep_workdir).and_then(|root| {
            let main = root.workspace("main", provider.env())?;
            Ok((root, main))
        });
        let (root, main) = match setup {
            Ok(setup) => setup,
            Err(source) => {
                report.outcome = CaseOutcome::Failed(CaseError::Engine { step: None, source });
                return;
            }
        };
        debug!(workdir = %root.path().display(), "created work directory");

        let probe: Arc<dyn CloudProbe> = match &self.probe {
            Some(probe) => Arc::clone(probe),
            None => Arc::new(SdkProbe::from_registry(Arc::clone(&self.registry))),
        };

        let mut run = CaseRun {
            harness: self,
            case,
            provider: &provider,
            root: &root,
            main,
            main_ready: false,
            probe,
            applied: None,
            snapshot: None,
        };

        let result = run.steps(&mut report.steps).await;
        let mut teardown = run.teardown().await;

        report.outcome = match result {
            Err(err) => CaseOutcome::Failed(err),
            Ok(()) if teardown.is_empty() => CaseOutcome::Passed,
            Ok(()) => CaseOutcome::Failed(teardown.remove(0)),
        };
        report.teardown = teardown;
    }

    fn case_timeout(&self, case: &TestCase, requested: Option<Duration>) -> Duration {
        self.settings.resolve_timeout(
            requested
                .or(case.timeout())
                .unwrap_or(DEFAULT_STEP_TIMEOUT),
        )
    }
}

/// Mutable state of one case in flight.
struct CaseRun<'a> {
    harness: &'a Harness,
    case: &'a TestCase,
    provider: &'a ProviderInstance,
    root: &'a WorkRoot,
    main: Workspace,
    main_ready: bool,
    probe: Arc<dyn CloudProbe>,
    /// Document teardown destroys with.
    applied: Option<String>,
    /// State after the most recent engine operation on `main`.
    snapshot: Option<StateSnapshot>,
}

impl CaseRun<'_> {
    fn engine(&self) -> &dyn Engine {
        self.harness.engine.as_ref()
    }

    async fn steps(&mut self, reports: &mut Vec<StepReport>) -> Result<(), CaseError> {
        let case = self.case;
        let steps = case.steps();
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let after = self.harness.case_timeout(case, step.timeout());
            let clock = Instant::now();

            let span = info_span!("step", number, kind = step.kind());
            let result = match tokio::time::timeout(after, self.step(number, step))
                .instrument(span)
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CaseError::Timeout {
                    step: Some(number),
                    operation: step.kind(),
                    after,
                }),
            };

            reports.push(StepReport {
                number,
                kind: step.kind(),
                duration: clock.elapsed(),
                outcome: if result.is_ok() {
                    StepOutcome::Passed
                } else {
                    StepOutcome::Failed
                },
            });

            if let Err(err) = result {
                reports.extend(steps.iter().enumerate().skip(number).map(|(i, s)| StepReport {
                    number: i + 1,
                    kind: s.kind(),
                    duration: Duration::ZERO,
                    outcome: StepOutcome::NotRun,
                }));
                return Err(err);
            }
            info!(step = number, "step passed");
        }
        Ok(())
    }

    async fn step(&mut self, number: usize, step: &Step) -> Result<(), CaseError> {
        match step {
            Step::Apply(apply) => self.apply(number, apply).await,
            Step::PlanOnly(plan) => self.plan_only(number, plan).await,
            Step::Import(import) => self.import(number, import).await,
        }
    }

    fn render(
        &self,
        number: usize,
        template: &ConfigTemplate,
        params: &BTreeMap<String, String>,
    ) -> Result<String, CaseError> {
        let context = RenderContext::new(&self.harness.registry)
            .with_params(self.case.params())
            .with_params(params);
        let rendered = template
            .render(&context)
            .map_err(|source| CaseError::Render { step: number, source })?;
        let document = self.provider.document(&rendered);
        debug!(fingerprint = %fingerprint(&document), "rendered configuration");
        Ok(document)
    }

    async fn prepare_main(&mut self, number: usize, document: &str) -> Result<(), CaseError> {
        let engine_err = |source| CaseError::Engine {
            step: Some(number),
            source,
        };
        self.main.write_config(document).map_err(engine_err)?;
        if !self.main_ready {
            self.engine().init(&self.main).await.map_err(engine_err)?;
            self.main_ready = true;
        }
        Ok(())
    }

    async fn apply(&mut self, number: usize, step: &ApplyStep) -> Result<(), CaseError> {
        let document = self.render(number, &step.template, &step.params)?;
        self.prepare_main(number, &document).await?;

        let applied = self.engine().apply(&self.main).await;
        let snapshot = match (applied, &step.expect_error) {
            (Ok(snapshot), None) => snapshot,
            (Ok(snapshot), Some(pattern)) => {
                self.record_apply(document, snapshot);
                return Err(CaseError::ExpectedError {
                    step: number,
                    pattern: pattern.clone(),
                    observed: None,
                });
            }
            (Err(err), expected) => {
                self.refresh_after_failure(document).await;
                let message = err.message();
                return match expected {
                    Some(pattern) if matches_pattern(pattern, &message)? => {
                        info!(%pattern, "apply failed as expected");
                        Ok(())
                    }
                    Some(pattern) => Err(CaseError::ExpectedError {
                        step: number,
                        pattern: pattern.clone(),
                        observed: Some(message),
                    }),
                    None => Err(CaseError::Apply {
                        step: number,
                        message,
                    }),
                };
            }
        };
        debug!(resources = snapshot.len(), "apply converged");
        self.record_apply(document, snapshot);

        self.run_checks(number, step).await?;

        if !step.expect_nonempty_plan {
            let plan = self.engine().plan(&self.main).await.map_err(|source| CaseError::Engine {
                step: Some(number),
                source,
            })?;
            if plan.has_changes {
                debug!(plan = %plan.output, "plan after apply");
                return Err(CaseError::UnexpectedPlan {
                    step: number,
                    expected_changes: false,
                });
            }
        }
        Ok(())
    }

    fn record_apply(&mut self, document: String, snapshot: StateSnapshot) {
        self.applied = Some(document);
        self.snapshot = Some(snapshot);
    }

    /// Re-read state after a failed apply so teardown sees partial creations.
    async fn refresh_after_failure(&mut self, document: String) {
        match self.engine().state(&self.main).await {
            Ok(snapshot) => {
                if self.applied.is_none() && !snapshot.is_empty() {
                    self.applied = Some(document);
                }
                self.snapshot = Some(snapshot);
            }
            Err(err) => warn!(error = %err, "could not read state after failed apply"),
        }
    }

    async fn run_checks(&self, number: usize, step: &ApplyStep) -> Result<(), CaseError> {
        let Some(state) = self.snapshot.as_ref() else {
            return Ok(());
        };
        let mut scratch = Scratchpad::new();
        let mut ctx = CheckContext::new(state, self.probe.as_ref(), &mut scratch);
        for (index, check) in step.checks.iter().enumerate() {
            debug!(check = index + 1, description = %check.describe(), "running check");
            check
                .run(&mut ctx)
                .await
                .map_err(|source| CaseError::Check {
                    step: number,
                    check: index + 1,
                    description: check.describe(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn plan_only(&mut self, number: usize, step: &PlanOnlyStep) -> Result<(), CaseError> {
        let document = self.render(number, &step.template, &step.params)?;
        self.prepare_main(number, &document).await?;

        let plan = self.engine().plan(&self.main).await;
        match (&step.expectation, plan) {
            (PlanExpectation::Error(pattern), Err(err)) => {
                let message = err.message();
                if matches_pattern(pattern, &message)? {
                    info!(%pattern, "plan failed as expected");
                    Ok(())
                } else {
                    Err(CaseError::ExpectedError {
                        step: number,
                        pattern: pattern.clone(),
                        observed: Some(message),
                    })
                }
            }
            (PlanExpectation::Error(pattern), Ok(_)) => Err(CaseError::ExpectedError {
                step: number,
                pattern: pattern.clone(),
                observed: None,
            }),
            (_, Err(source)) => Err(CaseError::Engine {
                step: Some(number),
                source,
            }),
            (PlanExpectation::Empty, Ok(plan)) if plan.has_changes => {
                debug!(plan = %plan.output, "unexpected changes");
                Err(CaseError::UnexpectedPlan {
                    step: number,
                    expected_changes: false,
                })
            }
            (PlanExpectation::NonEmpty, Ok(plan)) if !plan.has_changes => {
                Err(CaseError::UnexpectedPlan {
                    step: number,
                    expected_changes: true,
                })
            }
            (_, Ok(_)) => Ok(()),
        }
    }

    async fn import(&mut self, number: usize, step: &ImportStep) -> Result<(), CaseError> {
        let (Some(document), Some(snapshot)) = (self.applied.clone(), self.snapshot.as_ref())
        else {
            return Err(CaseError::Definition(format!(
                "step {number}: nothing has been applied to import"
            )));
        };
        let before = snapshot.get(&step.address).ok_or_else(|| {
            CaseError::Definition(format!(
                "step {number}: {} is not in state",
                step.address
            ))
        })?;
        let id = step
            .identity
            .resolve(before)
            .map_err(|message| CaseError::Definition(format!("step {number}: {message}")))?;
        debug!(address = %step.address, %id, "importing");

        let engine_err = |source: EngineError| CaseError::Engine {
            step: Some(number),
            source,
        };
        let workspace = self
            .root
            .workspace(&format!("import-{number}"), self.provider.env())
            .map_err(engine_err)?;
        workspace.write_config(&document).map_err(engine_err)?;
        self.engine().init(&workspace).await.map_err(engine_err)?;
        let imported = self
            .engine()
            .import(&workspace, &step.address, &id)
            .await
            .map_err(engine_err)?;

        let diffs = match imported.get(&step.address) {
            Some(after) => import_diff(before, after, &step.ignore),
            None => diff_attributes(&before.attributes, &BTreeMap::new(), &step.ignore),
        };
        if diffs.is_empty() {
            Ok(())
        } else {
            Err(CaseError::ImportDiff {
                step: number,
                address: step.address.clone(),
                diffs,
            })
        }
    }

    /// Destroy, verify, sweep. Returns every teardown failure in order.
    async fn teardown(&mut self) -> Vec<CaseError> {
        let span = info_span!("teardown");
        async {
            let mut errors = Vec::new();
            let has_state = self.snapshot.as_ref().is_some_and(|s| !s.is_empty());
            if self.applied.is_none() && !has_state {
                debug!("nothing applied, skipping destroy");
                return errors;
            }

            if let Err(err) = self.destroy().await {
                warn!(error = %err, "destroy failed");
                errors.push(err);
            }

            if let (Some(verifier), Some(snapshot)) =
                (self.case.destroy_verifier(), self.snapshot.as_ref())
            {
                let residuals = verifier.verify(snapshot, self.probe.as_ref()).await;
                if !residuals.is_empty() {
                    errors.push(CaseError::DestroyResidual { residuals });
                }
            }

            // Final sweep. Destroying an empty state is a no-op.
            if let Err(err) = self.destroy().await {
                warn!(error = %err, "final destroy sweep failed");
                errors.push(err);
            }
            errors
        }
        .instrument(span)
        .await
    }

    async fn destroy(&mut self) -> Result<(), CaseError> {
        let after = self.harness.case_timeout(self.case, None);
        let engine_err = |source| CaseError::Engine { step: None, source };

        if let Some(document) = &self.applied {
            self.main.write_config(document).map_err(engine_err)?;
        }
        let work = async {
            if !self.main_ready {
                self.engine().init(&self.main).await?;
            }
            self.engine().destroy(&self.main).await
        };
        match tokio::time::timeout(after, work).await {
            Ok(result) => {
                result.map_err(engine_err)?;
                self.main_ready = true;
                Ok(())
            }
            Err(_) => Err(CaseError::Timeout {
                step: None,
                operation: "destroy",
                after,
            }),
        }
    }
}

fn matches_pattern(pattern: &str, message: &str) -> Result<bool, CaseError> {
    Regex::new(pattern)
        .map(|re| re.is_match(message))
        .map_err(|e| CaseError::Definition(format!("invalid error pattern: {e}")))
}
