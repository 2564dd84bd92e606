//! Case reports.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CaseError;

/// How a single step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed,
    /// An earlier step failed.
    NotRun,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepOutcome::Passed => "passed",
            StepOutcome::Failed => "failed",
            StepOutcome::NotRun => "not run",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// 1-based position in the case.
    pub number: usize,
    pub kind: &'static str,
    pub duration: Duration,
    pub outcome: StepOutcome,
}

/// How the case ended.
#[derive(Debug)]
pub enum CaseOutcome {
    Passed,
    /// Ended successfully without running, with the reason.
    Skipped(String),
    Failed(CaseError),
}

/// Everything the runner observed for one case.
#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub steps: Vec<StepReport>,
    pub outcome: CaseOutcome,
    /// Teardown failures not already reported as the outcome.
    pub teardown: Vec<CaseError>,
}

impl CaseReport {
    pub(crate) fn new(name: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            started_at,
            duration: Duration::ZERO,
            steps: Vec::new(),
            outcome: CaseOutcome::Passed,
            teardown: Vec::new(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Passed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Skipped(_))
    }

    /// The error that failed the case.
    pub fn error(&self) -> Option<&CaseError> {
        match &self.outcome {
            CaseOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Stable kind code of the failure, if any.
    pub fn error_kind(&self) -> Option<&'static str> {
        self.error().map(CaseError::kind)
    }

    /// Panic with the full report unless the case passed or was skipped.
    ///
    /// For use at the end of a `#[tokio::test]`.
    #[track_caller]
    pub fn assert_ok(&self) {
        if let CaseOutcome::Failed(_) = self.outcome {
            panic!("{self}");
        }
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &self.outcome {
            CaseOutcome::Passed => "PASSED".to_string(),
            CaseOutcome::Skipped(reason) => format!("SKIPPED ({reason})"),
            CaseOutcome::Failed(_) => "FAILED".to_string(),
        };
        writeln!(
            f,
            "case {}: {status} after {:.1}s",
            self.name,
            self.duration.as_secs_f64()
        )?;
        for step in &self.steps {
            writeln!(
                f,
                "  step {} {}: {} ({:.1}s)",
                step.number,
                step.kind,
                step.outcome,
                step.duration.as_secs_f64()
            )?;
        }
        if let CaseOutcome::Failed(err) = &self.outcome {
            writeln!(f, "  error [{}]: {err}", err.kind())?;
        }
        for err in &self.teardown {
            writeln!(f, "  teardown [{}]: {err}", err.kind())?;
        }
        Ok(())
    }
}
