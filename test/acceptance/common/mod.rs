//! Shared harness for the acceptance suite.
//!
//! Cases only run with `TF_ACC` set and an `OS_*` environment pointing at a
//! real project. Without `TF_ACC` every case returns early, before the
//! registry is initialised, so the suite passes on machines with no cloud
//! configuration at all.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use otc_acc_harness::{init_test_logging, EnvRegistry, Harness, HarnessSettings, TestCase};

static HARNESS: OnceLock<Option<Harness>> = OnceLock::new();

/// The process-wide harness, or `None` when acceptance runs are disabled.
pub fn harness() -> Option<&'static Harness> {
    HARNESS
        .get_or_init(|| {
            init_test_logging();
            let settings = HarnessSettings::from_env().expect("invalid harness settings");
            if !settings.acceptance_enabled {
                tracing::info!("TF_ACC not set, skipping acceptance cases");
                return None;
            }
            let registry =
                EnvRegistry::from_env().expect("failed to initialise the environment registry");
            Some(Harness::new(Arc::new(registry), settings))
        })
        .as_ref()
}

/// Run a case and panic with its report unless it passed or was skipped.
pub async fn run(case: TestCase) {
    let Some(harness) = harness() else {
        return;
    };
    let report = harness.run(&case).await;
    tracing::info!("{report}");
    report.assert_ok();
}
