//! Test logging.

/// Install a test-writer subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,otc_acc_harness=debug,otc_acc_sdk=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
