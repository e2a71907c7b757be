//! Cross-module scenario tests

mod lifecycle_tests;

/// Route engine trace records to the test writer; `RUST_LOG` filters.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
