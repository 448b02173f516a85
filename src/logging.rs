use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber from `RUST_LOG`, defaulting to
/// `info`. Called exactly once by the binary; alert evaluation writes
/// through the run-scoped alert log instead of reconfiguring anything
/// global.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Test-friendly init that tolerates repeated calls.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
