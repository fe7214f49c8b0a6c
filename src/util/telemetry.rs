//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing for the simulator. Embedders can install their own
/// subscriber first; otherwise an env-filtered fmt subscriber is installed
/// (`RUST_LOG=fleet_sim=debug` shows every scheduling decision).
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .try_init();
}
