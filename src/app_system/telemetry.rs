use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: compact lines with an uptime timer.
///
/// `RUST_LOG` wins over `default_filter` when set:
/// ```bash
/// RUST_LOG=rental_lifecycle::lifecycle=debug,info cargo run
/// ```
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn setup_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .try_init();
}
