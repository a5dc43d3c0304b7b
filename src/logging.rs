use tracing_subscriber::EnvFilter;

/// Set when a GitHub Actions run is re-run with debug logging enabled
pub const RUNNER_DEBUG_ENV: &str = "ACTIONS_RUNNER_DEBUG";

/// Default filter when `RUST_LOG` is not set
pub fn default_level(runner_debug: bool) -> &'static str {
    if runner_debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the default level.
pub fn init() {
    let runner_debug = std::env::var_os(RUNNER_DEBUG_ENV).is_some();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(runner_debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
