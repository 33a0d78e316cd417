// Logging initialisation

use tracing_subscriber::EnvFilter;

/// Filter directive for the given flags. `RUST_LOG` wins over the
/// configured level; `--verbose` wins over both.
pub fn filter_directive(verbose: bool, configured: &str) -> String {
    if verbose {
        return "debug".to_string();
    }
    std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
pub fn init_logging(verbose: bool, configured: &str) {
    let directive = filter_directive(verbose, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}
