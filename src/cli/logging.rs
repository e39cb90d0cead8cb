//! Diagnostic logging to stderr

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `pochita=debug`
pub const LOG_ENV: &str = "POCHITA_LOG";

/// Installs the global subscriber
///
/// The filter comes from `POCHITA_LOG`, then `RUST_LOG`; without either it
/// is `debug` in verbose mode and `warn` otherwise.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
