use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `REPERTOIRE_LOG=repertoire=debug`.
pub const LOG_ENV: &str = "REPERTOIRE_LOG";

/// Installs the stderr subscriber. Stdout stays reserved for command output.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (as in tests) is harmless, so the error is dropped
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
