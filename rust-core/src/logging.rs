use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `lectern_core=debug`.
pub const LOG_ENV: &str = "LECTERN_LOG";

/// Installs a formatting subscriber filtered by `LECTERN_LOG` (default
/// `info`). Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
