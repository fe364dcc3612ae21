//! Diagnostic logging.
//!
//! Operator-facing messages go through [`crate::output::OutputFormatter`];
//! this module only sets up `tracing` for debugging a run. Events are
//! written to stderr.
//!
//! Priority: `RUST_LOG` > `--debug` > [`DEFAULT_LOG_LEVEL`].

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Initialise the logging subsystem.
///
/// Calling it twice is harmless; the second subscriber is ignored.
pub fn init(debug_flag: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialised");
    }
}
