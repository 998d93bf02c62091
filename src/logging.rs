//! Diagnostics go to stderr through **tracing** so stdout carries only command output.
//!
//! `RUST_LOG` takes precedence; otherwise the level is `warn`, or `debug` for this crate
//! when `--debug` is passed.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Calling it twice is harmless (the second call is a no-op).
pub fn init_logging(debug: bool) {
    let default = if debug { "warn,optionset=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .try_init();
}
