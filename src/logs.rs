//! Logging setup.
//!
//! The library only emits records through the `log` facade; this module
//! installs the stderr logger used by the command-line front-end.

use std::env;

use env_logger::{Env, Target};
use log::SetLoggerError;

/// Install the stderr logger.
///
/// When the `DEBUG` environment variable is set, debug records are shown,
/// otherwise only warnings and errors. `RUST_LOG` takes precedence over both.
///
/// # Errors
///
/// Returns an error if a global logger was already installed.
pub fn init() -> Result<(), SetLoggerError> {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level()))
        .target(Target::Stderr)
        .format_timestamp(None)
        .try_init()
}

fn default_level() -> &'static str {
    if env::var("DEBUG").is_ok() {
        "debug"
    } else {
        "warn"
    }
}
