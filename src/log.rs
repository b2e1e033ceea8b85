//! Structured logging for debugging gantry.
//!
//! Call sites use the `tracing` macros. The binary installs a
//! `tracing-subscriber` fmt subscriber that writes to
//! `~/.gantry/gantry.log`, truncated on startup, so stdout stays
//! reserved for command output.
//!
//! Log levels:
//! - WARN: Plan changes that scrap downstream work
//! - INFO: Committed mutations (inserts, validation closures, resets)
//! - DEBUG: Detailed traces (store I/O, skipped dependencies, report inputs)
//!
//! Debug mode can be enabled with `--debug` flag or `GANTRY_DEBUG=1` env var.

use std::fs::File;
use std::sync::Mutex;

use tracing::Level;

use crate::config::Config;

/// Whether `GANTRY_DEBUG` asks for debug output.
fn env_debug() -> bool {
    std::env::var("GANTRY_DEBUG")
        .map(|v| debug_flag(&v))
        .unwrap_or(false)
}

fn debug_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Level to log at for the given debug switch.
pub fn level_for(debug: bool) -> Level {
    if debug || env_debug() {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Initialize logging with explicit debug mode setting.
///
/// Failing to create the log file leaves logging disabled; a subscriber
/// that is already installed is kept.
pub fn init_with_debug(debug: bool) {
    let level = level_for(debug);

    let Ok(dir) = Config::gantry_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("gantry.log")) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
