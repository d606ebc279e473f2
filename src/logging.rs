//! Logger setup and the `debug-mode` gate.
//!
//! The logger is `env_logger`.  Without `RUST_LOG` it is built with a
//! `debug` filter and [`log::set_max_level`] lowers output to `info` while
//! debug mode is off, so the setting can be flipped at runtime.  An explicit
//! `RUST_LOG` always wins over the setting.

use log::LevelFilter;
use std::sync::OnceLock;

/// Level chosen by `RUST_LOG`, if the environment pinned one.
static PINNED: OnceLock<Option<LevelFilter>> = OnceLock::new();

/// Install the global logger.
///
/// Calling this twice is harmless; the second logger is dropped.
pub fn init(debug_mode: bool) {
    let pinned = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    let logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("debug"),
    )
    .build();
    let filter = logger.filter();

    if log::set_boxed_logger(Box::new(logger)).is_err() {
        return;
    }
    let _ = PINNED.set(pinned.then_some(filter));
    set_debug_mode(debug_mode);
}

/// Apply the `debug-mode` setting to the live log level.
pub fn set_debug_mode(enabled: bool) {
    let pinned = PINNED.get().copied().flatten();
    log::set_max_level(max_level(enabled, pinned));
}

fn max_level(debug_mode: bool, pinned: Option<LevelFilter>) -> LevelFilter {
    match pinned {
        Some(level) => level,
        None if debug_mode => LevelFilter::Debug,
        None => LevelFilter::Info,
    }
}
