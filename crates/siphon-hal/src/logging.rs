//! Unified logging setup.
//!
//! Records go to os_log under the driver's bundle identifier, so they show up
//! in Console.app and `log stream --predicate 'subsystem == "<bundle id>"'`.

use std::sync::Once;

use log::LevelFilter;
use oslog::OsLogger;

static INIT: Once = Once::new();

#[cfg(debug_assertions)]
const LEVEL: LevelFilter = LevelFilter::Debug;
#[cfg(not(debug_assertions))]
const LEVEL: LevelFilter = LevelFilter::Info;

/// Install the os_log backend once per process.
///
/// If another logger is already installed (the host process may have set
/// one) it is left alone.
pub fn init(subsystem: &str) {
    INIT.call_once(|| {
        if OsLogger::new(subsystem).level_filter(LEVEL).init().is_err() {
            log::warn!("a logger is already installed; siphon records go there");
        }
    });
}
