//! Driver configuration registry.
//!
//! The `export_driver!` macro registers the driver's static configuration
//! when the bundle is loaded, before the host calls the factory function.
//! The factory reads it back to build the driver object.

use std::sync::OnceLock;

use siphon_core::DriverConfig;

/// Global configuration storage (set by `export_driver!`).
static DRIVER_CONFIG: OnceLock<&'static DriverConfig> = OnceLock::new();

/// Register the driver configuration.
///
/// Only one driver per binary is supported. A second registration is logged
/// and ignored; returns whether this call registered `config`.
pub fn register_config(config: &'static DriverConfig) -> bool {
    if DRIVER_CONFIG.set(config).is_err() {
        log::warn!(
            "driver config already registered, ignoring {:?}",
            config.name
        );
        return false;
    }
    log::debug!(
        "driver config registered: {} ({}, {} channel(s))",
        config.name,
        config.bundle_id,
        config.channel_count
    );
    true
}

/// The registered configuration, if any.
pub fn driver_config() -> Option<&'static DriverConfig> {
    DRIVER_CONFIG.get().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIRST: DriverConfig = DriverConfig::new("First");
    static SECOND: DriverConfig = DriverConfig::new("Second");

    #[test]
    fn test_first_registration_wins() {
        assert!(register_config(&FIRST));
        assert!(!register_config(&SECOND));
        assert_eq!(driver_config().map(|c| c.name), Some("First"));
    }
}
