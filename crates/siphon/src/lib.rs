//! # Siphon
//!
//! Zero-latency virtual audio loopback driver for macOS.
//!
//! A Siphon driver publishes one or two virtual audio devices. Whatever a
//! client plays into a device's output is handed, sample for sample and in
//! the same I/O cycle, to clients recording from its input. A hidden mirror
//! device can expose the same audio under a second identity.
//!
//! ## Architecture
//!
//! ```text
//! Your driver crate (static DriverConfig)
//!        ↓
//! export_driver! (factory + load-time registration)
//!        ↓
//! siphon_hal (AudioServerPlugIn function table)
//!        ↓
//! siphon_core::Engine (object graph, properties, ring buffer)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use siphon::prelude::*;
//!
//! static CONFIG: DriverConfig = DriverConfig::new("My Loopback")
//!     .with_bundle_id("com.example.MyLoopback")
//!     .with_primary(DeviceConfig::new("My Loopback", "MyLoopback_UID"));
//!
//! export_driver!(CONFIG);
//! ```

// Re-export sub-crates
pub use siphon_core as core;
pub use siphon_hal as hal;

pub use siphon_hal::export_driver;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use siphon::prelude::*;
/// ```
pub mod prelude {
    pub use siphon_core::{
        // Configuration
        DeviceConfig, DriverConfig, STANDARD_SAMPLE_RATES,
        // Errors
        EngineError, EngineResult,
        // Engine and clocks
        Engine, HostClock, ManualClock,
    };

    pub use siphon_hal::export_driver;
}
