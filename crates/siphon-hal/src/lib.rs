//! # siphon-hal
//!
//! CoreAudio AudioServerPlugIn layer for the Siphon loopback driver.
//!
//! This crate wraps a `siphon-core` [`Engine`](siphon_core::Engine) in the
//! C function table that coreaudiod loads from a driver bundle. It handles
//! all the HAL-specific details:
//!
//! - CFPlugIn factory and IUnknown reference counting
//! - Conversion between host pointers and engine types
//! - CFString bridging for text properties and UID qualifiers
//! - `PropertiesChanged` notifications back to the host
//! - Host time from the mach clock
//! - os_log output under the driver's bundle identifier
//!
//! ## Architecture
//!
//! ```text
//! coreaudiod
//!        ↓
//! SiphonDriverFactory (generated by export_driver!)
//!        ↓
//! SiphonDriver (repr(C), first field is the function table)
//!        ↓
//! entry::* (extern "C", catch_unwind, OSStatus mapping)
//!        ↓
//! siphon_core::Engine
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use siphon_core::{DeviceConfig, DriverConfig};
//! use siphon_hal::export_driver;
//!
//! static CONFIG: DriverConfig = DriverConfig::new("Siphon 2ch")
//!     .with_primary(DeviceConfig::new("Siphon 2ch", "Siphon2ch_UID"));
//!
//! export_driver!(CONFIG);
//! ```
//!
//! The bundle's `Info.plist` names `SiphonDriverFactory` under
//! `CFPlugInFactories` for the AudioServerPlugIn type.
//!
//! ## Platform Support
//!
//! The plug-in layer only compiles on macOS. On other platforms only the
//! configuration registry and the export macro remain, so driver crates
//! still build for cross-compilation checks.

#![cfg_attr(not(target_os = "macos"), allow(unused))]

// =============================================================================
// Platform-independent modules
// =============================================================================

pub mod export;
pub mod factory;

pub use factory::{driver_config, register_config};

// =============================================================================
// macOS-only modules
// =============================================================================

#[cfg(target_os = "macos")]
mod cf;
#[cfg(target_os = "macos")]
pub mod clock;
#[cfg(target_os = "macos")]
pub mod driver;
#[cfg(target_os = "macos")]
mod entry;
#[cfg(target_os = "macos")]
pub mod interface;
#[cfg(target_os = "macos")]
pub mod logging;

#[cfg(target_os = "macos")]
pub use clock::MachClock;
#[cfg(target_os = "macos")]
pub use driver::SiphonDriver;
