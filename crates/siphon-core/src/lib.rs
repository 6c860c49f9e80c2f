//! # siphon-core
//!
//! Platform-independent core of the Siphon virtual loopback driver.
//!
//! Whatever a client plays into a Siphon device's output stream is handed,
//! sample for sample, to clients reading its input stream. No ABI types
//! appear here; the macOS plug-in layer lives in `siphon-hal`.
//!
//! ## Main Types
//!
//! - [`Engine`] - The owned driver context behind every host entry point
//! - [`DriverConfig`] / [`DeviceConfig`] - Compile-time driver description
//! - [`ObjectGraph`] - The fixed tree of audio objects and their IDs
//! - [`RingBuffer`] - The shared interleaved sample store
//! - [`PropertyData`] - Typed property values
//! - [`EngineError`] - Error types, mapped to host status codes
//! - [`HostClock`] - Host time source for zero time stamps

pub mod clock;
pub mod config;
pub mod control;
pub mod device;
pub mod engine;
pub mod error;
pub mod format;
pub mod graph;
pub mod property;
pub mod ring_buffer;
pub mod selectors;
pub mod state;
pub mod sync;
pub mod types;

// Re-exports for convenience
pub use clock::{HostClock, ManualClock, Timeline};
pub use config::{DeviceConfig, DriverConfig, STANDARD_SAMPLE_RATES};
pub use control::{DeviceControls, StreamControls, StreamGain};
pub use device::{DeviceSession, IoTransition, SessionState};
pub use engine::Engine;
pub use error::{status, EngineError, EngineResult};
pub use format::{ChannelLayout, RangedFormat, StreamFormat, ValueRange};
pub use graph::{DeviceSlot, ObjectGraph, ObjectKind, BOX_ID, PLUG_IN_ID};
pub use property::{PropertyChange, PropertyData, Qualifier, QualifierKind};
pub use ring_buffer::RingBuffer;
pub use types::{
    ClientId, Direction, IoCapability, IoCycleInfo, IoOperation, ObjectId, PropertyAddress,
    ZeroTimeStamp, MAX_CHANNELS, UNKNOWN_OBJECT,
};
