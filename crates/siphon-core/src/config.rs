//! Driver configuration.
//!
//! All configuration is static: a driver bundle declares one
//! [`DriverConfig`] in a `static` and hands it to the engine at
//! initialization. Nothing is persisted and nothing is reconfigurable
//! without re-initializing the engine.
//!
//! # Example
//!
//! ```ignore
//! use siphon_core::{DeviceConfig, DriverConfig};
//!
//! pub static CONFIG: DriverConfig = DriverConfig::new("Siphon 2ch")
//!     .with_manufacturer("Siphon Audio")
//!     .with_bundle_id("audio.siphon.2ch")
//!     .with_channel_count(2)
//!     .with_mirror(DeviceConfig::new("Siphon 2ch Mirror", "Siphon2ch_Mirror_UID").hidden());
//! ```

use crate::error::{EngineError, EngineResult};
use crate::types::MAX_CHANNELS;

/// Default base ring buffer size in frames.
pub const DEFAULT_RING_BUFFER_FRAMES: u32 = 65_536;

/// Default number of frames between two zero time stamps.
pub const DEFAULT_ZERO_TIMESTAMP_PERIOD: u32 = 16_384;

/// Default nominal sample rate.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// The standard nominal sample rates a loopback device advertises.
pub const STANDARD_SAMPLE_RATES: &[f64] = &[
    8_000.0, 16_000.0, 24_000.0, 44_100.0, 48_000.0, 88_200.0, 96_000.0, 176_400.0, 192_000.0,
    352_800.0, 384_000.0, 705_600.0, 768_000.0,
];

/// Configuration of one virtual device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceConfig {
    /// Device name shown to users.
    pub name: &'static str,

    /// Persistent device UID.
    pub uid: &'static str,

    /// Whether the device exposes an input stream.
    pub has_input: bool,

    /// Whether the device exposes an output stream.
    pub has_output: bool,

    /// Whether the device is hidden from device lists.
    pub is_hidden: bool,

    /// Whether the device may be picked as the default input/output device.
    pub can_be_default: bool,

    /// Whether the device may be picked as the default system (alert) device.
    pub can_be_default_system: bool,
}

impl DeviceConfig {
    /// A visible device with both directions, eligible as default.
    pub const fn new(name: &'static str, uid: &'static str) -> Self {
        Self {
            name,
            uid,
            has_input: true,
            has_output: true,
            is_hidden: false,
            can_be_default: true,
            can_be_default_system: true,
        }
    }

    /// Remove the input stream.
    pub const fn without_input(mut self) -> Self {
        self.has_input = false;
        self
    }

    /// Remove the output stream.
    pub const fn without_output(mut self) -> Self {
        self.has_output = false;
        self
    }

    /// Hide the device.
    pub const fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Set default-device eligibility.
    pub const fn with_default_eligibility(mut self, device: bool, system: bool) -> Self {
        self.can_be_default = device;
        self.can_be_default_system = system;
        self
    }
}

/// Configuration of the whole driver: the box, its devices and the shared
/// ring buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverConfig {
    /// Driver name, also used as the box name.
    pub name: &'static str,

    /// Manufacturer string reported by every object.
    pub manufacturer: &'static str,

    /// Bundle identifier of the plug-in.
    pub bundle_id: &'static str,

    /// Persistent box UID.
    pub box_uid: &'static str,

    /// Model UID shared by both devices.
    pub model_uid: &'static str,

    /// Interleaved channels per frame.
    pub channel_count: u32,

    /// Base ring buffer size in frames.
    pub ring_buffer_frames: u32,

    /// Extra frames of ring buffer and reported latency.
    pub latency_frames: u32,

    /// Device safety offset in frames.
    pub safety_offset_frames: u32,

    /// Frames between two zero time stamps.
    pub zero_timestamp_period: u32,

    /// Supported nominal sample rates.
    pub sample_rates: &'static [f64],

    /// Nominal sample rate at initialization.
    pub initial_sample_rate: f64,

    /// The primary device.
    pub primary: DeviceConfig,

    /// The optional mirror device sharing the primary's ring buffer.
    pub mirror: Option<DeviceConfig>,
}

impl DriverConfig {
    /// Create a configuration with default values.
    ///
    /// The primary device takes the driver name and a placeholder UID; set
    /// it explicitly with [`with_primary`](Self::with_primary) for a shipped
    /// driver.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            manufacturer: "Siphon",
            bundle_id: "audio.siphon.driver",
            box_uid: "Siphon_Box_UID",
            model_uid: "Siphon_Model_UID",
            channel_count: 2,
            ring_buffer_frames: DEFAULT_RING_BUFFER_FRAMES,
            latency_frames: 0,
            safety_offset_frames: 0,
            zero_timestamp_period: DEFAULT_ZERO_TIMESTAMP_PERIOD,
            sample_rates: STANDARD_SAMPLE_RATES,
            initial_sample_rate: DEFAULT_SAMPLE_RATE,
            primary: DeviceConfig::new(name, "Siphon_UID"),
            mirror: None,
        }
    }

    /// Set the manufacturer string.
    pub const fn with_manufacturer(mut self, manufacturer: &'static str) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    /// Set the bundle identifier.
    pub const fn with_bundle_id(mut self, bundle_id: &'static str) -> Self {
        self.bundle_id = bundle_id;
        self
    }

    /// Set the box UID.
    pub const fn with_box_uid(mut self, box_uid: &'static str) -> Self {
        self.box_uid = box_uid;
        self
    }

    /// Set the model UID.
    pub const fn with_model_uid(mut self, model_uid: &'static str) -> Self {
        self.model_uid = model_uid;
        self
    }

    /// Set the channel count.
    pub const fn with_channel_count(mut self, channel_count: u32) -> Self {
        self.channel_count = channel_count;
        self
    }

    /// Set the base ring buffer size in frames.
    pub const fn with_ring_buffer_frames(mut self, frames: u32) -> Self {
        self.ring_buffer_frames = frames;
        self
    }

    /// Set the latency in frames.
    pub const fn with_latency_frames(mut self, frames: u32) -> Self {
        self.latency_frames = frames;
        self
    }

    /// Set the safety offset in frames.
    pub const fn with_safety_offset_frames(mut self, frames: u32) -> Self {
        self.safety_offset_frames = frames;
        self
    }

    /// Set the zero time stamp period in frames.
    pub const fn with_zero_timestamp_period(mut self, frames: u32) -> Self {
        self.zero_timestamp_period = frames;
        self
    }

    /// Set the supported sample rates.
    pub const fn with_sample_rates(mut self, rates: &'static [f64]) -> Self {
        self.sample_rates = rates;
        self
    }

    /// Set the initial sample rate.
    pub const fn with_initial_sample_rate(mut self, rate: f64) -> Self {
        self.initial_sample_rate = rate;
        self
    }

    /// Set the primary device.
    pub const fn with_primary(mut self, device: DeviceConfig) -> Self {
        self.primary = device;
        self
    }

    /// Add a mirror device.
    pub const fn with_mirror(mut self, device: DeviceConfig) -> Self {
        self.mirror = Some(device);
        self
    }

    /// Ring buffer capacity in frames (base size plus latency).
    pub const fn ring_capacity_frames(&self) -> u32 {
        self.ring_buffer_frames + self.latency_frames
    }

    /// Whether `rate` is one of the supported nominal sample rates.
    pub fn supports_sample_rate(&self, rate: f64) -> bool {
        self.sample_rates.iter().any(|&supported| supported == rate)
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.is_empty() {
            return Err(invalid("driver name is empty"));
        }
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(EngineError::InvalidConfiguration(format!(
                "channel count {} outside 1..={}",
                self.channel_count, MAX_CHANNELS
            )));
        }
        if self.ring_buffer_frames == 0 {
            return Err(invalid("ring buffer size is zero"));
        }
        if self.ring_buffer_frames.checked_add(self.latency_frames).is_none() {
            return Err(invalid("ring buffer size plus latency overflows"));
        }
        if self.zero_timestamp_period == 0 {
            return Err(invalid("zero time stamp period is zero"));
        }
        if self.sample_rates.is_empty() {
            return Err(invalid("no sample rates"));
        }
        if let Some(rate) = self
            .sample_rates
            .iter()
            .find(|rate| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(EngineError::InvalidConfiguration(format!(
                "sample rate {} is not a positive finite number",
                rate
            )));
        }
        if !self.supports_sample_rate(self.initial_sample_rate) {
            return Err(EngineError::InvalidConfiguration(format!(
                "initial sample rate {} is not in the supported set",
                self.initial_sample_rate
            )));
        }

        validate_device(&self.primary)?;
        if let Some(mirror) = &self.mirror {
            validate_device(mirror)?;
            if mirror.uid == self.primary.uid {
                return Err(invalid("mirror device reuses the primary device UID"));
            }
        }
        if self.box_uid == self.primary.uid
            || self.mirror.is_some_and(|mirror| mirror.uid == self.box_uid)
        {
            return Err(invalid("box UID collides with a device UID"));
        }
        Ok(())
    }
}

fn validate_device(device: &DeviceConfig) -> EngineResult<()> {
    if device.name.is_empty() || device.uid.is_empty() {
        return Err(EngineError::InvalidConfiguration(format!(
            "device '{}' needs a name and a UID",
            device.uid
        )));
    }
    if !device.has_input && !device.has_output {
        return Err(EngineError::InvalidConfiguration(format!(
            "device '{}' has neither input nor output",
            device.name
        )));
    }
    Ok(())
}

fn invalid(msg: &str) -> EngineError {
    EngineError::InvalidConfiguration(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: DriverConfig = DriverConfig::new("Test");

    #[test]
    fn test_defaults_validate() {
        assert!(BASE.validate().is_ok());
        assert_eq!(BASE.ring_capacity_frames(), 65_536);
        assert!(BASE.supports_sample_rate(44_100.0));
        assert!(!BASE.supports_sample_rate(44_000.0));
    }

    #[test]
    fn test_builder_is_const() {
        static CONFIG: DriverConfig = DriverConfig::new("Static")
            .with_channel_count(16)
            .with_latency_frames(512)
            .with_mirror(DeviceConfig::new("Mirror", "Mirror_UID").hidden());
        assert_eq!(CONFIG.ring_capacity_frames(), 65_536 + 512);
        assert!(CONFIG.mirror.is_some_and(|m| m.is_hidden));
        assert!(CONFIG.validate().is_ok());
    }

    #[test]
    fn test_rejects_channel_count() {
        assert!(BASE.with_channel_count(0).validate().is_err());
        assert!(BASE.with_channel_count(MAX_CHANNELS + 1).validate().is_err());
        assert!(BASE.with_channel_count(MAX_CHANNELS).validate().is_ok());
    }

    #[test]
    fn test_rejects_initial_rate_outside_set() {
        let config = BASE.with_initial_sample_rate(12_345.0);
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_device_without_streams() {
        let device = DeviceConfig::new("Mute", "Mute_UID")
            .without_input()
            .without_output();
        assert!(BASE.with_primary(device).validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_uid() {
        let config = BASE.with_mirror(DeviceConfig::new("Mirror", BASE.primary.uid));
        assert!(config.validate().is_err());
    }
}
