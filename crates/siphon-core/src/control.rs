//! Control values: volume, mute, pitch and clock source.
//!
//! Values are written by property calls (under the state lock) and read by
//! the I/O path without any lock, so each one lives in its own atomic.
//! Relaxed ordering is enough: the I/O path only needs *a* recent value of
//! each control, never a consistent snapshot across controls.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use atomic_float::AtomicF32;

use crate::error::{EngineError, EngineResult};
use crate::types::Direction;

// =============================================================================
// Volume numerics
// =============================================================================

/// Lowest decibel value of the volume controls.
pub const MIN_DB: f32 = -64.0;

/// Highest decibel value of the volume controls.
pub const MAX_DB: f32 = 0.0;

/// Nominal pitch (no rate adjustment).
pub const PITCH_NOMINAL: f32 = 0.5;

/// Names of the clock source items, indexed by item ID.
pub const CLOCK_SOURCE_ITEMS: [&str; 2] = ["Internal Fixed", "Internal Adjustable"];

/// Map a volume scalar in [0, 1] to decibels.
pub fn scalar_to_decibels(scalar: f32) -> f32 {
    let scalar = scalar.clamp(0.0, 1.0);
    MIN_DB + scalar * (MAX_DB - MIN_DB)
}

/// Map decibels to a volume scalar in [0, 1].
pub fn decibels_to_scalar(decibels: f32) -> f32 {
    let decibels = decibels.clamp(MIN_DB, MAX_DB);
    (decibels - MIN_DB) / (MAX_DB - MIN_DB)
}

/// Linear amplitude applied to samples for a volume scalar.
///
/// A scalar of 0 is silence rather than -64 dB.
pub fn scalar_to_gain(scalar: f32) -> f32 {
    if scalar <= 0.0 {
        0.0
    } else {
        10f32.powf(scalar_to_decibels(scalar) / 20.0)
    }
}

/// The volume and mute state applied to one stream's samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamGain {
    pub scale: f32,
    pub muted: bool,
}

impl StreamGain {
    /// Pass samples through unchanged.
    pub const UNITY: Self = Self {
        scale: 1.0,
        muted: false,
    };

    pub const MUTED: Self = Self {
        scale: 1.0,
        muted: true,
    };

    /// Whether the samples are copied unchanged.
    pub fn is_unity(&self) -> bool {
        !self.muted && self.scale == 1.0
    }

    /// Whether every sample becomes zero.
    pub fn is_silent(&self) -> bool {
        self.muted || self.scale == 0.0
    }
}

// =============================================================================
// Per-stream controls
// =============================================================================

/// Volume and mute of one stream direction.
#[derive(Debug)]
pub struct StreamControls {
    /// Scalar exactly as last set.
    scalar: AtomicF32,
    /// Amplitude derived from `scalar`.
    gain: AtomicF32,
    muted: AtomicBool,
}

impl StreamControls {
    fn new() -> Self {
        Self {
            scalar: AtomicF32::new(1.0),
            gain: AtomicF32::new(1.0),
            muted: AtomicBool::new(false),
        }
    }

    pub fn scalar(&self) -> f32 {
        self.scalar.load(Ordering::Relaxed)
    }

    pub fn decibels(&self) -> f32 {
        scalar_to_decibels(self.scalar())
    }

    /// Set the volume scalar. Returns whether the value changed.
    ///
    /// Values outside [0, 1] are rejected and leave the control untouched.
    pub fn set_scalar(&self, scalar: f32) -> EngineResult<bool> {
        if !(0.0..=1.0).contains(&scalar) {
            return Err(EngineError::InvalidValue("volume scalar outside [0, 1]"));
        }
        if self.scalar() == scalar {
            return Ok(false);
        }
        self.gain.store(scalar_to_gain(scalar), Ordering::Relaxed);
        self.scalar.store(scalar, Ordering::Relaxed);
        Ok(true)
    }

    /// Set the volume in decibels. Returns whether the value changed.
    pub fn set_decibels(&self, decibels: f32) -> EngineResult<bool> {
        if !(MIN_DB..=MAX_DB).contains(&decibels) {
            return Err(EngineError::InvalidValue("volume decibels outside range"));
        }
        self.set_scalar(decibels_to_scalar(decibels))
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Set the mute gate. Returns whether the value changed.
    pub fn set_muted(&self, muted: bool) -> bool {
        self.muted.swap(muted, Ordering::Relaxed) != muted
    }

    /// Snapshot for one I/O pass.
    pub fn gain(&self) -> StreamGain {
        StreamGain {
            scale: self.gain.load(Ordering::Relaxed),
            muted: self.is_muted(),
        }
    }

    fn reset(&self) {
        self.scalar.store(1.0, Ordering::Relaxed);
        self.gain.store(1.0, Ordering::Relaxed);
        self.muted.store(false, Ordering::Relaxed);
    }
}

// =============================================================================
// Per-device controls
// =============================================================================

/// Every control value owned by one device.
#[derive(Debug)]
pub struct DeviceControls {
    input: StreamControls,
    output: StreamControls,
    pitch: AtomicF32,
    clock_source: AtomicU32,
}

impl DeviceControls {
    pub fn new() -> Self {
        Self {
            input: StreamControls::new(),
            output: StreamControls::new(),
            pitch: AtomicF32::new(PITCH_NOMINAL),
            clock_source: AtomicU32::new(0),
        }
    }

    pub fn stream(&self, direction: Direction) -> &StreamControls {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch.load(Ordering::Relaxed)
    }

    /// Set the pitch adjustment in [0, 1]. Returns whether the value changed.
    pub fn set_pitch(&self, pitch: f32) -> EngineResult<bool> {
        if !(0.0..=1.0).contains(&pitch) {
            return Err(EngineError::InvalidValue("pitch outside [0, 1]"));
        }
        Ok(self.pitch.swap(pitch, Ordering::Relaxed) != pitch)
    }

    pub fn clock_source(&self) -> u32 {
        self.clock_source.load(Ordering::Relaxed)
    }

    /// Select a clock source item. Returns whether the value changed.
    ///
    /// The selection is reported back to the host but does not change how
    /// the device is clocked.
    pub fn set_clock_source(&self, item: u32) -> EngineResult<bool> {
        if item as usize >= CLOCK_SOURCE_ITEMS.len() {
            return Err(EngineError::InvalidValue("unknown clock source item"));
        }
        Ok(self.clock_source.swap(item, Ordering::Relaxed) != item)
    }

    /// Restore every control to its initial value.
    pub fn reset(&self) {
        self.input.reset();
        self.output.reset();
        self.pitch.store(PITCH_NOMINAL, Ordering::Relaxed);
        self.clock_source.store(0, Ordering::Relaxed);
    }
}

impl Default for DeviceControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decibel_mapping_endpoints() {
        assert_eq!(scalar_to_decibels(0.0), MIN_DB);
        assert_eq!(scalar_to_decibels(1.0), MAX_DB);
        assert_eq!(decibels_to_scalar(-32.0), 0.5);
        assert_eq!(scalar_to_gain(1.0), 1.0);
        assert_eq!(scalar_to_gain(0.0), 0.0);
    }

    #[test]
    fn test_volume_round_trip_exact() {
        let controls = StreamControls::new();
        for scalar in [0.0, 0.1, 0.25, 1.0 / 3.0, 0.5, 0.75, 0.999, 1.0] {
            controls.set_scalar(scalar).unwrap();
            assert_eq!(controls.scalar(), scalar);
        }
    }

    #[test]
    fn test_volume_rejects_out_of_range() {
        let controls = StreamControls::new();
        controls.set_scalar(0.3).unwrap();
        for bad in [-0.01, 1.01, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                controls.set_scalar(bad),
                Err(EngineError::InvalidValue(_))
            ));
            assert_eq!(controls.scalar(), 0.3);
        }
    }

    #[test]
    fn test_set_reports_change() {
        let controls = StreamControls::new();
        assert!(!controls.set_scalar(1.0).unwrap());
        assert!(controls.set_scalar(0.5).unwrap());
        assert!(controls.set_muted(true));
        assert!(!controls.set_muted(true));
    }

    #[test]
    fn test_gain_snapshot() {
        let controls = StreamControls::new();
        assert!(controls.gain().is_unity());
        controls.set_muted(true);
        assert!(controls.gain().is_silent());
        controls.set_muted(false);
        controls.set_decibels(-20.0).unwrap();
        let gain = controls.gain();
        assert!((gain.scale - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_and_clock_source_domains() {
        let controls = DeviceControls::new();
        assert_eq!(controls.pitch(), PITCH_NOMINAL);
        assert!(controls.set_pitch(1.5).is_err());
        assert!(controls.set_pitch(0.75).unwrap());
        assert!(controls.set_clock_source(2).is_err());
        assert!(controls.set_clock_source(1).unwrap());
        controls.reset();
        assert_eq!(controls.pitch(), PITCH_NOMINAL);
        assert_eq!(controls.clock_source(), 0);
    }
}
