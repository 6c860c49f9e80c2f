//! Host clock abstraction and the per-device zero time stamp timeline.
//!
//! A virtual device has no hardware clock. Its timeline is derived from the
//! host's monotonic clock: starting at the moment I/O starts, every
//! `period` frames at the nominal rate the device publishes a new zero time
//! stamp pairing a sample time with the host time it corresponds to.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::control::PITCH_NOMINAL;
use crate::types::ZeroTimeStamp;

/// Maximum rate deviation of the pitch control at either end of its range.
pub const PITCH_RATE_SPAN: f64 = 0.02;

// =============================================================================
// Clocks
// =============================================================================

/// A monotonic host time source.
pub trait HostClock: Send + Sync {
    /// Current host time in ticks.
    fn now(&self) -> u64;

    /// Number of ticks per second.
    fn ticks_per_second(&self) -> f64;
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    ticks: AtomicU64,
    ticks_per_second: f64,
}

impl ManualClock {
    pub fn new(ticks_per_second: f64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            ticks_per_second,
        }
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl HostClock for ManualClock {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }
}

/// Host ticks per frame at `sample_rate`, adjusted by the pitch control.
///
/// Pitch 0.5 is nominal; 1.0 runs the device 1% fast, 0.0 runs it 1% slow.
pub fn ticks_per_frame(ticks_per_second: f64, sample_rate: f64, pitch: f32) -> f64 {
    let adjust = 1.0 - PITCH_RATE_SPAN * (f64::from(pitch) - f64::from(PITCH_NOMINAL));
    ticks_per_second / sample_rate * adjust
}

// =============================================================================
// Timeline
// =============================================================================

/// Zero time stamp generator for one device.
#[derive(Debug, Clone)]
pub struct Timeline {
    period_frames: u64,
    ticks_per_frame: f64,
    /// Host time of the last rebase.
    anchor_host_time: u64,
    /// Sample time of the last rebase.
    anchor_sample_time: u64,
    /// Number of whole periods since I/O started.
    periods: u64,
    seed: u64,
}

impl Timeline {
    pub fn new(period_frames: u32) -> Self {
        Self {
            period_frames: u64::from(period_frames.max(1)),
            ticks_per_frame: 0.0,
            anchor_host_time: 0,
            anchor_sample_time: 0,
            periods: 0,
            seed: 1,
        }
    }

    /// Anchor the timeline at `now`. Called when a device starts I/O.
    pub fn start(&mut self, now: u64, ticks_per_frame: f64) {
        self.anchor_host_time = now;
        self.anchor_sample_time = 0;
        self.periods = 0;
        if self.ticks_per_frame != ticks_per_frame {
            self.ticks_per_frame = ticks_per_frame;
            self.seed += 1;
        }
    }

    /// Change the frame duration while running.
    ///
    /// The timeline is rebased at the current zero time stamp so that
    /// published host times stay monotonic. The seed changes so the host
    /// discards its rate estimate.
    pub fn set_ticks_per_frame(&mut self, ticks_per_frame: f64) {
        if self.ticks_per_frame == ticks_per_frame {
            return;
        }
        let current = self.current();
        self.anchor_host_time = current.host_time;
        self.anchor_sample_time = current.sample_time as u64;
        self.ticks_per_frame = ticks_per_frame;
        self.seed += 1;
    }

    pub fn ticks_per_frame(&self) -> f64 {
        self.ticks_per_frame
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the current zero time stamp, first advancing one period if the
    /// next period boundary has already passed at `now`.
    pub fn zero_timestamp(&mut self, now: u64) -> ZeroTimeStamp {
        let next = self.host_time_at(self.sample_time_at(self.periods + 1));
        if next <= now {
            self.periods += 1;
        }
        self.current()
    }

    fn current(&self) -> ZeroTimeStamp {
        let sample_time = self.sample_time_at(self.periods);
        ZeroTimeStamp {
            sample_time: sample_time as f64,
            host_time: self.host_time_at(sample_time),
            seed: self.seed,
        }
    }

    fn sample_time_at(&self, periods: u64) -> u64 {
        periods * self.period_frames
    }

    fn host_time_at(&self, sample_time: u64) -> u64 {
        let frames = sample_time.saturating_sub(self.anchor_sample_time) as f64;
        self.anchor_host_time + (frames * self.ticks_per_frame) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_frame_nominal_and_pitch() {
        assert_eq!(ticks_per_frame(48_000.0, 48_000.0, 0.5), 1.0);
        assert!((ticks_per_frame(48_000.0, 48_000.0, 1.0) - 0.99).abs() < 1e-12);
        assert!((ticks_per_frame(48_000.0, 48_000.0, 0.0) - 1.01).abs() < 1e-12);
    }

    #[test]
    fn test_zero_timestamp_advances_one_period_at_a_time() {
        let mut timeline = Timeline::new(100);
        timeline.start(1_000, 10.0);

        let first = timeline.zero_timestamp(1_000);
        assert_eq!(first.sample_time, 0.0);
        assert_eq!(first.host_time, 1_000);

        // Just before the boundary (1_000 + 100 * 10).
        assert_eq!(timeline.zero_timestamp(1_999).sample_time, 0.0);

        let second = timeline.zero_timestamp(2_000);
        assert_eq!(second.sample_time, 100.0);
        assert_eq!(second.host_time, 2_000);
        assert_eq!(second.seed, first.seed);

        // Far in the future still moves a single period per call.
        assert_eq!(timeline.zero_timestamp(100_000).sample_time, 200.0);
    }

    #[test]
    fn test_restart_resets_sample_time() {
        let mut timeline = Timeline::new(10);
        timeline.start(0, 1.0);
        timeline.zero_timestamp(50);
        timeline.start(500, 1.0);
        let stamp = timeline.zero_timestamp(500);
        assert_eq!(stamp.sample_time, 0.0);
        assert_eq!(stamp.host_time, 500);
    }

    #[test]
    fn test_rate_change_bumps_seed_and_rebases() {
        let mut timeline = Timeline::new(100);
        timeline.start(0, 10.0);
        timeline.zero_timestamp(1_000);
        let seed = timeline.seed();

        timeline.set_ticks_per_frame(20.0);
        assert_eq!(timeline.seed(), seed + 1);

        // Rebased at sample 100 / host 1_000; next boundary is 2_000 ticks later.
        assert_eq!(timeline.zero_timestamp(2_999).sample_time, 100.0);
        let stamp = timeline.zero_timestamp(3_000);
        assert_eq!(stamp.sample_time, 200.0);
        assert_eq!(stamp.host_time, 3_000);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000.0);
        clock.set(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        assert_eq!(clock.ticks_per_second(), 1_000.0);
    }
}
