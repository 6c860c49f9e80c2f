//! Mutable engine state, split by the lock that guards it.

use crate::device::{DeviceSession, SessionState};
use crate::graph::DeviceSlot;
use crate::ring_buffer::RingBuffer;
use crate::types::Direction;

/// What the control plane knows about a device's session.
///
/// Updated only while both locks are held, so it agrees with the session in
/// the io plane whichever lock a reader holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub state: SessionState,
    pub running: u32,
}

impl DeviceStatus {
    pub fn of(session: &DeviceSession) -> Self {
        Self {
            state: session.state(),
            running: session.running_count(),
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.state, SessionState::Initialized | SessionState::Running)
    }
}

/// State guarded by the state lock.
#[derive(Debug)]
pub struct ControlPlane {
    /// Nominal sample rate shared by both devices (they share one buffer).
    pub sample_rate: f64,
    pub devices: [DeviceStatus; 2],
    pub box_acquired: bool,
    /// `IsActive` of each stream, indexed by slot then direction.
    pub stream_active: [[bool; 2]; 2],
}

impl ControlPlane {
    pub fn new(sample_rate: f64) -> Self {
        let idle = DeviceStatus {
            state: SessionState::Uninitialized,
            running: 0,
        };
        Self {
            sample_rate,
            devices: [idle; 2],
            box_acquired: true,
            stream_active: [[true; 2]; 2],
        }
    }

    pub fn device(&self, slot: DeviceSlot) -> &DeviceStatus {
        &self.devices[slot.index()]
    }

    /// Running count summed over both devices.
    pub fn aggregate_running(&self) -> u32 {
        self.devices.iter().map(|d| d.running).sum()
    }

    pub fn stream_active(&self, slot: DeviceSlot, direction: Direction) -> bool {
        self.stream_active[slot.index()][direction_index(direction)]
    }

    pub fn set_stream_active(&mut self, slot: DeviceSlot, direction: Direction, active: bool) {
        self.stream_active[slot.index()][direction_index(direction)] = active;
    }
}

/// State guarded by the io lock.
#[derive(Debug)]
pub struct IoPlane {
    /// Shared by both devices; present while at least one device exists.
    pub ring: Option<RingBuffer>,
    pub sessions: [DeviceSession; 2],
}

impl IoPlane {
    pub fn new(period_frames: u32) -> Self {
        Self {
            ring: None,
            sessions: DeviceSlot::ALL
                .map(|slot| DeviceSession::new(slot.device_id(), period_frames)),
        }
    }

    pub fn session(&self, slot: DeviceSlot) -> &DeviceSession {
        &self.sessions[slot.index()]
    }

    pub fn session_mut(&mut self, slot: DeviceSlot) -> &mut DeviceSession {
        &mut self.sessions[slot.index()]
    }

    /// Running count summed over both devices.
    pub fn aggregate_running(&self) -> u32 {
        self.sessions.iter().map(DeviceSession::running_count).sum()
    }

    /// Whether any device currently exists.
    pub fn any_created(&self) -> bool {
        self.sessions.iter().any(DeviceSession::is_created)
    }
}

fn direction_index(direction: Direction) -> usize {
    match direction {
        Direction::Input => 0,
        Direction::Output => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_active_defaults_and_updates() {
        let mut plane = ControlPlane::new(48_000.0);
        assert!(plane.stream_active(DeviceSlot::Mirror, Direction::Output));
        plane.set_stream_active(DeviceSlot::Mirror, Direction::Output, false);
        assert!(!plane.stream_active(DeviceSlot::Mirror, Direction::Output));
        assert!(plane.stream_active(DeviceSlot::Primary, Direction::Output));
    }

    #[test]
    fn test_aggregate_running() {
        let mut io = IoPlane::new(16);
        io.session_mut(DeviceSlot::Primary).create().unwrap();
        io.session_mut(DeviceSlot::Mirror).create().unwrap();
        io.session_mut(DeviceSlot::Primary).start_io(1, 0, 1.0).unwrap();
        io.session_mut(DeviceSlot::Mirror).start_io(1, 0, 1.0).unwrap();
        assert_eq!(io.aggregate_running(), 2);
        assert!(io.any_created());

        let mut plane = ControlPlane::new(48_000.0);
        plane.devices[0] = DeviceStatus::of(io.session(DeviceSlot::Primary));
        assert_eq!(plane.aggregate_running(), 1);
        assert!(plane.device(DeviceSlot::Primary).is_created());
    }
}
