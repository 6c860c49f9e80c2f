//! Device session state machine and I/O client refcounting.
//!
//! ```text
//! Uninitialized --[create]--> Initialized --[start 0->1]--> Running
//!                               ^    |                         |
//!                               |    +--[destroy]--> Destroyed |
//!                               +-----------[stop 1->0]--------+
//! ```
//!
//! `Destroyed` may be created again. Several host clients may run I/O on the
//! same device at once; the device only changes state when the sum of their
//! start counts crosses zero.

use log::{debug, warn};

use crate::clock::Timeline;
use crate::error::{EngineError, EngineResult};
use crate::types::{ClientId, ObjectId, MAX_IO_CLIENTS};

/// Lifecycle state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Never created.
    Uninitialized,
    /// Created and idle.
    Initialized,
    /// At least one client is running I/O.
    Running,
    /// Destroyed by the host; may be created again.
    Destroyed,
}

/// One host client running I/O on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoClient {
    pub client_id: ClientId,
    /// Outstanding `StartIO` calls from this client.
    pub starts: u32,
    /// I/O cycles performed for this client since it started.
    pub cycles: u64,
}

/// What a start or stop did to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoTransition {
    /// First client started: the device is now running.
    Started,
    /// The device was already running.
    Joined,
    /// Last client stopped: the device is idle again.
    Stopped,
    /// Other clients are still running.
    Left,
    /// Nothing was running for this client. Logged, not an error.
    Ignored,
}

/// Per-device I/O session.
#[derive(Debug)]
pub struct DeviceSession {
    device: ObjectId,
    state: SessionState,
    clients: Vec<IoClient>,
    running: u32,
    timeline: Timeline,
}

impl DeviceSession {
    pub fn new(device: ObjectId, period_frames: u32) -> Self {
        Self {
            device,
            state: SessionState::Uninitialized,
            clients: Vec::new(),
            running: 0,
            timeline: Timeline::new(period_frames),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the device currently exists for the host.
    pub fn is_created(&self) -> bool {
        matches!(self.state, SessionState::Initialized | SessionState::Running)
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Sum of outstanding starts across all clients.
    pub fn running_count(&self) -> u32 {
        self.running
    }

    pub fn clients(&self) -> &[IoClient] {
        &self.clients
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Create the device. Client slots are reserved here so that starting
    /// I/O never allocates.
    pub fn create(&mut self) -> EngineResult<()> {
        match self.state {
            SessionState::Uninitialized | SessionState::Destroyed => {
                self.clients
                    .try_reserve_exact(MAX_IO_CLIENTS)
                    .map_err(|_| EngineError::AllocationFailed("I/O client table"))?;
                self.running = 0;
                self.state = SessionState::Initialized;
                debug!("device {} created", self.device);
                Ok(())
            }
            SessionState::Initialized | SessionState::Running => {
                Err(EngineError::InvalidState("device already created"))
            }
        }
    }

    /// Destroy the device. Fails while any client is running.
    pub fn destroy(&mut self) -> EngineResult<()> {
        match self.state {
            SessionState::Initialized => {
                self.clients = Vec::new();
                self.state = SessionState::Destroyed;
                debug!("device {} destroyed", self.device);
                Ok(())
            }
            SessionState::Running => Err(EngineError::InvalidState(
                "cannot destroy a device while I/O is running",
            )),
            SessionState::Uninitialized | SessionState::Destroyed => {
                Err(EngineError::InvalidState("device does not exist"))
            }
        }
    }

    /// Drop every client and return to `Initialized`. Used by teardown.
    pub fn force_stop(&mut self) {
        if self.state == SessionState::Running {
            warn!(
                "device {} stopped with {} I/O start(s) outstanding",
                self.device, self.running
            );
            self.clients.clear();
            self.running = 0;
            self.state = SessionState::Initialized;
        }
    }

    /// Register one `StartIO` from `client_id`.
    ///
    /// On the 0->1 transition the timeline is anchored at `now`.
    pub fn start_io(
        &mut self,
        client_id: ClientId,
        now: u64,
        ticks_per_frame: f64,
    ) -> EngineResult<IoTransition> {
        if !self.is_created() {
            return Err(EngineError::InvalidState("device does not exist"));
        }

        match self.clients.iter_mut().find(|c| c.client_id == client_id) {
            Some(client) => client.starts += 1,
            None => {
                if self.clients.len() >= MAX_IO_CLIENTS {
                    return Err(EngineError::IllegalOperation("too many I/O clients"));
                }
                self.clients.push(IoClient {
                    client_id,
                    starts: 1,
                    cycles: 0,
                });
            }
        }

        self.running += 1;
        if self.running == 1 {
            self.state = SessionState::Running;
            self.timeline.start(now, ticks_per_frame);
            debug!("device {} started by client {}", self.device, client_id);
            Ok(IoTransition::Started)
        } else {
            Ok(IoTransition::Joined)
        }
    }

    /// Register one `StopIO` from `client_id`.
    pub fn stop_io(&mut self, client_id: ClientId) -> IoTransition {
        if self.running == 0 {
            warn!(
                "StopIO from client {} on device {} with nothing running",
                client_id, self.device
            );
            return IoTransition::Ignored;
        }

        let Some(index) = self.clients.iter().position(|c| c.client_id == client_id) else {
            warn!(
                "StopIO from unknown client {} on device {}",
                client_id, self.device
            );
            return IoTransition::Ignored;
        };

        let client = &mut self.clients[index];
        client.starts -= 1;
        if client.starts == 0 {
            self.clients.swap_remove(index);
        }

        self.running -= 1;
        if self.running == 0 {
            self.state = SessionState::Initialized;
            debug!("device {} stopped by client {}", self.device, client_id);
            IoTransition::Stopped
        } else {
            IoTransition::Left
        }
    }

    /// Count one I/O cycle for `client_id`.
    pub fn note_cycle(&mut self, client_id: ClientId) {
        if let Some(client) = self.clients.iter_mut().find(|c| c.client_id == client_id) {
            client.cycles += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> DeviceSession {
        let mut session = DeviceSession::new(3, 16);
        session.create().unwrap();
        session
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut session = DeviceSession::new(3, 16);
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.start_io(1, 0, 1.0).is_err());

        session.create().unwrap();
        assert_eq!(session.state(), SessionState::Initialized);
        assert!(session.create().is_err());

        assert_eq!(session.start_io(1, 0, 1.0).unwrap(), IoTransition::Started);
        assert_eq!(session.state(), SessionState::Running);
        assert!(session.destroy().is_err());

        assert_eq!(session.stop_io(1), IoTransition::Stopped);
        session.destroy().unwrap();
        assert_eq!(session.state(), SessionState::Destroyed);

        session.create().unwrap();
        assert!(session.is_created());
    }

    #[test]
    fn test_refcount_only_stops_on_last_client() {
        let mut session = created();
        assert_eq!(session.start_io(1, 0, 1.0).unwrap(), IoTransition::Started);
        assert_eq!(session.start_io(2, 0, 1.0).unwrap(), IoTransition::Joined);
        assert_eq!(session.start_io(2, 0, 1.0).unwrap(), IoTransition::Joined);
        assert_eq!(session.running_count(), 3);
        assert_eq!(session.clients().len(), 2);

        assert_eq!(session.stop_io(2), IoTransition::Left);
        assert_eq!(session.stop_io(1), IoTransition::Left);
        assert!(session.is_running());
        assert_eq!(session.stop_io(2), IoTransition::Stopped);
        assert!(session.clients().is_empty());
    }

    #[test]
    fn test_stop_without_start_is_ignored() {
        let mut session = created();
        assert_eq!(session.stop_io(1), IoTransition::Ignored);
        assert_eq!(session.running_count(), 0);

        session.start_io(1, 0, 1.0).unwrap();
        assert_eq!(session.stop_io(7), IoTransition::Ignored);
        assert_eq!(session.running_count(), 1);
    }

    #[test]
    fn test_cycles_counted_per_client() {
        let mut session = created();
        session.start_io(5, 0, 1.0).unwrap();
        session.note_cycle(5);
        session.note_cycle(5);
        session.note_cycle(6);
        assert_eq!(session.clients()[0].cycles, 2);
    }

    #[test]
    fn test_client_table_is_bounded() {
        let mut session = created();
        for client in 0..MAX_IO_CLIENTS as u32 {
            session.start_io(client, 0, 1.0).unwrap();
        }
        assert!(matches!(
            session.start_io(u32::MAX, 0, 1.0),
            Err(EngineError::IllegalOperation(_))
        ));
        // An existing client can still nest.
        assert!(session.start_io(0, 0, 1.0).is_ok());
    }

    #[test]
    fn test_force_stop() {
        let mut session = created();
        session.start_io(1, 0, 1.0).unwrap();
        session.start_io(1, 0, 1.0).unwrap();
        session.force_stop();
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(session.running_count(), 0);
    }
}
