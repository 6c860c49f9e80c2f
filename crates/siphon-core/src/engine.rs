//! The loopback engine: one owned context behind every host entry point.
//!
//! # Locking
//!
//! - Property calls hold the state lock, and take the io lock under it only
//!   to reconfigure the ring buffer or retime a running device.
//! - Lifecycle and start/stop calls hold both locks (state first).
//! - `DoIOOperation` and `GetZeroTimeStamp` hold only the io lock, so the
//!   data path never waits on a property call that does not touch the
//!   buffer.

use std::sync::Arc;

use log::{debug, warn};

use crate::clock::{ticks_per_frame, HostClock};
use crate::config::DriverConfig;
use crate::control::DeviceControls;
use crate::device::{IoTransition, SessionState};
use crate::error::{EngineError, EngineResult};
use crate::graph::{DeviceSlot, ObjectGraph, ObjectKind};
use crate::property::{
    device_config, dispatch, PropertyChange, PropertyContext, PropertyData, Qualifier,
};
use crate::ring_buffer::RingBuffer;
use crate::state::{ControlPlane, DeviceStatus, IoPlane};
use crate::sync::IoLocks;
use crate::types::{
    ClientId, Direction, IoCapability, IoCycleInfo, IoOperation, ObjectId, PropertyAddress,
    ZeroTimeStamp,
};

/// The virtual loopback engine.
pub struct Engine {
    config: DriverConfig,
    graph: ObjectGraph,
    controls: [DeviceControls; 2],
    locks: IoLocks<ControlPlane, IoPlane>,
    clock: Arc<dyn HostClock>,
}

/// Undoes a device creation unless committed.
struct CreateRollback<'a> {
    io: &'a mut IoPlane,
    slot: DeviceSlot,
    allocated_ring: bool,
    committed: bool,
}

impl CreateRollback<'_> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for CreateRollback<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if self.allocated_ring {
            self.io.ring = None;
        }
        if let Err(err) = self.io.session_mut(self.slot).destroy() {
            warn!("rollback of device {:?} failed: {}", self.slot, err);
        }
    }
}

impl Engine {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Validate `config`, build the object graph and create every
    /// configured device.
    pub fn initialize(config: DriverConfig, clock: Arc<dyn HostClock>) -> EngineResult<Self> {
        config.validate()?;
        let graph = ObjectGraph::build(&config);
        let engine = Self {
            controls: [DeviceControls::new(), DeviceControls::new()],
            locks: IoLocks::new(
                ControlPlane::new(config.initial_sample_rate),
                IoPlane::new(config.zero_timestamp_period),
            ),
            graph,
            config,
            clock,
        };

        // A failure drops `engine`, releasing whatever was created.
        for &device in engine.graph.devices() {
            engine.create_device(device)?;
        }
        debug!(
            "engine initialized: {} device(s), {} channel(s), {} Hz",
            engine.graph.devices().len(),
            engine.config.channel_count,
            engine.config.initial_sample_rate
        );
        Ok(engine)
    }

    /// Stop all I/O and destroy every device.
    pub fn teardown(&self) {
        let mut both = self.locks.lock_both();
        for slot in DeviceSlot::ALL {
            let session = both.io.session_mut(slot);
            session.force_stop();
            if session.is_created() {
                // Cannot fail: the session was just stopped.
                let _ = session.destroy();
            }
            let status = DeviceStatus::of(both.io.session(slot));
            both.state.devices[slot.index()] = status;
        }
        both.io.ring = None;
        debug!("engine torn down");
    }

    /// Bring the engine back after [`teardown`](Self::teardown): control
    /// state returns to its initial values and every configured device is
    /// created again. Fails with `InvalidState` while any device exists.
    pub fn restart(&self) -> EngineResult<()> {
        {
            let mut both = self.locks.lock_both();
            if both.io.any_created() {
                return Err(EngineError::InvalidState("engine still has live devices"));
            }
            *both.state = ControlPlane::new(self.config.initial_sample_rate);
        }
        for &device in self.graph.devices() {
            self.create_device(device)?;
        }
        debug!("engine restarted");
        Ok(())
    }

    /// Whether any configured device currently exists.
    pub fn is_live(&self) -> bool {
        let state = self.locks.lock_state();
        DeviceSlot::ALL.iter().any(|&slot| state.device(slot).is_created())
    }

    /// Create a device. Allocates the shared ring buffer when it is the first
    /// live device; any failure leaves the device absent.
    pub fn create_device(&self, device: ObjectId) -> EngineResult<()> {
        self.create_device_with(device, || {
            RingBuffer::initialize(
                self.config.ring_buffer_frames as usize,
                self.config.channel_count as usize,
                self.config.latency_frames as usize,
            )
        })
    }

    fn create_device_with(
        &self,
        device: ObjectId,
        allocate: impl FnOnce() -> EngineResult<RingBuffer>,
    ) -> EngineResult<()> {
        let slot = self.graph.device_slot(device)?;
        let mut both = self.locks.lock_both();

        both.io.session_mut(slot).create()?;
        let mut rollback = CreateRollback {
            io: &mut *both.io,
            slot,
            allocated_ring: false,
            committed: false,
        };

        if rollback.io.ring.is_none() {
            rollback.io.ring = Some(allocate()?);
            rollback.allocated_ring = true;
        }
        let status = DeviceStatus::of(rollback.io.session(slot));
        rollback.commit();

        self.controls[slot.index()].reset();
        both.state.devices[slot.index()] = status;
        debug!("CreateDevice {}", device);
        Ok(())
    }

    /// Destroy a device. Fails while it is running I/O. The ring buffer is
    /// released with the last live device.
    pub fn destroy_device(&self, device: ObjectId) -> EngineResult<()> {
        let slot = self.graph.device_slot(device)?;
        let mut both = self.locks.lock_both();

        both.io.session_mut(slot).destroy()?;
        if !both.io.any_created() {
            both.io.ring = None;
        }
        let status = DeviceStatus::of(both.io.session(slot));
        both.state.devices[slot.index()] = status;
        debug!("DestroyDevice {}", device);
        Ok(())
    }

    /// Accept a host client on a device. Clients carry no state until they
    /// start I/O.
    pub fn add_device_client(&self, device: ObjectId, client: ClientId) -> EngineResult<()> {
        self.require_live_device(device)?;
        debug!("AddDeviceClient {} on device {}", client, device);
        Ok(())
    }

    pub fn remove_device_client(&self, device: ObjectId, client: ClientId) -> EngineResult<()> {
        self.require_live_device(device)?;
        debug!("RemoveDeviceClient {} on device {}", client, device);
        Ok(())
    }

    /// Configuration changes are applied synchronously by property calls, so
    /// a requested change has nothing left to do here.
    pub fn perform_device_configuration_change(
        &self,
        device: ObjectId,
        action: u64,
    ) -> EngineResult<()> {
        self.require_live_device(device)?;
        debug!("PerformDeviceConfigurationChange {} on device {}", action, device);
        Ok(())
    }

    pub fn abort_device_configuration_change(
        &self,
        device: ObjectId,
        action: u64,
    ) -> EngineResult<()> {
        self.require_live_device(device)?;
        debug!("AbortDeviceConfigurationChange {} on device {}", action, device);
        Ok(())
    }

    fn require_live_device(&self, device: ObjectId) -> EngineResult<DeviceSlot> {
        let slot = self.graph.device_slot(device)?;
        if self.locks.lock_state().device(slot).is_created() {
            Ok(slot)
        } else {
            Err(EngineError::InvalidObject(device))
        }
    }

    // =========================================================================
    // I/O
    // =========================================================================

    /// Start I/O for `client` on `device`.
    ///
    /// The shared ring buffer is cleared when the first client across both
    /// devices starts; the device's timeline is anchored when its own first
    /// client starts.
    pub fn start_io(&self, device: ObjectId, client: ClientId) -> EngineResult<IoTransition> {
        let slot = self.graph.device_slot(device)?;
        let mut both = self.locks.lock_both();

        let tpf = ticks_per_frame(
            self.clock.ticks_per_second(),
            both.state.sample_rate,
            self.controls[slot.index()].pitch(),
        );
        let was_idle = both.io.aggregate_running() == 0;
        let transition = both
            .io
            .session_mut(slot)
            .start_io(client, self.clock.now(), tpf)?;

        if was_idle {
            if let Some(ring) = both.io.ring.as_mut() {
                ring.clear();
            }
        }
        let status = DeviceStatus::of(both.io.session(slot));
        both.state.devices[slot.index()] = status;
        Ok(transition)
    }

    /// Stop I/O for `client` on `device`. Waits for any in-flight I/O
    /// operation before touching the buffer.
    pub fn stop_io(&self, device: ObjectId, client: ClientId) -> EngineResult<IoTransition> {
        let slot = self.graph.device_slot(device)?;
        let mut both = self.locks.lock_both();

        let transition = both.io.session_mut(slot).stop_io(client);
        if transition == IoTransition::Stopped && both.io.aggregate_running() == 0 {
            if let Some(ring) = both.io.ring.as_mut() {
                ring.clear();
            }
        }
        let status = DeviceStatus::of(both.io.session(slot));
        both.state.devices[slot.index()] = status;
        Ok(transition)
    }

    /// The device's current zero time stamp.
    pub fn get_zero_timestamp(&self, device: ObjectId) -> EngineResult<ZeroTimeStamp> {
        let slot = self.graph.device_slot(device)?;
        let mut io = self.locks.lock_io();
        let session = io.session_mut(slot);
        if !session.is_running() {
            return Err(EngineError::NotRunning(device));
        }
        Ok(session.timeline_mut().zero_timestamp(self.clock.now()))
    }

    /// Which I/O operations the device takes part in.
    pub fn will_do_io_operation(
        &self,
        device: ObjectId,
        operation: IoOperation,
    ) -> EngineResult<IoCapability> {
        let slot = self.graph.device_slot(device)?;
        let config = device_config(&self.config, slot);
        let will_do = match operation {
            IoOperation::ReadInput => config.has_input,
            IoOperation::WriteMix => config.has_output,
            IoOperation::Other(_) => false,
        };
        Ok(IoCapability {
            will_do,
            in_place: true,
        })
    }

    pub fn begin_io_operation(
        &self,
        device: ObjectId,
        _client: ClientId,
        _operation: IoOperation,
        _frame_count: usize,
        _cycle: &IoCycleInfo,
    ) -> EngineResult<()> {
        self.require_running(device)
    }

    pub fn end_io_operation(
        &self,
        device: ObjectId,
        _client: ClientId,
        _operation: IoOperation,
        _frame_count: usize,
        _cycle: &IoCycleInfo,
    ) -> EngineResult<()> {
        self.require_running(device)
    }

    fn require_running(&self, device: ObjectId) -> EngineResult<()> {
        let slot = self.graph.device_slot(device)?;
        if self.locks.lock_io().session(slot).is_running() {
            Ok(())
        } else {
            Err(EngineError::NotRunning(device))
        }
    }

    /// Move one cycle's samples between the host buffer and the ring buffer.
    ///
    /// `WriteMix` on an output stream stores `buffer` at the cycle's output
    /// sample time; `ReadInput` on an input stream fills `buffer` from the
    /// input sample time. Volume and mute of the stream are applied in the
    /// same pass. Other operations are accepted and ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn do_io_operation(
        &self,
        device: ObjectId,
        stream: ObjectId,
        client: ClientId,
        operation: IoOperation,
        frame_count: usize,
        cycle: &IoCycleInfo,
        buffer: &mut [f32],
    ) -> EngineResult<()> {
        let slot = self.graph.device_slot(device)?;
        let direction = match self.graph.kind(stream)? {
            ObjectKind::Stream(owner, direction) if owner == slot => direction,
            _ => {
                return Err(EngineError::IllegalOperation(
                    "stream does not belong to device",
                ))
            }
        };
        match (operation, direction) {
            (IoOperation::ReadInput, Direction::Input) | (IoOperation::WriteMix, Direction::Output) => {}
            (IoOperation::ReadInput, _) | (IoOperation::WriteMix, _) => {
                return Err(EngineError::IllegalOperation(
                    "operation does not match stream direction",
                ))
            }
            (IoOperation::Other(_), _) => return Ok(()),
        }

        let gain = self.controls[slot.index()].stream(direction).gain();

        let mut io = self.locks.lock_io();
        if !io.session(slot).is_running() {
            return Err(EngineError::NotRunning(device));
        }
        let ring = io
            .ring
            .as_mut()
            .ok_or(EngineError::InvalidState("no ring buffer"))?;
        match direction {
            Direction::Input => {
                let time = cycle.input_sample_time.max(0.0) as u64;
                ring.read(buffer, time, frame_count, gain)?;
            }
            Direction::Output => {
                let time = cycle.output_sample_time.max(0.0) as u64;
                ring.write(buffer, time, frame_count, gain)?;
            }
        }
        io.session_mut(slot).note_cycle(client);
        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Run `f` with the state lock held. Objects of a device that does not
    /// currently exist are reported as unknown.
    fn with_context<R>(
        &self,
        object: ObjectId,
        f: impl FnOnce(&mut PropertyContext<'_, '_>) -> EngineResult<R>,
    ) -> EngineResult<R> {
        let mut state = self.locks.lock_state();
        self.require_reachable(&state, object)?;
        let mut ctx = PropertyContext::new(
            &self.config,
            &self.graph,
            &self.controls,
            self.clock.ticks_per_second(),
            &self.locks,
            &mut state,
        );
        f(&mut ctx)
    }

    fn require_reachable(&self, state: &ControlPlane, object: ObjectId) -> EngineResult<()> {
        match self.graph.kind(object)?.device_slot() {
            Some(slot) if !state.device(slot).is_created() => Err(EngineError::InvalidObject(object)),
            _ => Ok(()),
        }
    }

    /// Whether the object implements the property. Unknown objects, and
    /// objects of a destroyed device, have none.
    pub fn has_property(&self, object: ObjectId, address: &PropertyAddress) -> bool {
        self.with_context(object, |_| {
            dispatch(&self.graph, object, |obj| Ok(obj.has_property(address)))
        })
        .unwrap_or(false)
    }

    pub fn is_property_settable(
        &self,
        object: ObjectId,
        address: &PropertyAddress,
    ) -> EngineResult<bool> {
        self.with_context(object, |_| {
            dispatch(&self.graph, object, |obj| obj.is_settable(address))
        })
    }

    pub fn property_data_size(
        &self,
        object: ObjectId,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<usize> {
        self.with_context(object, |ctx| {
            dispatch(&self.graph, object, |obj| {
                obj.require(address)?;
                obj.data_size(ctx, address, qualifier)
            })
        })
    }

    /// The property's value. Fails with `BufferTooSmall` when the value does
    /// not fit in `buffer_size` bytes.
    pub fn property_data(
        &self,
        object: ObjectId,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
        buffer_size: usize,
    ) -> EngineResult<PropertyData> {
        let data = self.with_context(object, |ctx| {
            dispatch(&self.graph, object, |obj| {
                obj.require(address)?;
                obj.data(ctx, address, qualifier)
            })
        })?;
        let needed = data.byte_size();
        if needed > buffer_size {
            return Err(EngineError::BufferTooSmall {
                needed,
                available: buffer_size,
            });
        }
        Ok(data)
    }

    /// Change a property. Returns the properties whose values changed, for
    /// the host to be notified.
    pub fn set_property_data(
        &self,
        object: ObjectId,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
        bytes: &[u8],
    ) -> EngineResult<Vec<PropertyChange>> {
        self.with_context(object, |ctx| {
            dispatch(&self.graph, object, |obj| {
                obj.require(address)?;
                obj.set_data(ctx, address, qualifier, bytes)
            })
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// Lifecycle state of a device.
    pub fn device_state(&self, device: ObjectId) -> EngineResult<SessionState> {
        let slot = self.graph.device_slot(device)?;
        Ok(self.locks.lock_state().device(slot).state)
    }

    /// Number of outstanding `StartIO` calls on a device.
    pub fn running_count(&self, device: ObjectId) -> EngineResult<u32> {
        let slot = self.graph.device_slot(device)?;
        Ok(self.locks.lock_state().device(slot).running)
    }

    /// Whether the shared ring buffer is allocated.
    pub fn has_ring_buffer(&self) -> bool {
        self.locks.lock_io().ring.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::DeviceConfig;
    use crate::control::StreamGain;
    use crate::format::StreamFormat;
    use crate::property::QualifierKind;
    use crate::selectors::{control, device, object, plugin, stream};
    use crate::types::UNKNOWN_OBJECT;

    const PRIMARY: ObjectId = DeviceSlot::Primary.device_id();
    const MIRROR: ObjectId = DeviceSlot::Mirror.device_id();

    fn config() -> DriverConfig {
        DriverConfig::new("Test Loopback")
            .with_primary(DeviceConfig::new("Test Loopback", "Test_UID"))
            .with_mirror(DeviceConfig::new("Test Mirror", "Test_Mirror_UID").hidden())
            .with_ring_buffer_frames(64)
            .with_zero_timestamp_period(16)
    }

    fn engine() -> (Engine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(48_000.0));
        let engine = Engine::initialize(config(), clock.clone()).unwrap();
        (engine, clock)
    }

    fn set_f32(engine: &Engine, id: ObjectId, selector: u32, value: f32) -> EngineResult<usize> {
        engine
            .set_property_data(
                id,
                &PropertyAddress::global(selector),
                Qualifier::None,
                &value.to_ne_bytes(),
            )
            .map(|changes| changes.len())
    }

    fn get(engine: &Engine, id: ObjectId, selector: u32) -> PropertyData {
        engine
            .property_data(id, &PropertyAddress::global(selector), Qualifier::None, 4096)
            .unwrap()
    }

    fn sample_qualifier(selector: u32) -> Qualifier<'static> {
        match QualifierKind::for_selector(selector) {
            QualifierKind::None => Qualifier::None,
            QualifierKind::Uid => Qualifier::Uid("Test_UID"),
            QualifierKind::Item => Qualifier::Item(0),
            QualifierKind::InOutValue => Qualifier::Value(0.5),
            QualifierKind::Classes => Qualifier::Classes(&[]),
        }
    }

    #[test]
    fn test_initialize_creates_configured_devices() {
        let (engine, _) = engine();
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Initialized);
        assert_eq!(engine.device_state(MIRROR).unwrap(), SessionState::Initialized);
        assert!(engine.has_ring_buffer());
        assert_eq!(
            get(&engine, crate::graph::PLUG_IN_ID, plugin::DEVICE_LIST),
            PropertyData::ObjectList(vec![PRIMARY, MIRROR])
        );
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let clock = Arc::new(ManualClock::new(48_000.0));
        let result = Engine::initialize(config().with_channel_count(0), clock);
        assert!(result.is_err());
    }

    #[test]
    fn test_size_matches_data_for_every_property() {
        let (engine, _) = engine();
        for id in 0..64 {
            if !engine.graph().contains(id) {
                assert!(!engine.has_property(id, &PropertyAddress::global(object::CLASS)));
                continue;
            }
            let properties = dispatch(engine.graph(), id, |obj| Ok(obj.properties())).unwrap();
            for &selector in properties {
                let address = PropertyAddress::global(selector);
                let qualifier = sample_qualifier(selector);
                assert!(engine.has_property(id, &address));
                let size = engine.property_data_size(id, &address, qualifier).unwrap();
                let data = engine
                    .property_data(id, &address, qualifier, usize::MAX)
                    .unwrap();
                assert_eq!(size, data.byte_size(), "object {} {}", id, address);
            }
        }
    }

    #[test]
    fn test_unknown_object_and_selector() {
        let (engine, _) = engine();
        let address = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        assert_eq!(
            engine.property_data(999, &address, Qualifier::None, 8),
            Err(EngineError::InvalidObject(999))
        );
        assert!(matches!(
            engine.property_data(
                PRIMARY,
                &PropertyAddress::global(plugin::BOX_LIST),
                Qualifier::None,
                8
            ),
            Err(EngineError::UnsupportedSelector { .. })
        ));
        assert!(matches!(
            engine.set_property_data(PRIMARY, &PropertyAddress::global(device::LATENCY), Qualifier::None, &[0; 4]),
            Err(EngineError::NotSettable { .. })
        ));
    }

    #[test]
    fn test_buffer_too_small() {
        let (engine, _) = engine();
        let address = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        assert_eq!(
            engine.property_data(PRIMARY, &address, Qualifier::None, 4),
            Err(EngineError::BufferTooSmall {
                needed: 8,
                available: 4
            })
        );
    }

    #[test]
    fn test_volume_scalar_and_decibels() {
        let (engine, _) = engine();
        let volume = DeviceSlot::Primary.volume_id(Direction::Output);

        assert_eq!(set_f32(&engine, volume, control::SCALAR_VALUE, 0.5), Ok(2));
        assert_eq!(get(&engine, volume, control::DECIBEL_VALUE), PropertyData::F32(-32.0));

        assert_eq!(set_f32(&engine, volume, control::DECIBEL_VALUE, -16.0), Ok(2));
        assert_eq!(get(&engine, volume, control::SCALAR_VALUE), PropertyData::F32(0.75));

        // Unchanged value reports nothing.
        assert_eq!(set_f32(&engine, volume, control::DECIBEL_VALUE, -16.0), Ok(0));

        assert!(set_f32(&engine, volume, control::SCALAR_VALUE, 1.5).is_err());
        assert!(set_f32(&engine, volume, control::DECIBEL_VALUE, 3.0).is_err());
        assert_eq!(get(&engine, volume, control::SCALAR_VALUE), PropertyData::F32(0.75));
    }

    #[test]
    fn test_write_then_read_is_sample_exact() {
        let (engine, _) = engine();
        engine.start_io(PRIMARY, 1).unwrap();

        let frames = 8;
        let mut written: Vec<f32> = (0..frames * 2).map(|i| i as f32 * 0.01).collect();
        let cycle = IoCycleInfo::at(60.0);
        engine
            .do_io_operation(
                PRIMARY,
                DeviceSlot::Primary.stream_id(Direction::Output),
                1,
                IoOperation::WriteMix,
                frames,
                &cycle,
                &mut written,
            )
            .unwrap();

        let mut read = vec![0.0f32; frames * 2];
        engine
            .do_io_operation(
                PRIMARY,
                DeviceSlot::Primary.stream_id(Direction::Input),
                1,
                IoOperation::ReadInput,
                frames,
                &cycle,
                &mut read,
            )
            .unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn test_mirror_reads_primary_output() {
        let (engine, _) = engine();
        engine.start_io(PRIMARY, 1).unwrap();
        engine.start_io(MIRROR, 2).unwrap();

        let mut written = vec![0.25f32; 8];
        let cycle = IoCycleInfo::at(10.0);
        engine
            .do_io_operation(
                PRIMARY,
                DeviceSlot::Primary.stream_id(Direction::Output),
                1,
                IoOperation::WriteMix,
                4,
                &cycle,
                &mut written,
            )
            .unwrap();

        let mut read = vec![0.0f32; 8];
        engine
            .do_io_operation(
                MIRROR,
                DeviceSlot::Mirror.stream_id(Direction::Input),
                2,
                IoOperation::ReadInput,
                4,
                &cycle,
                &mut read,
            )
            .unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn test_muted_output_stores_silence() {
        let (engine, _) = engine();
        let mute = DeviceSlot::Primary.mute_id(Direction::Output);
        engine
            .set_property_data(
                mute,
                &PropertyAddress::global(control::BOOLEAN_VALUE),
                Qualifier::None,
                &1u32.to_ne_bytes(),
            )
            .unwrap();
        engine.start_io(PRIMARY, 1).unwrap();

        let cycle = IoCycleInfo::at(0.0);
        let mut written = vec![0.9f32; 4];
        engine
            .do_io_operation(
                PRIMARY,
                DeviceSlot::Primary.stream_id(Direction::Output),
                1,
                IoOperation::WriteMix,
                2,
                &cycle,
                &mut written,
            )
            .unwrap();
        let mut read = vec![1.0f32; 4];
        engine
            .do_io_operation(
                PRIMARY,
                DeviceSlot::Primary.stream_id(Direction::Input),
                1,
                IoOperation::ReadInput,
                2,
                &cycle,
                &mut read,
            )
            .unwrap();
        assert_eq!(read, vec![0.0; 4]);
    }

    #[test]
    fn test_do_io_checks_stream_and_state() {
        let (engine, _) = engine();
        let mut buffer = vec![0.0f32; 4];
        let cycle = IoCycleInfo::at(0.0);
        let input = DeviceSlot::Primary.stream_id(Direction::Input);

        assert_eq!(
            engine.do_io_operation(PRIMARY, input, 1, IoOperation::ReadInput, 2, &cycle, &mut buffer),
            Err(EngineError::NotRunning(PRIMARY))
        );

        engine.start_io(PRIMARY, 1).unwrap();
        assert!(matches!(
            engine.do_io_operation(PRIMARY, input, 1, IoOperation::WriteMix, 2, &cycle, &mut buffer),
            Err(EngineError::IllegalOperation(_))
        ));
        assert!(matches!(
            engine.do_io_operation(
                MIRROR,
                input,
                1,
                IoOperation::ReadInput,
                2,
                &cycle,
                &mut buffer
            ),
            Err(EngineError::IllegalOperation(_))
        ));
        assert!(engine
            .do_io_operation(PRIMARY, input, 1, IoOperation::ReadInput, 2, &cycle, &mut buffer)
            .is_ok());
    }

    #[test]
    fn test_buffer_cleared_when_io_restarts() {
        let (engine, _) = engine();
        let output = DeviceSlot::Primary.stream_id(Direction::Output);
        let input = DeviceSlot::Primary.stream_id(Direction::Input);
        let cycle = IoCycleInfo::at(0.0);

        engine.start_io(PRIMARY, 1).unwrap();
        let mut written = vec![0.5f32; 4];
        engine
            .do_io_operation(PRIMARY, output, 1, IoOperation::WriteMix, 2, &cycle, &mut written)
            .unwrap();
        engine.stop_io(PRIMARY, 1).unwrap();

        engine.start_io(PRIMARY, 1).unwrap();
        let mut read = vec![1.0f32; 4];
        engine
            .do_io_operation(PRIMARY, input, 1, IoOperation::ReadInput, 2, &cycle, &mut read)
            .unwrap();
        assert_eq!(read, vec![0.0; 4]);
    }

    #[test]
    fn test_will_do_io_operation() {
        let clock = Arc::new(ManualClock::new(48_000.0));
        let config = config().with_primary(DeviceConfig::new("Out", "Out_UID").without_input());
        let engine = Engine::initialize(config, clock).unwrap();

        let read = engine.will_do_io_operation(PRIMARY, IoOperation::ReadInput).unwrap();
        let write = engine.will_do_io_operation(PRIMARY, IoOperation::WriteMix).unwrap();
        assert!(!read.will_do);
        assert!(write.will_do && write.in_place);
        assert!(engine.will_do_io_operation(MIRROR, IoOperation::ReadInput).unwrap().will_do);
    }

    #[test]
    fn test_sample_rate_change_only_while_idle() {
        let (engine, _) = engine();
        let address = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        let rate = |value: f64| value.to_ne_bytes();

        assert!(matches!(
            engine.set_property_data(PRIMARY, &address, Qualifier::None, &rate(12_345.0)),
            Err(EngineError::InvalidValue(_))
        ));

        engine.start_io(MIRROR, 1).unwrap();
        assert!(matches!(
            engine.set_property_data(PRIMARY, &address, Qualifier::None, &rate(44_100.0)),
            Err(EngineError::InvalidState(_))
        ));
        engine.stop_io(MIRROR, 1).unwrap();

        let changes = engine
            .set_property_data(PRIMARY, &address, Qualifier::None, &rate(44_100.0))
            .unwrap();
        assert!(changes.contains(&PropertyChange::new(MIRROR, address)));
        assert_eq!(get(&engine, MIRROR, device::NOMINAL_SAMPLE_RATE), PropertyData::F64(44_100.0));

        let format = get(&engine, DeviceSlot::Primary.stream_id(Direction::Input), stream::VIRTUAL_FORMAT);
        match format {
            PropertyData::StreamFormat(format) => assert_eq!(format.sample_rate, 44_100.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_start_stop_balances() {
        let (engine, _) = engine();
        std::thread::scope(|scope| {
            for client in 0..8u32 {
                let engine = &engine;
                scope.spawn(move || {
                    for _ in 0..100 {
                        engine.start_io(PRIMARY, client).unwrap();
                        engine.stop_io(PRIMARY, client).unwrap();
                    }
                    engine.start_io(PRIMARY, client).unwrap();
                });
            }
        });
        assert_eq!(engine.running_count(PRIMARY).unwrap(), 8);
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Running);

        for client in 0..8u32 {
            engine.stop_io(PRIMARY, client).unwrap();
        }
        assert_eq!(engine.running_count(PRIMARY).unwrap(), 0);
        assert_eq!(get(&engine, PRIMARY, device::IS_RUNNING), PropertyData::U32(0));
    }

    #[test]
    fn test_stop_without_start_is_ignored() {
        let (engine, _) = engine();
        assert_eq!(engine.stop_io(PRIMARY, 1), Ok(IoTransition::Ignored));
        assert_eq!(engine.running_count(PRIMARY).unwrap(), 0);
    }

    #[test]
    fn test_zero_timestamp_advances_one_period() {
        let (engine, clock) = engine();
        assert_eq!(
            engine.get_zero_timestamp(PRIMARY),
            Err(EngineError::NotRunning(PRIMARY))
        );

        engine.start_io(PRIMARY, 1).unwrap();
        let first = engine.get_zero_timestamp(PRIMARY).unwrap();
        assert_eq!(first.sample_time, 0.0);
        assert_eq!(first.host_time, 0);

        // 48 kHz ticks at 48 kHz: one tick per frame.
        clock.set(20);
        let second = engine.get_zero_timestamp(PRIMARY).unwrap();
        assert_eq!(second.sample_time, 16.0);
        assert_eq!(second.host_time, 16);
        assert_eq!(second.seed, first.seed);
    }

    #[test]
    fn test_pitch_change_reseeds_running_timeline() {
        let (engine, _) = engine();
        engine.start_io(PRIMARY, 1).unwrap();
        let before = engine.get_zero_timestamp(PRIMARY).unwrap();

        let pitch = DeviceSlot::Primary.pitch_id();
        assert_eq!(set_f32(&engine, pitch, control::PAN_VALUE, 1.0), Ok(1));
        let after = engine.get_zero_timestamp(PRIMARY).unwrap();
        assert_ne!(after.seed, before.seed);
    }

    #[test]
    fn test_destroy_and_recreate_device() {
        let (engine, _) = engine();
        engine.start_io(MIRROR, 1).unwrap();
        assert!(matches!(
            engine.destroy_device(MIRROR),
            Err(EngineError::InvalidState(_))
        ));
        engine.stop_io(MIRROR, 1).unwrap();

        engine.destroy_device(MIRROR).unwrap();
        assert_eq!(
            get(&engine, crate::graph::PLUG_IN_ID, plugin::DEVICE_LIST),
            PropertyData::ObjectList(vec![PRIMARY])
        );
        assert!(engine.has_ring_buffer());

        engine.destroy_device(PRIMARY).unwrap();
        assert!(!engine.has_ring_buffer());

        engine.create_device(PRIMARY).unwrap();
        assert!(engine.has_ring_buffer());
        assert!(engine.create_device(PRIMARY).is_err());
    }

    #[test]
    fn test_translate_uid() {
        let (engine, _) = engine();
        let address = PropertyAddress::global(plugin::TRANSLATE_UID_TO_DEVICE);
        let lookup = |uid: &str| {
            engine
                .property_data(crate::graph::PLUG_IN_ID, &address, Qualifier::Uid(uid), 4)
                .unwrap()
        };
        assert_eq!(lookup("Test_Mirror_UID"), PropertyData::U32(MIRROR));
        assert_eq!(lookup("nope"), PropertyData::U32(UNKNOWN_OBJECT));
    }

    #[test]
    fn test_teardown_stops_everything() {
        let (engine, _) = engine();
        engine.start_io(PRIMARY, 1).unwrap();
        engine.teardown();
        assert_eq!(engine.running_count(PRIMARY).unwrap(), 0);
        assert!(!engine.has_ring_buffer());
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Destroyed);
    }

    fn format_bytes(format: StreamFormat) -> Vec<u8> {
        let data = PropertyData::StreamFormat(format);
        let mut bytes = vec![0u8; data.byte_size()];
        data.write_bytes(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_running_check_comes_before_value_check() {
        let (engine, _) = engine();
        let rate = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        let virtual_format = PropertyAddress::global(stream::VIRTUAL_FORMAT);
        let input = DeviceSlot::Primary.stream_id(Direction::Input);

        engine.start_io(PRIMARY, 1).unwrap();
        // Wrong channel count and an unsupported rate both lose to the
        // running check.
        assert!(matches!(
            engine.set_property_data(
                input,
                &virtual_format,
                Qualifier::None,
                &format_bytes(StreamFormat::float32(48_000.0, 1))
            ),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            engine.set_property_data(PRIMARY, &rate, Qualifier::None, &12_345.0f64.to_ne_bytes()),
            Err(EngineError::InvalidState(_))
        ));
        engine.stop_io(PRIMARY, 1).unwrap();

        assert!(matches!(
            engine.set_property_data(
                input,
                &virtual_format,
                Qualifier::None,
                &format_bytes(StreamFormat::float32(12_345.0, 2))
            ),
            Err(EngineError::InvalidValue(_))
        ));
        assert_eq!(get(&engine, PRIMARY, device::NOMINAL_SAMPLE_RATE), PropertyData::F64(48_000.0));

        let changes = engine
            .set_property_data(
                input,
                &virtual_format,
                Qualifier::None,
                &format_bytes(StreamFormat::float32(44_100.0, 2)),
            )
            .unwrap();
        assert!(changes.contains(&PropertyChange::new(PRIMARY, rate)));
    }

    #[test]
    fn test_sample_rate_change_clears_buffer() {
        let (engine, _) = engine();
        engine
            .locks
            .lock_io()
            .ring
            .as_mut()
            .unwrap()
            .write(&[0.5; 8], 0, 4, StreamGain::UNITY)
            .unwrap();

        let address = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        engine
            .set_property_data(PRIMARY, &address, Qualifier::None, &44_100.0f64.to_ne_bytes())
            .unwrap();

        let io = engine.locks.lock_io();
        let ring = io.ring.as_ref().unwrap();
        assert_eq!(ring.capacity_frames(), 64);
        let mut read = [1.0f32; 8];
        ring.read(&mut read, 0, 4, StreamGain::UNITY).unwrap();
        assert_eq!(read, [0.0; 8]);
    }

    #[test]
    fn test_input_mute_silences_reads_until_unmuted() {
        let (engine, _) = engine();
        let mute = DeviceSlot::Primary.mute_id(Direction::Input);
        let set_mute = |value: u32| {
            engine
                .set_property_data(
                    mute,
                    &PropertyAddress::global(control::BOOLEAN_VALUE),
                    Qualifier::None,
                    &value.to_ne_bytes(),
                )
                .unwrap()
        };
        engine.start_io(PRIMARY, 1).unwrap();

        let cycle = IoCycleInfo::at(8.0);
        let mut written = vec![0.5f32; 8];
        engine
            .do_io_operation(
                PRIMARY,
                DeviceSlot::Primary.stream_id(Direction::Output),
                1,
                IoOperation::WriteMix,
                4,
                &cycle,
                &mut written,
            )
            .unwrap();

        let read_input = || {
            let mut read = vec![1.0f32; 8];
            engine
                .do_io_operation(
                    PRIMARY,
                    DeviceSlot::Primary.stream_id(Direction::Input),
                    1,
                    IoOperation::ReadInput,
                    4,
                    &cycle,
                    &mut read,
                )
                .unwrap();
            read
        };

        assert_eq!(set_mute(1).len(), 1);
        assert_eq!(read_input(), vec![0.0; 8]);

        // Muting the input leaves the stored samples alone.
        assert_eq!(set_mute(0).len(), 1);
        assert_eq!(read_input(), vec![0.5; 8]);
    }

    #[test]
    fn test_failed_create_rolls_back() {
        let (engine, _) = engine();
        engine.destroy_device(MIRROR).unwrap();
        engine.destroy_device(PRIMARY).unwrap();
        assert!(!engine.has_ring_buffer());

        let result =
            engine.create_device_with(PRIMARY, || Err(EngineError::AllocationFailed("test")));
        assert!(result.is_err());
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Destroyed);
        assert!(!engine.has_ring_buffer());
        assert_eq!(
            get(&engine, crate::graph::PLUG_IN_ID, plugin::DEVICE_LIST),
            PropertyData::ObjectList(vec![])
        );

        engine.create_device(PRIMARY).unwrap();
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Initialized);
        assert!(engine.has_ring_buffer());
    }

    #[test]
    fn test_stop_while_io_in_flight() {
        let (engine, _) = engine();
        let output = DeviceSlot::Primary.stream_id(Direction::Output);
        let input = DeviceSlot::Primary.stream_id(Direction::Input);
        let barrier = std::sync::Barrier::new(2);
        engine.start_io(PRIMARY, 1).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                for cycle in 0..500u32 {
                    let info = IoCycleInfo::at(f64::from(cycle * 4));
                    let mut buffer = vec![0.25f32; 8];
                    for (operation, stream) in
                        [(IoOperation::WriteMix, output), (IoOperation::ReadInput, input)]
                    {
                        let result = engine
                            .do_io_operation(PRIMARY, stream, 1, operation, 4, &info, &mut buffer);
                        assert!(
                            matches!(result, Ok(()) | Err(EngineError::NotRunning(PRIMARY))),
                            "unexpected {:?}",
                            result
                        );
                    }
                }
            });
            scope.spawn(|| {
                barrier.wait();
                for _ in 0..500 {
                    engine.stop_io(PRIMARY, 1).unwrap();
                    engine.start_io(PRIMARY, 1).unwrap();
                }
            });
        });

        assert_eq!(engine.running_count(PRIMARY).unwrap(), 1);
        assert_eq!(engine.stop_io(PRIMARY, 1), Ok(IoTransition::Stopped));
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Initialized);
        assert!(engine.has_ring_buffer());
    }

    #[test]
    fn test_destroyed_device_objects_are_unknown() {
        let (engine, _) = engine();
        let alive = PropertyAddress::global(device::IS_ALIVE);
        assert_eq!(get(&engine, MIRROR, device::IS_ALIVE), PropertyData::U32(1));

        engine.destroy_device(MIRROR).unwrap();
        assert!(!engine.has_property(MIRROR, &alive));
        assert_eq!(
            engine.property_data(MIRROR, &alive, Qualifier::None, 4),
            Err(EngineError::InvalidObject(MIRROR))
        );
        let mirror_input = DeviceSlot::Mirror.stream_id(Direction::Input);
        assert_eq!(
            engine.property_data(
                mirror_input,
                &PropertyAddress::global(stream::VIRTUAL_FORMAT),
                Qualifier::None,
                4096
            ),
            Err(EngineError::InvalidObject(mirror_input))
        );
        assert!(engine.has_property(PRIMARY, &alive));

        engine.create_device(MIRROR).unwrap();
        assert!(engine.has_property(MIRROR, &alive));
    }

    #[test]
    fn test_restart_after_teardown() {
        let (engine, _) = engine();
        let address = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        engine
            .set_property_data(PRIMARY, &address, Qualifier::None, &44_100.0f64.to_ne_bytes())
            .unwrap();
        assert!(engine.is_live());

        engine.teardown();
        assert!(!engine.is_live());

        engine.restart().unwrap();
        assert!(engine.is_live());
        assert!(engine.has_ring_buffer());
        assert_eq!(engine.device_state(PRIMARY).unwrap(), SessionState::Initialized);
        assert_eq!(engine.device_state(MIRROR).unwrap(), SessionState::Initialized);
        assert_eq!(get(&engine, PRIMARY, device::NOMINAL_SAMPLE_RATE), PropertyData::F64(48_000.0));

        assert!(matches!(engine.restart(), Err(EngineError::InvalidState(_))));
    }
}
