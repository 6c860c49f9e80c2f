//! Property dispatch.
//!
//! Each object kind implements [`ObjectProperties`] for the selectors that
//! mean something to it. The engine resolves an object ID through the graph
//! and hands the query to the matching implementation together with a
//! [`PropertyContext`], which carries the configuration, the control values
//! and the control plane (the state lock is held for the whole call).

mod box_object;
mod control;
pub mod data;
mod device;
mod plugin;
mod stream;

use parking_lot::MutexGuard;

use crate::clock::ticks_per_frame;
use crate::config::DriverConfig;
use crate::control::DeviceControls;
use crate::error::{EngineError, EngineResult};
use crate::graph::{AudioObject, DeviceSlot, ObjectGraph, ObjectKind};
use crate::selectors::{class, device as device_sel, object, stream as stream_sel};
use crate::state::{ControlPlane, IoPlane};
use crate::sync::IoLocks;
use crate::types::{ObjectId, PropertyAddress};

pub use data::{PropertyChange, PropertyData, Qualifier, QualifierKind};
pub(crate) use device::device_config;

use box_object::BoxObject;
use control::{BooleanControl, LevelControl, PanControl, SelectorControl};
use device::DeviceObject;
use plugin::PlugInObject;
use stream::StreamObject;

// =============================================================================
// Context
// =============================================================================

/// Everything a property implementation may read or change.
pub struct PropertyContext<'a, 'g> {
    pub config: &'a DriverConfig,
    pub graph: &'a ObjectGraph,
    pub controls: &'a [DeviceControls; 2],
    /// Tick rate of the host clock, for retiming running devices.
    pub ticks_per_second: f64,
    locks: &'g IoLocks<ControlPlane, IoPlane>,
    state: &'a mut MutexGuard<'g, ControlPlane>,
}

impl<'a, 'g> PropertyContext<'a, 'g> {
    pub(crate) fn new(
        config: &'a DriverConfig,
        graph: &'a ObjectGraph,
        controls: &'a [DeviceControls; 2],
        ticks_per_second: f64,
        locks: &'g IoLocks<ControlPlane, IoPlane>,
        state: &'a mut MutexGuard<'g, ControlPlane>,
    ) -> Self {
        Self {
            config,
            graph,
            controls,
            ticks_per_second,
            locks,
            state,
        }
    }

    /// The control plane (state lock held).
    pub fn plane(&self) -> &ControlPlane {
        &**self.state
    }

    pub fn plane_mut(&mut self) -> &mut ControlPlane {
        &mut **self.state
    }

    pub fn device_controls(&self, slot: DeviceSlot) -> &DeviceControls {
        &self.controls[slot.index()]
    }

    /// Change the shared nominal sample rate.
    ///
    /// Only allowed while no device is running I/O. The ring buffer is
    /// cleared so the new rate never reads samples recorded at the old one.
    pub fn set_sample_rate(&mut self, rate: f64) -> EngineResult<Vec<PropertyChange>> {
        self.require_idle()?;
        if !self.config.supports_sample_rate(rate) {
            return Err(EngineError::InvalidValue("unsupported sample rate"));
        }
        if self.state.sample_rate == rate {
            return Ok(Vec::new());
        }

        {
            let mut io = self.locks.lock_io_under(&*self.state);
            if let Some(ring) = io.ring.as_mut() {
                ring.clear();
            }
        }
        self.state.sample_rate = rate;
        log::debug!("nominal sample rate set to {}", rate);

        let mut changes = Vec::new();
        for &device in self.graph.devices() {
            changes.push(PropertyChange::new(
                device,
                PropertyAddress::global(device_sel::NOMINAL_SAMPLE_RATE),
            ));
            for stream in self.graph.device_streams(device, None)? {
                for selector in [stream_sel::VIRTUAL_FORMAT, stream_sel::PHYSICAL_FORMAT] {
                    changes.push(PropertyChange::new(stream, PropertyAddress::global(selector)));
                }
            }
        }
        Ok(changes)
    }

    /// Fail with `InvalidState` while any device is running I/O. Format and
    /// rate changes check this before looking at the new value.
    pub fn require_idle(&self) -> EngineResult<()> {
        if self.state.aggregate_running() > 0 {
            return Err(EngineError::InvalidState(
                "format cannot change while I/O is running",
            ));
        }
        Ok(())
    }

    /// Recompute the frame duration of a running device after a pitch change.
    pub fn retime(&mut self, slot: DeviceSlot) {
        let tpf = ticks_per_frame(
            self.ticks_per_second,
            self.state.sample_rate,
            self.device_controls(slot).pitch(),
        );
        let mut io = self.locks.lock_io_under(&*self.state);
        let session = io.session_mut(slot);
        if session.is_running() {
            session.timeline_mut().set_ticks_per_frame(tpf);
        }
    }
}

// =============================================================================
// Per-kind capability
// =============================================================================

/// Property capability of one object kind.
pub trait ObjectProperties {
    /// The object this implementation answers for.
    fn object(&self) -> &AudioObject;

    /// Every selector the object implements.
    fn properties(&self) -> &'static [u32];

    fn has_property(&self, address: &PropertyAddress) -> bool {
        self.properties().contains(&address.selector)
    }

    /// Whether the property can be set. Fails for unknown selectors.
    fn is_settable(&self, address: &PropertyAddress) -> EngineResult<bool> {
        self.require(address)?;
        Ok(self.settable().contains(&address.selector))
    }

    /// The settable subset of [`properties`](Self::properties).
    fn settable(&self) -> &'static [u32] {
        &[]
    }

    /// Size in bytes of the property's value.
    fn data_size(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<usize> {
        Ok(self.data(ctx, address, qualifier)?.byte_size())
    }

    /// The property's value.
    fn data(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<PropertyData>;

    /// Change the property and report every property whose value changed.
    fn set_data(
        &self,
        _ctx: &mut PropertyContext<'_, '_>,
        address: &PropertyAddress,
        _qualifier: Qualifier<'_>,
        _bytes: &[u8],
    ) -> EngineResult<Vec<PropertyChange>> {
        self.require(address)?;
        Err(self.not_settable(address))
    }

    /// Fail with `UnsupportedSelector` unless the selector is implemented.
    fn require(&self, address: &PropertyAddress) -> EngineResult<()> {
        if self.has_property(address) {
            Ok(())
        } else {
            Err(self.unsupported(address))
        }
    }

    fn unsupported(&self, address: &PropertyAddress) -> EngineError {
        EngineError::UnsupportedSelector {
            object: self.object().id,
            selector: address.selector,
        }
    }

    fn not_settable(&self, address: &PropertyAddress) -> EngineError {
        EngineError::NotSettable {
            object: self.object().id,
            selector: address.selector,
        }
    }
}

/// Resolve `id` and run `f` against the matching kind implementation.
pub(crate) fn dispatch<R>(
    graph: &ObjectGraph,
    id: ObjectId,
    f: impl FnOnce(&dyn ObjectProperties) -> EngineResult<R>,
) -> EngineResult<R> {
    let object = graph.get(id)?;
    match object.kind {
        ObjectKind::PlugIn => f(&PlugInObject { object }),
        ObjectKind::Box => f(&BoxObject { object }),
        ObjectKind::Device(slot) => f(&DeviceObject { object, slot }),
        ObjectKind::Stream(slot, direction) => f(&StreamObject {
            object,
            slot,
            direction,
        }),
        ObjectKind::Volume(slot, direction) => f(&LevelControl {
            object,
            slot,
            direction,
        }),
        ObjectKind::Mute(slot, direction) => f(&BooleanControl {
            object,
            slot,
            direction,
        }),
        ObjectKind::Pitch(slot) => f(&PanControl { object, slot }),
        ObjectKind::ClockSource(slot) => f(&SelectorControl { object, slot }),
    }
}

// =============================================================================
// Shared selectors
// =============================================================================

/// (base class, class) of an object kind.
pub fn class_of(kind: ObjectKind) -> (u32, u32) {
    match kind {
        ObjectKind::PlugIn => (class::OBJECT, class::PLUG_IN),
        ObjectKind::Box => (class::OBJECT, class::BOX),
        ObjectKind::Device(_) => (class::OBJECT, class::DEVICE),
        ObjectKind::Stream(..) => (class::OBJECT, class::STREAM),
        ObjectKind::Volume(..) => (class::LEVEL_CONTROL, class::VOLUME_CONTROL),
        ObjectKind::Mute(..) => (class::BOOLEAN_CONTROL, class::MUTE_CONTROL),
        ObjectKind::Pitch(_) => (class::CONTROL, class::STEREO_PAN_CONTROL),
        ObjectKind::ClockSource(_) => (class::SELECTOR_CONTROL, class::CLOCK_SOURCE_CONTROL),
    }
}

/// Answer a selector every object shares, or `None` if `selector` is not one.
fn common_data(
    graph: &ObjectGraph,
    object: &AudioObject,
    selector: u32,
    qualifier: Qualifier<'_>,
) -> Option<PropertyData> {
    let (base, class) = class_of(object.kind);
    match selector {
        object::BASE_CLASS => Some(PropertyData::U32(base)),
        object::CLASS => Some(PropertyData::U32(class)),
        object::OWNER => Some(PropertyData::U32(object.owner)),
        object::OWNED_OBJECTS => {
            let filter = match qualifier {
                Qualifier::Classes(classes) if !classes.is_empty() => Some(classes),
                _ => None,
            };
            let owned = object
                .children
                .iter()
                .copied()
                .filter(|&child| match (filter, graph.kind(child)) {
                    (None, Ok(_)) => true,
                    (Some(classes), Ok(kind)) => {
                        let (base, class) = class_of(kind);
                        classes.contains(&base) || classes.contains(&class)
                    }
                    (_, Err(_)) => false,
                })
                .collect();
            Some(PropertyData::ObjectList(owned))
        }
        _ => None,
    }
}
