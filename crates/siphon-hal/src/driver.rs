//! The driver object handed to the host.
//!
//! The host sees an `AudioServerPlugInDriverRef`: a pointer to a pointer to
//! the function table. [`SiphonDriver`] is `#[repr(C)]` with the table
//! reference as its first field, so a pointer to it is a valid driver
//! reference and every entry point can get back to it.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use coreaudio_sys::{
    AudioObjectPropertyAddress, AudioServerPlugInDriverRef, AudioServerPlugInHostInterface,
    AudioServerPlugInHostRef, CFUUIDRef,
};
use siphon_core::{
    selectors, DriverConfig, Engine, EngineError, EngineResult, ObjectId, PropertyAddress,
    PropertyChange, BOX_ID, PLUG_IN_ID,
};

use crate::cf;
use crate::clock::MachClock;
use crate::factory;
use crate::interface::{DriverInterface, DRIVER_INTERFACE};
use crate::logging;

/// The driver singleton, created by the factory function.
static DRIVER: OnceLock<SiphonDriver> = OnceLock::new();

#[repr(C)]
pub struct SiphonDriver {
    /// Read by the host through the driver reference.
    #[allow(dead_code)]
    interface: &'static DriverInterface,
    ref_count: AtomicU32,
    config: &'static DriverConfig,
    host: AtomicPtr<AudioServerPlugInHostInterface>,
    engine: OnceLock<Engine>,
}

// SAFETY: the host pointer is only read after `Initialize` stores it, and
// the host interface it points at is immutable and outlives the driver.
unsafe impl Send for SiphonDriver {}
unsafe impl Sync for SiphonDriver {}

/// Factory function body: return the driver reference when the host asks for
/// an AudioServerPlugIn, null otherwise.
///
/// # Safety
///
/// `requested_type` must be null or a valid CFUUID.
pub unsafe fn create(requested_type: CFUUIDRef) -> *mut c_void {
    let Some(config) = factory::driver_config() else {
        return ptr::null_mut();
    };
    logging::init(config.bundle_id);

    if !cf::uuid_is(requested_type, cf::PLUG_IN_TYPE) {
        log::debug!("factory asked for a type other than AudioServerPlugIn");
        return ptr::null_mut();
    }
    let driver = DRIVER.get_or_init(|| SiphonDriver::new(config));
    // The reference handed back here belongs to the caller.
    driver.add_ref();
    log::debug!("driver {} created", config.name);
    driver.as_raw()
}

/// Resolve a driver reference passed in by the host.
pub(crate) fn resolve(driver: *const c_void) -> EngineResult<&'static SiphonDriver> {
    DRIVER
        .get()
        .filter(|d| ptr::eq(d.as_raw().cast_const(), driver))
        .ok_or(EngineError::InvalidObject(PLUG_IN_ID))
}

pub(crate) fn resolve_ref(driver: AudioServerPlugInDriverRef) -> EngineResult<&'static SiphonDriver> {
    resolve(driver.cast_const().cast())
}

impl SiphonDriver {
    fn new(config: &'static DriverConfig) -> Self {
        Self {
            interface: &DRIVER_INTERFACE,
            ref_count: AtomicU32::new(0),
            config,
            host: AtomicPtr::new(ptr::null_mut()),
            engine: OnceLock::new(),
        }
    }

    /// This driver as the host sees it.
    pub(crate) fn as_raw(&self) -> *mut c_void {
        ptr::from_ref(self).cast_mut().cast()
    }

    // =========================================================================
    // Reference counting
    // =========================================================================

    pub(crate) fn add_ref(&self) -> u32 {
        let previous = self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .unwrap_or(u32::MAX);
        previous.saturating_add(1)
    }

    /// Drop one reference. The last one tears the engine down.
    pub(crate) fn release(&self) -> u32 {
        match self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                if let Some(engine) = self.engine.get() {
                    engine.teardown();
                }
                log::debug!("last driver reference released");
                0
            }
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }

    // =========================================================================
    // Engine
    // =========================================================================

    /// Store the host and build the engine.
    ///
    /// After the last release tore the engine down, a new `Initialize`
    /// recreates its devices.
    pub(crate) fn initialize(&self, host: AudioServerPlugInHostRef) -> EngineResult<()> {
        self.host.store(host.cast_mut(), Ordering::Release);
        if let Some(engine) = self.engine.get() {
            if engine.is_live() {
                log::warn!("Initialize called twice; keeping the running engine");
                return Ok(());
            }
            log::debug!("rebuilding the engine after teardown");
            return engine.restart();
        }
        let engine = Engine::initialize(*self.config, Arc::new(MachClock::new()))?;
        // Initialize is never called concurrently.
        let _ = self.engine.set(engine);
        Ok(())
    }

    pub(crate) fn engine(&self) -> EngineResult<&Engine> {
        self.engine
            .get()
            .ok_or(EngineError::InvalidState("driver not initialized"))
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Tell the host that properties changed, one call per object.
    ///
    /// Must be called with no engine lock held: the host may call straight
    /// back into the driver.
    pub(crate) fn notify(&self, changes: &[PropertyChange]) {
        let host = self.host.load(Ordering::Acquire);
        if host.is_null() || changes.is_empty() {
            return;
        }
        // SAFETY: stored by Initialize; the host outlives the driver.
        let Some(properties_changed) = (unsafe { (*host).PropertiesChanged }) else {
            return;
        };

        let mut objects: Vec<ObjectId> = Vec::new();
        for change in changes {
            if !objects.contains(&change.object) {
                objects.push(change.object);
            }
        }
        for object in objects {
            let addresses: Vec<AudioObjectPropertyAddress> = changes
                .iter()
                .filter(|c| c.object == object)
                .map(|c| raw_address(&c.address))
                .collect();
            // SAFETY: `addresses` outlives the call.
            let status = unsafe {
                properties_changed(host, object, addresses.len() as u32, addresses.as_ptr())
            };
            if status != 0 {
                log::warn!("PropertiesChanged for object {} returned {}", object, status);
            }
        }
    }

    /// Device list changes after a device appears or disappears.
    pub(crate) fn notify_device_list(&self) {
        self.notify(&[
            PropertyChange::new(
                PLUG_IN_ID,
                PropertyAddress::global(selectors::plugin::DEVICE_LIST),
            ),
            PropertyChange::new(BOX_ID, PropertyAddress::global(selectors::boxes::DEVICE_LIST)),
        ]);
    }

    pub(crate) fn notify_running(&self, device: ObjectId) {
        self.notify(&[PropertyChange::new(
            device,
            PropertyAddress::global(selectors::device::IS_RUNNING),
        )]);
    }
}

pub(crate) fn property_address(raw: &AudioObjectPropertyAddress) -> PropertyAddress {
    PropertyAddress::new(raw.mSelector, raw.mScope, raw.mElement)
}

fn raw_address(address: &PropertyAddress) -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: address.selector,
        mScope: address.scope,
        mElement: address.element,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siphon_core::{DeviceConfig, DeviceSlot, SessionState};

    static CONFIG: DriverConfig = DriverConfig::new("Siphon Test")
        .with_bundle_id("audio.siphon.test")
        .with_primary(DeviceConfig::new("Siphon Test", "SiphonTest_UID"));

    #[test]
    fn test_reference_count_starts_at_zero() {
        let driver = SiphonDriver::new(&CONFIG);
        assert_eq!(driver.add_ref(), 1);
        assert_eq!(driver.add_ref(), 2);
        assert_eq!(driver.release(), 1);
        assert_eq!(driver.release(), 0);
        // Releasing past zero does not wrap.
        assert_eq!(driver.release(), 0);
    }

    #[test]
    fn test_initialize_after_last_release_rebuilds_devices() {
        let driver = SiphonDriver::new(&CONFIG);
        assert_eq!(driver.add_ref(), 1);
        driver.initialize(ptr::null()).unwrap();
        let engine = driver.engine().unwrap();
        assert!(engine.is_live());

        assert_eq!(driver.release(), 0);
        assert!(!engine.is_live());

        // The host loads the driver again.
        assert_eq!(driver.add_ref(), 1);
        driver.initialize(ptr::null()).unwrap();
        assert!(engine.is_live());
        assert_eq!(
            engine.device_state(DeviceSlot::Primary.device_id()),
            Ok(SessionState::Initialized)
        );

        // A second Initialize on a live engine is a no-op.
        driver.initialize(ptr::null()).unwrap();
        assert!(engine.is_live());
    }
}
