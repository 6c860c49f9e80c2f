//! C-ABI entry points of the driver interface.
//!
//! Every entry point resolves the driver reference, converts the host's
//! pointers into engine types, and maps the result to an `OSStatus`.
//! Panics are caught at this boundary and reported as unspecified errors.
//! Host notifications are sent after the engine call returns, with no
//! engine lock held.

// These are C-ABI entry points called by the host. The host is responsible
// for passing valid pointers; each one is null-checked before use.
#![allow(clippy::not_unsafe_ptr_arg_deref)]
#![allow(clippy::too_many_arguments)]

use std::ffi::c_void;
use std::mem::size_of;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;

use coreaudio_sys::{
    pid_t, AudioObjectID, AudioObjectPropertyAddress, AudioServerPlugInClientInfo,
    AudioServerPlugInDriverRef, AudioServerPlugInHostRef, AudioServerPlugInIOCycleInfo, Boolean,
    CFDictionaryRef, CFStringRef, Float64, OSStatus, UInt32, UInt64, HRESULT, LPVOID, REFIID,
    ULONG,
};
use siphon_core::{
    status, ClientId, EngineError, EngineResult, IoCycleInfo, IoOperation, IoTransition,
    PropertyData, Qualifier, QualifierKind, SessionState,
};

use crate::cf;
use crate::driver::{property_address, resolve, resolve_ref};

/// `E_NOINTERFACE`
const E_NOINTERFACE: HRESULT = 0x8000_0004_u32 as HRESULT;

// =============================================================================
// Boundary helpers
// =============================================================================

/// Run `f`, mapping its error or panic to a status code.
fn guarded(entry: &'static str, f: impl FnOnce() -> EngineResult<()>) -> OSStatus {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => status::NO_ERROR,
        Ok(Err(err)) => {
            log::error!("{}: {}", entry, err);
            err.status()
        }
        Err(_) => {
            log::error!("{}: panic caught at the driver boundary", entry);
            status::UNSPECIFIED
        }
    }
}

/// [`guarded`] for the I/O path: errors are not logged.
fn guarded_io(entry: &'static str, f: impl FnOnce() -> EngineResult<()>) -> OSStatus {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => status::NO_ERROR,
        Ok(Err(err)) => err.status(),
        Err(_) => {
            log::error!("{}: panic caught at the driver boundary", entry);
            status::UNSPECIFIED
        }
    }
}

fn non_null<T>(pointer: *const T, what: &'static str) -> EngineResult<*const T> {
    if pointer.is_null() {
        Err(EngineError::IllegalOperation(what))
    } else {
        Ok(pointer)
    }
}

fn non_null_mut<T>(pointer: *mut T, what: &'static str) -> EngineResult<*mut T> {
    if pointer.is_null() {
        Err(EngineError::IllegalOperation(what))
    } else {
        Ok(pointer)
    }
}

unsafe fn client_id(info: *const AudioServerPlugInClientInfo) -> EngineResult<ClientId> {
    Ok((*non_null(info, "no client info")?).mClientID)
}

unsafe fn cycle_info(info: *const AudioServerPlugInIOCycleInfo) -> EngineResult<IoCycleInfo> {
    let info = &*non_null(info, "no I/O cycle info")?;
    Ok(IoCycleInfo {
        cycle_counter: info.mIOCycleCounter,
        input_sample_time: info.mInputTime.mSampleTime,
        output_sample_time: info.mOutputTime.mSampleTime,
    })
}

/// A qualifier copied out of host memory.
enum OwnedQualifier {
    None,
    Uid(String),
    Item(u32),
    Value(f32),
    Classes(Vec<u32>),
}

impl OwnedQualifier {
    fn as_qualifier(&self) -> Qualifier<'_> {
        match self {
            Self::None => Qualifier::None,
            Self::Uid(uid) => Qualifier::Uid(uid),
            Self::Item(item) => Qualifier::Item(*item),
            Self::Value(value) => Qualifier::Value(*value),
            Self::Classes(classes) => Qualifier::Classes(classes),
        }
    }

    /// Decode the qualifier the selector expects.
    ///
    /// Conversion selectors carry their input in the data buffer rather than
    /// the qualifier; the caller passes it as `in_out`.
    unsafe fn decode(
        selector: u32,
        size: UInt32,
        data: *const c_void,
        in_out: Option<f32>,
    ) -> EngineResult<Self> {
        let size = size as usize;
        let present = !data.is_null() && size > 0;
        Ok(match QualifierKind::for_selector(selector) {
            QualifierKind::None => Self::None,
            QualifierKind::Uid if present && size >= size_of::<CFStringRef>() => {
                let string = data.cast::<CFStringRef>().read_unaligned();
                match cf::string_from(string) {
                    Some(uid) => Self::Uid(uid),
                    None => Self::None,
                }
            }
            QualifierKind::Item if present && size >= size_of::<u32>() => {
                Self::Item(data.cast::<u32>().read_unaligned())
            }
            QualifierKind::InOutValue => in_out.map_or(Self::None, Self::Value),
            QualifierKind::Classes if present => {
                let count = size / size_of::<u32>();
                let classes = slice::from_raw_parts(data.cast::<u8>(), count * size_of::<u32>())
                    .chunks_exact(size_of::<u32>())
                    .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                Self::Classes(classes)
            }
            QualifierKind::Uid | QualifierKind::Item | QualifierKind::Classes => Self::None,
        })
    }
}

// =============================================================================
// IUnknown
// =============================================================================

pub(crate) unsafe extern "C" fn query_interface(
    driver: *mut c_void,
    uuid: REFIID,
    out_interface: *mut LPVOID,
) -> HRESULT {
    let Ok(this) = resolve(driver.cast_const()) else {
        log::error!("QueryInterface: bad driver reference");
        return status::BAD_OBJECT as HRESULT;
    };
    if out_interface.is_null() {
        return status::ILLEGAL_OPERATION as HRESULT;
    }
    let requested = cf::uuid_bytes(&uuid);
    if requested == cf::IUNKNOWN || requested == cf::DRIVER_INTERFACE {
        this.add_ref();
        out_interface.write(this.as_raw());
        status::NO_ERROR as HRESULT
    } else {
        E_NOINTERFACE
    }
}

pub(crate) unsafe extern "C" fn add_ref(driver: *mut c_void) -> ULONG {
    resolve(driver.cast_const()).map_or(0, |this| this.add_ref())
}

pub(crate) unsafe extern "C" fn release(driver: *mut c_void) -> ULONG {
    resolve(driver.cast_const()).map_or(0, |this| this.release())
}

// =============================================================================
// Lifecycle
// =============================================================================

pub(crate) unsafe extern "C" fn initialize(
    driver: AudioServerPlugInDriverRef,
    host: AudioServerPlugInHostRef,
) -> OSStatus {
    guarded("Initialize", || {
        let this = resolve_ref(driver)?;
        this.initialize(non_null(host, "no host interface")?)
    })
}

/// Create the first configured device that does not exist yet.
pub(crate) unsafe extern "C" fn create_device(
    driver: AudioServerPlugInDriverRef,
    _description: CFDictionaryRef,
    _client_info: *const AudioServerPlugInClientInfo,
    out_device: *mut AudioObjectID,
) -> OSStatus {
    guarded("CreateDevice", || {
        let this = resolve_ref(driver)?;
        let out_device = non_null_mut(out_device, "no place for the device ID")?;
        let engine = this.engine()?;
        let device = engine
            .graph()
            .devices()
            .iter()
            .copied()
            .find(|&device| {
                !matches!(
                    engine.device_state(device),
                    Ok(SessionState::Initialized | SessionState::Running)
                )
            })
            .ok_or(EngineError::IllegalOperation("every configured device exists"))?;
        engine.create_device(device)?;
        out_device.write(device);
        this.notify_device_list();
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn destroy_device(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
) -> OSStatus {
    guarded("DestroyDevice", || {
        let this = resolve_ref(driver)?;
        this.engine()?.destroy_device(device)?;
        this.notify_device_list();
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn add_device_client(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    client_info: *const AudioServerPlugInClientInfo,
) -> OSStatus {
    guarded("AddDeviceClient", || {
        let engine = resolve_ref(driver)?.engine()?;
        engine.add_device_client(device, client_id(client_info)?)
    })
}

pub(crate) unsafe extern "C" fn remove_device_client(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    client_info: *const AudioServerPlugInClientInfo,
) -> OSStatus {
    guarded("RemoveDeviceClient", || {
        let engine = resolve_ref(driver)?.engine()?;
        engine.remove_device_client(device, client_id(client_info)?)
    })
}

pub(crate) unsafe extern "C" fn perform_device_configuration_change(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    action: UInt64,
    _info: *mut c_void,
) -> OSStatus {
    guarded("PerformDeviceConfigurationChange", || {
        resolve_ref(driver)?
            .engine()?
            .perform_device_configuration_change(device, action)
    })
}

pub(crate) unsafe extern "C" fn abort_device_configuration_change(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    action: UInt64,
    _info: *mut c_void,
) -> OSStatus {
    guarded("AbortDeviceConfigurationChange", || {
        resolve_ref(driver)?
            .engine()?
            .abort_device_configuration_change(device, action)
    })
}

// =============================================================================
// Properties
// =============================================================================

pub(crate) unsafe extern "C" fn has_property(
    driver: AudioServerPlugInDriverRef,
    object: AudioObjectID,
    _pid: pid_t,
    address: *const AudioObjectPropertyAddress,
) -> Boolean {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let Ok(engine) = resolve_ref(driver).and_then(|this| this.engine()) else {
            return false;
        };
        match address.as_ref() {
            Some(address) => engine.has_property(object, &property_address(address)),
            None => false,
        }
    }));
    Boolean::from(result.unwrap_or(false))
}

pub(crate) unsafe extern "C" fn is_property_settable(
    driver: AudioServerPlugInDriverRef,
    object: AudioObjectID,
    _pid: pid_t,
    address: *const AudioObjectPropertyAddress,
    out_settable: *mut Boolean,
) -> OSStatus {
    guarded("IsPropertySettable", || {
        let engine = resolve_ref(driver)?.engine()?;
        let address = property_address(&*non_null(address, "no property address")?);
        let out_settable = non_null_mut(out_settable, "no place for the result")?;
        let settable = engine.is_property_settable(object, &address)?;
        out_settable.write(Boolean::from(settable));
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn get_property_data_size(
    driver: AudioServerPlugInDriverRef,
    object: AudioObjectID,
    _pid: pid_t,
    address: *const AudioObjectPropertyAddress,
    qualifier_size: UInt32,
    qualifier_data: *const c_void,
    out_size: *mut UInt32,
) -> OSStatus {
    guarded("GetPropertyDataSize", || {
        let engine = resolve_ref(driver)?.engine()?;
        let address = property_address(&*non_null(address, "no property address")?);
        let out_size = non_null_mut(out_size, "no place for the size")?;
        let qualifier =
            OwnedQualifier::decode(address.selector, qualifier_size, qualifier_data, Some(0.0))?;
        let size = engine.property_data_size(object, &address, qualifier.as_qualifier())?;
        out_size.write(size as UInt32);
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn get_property_data(
    driver: AudioServerPlugInDriverRef,
    object: AudioObjectID,
    _pid: pid_t,
    address: *const AudioObjectPropertyAddress,
    qualifier_size: UInt32,
    qualifier_data: *const c_void,
    data_size: UInt32,
    out_size: *mut UInt32,
    out_data: *mut c_void,
) -> OSStatus {
    guarded("GetPropertyData", || {
        let engine = resolve_ref(driver)?.engine()?;
        let address = property_address(&*non_null(address, "no property address")?);
        let out_size = non_null_mut(out_size, "no place for the size")?;
        let out_data = non_null_mut(out_data, "no place for the data")?;

        let in_out = (QualifierKind::for_selector(address.selector) == QualifierKind::InOutValue
            && data_size as usize >= size_of::<f32>())
        .then(|| out_data.cast::<f32>().read_unaligned());
        let qualifier =
            OwnedQualifier::decode(address.selector, qualifier_size, qualifier_data, in_out)?;

        let data =
            engine.property_data(object, &address, qualifier.as_qualifier(), data_size as usize)?;
        let written = match &data {
            PropertyData::Text(text) => {
                let string = cf::create_string(text);
                if string.is_null() {
                    return Err(EngineError::AllocationFailed("CFString"));
                }
                out_data.cast::<CFStringRef>().write_unaligned(string);
                size_of::<CFStringRef>()
            }
            _ => {
                let buffer = slice::from_raw_parts_mut(out_data.cast::<u8>(), data_size as usize);
                data.write_bytes(buffer)?
            }
        };
        out_size.write(written as UInt32);
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn set_property_data(
    driver: AudioServerPlugInDriverRef,
    object: AudioObjectID,
    _pid: pid_t,
    address: *const AudioObjectPropertyAddress,
    qualifier_size: UInt32,
    qualifier_data: *const c_void,
    data_size: UInt32,
    data: *const c_void,
) -> OSStatus {
    guarded("SetPropertyData", || {
        let this = resolve_ref(driver)?;
        let engine = this.engine()?;
        let address = property_address(&*non_null(address, "no property address")?);
        let data = non_null(data, "no property data")?;
        let qualifier =
            OwnedQualifier::decode(address.selector, qualifier_size, qualifier_data, None)?;
        let bytes = slice::from_raw_parts(data.cast::<u8>(), data_size as usize);

        let changes = engine.set_property_data(object, &address, qualifier.as_qualifier(), bytes)?;
        this.notify(&changes);
        Ok(())
    })
}

// =============================================================================
// I/O
// =============================================================================

pub(crate) unsafe extern "C" fn start_io(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    client: UInt32,
) -> OSStatus {
    guarded("StartIO", || {
        let this = resolve_ref(driver)?;
        if this.engine()?.start_io(device, client)? == IoTransition::Started {
            this.notify_running(device);
        }
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn stop_io(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    client: UInt32,
) -> OSStatus {
    guarded("StopIO", || {
        let this = resolve_ref(driver)?;
        if this.engine()?.stop_io(device, client)? == IoTransition::Stopped {
            this.notify_running(device);
        }
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn get_zero_time_stamp(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    _client: UInt32,
    out_sample_time: *mut Float64,
    out_host_time: *mut UInt64,
    out_seed: *mut UInt64,
) -> OSStatus {
    guarded_io("GetZeroTimeStamp", || {
        let engine = resolve_ref(driver)?.engine()?;
        let out_sample_time = non_null_mut(out_sample_time, "no place for the sample time")?;
        let out_host_time = non_null_mut(out_host_time, "no place for the host time")?;
        let out_seed = non_null_mut(out_seed, "no place for the seed")?;

        let stamp = engine.get_zero_timestamp(device)?;
        out_sample_time.write(stamp.sample_time);
        out_host_time.write(stamp.host_time);
        out_seed.write(stamp.seed);
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn will_do_io_operation(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    _client: UInt32,
    operation: UInt32,
    out_will_do: *mut Boolean,
    out_in_place: *mut Boolean,
) -> OSStatus {
    guarded_io("WillDoIOOperation", || {
        let engine = resolve_ref(driver)?.engine()?;
        let out_will_do = non_null_mut(out_will_do, "no place for will-do")?;
        let out_in_place = non_null_mut(out_in_place, "no place for in-place")?;

        let capability = engine.will_do_io_operation(device, IoOperation::from_u32(operation))?;
        out_will_do.write(Boolean::from(capability.will_do));
        out_in_place.write(Boolean::from(capability.in_place));
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn begin_io_operation(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    client: UInt32,
    operation: UInt32,
    frame_count: UInt32,
    cycle: *const AudioServerPlugInIOCycleInfo,
) -> OSStatus {
    guarded_io("BeginIOOperation", || {
        let engine = resolve_ref(driver)?.engine()?;
        engine.begin_io_operation(
            device,
            client,
            IoOperation::from_u32(operation),
            frame_count as usize,
            &cycle_info(cycle)?,
        )
    })
}

pub(crate) unsafe extern "C" fn do_io_operation(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    stream: AudioObjectID,
    client: UInt32,
    operation: UInt32,
    frame_count: UInt32,
    cycle: *const AudioServerPlugInIOCycleInfo,
    main_buffer: *mut c_void,
    _secondary_buffer: *mut c_void,
) -> OSStatus {
    guarded_io("DoIOOperation", || {
        let engine = resolve_ref(driver)?.engine()?;
        let main_buffer = non_null_mut(main_buffer, "no I/O buffer")?;
        let cycle = cycle_info(cycle)?;

        let frames = frame_count as usize;
        let samples = frames * engine.config().channel_count as usize;
        let buffer = slice::from_raw_parts_mut(main_buffer.cast::<f32>(), samples);
        engine.do_io_operation(
            device,
            stream,
            client,
            IoOperation::from_u32(operation),
            frames,
            &cycle,
            buffer,
        )
    })
}

pub(crate) unsafe extern "C" fn end_io_operation(
    driver: AudioServerPlugInDriverRef,
    device: AudioObjectID,
    client: UInt32,
    operation: UInt32,
    frame_count: UInt32,
    cycle: *const AudioServerPlugInIOCycleInfo,
) -> OSStatus {
    guarded_io("EndIOOperation", || {
        let engine = resolve_ref(driver)?.engine()?;
        engine.end_io_operation(
            device,
            client,
            IoOperation::from_u32(operation),
            frame_count as usize,
            &cycle_info(cycle)?,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_maps_results_to_status() {
        assert_eq!(guarded("Ok", || Ok(())), status::NO_ERROR);
        assert_eq!(
            guarded("Err", || Err(EngineError::InvalidObject(99))),
            status::BAD_OBJECT
        );
        assert_eq!(
            guarded_io("Io", || Err(EngineError::NotRunning(3))),
            status::NOT_RUNNING
        );
    }

    #[test]
    fn test_panic_does_not_cross_the_boundary() {
        let result = guarded("Panics", || panic!("boom"));
        assert_eq!(result, status::UNSPECIFIED);
    }

    #[test]
    fn test_unregistered_driver_reference_is_rejected() {
        let mut settable: Boolean = 0;
        let address = AudioObjectPropertyAddress {
            mSelector: 0,
            mScope: 0,
            mElement: 0,
        };
        let result = unsafe {
            is_property_settable(std::ptr::null_mut(), 1, 0, &address, &mut settable)
        };
        assert_eq!(result, status::BAD_OBJECT);
    }
}
