//! The `AudioServerPlugInDriverInterface` function table.
//!
//! Redefined here rather than taken from the bindings: the generated struct
//! holds a raw pointer in its reserved slot and so cannot live in a `static`.
//! The layout matches `AudioServerPlugIn.h` field for field.

use std::ffi::c_void;

use coreaudio_sys::{
    pid_t, AudioObjectID, AudioObjectPropertyAddress, AudioServerPlugInClientInfo,
    AudioServerPlugInDriverRef, AudioServerPlugInHostRef, AudioServerPlugInIOCycleInfo, Boolean,
    CFDictionaryRef, Float64, OSStatus, UInt32, UInt64, HRESULT, LPVOID, REFIID, ULONG,
};

use crate::entry;

#[repr(C)]
pub struct DriverInterface {
    pub _reserved: *mut c_void,
    pub query_interface: Option<unsafe extern "C" fn(*mut c_void, REFIID, *mut LPVOID) -> HRESULT>,
    pub add_ref: Option<unsafe extern "C" fn(*mut c_void) -> ULONG>,
    pub release: Option<unsafe extern "C" fn(*mut c_void) -> ULONG>,
    pub initialize:
        Option<unsafe extern "C" fn(AudioServerPlugInDriverRef, AudioServerPlugInHostRef) -> OSStatus>,
    pub create_device: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            CFDictionaryRef,
            *const AudioServerPlugInClientInfo,
            *mut AudioObjectID,
        ) -> OSStatus,
    >,
    pub destroy_device:
        Option<unsafe extern "C" fn(AudioServerPlugInDriverRef, AudioObjectID) -> OSStatus>,
    pub add_device_client: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            *const AudioServerPlugInClientInfo,
        ) -> OSStatus,
    >,
    pub remove_device_client: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            *const AudioServerPlugInClientInfo,
        ) -> OSStatus,
    >,
    pub perform_device_configuration_change: Option<
        unsafe extern "C" fn(AudioServerPlugInDriverRef, AudioObjectID, UInt64, *mut c_void) -> OSStatus,
    >,
    pub abort_device_configuration_change: Option<
        unsafe extern "C" fn(AudioServerPlugInDriverRef, AudioObjectID, UInt64, *mut c_void) -> OSStatus,
    >,
    pub has_property: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            pid_t,
            *const AudioObjectPropertyAddress,
        ) -> Boolean,
    >,
    pub is_property_settable: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            pid_t,
            *const AudioObjectPropertyAddress,
            *mut Boolean,
        ) -> OSStatus,
    >,
    pub get_property_data_size: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            pid_t,
            *const AudioObjectPropertyAddress,
            UInt32,
            *const c_void,
            *mut UInt32,
        ) -> OSStatus,
    >,
    pub get_property_data: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            pid_t,
            *const AudioObjectPropertyAddress,
            UInt32,
            *const c_void,
            UInt32,
            *mut UInt32,
            *mut c_void,
        ) -> OSStatus,
    >,
    pub set_property_data: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            pid_t,
            *const AudioObjectPropertyAddress,
            UInt32,
            *const c_void,
            UInt32,
            *const c_void,
        ) -> OSStatus,
    >,
    pub start_io:
        Option<unsafe extern "C" fn(AudioServerPlugInDriverRef, AudioObjectID, UInt32) -> OSStatus>,
    pub stop_io:
        Option<unsafe extern "C" fn(AudioServerPlugInDriverRef, AudioObjectID, UInt32) -> OSStatus>,
    pub get_zero_time_stamp: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            UInt32,
            *mut Float64,
            *mut UInt64,
            *mut UInt64,
        ) -> OSStatus,
    >,
    pub will_do_io_operation: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            UInt32,
            UInt32,
            *mut Boolean,
            *mut Boolean,
        ) -> OSStatus,
    >,
    pub begin_io_operation: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            UInt32,
            UInt32,
            UInt32,
            *const AudioServerPlugInIOCycleInfo,
        ) -> OSStatus,
    >,
    pub do_io_operation: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            AudioObjectID,
            UInt32,
            UInt32,
            UInt32,
            *const AudioServerPlugInIOCycleInfo,
            *mut c_void,
            *mut c_void,
        ) -> OSStatus,
    >,
    pub end_io_operation: Option<
        unsafe extern "C" fn(
            AudioServerPlugInDriverRef,
            AudioObjectID,
            UInt32,
            UInt32,
            UInt32,
            *const AudioServerPlugInIOCycleInfo,
        ) -> OSStatus,
    >,
}

// SAFETY: the table is immutable and `_reserved` is always null.
unsafe impl Sync for DriverInterface {}

/// The one function table every driver reference points at.
pub static DRIVER_INTERFACE: DriverInterface = DriverInterface {
    _reserved: std::ptr::null_mut(),
    query_interface: Some(entry::query_interface),
    add_ref: Some(entry::add_ref),
    release: Some(entry::release),
    initialize: Some(entry::initialize),
    create_device: Some(entry::create_device),
    destroy_device: Some(entry::destroy_device),
    add_device_client: Some(entry::add_device_client),
    remove_device_client: Some(entry::remove_device_client),
    perform_device_configuration_change: Some(entry::perform_device_configuration_change),
    abort_device_configuration_change: Some(entry::abort_device_configuration_change),
    has_property: Some(entry::has_property),
    is_property_settable: Some(entry::is_property_settable),
    get_property_data_size: Some(entry::get_property_data_size),
    get_property_data: Some(entry::get_property_data),
    set_property_data: Some(entry::set_property_data),
    start_io: Some(entry::start_io),
    stop_io: Some(entry::stop_io),
    get_zero_time_stamp: Some(entry::get_zero_time_stamp),
    will_do_io_operation: Some(entry::will_do_io_operation),
    begin_io_operation: Some(entry::begin_io_operation),
    do_io_operation: Some(entry::do_io_operation),
    end_io_operation: Some(entry::end_io_operation),
};
