//! CoreFoundation helpers: strings and plug-in UUIDs.

use std::ffi::{c_char, CStr};
use std::ptr;

use coreaudio_sys::{
    kCFStringEncodingUTF8, Boolean, CFIndex, CFStringCreateWithBytes, CFStringGetCString,
    CFStringGetLength, CFStringGetMaximumSizeForEncoding, CFStringRef, CFUUIDBytes,
    CFUUIDGetUUIDBytes, CFUUIDRef,
};

/// Create a CFString from `value`. The caller owns the returned reference;
/// null if CoreFoundation refuses.
pub fn create_string(value: &str) -> CFStringRef {
    let Ok(len) = CFIndex::try_from(value.len()) else {
        return ptr::null();
    };
    // SAFETY: the byte pointer and length describe `value`.
    unsafe {
        CFStringCreateWithBytes(
            ptr::null(),
            value.as_ptr(),
            len,
            kCFStringEncodingUTF8,
            Boolean::from(false),
        )
    }
}

/// Copy a CFString into an owned `String`.
///
/// # Safety
///
/// `string` must be null or a valid CFString.
pub unsafe fn string_from(string: CFStringRef) -> Option<String> {
    if string.is_null() {
        return None;
    }
    let len = CFStringGetLength(string);
    let capacity = CFStringGetMaximumSizeForEncoding(len, kCFStringEncodingUTF8) + 1;
    let mut buffer = vec![0u8; usize::try_from(capacity).ok()?];
    let copied = CFStringGetCString(
        string,
        buffer.as_mut_ptr().cast::<c_char>(),
        capacity,
        kCFStringEncodingUTF8,
    );
    if copied == 0 {
        return None;
    }
    CStr::from_bytes_until_nul(&buffer)
        .ok()?
        .to_str()
        .ok()
        .map(str::to_owned)
}

// =============================================================================
// UUIDs
// =============================================================================

/// `kAudioServerPlugInTypeUUID`
pub const PLUG_IN_TYPE: [u8; 16] = [
    0x44, 0x3A, 0xBA, 0xB8, 0xE7, 0xB3, 0x49, 0x1A, 0xB9, 0x85, 0xBE, 0xB9, 0x18, 0x70, 0x30, 0xDB,
];

/// `kAudioServerPlugInDriverInterfaceUUID`
pub const DRIVER_INTERFACE: [u8; 16] = [
    0xEE, 0xA5, 0x77, 0x3D, 0xCC, 0x43, 0x49, 0xF1, 0x8E, 0x00, 0x8F, 0x96, 0xE7, 0xD2, 0x3B, 0x17,
];

/// `IUnknownUUID`
pub const IUNKNOWN: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

pub fn uuid_bytes(uuid: &CFUUIDBytes) -> [u8; 16] {
    [
        uuid.byte0, uuid.byte1, uuid.byte2, uuid.byte3, uuid.byte4, uuid.byte5, uuid.byte6,
        uuid.byte7, uuid.byte8, uuid.byte9, uuid.byte10, uuid.byte11, uuid.byte12, uuid.byte13,
        uuid.byte14, uuid.byte15,
    ]
}

/// Whether `uuid` is the given constant.
///
/// # Safety
///
/// `uuid` must be null or a valid CFUUID.
pub unsafe fn uuid_is(uuid: CFUUIDRef, expected: [u8; 16]) -> bool {
    if uuid.is_null() {
        return false;
    }
    uuid_bytes(&CFUUIDGetUUIDBytes(uuid)) == expected
}

