//! Export macro for driver bundles.

/// Generate the driver's load-time registration and factory function.
///
/// # Arguments
///
/// * `$config` - A `static` [`siphon_core::DriverConfig`] describing the driver
///
/// # Example
///
/// ```rust,ignore
/// use siphon_core::{DeviceConfig, DriverConfig};
/// use siphon_hal::export_driver;
///
/// static CONFIG: DriverConfig = DriverConfig::new("Loopback")
///     .with_bundle_id("com.example.Loopback")
///     .with_primary(DeviceConfig::new("Loopback", "Loopback_UID"));
///
/// export_driver!(CONFIG);
/// ```
///
/// # Generated Symbols
///
/// ## `__SIPHON_DRIVER_INIT` (static)
///
/// A function pointer in `__DATA,__mod_init_func` on macOS. `dyld` runs it
/// when coreaudiod loads the bundle, which registers `$config` before the
/// factory can be called.
///
/// ## `SiphonDriverFactory` (exported, macOS only)
///
/// The CFPlugIn factory named under `CFPlugInFactories` in the bundle's
/// `Info.plist`. Returns the driver reference when asked for
/// `kAudioServerPlugInTypeUUID` and null otherwise.
///
/// ## `__siphon_manual_init()` (public function)
///
/// Performs the same registration for test binaries, where the module
/// initializer does not run.
///
/// Only one `export_driver!` per binary is supported; a second registration
/// is ignored with a warning.
#[macro_export]
macro_rules! export_driver {
    ($config:expr) => {
        #[used]
        #[cfg_attr(target_os = "macos", link_section = "__DATA,__mod_init_func")]
        static __SIPHON_DRIVER_INIT: extern "C" fn() = {
            extern "C" fn __siphon_driver_register() {
                $crate::factory::register_config(&$config);
            }
            __siphon_driver_register
        };

        /// CFPlugIn factory function.
        ///
        /// # Safety
        ///
        /// Called by the CFPlugIn loader with a valid (or null) type UUID.
        #[cfg(target_os = "macos")]
        #[no_mangle]
        pub unsafe extern "C" fn SiphonDriverFactory(
            _allocator: *const ::std::ffi::c_void,
            requested_type: *const ::std::ffi::c_void,
        ) -> *mut ::std::ffi::c_void {
            $crate::driver::create(requested_type.cast())
        }

        #[doc(hidden)]
        pub fn __siphon_manual_init() {
            $crate::factory::register_config(&$config);
        }
    };
}
