//! Siphon 2ch: a stereo loopback device plus a hidden mirror.
//!
//! Build with `cargo build --release -p siphon-2ch` and place the dylib in
//! `Siphon2ch.driver/Contents/MacOS/` next to an `Info.plist` naming
//! `SiphonDriverFactory` as the factory for the AudioServerPlugIn type
//! `443ABAB8-E7B3-491A-B985-BEB9187030DB`. Install the bundle in
//! `/Library/Audio/Plug-Ins/HAL` and restart coreaudiod.

use siphon::prelude::*;

pub static CONFIG: DriverConfig = DriverConfig::new("Siphon 2ch")
    .with_manufacturer("Siphon Audio")
    .with_bundle_id("audio.siphon.2ch")
    .with_box_uid("Siphon2ch_Box_UID")
    .with_model_uid("Siphon2ch_Model_UID")
    .with_channel_count(2)
    .with_primary(DeviceConfig::new("Siphon 2ch", "Siphon2ch_UID"))
    .with_mirror(DeviceConfig::new("Siphon 2ch Mirror", "Siphon2ch_Mirror_UID").hidden());

export_driver!(CONFIG);
