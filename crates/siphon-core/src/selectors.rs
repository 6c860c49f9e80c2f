//! Four-character codes understood by the host audio server.
//!
//! The values match the host's public headers so that the ABI layer can pass
//! raw selectors straight into the engine without translation.

use siphon_utils::fourcc;

/// Object class identifiers (`kAudio*ClassID`).
pub mod class {
    use super::fourcc;

    pub const OBJECT: u32 = fourcc(b"aobj");
    pub const PLUG_IN: u32 = fourcc(b"aplg");
    pub const BOX: u32 = fourcc(b"abox");
    pub const DEVICE: u32 = fourcc(b"adev");
    pub const STREAM: u32 = fourcc(b"astr");
    pub const CONTROL: u32 = fourcc(b"actl");
    pub const LEVEL_CONTROL: u32 = fourcc(b"levl");
    pub const VOLUME_CONTROL: u32 = fourcc(b"vlme");
    pub const BOOLEAN_CONTROL: u32 = fourcc(b"togl");
    pub const MUTE_CONTROL: u32 = fourcc(b"mute");
    pub const SELECTOR_CONTROL: u32 = fourcc(b"slct");
    pub const CLOCK_SOURCE_CONTROL: u32 = fourcc(b"clck");
    pub const STEREO_PAN_CONTROL: u32 = fourcc(b"span");
}

/// Property scopes (`kAudioObjectPropertyScope*`).
pub mod scope {
    use super::fourcc;

    pub const GLOBAL: u32 = fourcc(b"glob");
    pub const INPUT: u32 = fourcc(b"inpt");
    pub const OUTPUT: u32 = fourcc(b"outp");
    pub const PLAY_THROUGH: u32 = fourcc(b"ptru");
    pub const WILDCARD: u32 = fourcc(b"****");
}

/// The main element of every property address.
pub const ELEMENT_MAIN: u32 = 0;

/// Object-level selectors shared by every class.
pub mod object {
    use super::fourcc;

    pub const BASE_CLASS: u32 = fourcc(b"bcls");
    pub const CLASS: u32 = fourcc(b"clas");
    pub const OWNER: u32 = fourcc(b"stdv");
    pub const NAME: u32 = fourcc(b"lnam");
    pub const MODEL_NAME: u32 = fourcc(b"lmod");
    pub const MANUFACTURER: u32 = fourcc(b"lmak");
    pub const ELEMENT_NAME: u32 = fourcc(b"lchn");
    pub const OWNED_OBJECTS: u32 = fourcc(b"ownd");
    pub const IDENTIFY: u32 = fourcc(b"iden");
    pub const SERIAL_NUMBER: u32 = fourcc(b"snum");
    pub const FIRMWARE_VERSION: u32 = fourcc(b"fwvn");
    pub const CONTROL_LIST: u32 = fourcc(b"ctrl");
}

/// Plug-in selectors (`kAudioPlugInProperty*`).
pub mod plugin {
    use super::fourcc;

    pub const BUNDLE_ID: u32 = fourcc(b"piid");
    pub const DEVICE_LIST: u32 = fourcc(b"dev#");
    pub const TRANSLATE_UID_TO_DEVICE: u32 = fourcc(b"uidd");
    pub const BOX_LIST: u32 = fourcc(b"box#");
    pub const TRANSLATE_UID_TO_BOX: u32 = fourcc(b"uidb");
    pub const CLOCK_DEVICE_LIST: u32 = fourcc(b"clk#");
    pub const RESOURCE_BUNDLE: u32 = fourcc(b"rsrc");
}

/// Box selectors (`kAudioBoxProperty*`).
pub mod boxes {
    use super::fourcc;

    pub const BOX_UID: u32 = fourcc(b"buid");
    pub const TRANSPORT_TYPE: u32 = fourcc(b"tran");
    pub const HAS_AUDIO: u32 = fourcc(b"bhau");
    pub const HAS_VIDEO: u32 = fourcc(b"bhvi");
    pub const HAS_MIDI: u32 = fourcc(b"bhmi");
    pub const IS_PROTECTED: u32 = fourcc(b"bpro");
    pub const ACQUIRED: u32 = fourcc(b"bxon");
    pub const ACQUISITION_FAILED: u32 = fourcc(b"bxof");
    pub const DEVICE_LIST: u32 = fourcc(b"bdv#");
    pub const CLOCK_DEVICE_LIST: u32 = fourcc(b"bcl#");
}

/// Device selectors (`kAudioDeviceProperty*`).
pub mod device {
    use super::fourcc;

    pub const DEVICE_UID: u32 = fourcc(b"uid ");
    pub const MODEL_UID: u32 = fourcc(b"muid");
    pub const TRANSPORT_TYPE: u32 = fourcc(b"tran");
    pub const RELATED_DEVICES: u32 = fourcc(b"akin");
    pub const CLOCK_DOMAIN: u32 = fourcc(b"clkd");
    pub const IS_ALIVE: u32 = fourcc(b"livn");
    pub const IS_RUNNING: u32 = fourcc(b"goin");
    pub const CAN_BE_DEFAULT_DEVICE: u32 = fourcc(b"dflt");
    pub const CAN_BE_DEFAULT_SYSTEM_DEVICE: u32 = fourcc(b"sflt");
    pub const LATENCY: u32 = fourcc(b"ltnc");
    pub const STREAMS: u32 = fourcc(b"stm#");
    pub const SAFETY_OFFSET: u32 = fourcc(b"saft");
    pub const NOMINAL_SAMPLE_RATE: u32 = fourcc(b"nsrt");
    pub const AVAILABLE_NOMINAL_SAMPLE_RATES: u32 = fourcc(b"nsr#");
    pub const IS_HIDDEN: u32 = fourcc(b"hidn");
    pub const PREFERRED_CHANNELS_FOR_STEREO: u32 = fourcc(b"dch2");
    pub const PREFERRED_CHANNEL_LAYOUT: u32 = fourcc(b"srnd");
    pub const ZERO_TIMESTAMP_PERIOD: u32 = fourcc(b"ring");
}

/// Stream selectors (`kAudioStreamProperty*`).
pub mod stream {
    use super::fourcc;

    pub const IS_ACTIVE: u32 = fourcc(b"sact");
    pub const DIRECTION: u32 = fourcc(b"sdir");
    pub const TERMINAL_TYPE: u32 = fourcc(b"term");
    pub const STARTING_CHANNEL: u32 = fourcc(b"schn");
    pub const LATENCY: u32 = fourcc(b"ltnc");
    pub const VIRTUAL_FORMAT: u32 = fourcc(b"sfmt");
    pub const AVAILABLE_VIRTUAL_FORMATS: u32 = fourcc(b"sfma");
    pub const PHYSICAL_FORMAT: u32 = fourcc(b"pft ");
    pub const AVAILABLE_PHYSICAL_FORMATS: u32 = fourcc(b"pfta");

    pub const TERMINAL_MICROPHONE: u32 = fourcc(b"micr");
    pub const TERMINAL_SPEAKER: u32 = fourcc(b"spkr");
}

/// Control selectors (`kAudio*ControlProperty*`).
pub mod control {
    use super::fourcc;

    pub const SCOPE: u32 = fourcc(b"cscp");
    pub const ELEMENT: u32 = fourcc(b"celm");

    pub const SCALAR_VALUE: u32 = fourcc(b"lcsv");
    pub const DECIBEL_VALUE: u32 = fourcc(b"lcdv");
    pub const DECIBEL_RANGE: u32 = fourcc(b"lcdr");
    pub const CONVERT_SCALAR_TO_DECIBELS: u32 = fourcc(b"lcsd");
    pub const CONVERT_DECIBELS_TO_SCALAR: u32 = fourcc(b"lcds");

    pub const BOOLEAN_VALUE: u32 = fourcc(b"bcvl");

    pub const PAN_VALUE: u32 = fourcc(b"spcv");
    pub const PAN_CHANNELS: u32 = fourcc(b"spcc");

    pub const CURRENT_ITEM: u32 = fourcc(b"scci");
    pub const AVAILABLE_ITEMS: u32 = fourcc(b"scai");
    pub const ITEM_NAME: u32 = fourcc(b"scin");
}

/// Transport type reported by the box and devices.
pub const TRANSPORT_VIRTUAL: u32 = fourcc(b"virt");

/// Linear PCM format ID.
pub const FORMAT_LINEAR_PCM: u32 = fourcc(b"lpcm");

/// Format flag bits (`kAudioFormatFlag*`).
pub mod format_flags {
    pub const IS_FLOAT: u32 = 1 << 0;
    pub const IS_BIG_ENDIAN: u32 = 1 << 1;
    pub const IS_PACKED: u32 = 1 << 3;

    #[cfg(target_endian = "big")]
    pub const NATIVE_ENDIAN: u32 = IS_BIG_ENDIAN;
    #[cfg(target_endian = "little")]
    pub const NATIVE_ENDIAN: u32 = 0;

    /// Packed native-endian 32-bit float, the only sample format the engine moves.
    pub const NATIVE_FLOAT_PACKED: u32 = IS_FLOAT | NATIVE_ENDIAN | IS_PACKED;
}

/// Channel layout constants.
pub mod layout {
    pub const TAG_USE_CHANNEL_DESCRIPTIONS: u32 = 0;
    pub const LABEL_LEFT: u32 = 1;
    pub const LABEL_RIGHT: u32 = 2;
    /// `kAudioChannelLabel_Discrete_0`; discrete channel `n` is `DISCRETE_0 | n`.
    pub const LABEL_DISCRETE_0: u32 = 1 << 16;
}

/// I/O operation IDs (`kAudioServerPlugInIOOperation*`).
pub mod io_operation {
    use super::fourcc;

    pub const THREAD: u32 = fourcc(b"thrd");
    pub const CYCLE: u32 = fourcc(b"cycl");
    pub const READ_INPUT: u32 = fourcc(b"read");
    pub const CONVERT_INPUT: u32 = fourcc(b"cinp");
    pub const PROCESS_INPUT: u32 = fourcc(b"pinp");
    pub const PROCESS_OUTPUT: u32 = fourcc(b"pout");
    pub const MIX_OUTPUT: u32 = fourcc(b"mixo");
    pub const PROCESS_MIX: u32 = fourcc(b"pmix");
    pub const CONVERT_MIX: u32 = fourcc(b"cmix");
    pub const WRITE_MIX: u32 = fourcc(b"rite");
}
