//! Common types used throughout the engine.

use siphon_utils::FourCharCode;

use crate::selectors::{io_operation, scope, ELEMENT_MAIN};

// =============================================================================
// Limits
// =============================================================================

/// Maximum number of interleaved channels a device may be configured with.
pub const MAX_CHANNELS: u32 = 256;

/// Maximum number of distinct I/O clients tracked per device.
///
/// Client slots are reserved when a device is created so that `StartIO`
/// never grows the table while the io lock is held.
pub const MAX_IO_CLIENTS: usize = 64;

/// Identifier of an object in the audio object graph.
pub type ObjectId = u32;

/// Sentinel meaning "no object" (`kAudioObjectUnknown`).
pub const UNKNOWN_OBJECT: ObjectId = 0;

/// Opaque client identifier handed in by the host on `StartIO`/`StopIO`.
pub type ClientId = u32;

// =============================================================================
// Property addressing
// =============================================================================

/// The (selector, scope, element) triple addressing a property of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyAddress {
    pub selector: u32,
    pub scope: u32,
    pub element: u32,
}

impl PropertyAddress {
    /// Create an address with an explicit scope and element.
    pub const fn new(selector: u32, scope: u32, element: u32) -> Self {
        Self {
            selector,
            scope,
            element,
        }
    }

    /// Create an address in the global scope on the main element.
    pub const fn global(selector: u32) -> Self {
        Self::new(selector, scope::GLOBAL, ELEMENT_MAIN)
    }

    /// Create an address in the given scope on the main element.
    pub const fn scoped(selector: u32, scope: u32) -> Self {
        Self::new(selector, scope, ELEMENT_MAIN)
    }

    /// The stream direction this address is scoped to, if any.
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_scope(self.scope)
    }
}

impl std::fmt::Display for PropertyAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ {} {} {} }}",
            FourCharCode(self.selector),
            FourCharCode(self.scope),
            self.element
        )
    }
}

/// Direction of a stream or control relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Samples flow from the driver to the host (the host reads them).
    Input,
    /// Samples flow from the host into the driver (the host writes them).
    Output,
}

impl Direction {
    /// Map a property scope to a direction. Global and other scopes map to `None`.
    pub fn from_scope(value: u32) -> Option<Self> {
        match value {
            scope::INPUT => Some(Self::Input),
            scope::OUTPUT => Some(Self::Output),
            _ => None,
        }
    }

    /// The property scope matching this direction.
    pub const fn scope(&self) -> u32 {
        match self {
            Self::Input => scope::INPUT,
            Self::Output => scope::OUTPUT,
        }
    }

    /// Value of `kAudioStreamPropertyDirection` (1 = input, 0 = output).
    pub const fn as_u32(&self) -> u32 {
        match self {
            Self::Input => 1,
            Self::Output => 0,
        }
    }
}

// =============================================================================
// I/O cycle description
// =============================================================================

/// The kind of work the host asks for in one `DoIOOperation` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    /// Copy captured samples out of the ring buffer into the host's buffer.
    ReadInput,
    /// Copy the host's mixed output into the ring buffer.
    WriteMix,
    /// Any other operation; the engine declines these in `WillDoIOOperation`.
    Other(u32),
}

impl IoOperation {
    /// Decode a raw operation ID.
    pub fn from_u32(value: u32) -> Self {
        match value {
            io_operation::READ_INPUT => Self::ReadInput,
            io_operation::WRITE_MIX => Self::WriteMix,
            other => Self::Other(other),
        }
    }

    /// The raw operation ID.
    pub fn as_u32(&self) -> u32 {
        match self {
            Self::ReadInput => io_operation::READ_INPUT,
            Self::WriteMix => io_operation::WRITE_MIX,
            Self::Other(value) => *value,
        }
    }
}

/// Timing for one I/O cycle as supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IoCycleInfo {
    /// Monotonic counter of the host's I/O cycles.
    pub cycle_counter: u64,
    /// Sample time of the first frame read by `ReadInput`.
    pub input_sample_time: f64,
    /// Sample time of the first frame written by `WriteMix`.
    pub output_sample_time: f64,
}

impl IoCycleInfo {
    /// Cycle info where input and output share the same sample time.
    pub fn at(sample_time: f64) -> Self {
        Self {
            cycle_counter: 0,
            input_sample_time: sample_time,
            output_sample_time: sample_time,
        }
    }
}

/// Result of `WillDoIOOperation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoCapability {
    pub will_do: bool,
    pub in_place: bool,
}

/// A zero time stamp relating device sample time to host time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroTimeStamp {
    pub sample_time: f64,
    pub host_time: u64,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::device;

    #[test]
    fn test_direction_scope_round_trip() {
        assert_eq!(Direction::from_scope(scope::INPUT), Some(Direction::Input));
        assert_eq!(Direction::from_scope(scope::OUTPUT), Some(Direction::Output));
        assert_eq!(Direction::from_scope(scope::GLOBAL), None);
        assert_eq!(Direction::Output.scope(), scope::OUTPUT);
    }

    #[test]
    fn test_io_operation_decoding() {
        assert_eq!(
            IoOperation::from_u32(io_operation::WRITE_MIX),
            IoOperation::WriteMix
        );
        assert_eq!(
            IoOperation::from_u32(io_operation::CYCLE),
            IoOperation::Other(io_operation::CYCLE)
        );
    }

    #[test]
    fn test_address_display() {
        let address = PropertyAddress::global(device::NOMINAL_SAMPLE_RATE);
        assert_eq!(address.to_string(), "{ nsrt glob 0 }");
    }
}
