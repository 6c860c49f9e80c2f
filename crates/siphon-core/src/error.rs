//! Engine error types.

use siphon_utils::FourCharCode;

use crate::types::ObjectId;

/// Error type for engine operations.
///
/// Every entry point reports failures synchronously; the engine never
/// retries. [`EngineError::status`] maps a variant to the status code the
/// host expects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// No object with this ID exists in the graph.
    #[error("invalid object: {0}")]
    InvalidObject(ObjectId),

    /// The object exists but does not implement the selector.
    #[error("object {object} does not support selector '{}'", FourCharCode(*.selector))]
    UnsupportedSelector { object: ObjectId, selector: u32 },

    /// The selector is read-only on this object.
    #[error("selector '{}' is not settable on object {object}", FourCharCode(*.selector))]
    NotSettable { object: ObjectId, selector: u32 },

    /// The value lies outside the property's declared domain.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),

    /// A stream format that is not linear PCM float at the configured layout.
    #[error("unsupported stream format: {0}")]
    UnsupportedFormat(&'static str),

    /// The caller's buffer cannot hold the result.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// A set-data payload whose size does not match the property's type.
    #[error("bad property size: expected {expected} bytes, got {actual}")]
    BadPropertySize { expected: usize, actual: usize },

    /// A mutation attempted while I/O is active, or a lifecycle call out of order.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An I/O call on a device with no running clients.
    #[error("device {0} is not running")]
    NotRunning(ObjectId),

    /// A call that can never succeed for these arguments (missing qualifier,
    /// operation that does not match the stream's direction).
    #[error("illegal operation: {0}")]
    IllegalOperation(&'static str),

    /// Sample storage or client slots could not be allocated.
    #[error("allocation failed: {0}")]
    AllocationFailed(&'static str),

    /// The driver configuration was rejected at initialization.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// The host status code for this error.
    pub fn status(&self) -> i32 {
        match self {
            Self::InvalidObject(_) => status::BAD_OBJECT,
            Self::UnsupportedSelector { .. } => status::UNKNOWN_PROPERTY,
            Self::NotSettable { .. } => status::UNSUPPORTED_OPERATION,
            Self::InvalidValue(_) => status::ILLEGAL_OPERATION,
            Self::UnsupportedFormat(_) => status::UNSUPPORTED_FORMAT,
            Self::BufferTooSmall { .. } => status::BAD_PROPERTY_SIZE,
            Self::BadPropertySize { .. } => status::BAD_PROPERTY_SIZE,
            Self::InvalidState(_) => status::ILLEGAL_OPERATION,
            Self::NotRunning(_) => status::NOT_RUNNING,
            Self::IllegalOperation(_) => status::ILLEGAL_OPERATION,
            Self::AllocationFailed(_) => status::UNSPECIFIED,
            Self::InvalidConfiguration(_) => status::UNSPECIFIED,
        }
    }
}

/// Status codes returned to the host (`kAudioHardware*Error`).
pub mod status {
    use siphon_utils::fourcc;

    /// No error.
    pub const NO_ERROR: i32 = 0;

    /// The device is not running.
    pub const NOT_RUNNING: i32 = fourcc(b"stop") as i32;

    /// Unspecified error.
    pub const UNSPECIFIED: i32 = fourcc(b"what") as i32;

    /// Unknown property.
    pub const UNKNOWN_PROPERTY: i32 = fourcc(b"who?") as i32;

    /// Wrong size for the property data.
    pub const BAD_PROPERTY_SIZE: i32 = fourcc(b"!siz") as i32;

    /// Operation cannot be performed.
    pub const ILLEGAL_OPERATION: i32 = fourcc(b"nope") as i32;

    /// Object ID does not map to a valid object.
    pub const BAD_OBJECT: i32 = fourcc(b"!obj") as i32;

    /// Operation is not supported.
    pub const UNSUPPORTED_OPERATION: i32 = fourcc(b"unop") as i32;

    /// Stream format is not supported.
    pub const UNSUPPORTED_FORMAT: i32 = fourcc(b"!dat") as i32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::device;

    #[test]
    fn test_status_codes() {
        assert_eq!(EngineError::InvalidObject(99).status(), 0x216F_626A);
        assert_eq!(
            EngineError::BufferTooSmall {
                needed: 8,
                available: 4
            }
            .status(),
            status::BAD_PROPERTY_SIZE
        );
        assert_eq!(EngineError::NotRunning(3).status(), status::NOT_RUNNING);
    }

    #[test]
    fn test_display_renders_selector() {
        let err = EngineError::NotSettable {
            object: 3,
            selector: device::IS_ALIVE,
        };
        assert_eq!(err.to_string(), "selector 'livn' is not settable on object 3");
    }
}
