//! Typed property values and qualifiers.

use std::borrow::Cow;

use crate::error::{EngineError, EngineResult};
use crate::format::{ByteWriter, ChannelLayout, RangedFormat, StreamFormat, ValueRange};
use crate::selectors::{control, object, plugin};
use crate::types::{ObjectId, PropertyAddress};

/// The value of a property, before it is flattened into host memory.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyData {
    U32(u32),
    F32(f32),
    F64(f64),
    ObjectList(Vec<ObjectId>),
    U32List(Vec<u32>),
    /// A string. The host receives it as an object reference, so its size
    /// is that of a pointer; the ABI layer creates the reference.
    Text(Cow<'static, str>),
    ValueRange(ValueRange),
    ValueRanges(Vec<ValueRange>),
    StreamFormat(StreamFormat),
    RangedFormats(Vec<RangedFormat>),
    ChannelLayout(ChannelLayout),
}

impl PropertyData {
    pub fn text(value: impl Into<Cow<'static, str>>) -> Self {
        Self::Text(value.into())
    }

    pub fn bool(value: bool) -> Self {
        Self::U32(u32::from(value))
    }

    /// Number of bytes the value occupies in host memory.
    pub fn byte_size(&self) -> usize {
        match self {
            Self::U32(_) | Self::F32(_) => 4,
            Self::F64(_) => 8,
            Self::ObjectList(list) | Self::U32List(list) => list.len() * 4,
            Self::Text(_) => std::mem::size_of::<usize>(),
            Self::ValueRange(_) => ValueRange::BYTE_SIZE,
            Self::ValueRanges(ranges) => ranges.len() * ValueRange::BYTE_SIZE,
            Self::StreamFormat(_) => StreamFormat::BYTE_SIZE,
            Self::RangedFormats(formats) => formats.len() * RangedFormat::BYTE_SIZE,
            Self::ChannelLayout(layout) => layout.byte_size(),
        }
    }

    /// Flatten the value into `out` in native byte order and return the
    /// number of bytes written.
    ///
    /// Text cannot be flattened here; it needs an object reference created
    /// by the ABI layer.
    pub fn write_bytes(&self, out: &mut [u8]) -> EngineResult<usize> {
        let size = self.byte_size();
        if out.len() < size {
            return Err(EngineError::BufferTooSmall {
                needed: size,
                available: out.len(),
            });
        }

        let mut writer = ByteWriter::new(&mut out[..size]);
        match self {
            Self::U32(value) => writer.put_u32(*value),
            Self::F32(value) => writer.put_f32(*value),
            Self::F64(value) => writer.put_f64(*value),
            Self::ObjectList(list) | Self::U32List(list) => {
                for value in list {
                    writer.put_u32(*value);
                }
            }
            Self::Text(_) => {
                return Err(EngineError::IllegalOperation(
                    "text must be converted to a host string",
                ))
            }
            Self::ValueRange(range) => range.write(&mut writer),
            Self::ValueRanges(ranges) => ranges.iter().for_each(|r| r.write(&mut writer)),
            Self::StreamFormat(format) => format.write(&mut writer),
            Self::RangedFormats(formats) => formats.iter().for_each(|f| f.write(&mut writer)),
            Self::ChannelLayout(layout) => layout.write(&mut writer),
        }
        debug_assert!(!writer.overflowed());
        Ok(writer.position())
    }
}

/// Extra input accompanying a property query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Qualifier<'a> {
    None,
    /// A UID to translate into an object ID.
    Uid(&'a str),
    /// A selector control item ID.
    Item(u32),
    /// A value to convert (scalar/decibel conversions).
    Value(f32),
    /// Class IDs restricting an owned-objects query.
    Classes(&'a [u32]),
}

/// How the ABI layer must decode the qualifier (or in/out value) for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierKind {
    None,
    /// Qualifier holds a string reference.
    Uid,
    /// Qualifier holds a `u32` item ID.
    Item,
    /// The data buffer holds an `f32` input value that is overwritten.
    InOutValue,
    /// Qualifier holds an array of class IDs (possibly empty).
    Classes,
}

impl QualifierKind {
    pub fn for_selector(selector: u32) -> Self {
        match selector {
            plugin::TRANSLATE_UID_TO_DEVICE | plugin::TRANSLATE_UID_TO_BOX => Self::Uid,
            control::ITEM_NAME => Self::Item,
            control::CONVERT_SCALAR_TO_DECIBELS | control::CONVERT_DECIBELS_TO_SCALAR => {
                Self::InOutValue
            }
            object::OWNED_OBJECTS => Self::Classes,
            _ => Self::None,
        }
    }
}

/// A property whose value changed, for host notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChange {
    pub object: ObjectId,
    pub address: PropertyAddress,
}

impl PropertyChange {
    pub fn new(object: ObjectId, address: PropertyAddress) -> Self {
        Self { object, address }
    }
}

// =============================================================================
// Payload parsing
// =============================================================================

fn exact<const N: usize>(bytes: &[u8]) -> EngineResult<[u8; N]> {
    bytes.try_into().map_err(|_| EngineError::BadPropertySize {
        expected: N,
        actual: bytes.len(),
    })
}

/// Parse a `u32` set-data payload.
pub fn parse_u32(bytes: &[u8]) -> EngineResult<u32> {
    exact::<4>(bytes).map(u32::from_ne_bytes)
}

/// Parse an `f32` set-data payload.
pub fn parse_f32(bytes: &[u8]) -> EngineResult<f32> {
    exact::<4>(bytes).map(f32::from_ne_bytes)
}

/// Parse an `f64` set-data payload.
pub fn parse_f64(bytes: &[u8]) -> EngineResult<f64> {
    exact::<8>(bytes).map(f64::from_ne_bytes)
}
