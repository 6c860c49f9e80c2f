//! Stream formats, value ranges and channel layouts, with their host memory
//! layouts.
//!
//! The host exchanges these as plain C structs in native byte order. The
//! engine keeps them as Rust values and only flattens them when a property
//! is read or parsed when a property is written.

use crate::error::{EngineError, EngineResult};
use crate::selectors::{format_flags, layout, FORMAT_LINEAR_PCM};

/// Bytes per interleaved sample (32-bit float).
pub const BYTES_PER_SAMPLE: u32 = 4;

// =============================================================================
// Stream format
// =============================================================================

/// An `AudioStreamBasicDescription`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub sample_rate: f64,
    pub format_id: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
}

impl StreamFormat {
    /// Size of the C struct, including its trailing reserved field.
    pub const BYTE_SIZE: usize = 40;

    /// Packed native-endian interleaved 32-bit float.
    pub const fn float32(sample_rate: f64, channels: u32) -> Self {
        Self {
            sample_rate,
            format_id: FORMAT_LINEAR_PCM,
            format_flags: format_flags::NATIVE_FLOAT_PACKED,
            bytes_per_packet: BYTES_PER_SAMPLE * channels,
            frames_per_packet: 1,
            bytes_per_frame: BYTES_PER_SAMPLE * channels,
            channels_per_frame: channels,
            bits_per_channel: BYTES_PER_SAMPLE * 8,
        }
    }

    /// Check that this is the one layout the engine moves: linear PCM,
    /// packed native float, 32 bits, `channels` per frame.
    ///
    /// The sample rate is not checked here.
    pub fn check_layout(&self, channels: u32) -> EngineResult<()> {
        if self.format_id != FORMAT_LINEAR_PCM {
            return Err(EngineError::UnsupportedFormat("not linear PCM"));
        }
        if self.format_flags != format_flags::NATIVE_FLOAT_PACKED {
            return Err(EngineError::UnsupportedFormat(
                "flags are not packed native-endian float",
            ));
        }
        if self.bits_per_channel != BYTES_PER_SAMPLE * 8 {
            return Err(EngineError::UnsupportedFormat("not 32 bits per channel"));
        }
        if self.channels_per_frame != channels {
            return Err(EngineError::UnsupportedFormat("wrong channel count"));
        }
        let frame_bytes = BYTES_PER_SAMPLE * channels;
        if self.frames_per_packet != 1
            || self.bytes_per_frame != frame_bytes
            || self.bytes_per_packet != frame_bytes
        {
            return Err(EngineError::UnsupportedFormat("not packed"));
        }
        Ok(())
    }

    pub(crate) fn write(&self, out: &mut ByteWriter<'_>) {
        out.put_f64(self.sample_rate);
        out.put_u32(self.format_id);
        out.put_u32(self.format_flags);
        out.put_u32(self.bytes_per_packet);
        out.put_u32(self.frames_per_packet);
        out.put_u32(self.bytes_per_frame);
        out.put_u32(self.channels_per_frame);
        out.put_u32(self.bits_per_channel);
        out.put_u32(0);
    }

    /// Parse a format from host memory.
    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        if bytes.len() != Self::BYTE_SIZE {
            return Err(EngineError::BadPropertySize {
                expected: Self::BYTE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut input = ByteReader::new(bytes);
        Ok(Self {
            sample_rate: input.f64(),
            format_id: input.u32(),
            format_flags: input.u32(),
            bytes_per_packet: input.u32(),
            frames_per_packet: input.u32(),
            bytes_per_frame: input.u32(),
            channels_per_frame: input.u32(),
            bits_per_channel: input.u32(),
        })
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// An `AudioValueRange`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl ValueRange {
    pub const BYTE_SIZE: usize = 16;

    pub const fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    /// A range holding exactly one value.
    pub const fn point(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.minimum && value <= self.maximum
    }

    pub(crate) fn write(&self, out: &mut ByteWriter<'_>) {
        out.put_f64(self.minimum);
        out.put_f64(self.maximum);
    }
}

/// An `AudioStreamRangedDescription`: a format plus the rates it applies to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedFormat {
    pub format: StreamFormat,
    pub rate_range: ValueRange,
}

impl RangedFormat {
    pub const BYTE_SIZE: usize = StreamFormat::BYTE_SIZE + ValueRange::BYTE_SIZE;

    pub(crate) fn write(&self, out: &mut ByteWriter<'_>) {
        self.format.write(out);
        self.rate_range.write(out);
    }
}

// =============================================================================
// Channel layout
// =============================================================================

/// An `AudioChannelDescription`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelDescription {
    pub label: u32,
    pub flags: u32,
    pub coordinates: [f32; 3],
}

impl ChannelDescription {
    pub const BYTE_SIZE: usize = 20;

    pub const fn labeled(label: u32) -> Self {
        Self {
            label,
            flags: 0,
            coordinates: [0.0; 3],
        }
    }
}

/// An `AudioChannelLayout` described channel by channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLayout {
    pub descriptions: Vec<ChannelDescription>,
}

impl ChannelLayout {
    /// Size of the fixed header (tag, bitmap, description count).
    pub const HEADER_SIZE: usize = 12;

    /// Left/right for the first two channels, discrete labels for the rest.
    pub fn for_channels(channels: u32) -> Self {
        let descriptions = (0..channels)
            .map(|channel| {
                let label = match channel {
                    0 => layout::LABEL_LEFT,
                    1 => layout::LABEL_RIGHT,
                    n => layout::LABEL_DISCRETE_0 | n,
                };
                ChannelDescription::labeled(label)
            })
            .collect();
        Self { descriptions }
    }

    pub fn byte_size(&self) -> usize {
        Self::HEADER_SIZE + self.descriptions.len() * ChannelDescription::BYTE_SIZE
    }

    pub(crate) fn write(&self, out: &mut ByteWriter<'_>) {
        out.put_u32(layout::TAG_USE_CHANNEL_DESCRIPTIONS);
        out.put_u32(0);
        out.put_u32(self.descriptions.len() as u32);
        for description in &self.descriptions {
            out.put_u32(description.label);
            out.put_u32(description.flags);
            for coordinate in description.coordinates {
                out.put_f32(coordinate);
            }
        }
    }
}

// =============================================================================
// Native-endian cursors
// =============================================================================

/// Sequential native-endian writer over a caller-sized buffer.
///
/// Callers size the buffer from `byte_size()` first, so a write past the end
/// is a bug in the size computation; such writes are dropped and reported by
/// [`ByteWriter::overflowed`].
pub(crate) struct ByteWriter<'a> {
    out: &'a mut [u8],
    position: usize,
    overflowed: bool,
}

impl<'a> ByteWriter<'a> {
    pub(crate) fn new(out: &'a mut [u8]) -> Self {
        Self {
            out,
            position: 0,
            overflowed: false,
        }
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        match self.out.get_mut(self.position..end) {
            Some(slot) => {
                slot.copy_from_slice(bytes);
                self.position = end;
            }
            None => self.overflowed = true,
        }
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        self.put(&value.to_ne_bytes());
    }

    pub(crate) fn put_f32(&mut self, value: f32) {
        self.put(&value.to_ne_bytes());
    }

    pub(crate) fn put_f64(&mut self, value: f64) {
        self.put(&value.to_ne_bytes());
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn overflowed(&self) -> bool {
        self.overflowed
    }
}

/// Sequential native-endian reader. Length is checked by the caller.
struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut value = [0u8; N];
        let (head, tail) = self.bytes.split_at(N.min(self.bytes.len()));
        value[..head.len()].copy_from_slice(head);
        self.bytes = tail;
        value
    }

    fn u32(&mut self) -> u32 {
        u32::from_ne_bytes(self.take())
    }

    fn f64(&mut self) -> f64 {
        f64::from_ne_bytes(self.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(format: &StreamFormat) -> Vec<u8> {
        let mut bytes = vec![0u8; StreamFormat::BYTE_SIZE];
        let mut out = ByteWriter::new(&mut bytes);
        format.write(&mut out);
        assert_eq!(out.position(), StreamFormat::BYTE_SIZE);
        bytes
    }

    #[test]
    fn test_float32_layout_passes_check() {
        let format = StreamFormat::float32(48_000.0, 2);
        assert_eq!(format.bytes_per_frame, 8);
        assert!(format.check_layout(2).is_ok());
        assert!(format.check_layout(4).is_err());
    }

    #[test]
    fn test_format_parses_back() {
        let format = StreamFormat::float32(96_000.0, 8);
        let parsed = StreamFormat::from_bytes(&encode(&format)).unwrap();
        assert_eq!(parsed, format);
    }

    #[test]
    fn test_format_wrong_size_rejected() {
        let result = StreamFormat::from_bytes(&[0u8; 39]);
        assert!(matches!(
            result,
            Err(EngineError::BadPropertySize {
                expected: 40,
                actual: 39
            })
        ));
    }

    #[test]
    fn test_integer_format_rejected() {
        let mut format = StreamFormat::float32(48_000.0, 2);
        format.format_flags = format_flags::IS_PACKED;
        assert!(matches!(
            format.check_layout(2),
            Err(EngineError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_channel_layout_labels() {
        let layout = ChannelLayout::for_channels(4);
        assert_eq!(layout.byte_size(), 12 + 4 * 20);
        assert_eq!(layout.descriptions[0].label, layout::LABEL_LEFT);
        assert_eq!(layout.descriptions[1].label, layout::LABEL_RIGHT);
        assert_eq!(layout.descriptions[3].label, layout::LABEL_DISCRETE_0 | 3);
    }

    #[test]
    fn test_writer_reports_overflow() {
        let mut bytes = [0u8; 6];
        let mut out = ByteWriter::new(&mut bytes);
        out.put_u32(1);
        out.put_u32(2);
        assert!(out.overflowed());
        assert_eq!(out.position(), 4);
    }
}
