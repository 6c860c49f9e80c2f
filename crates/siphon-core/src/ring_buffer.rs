//! Fixed-capacity circular sample storage shared by a device pair.
//!
//! Frames are addressed by absolute sample time; the storage offset is the
//! sample time modulo the capacity. A write followed by a read at the same
//! sample time within one I/O cycle returns the written frames, which is
//! what gives the loopback zero added latency. No staleness check is made:
//! reading a span that has not been written this cycle returns whatever an
//! earlier cycle left there.

use crate::control::StreamGain;
use crate::error::{EngineError, EngineResult};

/// Interleaved 32-bit float ring buffer.
#[derive(Debug)]
pub struct RingBuffer {
    samples: Vec<f32>,
    capacity_frames: usize,
    channel_count: usize,
    latency_frames: usize,
}

impl RingBuffer {
    /// Allocate a zero-filled buffer of `base_frames + latency_frames` frames.
    ///
    /// Allocation is fallible: an allocator refusal is reported as
    /// [`EngineError::AllocationFailed`] instead of aborting the host process.
    pub fn initialize(
        base_frames: usize,
        channel_count: usize,
        latency_frames: usize,
    ) -> EngineResult<Self> {
        let capacity_frames = base_frames
            .checked_add(latency_frames)
            .ok_or(EngineError::AllocationFailed("ring buffer size overflows"))?;
        if capacity_frames == 0 || channel_count == 0 {
            return Err(EngineError::InvalidValue("ring buffer has no frames"));
        }
        let len = capacity_frames
            .checked_mul(channel_count)
            .ok_or(EngineError::AllocationFailed("ring buffer size overflows"))?;

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|_| EngineError::AllocationFailed("ring buffer storage"))?;
        samples.resize(len, 0.0);

        Ok(Self {
            samples,
            capacity_frames,
            channel_count,
            latency_frames,
        })
    }

    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn latency_frames(&self) -> usize {
        self.latency_frames
    }

    /// Zero-fill the whole store.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Copy `frame_count` frames from `source` into the buffer at `sample_time`,
    /// applying `gain` in the same pass.
    pub fn write(
        &mut self,
        source: &[f32],
        sample_time: u64,
        frame_count: usize,
        gain: StreamGain,
    ) -> EngineResult<()> {
        let len = self.check_span(source.len(), frame_count)?;
        let (first, second) = self.split(sample_time, len);

        let (head, tail) = source[..len].split_at(first.len());
        apply(&mut self.samples[first], head, gain);
        apply(&mut self.samples[second], tail, gain);
        Ok(())
    }

    /// Copy `frame_count` frames at `sample_time` into `dest`, applying `gain`
    /// in the same pass. A muted stream reads silence.
    pub fn read(
        &self,
        dest: &mut [f32],
        sample_time: u64,
        frame_count: usize,
        gain: StreamGain,
    ) -> EngineResult<()> {
        let len = self.check_span(dest.len(), frame_count)?;
        let (first, second) = self.split(sample_time, len);

        let (head, tail) = dest[..len].split_at_mut(first.len());
        apply(head, &self.samples[first], gain);
        apply(tail, &self.samples[second], gain);
        Ok(())
    }

    /// Validate a span and return its length in samples.
    fn check_span(&self, available: usize, frame_count: usize) -> EngineResult<usize> {
        if frame_count > self.capacity_frames {
            return Err(EngineError::InvalidValue("frame count exceeds ring capacity"));
        }
        let len = frame_count * self.channel_count;
        if available < len {
            return Err(EngineError::BufferTooSmall {
                needed: len * std::mem::size_of::<f32>(),
                available: available * std::mem::size_of::<f32>(),
            });
        }
        Ok(len)
    }

    /// Sample ranges covered by a span of `len` samples starting at
    /// `sample_time`, split at the end of the store.
    fn split(
        &self,
        sample_time: u64,
        len: usize,
    ) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let offset_frames = (sample_time % self.capacity_frames as u64) as usize;
        let start = offset_frames * self.channel_count;
        let first_len = len.min(self.samples.len() - start);
        (start..start + first_len, 0..len - first_len)
    }
}

/// Copy `src` into `dst` scaled by `gain`.
#[inline]
fn apply(dst: &mut [f32], src: &[f32], gain: StreamGain) {
    if gain.is_silent() {
        dst.fill(0.0);
    } else if gain.is_unity() {
        dst.copy_from_slice(src);
    } else {
        for (out, sample) in dst.iter_mut().zip(src) {
            *out = sample * gain.scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32 * 0.25 - 3.0).collect()
    }

    #[test]
    fn test_initialize_zero_filled() {
        let ring = RingBuffer::initialize(16, 2, 4).unwrap();
        assert_eq!(ring.capacity_frames(), 20);
        assert_eq!(ring.latency_frames(), 4);
        let mut out = vec![1.0f32; 40];
        ring.read(&mut out, 0, 20, StreamGain::UNITY).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_write_then_read_same_time() {
        let mut ring = RingBuffer::initialize(64, 2, 0).unwrap();
        let frames = ramp(2 * 10);
        ring.write(&frames, 1_000, 10, StreamGain::UNITY).unwrap();

        let mut out = vec![0.0f32; 20];
        ring.read(&mut out, 1_000, 10, StreamGain::UNITY).unwrap();
        assert_eq!(out, frames);
    }

    #[test]
    fn test_wraparound_bit_exact() {
        let mut ring = RingBuffer::initialize(32, 2, 0).unwrap();
        // Starts 5 frames before the end of the store and wraps by 7.
        let frames: Vec<f32> = (0..24).map(|i| f32::from_bits(0x3F80_0000 + i * 977)).collect();
        ring.write(&frames, 32 * 3 + 27, 12, StreamGain::UNITY).unwrap();

        let mut out = vec![0.0f32; 24];
        ring.read(&mut out, 32 * 3 + 27, 12, StreamGain::UNITY).unwrap();
        let bits = |v: &[f32]| v.iter().map(|s| s.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&out), bits(&frames));
    }

    #[test]
    fn test_full_capacity_span() {
        let mut ring = RingBuffer::initialize(8, 1, 0).unwrap();
        let frames = ramp(8);
        ring.write(&frames, 5, 8, StreamGain::UNITY).unwrap();
        let mut out = vec![0.0f32; 8];
        ring.read(&mut out, 13, 8, StreamGain::UNITY).unwrap();
        assert_eq!(out, frames);
    }

    #[test]
    fn test_read_applies_scale() {
        let mut ring = RingBuffer::initialize(16, 2, 0).unwrap();
        ring.write(&[0.5, -0.5, 1.0, -1.0], 0, 2, StreamGain::UNITY)
            .unwrap();
        let mut out = [0.0f32; 4];
        let half = StreamGain {
            scale: 0.5,
            muted: false,
        };
        ring.read(&mut out, 0, 2, half).unwrap();
        assert_eq!(out, [0.25, -0.25, 0.5, -0.5]);
    }

    #[test]
    fn test_muted_read_is_silent() {
        let mut ring = RingBuffer::initialize(16, 2, 0).unwrap();
        ring.write(&[0.5; 8], 0, 4, StreamGain::UNITY).unwrap();
        let mut out = [9.0f32; 8];
        ring.read(&mut out, 0, 4, StreamGain::MUTED).unwrap();
        assert_eq!(out, [0.0; 8]);
    }

    #[test]
    fn test_muted_write_stores_silence() {
        let mut ring = RingBuffer::initialize(16, 1, 0).unwrap();
        ring.write(&[0.5; 4], 0, 4, StreamGain::UNITY).unwrap();
        ring.write(&[0.5; 4], 0, 4, StreamGain::MUTED).unwrap();
        let mut out = [9.0f32; 4];
        ring.read(&mut out, 0, 4, StreamGain::UNITY).unwrap();
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_clear() {
        let mut ring = RingBuffer::initialize(4, 1, 0).unwrap();
        ring.write(&[1.0; 4], 0, 4, StreamGain::UNITY).unwrap();
        ring.clear();
        let mut out = [9.0f32; 4];
        ring.read(&mut out, 0, 4, StreamGain::UNITY).unwrap();
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_span_errors() {
        let mut ring = RingBuffer::initialize(4, 2, 0).unwrap();
        assert!(matches!(
            ring.write(&[0.0; 10], 0, 5, StreamGain::UNITY),
            Err(EngineError::InvalidValue(_))
        ));
        assert!(matches!(
            ring.write(&[0.0; 3], 0, 2, StreamGain::UNITY),
            Err(EngineError::BufferTooSmall {
                needed: 16,
                available: 12
            })
        ));
    }

    #[test]
    fn test_zero_frames_is_noop() {
        let mut ring = RingBuffer::initialize(4, 2, 0).unwrap();
        assert!(ring.write(&[], 3, 0, StreamGain::UNITY).is_ok());
        assert!(ring.read(&mut [], 3, 0, StreamGain::UNITY).is_ok());
    }
}
