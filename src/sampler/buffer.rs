// Decoded buffer - Interleaved f32 PCM ready for playback

/// Decoded, interleaved PCM
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedBuffer {
    /// Build from interleaved samples; a trailing partial frame is dropped
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let frames = samples.len() / channels as usize;
        samples.truncate(frames * channels as usize);
        Self {
            samples,
            sample_rate: sample_rate.max(1),
            channels,
        }
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample of `channel` at `frame`; mono buffers answer every channel
    #[inline]
    pub fn frame_value(&self, frame: usize, channel: usize) -> f32 {
        let ch = if self.channels == 1 {
            0
        } else {
            channel.min(self.channels as usize - 1)
        };
        self.samples
            .get(frame * self.channels as usize + ch)
            .copied()
            .unwrap_or(0.0)
    }

    /// Linear interpolation at a fractional frame position
    #[inline]
    pub fn interpolate(&self, position: f64, channel: usize) -> f32 {
        if position < 0.0 {
            return 0.0;
        }
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let a = self.frame_value(index, channel);
        let b = self.frame_value(index + 1, channel);
        a + (b - a) * frac
    }

    /// Copy with frame order reversed (channel order within a frame is kept)
    pub fn reversed(&self) -> Self {
        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let buffer = DecodedBuffer::new(vec![0.0; 96_000], 48_000, 2);
        assert_eq!(buffer.frames(), 48_000);
        assert!((buffer.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let buffer = DecodedBuffer::new(vec![0.0; 5], 100, 2);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.samples().len(), 4);
    }

    #[test]
    fn test_reversed_keeps_channel_order() {
        let buffer = DecodedBuffer::new(vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 10, 2);
        let rev = buffer.reversed();
        assert_eq!(rev.samples(), &[3.0, -3.0, 2.0, -2.0, 1.0, -1.0]);
        assert_eq!(rev.duration(), buffer.duration());
    }

    #[test]
    fn test_interpolate() {
        let buffer = DecodedBuffer::from_mono(vec![0.0, 1.0, 0.0], 10);
        assert_eq!(buffer.interpolate(0.5, 0), 0.5);
        assert_eq!(buffer.interpolate(1.0, 1), 1.0);
        assert_eq!(buffer.interpolate(2.5, 0), 0.0);
        assert_eq!(buffer.interpolate(-1.0, 0), 0.0);
    }
}
