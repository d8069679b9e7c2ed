/// Interleaved mixdown accumulator with a fixed frame capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct MixBuffer {
    channels: usize,
    samples: Vec<f32>,
}

impl MixBuffer {
    /// Silent buffer of `frames` frames.
    pub fn new(frames: usize, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            samples: vec![0.0; frames * channels],
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Add `block * gain` starting at `frame_offset`.
    ///
    /// Samples past the end of the buffer are dropped. Returns the number of
    /// frames in `block`.
    pub fn add_scaled(&mut self, frame_offset: usize, block: &[f32], gain: f32) -> usize {
        let start = (frame_offset * self.channels).min(self.samples.len());
        for (dst, src) in self.samples[start..].iter_mut().zip(block) {
            *dst += src * gain;
        }
        block.len() / self.channels
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Scale the buffer down so its peak is 1.0 if it currently exceeds it.
    ///
    /// Returns whether any scaling happened.
    pub fn normalize(&mut self) -> bool {
        let peak = self.peak();
        if peak <= 1.0 {
            return false;
        }
        for sample in &mut self.samples {
            *sample /= peak;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_accumulate_at_their_offset() {
        let mut buffer = MixBuffer::new(4, 2);
        assert_eq!(buffer.add_scaled(0, &[1.0, 1.0, 1.0, 1.0], 0.5), 2);
        assert_eq!(buffer.add_scaled(2, &[1.0, -1.0, 1.0, -1.0, 9.0, 9.0], 1.0), 3);
        assert_eq!(buffer.samples(), &[0.5, 0.5, 0.5, 0.5, 1.0, -1.0, 1.0, -1.0]);
        assert_eq!(buffer.frames(), 4);
    }

    #[test]
    fn silent_buffer_is_left_alone() {
        let mut buffer = MixBuffer::new(16, 2);
        assert_eq!(buffer.peak(), 0.0);
        assert!(!buffer.normalize());
        assert!(buffer.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn peaks_above_unity_are_scaled_down() {
        let mut buffer = MixBuffer::new(3, 1);
        buffer.add_scaled(0, &[0.5, -2.0, 1.0], 1.0);
        let original = buffer.samples().to_vec();

        assert!(buffer.normalize());
        assert_eq!(buffer.peak(), 1.0);
        for (normalized, original) in buffer.samples().iter().zip(&original) {
            assert_eq!(*normalized, original / 2.0);
        }
    }

    #[test]
    fn peaks_at_unity_are_untouched() {
        let mut buffer = MixBuffer::new(2, 1);
        buffer.add_scaled(0, &[1.0, -0.25], 1.0);
        assert!(!buffer.normalize());
        assert_eq!(buffer.samples(), &[1.0, -0.25]);
    }
}
