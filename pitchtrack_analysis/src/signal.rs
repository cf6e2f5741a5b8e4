use std::sync::Arc;

/// A mono recording at a fixed sample rate.
///
/// The samples are reference counted and never mutated, so cloning a `Signal` to hand it to
/// several analysis passes is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Converts 16 bit PCM to samples in [-1, 1).
    pub fn from_i16(samples: &[i16], sample_rate: u32) -> Self {
        Self::new(
            samples
                .iter()
                .map(|s| *s as f32 / 32768.0)
                .collect::<Vec<f32>>(),
            sample_rate,
        )
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the recording in seconds.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Number of frames of `frame_len` samples, `hop` samples apart.
    ///
    /// Frames start at `0, hop, 2 * hop, ...` as long as the start lies before
    /// `len - frame_len`, so a signal no longer than one frame yields no frames at all.
    pub fn frame_count(&self, frame_len: usize, hop: usize) -> usize {
        if hop == 0 || self.samples.len() <= frame_len {
            return 0;
        }
        (self.samples.len() - frame_len).div_ceil(hop)
    }

    /// The `index`th frame, or `None` if it does not exist.
    pub fn frame(&self, index: usize, frame_len: usize, hop: usize) -> Option<&[f32]> {
        if index >= self.frame_count(frame_len, hop) {
            return None;
        }
        let start = index * hop;
        Some(&self.samples[start..start + frame_len])
    }

    /// Time offset of the `index`th frame's first sample, in seconds.
    pub fn frame_time(&self, index: usize, hop: usize) -> f32 {
        (index * hop) as f32 / self.sample_rate as f32
    }

    /// Returns a new signal with the same sample rate.
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self::new(samples, self.sample_rate)
    }
}
