/// Analysis modules - the stages of the pitch tracking pipeline, organized by function.
///
/// Each stage is a set of pure functions over slices of pitch estimates, so they can be run,
/// tested and swapped independently of the pipeline in [`crate::analysis`].

pub mod hybrid;
pub mod peak_detection;
pub mod smoothing;
pub mod yin;

// Re-export commonly used types
pub use hybrid::{correct_harmonic, hybrid_track, interpolate_at, merge, resample};
pub use peak_detection::{dominant_frequency, spectral_peak_track, SpectralPeakTrack};
pub use smoothing::{median_filter, moving_average, smooth};
pub use yin::{frame_pitch, yin_estimate, yin_pitch, yin_track, YinEstimate};
