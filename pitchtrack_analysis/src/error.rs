use thiserror::Error;

/// Reasons for which an analysis pass refuses its input.
///
/// None of these are fatal for a caller that uses [`crate::PitchAnalyzer::analyze`], which turns
/// them into an empty pitch track.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("the signal contains no samples")]
    EmptySignal,

    #[error("sample rate must be positive, got {0} Hz")]
    InvalidSampleRate(u32),

    #[error("invalid frequency band [{fmin} Hz, {fmax} Hz]")]
    InvalidBand { fmin: f32, fmax: f32 },

    #[error("upper frequency {fmax} Hz is too close to the Nyquist frequency {nyquist} Hz")]
    AboveNyquist { fmax: f32, nyquist: f32 },

    #[error("a frame of {frame_len} samples cannot hold two periods of {fmin} Hz")]
    FrameTooShort { frame_len: usize, fmin: f32 },

    #[error("invalid frame geometry: frame length {frame_len}, hop {hop}")]
    InvalidFrameGeometry { frame_len: usize, hop: usize },
}
