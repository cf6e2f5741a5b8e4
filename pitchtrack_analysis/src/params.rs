use crate::error::AnalysisError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The sample rate that recordings are captured with.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Number of samples per YIN frame.
pub const FRAME: usize = 2048;
/// Number of samples between the starts of two consecutive YIN frames.
pub const HOP: usize = 512;

/// Lower edge of the band-limiting filter. Everything below is rumble.
pub const FILTER_FMIN: f32 = 20.0;

/// A closed frequency interval in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencyBand {
    pub fmin: f32,
    pub fmax: f32,
}

impl FrequencyBand {
    pub const fn new(fmin: f32, fmax: f32) -> Self {
        Self { fmin, fmax }
    }

    pub fn contains(&self, f: f32) -> bool {
        f >= self.fmin && f <= self.fmax
    }

    pub fn is_valid(&self) -> bool {
        self.fmin.is_finite() && self.fmax.is_finite() && self.fmin > 0.0 && self.fmin < self.fmax
    }
}

/// Selects the frequency range of an analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AnalysisMode {
    /// Voice and most melodic instruments, 50 - 2000 Hz.
    #[default]
    Low,
    /// Everything up to 20 kHz.
    Full,
}

impl AnalysisMode {
    /// The band searched by the pitch estimators.
    pub fn band(&self) -> FrequencyBand {
        match self {
            AnalysisMode::Low => FrequencyBand::new(50.0, 2000.0),
            AnalysisMode::Full => FrequencyBand::new(50.0, 20000.0),
        }
    }

    /// The preferred upper edge of the band-limiting filter applied to the recording.
    ///
    /// In low mode the filter is kept wider than the search band so that the overtones that
    /// YIN relies on survive the filtering. See [`AnalysisParameters::filter_fmax`] for the edge
    /// that is actually used at a given sample rate.
    pub fn filter_fmax(&self) -> f32 {
        match self {
            AnalysisMode::Low => 5000.0,
            AnalysisMode::Full => 20000.0,
        }
    }

    /// Upper limit of the frequency axis when the track is displayed.
    pub fn display_cap(&self) -> Option<f32> {
        match self {
            AnalysisMode::Low => Some(5000.0),
            AnalysisMode::Full => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct YinParameters {
    /// Frames whose cumulative mean normalized difference first dips below this value are
    /// accepted as periodic.
    pub threshold: f32,
    /// Frames with an RMS below this value (after removing the mean) are considered silent.
    pub silence_rms: f32,
    /// The minimum number of complete periods that have to fit into a frame.
    pub min_cycles: f32,
    /// An estimate is dropped when the difference value at its lag exceeds
    /// `confidence_factor * threshold`.
    pub confidence_factor: f32,
}

impl Default for YinParameters {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            silence_rms: 0.01,
            min_cycles: 2.0,
            confidence_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpectralPeakParameters {
    /// Size of the short time fourier transform.
    pub n_fft: usize,
    /// Number of samples between two spectrogram columns.
    pub step: usize,
    /// Columns whose loudest bin stays below this level (dB) carry no pitch.
    pub threshold_db: f32,
    /// The minimum prominence (dB) of a spectral peak.
    pub min_prominence_db: f32,
}

impl Default for SpectralPeakParameters {
    fn default() -> Self {
        Self {
            n_fft: 4096,
            step: 256,
            threshold_db: -80.0,
            min_prominence_db: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HybridParameters {
    /// Number of frames on each side of a filled gap that are consulted for a reference pitch.
    pub context_frames: usize,
    /// Relative tolerance when comparing a value against a harmonic multiple.
    pub harmonic_tolerance: f32,
    /// Harmonic factors checked, in this order.
    pub harmonic_factors: Vec<u32>,
}

impl Default for HybridParameters {
    fn default() -> Self {
        Self {
            context_frames: 10,
            harmonic_tolerance: 0.1,
            harmonic_factors: vec![2, 3, 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SmoothingParameters {
    /// Width of the median filter window, in frames.
    pub median_window: usize,
    /// Width of the moving average window, in frames.
    pub mean_window: usize,
}

impl Default for SmoothingParameters {
    fn default() -> Self {
        Self {
            median_window: 5,
            mean_window: 3,
        }
    }
}

/// Every tunable constant of the analysis pipeline.
///
/// The sample rate is not part of the parameters, it always comes with the [`crate::Signal`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisParameters {
    pub mode: AnalysisMode,
    /// The length of a YIN frame in samples.
    pub frame_len: usize,
    /// The distance between two YIN frames in samples.
    pub hop: usize,
    /// The filter's upper edge must stay below `nyquist_margin` times the Nyquist frequency.
    pub nyquist_margin: f32,
    pub yin: YinParameters,
    pub spectral: SpectralPeakParameters,
    pub hybrid: HybridParameters,
    pub smoothing: SmoothingParameters,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            frame_len: FRAME,
            hop: HOP,
            nyquist_margin: 0.95,
            yin: YinParameters::default(),
            spectral: SpectralPeakParameters::default(),
            hybrid: HybridParameters::default(),
            smoothing: SmoothingParameters::default(),
        }
    }
}

impl AnalysisParameters {
    pub fn with_mode(mode: AnalysisMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn band(&self) -> FrequencyBand {
        self.mode.band()
    }

    /// The upper edge of the band-limiting filter at `sample_rate`.
    ///
    /// Low mode only needs the filter to be wider than its search band, so the edge is lowered
    /// to `nyquist_margin` times the Nyquist frequency for low sample rates. Full mode always
    /// filters at its preferred edge.
    pub fn filter_fmax(&self, sample_rate: u32) -> f32 {
        let limit = self.nyquist_margin * sample_rate as f32 / 2.0;
        match self.mode {
            AnalysisMode::Low => self.mode.filter_fmax().min(limit),
            AnalysisMode::Full => self.mode.filter_fmax(),
        }
    }

    /// Checks that the parameters can be used on a signal with the given sample rate.
    pub fn validate(&self, sample_rate: u32) -> Result<(), AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if self.frame_len < 2 || self.hop == 0 {
            return Err(AnalysisError::InvalidFrameGeometry {
                frame_len: self.frame_len,
                hop: self.hop,
            });
        }
        if self.spectral.n_fft < 2 || self.spectral.step == 0 || self.spectral.step > self.spectral.n_fft {
            return Err(AnalysisError::InvalidFrameGeometry {
                frame_len: self.spectral.n_fft,
                hop: self.spectral.step,
            });
        }

        let band = self.band();
        if !band.is_valid() {
            return Err(AnalysisError::InvalidBand {
                fmin: band.fmin,
                fmax: band.fmax,
            });
        }

        let nyquist = sample_rate as f32 / 2.0;
        let filter_fmax = self.filter_fmax(sample_rate);
        if filter_fmax > self.nyquist_margin * nyquist || band.fmax >= nyquist {
            return Err(AnalysisError::AboveNyquist {
                fmax: filter_fmax.max(band.fmax),
                nyquist,
            });
        }

        let frame_duration = self.frame_len as f32 / sample_rate as f32;
        if band.fmin * frame_duration < self.yin.min_cycles {
            return Err(AnalysisError::FrameTooShort {
                frame_len: self.frame_len,
                fmin: band.fmin,
            });
        }

        Ok(())
    }
}
