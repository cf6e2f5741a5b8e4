/// The pitch tracking pipeline.
///
/// A recording is band-limited, then analyzed twice: YIN on overlapping frames and a spectral
/// peak picker on the columns of a short time fourier transform. The two passes are independent
/// and run in parallel. The spectral peaks fill the gaps in the YIN track, the merged track is
/// smoothed, and the result is a pitch estimate for every YIN frame.
///
/// The analysis is stateless. Changing the mode or any other parameter simply means running it
/// again on the same signal.
use log::{debug, warn};
use std::time::Instant;

use crate::analysis_modules::{hybrid_track, smooth, spectral_peak_track, yin_track};
use crate::error::AnalysisError;
use crate::filter::try_bandpass;
use crate::params::{AnalysisMode, AnalysisParameters};
use crate::signal::Signal;
use crate::track::{PitchEstimate, PitchTrack};

/// The intermediate tracks of one analysis pass, all on the same time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisStages {
    /// What YIN found on its own.
    pub yin: PitchTrack,
    /// YIN with the gaps filled from the spectral peaks.
    pub hybrid: PitchTrack,
    /// The smoothed hybrid track, the final result.
    pub smoothed: PitchTrack,
}

#[derive(Debug, Clone, Default)]
pub struct PitchAnalyzer {
    params: AnalysisParameters,
}

impl PitchAnalyzer {
    pub fn new(params: AnalysisParameters) -> Self {
        Self { params }
    }

    pub fn with_mode(mode: AnalysisMode) -> Self {
        Self::new(AnalysisParameters::with_mode(mode))
    }

    pub fn params(&self) -> &AnalysisParameters {
        &self.params
    }

    pub fn set_mode(&mut self, mode: AnalysisMode) {
        self.params.mode = mode;
    }

    /// Runs the whole pipeline and returns every stage.
    pub fn try_analyze_stages(&self, signal: &Signal) -> Result<AnalysisStages, AnalysisError> {
        let start = Instant::now();
        let params = &self.params;
        if signal.is_empty() {
            return Err(AnalysisError::EmptySignal);
        }
        params.validate(signal.sample_rate())?;

        let filtered = try_bandpass(signal, params.filter_fmax(signal.sample_rate()))?;
        let band = params.band();

        let (yin, spectral) = rayon::join(
            || yin_track(&filtered, params.frame_len, params.hop, band, &params.yin),
            || spectral_peak_track(&filtered, band, &params.spectral),
        );

        let times = (0..yin.len())
            .map(|i| filtered.frame_time(i, params.hop))
            .collect::<Vec<f32>>();
        let hybrid = hybrid_track(&yin, &times, &spectral, &params.hybrid)
            .into_iter()
            .map(|f| f.filter(|f| band.contains(*f)))
            .collect::<Vec<PitchEstimate>>();
        let smoothed = smooth(&hybrid, &params.smoothing);

        let step = params.hop as f32 / signal.sample_rate() as f32;
        let stages = AnalysisStages {
            yin: PitchTrack::new(&yin, step),
            hybrid: PitchTrack::new(&hybrid, step),
            smoothed: PitchTrack::new(&smoothed, step),
        };

        debug!(
            "analyzed {:.2} s in {:?} mode: {} frames, {} voiced by yin, {} after merging, took {} ms",
            signal.duration(),
            params.mode,
            stages.yin.len(),
            stages.yin.voiced_count(),
            stages.hybrid.voiced_count(),
            start.elapsed().as_millis()
        );

        Ok(stages)
    }

    /// Runs the whole pipeline and returns the final pitch track.
    pub fn try_analyze(&self, signal: &Signal) -> Result<PitchTrack, AnalysisError> {
        self.try_analyze_stages(signal).map(|stages| stages.smoothed)
    }

    /// Like [`PitchAnalyzer::try_analyze`], but unusable input results in an empty track.
    pub fn analyze(&self, signal: &Signal) -> PitchTrack {
        self.try_analyze(signal).unwrap_or_else(|e| {
            warn!("no pitch track: {e}");
            PitchTrack::empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FRAME, HOP};
    use crate::test_signals::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_steady_tone() {
        init_logging();
        let signal = Signal::new(sine(440.0, 0.5, SR as usize, SR), SR);
        let track = PitchAnalyzer::default().analyze(&signal);

        assert_eq!(track.len(), signal.frame_count(FRAME, HOP));
        assert!((track.step() - HOP as f32 / SR as f32).abs() < 1e-9);
        assert!(track.points().windows(2).all(|w| w[1].time > w[0].time));
        for p in track.points() {
            let f = p.frequency.unwrap();
            assert!((f - 440.0).abs() / 440.0 < 0.01, "{f} Hz at {} s", p.time);
            assert_eq!(p.note().unwrap().name(), "A4");
        }
    }

    #[test]
    fn test_silence_has_no_pitch() {
        init_logging();
        let signal = Signal::new(vec![0.0; SR as usize / 2], SR);
        let track = PitchAnalyzer::default().analyze(&signal);
        assert_eq!(track.len(), signal.frame_count(FRAME, HOP));
        assert_eq!(track.voiced_count(), 0);
    }

    #[test]
    fn test_invalid_input_gives_empty_track() {
        init_logging();
        let analyzer = PitchAnalyzer::default();
        let empty = Signal::new(Vec::<f32>::new(), SR);
        assert_eq!(analyzer.try_analyze(&empty), Err(AnalysisError::EmptySignal));
        assert!(analyzer.analyze(&empty).is_empty());

        let low_rate = Signal::new(sine(440.0, 0.5, 22_050, 22_050), 22_050);
        let full = PitchAnalyzer::with_mode(AnalysisMode::Full);
        assert!(matches!(
            full.try_analyze(&low_rate),
            Err(AnalysisError::AboveNyquist { .. })
        ));
        assert!(full.analyze(&low_rate).is_empty());
        // the same recording is fine in low mode
        assert!(!PitchAnalyzer::default().analyze(&low_rate).is_empty());
    }

    #[test]
    fn test_low_sample_rate_in_low_mode() {
        init_logging();
        let sr = 8_000;
        let signal = Signal::new(sine(440.0, 0.5, sr as usize, sr), sr);
        let track = PitchAnalyzer::default().try_analyze(&signal).unwrap();
        assert_eq!(track.len(), signal.frame_count(FRAME, HOP));
        assert_eq!(track.voiced_count(), track.len());
        for f in track.frequencies() {
            assert!((f.unwrap() - 440.0).abs() / 440.0 < 0.02, "{f:?}");
        }
    }

    #[test]
    fn test_quiet_tone_is_filled_from_spectrum() {
        init_logging();
        // below the YIN energy gate, but well above the spectral threshold
        let signal = Signal::new(sine(440.0, 0.005, SR as usize / 2, SR), SR);
        let stages = PitchAnalyzer::default().try_analyze_stages(&signal).unwrap();
        assert_eq!(stages.yin.voiced_count(), 0);
        assert_eq!(stages.smoothed.voiced_count(), stages.smoothed.len());

        let bin_width = SR as f32 / 4096.0;
        for f in stages.smoothed.frequencies() {
            assert!((f.unwrap() - 440.0).abs() <= bin_width);
        }
    }

    #[test]
    fn test_filled_harmonics_are_aligned_near_yin_context() {
        init_logging();
        let half = SR as usize / 2;
        // the second partial dominates, YIN still finds 200 Hz in the loud part
        let mut x = harmonic_stack(200.0, &[0.3, 0.6], half, SR);
        // the quiet part only reaches the spectral peak picker, which sees 400 Hz
        x.extend(
            harmonic_stack(200.0, &[0.3, 0.6], half, SR)
                .iter()
                .map(|v| v * 0.01),
        );
        let signal = Signal::new(x, SR);
        let stages = PitchAnalyzer::default().try_analyze_stages(&signal).unwrap();
        let track = stages.smoothed.frequencies();

        for f in &track[..35] {
            assert!((f.unwrap() - 200.0).abs() / 200.0 < 0.02, "{f:?}");
        }
        // filled from the spectrum, but close enough to YIN frames to be divided down
        for i in 45..=47 {
            assert_eq!(stages.yin.frequencies()[i], None);
            let f = track[i].unwrap();
            assert!((f - 200.0).abs() / 200.0 < 0.03, "frame {i}: {f} Hz");
        }
        // too far from any YIN frame, the spectral peak is kept as it is
        for f in &track[track.len() - 5..] {
            assert!((f.unwrap() - 400.0).abs() / 400.0 < 0.03, "{f:?}");
        }
    }

    #[test]
    fn test_reanalysis_is_deterministic() {
        let signal = Signal::new(vibrato(330.0, 8.0, 5.0, 0.4, SR as usize / 2, SR), SR);
        let mut analyzer = PitchAnalyzer::default();
        let first = analyzer.analyze(&signal);
        assert_eq!(first, analyzer.analyze(&signal));

        analyzer.set_mode(AnalysisMode::Full);
        let full = analyzer.analyze(&signal);
        assert_eq!(full.len(), first.len());
        assert!(full.voiced_count() > 10);
    }
}
