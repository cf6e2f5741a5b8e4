/// Spectral peak extraction.
///
/// This module picks the dominant frequency of every spectrogram column. It finds a candidate
/// whenever there is energy in the band, but it tends to lock onto the loudest partial, which is
/// not necessarily the fundamental. It is therefore only used to fill gaps in the YIN track.

use find_peaks::PeakFinder;
use log::debug;
use rayon::prelude::*;

use crate::params::{FrequencyBand, SpectralPeakParameters};
use crate::signal::Signal;
use crate::spectrogram::Stft;
use crate::track::PitchEstimate;
use crate::util::{arg_max, max};

/// Dominant frequencies on the spectrogram's time grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectralPeakTrack {
    /// Column center times in seconds, strictly increasing.
    pub times: Vec<f32>,
    pub frequencies: Vec<PitchEstimate>,
}

impl SpectralPeakTrack {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Picks the dominant frequency of a single column.
///
/// `column_db` and `freqs` only contain the bins of the analyzed band. Columns whose loudest bin
/// does not exceed the threshold have no pitch. Otherwise the highest peak with sufficient
/// prominence wins, and if there is no such peak, the loudest bin.
pub fn dominant_frequency(
    column_db: &[f32],
    freqs: &[f32],
    params: &SpectralPeakParameters,
) -> PitchEstimate {
    if column_db.is_empty() || column_db.len() != freqs.len() {
        return None;
    }
    if max(column_db) <= params.threshold_db {
        return None;
    }

    let mut fp = PeakFinder::new(column_db);
    fp.with_min_height(params.threshold_db);
    fp.with_min_prominence(params.min_prominence_db);
    let peaks = fp.find_peaks();

    let best = peaks
        .iter()
        .map(|p| p.middle_position())
        .reduce(|best, p| if column_db[p] > column_db[best] { p } else { best })
        .unwrap_or_else(|| arg_max(column_db));

    Some(freqs[best])
}

/// Extracts the dominant frequency of every spectrogram column of `signal` within `band`.
pub fn spectral_peak_track(
    signal: &Signal,
    band: FrequencyBand,
    params: &SpectralPeakParameters,
) -> SpectralPeakTrack {
    let stft = Stft::new(params.n_fft, params.step, signal.sample_rate());
    let bins = stft.bin_range(band.fmin, band.fmax);
    let freqs = bins
        .clone()
        .map(|k| stft.bin_frequency(k))
        .collect::<Vec<f32>>();

    let n_columns = stft.column_count(signal.len());
    let frequencies = (0..n_columns)
        .into_par_iter()
        .map(|col| {
            let db = stft.db_column(signal.samples(), col);
            dominant_frequency(&db[bins.clone()], &freqs, params)
        })
        .collect::<Vec<PitchEstimate>>();
    let times = (0..n_columns).map(|col| stft.column_time(col)).collect();

    debug!(
        "spectral peaks: {} of {n_columns} columns above {} dB",
        frequencies.iter().filter(|f| f.is_some()).count(),
        params.threshold_db
    );

    SpectralPeakTrack { times, frequencies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AnalysisMode;
    use crate::test_signals::*;

    #[test]
    fn test_prefers_highest_prominent_peak() {
        let freqs = (0..9).map(|k| 100.0 * k as f32).collect::<Vec<f32>>();
        let column = [-50.0, -20.0, -50.0, -50.0, -10.0, -50.0, -50.0, -30.0, -50.0];
        let params = SpectralPeakParameters::default();
        assert_eq!(dominant_frequency(&column, &freqs, &params), Some(400.0));
    }

    #[test]
    fn test_falls_back_to_loudest_bin() {
        // monotonic, no local maximum
        let freqs = [100.0, 200.0, 300.0, 400.0];
        let column = [-70.0, -60.0, -50.0, -40.0];
        let params = SpectralPeakParameters::default();
        assert_eq!(dominant_frequency(&column, &freqs, &params), Some(400.0));
    }

    #[test]
    fn test_quiet_column_has_no_pitch() {
        let freqs = [100.0, 200.0, 300.0];
        let column = [-90.0, -85.0, -90.0];
        let params = SpectralPeakParameters::default();
        assert_eq!(dominant_frequency(&column, &freqs, &params), None);
        assert_eq!(dominant_frequency(&[], &[], &params), None);
    }

    #[test]
    fn test_sine_track() {
        let signal = Signal::new(sine(440.0, 0.5, 16384, SR), SR);
        let params = SpectralPeakParameters::default();
        let track = spectral_peak_track(&signal, AnalysisMode::Low.band(), &params);
        assert_eq!(track.len(), 1 + (16384 - 4096) / 256);
        assert!(track.times.windows(2).all(|w| w[1] > w[0]));
        let bin_width = SR as f32 / 4096.0;
        for f in track.frequencies.iter() {
            assert!((f.unwrap() - 440.0).abs() <= bin_width);
        }
    }

    #[test]
    fn test_silent_track() {
        let signal = Signal::new(vec![0.0; 8192], SR);
        let track = spectral_peak_track(
            &signal,
            AnalysisMode::Low.band(),
            &SpectralPeakParameters::default(),
        );
        assert!(!track.is_empty());
        assert!(track.frequencies.iter().all(|f| f.is_none()));
    }

    #[test]
    fn test_loudest_partial_wins() {
        // the second partial dominates, which is exactly what the hybrid merger has to correct
        let x = harmonic_stack(200.0, &[0.1, 0.5], 8192, SR);
        let signal = Signal::new(x, SR);
        let track = spectral_peak_track(
            &signal,
            AnalysisMode::Low.band(),
            &SpectralPeakParameters::default(),
        );
        let f = track.frequencies[0].unwrap();
        assert!((f - 400.0).abs() <= SR as f32 / 4096.0);
    }
}
