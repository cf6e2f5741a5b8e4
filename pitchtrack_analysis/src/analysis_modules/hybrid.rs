/// Merging of the YIN track with the spectral peak track.
///
/// YIN is accurate but leaves gaps, the spectral peaks cover (almost) everything but are biased
/// towards the loudest partial. The merged track keeps every YIN value, fills the gaps with the
/// spectral peaks resampled onto the YIN grid, and divides filled values that look like the
/// 2nd, 3rd or 4th harmonic of the surrounding YIN pitch down to the fundamental.

use log::{debug, trace};

use super::peak_detection::SpectralPeakTrack;
use crate::params::HybridParameters;
use crate::track::PitchEstimate;
use crate::util::median_in_place;

/// Linear interpolation of `(times, values)` at `t`.
///
/// Outside of the sampled range the first or last value is used. Between two samples the
/// result is `None` if either of them is `None`, unless `t` hits a sample exactly.
pub fn interpolate_at(times: &[f32], values: &[PitchEstimate], t: f32) -> PitchEstimate {
    let n = times.len().min(values.len());
    if n == 0 {
        return None;
    }
    if t <= times[0] {
        return values[0];
    }
    if t >= times[n - 1] {
        return values[n - 1];
    }

    // first sample strictly after t, exists because t < times[n - 1]
    let hi = times[..n].partition_point(|x| *x <= t);
    let lo = hi - 1;
    if times[lo] == t {
        return values[lo];
    }
    match (values[lo], values[hi]) {
        (Some(a), Some(b)) => {
            let frac = (t - times[lo]) / (times[hi] - times[lo]);
            Some(a + (b - a) * frac)
        }
        _ => None,
    }
}

/// Resamples the spectral peak track onto the given time grid.
pub fn resample(spectral: &SpectralPeakTrack, times: &[f32]) -> Vec<PitchEstimate> {
    times
        .iter()
        .map(|t| interpolate_at(&spectral.times, &spectral.frequencies, *t))
        .collect()
}

/// Aligns a gap-filling value to the reference pitch of its surroundings.
///
/// For each factor in order: a value close to `factor * reference` is divided by the factor;
/// a reference close to `factor * value` means the value already is the fundamental and it is
/// kept. A value that matches neither for any factor is kept as well.
pub fn correct_harmonic(value: f32, reference: f32, params: &HybridParameters) -> f32 {
    let tol = params.harmonic_tolerance;
    for factor in params.harmonic_factors.iter().map(|h| *h as f32) {
        if (value - reference * factor).abs() < reference * tol {
            return value / factor;
        }
        if (reference - value * factor).abs() < value * tol {
            return value;
        }
    }
    value
}

/// Merges the YIN estimates with spectral estimates that are already on the YIN grid.
///
/// Every `None` in `yin` is replaced with the spectral estimate at the same position. Filled
/// values are corrected against the median of the unmodified YIN values within
/// `context_frames` frames on either side, if there are any. YIN values are never changed.
pub fn merge(
    yin: &[PitchEstimate],
    spectral_on_grid: &[PitchEstimate],
    params: &HybridParameters,
) -> Vec<PitchEstimate> {
    let mut filled = 0;
    let mut corrected = 0;

    let merged = yin
        .iter()
        .enumerate()
        .map(|(i, estimate)| {
            if estimate.is_some() {
                return *estimate;
            }
            let value = spectral_on_grid.get(i).copied().flatten()?;
            filled += 1;

            let lo = i.saturating_sub(params.context_frames);
            let hi = (i + params.context_frames + 1).min(yin.len());
            let mut context = yin[lo..hi].iter().flatten().copied().collect::<Vec<f32>>();
            let Some(reference) = median_in_place(&mut context) else {
                return Some(value);
            };

            let aligned = correct_harmonic(value, reference, params);
            if aligned != value {
                trace!("frame {i}: {value} Hz looks like a harmonic of {reference} Hz");
                corrected += 1;
            }
            Some(aligned)
        })
        .collect();

    debug!(
        "hybrid merge: {} yin frames, filled {filled} gaps, corrected {corrected} harmonics",
        yin.len()
    );
    merged
}

/// Resamples `spectral` onto the YIN grid given by `yin_times` and merges it into `yin`.
pub fn hybrid_track(
    yin: &[PitchEstimate],
    yin_times: &[f32],
    spectral: &SpectralPeakTrack,
    params: &HybridParameters,
) -> Vec<PitchEstimate> {
    let spectral_on_grid = resample(spectral, yin_times);
    merge(yin, &spectral_on_grid, params)
}
