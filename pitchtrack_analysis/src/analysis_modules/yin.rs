/// YIN fundamental frequency estimation.
///
/// The estimator is based on *YIN, a fundamental frequency estimator for speech and music*
/// (de Cheveigné and Kawahara, 2002). For every frame the squared difference function is
/// normalized by its cumulative mean, which suppresses the octave errors that plain
/// autocorrelation is prone to. The first dip below the threshold is followed down to its local
/// minimum and refined with parabolic interpolation.

use log::trace;
use rayon::prelude::*;

use crate::params::{FrequencyBand, YinParameters};
use crate::signal::Signal;
use crate::track::PitchEstimate;

/// The estimate for a single frame, together with the values that lead to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YinEstimate {
    /// The refined lag in samples.
    pub lag: f32,
    /// The cumulative mean normalized difference at the unrefined lag. Lower is more periodic.
    pub aperiodicity: f32,
    /// The estimated fundamental frequency in Hz.
    pub frequency: f32,
}

/// Squared difference function `d(tau) = sum_j (x[j] - x[j + tau])^2` for `tau` in
/// `0..=tau_max`. `d(0)` is zero.
pub fn difference_function(x: &[f32], tau_max: usize) -> Vec<f32> {
    let mut df = vec![0.0; tau_max + 1];
    for (tau, d) in df.iter_mut().enumerate().skip(1) {
        *d = x
            .iter()
            .zip(x[tau..].iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
    }
    df
}

/// Cumulative mean normalized difference function. The value at lag 0 is defined as 1, as is
/// every value for which the running sum is still zero.
pub fn cumulative_mean_normalized_difference(df: &[f32]) -> Vec<f32> {
    let mut cmnd = vec![1.0; df.len()];
    let mut running_sum = 0.0;
    for tau in 1..df.len() {
        running_sum += df[tau];
        if running_sum > 0.0 {
            cmnd[tau] = df[tau] * tau as f32 / running_sum;
        }
    }
    cmnd
}

/// The absolute threshold step: the first lag in `tau_min..tau_max` whose value falls below the
/// threshold, followed downhill to the bottom of its dip.
fn first_dip_below(cmnd: &[f32], tau_min: usize, tau_max: usize, threshold: f32) -> Option<usize> {
    let mut tau = (tau_min..tau_max).find(|tau| cmnd[*tau] < threshold)?;
    while tau + 1 < tau_max && cmnd[tau + 1] < cmnd[tau] {
        tau += 1;
    }
    Some(tau)
}

/// Sub-sample refinement of a minimum by fitting a parabola through its neighbors.
///
/// Falls back to the integer lag if the parabola is degenerate (flat or opening downwards) or if
/// its vertex is more than one sample away.
fn parabolic_refinement(cmnd: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return tau as f32;
    }
    let alpha = cmnd[tau - 1];
    let beta = cmnd[tau];
    let gamma = cmnd[tau + 1];
    let denom = alpha - 2.0 * beta + gamma;
    if denom <= 0.0 {
        return tau as f32;
    }
    let delta = (alpha - gamma) / (2.0 * denom);
    if delta.abs() < 1.0 {
        tau as f32 + delta
    } else {
        tau as f32
    }
}

/// Runs YIN on a single frame and returns the estimate together with its diagnostics, or `None`
/// if the frame has no reliable pitch.
pub fn yin_estimate(
    frame: &[f32],
    sample_rate: u32,
    band: FrequencyBand,
    params: &YinParameters,
) -> Option<YinEstimate> {
    if frame.len() < 3 || sample_rate == 0 || !band.is_valid() {
        return None;
    }
    let sr = sample_rate as f32;

    // energy gate
    let mean = frame.iter().sum::<f32>() / frame.len() as f32;
    let x = frame.iter().map(|v| v - mean).collect::<Vec<f32>>();
    let rms = (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt();
    if rms < params.silence_rms {
        return None;
    }

    let tau_min = ((sr / band.fmax) as usize).max(1);
    let tau_max = ((sr / band.fmin) as usize).min(x.len() - 1);
    if tau_min >= tau_max {
        return None;
    }

    let df = difference_function(&x, tau_max);
    let cmnd = cumulative_mean_normalized_difference(&df);

    let tau = first_dip_below(&cmnd, tau_min, tau_max, params.threshold)?;
    let lag = parabolic_refinement(&cmnd, tau);
    let frequency = sr / lag;

    if !band.contains(frequency) {
        trace!("rejecting {frequency} Hz, outside of {band:?}");
        return None;
    }
    let frame_duration = x.len() as f32 / sr;
    if frequency * frame_duration < params.min_cycles {
        trace!("rejecting {frequency} Hz, less than {} periods per frame", params.min_cycles);
        return None;
    }
    let aperiodicity = cmnd[tau];
    if aperiodicity > params.confidence_factor * params.threshold {
        trace!("rejecting {frequency} Hz, aperiodicity {aperiodicity}");
        return None;
    }

    Some(YinEstimate {
        lag,
        aperiodicity,
        frequency,
    })
}

/// The fundamental frequency of a single frame in Hz, or `None` if there is no reliable pitch.
pub fn yin_pitch(
    frame: &[f32],
    sample_rate: u32,
    band: FrequencyBand,
    params: &YinParameters,
) -> PitchEstimate {
    yin_estimate(frame, sample_rate, band, params).map(|e| e.frequency)
}

/// The estimate of the `index`th frame of `signal`.
pub fn frame_pitch(
    signal: &Signal,
    index: usize,
    frame_len: usize,
    hop: usize,
    band: FrequencyBand,
    params: &YinParameters,
) -> PitchEstimate {
    signal
        .frame(index, frame_len, hop)
        .and_then(|frame| yin_pitch(frame, signal.sample_rate(), band, params))
}

/// Estimates every frame of `signal`. Frames are independent and processed in parallel.
pub fn yin_track(
    signal: &Signal,
    frame_len: usize,
    hop: usize,
    band: FrequencyBand,
    params: &YinParameters,
) -> Vec<PitchEstimate> {
    (0..signal.frame_count(frame_len, hop))
        .into_par_iter()
        .map(|i| frame_pitch(signal, i, frame_len, hop, band, params))
        .collect()
}
