/// Zero-phase band-limiting of recordings.
///
/// A Butterworth band-pass is designed from its analog prototype (lowpass to bandpass transform,
/// then bilinear transform with pre-warped band edges) and realized as a cascade of biquads.
/// It is run forward and backward over the signal, which squares the magnitude response and
/// cancels the phase response, so frame times computed downstream stay aligned with the audio.
use log::{debug, warn};
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::AnalysisError;
use crate::params::FILTER_FMIN;
use crate::signal::Signal;

/// Order of the analog lowpass prototype. The band-pass has twice as many poles.
pub const BUTTERWORTH_ORDER: usize = 4;

/// One second order section in transposed direct form II, `a0` normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Complex frequency response at the normalized angular frequency `omega`.
    fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        (self.b[0] + self.b[1] * z1 + self.b[2] * z2) / (self.a[0] + self.a[1] * z1 + self.a[2] * z2)
    }

    fn dc_gain(&self) -> f64 {
        let den = self.a.iter().sum::<f64>();
        if den.abs() < f64::EPSILON {
            0.0
        } else {
            self.b.iter().sum::<f64>() / den
        }
    }

    /// Filter state that makes the section output `dc_gain * u` for a constant input `u`.
    fn steady_state(&self, u: f64) -> [f64; 2] {
        let y = self.dc_gain() * u;
        let s2 = self.b[2] * u - self.a[2] * y;
        let s1 = self.b[1] * u - self.a[1] * y + s2;
        [s1, s2]
    }
}

/// A cascade of biquads.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPass {
    sections: Vec<Biquad>,
}

impl BandPass {
    /// Designs a Butterworth band-pass for the band `[f_low, f_high]` (Hz).
    ///
    /// Returns an error if the band is empty or if `f_high` is not below the Nyquist frequency.
    pub fn butterworth(
        order: usize,
        f_low: f32,
        f_high: f32,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if !(f_low > 0.0 && f_low < f_high) {
            return Err(AnalysisError::InvalidBand {
                fmin: f_low,
                fmax: f_high,
            });
        }
        if f_high as f64 >= nyquist {
            return Err(AnalysisError::AboveNyquist {
                fmax: f_high,
                nyquist: nyquist as f32,
            });
        }

        // pre-warp the band edges so that they land on the right digital frequencies
        let w_low = 2.0 * fs * (PI * f_low as f64 / fs).tan();
        let w_high = 2.0 * fs * (PI * f_high as f64 / fs).tan();
        let w0 = (w_low * w_high).sqrt();
        let bandwidth = w_high - w_low;

        let mut sections = Vec::with_capacity(order);
        // Only the prototype poles in the upper half plane are visited, their conjugates yield
        // the conjugate band-pass poles which end up in the same biquads.
        for k in 0..order / 2 {
            let angle = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            let p = Complex64::from_polar(1.0, angle);

            // s^2 - p * bw * s + w0^2 = 0
            let half = p * bandwidth / 2.0;
            let root = (half * half - w0 * w0).sqrt();
            for s in [half + root, half - root] {
                let z = (2.0 * fs + s) / (2.0 * fs - s);
                sections.push(Biquad {
                    // one zero at z = 1 (s = 0) and one at z = -1 (s = infinity)
                    b: [1.0, 0.0, -1.0],
                    a: [1.0, -2.0 * z.re, z.norm_sqr()],
                });
            }
        }
        if order % 2 == 1 {
            // the real prototype pole at s = -1
            let half = Complex64::new(-bandwidth / 2.0, 0.0);
            let root = (half * half - w0 * w0).sqrt();
            let z1 = (2.0 * fs + half + root) / (2.0 * fs - half - root);
            let z2 = (2.0 * fs + half - root) / (2.0 * fs - half + root);
            sections.push(Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -(z1 + z2).re, (z1 * z2).re],
            });
        }

        // normalize to unity gain at the digital center frequency
        let omega_center = 2.0 * (w0 / (2.0 * fs)).atan();
        let gain = sections
            .iter()
            .map(|s| s.response(omega_center))
            .product::<Complex64>()
            .norm();
        if gain > 0.0 && gain.is_finite() {
            let per_section = gain.powf(-1.0 / sections.len() as f64);
            for s in sections.iter_mut() {
                s.b.iter_mut().for_each(|b| *b *= per_section);
            }
        }

        debug!(
            "designed band-pass [{f_low}, {f_high}] Hz at {sample_rate} Hz with {} sections",
            sections.len()
        );

        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Magnitude response at the frequency `f` (Hz) of a single pass.
    pub fn magnitude(&self, f: f32, sample_rate: u32) -> f64 {
        let omega = 2.0 * PI * f as f64 / sample_rate as f64;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .product::<Complex64>()
            .norm()
    }

    /// Runs the cascade once over `x`, starting from the steady state for `x[0]`.
    fn run(&self, x: &mut [f64]) {
        let Some(&first) = x.first() else {
            return;
        };
        let mut u = first;
        for section in &self.sections {
            let [mut s1, mut s2] = section.steady_state(u);
            u *= section.dc_gain();
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            for v in x.iter_mut() {
                let input = *v;
                let y = b0 * input + s1;
                s1 = b1 * input - a1 * y + s2;
                s2 = b2 * input - a2 * y;
                *v = y;
            }
        }
    }

    /// Zero-phase filtering: forward, then backward over an odd extension of `x`.
    pub fn filtfilt(&self, x: &[f32]) -> Vec<f32> {
        if x.len() < 2 {
            return x.to_vec();
        }
        let padlen = (3 * (2 * self.sections.len() + 1)).min(x.len() - 1);

        let first = x[0] as f64;
        let last = x[x.len() - 1] as f64;
        let mut ext = Vec::with_capacity(x.len() + 2 * padlen);
        ext.extend((1..=padlen).rev().map(|i| 2.0 * first - x[i] as f64));
        ext.extend(x.iter().map(|v| *v as f64));
        ext.extend((1..=padlen).map(|i| 2.0 * last - x[x.len() - 1 - i] as f64));

        self.run(&mut ext);
        ext.reverse();
        self.run(&mut ext);
        ext.reverse();

        ext[padlen..padlen + x.len()]
            .iter()
            .map(|v| *v as f32)
            .collect()
    }
}

/// Band-limits `signal` to `[20 Hz, fmax]` without delaying it.
///
/// On invalid input (an `fmax` at or above Nyquist, for instance) the error is returned and
/// nothing is filtered.
pub fn try_bandpass(signal: &Signal, fmax: f32) -> Result<Signal, AnalysisError> {
    if signal.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }
    let filter = BandPass::butterworth(BUTTERWORTH_ORDER, FILTER_FMIN, fmax, signal.sample_rate())?;
    Ok(signal.with_samples(filter.filtfilt(signal.samples())))
}

/// Like [`try_bandpass`], but returns the signal unchanged when it cannot be filtered.
pub fn bandpass(signal: &Signal, fmax: f32) -> Signal {
    match try_bandpass(signal, fmax) {
        Ok(filtered) => filtered,
        Err(e) => {
            warn!("not filtering signal: {e}");
            signal.clone()
        }
    }
}
