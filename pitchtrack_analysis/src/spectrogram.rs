use log::debug;
use num_complex::Complex32;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Added to magnitudes before the dB conversion, so that empty bins map to -200 dB instead of
/// negative infinity.
const MAGNITUDE_FLOOR: f32 = 1e-10;

/// A short time fourier transform with a Hann window.
///
/// Columns are `step` samples apart and each one covers `n_fft` samples. The column time is
/// the time of the window's center. Magnitudes are scaled by the sum of the window, so a full
/// scale sine in the middle of a bin shows up at about -6 dB.
pub struct Stft {
    n_fft: usize,
    step: usize,
    sample_rate: u32,
    window: Vec<f32>,
    window_sum: f32,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(n_fft: usize, step: usize, sample_rate: u32) -> Self {
        let window = apodize::hanning_iter(n_fft)
            .map(|x| x as f32)
            .collect::<Vec<f32>>();
        let window_sum = window.iter().sum::<f32>();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);
        debug!("planned stft of size {n_fft}, step {step}");

        Self {
            n_fft,
            step,
            sample_rate,
            window,
            window_sum,
            fft,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Number of one-sided frequency bins, `n_fft / 2 + 1`.
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of columns for a signal of `len` samples. Signals shorter than the transform are
    /// zero padded to a single column.
    pub fn column_count(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else if len <= self.n_fft {
            1
        } else {
            1 + (len - self.n_fft) / self.step
        }
    }

    /// Time (in seconds) of the center of the `col`th column.
    pub fn column_time(&self, col: usize) -> f32 {
        (self.n_fft as f32 / 2.0 + (col * self.step) as f32) / self.sample_rate as f32
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.n_fft as f32
    }

    /// The range of bins whose frequencies lie within `[fmin, fmax]`.
    pub fn bin_range(&self, fmin: f32, fmax: f32) -> std::ops::Range<usize> {
        let lo = (0..self.n_bins())
            .find(|k| self.bin_frequency(*k) >= fmin)
            .unwrap_or(self.n_bins());
        let hi = (0..self.n_bins())
            .rev()
            .find(|k| self.bin_frequency(*k) <= fmax)
            .map_or(0, |k| k + 1);
        lo..hi.max(lo)
    }

    /// Magnitude spectrum of the `col`th column.
    pub fn magnitude_column(&self, x: &[f32], col: usize) -> Vec<f32> {
        let start = col * self.step;
        let mut buf = vec![Complex32::zero(); self.n_fft];
        for (i, z) in buf.iter_mut().enumerate() {
            if let Some(sample) = x.get(start + i) {
                *z = Complex32::new(sample * self.window[i], 0.0);
            }
        }
        self.fft.process(&mut buf);

        buf.iter()
            .take(self.n_bins())
            .map(|z| z.norm() / self.window_sum)
            .collect()
    }

    /// Magnitude spectrum of the `col`th column in dB.
    pub fn db_column(&self, x: &[f32], col: usize) -> Vec<f32> {
        magnitude_to_db(&self.magnitude_column(x, col))
    }
}

pub fn magnitude_to_db(magnitude: &[f32]) -> Vec<f32> {
    magnitude
        .iter()
        .map(|m| 20.0 * (m + MAGNITUDE_FLOOR).log10())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_signals::*;
    use crate::util::arg_max;

    #[test]
    fn test_grid() {
        let stft = Stft::new(4096, 256, SR);
        assert_eq!(stft.n_bins(), 2049);
        assert_eq!(stft.column_count(0), 0);
        assert_eq!(stft.column_count(100), 1);
        assert_eq!(stft.column_count(4096 + 255), 1);
        assert_eq!(stft.column_count(4096 + 256), 2);
        assert!((stft.column_time(0) - 2048.0 / 44_100.0).abs() < 1e-7);
        assert!((stft.bin_frequency(1) - 44_100.0 / 4096.0).abs() < 1e-4);

        let range = stft.bin_range(50.0, 2000.0);
        assert!(stft.bin_frequency(range.start) >= 50.0);
        assert!(stft.bin_frequency(range.start - 1) < 50.0);
        assert!(stft.bin_frequency(range.end - 1) <= 2000.0);
        assert!(stft.bin_frequency(range.end) > 2000.0);
    }

    #[test]
    fn test_sine_peak() {
        let stft = Stft::new(4096, 256, SR);
        let x = sine(1000.0, 1.0, 8192, SR);
        let db = stft.db_column(&x, 3);
        let peak = arg_max(&db);
        assert!((stft.bin_frequency(peak) - 1000.0).abs() < 11.0);
        // a unit sine shows up at roughly half its amplitude
        assert!(db[peak] > -9.0 && db[peak] < -5.0, "{}", db[peak]);
    }

    #[test]
    fn test_silence_is_floor() {
        let stft = Stft::new(1024, 256, SR);
        let db = stft.db_column(&vec![0.0; 1024], 0);
        assert!(db.iter().all(|v| (*v + 200.0).abs() < 1e-3));
    }
}
