//! Synthetic signals shared by the unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

pub const SR: u32 = 44_100;

pub fn sine(freq: f32, amplitude: f32, n: usize, sr: u32) -> Vec<f32> {
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sr as f32).sin())
        .collect()
}

/// A tone with the given amplitudes for the fundamental and its overtones.
pub fn harmonic_stack(f0: f32, amplitudes: &[f32], n: usize, sr: u32) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            amplitudes
                .iter()
                .enumerate()
                .map(|(k, a)| a * (2.0 * PI * f0 * (k + 1) as f32 * t).sin())
                .sum()
        })
        .collect()
}

/// `f(t) = center + depth * sin(2 pi rate t)`, integrated to a phase.
pub fn vibrato(center: f32, depth: f32, rate: f32, amplitude: f32, n: usize, sr: u32) -> Vec<f32> {
    let mut phase = 0.0_f64;
    (0..n)
        .map(|i| {
            let t = i as f64 / sr as f64;
            let f = center as f64 + depth as f64 * (2.0 * std::f64::consts::PI * rate as f64 * t).sin();
            let s = amplitude * (phase as f32).sin();
            phase += 2.0 * std::f64::consts::PI * f / sr as f64;
            s
        })
        .collect()
}

/// Uniform white noise with the given standard deviation.
pub fn noise(std_dev: f32, n: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half_width = std_dev * 3.0_f32.sqrt();
    (0..n)
        .map(|_| rng.gen_range(-half_width..half_width))
        .collect()
}

pub fn add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}
