use pitchtrack_analysis::{AnalysisMode, PitchAnalyzer, Signal};
use std::f32::consts::PI;

const SR: u32 = 44_100;

/// A few notes of a harmonically rich tone, with a short pause between them.
fn melody(notes: &[f32], note_len: f32, pause: f32) -> Vec<f32> {
    let mut samples = Vec::new();
    for f0 in notes {
        let n = (note_len * SR as f32) as usize;
        samples.extend((0..n).map(|i| {
            let t = i as f32 / SR as f32;
            (1..=4)
                .map(|h| 0.3 / h as f32 * (2.0 * PI * f0 * h as f32 * t).sin())
                .sum::<f32>()
        }));
        samples.extend(std::iter::repeat(0.0).take((pause * SR as f32) as usize));
    }
    samples
}

fn main() {
    println!("=== Tracking a synthetic melody ===\n");

    // C4 E4 G4 C5
    let signal = Signal::new(melody(&[261.63, 329.63, 392.0, 523.25], 0.4, 0.1), SR);
    println!("{:.2} s at {} Hz\n", signal.duration(), signal.sample_rate());

    for mode in [AnalysisMode::Low, AnalysisMode::Full] {
        let track = PitchAnalyzer::with_mode(mode).analyze(&signal);
        println!(
            "{:?} mode: {} of {} frames voiced, axis up to {:.0} Hz",
            mode,
            track.voiced_count(),
            track.len(),
            track.display_ceiling(mode)
        );

        for point in track.points().iter().step_by(8) {
            match point.note() {
                Some(note) => println!(
                    "  {:6.3} s  {:8.2} Hz  {}",
                    point.time,
                    point.frequency.unwrap_or_default(),
                    note
                ),
                None => println!("  {:6.3} s         -", point.time),
            }
        }
        println!();
    }
}
