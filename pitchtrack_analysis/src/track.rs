#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::note::{frequency_to_note, Note};
use crate::params::AnalysisMode;

/// A frequency in Hz, or `None` where there is no reliable pitch.
pub type PitchEstimate = Option<f32>;

/// Headroom above the highest pitch when choosing the extent of the frequency axis.
const DISPLAY_HEADROOM: f32 = 200.0;
/// Extent of the frequency axis when nothing was detected.
const DISPLAY_FALLBACK: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPoint {
    /// Offset from the start of the recording in seconds.
    pub time: f32,
    pub frequency: PitchEstimate,
}

impl TrackPoint {
    pub fn note(&self) -> Option<Note> {
        self.frequency.and_then(frequency_to_note)
    }
}

/// Pitch over time on an evenly spaced time grid starting at zero.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PitchTrack {
    /// Seconds between two points.
    step: f32,
    points: Vec<TrackPoint>,
}

impl PitchTrack {
    /// Places the estimates `step` seconds apart.
    pub fn new(estimates: &[PitchEstimate], step: f32) -> Self {
        let points = estimates
            .iter()
            .enumerate()
            .map(|(i, frequency)| TrackPoint {
                time: i as f32 * step,
                frequency: *frequency,
            })
            .collect();
        Self { step, points }
    }

    /// A track without any points, the result of analyzing unusable input.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn frequencies(&self) -> Vec<PitchEstimate> {
        self.points.iter().map(|p| p.frequency).collect()
    }

    pub fn voiced_count(&self) -> usize {
        self.points.iter().filter(|p| p.frequency.is_some()).count()
    }

    /// The `n`th harmonic series of the track, e.g. `n = 2` for the octave above.
    pub fn harmonic(&self, n: u32) -> Vec<PitchEstimate> {
        self.points
            .iter()
            .map(|p| p.frequency.map(|f| f * n as f32))
            .collect()
    }

    /// Upper end of a frequency axis that shows the whole track.
    pub fn display_ceiling(&self, mode: AnalysisMode) -> f32 {
        let ceiling = self
            .points
            .iter()
            .filter_map(|p| p.frequency)
            .reduce(f32::max)
            .map_or(DISPLAY_FALLBACK, |max| max + DISPLAY_HEADROOM);
        match mode.display_cap() {
            Some(cap) => ceiling.min(cap),
            None => ceiling,
        }
    }
}
