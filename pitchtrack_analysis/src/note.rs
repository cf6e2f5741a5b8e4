/// Mapping of frequencies to the names of the nearest equal temperament semitone.

use std::fmt;

/// Reference tuning, A4.
pub const A4_FREQ: f32 = 440.0;
/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The nearest semitone of a frequency and how far the frequency is off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// MIDI-style note number, 69 is A4.
    pub midi: i32,
    /// Deviation from the semitone in cents, in [-50, 50].
    pub cents: f32,
}

impl Note {
    /// Index into [`NOTE_NAMES`].
    pub fn pitch_class(&self) -> usize {
        self.midi.rem_euclid(12) as usize
    }

    /// Octave number in scientific pitch notation, A4 is in octave 4.
    pub fn octave(&self) -> i32 {
        self.midi.div_euclid(12) - 1
    }

    pub fn pitch_name(&self) -> &'static str {
        NOTE_NAMES[self.pitch_class()]
    }

    /// The name including the octave, e.g. `A4` or `C#3`.
    pub fn name(&self) -> String {
        format!("{}{}", self.pitch_name(), self.octave())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+.1} ct", self.name(), self.cents)
    }
}

/// Maps a frequency to its nearest semitone with A4 = 440 Hz. Frequencies that are not positive
/// (or not finite) have no note.
pub fn frequency_to_note(freq: f32) -> Option<Note> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    let n = 12.0 * (freq / A4_FREQ).log2() + A4_MIDI as f32;
    let midi = n.round();
    Some(Note {
        midi: midi as i32,
        cents: (n - midi) * 100.0,
    })
}
