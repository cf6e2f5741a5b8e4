pub mod analysis;
pub mod analysis_modules;
pub mod error;
pub mod filter;
pub mod note;
pub mod params;
pub mod signal;
pub mod spectrogram;
pub mod track;
pub mod util;

#[cfg(test)]
pub(crate) mod test_signals;

pub use analysis::{AnalysisStages, PitchAnalyzer};
pub use error::AnalysisError;
pub use note::{frequency_to_note, Note};
pub use params::{AnalysisMode, AnalysisParameters, FrequencyBand};
pub use signal::Signal;
pub use track::{PitchEstimate, PitchTrack, TrackPoint};
