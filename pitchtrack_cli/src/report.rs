use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write;

use pitchtrack_analysis::{AnalysisMode, AnalysisStages, PitchEstimate, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub time: f32,
    pub frequency: PitchEstimate,
    pub note: Option<String>,
    pub cents: Option<f32>,
    pub second_harmonic: PitchEstimate,
    pub third_harmonic: PitchEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yin: Option<PitchEstimate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub sample_rate: u32,
    pub duration: f32,
    pub mode: AnalysisMode,
    pub voiced_frames: usize,
    pub display_ceiling: f32,
    pub rows: Vec<Row>,
}

impl Report {
    /// Collects the final track, its harmonics and, if `raw` is set, the unsmoothed YIN track.
    pub fn new(signal: &Signal, mode: AnalysisMode, stages: &AnalysisStages, raw: bool) -> Self {
        let track = &stages.smoothed;
        let second = track.harmonic(2);
        let third = track.harmonic(3);
        let yin = stages.yin.frequencies();

        let rows = track
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let note = p.note();
                Row {
                    time: p.time,
                    frequency: p.frequency,
                    note: note.map(|n| n.name()),
                    cents: note.map(|n| n.cents),
                    second_harmonic: second[i],
                    third_harmonic: third[i],
                    yin: raw.then(|| yin.get(i).copied().flatten()),
                }
            })
            .collect();

        Self {
            sample_rate: signal.sample_rate(),
            duration: signal.duration(),
            mode,
            voiced_frames: track.voiced_count(),
            display_ceiling: track.display_ceiling(mode),
            rows,
        }
    }

    pub fn render(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Table => self.table(),
            Format::Csv => self.csv(),
            Format::Json => serde_json::to_string_pretty(self)?,
        })
    }

    fn has_raw(&self) -> bool {
        self.rows.iter().any(|r| r.yin.is_some())
    }

    fn table(&self) -> String {
        let raw = self.has_raw();
        let mut out = String::new();
        let _ = write!(
            out,
            "{:>8} {:>9} {:>5} {:>7} {:>9} {:>9}",
            "time", "freq", "note", "cents", "2x", "3x"
        );
        if raw {
            let _ = write!(out, " {:>9}", "yin");
        }
        out.push('\n');

        for row in &self.rows {
            let _ = write!(
                out,
                "{:>8.3} {:>9} {:>5} {:>7} {:>9} {:>9}",
                row.time,
                hz(row.frequency),
                row.note.as_deref().unwrap_or("-"),
                row.cents.map_or("-".to_string(), |c| format!("{c:+.1}")),
                hz(row.second_harmonic),
                hz(row.third_harmonic),
            );
            if raw {
                let _ = write!(out, " {:>9}", hz(row.yin.flatten()));
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "{} of {} frames voiced, {:.2} s at {} Hz, frequency axis up to {:.0} Hz",
            self.voiced_frames,
            self.rows.len(),
            self.duration,
            self.sample_rate,
            self.display_ceiling
        );
        out
    }

    fn csv(&self) -> String {
        let raw = self.has_raw();
        let mut out = String::from("time,frequency,note,cents,second_harmonic,third_harmonic");
        if raw {
            out.push_str(",yin");
        }
        out.push('\n');

        let field = |f: Option<f32>| f.map_or(String::new(), |f| format!("{f:.2}"));
        for row in &self.rows {
            let _ = write!(
                out,
                "{:.4},{},{},{},{},{}",
                row.time,
                field(row.frequency),
                row.note.as_deref().unwrap_or(""),
                row.cents.map_or(String::new(), |c| format!("{c:.1}")),
                field(row.second_harmonic),
                field(row.third_harmonic),
            );
            if raw {
                let _ = write!(out, ",{}", field(row.yin.flatten()));
            }
            out.push('\n');
        }
        out
    }
}

fn hz(f: PitchEstimate) -> String {
    f.map_or("-".to_string(), |f| format!("{f:.2}"))
}
