use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

use pitchtrack_analysis::{AnalysisMode, AnalysisParameters, PitchAnalyzer};

mod report;
mod wav;

use report::{Format, Report};

#[derive(Parser)]
#[command(name = "pitchtrack")]
#[command(about = "Pitch over time of a recorded WAV file", long_about = None)]
struct Cli {
    /// The recording to analyze
    wav: PathBuf,

    /// Frequency range to search, overrides the parameter file
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: Format,

    /// JSON file with analysis parameters, missing fields keep their defaults
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// YIN acceptance threshold, overrides the parameter file
    #[arg(long)]
    yin_threshold: Option<f32>,

    /// Also print the unsmoothed YIN track
    #[arg(long)]
    raw: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Voice and melodic instruments, 50 - 2000 Hz
    Low,
    /// Up to 20 kHz
    Full,
}

impl From<Mode> for AnalysisMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Low => AnalysisMode::Low,
            Mode::Full => AnalysisMode::Full,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let analyzer = PitchAnalyzer::new(parameters(&cli)?);
    let signal = wav::read_wav(&cli.wav)?;

    let stages = analyzer
        .try_analyze_stages(&signal)
        .with_context(|| format!("Failed to analyze {}", cli.wav.display()))?;
    info!(
        "{} of {} frames voiced",
        stages.smoothed.voiced_count(),
        stages.smoothed.len()
    );

    let report = Report::new(&signal, analyzer.params().mode, &stages, cli.raw);
    print!("{}", report.render(cli.format)?);

    Ok(())
}

fn parameters(cli: &Cli) -> Result<AnalysisParameters> {
    let mut params = match &cli.params {
        Some(path) => load_parameters(path)?,
        None => AnalysisParameters::default(),
    };
    if let Some(mode) = cli.mode {
        params.mode = mode.into();
    }
    if let Some(threshold) = cli.yin_threshold {
        params.yin.threshold = threshold;
    }
    Ok(params)
}

fn load_parameters(path: &Path) -> Result<AnalysisParameters> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse parameter file {}", path.display()))
}
