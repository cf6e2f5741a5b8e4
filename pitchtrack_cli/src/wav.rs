use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use log::info;
use std::io::Read;
use std::path::Path;

use pitchtrack_analysis::Signal;

pub fn read_wav(path: &Path) -> Result<Signal> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    decode(reader).with_context(|| format!("Failed to decode WAV file {}", path.display()))
}

/// Reads all samples, normalizes integer formats to [-1, 1] and averages the channels.
pub fn decode<R: Read>(reader: WavReader<R>) -> Result<Signal> {
    let spec = reader.spec();
    let interleaved = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => Signal::new(
            reader
                .into_samples::<f32>()
                .collect::<Result<Vec<f32>, _>>()?,
            spec.sample_rate,
        ),
        (SampleFormat::Int, 16) => Signal::from_i16(
            &reader
                .into_samples::<i16>()
                .collect::<Result<Vec<i16>, _>>()?,
            spec.sample_rate,
        ),
        (SampleFormat::Int, bits) => {
            let scale = 1.0 / (1_i64 << (bits - 1)) as f32;
            Signal::new(
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 * scale))
                    .collect::<Result<Vec<f32>, _>>()?,
                spec.sample_rate,
            )
        }
    };

    let signal = downmix(interleaved, spec.channels);
    info!(
        "read {} samples at {} Hz ({} channel(s), {} bit {:?})",
        signal.len(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    Ok(signal)
}

/// Averages interleaved channels into a mono signal.
fn downmix(interleaved: Signal, channels: u16) -> Signal {
    if channels <= 1 {
        return interleaved;
    }
    let channels = channels as usize;
    let mono = interleaved
        .samples()
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect::<Vec<f32>>();
    interleaved.with_samples(mono)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn encode_i16(channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut buf, spec).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_int_samples_are_normalized() {
        let bytes = encode_i16(1, &[0, 16384, -32768]);
        let signal = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(signal.sample_rate(), 8000);
        assert_eq!(signal.samples(), &[0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_channels_are_averaged() {
        let bytes = encode_i16(2, &[16384, 0, -16384, -16384]);
        let signal = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(signal.samples(), &[0.25, -0.5]);
    }

    #[test]
    fn test_24_bit_samples_are_normalized() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut buf, spec).unwrap();
        for s in [1_i32 << 22, -(1 << 23), 0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let signal = decode(WavReader::new(Cursor::new(buf.into_inner())).unwrap()).unwrap();
        assert_eq!(signal.sample_rate(), 48000);
        assert_eq!(signal.samples(), &[0.5, -1.0, 0.0]);
    }

    #[test]
    fn test_16_bit_matches_pcm_conversion() {
        let pcm = [i16::MIN, -1, 0, 1, 12345, i16::MAX];
        let bytes = encode_i16(1, &pcm);
        let signal = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(signal, Signal::from_i16(&pcm, 8000));
    }

    #[test]
    fn test_float_samples_are_kept() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut buf = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut buf, spec).unwrap();
        for s in [0.1_f32, -0.7] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let signal = decode(WavReader::new(Cursor::new(buf.into_inner())).unwrap()).unwrap();
        assert_eq!(signal.samples(), &[0.1, -0.7]);
    }
}
