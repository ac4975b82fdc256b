//! Audio test fixture generator
//!
//! Generates mono WAV click tracks with a known number of rhythmic onsets:
//! short 1 kHz bursts over silence, spaced widely enough that the detector
//! reports exactly one onset per click.

use std::path::{Path, PathBuf};

/// Configuration for generated click tracks
#[derive(Debug, Clone)]
pub struct ClickTrackConfig {
    pub num_clicks: usize,
    pub spacing_seconds: f32,
    pub sample_rate: u32,
    pub amplitude: f32,
}

impl Default for ClickTrackConfig {
    fn default() -> Self {
        Self {
            num_clicks: 8,
            spacing_seconds: 0.5,
            sample_rate: 44100,
            amplitude: 0.8,
        }
    }
}

/// Generate a mono 16-bit WAV click track at `path`.
///
/// Clicks start at 0.25 s so the first one never sits on the window edge;
/// half a second of tail silence follows the last click.
pub fn generate_click_wav(path: &Path, config: &ClickTrackConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let sr = config.sample_rate as f32;
    let duration = 0.25 + config.num_clicks as f32 * config.spacing_seconds + 0.5;
    let total_samples = (duration * sr) as usize;

    let mut samples = vec![0.0f32; total_samples];
    for k in 0..config.num_clicks {
        let start = ((0.25 + k as f32 * config.spacing_seconds) * sr) as usize;
        for i in 0..256 {
            let idx = start + i;
            if idx < total_samples {
                let t = i as f32 / sr;
                samples[idx] =
                    config.amplitude * (2.0 * std::f32::consts::PI * 1000.0 * t).sin();
            }
        }
    }

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(path.to_path_buf())
}

/// Generate a silent WAV (no detectable onsets).
pub fn generate_silent_wav(path: &Path, duration_seconds: f32) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for _ in 0..(duration_seconds * 44100.0) as usize {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;

    Ok(path.to_path_buf())
}

/// Write a file that passes the scanner's WAV magic-byte check but cannot be
/// decoded.
pub fn write_corrupt_wav(path: &Path) -> anyhow::Result<PathBuf> {
    let mut bytes = b"RIFF\x24\x00\x00\x00WAVE".to_vec();
    bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF].repeat(64));
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}
