//! Symphonia-backed waveform loading
//!
//! Decodes common audio containers (WAV, MP3, FLAC, M4A, OGG, ...) to mono
//! f32 PCM and resamples to the configured reference rate with rubato sinc
//! interpolation. Multi-channel input is averaged to mono before resampling.

use anyhow::{anyhow, Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use super::{Waveform, WaveformLoader};

/// Waveform loader over symphonia + rubato
pub struct SymphoniaLoader {
    /// Reference sample rate for output waveforms (Hz)
    target_sample_rate: u32,
    /// Decoded-duration cap; inputs past this fail like any decode error
    max_duration_secs: f64,
}

impl SymphoniaLoader {
    pub fn new(target_sample_rate: u32, max_duration_secs: f64) -> Self {
        Self {
            target_sample_rate,
            max_duration_secs,
        }
    }

    /// Decode the whole file to mono f32 at its native rate.
    fn decode_mono(&self, file_path: &Path) -> Result<(Vec<f32>, u32)> {
        tracing::debug!(path = %file_path.display(), "Decoding audio file");

        let file = std::fs::File::open(file_path)
            .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Format hint from the file extension
        let mut hint = Hint::new();
        if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("No audio track found in file")?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .context("Sample rate unknown")?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

        let max_samples = (self.max_duration_secs * sample_rate as f64) as usize;
        let mut all_samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    // End of stream
                    break;
                }
                Err(e) => {
                    return Err(anyhow!("Error reading packet: {}", e));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = decoder
                .decode(&packet)
                .with_context(|| format!("Failed to decode packet in: {}", file_path.display()))?;

            append_mono(&decoded, &mut all_samples);

            if all_samples.len() > max_samples {
                return Err(anyhow!(
                    "Audio exceeds duration cap of {:.0}s: {}",
                    self.max_duration_secs,
                    file_path.display()
                ));
            }
        }

        tracing::debug!(
            path = %file_path.display(),
            total_samples = all_samples.len(),
            sample_rate = sample_rate,
            "Audio decoding complete"
        );

        Ok((all_samples, sample_rate))
    }

    /// Resample mono samples to the target rate with sinc interpolation.
    fn resample_mono(&self, samples: Vec<f32>, source_rate: u32) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Ok(samples);
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resample_ratio = self.target_sample_rate as f64 / source_rate as f64;
        let num_frames = samples.len();

        // Chunk size = input length for single-pass processing
        let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 4.0, params, num_frames, 1)
            .context("Failed to create rubato resampler")?;

        let output_channels = resampler
            .process(&[samples], None)
            .context("Rubato resampling failed")?;

        let output = output_channels
            .into_iter()
            .next()
            .context("Resampler returned no channels")?;

        tracing::debug!(
            input_frames = num_frames,
            output_frames = output.len(),
            source_rate = source_rate,
            target_rate = self.target_sample_rate,
            "Resampling complete"
        );

        Ok(output)
    }
}

impl WaveformLoader for SymphoniaLoader {
    fn load(&self, path: &Path) -> Result<Waveform> {
        let (samples, native_rate) = self.decode_mono(path)?;

        let samples = if native_rate != self.target_sample_rate {
            self.resample_mono(samples, native_rate)
                .with_context(|| format!("Failed to resample audio: {}", path.display()))?
        } else {
            samples
        };

        Ok(Waveform {
            samples,
            sample_rate: self.target_sample_rate,
        })
    }
}

/// Append one decoded packet to `out` as mono, averaging channels.
fn append_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => mix_to_mono(buf, out),
        AudioBufferRef::F64(buf) => mix_to_mono(buf, out),
        AudioBufferRef::U8(buf) => mix_to_mono(buf, out),
        AudioBufferRef::U16(buf) => mix_to_mono(buf, out),
        AudioBufferRef::U24(buf) => mix_to_mono(buf, out),
        AudioBufferRef::U32(buf) => mix_to_mono(buf, out),
        AudioBufferRef::S8(buf) => mix_to_mono(buf, out),
        AudioBufferRef::S16(buf) => mix_to_mono(buf, out),
        AudioBufferRef::S24(buf) => mix_to_mono(buf, out),
        AudioBufferRef::S32(buf) => mix_to_mono(buf, out),
    }
}

fn mix_to_mono<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    out.reserve(num_frames);

    for frame_idx in 0..num_frames {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame_idx]);
        }
        out.push(sum / num_channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_fails_with_path() {
        let loader = SymphoniaLoader::new(44100, 900.0);
        let result = loader.load(Path::new("/nonexistent/file.mp3"));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("/nonexistent/file.mp3"));
    }

    #[test]
    fn resample_halves_frame_count() {
        let loader = SymphoniaLoader::new(22050, 900.0);

        // One second of a 440 Hz tone at 44.1 kHz
        let samples: Vec<f32> = (0..44100)
            .map(|i| {
                let t = i as f32 / 44100.0;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();

        let resampled = loader.resample_mono(samples, 44100).unwrap();

        let expected = 22050usize;
        let tolerance = expected / 100;
        assert!(
            resampled.len().abs_diff(expected) <= tolerance,
            "Expected ~{} frames, got {}",
            expected,
            resampled.len()
        );
    }

    #[test]
    fn resample_empty_input_is_empty() {
        let loader = SymphoniaLoader::new(44100, 900.0);
        let resampled = loader.resample_mono(Vec::new(), 48000).unwrap();
        assert!(resampled.is_empty());
    }
}
