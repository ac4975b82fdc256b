//! Audio decoding and resampling
//!
//! The scorer only ever sees [`Waveform`] values produced through the
//! [`WaveformLoader`] seam, so the scoring algorithm stays unit-testable
//! without audio files and the decoding backend can be swapped without
//! touching scoring logic.

pub mod loader;

pub use loader::SymphoniaLoader;

use anyhow::Result;
use std::path::Path;

/// Decoded, uniformly-sampled mono audio.
///
/// Derived data: produced for a single comparison and dropped with it, never
/// cached or persisted.
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Mono samples, f32 in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decoding seam between the scorer and the audio backend.
pub trait WaveformLoader: Send + Sync {
    /// Decode and resample one recording to a mono waveform at the loader's
    /// reference rate.
    fn load(&self, path: &Path) -> Result<Waveform>;
}
