//! Onset detection
//!
//! Spectral-flux novelty with adaptive peak picking. The waveform is framed
//! with a Hann window at a fixed hop, the half-wave-rectified magnitude
//! difference between consecutive frames is summed into a novelty curve, and
//! onsets are the curve's local maxima above a moving-average threshold.
//!
//! The hop length must be identical for every detection call in a run:
//! onset counts taken at different hops are not comparable.

use crate::audio::Waveform;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

/// Onset detector configuration errors
#[derive(Debug, Error)]
pub enum OnsetError {
    /// Invalid detection parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Spectral-flux onset detector
pub struct OnsetDetector {
    /// STFT window length in samples
    fft_size: usize,
    /// Hop between frames in samples
    hop_length: usize,
    /// Peak must exceed the local mean by this much (on the max-normalized
    /// novelty curve)
    delta: f32,
    /// Minimum gap between reported onsets, in frames
    wait: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

/// Local-maximum half-width in frames
const PEAK_HALF_WIDTH: usize = 3;
/// Moving-average half-width in frames
const AVG_HALF_WIDTH: usize = 15;
/// Novelty curves whose peak never reaches this raw magnitude are treated as
/// silence; normalizing them would only amplify rounding noise.
const FLUX_FLOOR: f32 = 1e-3;

impl OnsetDetector {
    /// Create a detector for the given frame and hop lengths.
    pub fn new(fft_size: usize, hop_length: usize) -> Result<Self, OnsetError> {
        if fft_size == 0 || hop_length == 0 {
            return Err(OnsetError::InvalidParameters(
                "fft_size and hop_length must be non-zero".to_string(),
            ));
        }
        if hop_length > fft_size {
            return Err(OnsetError::InvalidParameters(format!(
                "hop_length ({}) must not exceed fft_size ({})",
                hop_length, fft_size
            )));
        }

        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        // Hann window
        let window = (0..fft_size)
            .map(|i| {
                let x = i as f32 / fft_size as f32;
                0.5 - 0.5 * (2.0 * std::f32::consts::PI * x).cos()
            })
            .collect();

        Ok(Self {
            fft_size,
            hop_length,
            delta: 0.05,
            wait: 5,
            fft,
            window,
        })
    }

    /// Override the peak-picking threshold offset.
    pub fn with_delta(mut self, delta: f32) -> Result<Self, OnsetError> {
        if !(0.0..=1.0).contains(&delta) {
            return Err(OnsetError::InvalidParameters(
                "delta must be within [0, 1]".to_string(),
            ));
        }
        self.delta = delta;
        Ok(self)
    }

    /// Override the minimum inter-onset gap in frames.
    pub fn with_wait(mut self, wait: usize) -> Self {
        self.wait = wait;
        self
    }

    /// Detect onset positions as frame indices.
    ///
    /// Pure function of the waveform; an input shorter than one frame, or
    /// one with no spectral activity, yields an empty set.
    pub fn detect(&self, waveform: &Waveform) -> Vec<usize> {
        let flux = self.novelty_curve(&waveform.samples);
        self.pick_peaks(&flux)
    }

    /// Frame-to-frame half-wave-rectified spectral flux.
    fn novelty_curve(&self, samples: &[f32]) -> Vec<f32> {
        if samples.len() < self.fft_size {
            return Vec::new();
        }

        let num_frames = 1 + (samples.len() - self.fft_size) / self.hop_length;
        let num_bins = self.fft_size / 2 + 1;

        let mut flux = Vec::with_capacity(num_frames);
        let mut prev_magnitudes = vec![0.0f32; num_bins];
        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); self.fft_size];

        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_length;
            let frame = &samples[start..start + self.fft_size];

            for (slot, (&sample, &w)) in buffer.iter_mut().zip(frame.iter().zip(&self.window)) {
                *slot = Complex::new(sample * w, 0.0);
            }
            self.fft.process(&mut buffer);

            let mut frame_flux = 0.0f32;
            for (bin, prev) in buffer[..num_bins].iter().zip(prev_magnitudes.iter_mut()) {
                let magnitude = bin.norm();
                frame_flux += (magnitude - *prev).max(0.0);
                *prev = magnitude;
            }

            // The first frame has no predecessor; its rise is the signal
            // appearing, not an onset transition between frames.
            flux.push(if frame_idx == 0 { 0.0 } else { frame_flux });
        }

        flux
    }

    /// Pick local maxima above the moving average, at least `wait` frames
    /// apart.
    fn pick_peaks(&self, flux: &[f32]) -> Vec<usize> {
        let max_flux = flux.iter().cloned().fold(0.0f32, f32::max);
        if max_flux < FLUX_FLOOR {
            return Vec::new();
        }

        let normalized: Vec<f32> = flux.iter().map(|v| v / max_flux).collect();

        let mut onsets: Vec<usize> = Vec::new();
        for i in 0..normalized.len() {
            let value = normalized[i];

            let lo = i.saturating_sub(PEAK_HALF_WIDTH);
            let hi = (i + PEAK_HALF_WIDTH + 1).min(normalized.len());
            let is_local_max = normalized[lo..hi].iter().all(|&v| v <= value);
            if !is_local_max || value <= 0.0 {
                continue;
            }

            let lo = i.saturating_sub(AVG_HALF_WIDTH);
            let hi = (i + AVG_HALF_WIDTH + 1).min(normalized.len());
            let local_mean = normalized[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
            if value < local_mean + self.delta {
                continue;
            }

            if let Some(&last) = onsets.last() {
                if i - last < self.wait {
                    continue;
                }
            }

            onsets.push(i);
        }

        onsets
    }
}
