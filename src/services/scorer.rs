//! Onset-count similarity scoring
//!
//! Compares two recordings by the number of detected rhythmic onsets:
//! `score = 1 - |n_t - n_s| / n_t` where `n_t` is the teacher's onset count.
//! The score is 1.0 exactly when the counts match, falls linearly with the
//! count difference, and is unbounded below; no other clamping is applied.
//!
//! The metric is direction-insensitive: a student with two extra onsets and
//! a student with two dropped onsets score the same, although the failure
//! modes differ (extra noise vs. dropped beats). This coarseness is part of
//! the contract. An order-sensitive scorer (onset-time alignment) can replace
//! this one behind the same interface without touching the batch layer.

use crate::audio::WaveformLoader;
use crate::services::onset_detector::OnsetDetector;
use crate::types::AudioAsset;
use std::path::PathBuf;
use thiserror::Error;

/// Scoring errors
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Asset cannot be decoded or resampled; recovered per comparison
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Teacher reference has no detectable onsets; the same reference is
    /// reused for every student, so this poisons its track type for the run
    #[error("Degenerate reference '{reference}': no detectable onsets")]
    DegenerateReference { reference: String },
}

/// Pure score arithmetic.
///
/// Returns `None` when the teacher count is zero (the score is undefined);
/// callers decide how to surface that. `n_s = 0` against a non-zero teacher
/// is a defined score of `0.0`, not an error.
pub fn score_from_counts(teacher_onsets: usize, student_onsets: usize) -> Option<f64> {
    if teacher_onsets == 0 {
        return None;
    }
    let diff = teacher_onsets.abs_diff(student_onsets) as f64;
    Some(1.0 - diff / teacher_onsets as f64)
}

/// Rhythm similarity scorer
///
/// Owns the decode seam and the onset detector; both recordings in a
/// comparison go through the same fixed detection configuration.
pub struct RhythmScorer {
    loader: Box<dyn WaveformLoader>,
    detector: OnsetDetector,
}

impl RhythmScorer {
    pub fn new(loader: Box<dyn WaveformLoader>, detector: OnsetDetector) -> Self {
        Self { loader, detector }
    }

    /// Decode one asset and count its onsets.
    pub fn count_onsets(&self, asset: &AudioAsset) -> Result<usize, ScoreError> {
        let waveform = self
            .loader
            .load(asset.path())
            .map_err(|e| ScoreError::Decode {
                path: asset.path().to_path_buf(),
                message: format!("{:#}", e),
            })?;

        let onsets = self.detector.detect(&waveform);
        tracing::debug!(
            path = %asset.path().display(),
            owner = %asset.owner,
            onsets = onsets.len(),
            duration_secs = format!("{:.2}", waveform.duration_seconds()),
            "Onset detection complete"
        );

        Ok(onsets.len())
    }

    /// Score a student recording against a teacher reference.
    pub fn score(&self, teacher: &AudioAsset, student: &AudioAsset) -> Result<f64, ScoreError> {
        let n_t = self.count_onsets(teacher)?;
        let n_s = self.count_onsets(student)?;

        score_from_counts(n_t, n_s).ok_or_else(|| ScoreError::DegenerateReference {
            reference: teacher.file_name().to_string(),
        })
    }
}
