//! Core types for rhythm evaluation
//!
//! Plain data carried between the scanner, matcher, scorer and report
//! writer. Everything here is immutable once constructed; per-comparison
//! derived data (waveforms, onset sets) lives in the modules that produce it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Canonical identifier for one piece/exercise, shared between teacher and
/// student recordings.
///
/// The label is stored normalized (lowercase, alphanumeric only) so it can be
/// substring-matched directly against normalized file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TrackType(String);

impl TrackType {
    /// Create a track type from a configured label.
    ///
    /// Non-alphanumeric characters are stripped and the remainder lowercased,
    /// mirroring the candidate-filename normalization in the matcher.
    pub fn new(label: &str) -> Self {
        Self(
            label
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        )
    }

    /// Normalized label text.
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Configured labels normalize on the way in, wherever they come from.
impl From<String> for TrackType {
    fn from(label: String) -> Self {
        Self::new(&label)
    }
}

impl From<TrackType> for String {
    fn from(track_type: TrackType) -> String {
        track_type.0
    }
}

/// Owning group of a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Reference recording from the teacher directory
    Teacher,
    /// Recording from a named student folder
    Student(String),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Teacher => f.write_str("teacher"),
            Owner::Student(name) => write!(f, "student {}", name),
        }
    }
}

/// A named, located audio recording on durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    /// Filesystem path of the recording
    pub path: PathBuf,
    /// Group the recording belongs to
    pub owner: Owner,
}

impl AudioAsset {
    pub fn new(path: impl Into<PathBuf>, owner: Owner) -> Self {
        Self {
            path: path.into(),
            owner,
        }
    }

    /// Base name (last path segment, extension kept) used in reports and
    /// diagnostics.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One (teacher, student, score) result for a single track type.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    /// Matched teacher file base name (with extension)
    pub teacher_track: String,
    /// Matched student file base name (with extension)
    pub student_track: String,
    /// Similarity score, `1 - |n_t - n_s| / n_t`
    pub score: f64,
}

/// Ordered collection of score entries for one student folder.
///
/// Created when the student's processing starts and finalized once every
/// configured track type has been attempted; a partial or empty report is a
/// valid outcome.
#[derive(Debug, Clone)]
pub struct StudentReport {
    /// Student folder name (also the report file stem)
    pub student: String,
    /// One entry per successfully scored track type, in configuration order
    pub entries: Vec<ScoreEntry>,
}

impl StudentReport {
    pub fn new(student: impl Into<String>) -> Self {
        Self {
            student: student.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ScoreEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
