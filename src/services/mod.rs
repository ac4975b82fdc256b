//! Service modules for the evaluation workflow

pub mod file_scanner;
pub mod onset_detector;
pub mod scorer;
pub mod track_matcher;

pub use file_scanner::{FileScanner, ScanError};
pub use onset_detector::{OnsetDetector, OnsetError};
pub use scorer::{score_from_counts, RhythmScorer, ScoreError};
pub use track_matcher::TrackMatcher;
