//! Batch evaluation workflow
//!
//! Resolves the teacher reference table once per run, then evaluates student
//! folders independently over a rayon worker pool. A single student's or
//! track type's failure never aborts the run; only a missing teacher or
//! student root at startup is fatal.

use crate::config::EvalConfig;
use crate::error::Result;
use crate::services::file_scanner::FileScanner;
use crate::services::scorer::{score_from_counts, RhythmScorer, ScoreError};
use crate::services::track_matcher::TrackMatcher;
use crate::types::{AudioAsset, Owner, ScoreEntry, StudentReport, TrackType};
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::{error, info, warn};

/// One resolved teacher reference: the matched asset and its onset count,
/// computed exactly once per run.
struct Reference {
    track_type: TrackType,
    asset: AudioAsset,
    /// Non-zero by construction: degenerate references never enter the table
    onsets: NonZeroUsize,
}

/// Batch evaluator
pub struct BatchEvaluator {
    config: EvalConfig,
    scanner: FileScanner,
    matcher: TrackMatcher,
    scorer: RhythmScorer,
}

impl BatchEvaluator {
    pub fn new(config: EvalConfig, scorer: RhythmScorer) -> Self {
        Self {
            config,
            scanner: FileScanner::new(),
            matcher: TrackMatcher::new(),
            scorer,
        }
    }

    /// Evaluate every student folder under `student_root` against the
    /// references in `teacher_dir`.
    ///
    /// Returns one report per student folder, sorted by folder name. Reports
    /// may be partial or empty; every omission has been logged with its
    /// track type and student folder.
    pub fn run(&self, teacher_dir: &Path, student_root: &Path) -> Result<Vec<StudentReport>> {
        let references = self.resolve_references(teacher_dir)?;
        if references.is_empty() {
            warn!("No usable teacher references; all reports will be empty");
        }

        let students = self.scanner.student_folders(student_root)?;
        info!(
            students = students.len(),
            references = references.len(),
            "Starting batch evaluation"
        );

        // Student folders are mutually independent; each worker owns its
        // report until handoff.
        let reports: Vec<StudentReport> = students
            .par_iter()
            .map(|(name, folder)| self.evaluate_student(name, folder, &references))
            .collect();

        Ok(reports)
    }

    /// Build the reference table: one (asset, onset count) per track type.
    ///
    /// A track type whose reference is missing, undecodable, or degenerate
    /// (zero onsets) is excluded from the whole run with a single
    /// error-level diagnostic, instead of failing per student.
    fn resolve_references(&self, teacher_dir: &Path) -> Result<Vec<Reference>> {
        let paths = self.scanner.scan(teacher_dir)?;
        let candidates: Vec<AudioAsset> = paths
            .into_iter()
            .map(|p| AudioAsset::new(p, Owner::Teacher))
            .collect();

        let mut references = Vec::with_capacity(self.config.track_types.len());

        for track_type in &self.config.track_types {
            let Some(asset) = self.matcher.find(track_type, &candidates) else {
                error!(
                    track_type = %track_type,
                    dir = %teacher_dir.display(),
                    "Teacher reference not found; track type excluded from this run"
                );
                continue;
            };

            let count = match self.scorer.count_onsets(asset) {
                Ok(count) => count,
                Err(e) => {
                    error!(
                        track_type = %track_type,
                        error = %e,
                        "Teacher reference unusable; track type excluded from this run"
                    );
                    continue;
                }
            };

            let Some(onsets) = NonZeroUsize::new(count) else {
                let e = ScoreError::DegenerateReference {
                    reference: asset.file_name().to_string(),
                };
                error!(
                    track_type = %track_type,
                    error = %e,
                    "Track type excluded from this run"
                );
                continue;
            };

            references.push(Reference {
                track_type: track_type.clone(),
                asset: asset.clone(),
                onsets,
            });
        }

        Ok(references)
    }

    /// Evaluate one student folder against the reference table.
    fn evaluate_student(
        &self,
        student: &str,
        folder: &Path,
        references: &[Reference],
    ) -> StudentReport {
        let mut report = StudentReport::new(student);

        let candidates = match self.scanner.scan(folder) {
            Ok(paths) => paths
                .into_iter()
                .map(|p| AudioAsset::new(p, Owner::Student(student.to_string())))
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(student = student, error = %e, "Cannot scan student folder");
                return report;
            }
        };

        for reference in references {
            let Some(asset) = self.matcher.find(&reference.track_type, &candidates) else {
                warn!(
                    track_type = %reference.track_type,
                    student = student,
                    "Student track not found"
                );
                continue;
            };

            let student_onsets = match self.scorer.count_onsets(asset) {
                Ok(count) => count,
                Err(e) => {
                    warn!(
                        track_type = %reference.track_type,
                        student = student,
                        error = %e,
                        "Skipping track"
                    );
                    continue;
                }
            };

            // The reference count is non-zero by construction
            let Some(score) = score_from_counts(reference.onsets.get(), student_onsets) else {
                continue;
            };

            report.push(ScoreEntry {
                teacher_track: reference.asset.file_name().to_string(),
                student_track: asset.file_name().to_string(),
                score,
            });
        }

        info!(
            student = student,
            scored = report.entries.len(),
            attempted = references.len(),
            "Student evaluation complete"
        );

        report
    }
}
