//! Track-type matching for candidate recordings
//!
//! Pairs a track-type label with the recording that carries it in its file
//! name. Matching is purely lexical: the candidate's base name is reduced to
//! lowercase alphanumerics and the (already normalized) label must appear in
//! it as a contiguous substring. `Teacher_Kervo1 take2.M4A` therefore matches
//! `kervo1`, and case or punctuation in submissions never matters.
//!
//! When several candidates match, the first in input order wins. Callers pass
//! scanner output, which is path-sorted, so the choice is deterministic; with
//! overlapping labels (one a prefix of another) this tie-break is what keeps
//! resolution stable rather than incidental.

use crate::types::{AudioAsset, TrackType};

/// Reduce a file's base name to the form labels are matched against.
fn normalize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Track matcher
///
/// Stateless; a struct only so the orchestrator can hold one per run next to
/// the other services.
#[derive(Debug, Default)]
pub struct TrackMatcher;

impl TrackMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Find the candidate whose normalized base name contains `track_type`.
    ///
    /// Returns `None` when nothing matches; absence is an expected,
    /// reportable condition, not a fault. Pure function of its inputs.
    pub fn find<'a>(
        &self,
        track_type: &TrackType,
        candidates: &'a [AudioAsset],
    ) -> Option<&'a AudioAsset> {
        candidates
            .iter()
            .find(|asset| normalize_file_name(asset.file_name()).contains(track_type.label()))
    }
}
