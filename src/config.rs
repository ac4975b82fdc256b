//! Configuration for a batch evaluation run
//!
//! Built-in defaults cover the reference deployment (six canonical track
//! types); an optional TOML file overrides the track list and analysis
//! parameters so the set is extensible without a code change.

use crate::error::{Error, Result};
use crate::types::TrackType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Track-type labels of the reference deployment.
const DEFAULT_TRACK_TYPES: [&str; 6] = ["hinch", "dadr", "kervo1", "kervo2", "khemto", "pchandi"];

/// Evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Ordered track-type labels; order fixes per-report row order and
    /// diagnostic order
    pub track_types: Vec<TrackType>,

    /// Fixed reference sample rate all assets are resampled to (Hz)
    pub reference_sample_rate: u32,

    /// STFT window length for onset detection (samples)
    pub fft_size: usize,

    /// Hop between analysis frames (samples). Shared by every detection call
    /// in a run; teacher and student counts are only comparable at one hop.
    pub hop_length: usize,

    /// Decoded-duration cap (seconds). Oversized or runaway inputs are
    /// rejected as decode failures instead of stalling a worker.
    pub max_duration_secs: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            track_types: DEFAULT_TRACK_TYPES.iter().map(|l| TrackType::new(l)).collect(),
            reference_sample_rate: 44100,
            fft_size: 2048,
            hop_length: 512,
            max_duration_secs: 900.0,
        }
    }
}

impl EvalConfig {
    /// Load configuration, TOML file over defaults.
    ///
    /// `None` yields the built-in defaults. An explicitly named file that is
    /// missing or malformed is a fatal configuration error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter ranges and the track-type set.
    pub fn validate(&self) -> Result<()> {
        if self.track_types.is_empty() {
            return Err(Error::Config("track_types must not be empty".to_string()));
        }
        if self.track_types.iter().any(|t| t.label().is_empty()) {
            return Err(Error::Config(
                "track_types contains a label with no alphanumeric characters".to_string(),
            ));
        }
        if self.hop_length == 0 || self.fft_size == 0 {
            return Err(Error::Config(
                "fft_size and hop_length must be non-zero".to_string(),
            ));
        }
        if self.hop_length > self.fft_size {
            return Err(Error::Config(format!(
                "hop_length ({}) must not exceed fft_size ({})",
                self.hop_length, self.fft_size
            )));
        }
        if self.reference_sample_rate == 0 {
            return Err(Error::Config("reference_sample_rate must be non-zero".to_string()));
        }
        if self.max_duration_secs <= 0.0 {
            return Err(Error::Config("max_duration_secs must be positive".to_string()));
        }

        // A label that is a substring of a later label can shadow it; the
        // first-match tie-break makes this deterministic but it is usually a
        // configuration mistake worth flagging.
        for (i, a) in self.track_types.iter().enumerate() {
            for b in self.track_types.iter().skip(i + 1) {
                if a == b {
                    return Err(Error::Config(format!(
                        "duplicate track type '{}' in track_types",
                        a
                    )));
                }
                if b.label().contains(a.label()) || a.label().contains(b.label()) {
                    warn!(
                        first = %a,
                        second = %b,
                        "overlapping track-type labels; files matching both resolve to the first candidate in scan order"
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_six_track_types() {
        let config = EvalConfig::default();
        assert_eq!(config.track_types.len(), 6);
        assert_eq!(config.reference_sample_rate, 44100);
        assert_eq!(config.hop_length, 512);
        config.validate().unwrap();
    }

    #[test]
    fn toml_overrides_track_list() {
        let parsed: EvalConfig =
            toml::from_str(r#"track_types = ["taal1", "Taal-2"]"#).unwrap();
        // labels normalize on deserialization
        assert_eq!(parsed.track_types, vec![TrackType::new("taal1"), TrackType::new("taal2")]);
        // untouched fields keep their defaults
        assert_eq!(parsed.fft_size, 2048);
        parsed.validate().unwrap();
    }

    #[test]
    fn empty_track_list_is_rejected() {
        let config = EvalConfig {
            track_types: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_track_labels_are_rejected() {
        let config = EvalConfig {
            track_types: vec![TrackType::new("kervo1"), TrackType::new("Kervo_1")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_config_file_is_fatal() {
        let result = EvalConfig::load(Some(Path::new("/nonexistent/rhythmeval.toml")));
        assert!(result.is_err());
    }
}
