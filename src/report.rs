//! Per-student report writeout
//!
//! One CSV per student folder, named after the folder: a header row,
//! then one row per successfully scored track type with the matched teacher
//! and student base names and the score at f64 native precision.

use crate::types::StudentReport;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Report writing errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report file cannot be written
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// CSV report writer
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Create the output directory if missing.
    pub fn ensure_output_dir(&self) -> crate::error::Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| crate::error::Error::OutputDir {
            path: self.output_dir.clone(),
            source: e,
        })
    }

    /// Write one student's report as `<student>.csv`.
    pub fn write(&self, report: &StudentReport) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(format!("{}.csv", report.student));
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };

        let file = std::fs::File::create(&path).map_err(io_err)?;
        let mut writer = std::io::BufWriter::new(file);

        writeln!(writer, "Teacher Track,Student Track,Score").map_err(io_err)?;
        for entry in &report.entries {
            writeln!(
                writer,
                "{},{},{}",
                csv_field(&entry.teacher_track),
                csv_field(&entry.student_track),
                entry.score
            )
            .map_err(io_err)?;
        }

        writer.flush().map_err(io_err)?;
        Ok(path)
    }
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreEntry;
    use tempfile::TempDir;

    fn report() -> StudentReport {
        let mut report = StudentReport::new("alice");
        report.push(ScoreEntry {
            teacher_track: "kervo1.wav".to_string(),
            student_track: "My-Kervo1-Track.wav".to_string(),
            score: 0.8,
        });
        report.push(ScoreEntry {
            teacher_track: "dadr.wav".to_string(),
            student_track: "dadr_take2.m4a".to_string(),
            score: 1.0,
        });
        report
    }

    #[test]
    fn writes_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(temp_dir.path());

        let path = writer.write(&report()).unwrap();
        assert_eq!(path.file_name().unwrap(), "alice.csv");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Teacher Track,Student Track,Score");
        assert_eq!(lines[1], "kervo1.wav,My-Kervo1-Track.wav,0.8");
        assert_eq!(lines[2], "dadr.wav,dadr_take2.m4a,1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_report_is_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(temp_dir.path());

        let path = writer.write(&StudentReport::new("bob")).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Teacher Track,Student Track,Score\n");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        assert_eq!(csv_field("a,b.wav"), "\"a,b.wav\"");
        assert_eq!(csv_field("plain.wav"), "plain.wav");
        assert_eq!(csv_field("say \"hi\".wav"), "\"say \"\"hi\"\".wav\"");
    }

    #[test]
    fn ensure_output_dir_creates_nested_path() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("out/scores");
        let writer = ReportWriter::new(&nested);
        writer.ensure_output_dir().unwrap();
        assert!(nested.is_dir());
    }
}
