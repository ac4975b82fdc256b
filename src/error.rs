//! Crate-level error types
//!
//! Module seams (scanner, scorer, report writer) define their own error
//! enums; this type collects the ones that can end a run. Per-track-type
//! failures are recovered locally by the orchestrator and never reach here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rhythmeval operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error categories for a batch run
#[derive(Debug, Error)]
pub enum Error {
    /// Teacher or student root missing/unreadable at startup
    #[error(transparent)]
    Scan(#[from] crate::services::file_scanner::ScanError),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output directory cannot be created
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
