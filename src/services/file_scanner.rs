//! Audio file discovery
//!
//! Enumerates the teacher reference directory and the per-student
//! subdirectories of the student root. Candidates are filtered by extension
//! and verified by magic bytes so stray files in a submission folder never
//! reach the decoder.

use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Audio file scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// Audio file scanner
pub struct FileScanner {
    ignore_patterns: Vec<String>,
}

impl FileScanner {
    /// Create new file scanner with default ignore patterns
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, etc.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
        }
    }

    /// Scan one directory for audio files.
    ///
    /// Traversal is sequential (symlink-loop bookkeeping is mutable);
    /// magic-byte verification fans out over rayon. The result is sorted by
    /// path so downstream first-match tie-breaks are stable across
    /// filesystems.
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let mut candidate_files = Vec::new();
        let mut symlink_visited = HashSet::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        candidate_files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        let mut audio_files: Vec<PathBuf> = candidate_files
            .par_iter()
            .filter_map(|path| match self.is_audio_file(path) {
                Ok(true) => Some(path.clone()),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!("Error verifying {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        audio_files.sort();

        tracing::debug!(
            root = %root_path.display(),
            candidates = candidate_files.len(),
            audio = audio_files.len(),
            "Directory scan complete"
        );

        Ok(audio_files)
    }

    /// Enumerate student subdirectories of the student root.
    ///
    /// Returns (folder name, path) pairs sorted by name. Plain files directly
    /// under the root are ignored; every student is a folder.
    pub fn student_folders(&self, student_root: &Path) -> Result<Vec<(String, PathBuf)>, ScanError> {
        if !student_root.exists() {
            return Err(ScanError::PathNotFound(student_root.to_path_buf()));
        }
        if !student_root.is_dir() {
            return Err(ScanError::NotADirectory(student_root.to_path_buf()));
        }

        let mut folders = Vec::new();
        let entries = std::fs::read_dir(student_root)
            .map_err(|e| ScanError::FileAccessError(student_root.to_path_buf(), e.to_string()))?;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error reading student root entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if self.ignore_patterns.iter().any(|p| name.contains(p)) {
                continue;
            }
            folders.push((name, path));
        }

        folders.sort();
        Ok(folders)
    }

    /// Check if entry should be processed
    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        for pattern in &self.ignore_patterns {
            if file_name.contains(pattern) {
                return false;
            }
        }

        // Detect symlink loops
        if entry.file_type().is_symlink() {
            if let Ok(canonical) = path.canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", path.display());
                    return false;
                }
            }
        }

        true
    }

    /// Check if file is audio format
    fn is_audio_file(&self, path: &Path) -> Result<bool, ScanError> {
        // 1. Check extension first (fast)
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.is_audio_extension(&ext_lower) {
                // 2. Verify with magic bytes (reliable)
                return self.verify_magic_bytes(path);
            }
        }

        Ok(false)
    }

    /// Check if extension is audio
    fn is_audio_extension(&self, ext: &str) -> bool {
        matches!(
            ext,
            "mp3" | "flac" | "ogg" | "oga" | "m4a" | "aac" | "mp4" | "wav" | "opus"
        )
    }

    /// Verify file type using magic bytes
    fn verify_magic_bytes(&self, path: &Path) -> Result<bool, ScanError> {
        let mut file = File::open(path)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

        let mut buffer = [0u8; 12];
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

        if bytes_read < 4 {
            return Ok(false); // Too small to be audio
        }

        let is_audio = match &buffer[..bytes_read.min(12)] {
            // MP3
            [0xFF, 0xFB, ..] | [0xFF, 0xF3, ..] | [0xFF, 0xF2, ..] => true,
            [b'I', b'D', b'3', ..] => true, // MP3 with ID3 tag

            // FLAC
            [b'f', b'L', b'a', b'C', ..] => true,

            // OGG (Vorbis/Opus)
            [b'O', b'g', b'g', b'S', ..] => true,

            // M4A/AAC (MP4 container)
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => true,

            // WAV
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E'] => true,

            _ => false,
        };

        Ok(is_audio)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_audio_extension_detection() {
        let scanner = FileScanner::new();
        assert!(scanner.is_audio_extension("mp3"));
        assert!(scanner.is_audio_extension("flac"));
        assert!(scanner.is_audio_extension("m4a"));
        assert!(!scanner.is_audio_extension("txt"));
        assert!(!scanner.is_audio_extension("pdf"));
    }

    #[test]
    fn test_scan_nonexistent_path() {
        let scanner = FileScanner::new();
        let result = scanner.scan(Path::new("/nonexistent/path"));
        assert!(matches!(result, Err(ScanError::PathNotFound(_))));
    }

    #[test]
    fn test_scan_skips_non_audio_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("kervo1.wav"), b"RIFF\x00\x00\x00\x00WAVEfmt ").unwrap();
        fs::write(root.join("notes.txt"), b"lesson notes").unwrap();
        // Audio extension but wrong content
        fs::write(root.join("fake.mp3"), b"not really audio").unwrap();

        let scanner = FileScanner::new();
        let files = scanner.scan(root).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "kervo1.wav");
    }

    #[test]
    fn test_scan_output_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in ["zeta.wav", "alpha.wav", "mid.wav"] {
            fs::write(root.join(name), b"RIFF\x00\x00\x00\x00WAVEfmt ").unwrap();
        }

        let scanner = FileScanner::new();
        let files = scanner.scan(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha.wav", "mid.wav", "zeta.wav"]);
    }

    #[test]
    fn test_student_folders_ignores_plain_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("alice")).unwrap();
        fs::create_dir(root.join("bob")).unwrap();
        fs::write(root.join("README.txt"), b"ignored").unwrap();

        let scanner = FileScanner::new();
        let folders = scanner.student_folders(root).unwrap();
        let names: Vec<_> = folders.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }
}
