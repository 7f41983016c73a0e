//! Journal file discovery and rotation detection.
//!
//! The game starts a new `Journal.<timestamp>.<part>.log` file per session
//! (and when a file grows too large). The newest one by modification time is
//! the file being written.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;

/// Rotation glob for journal files.
pub const JOURNAL_PATTERN: &str = "Journal.*.log";

/// A directory entry matching the journal pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// File name only; identity of the active file is by name.
    pub name: String,
    pub modified: SystemTime,
}

impl CandidateFile {
    /// Newest-wins ordering: later mtime, then lexicographically greater name.
    fn recency_cmp(&self, other: &Self) -> Ordering {
        self.modified
            .cmp(&other.modified)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Lists journal files in a directory and picks the newest.
///
/// Scanning never fails: a missing or unreadable directory simply has no
/// candidates.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    dir: PathBuf,
    pattern: Pattern,
}

impl DirectoryScanner {
    /// Create a scanner using [`JOURNAL_PATTERN`].
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            pattern: journal_pattern(),
        }
    }

    /// The directory being scanned.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a file name matches the rotation glob.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }

    /// Whether a path names a journal file inside the watched directory.
    #[must_use]
    pub fn is_journal_path(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path())
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.matches(n))
    }

    /// All journal files currently in the directory.
    #[must_use]
    pub fn candidates(&self) -> Vec<CandidateFile> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if !self.matches(&name) {
                    return None;
                }
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let modified = metadata.modified().ok()?;
                Some(CandidateFile {
                    path: entry.path(),
                    name,
                    modified,
                })
            })
            .collect()
    }

    /// The newest journal file, if any.
    ///
    /// Ties on modification time go to the lexicographically greatest name,
    /// so the result does not depend on directory listing order.
    #[must_use]
    pub fn latest(&self) -> Option<CandidateFile> {
        self.candidates()
            .into_iter()
            .max_by(CandidateFile::recency_cmp)
    }

    /// Re-evaluate the newest file against the currently active one.
    ///
    /// Returns the new file only when its name differs from `current`.
    #[must_use]
    pub fn rescan(&self, current: Option<&str>) -> Option<CandidateFile> {
        let latest = self.latest()?;
        if current == Some(latest.name.as_str()) {
            None
        } else {
            Some(latest)
        }
    }
}

fn journal_pattern() -> Pattern {
    Pattern::new(JOURNAL_PATTERN)
        .unwrap_or_else(|e| unreachable!("journal pattern is a valid glob: {e}"))
}
