//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while tailing the journal directory.
///
/// None of these escape [`TailerController`](super::TailerController); they
/// are logged and the next trigger tries again.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Journal file disappeared before it could be opened.
    #[error("Journal file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    /// Classify an error from opening `path`.
    pub(crate) fn from_open(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileDeleted(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io(err),
        }
    }
}
