//! Incremental journal file tailer.
//!
//! Holds an open handle to the active journal and a byte cursor into it.
//! Only complete lines are returned; a trailing partial line stays unread
//! until the writer finishes it.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::error::WatcherError;

/// Incremental reader over one journal file.
///
/// The handle is opened read-only. On Windows the standard library opens
/// files with read, write and delete sharing, so the game can keep appending
/// while we read.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    file: File,
    /// Bytes of the file already consumed. Always at a line boundary.
    offset: u64,
}

impl FileTailer {
    /// Open `path` with the cursor at the start of the file.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::FileDeleted`] or
    /// [`WatcherError::PermissionDenied`] when the file cannot be opened.
    pub async fn open(path: PathBuf) -> Result<Self, WatcherError> {
        Self::open_at(path, 0).await
    }

    /// Open `path` with the cursor at `offset`.
    ///
    /// # Errors
    ///
    /// Same as [`FileTailer::open`].
    pub async fn open_at(path: PathBuf, offset: u64) -> Result<Self, WatcherError> {
        let file = File::open(&path)
            .await
            .map_err(|e| WatcherError::from_open(path.clone(), e))?;
        Ok(Self { path, file, offset })
    }

    /// Current byte offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Path being tailed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the complete lines appended since the last read.
    ///
    /// Blank lines are dropped. If the file shrank below the cursor, the
    /// cursor is clamped to the new length and nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::Io`] if the file cannot be stat'ed, seeked or
    /// read. The cursor is left unchanged in that case.
    pub async fn read_new_lines(&mut self) -> Result<Vec<String>, WatcherError> {
        let file_len = self.file.metadata().await?.len();

        if file_len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = file_len,
                "Journal file shrank, clamping cursor to its length"
            );
            self.offset = file_len;
        }

        if file_len == self.offset {
            return Ok(Vec::new());
        }

        self.file.seek(SeekFrom::Start(self.offset)).await?;

        let available = file_len - self.offset;
        let mut buf = Vec::with_capacity(usize::try_from(available).unwrap_or(0));
        (&mut self.file).take(available).read_to_end(&mut buf).await?;

        let (lines, consumed) = split_complete_lines(&buf);
        self.offset += consumed as u64;

        if consumed < buf.len() {
            tracing::trace!(
                path = %self.path.display(),
                pending = buf.len() - consumed,
                "Holding back partial line"
            );
        }

        Ok(lines)
    }
}

/// Split `buf` into newline-terminated lines.
///
/// Returns the non-blank lines (without `\n` or `\r\n`) and the number of
/// bytes they span. Bytes after the last `\n` are not consumed.
#[must_use]
pub fn split_complete_lines(buf: &[u8]) -> (Vec<String>, usize) {
    let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
        return (Vec::new(), 0);
    };
    let complete = &buf[..=last_newline];

    let lines = complete
        .split_inclusive(|&b| b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\n").unwrap_or(line);
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8_lossy(line).into_owned()
        })
        .filter(|line| !line.trim().is_empty())
        .collect();

    (lines, complete.len())
}
