//! Repeatedly reads new bytes past a remembered offset, producing complete
//! lines and surviving partial trailing writes (§4.3).

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, Error)]
pub enum TailerError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} shrank from offset {offset} to {new_len} bytes, treating as rotation")]
    Rotated {
        path: PathBuf,
        offset: u64,
        new_len: u64,
    },
}

/// Tails one file from a remembered byte offset. Does not itself sleep
/// between polls or count consecutive failures across polls — the caller
/// (the lifecycle controller) owns the poll cadence and the failure
/// threshold in §7/§8.
pub struct Tailer {
    path: PathBuf,
    offset: u64,
    /// Bytes read past the last complete newline; held back until a
    /// newline completes the line, never counted against `offset`.
    pending: Vec<u8>,
}

impl Tailer {
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads everything appended since the last poll. Returns an empty
    /// vector (not an error) when the file does not yet exist, matching the
    /// "poll" behavior in §4.3.
    pub async fn poll(&mut self) -> Result<Vec<String>, TailerError> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TailerError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let metadata = file.metadata().await.map_err(|e| TailerError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        let len = metadata.len();
        if len < self.offset {
            return Err(TailerError::Rotated {
                path: self.path.clone(),
                offset: self.offset,
                new_len: len,
            });
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(std::io::SeekFrom::Start(self.offset))
            .await
            .map_err(|e| TailerError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut buf).await.map_err(|e| TailerError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        self.pending.extend_from_slice(&buf);

        let mut lines = Vec::new();
        let mut consumed = 0usize;
        let mut start = 0usize;
        for (i, &byte) in self.pending.iter().enumerate() {
            if byte == b'\n' {
                let line = &self.pending[start..i];
                let line = String::from_utf8_lossy(line).into_owned();
                lines.push(line);
                start = i + 1;
                consumed = start;
            }
        }
        self.pending.drain(..consumed);
        self.offset += consumed as u64;

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn reads_new_complete_lines_and_advances_offset() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Connected at 2024-01-15T00:00:00Z").unwrap();
        let mut tailer = Tailer::new(file.path(), 0);
        let lines = tailer.poll().await.unwrap();
        assert_eq!(lines, vec!["Connected at 2024-01-15T00:00:00Z"]);
        assert!(tailer.offset() > 0);

        let empty = tailer.poll().await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn holds_back_partial_trailing_line_across_polls() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Conn").unwrap();
        file.flush().unwrap();
        let mut tailer = Tailer::new(file.path(), 0);
        let first = tailer.poll().await.unwrap();
        assert!(first.is_empty());

        write!(file, "ected at 2024-01-15T00:00:00Z\n").unwrap();
        file.flush().unwrap();
        let second = tailer.poll().await.unwrap();
        assert_eq!(second, vec!["Connected at 2024-01-15T00:00:00Z"]);
    }

    #[tokio::test]
    async fn missing_file_polls_empty_not_error() {
        let mut tailer = Tailer::new("/nonexistent/path/does-not-exist.log", 0);
        let lines = tailer.poll().await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn shrunken_file_is_reported_as_rotation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Connected at 2024-01-15T00:00:00Z").unwrap();
        let mut tailer = Tailer::new(file.path(), 0);
        tailer.poll().await.unwrap();

        file.as_file_mut().set_len(0).unwrap();
        let err = tailer.poll().await.unwrap_err();
        assert!(matches!(err, TailerError::Rotated { .. }));
    }
}
