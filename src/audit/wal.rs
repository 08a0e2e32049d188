// Write-ahead log: an append-only, line-delimited JSON file on local disk.
//
// A single buffered writer with explicit flush on every append, plus
// line-delimited replay with per-line error isolation so a malformed line
// never invalidates the well-formed lines around it.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::error::{EngineError, Result};

use super::record::AuditRecord;

/// Append-only WAL writer. All four operations serialize against a single
/// internal mutex; only one writer or truncation proceeds at a time.
pub struct WalWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
    fsync_on_append: bool,
}

impl WalWriter {
    /// Open (creating if absent) the WAL file at `path`.
    ///
    /// If the file cannot be created, this returns an error; callers at
    /// the Lifecycle layer are expected to log it and degrade to WAL-less
    /// in-memory buffering rather than fail startup (spec's `FatalInit`
    /// failure mode).
    pub async fn open(path: impl AsRef<Path>, fsync_on_append: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
            fsync_on_append,
        })
    }

    pub async fn append_one(&self, record: &AuditRecord) -> Result<()> {
        self.append_many(std::slice::from_ref(record)).await
    }

    pub async fn append_many(&self, records: &[AuditRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| {
            EngineError::Internal("WAL file handle missing after open".to_string())
        })?;

        let mut payload = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| EngineError::Serialization(e.to_string()))?;
            payload.push_str(&line);
            payload.push('\n');
        }

        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;
        if self.fsync_on_append {
            file.sync_data().await?;
        }

        Ok(())
    }

    /// Atomically replace the file contents with zero bytes.
    pub async fn truncate(&self) -> Result<()> {
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| {
            EngineError::Internal("WAL file handle missing after open".to_string())
        })?;
        file.set_len(0).await?;
        Ok(())
    }

    /// Read the entire file line-by-line, decoding each line as an
    /// `AuditRecord`. Malformed lines are logged and skipped; they never
    /// invalidate subsequent well-formed lines.
    ///
    /// Only called at startup, before any concurrent producers exist, so
    /// this reads the file directly rather than going through the shared
    /// write handle.
    pub async fn replay(&self) -> Result<(Vec<AuditRecord>, usize)> {
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| {
            EngineError::Internal("WAL file handle missing after open".to_string())
        })?;

        let mut contents = String::new();
        file.rewind().await?;
        file.read_to_string(&mut contents).await?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!(line = line_no, error = %e, "skipping malformed WAL line during replay");
                }
            }
        }

        Ok((records, skipped))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Open the WAL, logging and degrading to `None` on failure rather than
/// aborting startup. Models the spec's `FatalInit` failure mode: the
/// engine keeps running with in-memory buffering only, surfaced as an
/// operational red flag via the returned `Option`.
pub async fn open_or_degrade(path: impl AsRef<Path>, fsync_on_append: bool) -> Option<WalWriter> {
    match WalWriter::open(&path, fsync_on_append).await {
        Ok(wal) => Some(wal),
        Err(e) => {
            error!(path = %path.as_ref().display(), error = %e, "failed to open WAL file; engine degrades to in-memory buffering only");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::record::sample;
    use tempfile::TempDir;

    #[tokio::test]
    async fn append_then_replay_round_trips_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        let wal = WalWriter::open(&path, false).await.unwrap();

        let records = vec![sample("E1"), sample("E2"), sample("E3")];
        wal.append_many(&records).await.unwrap();

        let (replayed, skipped) = wal.replay().await.unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(replayed, records);
    }

    #[tokio::test]
    async fn truncate_empties_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        let wal = WalWriter::open(&path, false).await.unwrap();

        wal.append_one(&sample("E1")).await.unwrap();
        wal.truncate().await.unwrap();

        let (replayed, _) = wal.replay().await.unwrap();
        assert!(replayed.is_empty());
        assert_eq!(tokio::fs::metadata(&path).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wal.log");
        tokio::fs::write(&path, b"not json\n").await.unwrap();
        let wal = WalWriter::open(&path, false).await.unwrap();
        wal.append_one(&sample("E1")).await.unwrap();

        let (replayed, skipped) = wal.replay().await.unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].event_id, "E1");
    }

    #[tokio::test]
    async fn creates_file_on_first_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh-wal.log");
        assert!(!path.exists());
        let _wal = WalWriter::open(&path, false).await.unwrap();
        assert!(path.exists());
    }
}
