//! WAL Writer
//!
//! Handles appending entries to the WAL file, and truncating it once the
//! entries it holds are durable in SSTables.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::config::WalSyncStrategy;
use crate::error::{LsmError, Result};
use crate::storage::sync_dir;

use super::{Operation, WalEntry, WalReader};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// Sequence number handed to the next append
    next_seq: u64,
    sync_strategy: WalSyncStrategy,
    /// Appends written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file for append
    ///
    /// Sequence numbers continue after the highest one already in the file.
    pub async fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let reader = WalReader::open(path).await?;
        let last_seq = reader
            .filter_map(|line| line.entry.ok())
            .map(|entry| entry.seq)
            .max()
            .unwrap_or(0);

        let mut file = Self::open_append(path).await?;
        Self::terminate_last_line(&mut file).await?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_seq: last_seq + 1,
            sync_strategy,
            unsynced: 0,
        })
    }

    async fn open_append(path: &Path) -> Result<File> {
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .await?)
    }

    /// A file whose last line lacks '\n' would glue the next append onto it
    async fn terminate_last_line(file: &mut File) -> Result<()> {
        let len = file.metadata().await?.len();
        if len == 0 {
            return Ok(());
        }

        file.seek(std::io::SeekFrom::Start(len - 1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        if last[0] != b'\n' {
            file.write_all(b"\n").await?;
            file.flush().await?;
            file.sync_data().await?;
        }
        Ok(())
    }

    /// Append an operation, returning its sequence number
    ///
    /// Returns only after the line has reached the OS (and the disk, per
    /// the sync strategy).
    pub async fn append(&mut self, operation: Operation) -> Result<u64> {
        let seq = self.next_seq;
        let line = WalEntry::new(seq, operation).to_line()?;

        self.write_line(line.as_bytes())
            .await
            .map_err(|e| LsmError::WalWrite(format!("seq {}: {}", seq, e)))?;

        self.next_seq += 1;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync().await?;
        }

        Ok(seq)
    }

    async fn write_line(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes).await?;
        self.file.flush().await
    }

    /// Force sync to disk
    pub async fn sync(&mut self) -> Result<()> {
        self.file.flush().await?;
        self.file.sync_data().await?;
        self.unsynced = 0;
        Ok(())
    }

    /// Truncate the log to empty and sync
    pub async fn clear(&mut self) -> Result<()> {
        self.file.flush().await?;
        self.file.set_len(0).await?;
        self.file.sync_all().await?;
        self.unsynced = 0;

        tracing::debug!(path = %self.path.display(), "WAL cleared");
        Ok(())
    }

    /// Drop every entry with a sequence number up to and including `seq`
    ///
    /// Later entries are kept. The log is rewritten to a temp file that is
    /// renamed over the old one, so a crash leaves either the old or the new
    /// log, never a mix.
    pub async fn clear_through(&mut self, seq: u64) -> Result<()> {
        self.file.flush().await?;

        let mut keep = Vec::new();
        for line in WalReader::open(&self.path).await? {
            let entry = line.entry.map_err(|reason| LsmError::WalCorruption {
                line: line.line_no,
                reason,
            })?;
            if entry.seq > seq {
                keep.push(entry);
            }
        }

        if keep.is_empty() {
            return self.clear().await;
        }

        let tmp_path = self.path.with_extension("log.tmp");
        {
            let mut tmp = File::create(&tmp_path).await?;
            for entry in &keep {
                tmp.write_all(entry.to_line()?.as_bytes()).await?;
            }
            tmp.flush().await?;
            tmp.sync_all().await?;
        }
        tokio::fs::rename(&tmp_path, &self.path).await?;
        if let Some(dir) = self.path.parent() {
            sync_dir(dir).await?;
        }

        self.file = Self::open_append(&self.path).await?;
        self.unsynced = 0;

        tracing::debug!(
            path = %self.path.display(),
            through = seq,
            kept = keep.len(),
            "WAL checkpointed"
        );
        Ok(())
    }

    /// Get the sequence number the next append will use
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, sync and release the file handle
    pub async fn close(mut self) -> Result<()> {
        self.sync().await
    }
}
