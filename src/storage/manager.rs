//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Track the file counter

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{LsmError, Result};
use crate::memtable::{MemTable, Record};

use super::{sync_dir, SSTable, SSTableBuilder, SSTableReader};

const SSTABLE_PREFIX: &str = "sstable-";
const COMMITTED_EXT: &str = "txt";
const TEMP_EXT: &str = "tmp";

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock; readers clone the `Arc`s out and
///   release the lock before any file I/O
/// - `next_sstable_id`: only advanced by the flush path, which the engine
///   serializes
pub struct StorageManager {
    /// Directory where SSTables are stored
    dir: PathBuf,

    /// Loaded SSTables, ordered newest → oldest
    sstables: RwLock<Vec<Arc<SSTableReader>>>,

    /// Sequence number of the next SSTable file
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open storage in an existing directory
    ///
    /// On startup:
    /// 1. Remove `sstable-<N>.tmp` files left by an interrupted flush
    /// 2. Discover committed `sstable-<N>.txt` files
    /// 3. Load them in ascending N, each going to the front of the list
    /// 4. Next id = highest N + 1 (0 for an empty directory)
    pub async fn open(dir: &Path) -> Result<Self> {
        let mut ids: Vec<u64> = Vec::new();

        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }

            match Self::parse_file_name(&path) {
                Some((id, COMMITTED_EXT)) => ids.push(id),
                Some((_, TEMP_EXT)) => {
                    tracing::warn!(path = %path.display(), "removing unfinished SSTable");
                    tokio::fs::remove_file(&path).await?;
                }
                _ => {}
            }
        }

        ids.sort_unstable();

        let mut sstables = Vec::with_capacity(ids.len());
        for &id in &ids {
            let reader = SSTableReader::load(&Self::sstable_path_with_dir(dir, id)).await?;
            sstables.insert(0, Arc::new(reader));
        }

        let next_id = ids.last().map(|&id| id + 1).unwrap_or(0);

        tracing::info!(
            dir = %dir.display(),
            sstables = sstables.len(),
            next_id,
            "storage opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Look a key up in every SSTable, newest → oldest
    ///
    /// Returns the first record found, tombstones included, or `None` if no
    /// table holds the key.
    pub async fn get(&self, key: &str) -> Result<Option<Record>> {
        let sstables = self.snapshot();

        for reader in sstables.iter() {
            if let Some(record) = reader.get(key).await? {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }

    /// Write a MemTable to a new committed SSTable
    ///
    /// The table is written to `sstable-<N>.tmp`, synced, renamed to
    /// `sstable-<N>.txt`, then loaded back and put at the front of the list.
    /// On failure nothing is published under the committed name.
    pub async fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(LsmError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let id = self.next_sstable_id.load(Ordering::SeqCst);
        let tmp_path = self.temp_path(id);
        let path = self.sstable_path(id);

        let metadata = match SSTableBuilder::create(&tmp_path, memtable.all_entries()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(path = %tmp_path.display(), error = %e, "SSTable write failed");
                if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %tmp_path.display(),
                            error = %cleanup,
                            "could not remove unfinished SSTable"
                        );
                    }
                }
                return Err(e);
            }
        };

        if !tokio::fs::try_exists(&tmp_path).await? {
            return Err(LsmError::Invariant(format!(
                "temporary SSTable {:?} missing after write",
                tmp_path
            )));
        }

        tokio::fs::rename(&tmp_path, &path).await?;
        sync_dir(&self.dir).await?;
        self.next_sstable_id.store(id + 1, Ordering::SeqCst);

        let reader = SSTableReader::load(&path).await?;
        if reader.entry_count() as u64 != metadata.entry_count
            || reader.file_size() != metadata.file_size
        {
            return Err(LsmError::Invariant(format!(
                "SSTable {:?} reloaded with {} entries / {} bytes, wrote {} / {}",
                path,
                reader.entry_count(),
                reader.file_size(),
                metadata.entry_count,
                metadata.file_size
            )));
        }

        self.sstables.write().insert(0, Arc::new(reader));

        tracing::debug!(
            path = %path.display(),
            entries = metadata.entry_count,
            bytes = metadata.file_size,
            memtable_bytes = memtable.size(),
            "SSTable committed"
        );

        Ok(SSTable { path, ..metadata })
    }

    /// Clone out the current list (newest first)
    pub fn snapshot(&self) -> Vec<Arc<SSTableReader>> {
        self.sstables.read().clone()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the storage directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Generate the file path for an SSTable with given ID
    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.dir, id)
    }

    fn temp_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}{}.{}", SSTABLE_PREFIX, id, TEMP_EXT))
    }

    /// Generate SSTable path given a directory and ID
    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("{}{}.{}", SSTABLE_PREFIX, id, COMMITTED_EXT))
    }

    /// Parse ID and extension from a file name
    /// "sstable-42.txt" → Some((42, "txt"))
    fn parse_file_name(path: &Path) -> Option<(u64, &str)> {
        let stem = path.file_stem()?.to_str()?;
        let ext = path.extension()?.to_str()?;
        let id = stem.strip_prefix(SSTABLE_PREFIX)?.parse().ok()?;
        Some((id, ext))
    }
}
