//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTables, and Storage
//! - Handle concurrent read/write access
//! - Freeze and flush the MemTable when it is full
//! - Manage crash recovery on startup

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{LsmError, Result};
use crate::memtable::{MemTable, Record};
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};

/// MemTables that are still in memory
///
/// Every MemTable moves Active → Immutable (queued) → Flushed (dropped once
/// its SSTable is committed).
struct MemTables {
    /// The only MemTable accepting writes
    active: Arc<MemTable>,
    /// Frozen MemTables awaiting flush, oldest first
    immutable: VecDeque<Arc<MemTable>>,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete/flush/close): Serialized by `write_lock`
///   - Only ONE write operation at a time, in the order callers acquire it
///   - Must acquire: write_lock → WAL → memtable → storage (flush)
///
/// - **Reads** (get): No write_lock needed
///   - Clone the MemTable `Arc`s out of `memtables`, release, then search
///   - SSTables are immutable and opened per lookup
///
/// The engine can only be built through [`Engine::open`], which runs WAL
/// replay and SSTable discovery before handing it out.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log for durability
    wal: Mutex<WalWriter>,

    /// Active and frozen MemTables
    memtables: RwLock<MemTables>,

    /// Persistent storage manager (SSTable list + file counter)
    storage: StorageManager,

    /// Serializes write operations (set/delete/flush)
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the storage directory
    /// 2. Replay the WAL into a fresh active MemTable
    /// 3. Load existing SSTables (newest first)
    /// 4. Open the WAL for append
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create storage directory if it doesn't exist
        tokio::fs::create_dir_all(&config.storage_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    dir = %config.storage_dir.display(),
                    error = %e,
                    "cannot create storage directory"
                );
                LsmError::Io(e)
            })?;

        let wal_path = config.storage_dir.join(Self::WAL_FILENAME);

        // Step 2: Replay WAL - anything acknowledged before a crash is here
        let (entries, recovery) =
            WalRecovery::recover(&wal_path, config.wal_corruption_policy).await?;

        let active = MemTable::new();
        for entry in entries {
            match entry.operation {
                Operation::Set { key, value } => {
                    active.set(entry.seq, key, value);
                }
                Operation::Delete { key } => {
                    active.delete(entry.seq, key);
                }
            }
        }

        if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
            tracing::info!(
                recovered = recovery.entries_recovered,
                corrupted = recovery.entries_corrupted,
                last_seq = recovery.last_seq,
                truncated = recovery.was_truncated,
                "WAL replayed"
            );
        }

        // Step 3: Discover SSTables
        let storage = StorageManager::open(&config.storage_dir).await?;

        // Step 4: WAL writer continues the sequence numbering
        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy).await?;

        tracing::info!(
            dir = %config.storage_dir.display(),
            memtable_entries = active.entry_count(),
            sstables = storage.sstable_count(),
            "engine opened"
        );

        Ok(Self {
            config,
            wal: Mutex::new(wal),
            memtables: RwLock::new(MemTables {
                active: Arc::new(active),
                immutable: VecDeque::new(),
            }),
            storage,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage directory
    pub async fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(Config::builder().storage_dir(path).build()).await
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. Active MemTable (most recent writes)
    /// 2. Frozen MemTables (newest to oldest)
    /// 3. SSTables (newest to oldest)
    ///
    /// The first record found wins; a tombstone reads as `None`, the same
    /// as a key that was never written.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let tables: Vec<Arc<MemTable>> = {
            let memtables = self.memtables.read();
            std::iter::once(memtables.active.clone())
                .chain(memtables.immutable.iter().rev().cloned())
                .collect()
        };

        for table in &tables {
            if let Some(record) = table.get(key) {
                return Ok(record.into_value());
            }
        }

        Ok(self.storage.get(key).await?.and_then(Record::into_value))
    }

    /// Set a key to a value
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability)
    /// 3. Write to the active MemTable
    /// 4. Flush if the MemTable reached its limit
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        let _write_guard = self.write_lock.lock().await;

        // Step 1: Write to WAL first (durability guarantee)
        let seq = self
            .wal
            .lock()
            .await
            .append(Operation::Set {
                key: key.clone(),
                value: value.clone(),
            })
            .await?;

        // Step 2: Write to MemTable
        let entries = self.active().set(seq, key, value);

        // Step 3: Check if flush is needed
        if entries >= self.config.max_memtable_size {
            self.flush_internal().await?;
        }

        Ok(())
    }

    /// Delete a key
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write delete operation to WAL
    /// 3. Write tombstone to the active MemTable
    /// 4. Flush if the MemTable reached its limit
    pub async fn delete(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        let _write_guard = self.write_lock.lock().await;

        let seq = self
            .wal
            .lock()
            .await
            .append(Operation::Delete { key: key.clone() })
            .await?;

        let entries = self.active().delete(seq, key);

        if entries >= self.config.max_memtable_size {
            self.flush_internal().await?;
        }

        Ok(())
    }

    /// Flush to disk (public API)
    ///
    /// Forces a flush regardless of MemTable size
    pub async fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock().await;
        self.flush_internal().await
    }

    /// Internal flush implementation (called with write lock held)
    ///
    /// Freezes the active MemTable, then writes queued MemTables oldest
    /// first. A table leaves the queue only once its SSTable is committed,
    /// so a failed write keeps it readable and its WAL entries in place.
    async fn flush_internal(&self) -> Result<()> {
        // Step 1: Active → Immutable
        {
            let mut memtables = self.memtables.write();
            if !memtables.active.is_empty() {
                let frozen = std::mem::take(&mut memtables.active);
                memtables.immutable.push_back(frozen);
            }
        }

        loop {
            let next = self.memtables.read().immutable.front().cloned();
            let Some(oldest) = next else {
                return Ok(());
            };

            // Step 2: Write the SSTable (temp file, rename, reload)
            self.storage.flush(&oldest).await?;

            // Step 3: Immutable → Flushed
            let still_queued = {
                let mut memtables = self.memtables.write();
                memtables.immutable.pop_front();
                !memtables.immutable.is_empty()
            };

            // Step 4: Drop the WAL entries that are now in the SSTable
            let mut wal = self.wal.lock().await;
            if still_queued || !self.active().is_empty() {
                wal.clear_through(oldest.max_seq()).await?;
            } else {
                wal.clear().await?;
            }
        }
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data, then syncs and releases the WAL.
    ///
    /// If the final flush fails the engine is still consumed, but every
    /// unflushed write stays in `wal.log` and is replayed by the next
    /// [`Engine::open`].
    pub async fn close(self) -> Result<()> {
        self.flush().await?;
        self.wal.into_inner().close().await?;

        tracing::info!(dir = %self.config.storage_dir.display(), "engine closed");
        Ok(())
    }

    fn active(&self) -> Arc<MemTable> {
        self.memtables.read().active.clone()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.config.storage_dir
    }

    /// Get the active MemTable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.active().entry_count()
    }

    /// Get the number of frozen MemTables waiting for flush
    pub fn immutable_count(&self) -> usize {
        self.memtables.read().immutable.len()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Get the sequence number the next SSTable file will use
    pub fn next_sstable_id(&self) -> u64 {
        self.storage.next_sstable_id()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
