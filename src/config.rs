//! Configuration for lsmkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LsmError, Result};

/// Main configuration for an lsmkv engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory for all data files
    /// Internal structure:
    ///   {storage_dir}/
    ///     ├── wal.log           (write-ahead log)
    ///     ├── sstable-0.txt     (committed SSTables)
    ///     └── sstable-<N>.tmp   (only while a flush is in flight)
    pub storage_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// What replay does with a line it cannot parse
    pub wal_corruption_policy: WalCorruptionPolicy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Number of entries in the active MemTable that triggers a flush
    pub max_memtable_size: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Policy for malformed WAL lines found during replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalCorruptionPolicy {
    /// Any malformed line aborts startup
    Abort,

    /// A malformed final line (torn write) is dropped with a warning and cut
    /// from the file; corruption followed by valid lines still aborts
    TruncateTail,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            wal_corruption_policy: WalCorruptionPolicy::TruncateTail,
            max_memtable_size: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_memtable_size == 0 {
            return Err(LsmError::Config(
                "max_memtable_size must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(LsmError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage directory (root for all files)
    pub fn storage_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the WAL corruption policy used during replay
    pub fn wal_corruption_policy(mut self, policy: WalCorruptionPolicy) -> Self {
        self.config.wal_corruption_policy = policy;
        self
    }

    /// Set the MemTable entry count that triggers a flush
    pub fn max_memtable_size(mut self, entries: usize) -> Self {
        self.config.max_memtable_size = entries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
