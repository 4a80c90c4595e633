//! Storage Module
//!
//! Persistent storage layer built from immutable SSTables.
//!
//! ## Responsibilities
//! - Persist frozen MemTables to disk in sorted format
//! - Publish new tables atomically (temp file, then rename)
//! - Point lookups across tables, newest first
//! - Rebuild the table list from the directory on startup
//!
//! No compaction: every flush adds one table and nothing merges them.

mod manager;
pub mod sstable;

use std::path::Path;

pub use manager::StorageManager;
pub use sstable::{SSTable, SSTableBuilder, SSTableReader};

use crate::error::Result;

/// fsync a directory so a rename inside it survives a crash
pub(crate) async fn sync_dir(dir: &Path) -> Result<()> {
    let dir = tokio::fs::File::open(dir).await?;
    dir.sync_all().await?;
    Ok(())
}
