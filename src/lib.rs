//! # lsmkv
//!
//! An embedded key-value storage engine built as a log-structured merge tree:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery by WAL replay
//! - Immutable, checksummed SSTables published by atomic rename
//! - Single-writer/multi-reader concurrency model on tokio
//!
//! ## Architecture Overview
//!
//! ```text
//!                 set / delete                      get
//!                      │                             │
//!          ┌───────────▼───────────┐                 │
//!          │     WAL (wal.log)     │                 │
//!          └───────────┬───────────┘                 │
//!                      ▼                             ▼
//!          ┌───────────────────────────────────────────────┐
//!          │ Active MemTable                               │ 1st
//!          ├───────────────────────────────────────────────┤
//!          │ Frozen MemTables (queued for flush)           │ 2nd
//!          └───────────┬───────────────────────────────────┘
//!                      │ flush: sstable-N.tmp → sstable-N.txt
//!          ┌───────────▼───────────────────────────────────┐
//!          │ SSTables, newest first                        │ 3rd
//!          └───────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> lsmkv::Result<()> {
//! use lsmkv::{Config, Engine};
//!
//! let engine = Engine::open(Config::builder().storage_dir("./data").build()).await?;
//! engine.set("user:1", "alice").await?;
//! assert_eq!(engine.get("user:1").await?, Some("alice".to_string()));
//! engine.delete("user:1").await?;
//! engine.close().await?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod memtable;
pub mod storage;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, WalCorruptionPolicy, WalSyncStrategy};
pub use engine::Engine;
pub use error::{LsmError, Result};
pub use memtable::Record;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lsmkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
