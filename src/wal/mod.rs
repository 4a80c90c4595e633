//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append log entries before any mutation
//! - Sequence numbers for ordering and checkpoints
//! - Crash recovery and replay
//! - Truncation once entries are durable in SSTables
//!
//! ## File Format
//! One JSON object per line:
//! ```text
//! {"seq":1,"type":"SET","key":"a","value":"1"}
//! {"seq":2,"type":"DELETE","key":"a"}
//! ```

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Operation, WalEntry};
pub use reader::{WalLine, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
