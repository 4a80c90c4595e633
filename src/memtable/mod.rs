//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Tombstones for deletes (they must shadow older SSTables)
//! - Track entry count for flush triggers
//! - Track the highest WAL sequence number applied, for WAL checkpoints
//! - Ordered export for SSTable creation
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in a parking_lot RwLock: String keys order byte-wise,
//! which is the same order SSTables are written in.

mod table;

pub use table::MemTable;

/// A stored record: a live value or a deletion marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A live value
    Value(String),

    /// A tombstone (deleted key)
    Tombstone,
}

impl Record {
    /// Resolve to what a caller sees: tombstones read as absent
    pub fn into_value(self) -> Option<String> {
        match self {
            Record::Value(value) => Some(value),
            Record::Tombstone => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Record::Tombstone)
    }
}
