//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::Record;

/// In-memory table for recent writes
///
/// All methods take `&self`: the map sits behind a RwLock so readers on
/// other tasks never wait on each other, and the engine's write lock keeps
/// mutations single-writer.
#[derive(Debug, Default)]
pub struct MemTable {
    data: RwLock<BTreeMap<String, Record>>,
    /// Approximate size in bytes (keys + values)
    size: AtomicUsize,
    /// Highest WAL sequence number applied to this table
    max_seq: AtomicU64,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for a key
    ///
    /// Returns `None` if the key was never written to this table. A deleted
    /// key returns `Some(Record::Tombstone)`.
    pub fn get(&self, key: &str) -> Option<Record> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a value, returning the new entry count
    pub fn set(&self, seq: u64, key: String, value: String) -> usize {
        self.insert(seq, key, Record::Value(value))
    }

    /// Insert a tombstone, returning the new entry count
    pub fn delete(&self, seq: u64, key: String) -> usize {
        self.insert(seq, key, Record::Tombstone)
    }

    fn insert(&self, seq: u64, key: String, record: Record) -> usize {
        let added = key.len() + record_len(&record);

        let mut data = self.data.write();
        let key_len = key.len();
        if let Some(old) = data.insert(key, record) {
            // Key bytes were already counted
            self.size.fetch_sub(key_len + record_len(&old), Ordering::Relaxed);
        }
        self.size.fetch_add(added, Ordering::Relaxed);
        self.max_seq.fetch_max(seq, Ordering::Relaxed);

        data.len()
    }

    /// Every (key, record) pair, tombstones included, in key order
    pub fn all_entries(&self) -> Vec<(String, Record)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Highest WAL sequence number applied (0 if none carried one)
    pub fn max_seq(&self) -> u64 {
        self.max_seq.load(Ordering::Relaxed)
    }
}

fn record_len(record: &Record) -> usize {
    match record {
        Record::Value(v) => v.len(),
        Record::Tombstone => 0,
    }
}
