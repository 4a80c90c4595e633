//! MemTable Tests
//!
//! Tests verify:
//! - Basic set/get operations
//! - Size and sequence tracking
//! - Tombstone handling
//! - Sorted export
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use lsmkv::memtable::{MemTable, Record};

fn value(v: &str) -> Option<Record> {
    Some(Record::Value(v.to_string()))
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.max_seq(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_set_and_get() {
    let memtable = MemTable::new();

    memtable.set(1, "key1".to_string(), "value1".to_string());

    assert_eq!(memtable.get("key1"), value("value1"));
    assert!(!memtable.is_empty());
}

#[test]
fn test_get_nonexistent_key() {
    let memtable = MemTable::new();

    assert_eq!(memtable.get("nonexistent"), None);
}

#[test]
fn test_set_returns_entry_count() {
    let memtable = MemTable::new();

    assert_eq!(memtable.set(1, "key1".to_string(), "value1".to_string()), 1);
    assert_eq!(memtable.set(2, "key2".to_string(), "value2".to_string()), 2);
    assert_eq!(memtable.set(3, "key1".to_string(), "value3".to_string()), 2);
    assert_eq!(memtable.delete(4, "key3".to_string()), 3);
}

#[test]
fn test_set_overwrites_existing() {
    let memtable = MemTable::new();

    memtable.set(1, "key1".to_string(), "value1".to_string());
    memtable.set(2, "key1".to_string(), "value2".to_string());

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get("key1"), value("value2"));
}

// =============================================================================
// Delete / Tombstone Tests
// =============================================================================

#[test]
fn test_delete_creates_tombstone() {
    let memtable = MemTable::new();

    memtable.set(1, "key1".to_string(), "value1".to_string());
    memtable.delete(2, "key1".to_string());

    assert_eq!(memtable.get("key1"), Some(Record::Tombstone));
    assert_eq!(memtable.entry_count(), 1); // Tombstone still counts as entry
}

#[test]
fn test_delete_unknown_key_still_records_tombstone() {
    let memtable = MemTable::new();

    memtable.delete(1, "ghost".to_string());

    assert_eq!(memtable.get("ghost"), Some(Record::Tombstone));
    assert!(!memtable.is_empty());
}

#[test]
fn test_set_after_delete_revives_key() {
    let memtable = MemTable::new();

    memtable.delete(1, "key".to_string());
    memtable.set(2, "key".to_string(), "back".to_string());

    assert_eq!(memtable.get("key"), value("back"));
}

#[test]
fn test_tombstone_is_not_a_sentinel_value() {
    let memtable = MemTable::new();

    memtable.set(1, "key".to_string(), "__deleted__".to_string());

    assert_eq!(memtable.get("key"), value("__deleted__"));
    assert_eq!(
        memtable.get("key").and_then(Record::into_value),
        Some("__deleted__".to_string())
    );
}

// =============================================================================
// Size / Sequence Tracking Tests
// =============================================================================

#[test]
fn test_size_tracks_keys_and_values() {
    let memtable = MemTable::new();

    memtable.set(1, "abc".to_string(), "12345".to_string());
    assert_eq!(memtable.size(), 8);

    memtable.set(2, "abc".to_string(), "1".to_string());
    assert_eq!(memtable.size(), 4);

    memtable.delete(3, "abc".to_string());
    assert_eq!(memtable.size(), 3);
}

#[test]
fn test_max_seq_tracks_highest() {
    let memtable = MemTable::new();

    memtable.set(5, "a".to_string(), "1".to_string());
    memtable.delete(9, "b".to_string());
    memtable.set(7, "c".to_string(), "3".to_string());

    assert_eq!(memtable.max_seq(), 9);
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_all_entries_sorted_with_tombstones() {
    let memtable = MemTable::new();

    memtable.set(1, "charlie".to_string(), "3".to_string());
    memtable.set(2, "alpha".to_string(), "1".to_string());
    memtable.delete(3, "bravo".to_string());

    let entries = memtable.all_entries();

    assert_eq!(
        entries,
        vec![
            ("alpha".to_string(), Record::Value("1".to_string())),
            ("bravo".to_string(), Record::Tombstone),
            ("charlie".to_string(), Record::Value("3".to_string())),
        ]
    );
}

#[test]
fn test_all_entries_byte_order() {
    let memtable = MemTable::new();

    for key in ["b", "B", "a", "é", "Z", "_"] {
        memtable.set(1, key.to_string(), String::new());
    }

    let keys: Vec<String> = memtable.all_entries().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["B", "Z", "_", "a", "b", "é"]);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_during_writes() {
    let memtable = Arc::new(MemTable::new());

    for i in 0..100 {
        memtable.set(i, format!("key{}", i), format!("value{}", i));
    }

    let writer = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 100..200 {
                memtable.set(i, format!("key{}", i), format!("value{}", i));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let memtable = Arc::clone(&memtable);
            thread::spawn(move || {
                for i in 0..100 {
                    assert_eq!(
                        memtable.get(&format!("key{}", i)),
                        Some(Record::Value(format!("value{}", i)))
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 200);
    assert_eq!(memtable.max_seq(), 199);
}
