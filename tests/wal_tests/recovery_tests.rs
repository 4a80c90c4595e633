//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from a clean WAL (no corruption)
//! - Recovery from a missing or empty WAL
//! - Torn final line under both corruption policies
//! - Corruption in the middle of the log is always fatal
//! - Verify mode (stats only, file untouched)

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use lsmkv::config::{WalCorruptionPolicy, WalSyncStrategy};
use lsmkv::wal::{Operation, WalRecovery, WalWriter};
use lsmkv::LsmError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");
    (temp_dir, wal_path)
}

/// Write entries using WalWriter (produces a well-formed WAL)
async fn write_entries_via_writer(path: &PathBuf, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).await.unwrap();
    for i in 0..count {
        writer
            .append(Operation::Set {
                key: format!("key{}", i),
                value: format!("value{}", i),
            })
            .await
            .unwrap();
    }
}

/// Append raw bytes (for crafting corruption)
fn append_raw(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).create(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Recover: Clean WAL Tests
// =============================================================================

#[tokio::test]
async fn test_recover_missing_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let (entries, result) = WalRecovery::recover(&wal_path, WalCorruptionPolicy::Abort)
        .await
        .unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert!(!wal_path.exists());
}

#[tokio::test]
async fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    std::fs::File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path, WalCorruptionPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(entries.len(), 0);
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_seq, 0);
    assert!(!result.was_truncated);
}

#[tokio::test]
async fn test_recover_multiple_entries_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 10).await;

    let (entries, result) = WalRecovery::recover(&wal_path, WalCorruptionPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_seq, 10);
    assert!(!result.was_truncated);

    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.seq, (i + 1) as u64);
        assert_eq!(entry.operation.key(), format!("key{}", i));
    }
}

#[tokio::test]
async fn test_recover_preserves_operations() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).await.unwrap();
        writer
            .append(Operation::Set { key: "k1".to_string(), value: "v1".to_string() })
            .await
            .unwrap();
        writer
            .append(Operation::Delete { key: "k1".to_string() })
            .await
            .unwrap();
        writer
            .append(Operation::Set { key: "k2".to_string(), value: "v2".to_string() })
            .await
            .unwrap();
    }

    let (entries, result) = WalRecovery::recover(&wal_path, WalCorruptionPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(result.entries_recovered, 3);
    assert!(matches!(entries[0].operation, Operation::Set { .. }));
    assert!(matches!(entries[1].operation, Operation::Delete { .. }));
    assert!(matches!(entries[2].operation, Operation::Set { .. }));
}

#[tokio::test]
async fn test_recover_legacy_lines_without_seq() {
    let (_temp, wal_path) = setup_temp_wal();
    append_raw(
        &wal_path,
        b"{\"type\":\"SET\",\"key\":\"a\",\"value\":\"1\"}\n{\"type\":\"DELETE\",\"key\":\"a\"}\n",
    );

    let (entries, result) = WalRecovery::recover(&wal_path, WalCorruptionPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(result.last_seq, 0);
}

// =============================================================================
// Recover: Torn Tail Tests
// =============================================================================

#[tokio::test]
async fn test_torn_tail_truncated_under_truncate_policy() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3).await;
    let clean_len = std::fs::metadata(&wal_path).unwrap().len();
    append_raw(&wal_path, b"{\"seq\":4,\"type\":\"SE");

    let (entries, result) = WalRecovery::recover(&wal_path, WalCorruptionPolicy::TruncateTail)
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(result.entries_recovered, 3);
    assert_eq!(result.entries_corrupted, 1);
    assert!(result.was_truncated);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), clean_len);
}

#[tokio::test]
async fn test_torn_tail_fatal_under_abort_policy() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3).await;
    append_raw(&wal_path, b"{\"seq\":4,\"type\":\"SE");
    let len_before = std::fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::recover(&wal_path, WalCorruptionPolicy::Abort).await;

    assert!(matches!(result, Err(LsmError::WalCorruption { line: 4, .. })));
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), len_before);
}

// =============================================================================
// Recover: Mid-log Corruption Tests
// =============================================================================

#[tokio::test]
async fn test_corruption_followed_by_valid_line_is_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2).await;
    append_raw(&wal_path, b"garbage\n");
    append_raw(&wal_path, b"{\"seq\":3,\"type\":\"DELETE\",\"key\":\"key0\"}\n");

    let result = WalRecovery::recover(&wal_path, WalCorruptionPolicy::TruncateTail).await;

    assert!(matches!(result, Err(LsmError::WalCorruption { line: 3, .. })));
}

#[tokio::test]
async fn test_two_corrupt_trailing_lines_are_fatal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2).await;
    append_raw(&wal_path, b"garbage\nmore garbage\n");

    let result = WalRecovery::recover(&wal_path, WalCorruptionPolicy::TruncateTail).await;

    assert!(matches!(result, Err(LsmError::WalCorruption { .. })));
}

// =============================================================================
// Verify Tests
// =============================================================================

#[tokio::test]
async fn test_verify_reports_without_modifying() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 4).await;
    append_raw(&wal_path, b"{broken");
    let len_before = std::fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).await.unwrap();

    assert_eq!(result.entries_recovered, 4);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_seq, 4);
    assert!(!result.was_truncated);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), len_before);
}
