//! Tests for WAL entries
//!
//! These tests verify:
//! - The JSON line layout of SET and DELETE
//! - Parsing lines written without a sequence number
//! - Rejection of malformed lines

use lsmkv::wal::{Operation, WalEntry};

#[test]
fn test_set_line_layout() {
    let entry = WalEntry::new(
        7,
        Operation::Set {
            key: "a".to_string(),
            value: "1".to_string(),
        },
    );

    assert_eq!(
        entry.to_line().unwrap(),
        "{\"seq\":7,\"type\":\"SET\",\"key\":\"a\",\"value\":\"1\"}\n"
    );
}

#[test]
fn test_delete_line_has_no_value() {
    let entry = WalEntry::new(
        8,
        Operation::Delete {
            key: "a".to_string(),
        },
    );

    assert_eq!(
        entry.to_line().unwrap(),
        "{\"seq\":8,\"type\":\"DELETE\",\"key\":\"a\"}\n"
    );
}

#[test]
fn test_line_is_single_line_for_newlines_in_data() {
    let entry = WalEntry::new(
        1,
        Operation::Set {
            key: "multi\nline".to_string(),
            value: "x\r\ny".to_string(),
        },
    );

    let line = entry.to_line().unwrap();

    assert_eq!(line.matches('\n').count(), 1);
    assert_eq!(WalEntry::from_line(line.trim_end()).unwrap(), entry);
}

#[test]
fn test_parse_line_without_seq() {
    let entry = WalEntry::from_line(r#"{"type":"SET","key":"k","value":"v"}"#).unwrap();

    assert_eq!(entry.seq, 0);
    assert_eq!(
        entry.operation,
        Operation::Set {
            key: "k".to_string(),
            value: "v".to_string()
        }
    );
}

#[test]
fn test_parse_delete_ignores_order_of_fields() {
    let entry = WalEntry::from_line(r#"{"key":"k","type":"DELETE","seq":3}"#).unwrap();

    assert_eq!(entry.seq, 3);
    assert_eq!(entry.operation.key(), "k");
    assert!(matches!(entry.operation, Operation::Delete { .. }));
}

#[test]
fn test_parse_rejects_malformed_lines() {
    for line in [
        "",
        "not json",
        r#"{"seq":1,"type":"SET","key":"k""#,
        r#"{"seq":1,"type":"PUT","key":"k","value":"v"}"#,
        r#"{"seq":1,"type":"SET","key":"k"}"#,
        r#"{"seq":"one","type":"DELETE","key":"k"}"#,
    ] {
        assert!(WalEntry::from_line(line).is_err(), "accepted {:?}", line);
    }
}
