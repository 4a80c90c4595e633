//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted key-value storage.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (6 bytes)                                             │
//! │   Magic: "LSMT" (4) | Version: u16 (2)                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Records (variable), ascending byte-wise key order            │
//! │   [Kind: u8][KeyLen: u32][ValLen: u32][CRC32: u32][Key][Val] │
//! │   ... repeated for each entry ...                            │
//! │   (Kind 1 = tombstone, ValLen 0)                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no persisted index: loading a table scans every record and
//! rebuilds the key → offset map. Lengths are stored before the bytes, so a
//! lookup reads exactly one record whatever its size.

mod builder;
mod iterator;
mod reader;

use std::path::PathBuf;

use bytes::{Buf, BufMut, BytesMut};

pub use builder::SSTableBuilder;
pub use iterator::SSTableIterator;
pub use reader::SSTableReader;

use crate::memtable::Record;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Magic bytes identifying an lsmkv SSTable file
pub(crate) const MAGIC: &[u8; 4] = b"LSMT";

/// Current SSTable format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) = 6 bytes
pub(crate) const HEADER_SIZE: u64 = 6;

/// Record header: Kind (1) + KeyLen (4) + ValLen (4) + CRC (4) = 13 bytes
pub(crate) const RECORD_HEADER_SIZE: usize = 13;

const KIND_VALUE: u8 = 0;
const KIND_TOMBSTONE: u8 = 1;

// =============================================================================
// SSTable Metadata
// =============================================================================

/// Metadata returned when a table has been written
#[derive(Debug, Clone)]
pub struct SSTable {
    /// Path the table was written to
    pub path: PathBuf,
    /// Number of entries in this SSTable
    pub entry_count: u64,
    /// Smallest key
    pub min_key: Option<String>,
    /// Largest key
    pub max_key: Option<String>,
    /// File size in bytes
    pub file_size: u64,
}

impl SSTable {
    /// Get the number of entries
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }
}

// =============================================================================
// Record Encoding
// =============================================================================

/// Decoded fixed-size part of a record
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordHeader {
    pub kind: u8,
    pub key_len: usize,
    pub value_len: usize,
    pub crc: u32,
}

impl RecordHeader {
    pub fn decode(mut buf: &[u8]) -> std::result::Result<Self, String> {
        if buf.len() < RECORD_HEADER_SIZE {
            return Err(format!("record header truncated ({} bytes)", buf.len()));
        }
        let header = Self {
            kind: buf.get_u8(),
            key_len: buf.get_u32_le() as usize,
            value_len: buf.get_u32_le() as usize,
            crc: buf.get_u32_le(),
        };
        match header.kind {
            KIND_VALUE => Ok(header),
            KIND_TOMBSTONE if header.value_len == 0 => Ok(header),
            KIND_TOMBSTONE => Err("tombstone with a value".to_string()),
            kind => Err(format!("unknown record kind {}", kind)),
        }
    }

    /// Bytes following the header
    pub fn body_len(&self) -> usize {
        self.key_len + self.value_len
    }

    /// Check the body against the checksum and split it into key and record
    pub fn decode_body(&self, body: &[u8]) -> std::result::Result<(String, Record), String> {
        if body.len() != self.body_len() {
            return Err(format!(
                "record body is {} bytes, expected {}",
                body.len(),
                self.body_len()
            ));
        }

        let (key, value) = body.split_at(self.key_len);
        let crc = checksum(self.kind, key, value);
        if crc != self.crc {
            return Err(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                self.crc, crc
            ));
        }

        let key = String::from_utf8(key.to_vec()).map_err(|e| format!("key: {}", e))?;
        let record = if self.kind == KIND_TOMBSTONE {
            Record::Tombstone
        } else {
            Record::Value(String::from_utf8(value.to_vec()).map_err(|e| format!("value: {}", e))?)
        };
        Ok((key, record))
    }
}

/// Encode one record (header + key + value)
pub(crate) fn encode_record(key: &str, record: &Record) -> BytesMut {
    let (kind, value): (u8, &[u8]) = match record {
        Record::Value(v) => (KIND_VALUE, v.as_bytes()),
        Record::Tombstone => (KIND_TOMBSTONE, &[]),
    };
    let key = key.as_bytes();

    let mut buf = BytesMut::with_capacity(RECORD_HEADER_SIZE + key.len() + value.len());
    buf.put_u8(kind);
    buf.put_u32_le(key.len() as u32);
    buf.put_u32_le(value.len() as u32);
    buf.put_u32_le(checksum(kind, key, value));
    buf.put_slice(key);
    buf.put_slice(value);
    buf
}

fn checksum(kind: u8, key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[kind]);
    hasher.update(&(key.len() as u32).to_le_bytes());
    hasher.update(&(value.len() as u32).to_le_bytes());
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Check the file header
pub(crate) fn check_header(data: &[u8]) -> std::result::Result<(), String> {
    if data.len() < HEADER_SIZE as usize {
        return Err(format!("file too short for header ({} bytes)", data.len()));
    }
    if &data[0..4] != MAGIC {
        return Err(format!("invalid magic: expected LSMT, got {:?}", &data[0..4]));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != VERSION {
        return Err(format!("unsupported SSTable version: {}", version));
    }
    Ok(())
}
