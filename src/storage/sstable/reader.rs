//! SSTable Reader
//!
//! Loads SSTable files and provides O(1) key lookups via an in-memory index.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{LsmError, Result};
use crate::memtable::Record;

use super::iterator::SSTableIterator;
use super::{check_header, RecordHeader, RECORD_HEADER_SIZE};

/// Reader for SSTable files with an in-memory index
///
/// The file itself is not kept open: every lookup opens it, reads one
/// record and closes it again. Tables are immutable, so readers never
/// need to coordinate with each other.
#[derive(Debug)]
pub struct SSTableReader {
    path: PathBuf,
    /// In-memory index: key → file offset
    index: HashMap<String, u64>,
    /// File size at load time
    file_size: u64,
}

impl SSTableReader {
    /// Load an SSTable, rebuilding its index with a full scan
    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        check_header(&data).map_err(|reason| LsmError::Corruption {
            path: path.to_path_buf(),
            offset: 0,
            reason,
        })?;

        let mut index = HashMap::new();
        for item in SSTableIterator::new(path, &data) {
            let (offset, key, _) = item?;
            index.insert(key, offset);
        }

        Ok(Self {
            path: path.to_path_buf(),
            index,
            file_size: data.len() as u64,
        })
    }

    /// Look up a key
    ///
    /// Returns:
    /// - `Ok(Some(Record::Value(_)))` — key found with value
    /// - `Ok(Some(Record::Tombstone))` — key deleted in this table
    /// - `Ok(None)` — key not in this table
    pub async fn get(&self, key: &str) -> Result<Option<Record>> {
        let offset = match self.index.get(key) {
            Some(&offset) => offset,
            None => return Ok(None),
        };

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut header = [0u8; RECORD_HEADER_SIZE];
        file.read_exact(&mut header).await?;
        let header = RecordHeader::decode(&header).map_err(|r| self.corruption(offset, r))?;

        let mut body = vec![0u8; header.body_len()];
        file.read_exact(&mut body).await?;
        let (found, record) = header
            .decode_body(&body)
            .map_err(|r| self.corruption(offset, r))?;

        if found != key {
            return Err(self.corruption(
                offset,
                format!("index points at key {:?}, expected {:?}", found, key),
            ));
        }

        Ok(Some(record))
    }

    /// Read every record in key order
    pub async fn entries(&self) -> Result<Vec<(String, Record)>> {
        let data = tokio::fs::read(&self.path).await?;
        check_header(&data).map_err(|reason| self.corruption(0, reason))?;

        SSTableIterator::new(&self.path, &data)
            .map(|item| item.map(|(_, key, record)| (key, record)))
            .collect()
    }

    fn corruption(&self, offset: u64, reason: String) -> LsmError {
        LsmError::Corruption {
            path: self.path.clone(),
            offset,
            reason,
        }
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Byte offset of a key's record, if present
    pub fn offset_of(&self, key: &str) -> Option<u64> {
        self.index.get(key).copied()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}
