//! SSTable Builder
//!
//! Writes sorted key-value entries to a new SSTable file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{LsmError, Result};
use crate::memtable::Record;

use super::{encode_record, SSTable, HEADER_SIZE, MAGIC, VERSION};

/// Builder for creating new SSTables from sorted entries
pub struct SSTableBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Current write position (for index)
    current_offset: u64,
    /// Index: key → file offset of record
    index: HashMap<String, u64>,
    /// Track min/max keys for metadata
    min_key: Option<String>,
    max_key: Option<String>,
}

impl SSTableBuilder {
    /// Write a complete table from unsorted, unique-keyed entries
    ///
    /// Entries are sorted byte-wise before writing.
    pub async fn create(path: &Path, mut entries: Vec<(String, Record)>) -> Result<SSTable> {
        entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let mut builder = Self::new(path).await?;
        for (key, record) in &entries {
            builder.push(key, record).await?;
        }
        builder.finish().await
    }

    /// Create a new SSTable builder
    ///
    /// Writes the header immediately; call `add()`/`add_tombstone()` in
    /// strictly increasing key order, then `finish()`.
    pub async fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC).await?;
        writer.write_all(&VERSION.to_le_bytes()).await?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            current_offset: HEADER_SIZE,
            index: HashMap::new(),
            min_key: None,
            max_key: None,
        })
    }

    /// Add a key-value pair
    pub async fn add(&mut self, key: &str, value: &str) -> Result<()> {
        self.push(key, &Record::Value(value.to_string())).await
    }

    /// Add a tombstone
    pub async fn add_tombstone(&mut self, key: &str) -> Result<()> {
        self.push(key, &Record::Tombstone).await
    }

    async fn push(&mut self, key: &str, record: &Record) -> Result<()> {
        if let Some(last) = &self.max_key {
            if key.as_bytes() <= last.as_bytes() {
                return Err(LsmError::Storage(format!(
                    "SSTable keys out of order: {:?} after {:?}",
                    key, last
                )));
            }
        }

        let encoded = encode_record(key, record);
        self.writer.write_all(&encoded).await?;

        self.index.insert(key.to_string(), self.current_offset);
        self.current_offset += encoded.len() as u64;

        if self.min_key.is_none() {
            self.min_key = Some(key.to_string());
        }
        self.max_key = Some(key.to_string());

        Ok(())
    }

    /// Number of records added so far
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    /// Index built while writing (key → record offset)
    pub fn index(&self) -> &HashMap<String, u64> {
        &self.index
    }

    /// Flush, fsync and return metadata
    pub async fn finish(mut self) -> Result<SSTable> {
        self.writer.flush().await?;
        let file = self.writer.into_inner();
        file.sync_all().await?;

        let file_size = file.metadata().await?.len();
        if file_size != self.current_offset {
            return Err(LsmError::Storage(format!(
                "SSTable {:?} is {} bytes, wrote {}",
                self.path, file_size, self.current_offset
            )));
        }

        Ok(SSTable {
            path: self.path,
            entry_count: self.index.len() as u64,
            min_key: self.min_key,
            max_key: self.max_key,
            file_size,
        })
    }
}
