//! SSTable Iterator
//!
//! Sequential iteration over all records of an SSTable held in memory.

use std::path::Path;

use crate::error::{LsmError, Result};
use crate::memtable::Record;

use super::{RecordHeader, HEADER_SIZE, RECORD_HEADER_SIZE};

/// Iterator over SSTable records in file order
///
/// Yields `(offset, key, record)`. After the first error it yields nothing.
pub struct SSTableIterator<'a> {
    path: &'a Path,
    data: &'a [u8],
    /// Current position in the buffer
    position: usize,
    failed: bool,
}

impl<'a> SSTableIterator<'a> {
    /// Iterate the records of a whole file image (header already checked)
    pub(super) fn new(path: &'a Path, data: &'a [u8]) -> Self {
        Self {
            path,
            data,
            position: HEADER_SIZE as usize,
            failed: false,
        }
    }

    fn corruption(&mut self, reason: String) -> Option<Result<(u64, String, Record)>> {
        self.failed = true;
        Some(Err(LsmError::Corruption {
            path: self.path.to_path_buf(),
            offset: self.position as u64,
            reason,
        }))
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    type Item = Result<(u64, String, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.data.len() {
            return None;
        }

        let data = self.data;
        let rest = &data[self.position..];
        let header = match RecordHeader::decode(rest) {
            Ok(header) => header,
            Err(reason) => return self.corruption(reason),
        };

        let end = RECORD_HEADER_SIZE + header.body_len();
        if rest.len() < end {
            return self.corruption(format!(
                "record needs {} bytes, {} left in file",
                end,
                rest.len()
            ));
        }

        match header.decode_body(&rest[RECORD_HEADER_SIZE..end]) {
            Ok((key, record)) => {
                let offset = self.position as u64;
                self.position += end;
                Some(Ok((offset, key, record)))
            }
            Err(reason) => self.corruption(reason),
        }
    }
}
