//! WAL Reader
//!
//! Splits a WAL file into lines and parses each one, keeping byte offsets
//! so recovery can cut a torn tail off the file.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;

use super::WalEntry;

/// One line of the log, parsed or not
#[derive(Debug)]
pub struct WalLine {
    /// 1-based line number
    pub line_no: usize,
    /// Byte offset where the line starts
    pub start: u64,
    /// True if the line ended with '\n'
    pub terminated: bool,
    /// The parsed entry, or why it could not be parsed
    pub entry: std::result::Result<WalEntry, String>,
}

/// Reads entries from the WAL file
pub struct WalReader {
    data: Vec<u8>,
    position: usize,
    line_no: usize,
}

impl WalReader {
    /// Read a WAL file; a missing file reads as an empty log
    pub async fn open(path: &Path) -> Result<Self> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            line_no: 0,
        }
    }

    /// Total bytes in the log
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read the next non-blank line
    pub fn next_line(&mut self) -> Option<WalLine> {
        loop {
            if self.position >= self.data.len() {
                return None;
            }

            let start = self.position;
            let rest = &self.data[start..];
            let (raw, terminated) = match rest.iter().position(|&b| b == b'\n') {
                Some(end) => (&rest[..end], true),
                None => (rest, false),
            };
            self.position = start + raw.len() + usize::from(terminated);
            self.line_no += 1;

            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let entry = std::str::from_utf8(raw)
                .map_err(|e| format!("invalid UTF-8: {}", e))
                .and_then(|line| WalEntry::from_line(line).map_err(|e| e.to_string()));

            return Some(WalLine {
                line_no: self.line_no,
                start: start as u64,
                terminated,
                entry,
            });
        }
    }
}

impl Iterator for WalReader {
    type Item = WalLine;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}
