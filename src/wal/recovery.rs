//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::path::Path;

use tokio::fs::OpenOptions;

use crate::config::WalCorruptionPolicy;
use crate::error::{LsmError, Result};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Highest sequence number seen
    pub last_seq: u64,

    /// Whether the WAL was truncated (torn tail removed)
    pub was_truncated: bool,
}

/// Outcome of scanning a log without touching it
struct Scan {
    entries: Vec<WalEntry>,
    result: RecoveryResult,
    /// First malformed line: (line number, byte offset, reason)
    first_bad: Option<(usize, u64, String)>,
    /// A valid line came after a malformed one
    bad_in_middle: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all lines in order (missing file = empty log)
    /// 2. Apply the corruption policy to malformed lines
    /// 3. Under `TruncateTail`, cut a torn final line from the file
    /// 4. Return all valid entries in order
    pub async fn recover(
        path: &Path,
        policy: WalCorruptionPolicy,
    ) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let reader = WalReader::open(path).await?;
        let mut scan = Self::scan(reader);

        if let Some((line, offset, reason)) = scan.first_bad.take() {
            // A torn write damages at most the last line
            let torn_tail = !scan.bad_in_middle && scan.result.entries_corrupted == 1;
            if !torn_tail || policy == WalCorruptionPolicy::Abort {
                return Err(LsmError::WalCorruption { line, reason });
            }

            tracing::warn!(
                path = %path.display(),
                line,
                offset,
                %reason,
                "dropping torn WAL tail"
            );

            let file = OpenOptions::new().write(true).open(path).await?;
            file.set_len(offset).await?;
            file.sync_all().await?;
            scan.result.was_truncated = true;
        }

        Ok((scan.entries, scan.result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub async fn verify(path: &Path) -> Result<RecoveryResult> {
        let reader = WalReader::open(path).await?;
        Ok(Self::scan(reader).result)
    }

    fn scan(reader: WalReader) -> Scan {
        let mut scan = Scan {
            entries: Vec::new(),
            result: RecoveryResult::default(),
            first_bad: None,
            bad_in_middle: false,
        };

        for line in reader {
            match line.entry {
                Ok(entry) => {
                    if scan.first_bad.is_some() {
                        scan.bad_in_middle = true;
                    }
                    scan.result.entries_recovered += 1;
                    scan.result.last_seq = scan.result.last_seq.max(entry.seq);
                    scan.entries.push(entry);
                }
                Err(reason) => {
                    scan.result.entries_corrupted += 1;
                    if scan.first_bad.is_none() {
                        scan.first_bad = Some((line.line_no, line.start, reason));
                    }
                }
            }
        }

        scan
    }
}
