//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single entry in the WAL
///
/// Serialized as one JSON object per line, e.g.
/// `{"seq":7,"type":"SET","key":"a","value":"1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Sequence number, monotonically increasing within one log.
    /// Lines written without one parse as 0.
    #[serde(default)]
    pub seq: u64,

    /// The operation to perform
    #[serde(flatten)]
    pub operation: Operation,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// Set a key to a value
    #[serde(rename = "SET")]
    Set { key: String, value: String },

    /// Delete a key
    #[serde(rename = "DELETE")]
    Delete { key: String },
}

impl Operation {
    pub fn key(&self) -> &str {
        match self {
            Operation::Set { key, .. } | Operation::Delete { key } => key,
        }
    }
}

impl WalEntry {
    pub fn new(seq: u64, operation: Operation) -> Self {
        Self { seq, operation }
    }

    /// Serialize to a single newline-terminated line
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one line (without its trailing newline)
    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}
