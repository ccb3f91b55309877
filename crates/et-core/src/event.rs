//! Raw notifications delivered by the editor.

use serde::{Deserialize, Serialize};

use crate::types::FilePath;

/// One content change inside a change notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange {
    /// Inserted text. Empty for pure deletions.
    #[serde(default)]
    pub text: String,
    /// Number of characters replaced or removed.
    #[serde(default)]
    pub range_length: u64,
}

impl RawChange {
    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            range_length: 0,
        }
    }

    pub const fn delete(range_length: u64) -> Self {
        Self {
            text: String::new(),
            range_length,
        }
    }
}

/// An event from the editor, one per line on the wire.
///
/// `line_count` is always the document's line count after the event, as the
/// editor reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    /// The document content changed.
    Change {
        file_path: FilePath,
        /// Display name. Derived from the path when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        line_count: u64,
        #[serde(default)]
        changes: Vec<RawChange>,
    },
    /// The document was saved.
    Save { file_path: FilePath, line_count: u64 },
    /// The document was closed.
    Close { file_path: FilePath, line_count: u64 },
    /// The user changed settings; configuration must be re-read.
    ConfigChanged,
}

impl EditorEvent {
    /// Parses one JSON line.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// The document this event concerns, if any.
    pub const fn file_path(&self) -> Option<&FilePath> {
        match self {
            Self::Change { file_path, .. }
            | Self::Save { file_path, .. }
            | Self::Close { file_path, .. } => Some(file_path),
            Self::ConfigChanged => None,
        }
    }
}
