//! Action type enum as the single source of truth for `actionType` strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical action types carried by activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Typing,
    Paste,
    Delete,
    /// Accepted on the wire; the classifier never produces it.
    Cut,
}

impl ActionType {
    /// String representation used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::Paste => "paste",
            Self::Delete => "delete",
            Self::Cut => "cut",
        }
    }

    /// Picks the dominant category for a batch of counters.
    ///
    /// Ties resolve in declaration order: typing, then paste, then delete.
    #[must_use]
    pub const fn majority(typed: u64, pasted: u64, deleted: u64) -> Self {
        if typed >= pasted && typed >= deleted {
            Self::Typing
        } else if pasted >= deleted {
            Self::Paste
        } else {
            Self::Delete
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typing" => Ok(Self::Typing),
            "paste" => Ok(Self::Paste),
            "delete" => Ok(Self::Delete),
            "cut" => Ok(Self::Cut),
            _ => Err(UnknownActionType(s.to_string())),
        }
    }
}

impl Serialize for ActionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown action type strings.
#[derive(Debug, Clone)]
pub struct UnknownActionType(String);

impl fmt::Display for UnknownActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action type: {}", self.0)
    }
}

impl std::error::Error for UnknownActionType {}
