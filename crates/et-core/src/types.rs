//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated document path as reported by the editor.
    ///
    /// Paths must be non-empty. They are the key of the session table and are
    /// never touched on disk, so no normalisation happens here.
    FilePath, "file path"
);

impl FilePath {
    /// Returns the last path component, falling back to the whole path.
    ///
    /// Both `/` and `\` count as separators since editors on Windows report
    /// backslash paths.
    pub fn display_name(&self) -> &str {
        self.0
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_rejects_empty() {
        assert_eq!(
            FilePath::new(""),
            Err(ValidationError::Empty {
                field: "file path"
            })
        );
        assert!(FilePath::new("/src/main.rs").is_ok());
    }

    #[test]
    fn file_path_serde_rejects_empty() {
        let result: Result<FilePath, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn file_path_serializes_as_plain_string() {
        let path = FilePath::new("/repo/lib.rs").unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"/repo/lib.rs\"");
    }

    #[test]
    fn display_name_takes_last_component() {
        let path = FilePath::new("/home/me/project/src/main.rs").unwrap();
        assert_eq!(path.display_name(), "main.rs");

        let windows = FilePath::new(r"C:\work\app\index.ts").unwrap();
        assert_eq!(windows.display_name(), "index.ts");

        let bare = FilePath::new("Untitled-1").unwrap();
        assert_eq!(bare.display_name(), "Untitled-1");
    }

    #[test]
    fn display_name_ignores_trailing_separator() {
        let path = FilePath::new("/tmp/dir/").unwrap();
        assert_eq!(path.display_name(), "dir");
    }
}
