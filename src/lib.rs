//! # ThoughtIndex
//!
//! A library for managing a directory of interlinked plain-text notes, called
//! thoughts, together with a relational index of their tags and links.
//!
//! Every thought has a hierarchical [`Name`] such as `1`, `1a` or `1a2`. The
//! name is both the file name in the notes directory and the key in the index.
//! Names have a total order and can allocate the next free child under any
//! parent, so new notes slot in next to the notes they elaborate on.
//!
//! ## Key Features
//!
//! - **Hierarchical Names**: Ordering and next-free-name allocation
//! - **Tags and Links**: `#tag` and `[[link]]` markers are parsed out of note files
//! - **Relational Index**: SQLite storage with filtered queries over names, tags and links
//! - **Directory Adapter**: Atomic file writes, renames and deletes for note files
//!
//! ## Example
//!
//! ```
//! use thoughtindex::{parser, Name, Tag, ThoughtFilter, ThoughtIndex};
//!
//! let mut index = ThoughtIndex::open_in_memory().unwrap();
//!
//! // Parse a note and store it
//! let lines = ["# Rust", "A #language with [[1a]] in it"];
//! let thought = parser::parse(&lines, Name::parse("1"));
//! index.add_or_update(&thought).unwrap();
//!
//! // Allocate a child name for the linked note
//! let child = Name::find_next(&index.list_names().unwrap(), &Name::parse("1"));
//! assert_eq!(child.to_string(), "1a");
//!
//! // Query by tag
//! let filter = ThoughtFilter::new().tags([Tag::new("language")]);
//! let found = index.list_thoughts(&filter).unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].title, "Rust");
//!
//! // Find who links to the child
//! assert_eq!(index.backlinks(&child).unwrap(), vec![Name::parse("1")]);
//! ```
//!
//! ## Command Line Tool
//!
//! ThoughtIndex includes a command-line tool called `thoughts` that keeps a
//! notes directory and its index in step. See the binary documentation for
//! more details.
//!

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub mod directory;
pub mod index;
pub mod name;
pub mod parser;
pub mod thought;
pub mod ui;
pub mod visualization;

pub use directory::ThoughtDir;
pub use index::{ThoughtFilter, ThoughtIndex};
pub use name::Name;
pub use thought::{Link, Tag, Thought, UNSAVED_TAG_ID};

/// Error types for ThoughtIndex operations
#[derive(Error, Debug)]
pub enum ThoughtError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Thought not found: {0}")]
    ThoughtNotFound(Name),

    #[error("Thought already exists: {0}")]
    ThoughtExists(Name),

    #[error("Not a thought file: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Not a valid thought file name: '{0}'")]
    InvalidName(Name),

    #[error("Index updated for {name}, but its file was not: {source}")]
    FileOutOfSync {
        name: Name,
        source: Box<ThoughtError>,
    },

    #[error("External editor error: {0}")]
    EditorError(String),
}

/// Broad classes of failure, for callers that branch on what went wrong
/// rather than where.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The named thought does not exist
    NotFound,
    /// The target name is already taken
    Conflict,
    Other,
}

impl ThoughtError {
    /// Classifies this error.
    ///
    /// ```
    /// use thoughtindex::{ErrorKind, Name, ThoughtError};
    ///
    /// let err = ThoughtError::ThoughtExists(Name::parse("1a"));
    /// assert_eq!(err.kind(), ErrorKind::Conflict);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThoughtError::ThoughtNotFound(_) => ErrorKind::NotFound,
            ThoughtError::ThoughtExists(_) => ErrorKind::Conflict,
            ThoughtError::IoError(e) if e.kind() == io::ErrorKind::NotFound => ErrorKind::NotFound,
            ThoughtError::IoError(e) if e.kind() == io::ErrorKind::AlreadyExists => ErrorKind::Conflict,
            ThoughtError::DatabaseError(rusqlite::Error::QueryReturnedNoRows) => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }
}

/// Result type for ThoughtIndex operations
pub type Result<T> = std::result::Result<T, ThoughtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ThoughtError::ThoughtNotFound(Name::parse("2")).kind(), ErrorKind::NotFound);
        assert_eq!(ThoughtError::ThoughtExists(Name::parse("2")).kind(), ErrorKind::Conflict);
        assert_eq!(ThoughtError::EditorError("exit 1".into()).kind(), ErrorKind::Other);
        assert_eq!(ThoughtError::InvalidPath(PathBuf::from("x.txt")).kind(), ErrorKind::Other);
        assert_eq!(ThoughtError::InvalidName(Name::parse("../x")).kind(), ErrorKind::Other);

        let missing: ThoughtError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let taken: ThoughtError = io::Error::new(io::ErrorKind::AlreadyExists, "taken").into();
        assert_eq!(taken.kind(), ErrorKind::Conflict);

        let denied: ThoughtError = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
        assert_eq!(denied.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_error_messages() {
        let err = ThoughtError::ThoughtNotFound(Name::parse("1a2"));
        assert_eq!(err.to_string(), "Thought not found: 1a2");

        let err = ThoughtError::ThoughtExists(Name::parse("3"));
        assert_eq!(err.to_string(), "Thought already exists: 3");

        let err = ThoughtError::InvalidPath(PathBuf::from("notes/readme.md"));
        assert_eq!(err.to_string(), "Not a thought file: notes/readme.md");

        let err = ThoughtError::FileOutOfSync {
            name: Name::parse("2"),
            source: Box::new(ThoughtError::ThoughtExists(Name::parse("5"))),
        };
        assert_eq!(
            err.to_string(),
            "Index updated for 2, but its file was not: Thought already exists: 5"
        );
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_database_error_converts() {
        fn failing() -> Result<()> {
            let conn = rusqlite::Connection::open_in_memory()?;
            conn.execute("SELECT * FROM no_such_table", [])?;
            Ok(())
        }
        let err = failing().unwrap_err();
        assert!(matches!(err, ThoughtError::DatabaseError(_)));
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
