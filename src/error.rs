//! Error types for decoding and migration operations.
//!
//! Decoding problems are collected as [`DecodeError`] diagnostics and never
//! abort a decode. Per-file problems ([`FileNotFoundError`], [`StorageError`])
//! are recorded in the audit trail of the operation that hit them. Only
//! identifier-level and repository-level failures surface as
//! [`MigrationError`] and abort the document being processed.

use crate::RecordKind;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used by the orchestration layer.
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Top-level error for one migration operation on one identifier.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("{0} has no derivable pid")]
    MissingIdentifier(String),

    #[error("{0} is not registered for migration")]
    NotRegistered(String),

    #[error("{0} has no article metadata record")]
    MissingMetadataRecord(String),

    #[error("{0} has no journal acronym; register its journal first")]
    MissingAcronym(String),

    #[error("Document {0} does not exist in the document repository")]
    DocumentNotPublished(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pid(#[from] PidError),

    #[cfg(feature = "xml")]
    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A malformed field found while decoding a legacy export.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error in {kind} record{}: {error}",
    match line {
        Some(l) => format!(" at line {}", l),
        None => String::new(),
    }
)]
pub struct DecodeError {
    /// Line number in the export where the problem was found (1-based)
    pub line: Option<usize>,
    /// The record kind being decoded
    pub kind: RecordKind,
    /// What was wrong with the field
    pub error: FieldError,
}

impl DecodeError {
    /// Create a DecodeError with line information.
    pub fn at_line(line: usize, kind: RecordKind, error: FieldError) -> Self {
        Self {
            line: Some(line),
            kind,
            error,
        }
    }

    /// Create a DecodeError without position information.
    pub fn without_position(kind: RecordKind, error: FieldError) -> Self {
        Self {
            line: None,
            kind,
            error,
        }
    }
}

/// Field-level problems in the `!TAG!content` format.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Field does not follow the !TAG!content layout: \"{0}\"")]
    MissingTagDelimiter(String),

    #[error("Empty tag in field: \"{0}\"")]
    EmptyTag(String),

    #[error("No content for tag {0}")]
    EmptyContent(String),

    #[error("No identifier can be derived from the record (expected {expected})")]
    MissingIdentifier { expected: &'static str },
}

/// An expected legacy file is absent from disk.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Not found {}", path.display())]
pub struct FileNotFoundError {
    pub path: PathBuf,
}

impl FileNotFoundError {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Object storage failures. A failed upload leaves the file "not migrated".
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to register {} in files storage: {reason}", path.display())]
    Register { path: PathBuf, reason: String },

    #[error("Unknown object {0}")]
    UnknownObject(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Destination document repository failures.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Unable to fetch {id}: {reason}")]
    Fetch { id: String, reason: String },

    #[error("Unable to save {id}: {reason}")]
    Save { id: String, reason: String },
}

/// Migration state store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid stored record {}: {source}", path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Migration state store lock is poisoned")]
    Poisoned,
}

/// The pid issuance collaborator refused or failed a request.
#[derive(Error, Debug)]
#[error("Unable to issue pid v3 for {v2}: {reason}")]
pub struct PidError {
    pub v2: String,
    pub reason: String,
}

/// Errors raised while rewriting a document XML for publication.
#[cfg(feature = "xml")]
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Missing <article-meta> element")]
    MissingArticleMeta,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let error = DecodeError::at_line(
            42,
            RecordKind::Article,
            FieldError::MissingTagDelimiter("v880 S0001".to_string()),
        );

        let display = format!("{}", error);
        assert!(display.contains("line 42"));
        assert!(display.contains("article record"));
        assert!(display.contains("v880 S0001"));
    }

    #[test]
    fn test_decode_error_without_position() {
        let error = DecodeError::without_position(
            RecordKind::Journal,
            FieldError::MissingIdentifier { expected: "v400" },
        );

        let display = format!("{}", error);
        assert!(display.contains("journal record"));
        assert!(display.contains("v400"));
        assert!(!display.contains("line"));
    }

    #[test]
    fn test_file_not_found_display() {
        let error = FileNotFoundError::new("/bases/pdf/abc/v1n1/a01.pdf");
        assert_eq!(error.to_string(), "Not found /bases/pdf/abc/v1n1/a01.pdf");
    }

    #[test]
    fn test_migration_error_from_storage_error() {
        let error: MigrationError = StorageError::UnknownObject("a/b.pdf".to_string()).into();
        assert!(matches!(error, MigrationError::Storage(_)));
        assert_eq!(error.to_string(), "Unknown object a/b.pdf");
    }

    #[test]
    fn test_repository_error_display() {
        let error = RepositoryError::Save {
            id: "S0001-00000000000001".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unable to save S0001-00000000000001: timeout"
        );
    }
}
