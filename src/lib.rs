//! A library for migrating a legacy ISIS bibliographic database to a modern document store.
//!
//! `isis_migration` decodes the legacy tagged-record exports of journals, issues and
//! articles, exposes typed views over them, locates each article's legacy files
//! (PDFs, XML, translation HTML, images), uploads them to object storage and tracks,
//! per article, how complete the migration is.
//!
//! # Features
//!
//! The library has several optional features that can be enabled in your Cargo.toml:
//!
//! - `xml` - Rewrite article XML for publication (enabled by default)
//! - `csv` - Write batch outcome reports (enabled by default)
//! - `parallel` - Migrate batches of articles in parallel (enabled by default)
//! - `regex` / `lite` - Select `regex` or the smaller `regex-lite` (`regex` by default)
//!
//! ```toml
//! [dependencies]
//! isis-migration = { version = "0.1.0", default-features = false, features = ["lite"] }
//! ```
//!
//! # Key Characteristics
//!
//! - **Lossless decoding**: repeated fields keep their count and order, escaped
//!   carets survive as literals and malformed lines are reported, not fatal.
//! - **Typed views**: [`DocumentView`], [`JournalView`] and [`IssueView`] expose
//!   business fields (issue folder, contributors, abstracts, sections) over raw records.
//! - **Tracked migration**: every save recomputes the files-to-migrate and
//!   files-to-publish ratios and advances the [`MigrationStatus`].
//! - **Audit trails**: each operation returns a [`Tracker`] with timestamped
//!   info and error events alongside its result.
//!
//! # Basic Usage
//!
//! ```rust
//! use isis_migration::{DocumentView, IsisDecoder, RecordKind};
//!
//! let input = "!ID 000001\n!v880!S0001-00000000000001\n!v093!20190101\n\
//!              !ID 000002\n!v880!S0001-00000000000001\n!v031!1\n!v032!1\n\
//!              !v040!en\n!v702!abc/v1n1/a01.htm\n";
//!
//! let decoded = IsisDecoder::new(RecordKind::Article).decode(input);
//! let group = &decoded.groups[0];
//! let document = DocumentView::new(&group.id, &group.records).unwrap();
//!
//! assert_eq!(document.issue_folder(), "v1n1");
//! assert_eq!(document.file_name(), "a01");
//! assert_eq!(document.isis_updated_date().as_deref(), Some("20190101"));
//! ```
//!
//! # Migration
//!
//! The [`MigrationManager`] takes its collaborators (migration state store,
//! object storage, document repository, optional pid issuer) as constructor
//! parameters and sequences register, file migration and publication for each
//! article:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use isis_migration::{
//!     DirectoryStorage, DocumentQuery, JsonDirStore, MemoryRepository,
//!     MigrationConfig, MigrationManager,
//! };
//!
//! let mut config = MigrationConfig::default();
//! config.set_website_url("https://www.example.org");
//!
//! let manager = MigrationManager::new(
//!     config,
//!     Arc::new(JsonDirStore::new("/var/migration/state")),
//!     Arc::new(DirectoryStorage::new("/var/migration/objects", "file:///var/migration/objects")),
//!     Arc::new(MemoryRepository::new()),
//! );
//!
//! for outcome in manager.migrate_batch(&DocumentQuery::default()).unwrap() {
//!     println!("{}: {} steps, {} errors", outcome.id, outcome.succeeded_steps.len(), outcome.errors.len());
//! }
//! ```
//!
//! # Error Handling
//!
//! Per-field and per-file problems never abort an operation: decode problems are
//! collected as [`DecodeError`]s and missing files or failed uploads are recorded in
//! the operation's [`Tracker`]. Identifier-level and repository-level failures are
//! returned as [`MigrationError`] and abort only the document being processed.
//!
//! # Thread Safety
//!
//! Decoders and views are plain data. The manager's collaborators are
//! `Send + Sync` and batches can run in parallel through the `run_in_parallel`
//! option.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod isis;
pub mod locator;
pub mod migration;
pub mod pid;
#[cfg(feature = "csv")]
pub mod report;
pub mod repository;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod views;
#[cfg(feature = "xml")]
pub mod xml;

#[cfg(test)]
pub(crate) mod testing;

// Reexports
pub use config::{LegacyLayout, MigrationConfig};
pub use error::{
    DecodeError, FieldError, FileNotFoundError, MigrationError, PidError, RepositoryError,
    Result, StorageError, StoreError,
};
pub use isis::{Decoded, IsisDecoder, RawRecord, RecordGroup, Subfields};
pub use locator::{FileLocator, LocatedFiles};
pub use migration::{DocumentOutcome, MigrationManager};
pub use pid::{PidIssuer, PidRequest, generate_pid_v3};
#[cfg(feature = "csv")]
pub use report::write_outcomes_csv;
pub use repository::{DocumentRepository, MemoryRepository};
pub use storage::{DirectoryStorage, ObjectStorage};
pub use store::{
    Annotation, DocumentQuery, JsonDirStore, MemoryStore, MigrationItem, MigrationStatus,
    MigrationStore, RecordItem, RemoteAndLocalFile,
};
pub use tracker::Tracker;
pub use views::{DocumentView, IssueView, JournalView, Paragraphs};

mod regex;
mod utils;

/// Kinds of legacy records, each decoded from its own export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Journal,
    Issue,
    Article,
}

impl RecordKind {
    /// Convert the kind to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Journal => "journal",
            RecordKind::Issue => "issue",
            RecordKind::Article => "article",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup the full text of a document was produced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Xml,
    #[default]
    Html,
}

impl FileType {
    /// Derives the file type from a legacy file extension such as ".xml".
    pub fn from_extension(extension: &str) -> Self {
        if extension.eq_ignore_ascii_case(".xml") {
            FileType::Xml
        } else {
            FileType::Html
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Xml => "xml",
            FileType::Html => "html",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
