//! Migration state store.
//!
//! One [`MigrationItem`] per article tracks which legacy files reached object
//! storage and which artifacts were published. Journals and issues are kept as
//! [`RecordItem`]s so documents can be registered and published after them.
//!
//! Stores only persist. [`MigrationStore::save_document`] recomputes the
//! tracked files, ratios and status of an item before persisting it, so every
//! write path goes through the same transition rule.

mod item;
mod json;
mod memory;
mod query;

pub use item::{
    Annotation, MigrationItem, MigrationStatus, PUBLISHED_XML, RecordItem, RemoteAndLocalFile,
    TranslationFiles, published_html_key,
};
pub use json::JsonDirStore;
pub use memory::MemoryStore;
pub use query::DocumentQuery;

use crate::error::StoreError;

/// Persistence of migration state.
pub trait MigrationStore: Send + Sync {
    /// Fetches a document by pid v2.
    fn fetch_document(&self, id: &str) -> Result<Option<MigrationItem>, StoreError>;
    /// Writes `item` as is.
    fn persist_document(&self, item: &MigrationItem) -> Result<(), StoreError>;
    /// Every stored document, in no particular order.
    fn documents(&self) -> Result<Vec<MigrationItem>, StoreError>;

    /// Fetches a journal by ISSN.
    fn fetch_journal(&self, id: &str) -> Result<Option<RecordItem>, StoreError>;
    fn persist_journal(&self, item: &RecordItem) -> Result<(), StoreError>;

    /// Fetches an issue by its record key, e.g. `0001-371420200002`.
    fn fetch_issue(&self, id: &str) -> Result<Option<RecordItem>, StoreError>;
    fn persist_issue(&self, item: &RecordItem) -> Result<(), StoreError>;

    /// Refreshes, timestamps and persists `item`.
    fn save_document(&self, mut item: MigrationItem) -> Result<MigrationItem, StoreError> {
        item.refresh();
        item.touch();
        self.persist_document(&item)?;
        Ok(item)
    }

    fn save_journal(&self, mut item: RecordItem) -> Result<RecordItem, StoreError> {
        item.touch();
        self.persist_journal(&item)?;
        Ok(item)
    }

    fn save_issue(&self, mut item: RecordItem) -> Result<RecordItem, StoreError> {
        item.touch();
        self.persist_issue(&item)?;
        Ok(item)
    }

    /// Documents selected by `query`.
    fn query_documents(&self, query: &DocumentQuery) -> Result<Vec<MigrationItem>, StoreError> {
        Ok(query.apply(self.documents()?))
    }
}
