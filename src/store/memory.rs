use super::{MigrationItem, MigrationStore, RecordItem};
use crate::error::StoreError;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process [`MigrationStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, MigrationItem>>,
    journals: RwLock<HashMap<String, RecordItem>>,
    issues: RwLock<HashMap<String, RecordItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn fetch<T: Clone>(items: &RwLock<HashMap<String, T>>, id: &str) -> Result<Option<T>, StoreError> {
    Ok(items
        .read()
        .map_err(|_| StoreError::Poisoned)?
        .get(id)
        .cloned())
}

fn persist<T: Clone>(
    items: &RwLock<HashMap<String, T>>,
    id: &str,
    item: &T,
) -> Result<(), StoreError> {
    items
        .write()
        .map_err(|_| StoreError::Poisoned)?
        .insert(id.to_string(), item.clone());
    Ok(())
}

impl MigrationStore for MemoryStore {
    fn fetch_document(&self, id: &str) -> Result<Option<MigrationItem>, StoreError> {
        fetch(&self.documents, id)
    }

    fn persist_document(&self, item: &MigrationItem) -> Result<(), StoreError> {
        persist(&self.documents, &item.id, item)
    }

    fn documents(&self) -> Result<Vec<MigrationItem>, StoreError> {
        Ok(self
            .documents
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .values()
            .cloned()
            .collect())
    }

    fn fetch_journal(&self, id: &str) -> Result<Option<RecordItem>, StoreError> {
        fetch(&self.journals, id)
    }

    fn persist_journal(&self, item: &RecordItem) -> Result<(), StoreError> {
        persist(&self.journals, &item.id, item)
    }

    fn fetch_issue(&self, id: &str) -> Result<Option<RecordItem>, StoreError> {
        fetch(&self.issues, id)
    }

    fn persist_issue(&self, item: &RecordItem) -> Result<(), StoreError> {
        persist(&self.issues, &item.id, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isis::RawRecord;

    #[test]
    fn test_journal_and_issue() {
        let store = MemoryStore::new();
        let record = RawRecord::from_fields([("v068", "abc")]);
        store
            .save_journal(RecordItem::new("0001-3714", record.clone()))
            .unwrap();
        store
            .save_issue(RecordItem::new("0001-371420200002", record))
            .unwrap();

        let journal = store.fetch_journal("0001-3714").unwrap().unwrap();
        assert_eq!(journal.record.value("v068"), Some("abc"));
        assert!(journal.updated.is_some());
        assert!(store.fetch_issue("0001-371420200002").unwrap().is_some());
        assert!(store.fetch_issue("missing").unwrap().is_none());
    }
}
