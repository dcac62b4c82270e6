use super::{MigrationItem, MigrationStore, RecordItem};
use crate::error::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DOCUMENTS: &str = "documents";
const JOURNALS: &str = "journals";
const ISSUES: &str = "issues";

/// [`MigrationStore`] keeping one JSON file per item under
/// `{root}/{documents,journals,issues}/{id}.json`.
///
/// Files are written to a temporary file in the same directory and renamed
/// over the previous version, so a failed write keeps the previous state.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn read<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<T>, StoreError> {
        read_item(&self.path(kind, id))
    }

    fn write<T: Serialize>(&self, kind: &str, id: &str, item: &T) -> Result<(), StoreError> {
        let path = self.path(kind, id);
        let dir = self.root.join(kind);
        let write_error = |source: io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(write_error)?;
        let file = NamedTempFile::new_in(&dir).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, item).map_err(|source| StoreError::Serde {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(write_error)?;
        let file = writer
            .into_inner()
            .map_err(|error| write_error(error.into_error()))?;
        file.persist(&path)
            .map_err(|error| write_error(error.error))?;
        tracing::debug!(path = %path.display(), "Persisted migration state");
        Ok(())
    }
}

fn read_item<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_reader(BufReader::new(file))
        .map(Some)
        .map_err(|source| StoreError::Serde {
            path: path.to_path_buf(),
            source,
        })
}

impl MigrationStore for JsonDirStore {
    fn fetch_document(&self, id: &str) -> Result<Option<MigrationItem>, StoreError> {
        self.read(DOCUMENTS, id)
    }

    fn persist_document(&self, item: &MigrationItem) -> Result<(), StoreError> {
        self.write(DOCUMENTS, &item.id, item)
    }

    fn documents(&self) -> Result<Vec<MigrationItem>, StoreError> {
        let dir = self.root.join(DOCUMENTS);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Read { path: dir, source }),
        };

        let mut items = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| StoreError::Read {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                items.extend(read_item::<MigrationItem>(&path)?);
            }
        }
        Ok(items)
    }

    fn fetch_journal(&self, id: &str) -> Result<Option<RecordItem>, StoreError> {
        self.read(JOURNALS, id)
    }

    fn persist_journal(&self, item: &RecordItem) -> Result<(), StoreError> {
        self.write(JOURNALS, &item.id, item)
    }

    fn fetch_issue(&self, id: &str) -> Result<Option<RecordItem>, StoreError> {
        self.read(ISSUES, id)
    }

    fn persist_issue(&self, item: &RecordItem) -> Result<(), StoreError> {
        self.write(ISSUES, &item.id, item)
    }
}
