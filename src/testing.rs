//! Shared fixtures for the migration tests.

use crate::config::{LegacyLayout, MigrationConfig};
use crate::error::{PidError, StorageError};
use crate::isis::RawRecord;
use crate::migration::MigrationManager;
use crate::pid::{PidIssuer, PidRequest};
use crate::repository::MemoryRepository;
use crate::storage::{DirectoryStorage, ObjectStorage};
use crate::store::MemoryStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) const PID: &str = "S0001-37142020000200005";
pub(crate) const PID_V3: &str = "WqBhHMdTvbXQ8KN6hMqKnNM";
pub(crate) const FILES_URL: &str = "https://files.example.org";

/// Issues the same pid v3 for every request.
pub(crate) struct FixedPidIssuer(pub &'static str);

impl PidIssuer for FixedPidIssuer {
    fn issue_pid_v3(&self, _request: &PidRequest) -> Result<String, PidError> {
        Ok(self.0.to_string())
    }
}

/// Refuses every upload.
pub(crate) struct FailingStorage;

impl ObjectStorage for FailingStorage {
    fn register(
        &self,
        local_path: &Path,
        _folder: &str,
        _filename: &str,
    ) -> Result<String, StorageError> {
        Err(StorageError::Register {
            path: local_path.to_path_buf(),
            reason: "connection refused".to_string(),
        })
    }

    fn get_url(&self, object_name: &str) -> Result<String, StorageError> {
        Err(StorageError::UnknownObject(object_name.to_string()))
    }
}

/// A legacy website and an object storage in temporary directories, with
/// in-memory store and repository.
pub(crate) struct Fixture {
    pub legacy: TempDir,
    pub objects: TempDir,
    pub config: MigrationConfig,
    pub store: Arc<MemoryStore>,
    pub repository: Arc<MemoryRepository>,
}

impl Fixture {
    pub fn new() -> Self {
        let legacy = TempDir::new().unwrap();
        let objects = TempDir::new().unwrap();
        let mut config = MigrationConfig::new();
        config
            .set_layout(LegacyLayout::from_root(legacy.path()))
            .set_website_url("https://www.example.org")
            .add_legacy_host("www.example.org");
        Self {
            legacy,
            objects,
            config,
            store: Arc::new(MemoryStore::new()),
            repository: Arc::new(MemoryRepository::new()),
        }
    }

    pub fn manager(&self) -> MigrationManager {
        self.manager_with_storage(Arc::new(DirectoryStorage::new(
            self.objects.path(),
            FILES_URL,
        )))
    }

    pub fn manager_with_storage(&self, storage: Arc<dyn ObjectStorage>) -> MigrationManager {
        MigrationManager::new(
            self.config.clone(),
            self.store.clone(),
            storage,
            self.repository.clone(),
        )
        .with_pid_issuer(Arc::new(FixedPidIssuer(PID_V3)))
    }

    pub fn legacy_path(&self, relative: &str) -> PathBuf {
        self.legacy.path().join(relative)
    }

    pub fn objects_path(&self, relative: &str) -> PathBuf {
        self.objects.path().join(relative)
    }

    pub fn write_legacy_file(&self, relative: &str, content: &str) {
        let path = self.legacy_path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

pub(crate) fn journal_record() -> RawRecord {
    RawRecord::from_fields([
        ("v400", "0001-3714"),
        ("v068", "ABC"),
        ("v100", "Journal of ABC"),
        ("v150", "J. ABC"),
        ("v480", "ABC Society"),
        ("v050", "C"),
        ("v940", "20100101"),
        ("v941", "20190101"),
    ])
}

pub(crate) fn issue_record() -> RawRecord {
    RawRecord::from_fields([
        ("v035", "0001-3714"),
        ("v036", "20202"),
        ("v031", "49"),
        ("v032", "2"),
        ("v065", "20200600"),
        ("v042", "1"),
        ("v049", "^cABC010^len^tOriginal Articles"),
        ("v049", "^cABC010^lpt^tArtigos Originais"),
    ])
}

/// Fields of the metadata record of [`PID`], an HTML article in English.
pub(crate) fn metadata_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("v706", "h"),
        ("v880", PID),
        ("v035", "0001-3714"),
        ("v031", "49"),
        ("v032", "2"),
        ("v065", "20200600"),
        ("v040", "en"),
        ("v702", "abc\\v49n2\\a05.htm"),
        ("v012", "Article title^len"),
        ("v012", "Título do artigo^lpt"),
        ("v049", "ABC010"),
        ("v071", "oa"),
        ("v121", "5"),
        ("v014", "^f10^l20"),
        ("v237", "10.1590/abc.2020.005"),
    ]
}

/// Header and metadata records of [`PID`].
pub(crate) fn article_records(isis_updated_date: &str) -> Vec<RawRecord> {
    vec![
        RawRecord::from_fields([
            ("v706", "o"),
            ("v880", PID),
            ("v091", "20180101"),
            ("v093", isis_updated_date),
        ]),
        RawRecord::from_fields(metadata_fields()),
    ]
}
