//! Object storage collaborator.
//!
//! Migrated originals, zip archives and published HTML/XML are all uploaded
//! through [`ObjectStorage`]. Retries belong to the implementation; callers
//! treat a failed upload as "not migrated".

use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Uploads local files and resolves their public URIs.
pub trait ObjectStorage: Send + Sync {
    /// Uploads `local_path` as `{folder}/{filename}` and returns its URI.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the upload fails.
    fn register(&self, local_path: &Path, folder: &str, filename: &str)
    -> Result<String, StorageError>;

    /// URI of a previously registered object.
    fn get_url(&self, object_name: &str) -> Result<String, StorageError>;
}

/// [`ObjectStorage`] backed by a local directory.
///
/// Objects are copied to `{root}/{folder}/{filename}` and exposed as
/// `{base_url}/{folder}/{filename}`.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
    base_url: String,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_name(folder: &str, filename: &str) -> String {
        let folder = folder.trim_matches('/');
        if folder.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", folder, filename)
        }
    }
}

impl ObjectStorage for DirectoryStorage {
    fn register(
        &self,
        local_path: &Path,
        folder: &str,
        filename: &str,
    ) -> Result<String, StorageError> {
        let object_name = Self::object_name(folder, filename);
        let target = self.root.join(&object_name);
        let copy = || -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(local_path, &target)?;
            Ok(())
        };
        copy().map_err(|e| StorageError::Register {
            path: local_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(file = %local_path.display(), object = %object_name, "registered object");
        self.get_url(&object_name)
    }

    fn get_url(&self, object_name: &str) -> Result<String, StorageError> {
        if !self.root.join(object_name).is_file() {
            return Err(StorageError::UnknownObject(object_name.to_string()));
        }
        Ok(format!("{}/{}", self.base_url, object_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_and_get_url() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let file = source.path().join("a01.pdf");
        std::fs::write(&file, b"%PDF").unwrap();

        let storage = DirectoryStorage::new(target.path(), "https://files.example.org/");
        let uri = storage
            .register(&file, "migration/0001-3714/v1n1/a01", "a01.pdf")
            .unwrap();

        assert_eq!(
            uri,
            "https://files.example.org/migration/0001-3714/v1n1/a01/a01.pdf"
        );
        assert!(target.path().join("migration/0001-3714/v1n1/a01/a01.pdf").is_file());
    }

    #[test]
    fn test_register_missing_file() {
        let target = tempfile::tempdir().unwrap();
        let storage = DirectoryStorage::new(target.path(), "file://x");
        let result = storage.register(Path::new("/nonexistent/a01.pdf"), "f", "a01.pdf");
        assert!(matches!(result, Err(StorageError::Register { .. })));
    }

    #[test]
    fn test_unknown_object() {
        let target = tempfile::tempdir().unwrap();
        let storage = DirectoryStorage::new(target.path(), "file://x");
        assert!(matches!(
            storage.get_url("nothing.pdf"),
            Err(StorageError::UnknownObject(_))
        ));
    }
}
