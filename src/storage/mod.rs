use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

/// Errors from the import file storage collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to store file at {path}: {source}")]
    Store {
        path: String,
        source: std::io::Error,
    },

    #[error("Unable to read file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Unable to resolve a local path for {0}")]
    Resolve(String),

    #[error("Unable to create temporary file for import: {0}")]
    TempFile(std::io::Error),
}

/// A stored import file resolved to something locally readable
///
/// Remote disks materialize into a temporary copy; holding the temp file
/// inside the resolved handle ties its lifetime to the read pass, and Drop
/// releases it on every exit path, including early returns and panics.
pub struct ResolvedImportFile {
    path: PathBuf,
    _temp: Option<NamedTempFile>,
}

impl ResolvedImportFile {
    /// Wrap a path that is already local; nothing to release
    pub fn local(path: PathBuf) -> Self {
        Self { path, _temp: None }
    }

    /// Materialize remote bytes into a temporary local file
    pub fn materialize(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut temp = NamedTempFile::new().map_err(StorageError::TempFile)?;
        temp.write_all(bytes).map_err(StorageError::TempFile)?;
        temp.flush().map_err(StorageError::TempFile)?;

        Ok(Self {
            path: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// The locally readable path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Storage collaborator for uploaded import files
///
/// The concrete disk (local directory, remote object store) is a
/// deployment concern; the import pipeline only depends on this boundary.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Name of the disk, recorded on the import for later resolution
    fn disk(&self) -> &str;

    /// Persist bytes under the given relative path, returning the stored path
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove a stored file (cleanup after failed import creation)
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Resolve a stored path to a locally readable file
    ///
    /// Implementations backed by remote disks copy into a temporary local
    /// file owned by the returned handle; the caller must not outlive the
    /// read pass with it.
    async fn resolve_local(&self, path: &str) -> Result<ResolvedImportFile, StorageError>;
}

/// Local-disk storage rooted at a directory
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl FileStorage for LocalDiskStorage {
    fn disk(&self) -> &str {
        "local"
    }

    async fn store(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let absolute = self.absolute(path);

        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Store {
                    path: path.to_string(),
                    source,
                })?;
        }

        tokio::fs::write(&absolute, bytes)
            .await
            .map_err(|source| StorageError::Store {
                path: path.to_string(),
                source,
            })?;

        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let absolute = self.absolute(path);

        if let Err(source) = tokio::fs::remove_file(&absolute).await {
            // Best-effort cleanup; a missing file is already gone
            if source.kind() != std::io::ErrorKind::NotFound {
                warn!(path, error = %source, "failed to delete stored import file");
                return Err(StorageError::Store {
                    path: path.to_string(),
                    source,
                });
            }
        }

        Ok(())
    }

    async fn resolve_local(&self, path: &str) -> Result<ResolvedImportFile, StorageError> {
        let absolute = self.absolute(path);

        if !absolute.is_file() {
            return Err(StorageError::Resolve(path.to_string()));
        }

        Ok(ResolvedImportFile::local(absolute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_resolve_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        let stored = storage
            .store("imports/test.csv", b"date,price\n2024-01-02,10\n")
            .await
            .unwrap();
        assert_eq!(stored, "imports/test.csv");

        let resolved = storage.resolve_local(&stored).await.unwrap();
        let contents = std::fs::read_to_string(resolved.path()).unwrap();
        assert!(contents.starts_with("date,price"));
    }

    #[tokio::test]
    async fn test_resolve_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        assert!(matches!(
            storage.resolve_local("imports/absent.csv").await,
            Err(StorageError::Resolve(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        storage.store("imports/x.csv", b"data").await.unwrap();
        storage.delete("imports/x.csv").await.unwrap();
        // Second delete of a now-missing file is not an error
        storage.delete("imports/x.csv").await.unwrap();
    }

    #[test]
    fn test_materialized_temp_copy_is_released_on_drop() {
        let resolved = ResolvedImportFile::materialize(b"date,price\n").unwrap();
        let path = resolved.path().to_path_buf();
        assert!(path.is_file());

        drop(resolved);
        assert!(!path.exists());
    }
}
