use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Local filesystem blob storage
///
/// One flat directory, one regular file per sanitized name. Knows nothing
/// about metadata; uniqueness checks happen upstream.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The storage path derived from a sanitized name
    pub fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write a blob, overwriting any existing content at the same name
    pub async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.blob_path(name);

        // Ensure the upload root exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create upload root: {e}")))?;
        }

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create blob {name}: {e}")))?;
        file.write_all(data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write blob {name}: {e}")))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush blob {name}: {e}")))?;

        tracing::debug!("Saved blob to {:?}", path);
        Ok(())
    }

    /// Remove a blob; absent names and directories both count as not found
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.blob_path(name);

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                Err(AppError::NotFound(format!("No blob named {name}")))
            }
            Ok(_) => {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to delete blob {name}: {e}")))?;
                tracing::debug!("Deleted blob {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("No blob named {name}")))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to stat blob {name}: {e}"))),
        }
    }

    /// True only for a regular file at the derived path
    pub async fn exists(&self, name: &str) -> bool {
        match fs::metadata(self.blob_path(name)).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }

    /// Names of all stored blobs, for the reconciliation sweep
    pub async fn list_names(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // A root that was never written to holds no blobs
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read upload root: {e}"
                )))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read upload root: {e}")))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| AppError::Storage(format!("Failed to stat {:?}: {e}", entry.path())))?;
            if file_type.is_file() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (BlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (BlobStore::new(dir.path().join("uploads")), dir)
    }

    #[tokio::test]
    async fn put_creates_root_and_blob() {
        let (store, _dir) = store();
        store.put("a.txt", b"hello").await.unwrap();
        assert!(store.exists("a.txt").await);
        assert_eq!(std::fs::read(store.blob_path("a.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn put_overwrites_existing_blob() {
        let (store, _dir) = store();
        store.put("a.txt", b"first").await.unwrap();
        store.put("a.txt", b"second").await.unwrap();
        assert_eq!(std::fs::read(store.blob_path("a.txt")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let (store, _dir) = store();
        store.put("a.txt", b"hello").await.unwrap();
        store.delete("a.txt").await.unwrap();
        assert!(!store.exists("a.txt").await);
    }

    #[tokio::test]
    async fn delete_missing_blob_is_not_found() {
        let (store, _dir) = store();
        let err = store.delete("ghost.txt").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_refuses_directories() {
        let (store, _dir) = store();
        std::fs::create_dir_all(store.blob_path("subdir")).unwrap();
        let err = store.delete("subdir").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.blob_path("subdir").is_dir());
    }

    #[tokio::test]
    async fn exists_is_false_for_directories() {
        let (store, _dir) = store();
        std::fs::create_dir_all(store.blob_path("subdir")).unwrap();
        assert!(!store.exists("subdir").await);
    }

    #[tokio::test]
    async fn list_names_skips_directories() {
        let (store, _dir) = store();
        store.put("a.txt", b"a").await.unwrap();
        store.put("b.txt", b"b").await.unwrap();
        std::fs::create_dir_all(store.blob_path("subdir")).unwrap();

        let mut names = store.list_names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn list_names_on_missing_root_is_empty() {
        let (store, _dir) = store();
        assert!(store.list_names().await.unwrap().is_empty());
    }
}
