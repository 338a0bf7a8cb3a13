//! Image object storage
//!
//! Given bytes and metadata, return a stored-image handle with a retrievable
//! URL. Keys are content-addressed, so identical uploads share one object.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write image object {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete image object {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    pub fn key(&self) -> &str {
        match self {
            StorageError::Write { key, .. }
            | StorageError::Delete { key, .. }
            | StorageError::InvalidKey(key) => key,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Image storage failure");
        AppError::with_message(ErrorCode::ImageStorageFailed, err.to_string())
            .with_detail("storage_key", err.key())
    }
}

/// Handle returned by [`ImageStore::put`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
    pub content_type: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(
        &self,
        project_id: i64,
        bytes: &[u8],
        extension: &str,
    ) -> Result<StoredImage, StorageError>;

    /// Deleting a missing object is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn url_for(&self, key: &str) -> String;
}

/// Calculate SHA256 hash of data
pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Filesystem store under `{uploads_dir}/zone-images/{project}/{sha256}.{ext}`,
/// served at `{base_url}/uploads/...`
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(
        &self,
        project_id: i64,
        bytes: &[u8],
        extension: &str,
    ) -> Result<StoredImage, StorageError> {
        let hash = calculate_hash(bytes);
        let key = format!("zone-images/{project_id}/{hash}.{extension}");
        let path = self.path_for(&key)?;

        let write_err = |source| StorageError::Write {
            key: key.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(write_err)?;

        tracing::info!(
            hash = %hash,
            size = bytes.len(),
            key = %key,
            "Image object stored"
        );

        Ok(StoredImage {
            url: self.url_for(&key),
            content_type: mime_guess::from_ext(extension)
                .first_or_octet_stream()
                .to_string(),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %key, "Image object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/uploads/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "http://localhost:3000/");

        let stored = store.put(7, b"fake png bytes", "png").await.unwrap();
        assert!(stored.key.starts_with("zone-images/7/"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(
            stored.url,
            format!("http://localhost:3000/uploads/{}", stored.key)
        );
        assert!(dir.path().join(&stored.key).exists());

        // Same bytes, same object
        let again = store.put(7, b"fake png bytes", "png").await.unwrap();
        assert_eq!(again.key, stored.key);

        store.delete(&stored.key).await.unwrap();
        assert!(!dir.path().join(&stored.key).exists());
        // Already gone
        store.delete(&stored.key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path(), "http://localhost");

        assert!(matches!(
            store.delete("../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.delete("/abs/path").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_calculate_hash() {
        assert_eq!(
            calculate_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
