// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use async_trait::async_trait;
use bytes::Bytes;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tokio::io::AsyncWriteExt;

use crate::store::{DeleteOutcome, ObjectStore, ObjectStoreError};

/// An [`ObjectStore`] keeping blobs on the local filesystem, with the
/// storage key as the path relative to a base directory
pub struct FsObjectStore {
    base_path: Utf8PathBuf,
}

impl FsObjectStore {
    /// Create a new [`FsObjectStore`] rooted at the given directory
    #[must_use]
    pub fn new(base_path: Utf8PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a storage key to a path under the base directory, rejecting
    /// keys which would escape it
    fn resolve(&self, key: &str) -> Result<Utf8PathBuf, ObjectStoreError> {
        let path = Utf8Path::new(key);
        let valid = !key.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Utf8Component::Normal(_)));
        if !valid {
            return Err(ObjectStoreError::InvalidKey {
                key: key.to_owned(),
            });
        }

        Ok(self.base_path.join(path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let full_path = self.resolve(key)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&full_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!(%full_path, "Saved blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let full_path = self.resolve(key)?;

        match tokio::fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ObjectStoreError::NotFound {
                key: key.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, ObjectStoreError> {
        let full_path = self.resolve(key)?;

        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!(%full_path, "Deleted blob");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use camino::Utf8PathBuf;

    use super::*;

    fn store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        (dir, FsObjectStore::new(base))
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (_dir, store) = store();

        store
            .put("group-files/notes.pdf", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let data = store.get("group-files/notes.pdf").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"hello"));

        let outcome = store.delete("group-files/notes.pdf").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);

        // Deleting again reports the blob as already gone
        let outcome = store.delete("group-files/notes.pdf").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);

        let err = store.get("group-files/notes.pdf").await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_dir, store) = store();

        for key in ["../escape", "/etc/passwd", ""] {
            let err = store.put(key, Bytes::new()).await.unwrap_err();
            assert!(matches!(err, ObjectStoreError::InvalidKey { .. }), "{key}");
        }
    }
}
