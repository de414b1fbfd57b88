// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use async_trait::async_trait;
use bytes::Bytes;

/// Error type returned by an [`ObjectStore`]
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// No blob exists under the requested key
    #[error("no blob under key {key:?}")]
    NotFound {
        /// The requested storage key
        key: String,
    },

    /// An I/O error talking to the backing store. Considered transient:
    /// the operation may succeed if retried.
    #[error("object store I/O error")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// The storage key is not valid for this store
    #[error("invalid storage key {key:?}")]
    InvalidKey {
        /// The offending storage key
        key: String,
    },
}

impl ObjectStoreError {
    /// Whether retrying the operation can be expected to help
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::NotFound { .. } | Self::InvalidKey { .. } => false,
        }
    }
}

/// The outcome of a blob deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The blob existed and was deleted
    Deleted,

    /// No blob existed under the key. Callers enforcing retention treat
    /// this as success: the blob is gone either way.
    NotFound,
}

/// A store holding blobs under opaque storage keys
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob under the given key, replacing any previous content
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectStoreError`] if the blob could not be written
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;

    /// Fetch the blob stored under the given key
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] if there is no blob under the
    /// key, or another [`ObjectStoreError`] if the store failed
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;

    /// Delete the blob stored under the given key
    ///
    /// Returns [`DeleteOutcome::NotFound`] instead of an error when the
    /// blob is already gone.
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectStoreError`] if the store failed
    async fn delete(&self, key: &str) -> Result<DeleteOutcome, ObjectStoreError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<T> {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        (**self).put(key, data).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, ObjectStoreError> {
        (**self).delete(key).await
    }
}
