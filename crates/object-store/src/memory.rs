// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;

use crate::store::{DeleteOutcome, ObjectStore, ObjectStoreError};

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, Bytes>,
    // Keys for which the next operation fails with an I/O error. Each
    // failure is consumed, so a retry on the same key succeeds.
    failing: HashSet<String>,
    // Keys for which every operation fails.
    broken: HashSet<String>,
    // How many times each key has been deleted, successfully or not.
    delete_attempts: HashMap<String, usize>,
}

/// An in-memory [`ObjectStore`] for tests
///
/// Individual keys can be made to fail, either once ([`Self::fail_once`]) to
/// exercise retry paths, or persistently ([`Self::break_key`]).
#[derive(Default)]
pub struct InMemoryObjectStore {
    inner: Mutex<Inner>,
}

impl InMemoryObjectStore {
    /// Create a new, empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation on the given key fail with a transient error
    pub fn fail_once(&self, key: &str) {
        self.locked().failing.insert(key.to_owned());
    }

    /// Make every operation on the given key fail with a transient error
    pub fn break_key(&self, key: &str) {
        self.locked().broken.insert(key.to_owned());
    }

    /// Whether a blob currently exists under the given key
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.locked().blobs.contains_key(key)
    }

    /// How many times [`ObjectStore::delete`] was called for the given key,
    /// counting failed attempts
    #[must_use]
    pub fn delete_attempts(&self, key: &str) -> usize {
        self.locked().delete_attempts.get(key).copied().unwrap_or(0)
    }

    /// The number of blobs currently in the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.locked().blobs.len()
    }

    /// Whether the store holds no blobs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked().blobs.is_empty()
    }

    #[allow(clippy::missing_panics_doc)]
    fn locked(&self) -> std::sync::MutexGuard<'_, Inner> {
        // The lock is never held across await points, so it can't be poisoned
        // by an async cancellation, only by a panicking test
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_failure(inner: &mut Inner, key: &str) -> Result<(), ObjectStoreError> {
        if inner.broken.contains(key) || inner.failing.remove(key) {
            return Err(ObjectStoreError::Io {
                source: std::io::Error::other(format!("injected failure for key {key:?}")),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let mut inner = self.locked();
        Self::check_failure(&mut inner, key)?;
        inner.blobs.insert(key.to_owned(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let mut inner = self.locked();
        Self::check_failure(&mut inner, key)?;
        inner
            .blobs
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                key: key.to_owned(),
            })
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, ObjectStoreError> {
        let mut inner = self.locked();
        *inner.delete_attempts.entry(key.to_owned()).or_insert(0) += 1;
        Self::check_failure(&mut inner, key)?;
        if inner.blobs.remove(key).is_some() {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}
