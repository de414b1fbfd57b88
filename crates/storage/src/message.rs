// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository to interact with the group messages saved in the storage
//! backend.

use async_trait::async_trait;
use campushare_data_model::{Attachment, Clock, ExpiredMessage, Group, GroupMessage};
use chrono::{DateTime, Utc};
use rand_core::RngCore;
use ulid::Ulid;

use crate::repository_impl;

/// A [`GroupMessageRepository`] helps interacting with [`GroupMessage`]
/// saved in the storage backend
#[async_trait]
pub trait GroupMessageRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Lookup a [`GroupMessage`] by its ID, with its attachment if it has
    /// one
    ///
    /// Returns `None` if no [`GroupMessage`] was found
    ///
    /// # Parameters
    ///
    /// * `id`: The ID of the [`GroupMessage`] to lookup
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn lookup(&mut self, id: Ulid) -> Result<Option<GroupMessage>, Self::Error>;

    /// Create a new [`GroupMessage`] in the given group
    ///
    /// Returns the newly-created [`GroupMessage`]
    ///
    /// # Parameters
    ///
    /// * `rng`: The random number generator to use
    /// * `clock`: The clock used to generate timestamps
    /// * `group`: The [`Group`] the message is posted to
    /// * `author`: Subject identifier of the author
    /// * `body`: The message body, or `None` for a file-only post
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        group: &Group,
        author: String,
        body: Option<String>,
    ) -> Result<GroupMessage, Self::Error>;

    /// Attach a file to an existing [`GroupMessage`]
    ///
    /// Returns the newly-created [`Attachment`]
    ///
    /// # Parameters
    ///
    /// * `rng`: The random number generator to use
    /// * `clock`: The clock used to generate timestamps
    /// * `message`: The [`GroupMessage`] the file is attached to
    /// * `storage_key`: Opaque key of the blob in the object store
    /// * `size`: Declared size of the blob in bytes
    /// * `mime_type`: Declared MIME type of the blob
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn attach(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        message: &GroupMessage,
        storage_key: String,
        size: u64,
        mime_type: String,
    ) -> Result<Attachment, Self::Error>;

    /// List messages created strictly before the given cutoff, along with
    /// their attachment storage keys, oldest first
    ///
    /// The cutoff comparison is strict: a message created exactly at the
    /// cutoff is not returned.
    ///
    /// # Parameters
    ///
    /// * `cutoff`: Messages created strictly before this instant are
    ///   returned
    /// * `limit`: Maximum number of messages to return
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn list_expired(
        &mut self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExpiredMessage>, Self::Error>;

    /// Delete the messages with the given IDs, cascading to their attachment
    /// rows
    ///
    /// Returns the number of messages actually deleted. IDs which don't
    /// resolve to a message anymore are skipped, so the operation is
    /// idempotent.
    ///
    /// # Parameters
    ///
    /// * `ids`: The IDs of the messages to delete
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn delete_batch(&mut self, ids: Vec<Ulid>) -> Result<u64, Self::Error>;
}

repository_impl!(GroupMessageRepository:
    async fn lookup(&mut self, id: Ulid) -> Result<Option<GroupMessage>, Self::Error>;

    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        group: &Group,
        author: String,
        body: Option<String>,
    ) -> Result<GroupMessage, Self::Error>;

    async fn attach(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        message: &GroupMessage,
        storage_key: String,
        size: u64,
        mime_type: String,
    ) -> Result<Attachment, Self::Error>;

    async fn list_expired(
        &mut self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExpiredMessage>, Self::Error>;

    async fn delete_batch(&mut self, ids: Vec<Ulid>) -> Result<u64, Self::Error>;
);
