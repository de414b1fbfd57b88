// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository to interact with the retention sweeper run log.

use async_trait::async_trait;
use campushare_data_model::{CleanupRun, Clock};
use rand_core::RngCore;

use crate::repository_impl;

/// A [`CleanupRunRepository`] helps interacting with the append-only
/// [`CleanupRun`] log saved in the storage backend
#[async_trait]
pub trait CleanupRunRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Append a new [`CleanupRun`] to the log
    ///
    /// Returns the newly-created [`CleanupRun`]
    ///
    /// # Parameters
    ///
    /// * `rng`: The random number generator to use
    /// * `clock`: The clock used to generate timestamps
    /// * `messages_deleted`: How many messages the run removed
    /// * `attachments_deleted`: How many attachment blobs the run removed
    /// * `error`: A description of the failure, if the run did not complete
    ///   cleanly
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        messages_deleted: u64,
        attachments_deleted: u64,
        error: Option<String>,
    ) -> Result<CleanupRun, Self::Error>;

    /// List the most recent [`CleanupRun`] entries, newest first
    ///
    /// # Parameters
    ///
    /// * `count`: Maximum number of entries to return
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn list_recent(&mut self, count: usize) -> Result<Vec<CleanupRun>, Self::Error>;
}

repository_impl!(CleanupRunRepository:
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        messages_deleted: u64,
        attachments_deleted: u64,
        error: Option<String>,
    ) -> Result<CleanupRun, Self::Error>;

    async fn list_recent(&mut self, count: usize) -> Result<Vec<CleanupRun>, Self::Error>;
);
