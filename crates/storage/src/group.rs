// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository to interact with the groups saved in the storage backend.

use async_trait::async_trait;
use campushare_data_model::{Clock, Group};
use rand_core::RngCore;
use ulid::Ulid;

use crate::repository_impl;

/// A [`GroupRepository`] helps interacting with [`Group`] saved in the
/// storage backend
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Lookup a [`Group`] by its ID
    ///
    /// Returns `None` if no [`Group`] was found
    ///
    /// # Parameters
    ///
    /// * `id`: The ID of the [`Group`] to lookup
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn lookup(&mut self, id: Ulid) -> Result<Option<Group>, Self::Error>;

    /// Create a new [`Group`]
    ///
    /// Returns the newly-created [`Group`]
    ///
    /// # Parameters
    ///
    /// * `rng`: The random number generator to use
    /// * `clock`: The clock used to generate timestamps
    /// * `name`: The name of the group
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        name: String,
    ) -> Result<Group, Self::Error>;
}

repository_impl!(GroupRepository:
    async fn lookup(&mut self, id: Ulid) -> Result<Option<Group>, Self::Error>;

    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        name: String,
    ) -> Result<Group, Self::Error>;
);
