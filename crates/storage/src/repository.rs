// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use async_trait::async_trait;
use futures_util::{FutureExt, TryFutureExt, future::BoxFuture};
use thiserror::Error;

use crate::{
    MapErr, cleanup_run::CleanupRunRepository, group::GroupRepository,
    message::GroupMessageRepository,
};

/// The type-erased error type used by the [`BoxRepository`]
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RepositoryError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl RepositoryError {
    /// Construct a [`RepositoryError`] out of any error
    pub fn from_error<E>(value: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(value),
        }
    }
}

/// A [`Repository`] is a wrapper over the various repositories, which can be
/// saved or cancelled as one transaction
pub trait Repository<E>:
    RepositoryAccess<Error = E> + RepositoryTransaction<Error = E> + Send
{
}

/// A type-erased [`Repository`]
pub type BoxRepository = Box<dyn Repository<RepositoryError>>;

/// A factory which can spawn [`BoxRepository`], usually from an underlying
/// connection pool
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Spawn a new [`BoxRepository`]
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if a connection could not be acquired
    async fn create(&self) -> Result<BoxRepository, RepositoryError>;
}

/// A type-erased [`RepositoryFactory`]
pub type BoxRepositoryFactory = Box<dyn RepositoryFactory + 'static>;

/// A [`RepositoryTransaction`] can be saved or cancelled, after a series of
/// operations
pub trait RepositoryTransaction {
    /// The error type used by the [`Self::save`] and [`Self::cancel`]
    /// functions
    type Error;

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying storage backend failed to
    /// commit the transaction
    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// Rollback the transaction
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying storage backend failed to
    /// rollback the transaction
    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;
}

/// Access the various repositories the backend implements.
pub trait RepositoryAccess: Send {
    /// The backend-specific error type used by each repository.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get a [`GroupRepository`]
    fn group<'c>(&'c mut self) -> Box<dyn GroupRepository<Error = Self::Error> + 'c>;

    /// Get a [`GroupMessageRepository`]
    fn group_message<'c>(&'c mut self)
    -> Box<dyn GroupMessageRepository<Error = Self::Error> + 'c>;

    /// Get a [`CleanupRunRepository`]
    fn cleanup_run<'c>(&'c mut self) -> Box<dyn CleanupRunRepository<Error = Self::Error> + 'c>;
}

// Implementations of the RepositoryAccess, RepositoryTransaction and
// Repository traits for the MapErr wrapper

impl<R, F, E> RepositoryAccess for MapErr<R, F>
where
    R: RepositoryAccess,
    F: FnMut(<R as RepositoryAccess>::Error) -> E + Send + Sync + Clone + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn group<'c>(&'c mut self) -> Box<dyn GroupRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.group(), self.mapper.clone()))
    }

    fn group_message<'c>(
        &'c mut self,
    ) -> Box<dyn GroupMessageRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.group_message(), self.mapper.clone()))
    }

    fn cleanup_run<'c>(&'c mut self) -> Box<dyn CleanupRunRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.cleanup_run(), self.mapper.clone()))
    }
}

impl<R, F, E> RepositoryTransaction for MapErr<R, F>
where
    R: RepositoryTransaction,
    <R as RepositoryTransaction>::Error: 'static,
    F: FnMut(<R as RepositoryTransaction>::Error) -> E + Send + 'static,
{
    type Error = E;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let this = *self;
        Box::new(this.inner).save().map_err(this.mapper).boxed()
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let this = *self;
        Box::new(this.inner).cancel().map_err(this.mapper).boxed()
    }
}

impl<R, F, E, RE> Repository<E> for MapErr<R, F>
where
    R: Repository<RE> + RepositoryAccess<Error = RE>,
    RE: std::error::Error + Send + Sync + 'static,
    F: FnMut(RE) -> E + Send + Sync + Clone + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
}
