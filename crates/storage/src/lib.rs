// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Interactions with the storage backend
//!
//! This crate provides a set of traits that can be implemented to interact
//! with the storage backend. Those traits are called repositories and are
//! grouped by the type of data they manage.
//!
//! Each of those repositories can be accessed via the [`RepositoryAccess`]
//! trait. This trait can be wrapped in a [`BoxRepository`] to allow using it
//! without caring about the underlying storage backend, and without carrying
//! around the generic type parameter.
//!
//! # Defining a new repository
//!
//! To define a new repository, you have to:
//!   1. Define a new (async) repository trait, with the methods you need
//!   2. Write an implementation of this trait for each storage backend you
//!      want (currently only for [`campushare-storage-pg`])
//!   3. Make it accessible via the [`RepositoryAccess`] trait
//!
//! Things to note with the implementations:
//!
//!   1. Each trait defines an associated error type, and all functions are
//!      fallible, using that error type
//!   2. Lookups return a `Result<Option<T>, Self::Error>`, because 'not
//!      found' is usually handled differently from a backend failure
//!   3. Operations that record the current time take a [`Clock`] parameter,
//!      and operations that generate new IDs also take a random number
//!      generator
//!   4. All the methods use `&mut self`, which ensures only one operation is
//!      done at a time on a single repository instance
//!
//! [`Clock`]: campushare_data_model::Clock

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod repository;
mod utils;

pub mod cleanup_run;
pub mod group;
pub mod message;

pub use self::{
    cleanup_run::CleanupRunRepository,
    group::GroupRepository,
    message::GroupMessageRepository,
    repository::{
        BoxRepository, BoxRepositoryFactory, Repository, RepositoryAccess, RepositoryError,
        RepositoryFactory, RepositoryTransaction,
    },
    utils::MapErr,
};
