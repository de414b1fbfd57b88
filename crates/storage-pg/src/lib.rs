// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! An implementation of the storage traits for a PostgreSQL backend
//!
//! This crate implements the repository traits defined by
//! [`campushare-storage`] for a PostgreSQL database, using [`sqlx`].
//!
//! It also embeds the schema migrations in the [`MIGRATOR`], which can be
//! used to run the migrations from the service itself.
//!
//! [`campushare-storage`]: campushare_storage

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod errors;
pub(crate) mod tracing;

pub mod cleanup_run;
pub mod group;
pub mod message;
pub mod repository;

pub use self::{
    errors::DatabaseError,
    repository::{PgRepository, PgRepositoryFactory},
    tracing::ExecuteExt,
};

/// Embedded migrations, allowing them to run on startup
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
