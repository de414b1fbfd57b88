// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Access to the object store holding attachment blobs
//!
//! Blobs are identified by an opaque storage key; the database rows
//! describing them live in the storage backend and have an independent
//! lifecycle. The [`ObjectStore`] trait is what the retention sweeper (and
//! tests) program against; [`FsObjectStore`] keeps blobs on a local
//! filesystem and [`InMemoryObjectStore`] keeps them in a map for tests.

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod fs;
mod memory;
mod store;

pub use self::{
    fs::FsObjectStore,
    memory::InMemoryObjectStore,
    store::{DeleteOutcome, ObjectStore, ObjectStoreError},
};
