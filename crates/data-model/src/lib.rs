// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Data types shared between the storage layer and the retention tasks.
//!
//! Everything in this crate is a plain value type: no I/O, no database
//! coupling. The [`Clock`] trait lives here so that both the storage layer
//! and the tasks can be driven by a [`MockClock`] in tests.

#![allow(clippy::module_name_repetitions)]

mod cleanup_run;
mod clock;
mod group;
mod message;

pub use self::{
    cleanup_run::CleanupRun,
    clock::{Clock, MockClock, SystemClock},
    group::Group,
    message::{Attachment, ExpiredAttachment, ExpiredMessage, GroupMessage},
};
