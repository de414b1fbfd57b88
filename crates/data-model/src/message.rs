// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

/// A message posted to a group.
///
/// Messages are created on send and are immutable afterwards; the retention
/// sweeper deletes them once `created_at` is strictly older than the
/// configured window. The `body` is `None` for file-only posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMessage {
    pub id: Ulid,
    pub group_id: Ulid,

    /// Subject identifier of the author, as issued by the hosted auth
    /// platform. There is no local users table to reference.
    pub author: String,

    pub body: Option<String>,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// A file attached to a [`GroupMessage`].
///
/// The attachment row is owned by the message and goes away with it through
/// the database cascade. The blob it points to lives in the object store
/// under `storage_key` and has its own lifecycle: the sweeper must delete it
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub id: Ulid,

    /// Opaque key of the blob in the object store
    pub storage_key: String,

    /// Size of the blob in bytes, as declared at upload time
    pub size: u64,

    /// MIME type, as declared at upload time
    pub mime_type: String,

    pub created_at: DateTime<Utc>,
}

/// Projection of a message past the retention cutoff, as selected by the
/// sweeper. Only carries what the sweeper needs to delete the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredMessage {
    pub id: Ulid,
    pub attachment: Option<ExpiredAttachment>,
}

/// The attachment half of an [`ExpiredMessage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredAttachment {
    pub id: Ulid,
    pub storage_key: String,
}
