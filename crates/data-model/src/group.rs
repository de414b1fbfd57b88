// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

/// A study group. Messages belong to exactly one group.
///
/// Membership, roles and the interactive surfaces over groups are owned by
/// the application layer; the retention service only needs the group as the
/// owner of its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: Ulid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
