// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

/// The recorded outcome of one retention sweeper execution.
///
/// Append-only: the service itself never mutates or deletes these rows, so
/// operators can query the last N runs to monitor the job. A run that
/// completed with partial failure has its counts set to whatever was
/// actually removed and a non-null `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupRun {
    pub id: Ulid,
    pub run_at: DateTime<Utc>,
    pub messages_deleted: u64,
    pub attachments_deleted: u64,
    pub error: Option<String>,
}
