// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The PostgreSQL implementation of the cleanup run log repository.

use async_trait::async_trait;
use campushare_data_model::{CleanupRun, Clock};
use campushare_storage::cleanup_run::CleanupRunRepository;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::PgConnection;
use ulid::Ulid;
use uuid::Uuid;

use crate::{DatabaseError, ExecuteExt};

/// An implementation of [`CleanupRunRepository`] for a PostgreSQL
/// connection.
pub struct PgCleanupRunRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgCleanupRunRepository<'c> {
    /// Create a new [`PgCleanupRunRepository`] from an active PostgreSQL
    /// connection.
    #[must_use]
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct CleanupRunLookup {
    cleanup_run_id: Uuid,
    run_at: DateTime<Utc>,
    messages_deleted: i64,
    attachments_deleted: i64,
    error: Option<String>,
}

impl TryFrom<CleanupRunLookup> for CleanupRun {
    type Error = DatabaseError;

    fn try_from(value: CleanupRunLookup) -> Result<Self, Self::Error> {
        Ok(CleanupRun {
            id: value.cleanup_run_id.into(),
            run_at: value.run_at,
            messages_deleted: u64::try_from(value.messages_deleted)
                .map_err(DatabaseError::to_invalid_operation)?,
            attachments_deleted: u64::try_from(value.attachments_deleted)
                .map_err(DatabaseError::to_invalid_operation)?,
            error: value.error,
        })
    }
}

#[async_trait]
impl CleanupRunRepository for PgCleanupRunRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.cleanup_run.add",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        messages_deleted: u64,
        attachments_deleted: u64,
        error: Option<String>,
    ) -> Result<CleanupRun, Self::Error> {
        let run_at = clock.now();
        let id = Ulid::from_datetime_with_source(run_at.into(), rng);

        let res = sqlx::query(
            r"
            INSERT INTO cleanup_runs
                (cleanup_run_id, run_at, messages_deleted, attachments_deleted, error)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::from(id))
        .bind(run_at)
        .bind(i64::try_from(messages_deleted).map_err(DatabaseError::to_invalid_operation)?)
        .bind(i64::try_from(attachments_deleted).map_err(DatabaseError::to_invalid_operation)?)
        .bind(&error)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        Ok(CleanupRun {
            id,
            run_at,
            messages_deleted,
            attachments_deleted,
            error,
        })
    }

    #[tracing::instrument(
        name = "db.cleanup_run.list_recent",
        skip_all,
        fields(
            db.query.text,
            count,
        ),
        err,
    )]
    async fn list_recent(&mut self, count: usize) -> Result<Vec<CleanupRun>, Self::Error> {
        let count = i64::try_from(count).map_err(DatabaseError::to_invalid_operation)?;

        let rows = sqlx::query_as::<_, CleanupRunLookup>(
            r"
            SELECT cleanup_run_id, run_at, messages_deleted, attachments_deleted, error
            FROM cleanup_runs
            ORDER BY run_at DESC, cleanup_run_id DESC
            LIMIT $1
            ",
        )
        .bind(count)
        .traced()
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
