// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The PostgreSQL implementation of the group repository.

use async_trait::async_trait;
use campushare_data_model::{Clock, Group};
use campushare_storage::group::GroupRepository;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::PgConnection;
use ulid::Ulid;
use uuid::Uuid;

use crate::{DatabaseError, ExecuteExt};

/// An implementation of [`GroupRepository`] for a PostgreSQL connection.
pub struct PgGroupRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgGroupRepository<'c> {
    /// Create a new [`PgGroupRepository`] from an active PostgreSQL
    /// connection.
    #[must_use]
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct GroupLookup {
    group_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<GroupLookup> for Group {
    fn from(value: GroupLookup) -> Self {
        Group {
            id: value.group_id.into(),
            name: value.name,
            created_at: value.created_at,
        }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.group.lookup",
        skip_all,
        fields(
            db.query.text,
            group.id = %id,
        ),
        err,
    )]
    async fn lookup(&mut self, id: Ulid) -> Result<Option<Group>, Self::Error> {
        let res = sqlx::query_as::<_, GroupLookup>(
            r"
            SELECT group_id, name, created_at
            FROM groups
            WHERE group_id = $1
            ",
        )
        .bind(Uuid::from(id))
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(res.map(Into::into))
    }

    #[tracing::instrument(
        name = "db.group.add",
        skip_all,
        fields(
            db.query.text,
            group.name = name,
        ),
        err,
    )]
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        name: String,
    ) -> Result<Group, Self::Error> {
        let created_at = clock.now();
        let id = Ulid::from_datetime_with_source(created_at.into(), rng);

        let res = sqlx::query(
            r"
            INSERT INTO groups (group_id, name, created_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(Uuid::from(id))
        .bind(&name)
        .bind(created_at)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        Ok(Group {
            id,
            name,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use campushare_data_model::{Clock, MockClock};
    use campushare_storage::group::GroupRepository;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;
    use sqlx::PgPool;

    use crate::group::PgGroupRepository;

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_group_repo(pool: PgPool) {
        let mut rng = ChaChaRng::seed_from_u64(42);
        let clock = MockClock::default();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = PgGroupRepository::new(&mut conn);

        let group = repo
            .add(&mut rng, &clock, "algorithms-101".to_owned())
            .await
            .unwrap();
        assert_eq!(group.name, "algorithms-101");
        assert_eq!(group.created_at, clock.now());

        let fetched = repo.lookup(group.id).await.unwrap();
        assert_eq!(fetched, Some(group));

        let missing = repo.lookup(ulid::Ulid::nil()).await.unwrap();
        assert_eq!(missing, None);
    }
}
