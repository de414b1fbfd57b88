// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The PostgreSQL implementation of the group message repository.

use async_trait::async_trait;
use campushare_data_model::{
    Attachment, Clock, ExpiredAttachment, ExpiredMessage, Group, GroupMessage,
};
use campushare_storage::message::GroupMessageRepository;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::PgConnection;
use ulid::Ulid;
use uuid::Uuid;

use crate::{DatabaseError, ExecuteExt};

/// An implementation of [`GroupMessageRepository`] for a PostgreSQL
/// connection.
pub struct PgGroupMessageRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgGroupMessageRepository<'c> {
    /// Create a new [`PgGroupMessageRepository`] from an active PostgreSQL
    /// connection.
    #[must_use]
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct GroupMessageLookup {
    group_message_id: Uuid,
    group_id: Uuid,
    author: String,
    body: Option<String>,
    created_at: DateTime<Utc>,
    message_attachment_id: Option<Uuid>,
    storage_key: Option<String>,
    size: Option<i64>,
    mime_type: Option<String>,
    attachment_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<GroupMessageLookup> for GroupMessage {
    type Error = DatabaseError;

    fn try_from(value: GroupMessageLookup) -> Result<Self, Self::Error> {
        let attachment = match (
            value.message_attachment_id,
            value.storage_key,
            value.size,
            value.mime_type,
            value.attachment_created_at,
        ) {
            (Some(id), Some(storage_key), Some(size), Some(mime_type), Some(created_at)) => {
                Some(Attachment {
                    id: id.into(),
                    storage_key,
                    size: u64::try_from(size).map_err(DatabaseError::to_invalid_operation)?,
                    mime_type,
                    created_at,
                })
            }
            (None, None, None, None, None) => None,
            _ => return Err(DatabaseError::inconsistency("message_attachments")),
        };

        Ok(GroupMessage {
            id: value.group_message_id.into(),
            group_id: value.group_id.into(),
            author: value.author,
            body: value.body,
            attachment,
            created_at: value.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExpiredMessageLookup {
    group_message_id: Uuid,
    message_attachment_id: Option<Uuid>,
    storage_key: Option<String>,
}

impl TryFrom<ExpiredMessageLookup> for ExpiredMessage {
    type Error = DatabaseError;

    fn try_from(value: ExpiredMessageLookup) -> Result<Self, Self::Error> {
        let attachment = match (value.message_attachment_id, value.storage_key) {
            (Some(id), Some(storage_key)) => Some(ExpiredAttachment {
                id: id.into(),
                storage_key,
            }),
            (None, None) => None,
            _ => return Err(DatabaseError::inconsistency("message_attachments")),
        };

        Ok(ExpiredMessage {
            id: value.group_message_id.into(),
            attachment,
        })
    }
}

#[async_trait]
impl GroupMessageRepository for PgGroupMessageRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.group_message.lookup",
        skip_all,
        fields(
            db.query.text,
            group_message.id = %id,
        ),
        err,
    )]
    async fn lookup(&mut self, id: Ulid) -> Result<Option<GroupMessage>, Self::Error> {
        let res = sqlx::query_as::<_, GroupMessageLookup>(
            r"
            SELECT m.group_message_id, m.group_id, m.author, m.body, m.created_at,
                   a.message_attachment_id, a.storage_key, a.size, a.mime_type,
                   a.created_at AS attachment_created_at
            FROM group_messages m
            LEFT JOIN message_attachments a USING (group_message_id)
            WHERE m.group_message_id = $1
            ",
        )
        .bind(Uuid::from(id))
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(row) = res else {
            return Ok(None);
        };

        Ok(Some(row.try_into()?))
    }

    #[tracing::instrument(
        name = "db.group_message.add",
        skip_all,
        fields(
            db.query.text,
            group.id = %group.id,
        ),
        err,
    )]
    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        group: &Group,
        author: String,
        body: Option<String>,
    ) -> Result<GroupMessage, Self::Error> {
        let created_at = clock.now();
        let id = Ulid::from_datetime_with_source(created_at.into(), rng);

        let res = sqlx::query(
            r"
            INSERT INTO group_messages (group_message_id, group_id, author, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::from(id))
        .bind(Uuid::from(group.id))
        .bind(&author)
        .bind(&body)
        .bind(created_at)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        Ok(GroupMessage {
            id,
            group_id: group.id,
            author,
            body,
            attachment: None,
            created_at,
        })
    }

    #[tracing::instrument(
        name = "db.group_message.attach",
        skip_all,
        fields(
            db.query.text,
            group_message.id = %message.id,
        ),
        err,
    )]
    async fn attach(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        message: &GroupMessage,
        storage_key: String,
        size: u64,
        mime_type: String,
    ) -> Result<Attachment, Self::Error> {
        let created_at = clock.now();
        let id = Ulid::from_datetime_with_source(created_at.into(), rng);
        let size_i64 = i64::try_from(size).map_err(DatabaseError::to_invalid_operation)?;

        let res = sqlx::query(
            r"
            INSERT INTO message_attachments
                (message_attachment_id, group_message_id, storage_key, size, mime_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(Uuid::from(id))
        .bind(Uuid::from(message.id))
        .bind(&storage_key)
        .bind(size_i64)
        .bind(&mime_type)
        .bind(created_at)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        DatabaseError::ensure_affected_rows(&res, 1)?;

        Ok(Attachment {
            id,
            storage_key,
            size,
            mime_type,
            created_at,
        })
    }

    #[tracing::instrument(
        name = "db.group_message.list_expired",
        skip_all,
        fields(
            db.query.text,
            %cutoff,
        ),
        err,
    )]
    async fn list_expired(
        &mut self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExpiredMessage>, Self::Error> {
        let limit = i64::try_from(limit).map_err(DatabaseError::to_invalid_operation)?;

        // Strictly older than the cutoff: a message exactly at the boundary
        // is kept
        let rows = sqlx::query_as::<_, ExpiredMessageLookup>(
            r"
            SELECT m.group_message_id, a.message_attachment_id, a.storage_key
            FROM group_messages m
            LEFT JOIN message_attachments a USING (group_message_id)
            WHERE m.created_at < $1
            ORDER BY m.created_at ASC, m.group_message_id ASC
            LIMIT $2
            ",
        )
        .bind(cutoff)
        .bind(limit)
        .traced()
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[tracing::instrument(
        name = "db.group_message.delete_batch",
        skip_all,
        fields(
            db.query.text,
            count = ids.len(),
        ),
        err,
    )]
    async fn delete_batch(&mut self, ids: Vec<Ulid>) -> Result<u64, Self::Error> {
        let ids: Vec<Uuid> = ids.into_iter().map(Uuid::from).collect();

        // Attachment rows go away through the ON DELETE CASCADE. IDs which
        // don't resolve anymore are silently skipped, making this idempotent.
        let res = sqlx::query(
            r"
            DELETE FROM group_messages
            WHERE group_message_id = ANY($1)
            ",
        )
        .bind(&ids)
        .traced()
        .execute(&mut *self.conn)
        .await?;

        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use campushare_data_model::{Clock, MockClock};
    use campushare_storage::{group::GroupRepository, message::GroupMessageRepository};
    use chrono::Duration;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;
    use sqlx::PgPool;

    use crate::{group::PgGroupRepository, message::PgGroupMessageRepository};

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_message_lifecycle(pool: PgPool) {
        let mut rng = ChaChaRng::seed_from_u64(42);
        let clock = MockClock::default();
        let mut conn = pool.acquire().await.unwrap();

        let group = PgGroupRepository::new(&mut conn)
            .add(&mut rng, &clock, "networks-202".to_owned())
            .await
            .unwrap();

        let mut repo = PgGroupMessageRepository::new(&mut conn);

        let message = repo
            .add(
                &mut rng,
                &clock,
                &group,
                "student-1".to_owned(),
                Some("here are the notes".to_owned()),
            )
            .await
            .unwrap();

        let attachment = repo
            .attach(
                &mut rng,
                &clock,
                &message,
                "group-files/notes.pdf".to_owned(),
                1024,
                "application/pdf".to_owned(),
            )
            .await
            .unwrap();

        let fetched = repo.lookup(message.id).await.unwrap().unwrap();
        assert_eq!(fetched.body.as_deref(), Some("here are the notes"));
        assert_eq!(fetched.attachment, Some(attachment));

        // A message without an attachment also looks up fine
        let bare = repo
            .add(&mut rng, &clock, &group, "student-2".to_owned(), None)
            .await
            .unwrap();
        let fetched = repo.lookup(bare.id).await.unwrap().unwrap();
        assert_eq!(fetched.attachment, None);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_list_expired_and_delete(pool: PgPool) {
        let mut rng = ChaChaRng::seed_from_u64(42);
        let clock = MockClock::default();
        let mut conn = pool.acquire().await.unwrap();

        let group = PgGroupRepository::new(&mut conn)
            .add(&mut rng, &clock, "databases-303".to_owned())
            .await
            .unwrap();

        let mut repo = PgGroupMessageRepository::new(&mut conn);

        // One old message with an attachment, one old without, one recent
        let old_with_file = repo
            .add(&mut rng, &clock, &group, "student-1".to_owned(), None)
            .await
            .unwrap();
        repo.attach(
            &mut rng,
            &clock,
            &old_with_file,
            "group-files/old.pdf".to_owned(),
            512,
            "application/pdf".to_owned(),
        )
        .await
        .unwrap();
        clock.advance(Duration::seconds(1));
        let old_bare = repo
            .add(
                &mut rng,
                &clock,
                &group,
                "student-2".to_owned(),
                Some("old".to_owned()),
            )
            .await
            .unwrap();

        clock.advance(Duration::days(20));
        let recent = repo
            .add(
                &mut rng,
                &clock,
                &group,
                "student-3".to_owned(),
                Some("recent".to_owned()),
            )
            .await
            .unwrap();

        let cutoff = clock.now() - Duration::days(14);
        let expired = repo.list_expired(cutoff, 100).await.unwrap();
        let ids: Vec<_> = expired.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![old_with_file.id, old_bare.id]);
        assert_eq!(
            expired[0].attachment.as_ref().map(|a| &*a.storage_key),
            Some("group-files/old.pdf")
        );
        assert_eq!(expired[1].attachment, None);

        // A message created exactly at the cutoff is kept
        let boundary = repo.list_expired(old_with_file.created_at, 100).await.unwrap();
        assert_eq!(boundary, vec![]);

        let deleted = repo.delete_batch(ids.clone()).await.unwrap();
        assert_eq!(deleted, 2);

        // Deleting again is a no-op
        let deleted = repo.delete_batch(ids).await.unwrap();
        assert_eq!(deleted, 0);

        // The recent message is untouched
        assert!(repo.lookup(recent.id).await.unwrap().is_some());

        // The cascade removed the attachment row
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_attachments")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
