// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! An in-memory storage backend, so the sweeper can be tested without a
//! database

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use campushare_data_model::{
    Attachment, CleanupRun, Clock, ExpiredAttachment, ExpiredMessage, Group, GroupMessage,
};
use campushare_storage::{
    BoxRepository, CleanupRunRepository, GroupMessageRepository, GroupRepository, Repository,
    RepositoryAccess, RepositoryError, RepositoryFactory, RepositoryTransaction,
};
use chrono::{DateTime, Utc};
use futures_util::{FutureExt, future::BoxFuture};
use rand_core::RngCore;
use ulid::Ulid;

#[derive(Default)]
struct Inner {
    groups: Vec<Group>,
    messages: Vec<GroupMessage>,
    runs: Vec<CleanupRun>,
}

/// Shared in-memory storage; clones see the same data
#[derive(Default, Clone)]
pub(crate) struct InMemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn message_count(&self) -> usize {
        self.locked().messages.len()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl RepositoryFactory for InMemoryStorage {
    async fn create(&self) -> Result<BoxRepository, RepositoryError> {
        Ok(Box::new(InMemoryRepository {
            storage: self.clone(),
        }))
    }
}

struct InMemoryRepository {
    storage: InMemoryStorage,
}

impl Repository<RepositoryError> for InMemoryRepository {}

impl RepositoryAccess for InMemoryRepository {
    type Error = RepositoryError;

    fn group<'c>(&'c mut self) -> Box<dyn GroupRepository<Error = Self::Error> + 'c> {
        Box::new(InMemoryGroupRepository {
            storage: self.storage.clone(),
        })
    }

    fn group_message<'c>(
        &'c mut self,
    ) -> Box<dyn GroupMessageRepository<Error = Self::Error> + 'c> {
        Box::new(InMemoryGroupMessageRepository {
            storage: self.storage.clone(),
        })
    }

    fn cleanup_run<'c>(&'c mut self) -> Box<dyn CleanupRunRepository<Error = Self::Error> + 'c> {
        Box::new(InMemoryCleanupRunRepository {
            storage: self.storage.clone(),
        })
    }
}

// Writes are applied immediately, transactions are a no-op
impl RepositoryTransaction for InMemoryRepository {
    type Error = RepositoryError;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        async { Ok(()) }.boxed()
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        async { Ok(()) }.boxed()
    }
}

fn new_ulid(rng: &mut (dyn RngCore + Send), at: DateTime<Utc>) -> Ulid {
    Ulid::from_datetime_with_source(at.into(), rng)
}

struct InMemoryGroupRepository {
    storage: InMemoryStorage,
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    type Error = RepositoryError;

    async fn lookup(&mut self, id: Ulid) -> Result<Option<Group>, Self::Error> {
        Ok(self
            .storage
            .locked()
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned())
    }

    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        name: String,
    ) -> Result<Group, Self::Error> {
        let created_at = clock.now();
        let group = Group {
            id: new_ulid(rng, created_at),
            name,
            created_at,
        };
        self.storage.locked().groups.push(group.clone());
        Ok(group)
    }
}

struct InMemoryGroupMessageRepository {
    storage: InMemoryStorage,
}

#[async_trait]
impl GroupMessageRepository for InMemoryGroupMessageRepository {
    type Error = RepositoryError;

    async fn lookup(&mut self, id: Ulid) -> Result<Option<GroupMessage>, Self::Error> {
        Ok(self
            .storage
            .locked()
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        group: &Group,
        author: String,
        body: Option<String>,
    ) -> Result<GroupMessage, Self::Error> {
        let created_at = clock.now();
        let message = GroupMessage {
            id: new_ulid(rng, created_at),
            group_id: group.id,
            author,
            body,
            attachment: None,
            created_at,
        };
        self.storage.locked().messages.push(message.clone());
        Ok(message)
    }

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
        let attachment = Attachment {
            id: new_ulid(rng, created_at),
            storage_key,
            size,
            mime_type,
            created_at,
        };

        let mut inner = self.storage.locked();
        if let Some(stored) = inner.messages.iter_mut().find(|m| m.id == message.id) {
            stored.attachment = Some(attachment.clone());
        }

        Ok(attachment)
    }

    async fn list_expired(
        &mut self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ExpiredMessage>, Self::Error> {
        let inner = self.storage.locked();
        let mut expired: Vec<&GroupMessage> = inner
            .messages
            .iter()
            .filter(|m| m.created_at < cutoff)
            .collect();
        expired.sort_by_key(|m| (m.created_at, m.id));
        expired.truncate(limit);

        Ok(expired
            .into_iter()
            .map(|m| ExpiredMessage {
                id: m.id,
                attachment: m.attachment.as_ref().map(|a| ExpiredAttachment {
                    id: a.id,
                    storage_key: a.storage_key.clone(),
                }),
            })
            .collect())
    }

    async fn delete_batch(&mut self, ids: Vec<Ulid>) -> Result<u64, Self::Error> {
        let ids: HashSet<Ulid> = ids.into_iter().collect();
        let mut inner = self.storage.locked();
        let before = inner.messages.len();
        inner.messages.retain(|m| !ids.contains(&m.id));
        Ok((before - inner.messages.len()) as u64)
    }
}

struct InMemoryCleanupRunRepository {
    storage: InMemoryStorage,
}

#[async_trait]
impl CleanupRunRepository for InMemoryCleanupRunRepository {
    type Error = RepositoryError;

    async fn add(
        &mut self,
        rng: &mut (dyn RngCore + Send),
        clock: &dyn Clock,
        messages_deleted: u64,
        attachments_deleted: u64,
        error: Option<String>,
    ) -> Result<CleanupRun, Self::Error> {
        let run_at = clock.now();
        let run = CleanupRun {
            id: new_ulid(rng, run_at),
            run_at,
            messages_deleted,
            attachments_deleted,
            error,
        };
        self.storage.locked().runs.push(run.clone());
        Ok(run)
    }

    async fn list_recent(&mut self, count: usize) -> Result<Vec<CleanupRun>, Self::Error> {
        Ok(self
            .storage
            .locked()
            .runs
            .iter()
            .rev()
            .take(count)
            .cloned()
            .collect())
    }
}
