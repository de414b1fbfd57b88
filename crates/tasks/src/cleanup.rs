// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The retention sweeper: deletes expired group messages and their
//! attachment blobs in batches

use std::{collections::HashSet, time::Instant};

use campushare_object_store::{DeleteOutcome, ObjectStore, ObjectStoreError};
use campushare_storage::{CleanupRunRepository, GroupMessageRepository, RepositoryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::State;

/// How many expired messages are loaded and deleted at once
pub const BATCH_SIZE: usize = 1000;

/// The outcome of a single sweeper run, as returned to the caller and
/// recorded in the run log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    /// How many message rows the run deleted
    pub messages_deleted: u64,

    /// How many attachment blobs the run deleted from the object store
    pub attachments_deleted: u64,

    /// A description of the failures, if the run did not complete cleanly
    pub error: Option<String>,
}

#[derive(Default)]
struct SweepOutcome {
    messages_deleted: u64,
    attachments_deleted: u64,
    errors: Vec<String>,
}

/// Run the retention sweeper once.
///
/// Validates the retention policy, then deletes messages created strictly
/// before `now - window`, in batches. The cutoff is computed once at the
/// start of the run, so messages posted while the run is in progress are
/// never candidates. Each expired message is an independent unit of work:
/// its blob (if any) is deleted first, and only messages whose blob is gone
/// have their row deleted, so a blob failure keeps the row around for a
/// later run. Exactly one [`CleanupRun`] is appended per invocation.
///
/// [`CleanupRun`]: campushare_data_model::CleanupRun
///
/// # Errors
///
/// Per-item failures, configuration errors and timeouts are contained: they
/// are reported through the summary's `error` field and the run log. A
/// [`RepositoryError`] is only returned if the run log itself could not be
/// written.
#[tracing::instrument(name = "job.cleanup_expired_messages", skip_all)]
pub async fn run_cleanup(
    state: &State,
    cancellation_token: &CancellationToken,
) -> Result<CleanupSummary, RepositoryError> {
    let mut outcome = SweepOutcome::default();

    match state.policy().validate() {
        Err(e) => {
            warn!(
                error = &e as &dyn std::error::Error,
                "invalid retention policy, not sweeping"
            );
            outcome.errors.push(e.to_string());
        }

        Ok(()) => {
            if let Err(e) = sweep(state, cancellation_token, &mut outcome).await {
                warn!(
                    error = &e as &dyn std::error::Error,
                    "storage backend failed mid-run"
                );
                outcome.errors.push(format!("storage backend failed: {e}"));
            }
        }
    }

    let error = if outcome.errors.is_empty() {
        None
    } else {
        Some(outcome.errors.join("; "))
    };

    let mut rng = state.rng();
    let mut repo = state.repository().await?;
    repo.cleanup_run()
        .add(
            &mut rng,
            state.clock(),
            outcome.messages_deleted,
            outcome.attachments_deleted,
            error.clone(),
        )
        .await?;
    repo.save().await?;

    if outcome.messages_deleted == 0 && error.is_none() {
        debug!("no expired group messages to clean up");
    } else {
        info!(
            messages = outcome.messages_deleted,
            attachments = outcome.attachments_deleted,
            error,
            "cleaned up expired group messages"
        );
    }

    Ok(CleanupSummary {
        messages_deleted: outcome.messages_deleted,
        attachments_deleted: outcome.attachments_deleted,
        error,
    })
}

async fn sweep(
    state: &State,
    cancellation_token: &CancellationToken,
    outcome: &mut SweepOutcome,
) -> Result<(), RepositoryError> {
    let policy = state.policy();

    // A window so large the cutoff underflows the datetime range means
    // nothing can be expired anyway
    let Some(cutoff) = state.clock().now().checked_sub_signed(policy.window()) else {
        outcome.errors.push(format!(
            "retention window of {} is out of range",
            policy.window()
        ));
        return Ok(());
    };
    let deadline = Instant::now() + policy.timeout();

    // Messages whose blob delete already failed this run. They are kept for
    // a later run, and must not be retried again within this one.
    let mut failed: HashSet<Ulid> = HashSet::new();

    loop {
        if cancellation_token.is_cancelled() {
            outcome
                .errors
                .push("run cancelled before completion".to_owned());
            break;
        }

        // Over-fetch by the number of kept rows, so they don't starve the
        // candidates sorted after them
        let limit = BATCH_SIZE + failed.len();

        let mut repo = state.repository().await?;
        let batch = repo.group_message().list_expired(cutoff, limit).await?;
        let exhausted = batch.len() < limit;

        let mut deadline_exceeded = false;
        let mut deletable = Vec::new();
        for message in batch {
            if failed.contains(&message.id) {
                continue;
            }

            if Instant::now() >= deadline {
                deadline_exceeded = true;
                break;
            }

            if let Some(attachment) = &message.attachment {
                match delete_blob(state.object_store(), &attachment.storage_key).await {
                    Ok(DeleteOutcome::Deleted) => {
                        outcome.attachments_deleted += 1;
                        deletable.push(message.id);
                    }

                    // Already gone, so the row can go too
                    Ok(DeleteOutcome::NotFound) => {
                        debug!(
                            message.id = %message.id,
                            attachment.storage_key = attachment.storage_key,
                            "attachment blob was already gone"
                        );
                        deletable.push(message.id);
                    }

                    Err(e) => {
                        warn!(
                            error = &e as &dyn std::error::Error,
                            message.id = %message.id,
                            attachment.storage_key = attachment.storage_key,
                            "failed to delete attachment blob, keeping the message"
                        );
                        outcome.errors.push(format!(
                            "failed to delete blob {:?} of message {}: {e}",
                            attachment.storage_key, message.id
                        ));
                        failed.insert(message.id);
                    }
                }
            } else {
                deletable.push(message.id);
            }
        }

        // Rows whose blob is gone must be deleted even when stopping early,
        // else a re-uploaded key could resurrect a half-deleted message
        outcome.messages_deleted += repo.group_message().delete_batch(deletable).await?;
        repo.save().await?;

        if deadline_exceeded {
            outcome.errors.push(format!(
                "run exceeded its deadline of {:?}, stopping early",
                policy.timeout()
            ));
            break;
        }

        if exhausted {
            break;
        }
    }

    Ok(())
}

/// Delete a blob, retrying once on a transient store error
async fn delete_blob(
    store: &dyn ObjectStore,
    storage_key: &str,
) -> Result<DeleteOutcome, ObjectStoreError> {
    match store.delete(storage_key).await {
        Err(e) if e.is_transient() => {
            debug!(
                error = &e as &dyn std::error::Error,
                attachment.storage_key = storage_key,
                "transient object store error, retrying once"
            );
            store.delete(storage_key).await
        }
        outcome => outcome,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use bytes::Bytes;
    use campushare_data_model::{Group, GroupMessage, MockClock};
    use campushare_object_store::InMemoryObjectStore;
    use campushare_storage::GroupRepository;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{RetentionPolicy, State, mock::InMemoryStorage};

    struct TestEnv {
        state: State,
        storage: InMemoryStorage,
        object_store: Arc<InMemoryObjectStore>,
        clock: Arc<MockClock>,
    }

    fn env(policy: RetentionPolicy) -> TestEnv {
        let storage = InMemoryStorage::new();
        let object_store = Arc::new(InMemoryObjectStore::new());
        let clock = Arc::new(MockClock::default());
        let state = State::new(
            storage.clone(),
            Arc::clone(&clock),
            Arc::clone(&object_store),
            policy,
        );

        TestEnv {
            state,
            storage,
            object_store,
            clock,
        }
    }

    fn fourteen_days() -> RetentionPolicy {
        RetentionPolicy::new(
            chrono::Duration::days(14),
            RetentionPolicy::DEFAULT_TIMEOUT,
        )
    }

    async fn seed_group(env: &TestEnv) -> Group {
        let mut rng = env.state.rng();
        let mut repo = env.state.repository().await.unwrap();
        let group = repo
            .group()
            .add(&mut rng, env.state.clock(), "CS101 study group".to_owned())
            .await
            .unwrap();
        repo.save().await.unwrap();
        group
    }

    /// Post a message at the clock's current time, optionally with an
    /// attachment whose blob is uploaded to the object store
    async fn seed_message(
        env: &TestEnv,
        group: &Group,
        body: &str,
        attachment: Option<&str>,
    ) -> GroupMessage {
        let mut rng = env.state.rng();
        let mut repo = env.state.repository().await.unwrap();
        let mut message = repo
            .group_message()
            .add(
                &mut rng,
                env.state.clock(),
                group,
                "student-123".to_owned(),
                Some(body.to_owned()),
            )
            .await
            .unwrap();

        if let Some(storage_key) = attachment {
            env.object_store
                .put(storage_key, Bytes::from_static(b"file contents"))
                .await
                .unwrap();
            let attachment = repo
                .group_message()
                .attach(
                    &mut rng,
                    env.state.clock(),
                    &message,
                    storage_key.to_owned(),
                    13,
                    "application/pdf".to_owned(),
                )
                .await
                .unwrap();
            message.attachment = Some(attachment);
        }

        repo.save().await.unwrap();
        message
    }

    async fn run(env: &TestEnv) -> CleanupSummary {
        run_cleanup(&env.state, &CancellationToken::new())
            .await
            .unwrap()
    }

    async fn recent_runs(env: &TestEnv, count: usize) -> Vec<campushare_data_model::CleanupRun> {
        let mut repo = env.state.repository().await.unwrap();
        repo.cleanup_run().list_recent(count).await.unwrap()
    }

    #[tokio::test]
    async fn test_boundary_and_recent_messages() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        // By run time: 20 days old, exactly 14 days old, 13 days old
        seed_message(&env, &group, "old", Some("files/old.pdf")).await;
        env.clock.advance(chrono::Duration::days(6));
        seed_message(&env, &group, "boundary", Some("files/boundary.pdf")).await;
        env.clock.advance(chrono::Duration::days(1));
        seed_message(&env, &group, "recent", None).await;
        env.clock.advance(chrono::Duration::days(13));

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 1);
        assert_eq!(summary.attachments_deleted, 1);
        assert_eq!(summary.error, None);

        // Strictly-older-than: the message exactly at the boundary is kept,
        // along with the recent one
        assert_eq!(env.storage.message_count(), 2);
        assert!(!env.object_store.contains("files/old.pdf"));
        assert!(env.object_store.contains("files/boundary.pdf"));

        let runs = recent_runs(&env, 10).await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].messages_deleted, 1);
        assert_eq!(runs[0].attachments_deleted, 1);
        assert_eq!(runs[0].error, None);
    }

    #[tokio::test]
    async fn test_second_run_deletes_nothing() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        seed_message(&env, &group, "old", Some("files/old.pdf")).await;
        env.clock.advance(chrono::Duration::days(20));

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 1);

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 0);
        assert_eq!(summary.attachments_deleted, 0);
        assert_eq!(summary.error, None);

        // Both runs are in the log, newest first
        let runs = recent_runs(&env, 10).await;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].messages_deleted, 0);
        assert_eq!(runs[1].messages_deleted, 1);
    }

    #[tokio::test]
    async fn test_transient_blob_failure_is_retried_once() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        seed_message(&env, &group, "old", Some("files/flaky.pdf")).await;
        env.clock.advance(chrono::Duration::days(20));

        // The first delete fails, the in-run retry succeeds
        env.object_store.fail_once("files/flaky.pdf");

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 1);
        assert_eq!(summary.attachments_deleted, 1);
        assert_eq!(summary.error, None);
        assert!(!env.object_store.contains("files/flaky.pdf"));
        assert_eq!(env.object_store.delete_attempts("files/flaky.pdf"), 2);
    }

    #[tokio::test]
    async fn test_persistent_blob_failure_keeps_the_message() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        let kept = seed_message(&env, &group, "broken", Some("files/broken.pdf")).await;
        seed_message(&env, &group, "fine", Some("files/fine.pdf")).await;
        env.clock.advance(chrono::Duration::days(20));

        env.object_store.break_key("files/broken.pdf");

        // One message's blob failure does not prevent the other's deletion
        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 1);
        assert_eq!(summary.attachments_deleted, 1);
        assert!(summary.error.is_some());

        // The failing message is kept, so a later run can retry its blob
        assert_eq!(env.storage.message_count(), 1);
        let mut repo = env.state.repository().await.unwrap();
        assert!(repo.group_message().lookup(kept.id).await.unwrap().is_some());
        assert!(env.object_store.contains("files/broken.pdf"));

        // The blob was attempted once, retried once, and not touched again
        assert_eq!(env.object_store.delete_attempts("files/broken.pdf"), 2);

        let runs = recent_runs(&env, 10).await;
        assert!(runs[0].error.as_deref().unwrap().contains("files/broken.pdf"));
    }

    #[tokio::test]
    async fn test_missing_blob_counts_as_success() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        // An attachment row whose blob was never uploaded, or is already gone
        let mut rng = env.state.rng();
        let mut repo = env.state.repository().await.unwrap();
        let message = repo
            .group_message()
            .add(
                &mut rng,
                env.state.clock(),
                &group,
                "student-123".to_owned(),
                None,
            )
            .await
            .unwrap();
        repo.group_message()
            .attach(
                &mut rng,
                env.state.clock(),
                &message,
                "files/ghost.pdf".to_owned(),
                0,
                "application/pdf".to_owned(),
            )
            .await
            .unwrap();
        repo.save().await.unwrap();

        env.clock.advance(chrono::Duration::days(20));

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 1);
        assert_eq!(summary.attachments_deleted, 0);
        assert_eq!(summary.error, None);
        assert_eq!(env.storage.message_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_window_aborts_before_deleting() {
        let env = env(RetentionPolicy::new(
            chrono::Duration::zero(),
            RetentionPolicy::DEFAULT_TIMEOUT,
        ));
        let group = seed_group(&env).await;

        seed_message(&env, &group, "would be eligible", None).await;
        env.clock.advance(chrono::Duration::days(20));

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 0);
        assert_eq!(summary.attachments_deleted, 0);
        assert!(summary.error.as_deref().unwrap().contains("retention window"));

        // Nothing was touched, but the failed run is in the log
        assert_eq!(env.storage.message_count(), 1);
        let runs = recent_runs(&env, 10).await;
        assert_eq!(runs.len(), 1);
        assert!(runs[0].error.is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_window_is_recorded() {
        // Representable as a duration, but `now - window` underflows the
        // datetime range
        let env = env(RetentionPolicy::new(
            chrono::Duration::days(200_000_000),
            RetentionPolicy::DEFAULT_TIMEOUT,
        ));
        let group = seed_group(&env).await;

        seed_message(&env, &group, "kept", None).await;
        env.clock.advance(chrono::Duration::days(20));

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 0);
        assert!(summary.error.as_deref().unwrap().contains("out of range"));
        assert_eq!(env.storage.message_count(), 1);

        let runs = recent_runs(&env, 10).await;
        assert_eq!(runs.len(), 1);
        assert!(runs[0].error.is_some());
    }

    #[tokio::test]
    async fn test_deadline_stops_the_run() {
        let env = env(RetentionPolicy::new(
            chrono::Duration::days(14),
            Duration::ZERO,
        ));
        let group = seed_group(&env).await;

        seed_message(&env, &group, "old", None).await;
        env.clock.advance(chrono::Duration::days(20));

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 0);
        assert!(summary.error.as_deref().unwrap().contains("deadline"));
        assert_eq!(env.storage.message_count(), 1);

        let runs = recent_runs(&env, 10).await;
        assert_eq!(runs.len(), 1);
        assert!(runs[0].error.is_some());
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_run() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        seed_message(&env, &group, "old", None).await;
        env.clock.advance(chrono::Duration::days(20));

        let token = CancellationToken::new();
        token.cancel();

        let summary = run_cleanup(&env.state, &token).await.unwrap();
        assert_eq!(summary.messages_deleted, 0);
        assert!(summary.error.as_deref().unwrap().contains("cancelled"));
        assert_eq!(env.storage.message_count(), 1);
    }

    #[tokio::test]
    async fn test_messages_posted_after_cutoff_are_kept() {
        let env = env(fourteen_days());
        let group = seed_group(&env).await;

        seed_message(&env, &group, "old", None).await;
        env.clock.advance(chrono::Duration::days(20));
        seed_message(&env, &group, "fresh", None).await;

        let summary = run(&env).await;
        assert_eq!(summary.messages_deleted, 1);
        assert_eq!(env.storage.message_count(), 1);
    }
}
