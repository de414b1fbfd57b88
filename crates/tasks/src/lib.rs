// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The retention sweeper and its scheduler
//!
//! The central entry point is [`run_cleanup`], which deletes group messages
//! older than the configured retention window, along with their attachment
//! blobs, and appends a [`CleanupRun`] to the run log. The [`Scheduler`]
//! drives it from a cron schedule; the CLI invokes the same entry point for
//! one-shot runs.
//!
//! [`CleanupRun`]: campushare_data_model::CleanupRun

#![deny(clippy::future_not_send, missing_docs)]

use std::sync::Arc;

use campushare_data_model::Clock;
use campushare_object_store::ObjectStore;
use campushare_storage::{BoxRepository, RepositoryError, RepositoryFactory};
use rand::SeedableRng;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

mod cleanup;
#[cfg(test)]
mod mock;
mod policy;
mod schedule;

pub use self::{
    cleanup::{BATCH_SIZE, CleanupSummary, run_cleanup},
    policy::{ConfigurationError, RetentionPolicy},
    schedule::{CleanupExpiredMessagesJob, JobContext, JobError, RunnableJob, Scheduler},
};

/// Dependencies shared by every job run: storage, object store, clock and
/// the retention policy
#[derive(Clone)]
pub struct State {
    repository_factory: Arc<dyn RepositoryFactory>,
    clock: Arc<dyn Clock>,
    object_store: Arc<dyn ObjectStore>,
    policy: RetentionPolicy,
}

impl State {
    /// Create a new [`State`] out of its parts
    pub fn new(
        repository_factory: impl RepositoryFactory + 'static,
        clock: impl Clock + 'static,
        object_store: impl ObjectStore + 'static,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            repository_factory: Arc::new(repository_factory),
            clock: Arc::new(clock),
            object_store: Arc::new(object_store),
            policy,
        }
    }

    /// The clock used to compute cutoffs and timestamps
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        &self.clock
    }

    /// The object store holding attachment blobs
    #[must_use]
    pub fn object_store(&self) -> &dyn ObjectStore {
        self.object_store.as_ref()
    }

    /// The retention policy applied by the sweeper
    #[must_use]
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    // This is fine for now, we may move that to a trait at some point.
    #[allow(clippy::unused_self, clippy::disallowed_methods)]
    #[must_use]
    /// Get a fresh random number generator
    pub fn rng(&self) -> rand_chacha::ChaChaRng {
        rand_chacha::ChaChaRng::from_rng(rand::thread_rng()).expect("failed to seed rng")
    }

    /// Spawn a new repository from the underlying factory
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if a connection could not be acquired
    pub async fn repository(&self) -> Result<BoxRepository, RepositoryError> {
        self.repository_factory.create().await
    }
}

/// Initialise the scheduler, without running it.
///
/// This is mostly useful for tests.
#[must_use]
pub fn init(
    state: State,
    schedule: cron::Schedule,
    cancellation_token: CancellationToken,
) -> Scheduler {
    let job = CleanupExpiredMessagesJob::new(state.policy());

    Scheduler::new(state, cancellation_token).add_schedule(
        "cleanup-expired-messages",
        schedule,
        job,
    )
}

/// Initialise the scheduler and run it on the given task tracker
pub fn init_and_run(
    state: State,
    schedule: cron::Schedule,
    cancellation_token: CancellationToken,
    task_tracker: &TaskTracker,
) {
    let scheduler = init(state, schedule, cancellation_token);
    task_tracker.spawn(scheduler.run());
}
