// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Cron-driven scheduling of jobs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{RetentionPolicy, State, cleanup::run_cleanup};

/// Grace period on top of the soft run deadline before the scheduler kills
/// the job outright
const HARD_TIMEOUT_GRACE: Duration = Duration::from_secs(60);

/// Context passed to a job when it runs
pub struct JobContext {
    /// Cancelled when the job should wind down
    pub cancellation_token: CancellationToken,
}

/// Error returned by a [`RunnableJob`]
#[derive(Debug, thiserror::Error)]
#[error("job failed to run")]
pub struct JobError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl JobError {
    /// Construct a [`JobError`] out of any error
    pub fn from_error<E>(value: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(value),
        }
    }
}

/// A job the [`Scheduler`] can run
#[async_trait]
pub trait RunnableJob: Send + Sync {
    /// Run the job once
    ///
    /// # Errors
    ///
    /// Returns a [`JobError`] if the job failed. Failures are logged and the
    /// job runs again at its next scheduled occurrence.
    async fn run(&self, state: &State, context: JobContext) -> Result<(), JobError>;

    /// A hard timeout after which the scheduler aborts the run
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// The scheduled job driving [`run_cleanup`]
pub struct CleanupExpiredMessagesJob {
    hard_timeout: Duration,
}

impl CleanupExpiredMessagesJob {
    /// Create the job, deriving its hard timeout from the policy's soft run
    /// deadline
    #[must_use]
    pub fn new(policy: &RetentionPolicy) -> Self {
        Self {
            hard_timeout: policy.timeout().saturating_add(HARD_TIMEOUT_GRACE),
        }
    }
}

#[async_trait]
impl RunnableJob for CleanupExpiredMessagesJob {
    async fn run(&self, state: &State, context: JobContext) -> Result<(), JobError> {
        run_cleanup(state, &context.cancellation_token)
            .await
            .map_err(JobError::from_error)?;

        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.hard_timeout)
    }
}

struct ScheduleEntry {
    name: &'static str,
    schedule: cron::Schedule,
    job: Box<dyn RunnableJob>,
}

/// Runs registered jobs on their cron schedule, until cancelled
pub struct Scheduler {
    state: State,
    cancellation_token: CancellationToken,
    schedules: Vec<ScheduleEntry>,
}

impl Scheduler {
    /// Create a new [`Scheduler`] with no registered schedule
    #[must_use]
    pub fn new(state: State, cancellation_token: CancellationToken) -> Self {
        Self {
            state,
            cancellation_token,
            schedules: Vec::new(),
        }
    }

    /// Register a job to run on the given schedule
    #[must_use]
    pub fn add_schedule(
        mut self,
        name: &'static str,
        schedule: cron::Schedule,
        job: impl RunnableJob + 'static,
    ) -> Self {
        self.schedules.push(ScheduleEntry {
            name,
            schedule,
            job: Box::new(job),
        });
        self
    }

    /// Run the scheduler until the cancellation token fires
    pub async fn run(self) {
        if self.schedules.is_empty() {
            warn!("no schedules registered, nothing to run");
            return;
        }

        info!(schedules = self.schedules.len(), "scheduler started");

        loop {
            let now = self.state.clock().now();
            let Some((index, at)) = self.next_occurrence(now) else {
                warn!("no future occurrence for any schedule, stopping");
                return;
            };

            let entry = &self.schedules[index];
            debug!(
                job.name = entry.name,
                job.scheduled_at = %at,
                "waiting for next scheduled run"
            );

            let sleep = (at - now).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                () = self.cancellation_token.cancelled() => {
                    info!("scheduler shutting down");
                    return;
                }
                () = tokio::time::sleep(sleep) => {}
            }

            self.run_entry(entry).await;
        }
    }

    /// The next entry due to run, as an index into the schedule list and the
    /// time it is due
    fn next_occurrence(&self, now: DateTime<Utc>) -> Option<(usize, DateTime<Utc>)> {
        self.schedules
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let at = entry.schedule.after(&now).next()?;
                Some((index, at))
            })
            .min_by_key(|&(_, at)| at)
    }

    async fn run_entry(&self, entry: &ScheduleEntry) {
        let context = JobContext {
            cancellation_token: self.cancellation_token.child_token(),
        };

        let fut = entry.job.run(&self.state, context);
        let result = if let Some(timeout) = entry.job.timeout() {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => {
                    error!(job.name = entry.name, "job exceeded its hard timeout");
                    return;
                }
            }
        } else {
            fut.await
        };

        if let Err(e) = result {
            error!(
                error = &e as &dyn std::error::Error,
                job.name = entry.name,
                "scheduled job failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_next_occurrence_is_in_the_future() {
        // Daily at 04:00 UTC
        let schedule = cron::Schedule::from_str("0 0 4 * * *").unwrap();
        let now = Utc::now();
        let next = schedule.after(&now).next().unwrap();
        assert!(next > now);
        assert!(next - now <= chrono::Duration::days(1));
    }

    #[test]
    fn test_hard_timeout_covers_the_soft_deadline() {
        let policy = RetentionPolicy::default();
        let job = CleanupExpiredMessagesJob::new(&policy);
        assert!(job.timeout().unwrap() > policy.timeout());
    }
}
