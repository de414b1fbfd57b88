// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::time::Duration;

use tokio::signal::unix::{Signal, SignalKind};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Listens for SIGTERM and SIGINT and coordinates shutting down the worker.
///
/// The first signal cancels the shutdown token. The scheduler reacts by not
/// starting new runs, and an in-flight sweep winds down at its next
/// cancellation check, after having flushed what it already deleted. The
/// manager then waits for tracked tasks to drain; a second signal or the
/// drain timeout gives up on the wait.
pub struct ShutdownManager {
    token: CancellationToken,
    task_tracker: TaskTracker,
    sigterm: Signal,
    sigint: Signal,
    drain_timeout: Duration,
}

impl ShutdownManager {
    /// Create a new shutdown manager, installing the signal handlers
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handlers could not be installed
    pub fn new() -> Result<Self, std::io::Error> {
        let token = CancellationToken::new();
        let sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
        let sigint = tokio::signal::unix::signal(SignalKind::interrupt())?;
        let task_tracker = TaskTracker::new();

        Ok(Self {
            token,
            task_tracker,
            sigterm,
            sigint,
            drain_timeout: Duration::from_secs(60),
        })
    }

    /// The tracker the scheduler task runs on
    #[must_use]
    pub fn task_tracker(&self) -> &TaskTracker {
        &self.task_tracker
    }

    /// A token cancelled once the service should shut down
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for a shutdown signal, then for the worker to drain
    pub async fn run(mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {
                tracing::info!("Shutdown signal received (SIGTERM), shutting down");
            },
            _ = self.sigint.recv() => {
                tracing::info!("Shutdown signal received (SIGINT), shutting down");
            },
        };

        self.token.cancel();
        self.task_tracker.close();

        tokio::select! {
            _ = self.sigterm.recv() => {
                tracing::warn!("Second shutdown signal received (SIGTERM), not waiting");
            },
            _ = self.sigint.recv() => {
                tracing::warn!("Second shutdown signal received (SIGINT), not waiting");
            },
            () = tokio::time::sleep(self.drain_timeout) => {
                tracing::warn!("Shutdown drain timeout reached, not waiting");
            },
            () = self.task_tracker.wait() => {
                tracing::info!("All tasks are done, exiting");
            },
        }
    }
}
