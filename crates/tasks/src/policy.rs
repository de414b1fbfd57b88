// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::time::Duration;

/// The retention policy applied by the sweeper: how old a message must be
/// before it is deleted, and how long a single run may take
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    window: chrono::Duration,
    timeout: Duration,
}

/// The retention policy is not usable
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The retention window is zero or negative
    #[error("retention window must be positive, got {window}")]
    NonPositiveWindow {
        /// The configured window
        window: chrono::Duration,
    },
}

impl RetentionPolicy {
    /// How old a message must be before it is deleted, by default
    pub const DEFAULT_WINDOW_DAYS: i64 = 14;

    /// How long a single run may take, by default
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    /// Create a new [`RetentionPolicy`]
    ///
    /// The window is not validated here: the sweeper validates it at the
    /// start of each run, so that a bad configuration shows up in the run
    /// log rather than at startup only.
    #[must_use]
    pub fn new(window: chrono::Duration, timeout: Duration) -> Self {
        Self { window, timeout }
    }

    /// Messages older than this are deleted
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        self.window
    }

    /// A run stops early once it has been going for this long
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check that the policy can be applied
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the retention window is zero or
    /// negative
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.window <= chrono::Duration::zero() {
            return Err(ConfigurationError::NonPositiveWindow {
                window: self.window,
            });
        }

        Ok(())
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(
            chrono::Duration::days(Self::DEFAULT_WINDOW_DAYS),
            Self::DEFAULT_TIMEOUT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(RetentionPolicy::default().validate().is_ok());

        for days in [0, -1] {
            let policy = RetentionPolicy::new(
                chrono::Duration::days(days),
                RetentionPolicy::DEFAULT_TIMEOUT,
            );
            assert!(matches!(
                policy.validate(),
                Err(ConfigurationError::NonPositiveWindow { .. })
            ));
        }
    }
}
