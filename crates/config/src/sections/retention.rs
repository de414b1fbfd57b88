// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::{str::FromStr, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::ConfigurationSection;

fn default_window_days() -> i64 {
    14
}

fn default_schedule() -> String {
    // Daily at 04:00 UTC
    "0 0 4 * * *".to_owned()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

/// Retention sweeper configuration
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct RetentionConfig {
    /// How many days a group message is kept before the sweeper deletes it.
    ///
    /// The value is validated by the sweeper at the start of each run, so a
    /// zero or negative window shows up as a failed run in the run log
    /// rather than aborting the whole service.
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Cron expression for when the sweeper runs
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Soft deadline for a single run, in seconds; past it the run stops
    /// where it is and records a timeout
    #[schemars(with = "u64")]
    #[serde(default = "default_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl RetentionConfig {
    /// The retention window as a duration
    ///
    /// A `window_days` too large to represent collapses to a zero window,
    /// which the sweeper rejects and records as a failed run. [`validate`]
    /// already refuses such a configuration up front.
    ///
    /// [`validate`]: ConfigurationSection::validate
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.window_days).unwrap_or_else(chrono::Duration::zero)
    }

    /// The parsed cron schedule
    ///
    /// # Errors
    ///
    /// Returns an error if the cron expression is invalid
    pub fn schedule(&self) -> Result<cron::Schedule, cron::error::Error> {
        cron::Schedule::from_str(&self.schedule)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            schedule: default_schedule(),
            timeout: default_timeout(),
        }
    }
}

impl ConfigurationSection for RetentionConfig {
    const PATH: Option<&'static str> = Some("retention");

    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let error_on_field = |mut error: figment::error::Error, field: &'static str| {
            error.metadata = figment.find_metadata(Self::PATH.unwrap()).cloned();
            error.profile = Some(figment::Profile::Default);
            error.path = vec![Self::PATH.unwrap().to_owned(), field.to_owned()];
            error
        };

        if let Err(e) = self.schedule() {
            return Err(error_on_field(
                figment::error::Error::from(format!("invalid cron expression: {e}")),
                "schedule",
            )
            .into());
        }

        if chrono::Duration::try_days(self.window_days).is_none() {
            return Err(error_on_field(
                figment::error::Error::from(format!(
                    "retention window of {} days is out of range",
                    self.window_days
                )),
                "window_days",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                  retention:
                    window_days: 30
                    schedule: '0 15 2 * * *'
                    timeout: 120
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = RetentionConfig::extract(&figment)
                .map_err(|e| figment::Error::from(e.to_string()))?;

            assert_eq!(config.window_days, 30);
            assert_eq!(config.window(), chrono::Duration::days(30));
            assert_eq!(config.timeout, Duration::from_secs(120));
            assert!(config.schedule().is_ok());

            Ok(())
        });
    }

    #[test]
    fn rejects_invalid_schedule() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                  retention:
                    schedule: not-a-cron-expression
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(RetentionConfig::extract(&figment).is_err());

            Ok(())
        });
    }

    #[test]
    fn rejects_out_of_range_window() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                  retention:
                    window_days: 999999999999999
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(RetentionConfig::extract(&figment).is_err());

            Ok(())
        });
    }

    #[test]
    fn defaults() {
        let config = RetentionConfig::default();
        assert_eq!(config.window_days, 14);
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.schedule().is_ok());
    }
}
