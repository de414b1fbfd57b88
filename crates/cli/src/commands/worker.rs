// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use anyhow::Context;
use campushare_config::{AppConfig, ConfigurationSection};
use clap::Parser;
use figment::Figment;
use tracing::{info, info_span};

use crate::{shutdown::ShutdownManager, util::state_from_config};

#[derive(Parser, Debug, Default)]
pub(super) struct Options {}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let shutdown = ShutdownManager::new()?;
        let span = info_span!("cli.worker.init").entered();
        let config = AppConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;

        let schedule = config
            .retention
            .schedule()
            .context("invalid retention schedule")?;

        // Connect to the database
        info!("Connecting to the database");
        let state = state_from_config(&config).await?;

        drop(config);

        info!("Starting the retention scheduler");
        campushare_tasks::init_and_run(
            state,
            schedule,
            shutdown.token(),
            shutdown.task_tracker(),
        );
        span.exit();

        shutdown.run().await;

        Ok(ExitCode::SUCCESS)
    }
}
