// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use campushare_config::{AppConfig, ConfigurationSection};
use campushare_storage::CleanupRunRepository;
use campushare_tasks::run_cleanup;
use clap::Parser;
use figment::Figment;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span};

use crate::util::state_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Run the retention sweeper once, now
    Run,

    /// Show the most recent sweeper runs
    History {
        /// How many runs to show
        #[clap(long, default_value_t = 10)]
        count: usize,
    },
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        let config = AppConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;

        match self.subcommand {
            SC::Run => {
                let span = info_span!("cli.cleanup.run").entered();
                let state = state_from_config(&config).await?;
                span.exit();

                let summary = run_cleanup(&state, &CancellationToken::new()).await?;

                println!("messages deleted:    {}", summary.messages_deleted);
                println!("attachments deleted: {}", summary.attachments_deleted);
                if let Some(error) = summary.error {
                    println!("error:               {error}");
                    return Ok(ExitCode::FAILURE);
                }
            }

            SC::History { count } => {
                let span = info_span!("cli.cleanup.history").entered();
                let state = state_from_config(&config).await?;
                span.exit();

                let mut repo = state.repository().await?;
                let runs = repo.cleanup_run().list_recent(count).await?;
                repo.cancel().await?;

                if runs.is_empty() {
                    info!("No cleanup runs recorded yet");
                }

                for run in runs {
                    let status = match &run.error {
                        None => "ok".to_owned(),
                        Some(error) => format!("failed: {error}"),
                    };
                    println!(
                        "{}  messages={} attachments={}  {status}",
                        run.run_at, run.messages_deleted, run.attachments_deleted
                    );
                }
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
