// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};

mod cleanup;
mod config;
mod database;
mod worker;

#[derive(Parser, Debug)]
enum Subcommand {
    /// Configuration-related commands
    Config(self::config::Options),

    /// Manage the database
    Database(self::database::Options),

    /// Run the retention sweeper on its schedule, until shut down
    Worker(self::worker::Options),

    /// Run the retention sweeper manually and inspect past runs
    Cleanup(self::cleanup::Options),
}

#[derive(Parser, Debug)]
#[command(version, about = "Campushare retention service")]
pub struct Options {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "CAMPUSHARE_CONFIG",
        action = clap::ArgAction::Append
    )]
    config: Vec<Utf8PathBuf>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

impl Options {
    /// Load the configuration sources: YAML files given on the command line
    /// (or `config.yaml` by default), overridden by `CAMPUSHARE_`-prefixed
    /// environment variables with `__` as the section separator
    pub fn figment(&self) -> Figment {
        let configs: Vec<Utf8PathBuf> = if self.config.is_empty() {
            vec!["config.yaml".into()]
        } else {
            self.config.clone()
        };

        let mut figment = Figment::new();
        for config in configs {
            figment = figment.merge(Yaml::file(config));
        }

        figment.merge(Env::prefixed("CAMPUSHARE_").split("__"))
    }

    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as S;
        match self.subcommand {
            S::Config(c) => c.run(figment).await,
            S::Database(c) => c.run(figment).await,
            S::Worker(c) => c.run(figment).await,
            S::Cleanup(c) => c.run(figment).await,
        }
    }
}
