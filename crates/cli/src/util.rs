// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use anyhow::Context;
use campushare_config::{AppConfig, DatabaseConfig, ObjectStorageConfig};
use campushare_data_model::SystemClock;
use campushare_object_store::FsObjectStore;
use campushare_storage_pg::PgRepositoryFactory;
use campushare_tasks::{RetentionPolicy, State};
use sqlx::{
    ConnectOptions, Connection, PgConnection, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::log::LevelFilter;

fn database_connect_options_from_config(
    config: &DatabaseConfig,
) -> Result<PgConnectOptions, anyhow::Error> {
    let options: PgConnectOptions = if let Some(uri) = config.uri.as_deref() {
        uri.parse()
            .context("could not parse database connection string")?
    } else {
        PgConnectOptions::new()
    };

    let options = options
        .application_name("campushare")
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, std::time::Duration::from_millis(100));

    Ok(options)
}

/// Create a single database connection from the configuration
pub async fn database_connection_from_config(
    config: &DatabaseConfig,
) -> Result<PgConnection, anyhow::Error> {
    let options = database_connect_options_from_config(config)?;
    PgConnection::connect_with(&options)
        .await
        .context("could not connect to the database")
}

/// Create a database connection pool from the configuration
pub async fn database_pool_from_config(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    let options = database_connect_options_from_config(config)?;
    PgPoolOptions::new()
        .max_connections(config.max_connections.into())
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(options)
        .await
        .context("could not connect to the database")
}

/// Create the object store from the configuration
#[must_use]
pub fn object_store_from_config(config: &ObjectStorageConfig) -> FsObjectStore {
    FsObjectStore::new(config.path.clone())
}

/// Build the shared task [`State`] out of the configuration
pub async fn state_from_config(config: &AppConfig) -> Result<State, anyhow::Error> {
    let pool = database_pool_from_config(&config.database).await?;
    let repository_factory = PgRepositoryFactory::new(pool);
    let object_store = object_store_from_config(&config.object_storage);
    let policy = RetentionPolicy::new(config.retention.window(), config.retention.timeout);

    Ok(State::new(
        repository_factory,
        SystemClock::default(),
        object_store,
        policy,
    ))
}
