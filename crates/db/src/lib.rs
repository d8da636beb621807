//! Database layer for folio.
//!
//! Owns the `PostgreSQL` pool, the schema migrations for profiles, posts,
//! comments and reactions, and the repositories the services go through.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use anyhow::Context;
use folio_common::{AppResult, config::DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{info, log::LevelFilter};

/// Pool options for `config`.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&config.url);

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .sqlx_logging(config.log_statements)
        .sqlx_logging_level(LevelFilter::Debug);

    opt
}

/// `url` with any `user:password@` part removed, for logs.
#[must_use]
pub fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
            format!("{scheme}://{host}")
        }
        None => url.rsplit_once('@').map_or(url, |(_, host)| host).to_string(),
    }
}

/// Open the connection pool.
pub async fn init(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let target = redact_url(&config.url);
    info!(
        database = %target,
        max_connections = config.max_connections,
        "Connecting to database"
    );

    let db = Database::connect(connect_options(config))
        .await
        .with_context(|| format!("failed to connect to {target}"))?;

    Ok(db)
}

/// Apply every pending migration.
pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .context("failed to read migration status")?;

    if pending.is_empty() {
        info!("Schema is up to date");
        return Ok(());
    }

    for migration in &pending {
        info!(migration = %migration.name(), "Applying migration");
    }
    migrations::Migrator::up(db, None)
        .await
        .context("failed to apply migrations")?;
    info!(applied = pending.len(), "Migrations completed");

    Ok(())
}
