// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CockroachDB migrator.
//!
//! Applied migrations are tracked in a single-row table
//! `(version INT8, dirty BOOL)` named by the options. A migration marks the
//! table dirty before it runs and clean once it succeeds, so a failed run
//! leaves the database dirty until the version is fixed by hand.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::error::MigrationError;
use super::options::CockroachOptions;
use super::Migrator;

/// How long a run waits for a database connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Migrator for CockroachDB.
///
/// Holds a lazily connecting pool: nothing touches the database until
/// [`Migrator::migrate`] runs, and the pool is closed when it returns.
#[derive(Debug)]
pub struct Cockroach {
    pool: PgPool,
    migrations_path: PathBuf,
    migration_table: String,
}

impl Cockroach {
    /// Validate the migrations directory and prepare the connection.
    ///
    /// `None` options connect with every default.
    pub fn new(
        path: impl AsRef<Path>,
        options: Option<CockroachOptions>,
    ) -> Result<Self, MigrationError> {
        Self::with_acquire_timeout(path, options, DEFAULT_ACQUIRE_TIMEOUT)
    }

    /// Like [`Cockroach::new`], giving up on the database after `timeout`.
    pub fn with_acquire_timeout(
        path: impl AsRef<Path>,
        options: Option<CockroachOptions>,
        timeout: Duration,
    ) -> Result<Self, MigrationError> {
        let path = path.as_ref();
        if !migrations_in_path(path) {
            return Err(MigrationError::NoMigrations(path.to_path_buf()));
        }

        let options = options.unwrap_or_default();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_lazy_with(options.connect_options()?);

        Ok(Self {
            pool,
            migrations_path: path.to_path_buf(),
            migration_table: options.migration_table().to_string(),
        })
    }

    pub fn migrations_path(&self) -> &Path {
        &self.migrations_path
    }

    pub fn migration_table(&self) -> &str {
        &self.migration_table
    }

    async fn run(&self) -> Result<(), MigrationError> {
        let migrator = sqlx::migrate::Migrator::new(self.migrations_path.as_path())
            .await
            .map_err(MigrationError::Init)?;

        drop(self.pool.acquire().await.map_err(MigrationError::Driver)?);

        let table = quote_identifier(&self.migration_table);
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {table} (version INT8 NOT NULL PRIMARY KEY, dirty BOOL NOT NULL)"
        );
        sqlx::raw_sql(&create)
            .execute(&self.pool)
            .await
            .map_err(MigrationError::VersionTable)?;

        let select = format!("SELECT version, dirty FROM {table} LIMIT 1");
        let current: Option<(i64, bool)> = sqlx::query_as(&select)
            .fetch_optional(&self.pool)
            .await
            .map_err(MigrationError::VersionTable)?;

        if let Some((version, true)) = current {
            return Err(MigrationError::Dirty(version));
        }
        let applied = current.map(|(version, _)| version);

        let pending: Vec<_> = migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .filter(|m| applied.is_none_or(|version| m.version > version))
            .collect();

        tracing::info!(
            path = %self.migrations_path.display(),
            table = %self.migration_table,
            current = ?applied,
            pending = pending.len(),
            "Running database migrations"
        );

        let mut has_row = current.is_some();
        for migration in pending {
            self.set_version(&table, migration.version, true, has_row)
                .await?;
            has_row = true;

            sqlx::raw_sql(&migration.sql)
                .execute(&self.pool)
                .await
                .map_err(|source| MigrationError::Migration {
                    version: migration.version,
                    source,
                })?;

            self.set_version(&table, migration.version, false, true)
                .await?;
            tracing::debug!(
                version = migration.version,
                description = %migration.description,
                "Applied migration"
            );
        }

        tracing::info!("Migrations completed successfully");
        Ok(())
    }

    /// Record `version`, replacing the existing row when there is one.
    async fn set_version(
        &self,
        table: &str,
        version: i64,
        dirty: bool,
        replace: bool,
    ) -> Result<(), MigrationError> {
        let statement = if replace {
            format!("UPDATE {table} SET version = $1, dirty = $2")
        } else {
            format!("INSERT INTO {table} (version, dirty) VALUES ($1, $2)")
        };

        sqlx::query(&statement)
            .bind(version)
            .bind(dirty)
            .execute(&self.pool)
            .await
            .map_err(MigrationError::VersionTable)?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Migrator for Cockroach {
    async fn migrate(self) -> Result<(), MigrationError> {
        let result = self.run().await;
        self.pool.close().await;
        result
    }
}

/// Quote `name` as a single SQL identifier.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Whether `path` holds at least one regular `.sql` file.
///
/// Empty, missing and unreadable paths hold none. Symlinks and
/// subdirectories are not counted.
pub fn migrations_in_path(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return false;
    }

    let Ok(entries) = std::fs::read_dir(path) else {
        return false;
    };

    entries.filter_map(Result::ok).any(|entry| {
        entry.file_type().is_ok_and(|t| t.is_file())
            && entry.path().extension().is_some_and(|ext| ext == "sql")
    })
}
