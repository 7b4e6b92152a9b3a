// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;

use thiserror::Error;

/// Migration configuration and execution errors.
///
/// All of these are startup-fatal.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migrate: no migration files in given path {0:?}")]
    NoMigrations(PathBuf),

    #[error("migrate: secure connection requested without SSL material")]
    MissingSslMaterial,

    #[error("migrate: invalid connection string: {0}")]
    ConnectionString(#[from] url::ParseError),

    #[error("migrate: connection string cannot carry user credentials")]
    InvalidCredentials,

    #[error("migrate: invalid connection options: {0}")]
    ConnectOptions(#[source] sqlx::Error),

    #[error("migrate: could not get migrations driver: {0}")]
    Driver(#[source] sqlx::Error),

    #[error("migrate: could not initialise migrations: {0}")]
    Init(#[source] sqlx::migrate::MigrateError),

    #[error("migrate: could not access migration table: {0}")]
    VersionTable(#[source] sqlx::Error),

    #[error("migrate: dirty database version {0}, fix and force version")]
    Dirty(i64),

    #[error("migrate: migration {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },
}
