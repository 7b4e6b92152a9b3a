// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Schema Migrations
//!
//! Applies the versioned `.sql` files of a migrations directory to
//! CockroachDB (PostgreSQL wire protocol). Files are discovered and ordered
//! by `sqlx::migrate` (`<VERSION>_<DESCRIPTION>.sql`, `.down.sql` files are
//! skipped); the applied version is recorded in the table named by
//! [`CockroachOptions::migration_table`]. The database pool is released
//! after every run.
//!
//! ```rust,ignore
//! let options = CockroachOptions {
//!     connection: Some(ConnectionOptions { host: "db".into(), ..Default::default() }),
//!     ..Default::default()
//! };
//! Cockroach::new("./migrations", Some(options))?.migrate().await?;
//! ```
//!
//! Migrations are meant to run once at startup. Concurrent runs against the
//! same database must be serialised by the deployment.

pub mod cockroach;
pub mod error;
pub mod options;

use async_trait::async_trait;

pub use cockroach::{migrations_in_path, Cockroach};
pub use error::MigrationError;
pub use options::{CockroachOptions, CockroachSsl, ConnectionOptions};

/// A one-shot migration run, awaited on the startup task.
#[async_trait(?Send)]
pub trait Migrator {
    /// Apply every pending migration, consuming the migrator.
    async fn migrate(self) -> Result<(), MigrationError>;
}
