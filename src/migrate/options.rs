// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connection options and connection-string rendering.
//!
//! Unset fields (empty strings, port `0`) are resolved to the defaults
//! below when the connection is rendered; the options themselves are never
//! modified.

use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use url::Url;

use super::error::MigrationError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PORT: u16 = 26257;
pub const DEFAULT_DATABASE: &str = "service";
pub const DEFAULT_MIGRATION_TABLE: &str = "schema_migrations";

const SCHEME: &str = "postgresql";
const MIGRATIONS_TABLE_PARAM: &str = "x-migrations-table";

/// Generic database connection options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// SSL material for secure CockroachDB connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CockroachSsl {
    pub cert_path: String,
    pub key_path: String,
    pub mode: String,
    pub root_cert: String,
}

/// CockroachDB connection and migration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CockroachOptions {
    /// `None` uses the default for every connection field
    pub connection: Option<ConnectionOptions>,
    pub migration_table: String,
    /// Requires `ssl` to be set
    pub secure: bool,
    pub ssl: Option<CockroachSsl>,
}

/// Options with every default applied.
struct Resolved<'a> {
    host: &'a str,
    port: u16,
    user: &'a str,
    password: &'a str,
    database: &'a str,
    migration_table: &'a str,
    ssl: Option<&'a CockroachSsl>,
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

impl CockroachOptions {
    fn resolve(&self) -> Result<Resolved<'_>, MigrationError> {
        let ssl = if self.secure {
            Some(self.ssl.as_ref().ok_or(MigrationError::MissingSslMaterial)?)
        } else {
            None
        };
        let migration_table = or_default(&self.migration_table, DEFAULT_MIGRATION_TABLE);

        Ok(match &self.connection {
            Some(conn) => Resolved {
                host: or_default(&conn.host, DEFAULT_HOST),
                port: if conn.port == 0 { DEFAULT_PORT } else { conn.port },
                user: or_default(&conn.user, DEFAULT_USER),
                password: &conn.password,
                database: or_default(&conn.database, DEFAULT_DATABASE),
                migration_table,
                ssl,
            },
            None => Resolved {
                host: DEFAULT_HOST,
                port: DEFAULT_PORT,
                user: DEFAULT_USER,
                password: "",
                database: DEFAULT_DATABASE,
                migration_table,
                ssl,
            },
        })
    }

    /// Render the options as a connection URI.
    ///
    /// `postgresql://user@host:port/database?sslmode=..&x-migrations-table=..`
    /// followed by `sslcert`, `sslkey` and `sslrootcert` for secure
    /// connections.
    pub fn connection_string(&self) -> Result<String, MigrationError> {
        let resolved = self.resolve()?;

        let mut url = Url::parse(&format!(
            "{SCHEME}://{}:{}/{}",
            resolved.host, resolved.port, resolved.database
        ))?;
        url.set_username(resolved.user)
            .map_err(|()| MigrationError::InvalidCredentials)?;
        if !resolved.password.is_empty() {
            url.set_password(Some(resolved.password))
                .map_err(|()| MigrationError::InvalidCredentials)?;
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair(
                "sslmode",
                resolved.ssl.map_or("disable", |ssl| ssl.mode.as_str()),
            );
            query.append_pair(MIGRATIONS_TABLE_PARAM, resolved.migration_table);
            if let Some(ssl) = resolved.ssl {
                query.append_pair("sslcert", &ssl.cert_path);
                query.append_pair("sslkey", &ssl.key_path);
                query.append_pair("sslrootcert", &ssl.root_cert);
            }
        }

        Ok(url.into())
    }

    /// Driver options parsed from [`connection_string`](Self::connection_string).
    ///
    /// `x-migrations-table` is not a driver parameter and is dropped before
    /// parsing.
    pub fn connect_options(&self) -> Result<PgConnectOptions, MigrationError> {
        let mut url = Url::parse(&self.connection_string()?)?;
        let params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| &**key != MIGRATIONS_TABLE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut().clear().extend_pairs(params);

        PgConnectOptions::from_url(&url).map_err(MigrationError::ConnectOptions)
    }

    /// Name of the table recording applied migrations.
    pub fn migration_table(&self) -> &str {
        or_default(&self.migration_table, DEFAULT_MIGRATION_TABLE)
    }
}
