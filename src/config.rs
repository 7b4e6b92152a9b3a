// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWKS_URL` | Key-management endpoint (JWKS) for token verification | Required unless `JWT_PUBLIC_KEY_PATH` is set |
//! | `JWT_PUBLIC_KEY_PATH` | PEM RSA public key used instead of `JWKS_URL` | Optional |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for token timestamps | `0` |
//! | `MIGRATIONS_PATH` | Directory of `.sql` migrations run at startup | Migrations skipped |
//! | `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME` | Database connection | `localhost` / `26257` / `root` / none / `service` |
//! | `DB_MIGRATIONS_TABLE` | Migration bookkeeping table | `schema_migrations` |
//! | `DB_SECURE` | Use SSL for the database connection | `false` |
//! | `DB_SSL_CERT` / `DB_SSL_KEY` / `DB_SSL_MODE` / `DB_SSL_ROOT_CERT` | SSL material, required when `DB_SECURE=true` | none |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::migrate::{CockroachOptions, CockroachSsl, ConnectionOptions};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWT_PUBLIC_KEY_PATH_ENV: &str = "JWT_PUBLIC_KEY_PATH";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const MIGRATIONS_PATH_ENV: &str = "MIGRATIONS_PATH";
pub const DB_HOST_ENV: &str = "DB_HOST";
pub const DB_PORT_ENV: &str = "DB_PORT";
pub const DB_USER_ENV: &str = "DB_USER";
pub const DB_PASSWORD_ENV: &str = "DB_PASSWORD";
pub const DB_NAME_ENV: &str = "DB_NAME";
pub const DB_MIGRATIONS_TABLE_ENV: &str = "DB_MIGRATIONS_TABLE";
pub const DB_SECURE_ENV: &str = "DB_SECURE";
pub const DB_SSL_CERT_ENV: &str = "DB_SSL_CERT";
pub const DB_SSL_KEY_ENV: &str = "DB_SSL_KEY";
pub const DB_SSL_MODE_ENV: &str = "DB_SSL_MODE";
pub const DB_SSL_ROOT_CERT_ENV: &str = "DB_SSL_ROOT_CERT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("one of JWKS_URL or JWT_PUBLIC_KEY_PATH must be set")]
    MissingKeySource,
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Jwks(String),
    PublicKeyFile(PathBuf),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(LOG_FORMAT_ENV) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub key_source: KeySource,
    pub jwt_leeway: u64,
    pub migrations_path: Option<PathBuf>,
    pub database: CockroachOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let host = match var(HOST_ENV) {
            Some(value) => parse(HOST_ENV, value)?,
            None => DEFAULT_HOST,
        };
        let port = match var(PORT_ENV) {
            Some(value) => parse(PORT_ENV, value)?,
            None => DEFAULT_PORT,
        };
        let addr = SocketAddr::new(host, port);

        let key_source = match (var(JWT_PUBLIC_KEY_PATH_ENV), var(JWKS_URL_ENV)) {
            (Some(path), _) => KeySource::PublicKeyFile(PathBuf::from(path)),
            (None, Some(url)) => KeySource::Jwks(url),
            (None, None) => return Err(ConfigError::MissingKeySource),
        };

        let jwt_leeway = match var(JWT_LEEWAY_ENV) {
            Some(value) => parse(JWT_LEEWAY_ENV, value)?,
            None => 0,
        };

        let connection = ConnectionOptions {
            host: var(DB_HOST_ENV).unwrap_or_default(),
            port: match var(DB_PORT_ENV) {
                Some(value) => parse(DB_PORT_ENV, value)?,
                None => 0,
            },
            user: var(DB_USER_ENV).unwrap_or_default(),
            password: var(DB_PASSWORD_ENV).unwrap_or_default(),
            database: var(DB_NAME_ENV).unwrap_or_default(),
        };

        let secure = match var(DB_SECURE_ENV) {
            Some(value) => parse(DB_SECURE_ENV, value)?,
            None => false,
        };
        let ssl_vars = [
            var(DB_SSL_CERT_ENV),
            var(DB_SSL_KEY_ENV),
            var(DB_SSL_MODE_ENV),
            var(DB_SSL_ROOT_CERT_ENV),
        ];
        let ssl = if ssl_vars.iter().any(Option::is_some) {
            let [cert_path, key_path, mode, root_cert] = ssl_vars.map(Option::unwrap_or_default);
            Some(CockroachSsl {
                cert_path,
                key_path,
                mode,
                root_cert,
            })
        } else {
            None
        };

        Ok(Self {
            addr,
            key_source,
            jwt_leeway,
            migrations_path: var(MIGRATIONS_PATH_ENV).map(PathBuf::from),
            database: CockroachOptions {
                connection: Some(connection),
                migration_table: var(DB_MIGRATIONS_TABLE_ENV).unwrap_or_default(),
                secure,
                ssl,
            },
        })
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&[(JWKS_URL_ENV, "https://keys.example.com/jwks")])).unwrap();

        assert_eq!(config.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(
            config.key_source,
            KeySource::Jwks("https://keys.example.com/jwks".to_string())
        );
        assert_eq!(config.jwt_leeway, 0);
        assert!(config.migrations_path.is_none());
        assert_eq!(
            config.database.connection_string().unwrap(),
            "postgresql://root@localhost:26257/service?sslmode=disable&x-migrations-table=schema_migrations"
        );
    }

    #[test]
    fn ipv6_host_is_accepted() {
        let config = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (HOST_ENV, "::"),
            (PORT_ENV, "9090"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "[::]:9090".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn host_must_be_an_ip_address() {
        let result = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (HOST_ENV, "0.0.0.0:8080"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: HOST_ENV, .. })));
    }

    #[test]
    fn public_key_path_takes_precedence() {
        let config = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (JWT_PUBLIC_KEY_PATH_ENV, "/keys/jwt.pub.pem"),
        ]))
        .unwrap();
        assert_eq!(
            config.key_source,
            KeySource::PublicKeyFile(PathBuf::from("/keys/jwt.pub.pem"))
        );
    }

    #[test]
    fn missing_key_source_is_an_error() {
        let result = Config::from_lookup(lookup(&[(JWKS_URL_ENV, "")]));
        assert!(matches!(result, Err(ConfigError::MissingKeySource)));
    }

    #[test]
    fn database_variables_are_read() {
        let config = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (DB_HOST_ENV, "db"),
            (DB_PORT_ENV, "9001"),
            (DB_USER_ENV, "svc"),
            (DB_NAME_ENV, "orders"),
            (DB_MIGRATIONS_TABLE_ENV, "versions"),
            (MIGRATIONS_PATH_ENV, "./migrations"),
        ]))
        .unwrap();

        assert_eq!(config.migrations_path, Some(PathBuf::from("./migrations")));
        assert_eq!(
            config.database.connection_string().unwrap(),
            "postgresql://svc@db:9001/orders?sslmode=disable&x-migrations-table=versions"
        );
    }

    #[test]
    fn secure_database_collects_ssl_material() {
        let config = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (DB_SECURE_ENV, "true"),
            (DB_SSL_MODE_ENV, "verify-full"),
            (DB_SSL_ROOT_CERT_ENV, "/certs/ca.crt"),
        ]))
        .unwrap();

        assert!(config.database.secure);
        let ssl = config.database.ssl.unwrap();
        assert_eq!(ssl.mode, "verify-full");
        assert_eq!(ssl.root_cert, "/certs/ca.crt");
        assert_eq!(ssl.cert_path, "");
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let result = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (PORT_ENV, "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: PORT_ENV, .. })));

        let result = Config::from_lookup(lookup(&[
            (JWKS_URL_ENV, "https://keys.example.com/jwks"),
            (DB_SECURE_ENV, "yes"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: DB_SECURE_ENV, .. })));
    }

    #[test]
    fn log_format_selection() {
        assert_eq!(LogFormat::from_lookup(lookup(&[])), LogFormat::Pretty);
        assert_eq!(LogFormat::from_lookup(lookup(&[(LOG_FORMAT_ENV, "JSON")])), LogFormat::Json);
        assert_eq!(LogFormat::from_lookup(lookup(&[(LOG_FORMAT_ENV, "text")])), LogFormat::Pretty);
    }
}
