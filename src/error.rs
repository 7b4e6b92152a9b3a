// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::migrate::MigrationError;

/// Failures that abort service startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("authentication setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
