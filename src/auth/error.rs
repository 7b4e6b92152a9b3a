// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::Envelope;

/// Authentication error type.
///
/// The `Display` text is the `message` of the 401 envelope sent to the
/// client, so it is phrased for callers rather than operators.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable `Authorization: Bearer` header
    #[error("missing authorization credentials")]
    MissingCredentials,
    /// Token could not be decoded
    #[error("token is malformed: {0}")]
    MalformedToken(String),
    /// Signature did not verify against the broker's key
    #[error("token signature invalid: {0}")]
    InvalidSignature(String),
    /// Token expired; carries the time elapsed since expiry
    #[error("token is expired by {}", format_elapsed(.0))]
    Expired(Duration),
    /// Current time is before `nbf`, or `iat` is in the future
    #[error("token is not valid yet")]
    NotYetValid,
    /// Any other claim validation failure
    #[error("token is invalid: {0}")]
    InvalidToken(String),
    /// The broker holds no key for the token's key id
    #[error("no verification key matches key id {0:?}")]
    NoMatchingKey(String),
    /// The broker could not fetch its key material
    #[error("verification key unavailable: {0}")]
    KeyUnavailable(String),
    /// The broker's key material could not be turned into a key
    #[error("invalid verification key: {0}")]
    InvalidKey(String),
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        if self.is_server_fault() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::UNAUTHORIZED
        }
    }

    /// Failures caused by the service rather than the caller's credentials.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, AuthError::KeyUnavailable(_) | AuthError::InvalidKey(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        Envelope::new(self.status_code(), self.to_string(), None).into_response()
    }
}

/// Render a whole-second duration as `1h2m3s`, `1m0s` or `45s`.
pub(crate) fn format_elapsed(elapsed: &Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
