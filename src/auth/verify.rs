// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.
//!
//! Signature and `exp`/`nbf` checks are done by `jsonwebtoken`; this module
//! picks the key, adds the `iat` check and classifies failures. A token is
//! valid on `[nbf, exp)`: `jsonwebtoken` still accepts the `exp` second
//! itself, so that boundary is checked here too.

use std::time::Duration;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, decode_header, Validation};

use super::broker::{KeyBroker, VerificationKey};
use super::claims::Claims;
use super::error::AuthError;

/// Verify `token` against the broker's key and return its claims.
///
/// `leeway` (seconds) is applied to every temporal check.
pub async fn verify_token(
    token: &str,
    broker: &dyn KeyBroker,
    leeway: u64,
) -> Result<Claims, AuthError> {
    let header = decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    let VerificationKey { key, algorithm } = broker.verification_key(&header).await?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = leeway;
    validation.validate_nbf = true;
    validation.validate_aud = false;

    let claims = decode::<Claims>(token, &key, &validation)
        .map_err(|e| classify(token, e))?
        .claims;

    let current = now();
    if claims.exp <= current - leeway as i64 {
        return Err(AuthError::Expired(expired_by(token)));
    }
    if claims.issued_after(current + leeway as i64) {
        return Err(AuthError::NotYetValid);
    }

    Ok(claims)
}

fn classify(token: &str, err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired(expired_by(token)),
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature(err.to_string()),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
            AuthError::MalformedToken(err.to_string())
        }
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

/// Time elapsed since the token's `exp`.
///
/// Only called once the signature has been checked, so reading the
/// unverified payload here is safe.
fn expired_by(token: &str) -> Duration {
    let exp = jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
        .map(|data| data.claims.exp)
        .unwrap_or_else(|_| now());
    Duration::from_secs(now().saturating_sub(exp).max(0) as u64)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
