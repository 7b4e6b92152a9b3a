// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key brokers supply the public key used to verify token signatures.
//!
//! Two brokers are provided:
//!
//! - [`JwksKeyBroker`](super::jwks::JwksKeyBroker) fetches and caches keys
//!   from a key-management endpoint and renews them on demand.
//! - [`StaticKeyBroker`] holds a single fixed key (tests, single-key
//!   deployments).

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Header};

use super::error::AuthError;

/// A verification key together with the algorithm it must be used with.
#[derive(Clone)]
pub struct VerificationKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

impl VerificationKey {
    pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        Self { key, algorithm }
    }
}

/// Supplier of the current verification key.
///
/// Implementations are shared across concurrent requests and must tolerate
/// concurrent reads. Brokers that renew their keys serialise renewal
/// against readers themselves.
#[async_trait]
pub trait KeyBroker: Send + Sync {
    /// Return a copy of the key that should verify a token with `header`.
    async fn verification_key(&self, header: &Header) -> Result<VerificationKey, AuthError>;

    /// Refresh key material from its source.
    async fn renew(&self) -> Result<(), AuthError> {
        Ok(())
    }

    /// Whether the broker currently holds usable keys.
    async fn is_ready(&self) -> bool {
        true
    }
}

/// Broker holding one fixed key.
#[derive(Clone)]
pub struct StaticKeyBroker {
    key: VerificationKey,
}

impl StaticKeyBroker {
    pub fn new(key: VerificationKey) -> Self {
        Self { key }
    }

    /// Build an RS256 broker from a PEM encoded RSA public key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| AuthError::InvalidKey(format!("Failed to parse RSA public key: {e}")))?;
        Ok(Self::new(VerificationKey::new(key, Algorithm::RS256)))
    }
}

#[async_trait]
impl KeyBroker for StaticKeyBroker {
    async fn verification_key(&self, _header: &Header) -> Result<VerificationKey, AuthError> {
        Ok(self.key.clone())
    }
}
