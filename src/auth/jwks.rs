// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Live key broker backed by a JWKS (JSON Web Key Set) endpoint.
//!
//! - Keys are cached with a configurable TTL
//! - An expired cache is refetched on the next lookup
//! - Fetches are serialised; lookups queued behind a fetch reuse its result
//! - Renewal takes the cache write lock, so readers never see a partial set

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, Header};
use tokio::sync::{Mutex, RwLock};

use super::broker::{KeyBroker, VerificationKey};
use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Key broker that fetches and caches keys from a key-management endpoint.
#[derive(Clone)]
pub struct JwksKeyBroker {
    jwks_url: String,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    refresh: Arc<Mutex<()>>,
    client: reqwest::Client,
}

impl JwksKeyBroker {
    /// Create a broker for `jwks_url`. Nothing is fetched until first use.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::KeyUnavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(())),
            client,
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        if let Some(jwks) = self.cached().await {
            return Ok(jwks);
        }

        let _refresh = self.refresh.lock().await;
        if let Some(jwks) = self.cached().await {
            return Ok(jwks);
        }

        let jwks = self.fetch_jwks().await?;
        self.store(jwks.clone()).await;
        Ok(jwks)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))
    }

    async fn store(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
    }

    async fn cached(&self) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| entry.jwks.clone())
    }

    async fn is_cached(&self) -> bool {
        self.cached().await.is_some()
    }
}

#[async_trait]
impl KeyBroker for JwksKeyBroker {
    async fn verification_key(&self, header: &Header) -> Result<VerificationKey, AuthError> {
        let jwks = self.get_jwks().await?;
        select_key(&jwks, header.kid.as_deref())
    }

    async fn renew(&self) -> Result<(), AuthError> {
        let _refresh = self.refresh.lock().await;
        let jwks = self.fetch_jwks().await?;
        self.store(jwks).await;
        tracing::debug!(url = %self.jwks_url, "JWKS renewed");
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        if self.is_cached().await {
            return true;
        }
        match self.renew().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.jwks_url, "JWKS unavailable");
                false
            }
        }
    }
}

/// Pick the key for `kid`, or the first usable key when the token has none.
fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<VerificationKey, AuthError> {
    match kid {
        Some(kid) => {
            let jwk = jwks
                .keys
                .iter()
                .find(|k| k.common.key_id.as_deref() == Some(kid))
                .ok_or_else(|| AuthError::NoMatchingKey(kid.to_string()))?;
            key_from_jwk(jwk)
        }
        None => jwks
            .keys
            .iter()
            .find_map(|jwk| key_from_jwk(jwk).ok())
            .ok_or_else(|| AuthError::NoMatchingKey(String::new())),
    }
}

fn key_from_jwk(jwk: &Jwk) -> Result<VerificationKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InvalidKey(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            Ok(VerificationKey::new(key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::InvalidKey(format!("Failed to create EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok(VerificationKey::new(key, alg))
        }
        _ => Err(AuthError::InvalidKey(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
