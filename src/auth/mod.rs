// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for Axum services.
//!
//! ## Auth Flow
//!
//! 1. Caller sends `Authorization: Bearer <JWT>`
//! 2. Middleware:
//!    - Asks the key broker for the verification key
//!    - Verifies signature, `exp`, `nbf` and `iat`
//!    - Stores the token's `consumer` for the request
//! 3. Handlers read it back with [`CurrentConsumer`]
//!
//! ## Failures
//!
//! Every credential failure is answered with HTTP 401 and
//! `{"code":401,"message":"<reason>","data":null}`. Nothing is retried or
//! cached; each request is verified on its own.

pub mod broker;
pub mod claims;
pub mod context;
pub mod error;
pub mod jwks;
pub mod middleware;
pub mod verify;

pub use broker::{KeyBroker, StaticKeyBroker, VerificationKey};
pub use claims::{Claims, Consumer};
pub use context::{consumer_from_extensions, consumer_from_request, CurrentConsumer};
pub use error::AuthError;
pub use jwks::JwksKeyBroker;
pub use middleware::{protect, validate_jwt, AuthConfig};
pub use verify::verify_token;
