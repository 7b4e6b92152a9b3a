// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped consumer storage.
//!
//! The consumer lives in the request extensions under [`ConsumerSlot`], a
//! type private to this module. Only the authentication middleware can write
//! it; inserting a bare [`Consumer`] into the extensions has no effect on
//! what handlers read back.
//!
//! ```rust,ignore
//! async fn handler(CurrentConsumer(consumer): CurrentConsumer) -> impl IntoResponse {
//!     // consumer.id, consumer.grants
//! }
//! ```

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions, Request},
};

use super::claims::Consumer;

#[derive(Clone)]
struct ConsumerSlot(Consumer);

/// Store the authenticated consumer for the rest of the request.
pub(super) fn store_consumer(extensions: &mut Extensions, consumer: Consumer) {
    extensions.insert(ConsumerSlot(consumer));
}

/// Consumer stored by the middleware, or `Consumer::default()` if none was.
pub fn consumer_from_extensions(extensions: &Extensions) -> Consumer {
    extensions
        .get::<ConsumerSlot>()
        .map(|slot| slot.0.clone())
        .unwrap_or_default()
}

pub fn consumer_from_request<B>(request: &Request<B>) -> Consumer {
    consumer_from_extensions(request.extensions())
}

/// Extractor for the consumer stored by the authentication middleware.
///
/// Never rejects: routes not behind the middleware see the zero-value
/// consumer.
pub struct CurrentConsumer(pub Consumer);

impl<S> FromRequestParts<S> for CurrentConsumer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentConsumer(consumer_from_extensions(&parts.extensions)))
    }
}
