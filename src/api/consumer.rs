// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::CurrentConsumer;
use crate::response::Envelope;

/// Echo the authenticated consumer.
pub async fn current_consumer(CurrentConsumer(consumer): CurrentConsumer) -> Response {
    match Envelope::with_data(StatusCode::OK, "", "consumer", &consumer) {
        Ok(envelope) => envelope.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode consumer");
            Envelope::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None).into_response()
        }
    }
}
