// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uniform JSON response envelope.
//!
//! Every response produced by this crate, success or failure, has the shape
//!
//! ```json
//! {"code": 401, "message": "token is not valid yet", "data": null}
//! ```
//!
//! `data` is either `null` or an object keyed by the payload's type name,
//! e.g. `{"consumer": {"id": 5, "grants": ["test.grant"]}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while reading a payload back out of an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("response carries no data")]
    NoData,
    #[error("response data has no {0:?} entry")]
    MissingKind(String),
    #[error("failed to decode response data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Typed payload of an envelope, keyed by its type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Data(Map<String, Value>);

impl Data {
    /// Wrap `content` under the `kind` key.
    pub fn new<T: Serialize>(kind: impl Into<String>, content: &T) -> Result<Self, serde_json::Error> {
        let mut map = Map::new();
        map.insert(kind.into(), serde_json::to_value(content)?);
        Ok(Self(map))
    }

    /// Decode the entry stored under `kind`.
    pub fn extract<T: DeserializeOwned>(&self, kind: &str) -> Result<T, EnvelopeError> {
        let value = self
            .0
            .get(kind)
            .ok_or_else(|| EnvelopeError::MissingKind(kind.to_string()))?;
        Ok(T::deserialize(value)?)
    }
}

/// Status/message/data envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: u16,
    pub message: String,
    pub data: Option<Data>,
}

impl Envelope {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<Data>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    /// Envelope carrying `content` under `kind`.
    pub fn with_data<T: Serialize>(
        status: StatusCode,
        message: impl Into<String>,
        kind: impl Into<String>,
        content: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status, message, Some(Data::new(kind, content)?)))
    }

    /// Decode the payload stored under `kind`.
    pub fn extract_data<T: DeserializeOwned>(&self, kind: &str) -> Result<T, EnvelopeError> {
        self.data
            .as_ref()
            .ok_or(EnvelopeError::NoData)?
            .extract(kind)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
