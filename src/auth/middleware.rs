// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Every request is verified independently: the bearer token is checked
//! against the configured key broker and, on success, the token's consumer is
//! stored for the downstream handler. Failures are answered with a 401
//! envelope and the handler is never run.
//!
//! ```rust,ignore
//! let config = AuthConfig::new(Arc::new(StaticKeyBroker::from_rsa_pem(pem)?));
//!
//! let app = protect(
//!     Router::new().route("/orders", get(list_orders)),
//!     config,
//! );
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use super::broker::KeyBroker;
use super::context::store_consumer;
use super::error::AuthError;
use super::verify::verify_token;

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Key broker for signature verification
    pub broker: Arc<dyn KeyBroker>,
    /// Clock skew tolerance in seconds
    pub leeway: u64,
}

impl AuthConfig {
    pub fn new(broker: Arc<dyn KeyBroker>) -> Self {
        Self { broker, leeway: 0 }
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}

/// Require a valid bearer token on every route of `router`.
pub fn protect<S>(router: Router<S>, config: AuthConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(config, validate_jwt))
}

/// Authentication middleware function.
///
/// Use with `axum::middleware::from_fn_with_state(config, validate_jwt)`
/// when [`protect`] does not fit.
pub async fn validate_jwt(
    State(config): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_owned(),
        Err(e) => return reject(e),
    };

    match verify_token(&token, config.broker.as_ref(), config.leeway).await {
        Ok(claims) => {
            tracing::debug!(consumer_id = claims.consumer.id, "consumer authenticated");
            store_consumer(request.extensions_mut(), claims.consumer);
            next.run(request).await
        }
        Err(e) => reject(e),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let token = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MissingCredentials)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

fn reject(err: AuthError) -> Response {
    if err.is_server_fault() {
        tracing::warn!(error = %err, "token verification unavailable");
    } else {
        tracing::debug!(error = %err, "rejected credentials");
    }
    err.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::broker::StaticKeyBroker;
    use crate::auth::claims::{Claims, Consumer};
    use crate::auth::context::CurrentConsumer;
    use crate::auth::verify::tests::{claims_at, issue, OTHER_PUBLIC_KEY, PUBLIC_KEY};
    use crate::response::Envelope;
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderValue, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    async fn echo_consumer(CurrentConsumer(consumer): CurrentConsumer) -> Envelope {
        Envelope::with_data(StatusCode::OK, "", "consumer", &consumer).unwrap()
    }

    fn app(public_key: &[u8]) -> Router {
        let broker = StaticKeyBroker::from_rsa_pem(public_key).unwrap();
        protect(
            Router::new().route("/", get(echo_consumer)),
            AuthConfig::new(Arc::new(broker)),
        )
    }

    async fn call(app: Router, authorization: Option<String>) -> (StatusCode, Envelope) {
        let mut request = axum::http::Request::builder().uri("/");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    async fn call_with(public_key: &[u8], claims: &Claims) -> (StatusCode, Envelope) {
        call(app(public_key), Some(format!("Bearer {}", issue(claims)))).await
    }

    #[tokio::test]
    async fn good_token_reaches_handler_with_consumer() {
        let claims = claims_at(-7200, -3600, 3600);
        let (status, body) = call_with(PUBLIC_KEY, &claims).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.code, 200);
        assert_eq!(body.message, "");
        let consumer: Consumer = body.extract_data("consumer").unwrap();
        assert_eq!(consumer.id, claims.consumer.id);
        assert_eq!(consumer.grants, claims.consumer.grants);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let claims = claims_at(-7200, -3600, -60);
        let (status, body) = call_with(PUBLIC_KEY, &claims).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, 401);
        assert!(
            body.message == "token is expired by 1m0s" || body.message == "token is expired by 1m1s",
            "{}",
            body.message
        );
        assert!(body.data.is_none());
    }

    #[tokio::test]
    async fn token_expiring_now_is_rejected() {
        let claims = claims_at(-7200, -3600, 0);
        let (status, body) = call_with(PUBLIC_KEY, &claims).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(
            body.message == "token is expired by 0s" || body.message == "token is expired by 1s",
            "{}",
            body.message
        );
    }

    #[tokio::test]
    async fn token_not_ready_yet_is_rejected() {
        let claims = claims_at(-7200, 60, 3600);
        let (status, body) = call_with(PUBLIC_KEY, &claims).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "token is not valid yet");
    }

    #[tokio::test]
    async fn issued_at_in_future_is_rejected() {
        let claims = claims_at(3600, 60, 3600);
        let (status, body) = call_with(PUBLIC_KEY, &claims).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "token is not valid yet");
    }

    #[tokio::test]
    async fn token_signed_with_other_key_is_rejected() {
        let claims = claims_at(-7200, -3600, 3600);
        let (status, body) = call_with(OTHER_PUBLIC_KEY, &claims).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.message.starts_with("token signature invalid: "), "{}", body.message);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (status, body) = call(app(PUBLIC_KEY), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "missing authorization credentials");
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let (status, body) = call(app(PUBLIC_KEY), Some("Basic dXNlcjpwYXNz".to_string())).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "missing authorization credentials");
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert!(matches!(bearer_token(&headers), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn auth_config_leeway() {
        let broker = StaticKeyBroker::from_rsa_pem(PUBLIC_KEY).unwrap();
        let config = AuthConfig::new(Arc::new(broker));
        assert_eq!(config.leeway, 0);
        assert_eq!(config.with_leeway(60).leeway, 60);
    }
}
