// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use microservice_core::{
    api::router,
    auth::{AuthConfig, JwksKeyBroker, KeyBroker, StaticKeyBroker},
    config::{Config, KeySource, LogFormat},
    error::StartupError,
    migrate::{Cockroach, Migrator},
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    init_tracing(LogFormat::from_env());

    if let Err(e) = run().await {
        tracing::error!(error = %e, "service failed");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    // Refuse to serve against an unmigrated schema.
    match &config.migrations_path {
        Some(path) => {
            Cockroach::new(path, Some(config.database.clone()))?
                .migrate()
                .await?
        }
        None => tracing::info!("MIGRATIONS_PATH not set, skipping migrations"),
    }

    let broker: Arc<dyn KeyBroker> = match &config.key_source {
        KeySource::Jwks(url) => Arc::new(JwksKeyBroker::new(url.clone())?),
        KeySource::PublicKeyFile(path) => {
            let pem = tokio::fs::read(path).await?;
            Arc::new(StaticKeyBroker::from_rsa_pem(&pem)?)
        }
    };

    let auth = AuthConfig::new(broker).with_leeway(config.jwt_leeway);
    let app = router(AppState::new(auth));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
