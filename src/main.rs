// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest-Match API Server
//!
//! Serves the per-city activity catalog, interest selections and
//! shared-interest matches.

use interest_match::{
    config::{Config, StorageBackend},
    db::Database,
    services::ActivityGenerator,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting Interest-Match API"
    );

    let db = match config.storage_backend {
        StorageBackend::Firestore => Database::firestore(&config.gcp_project_id).await?,
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Database::in_memory()
        }
    };

    let generator = match &config.activity_generator_url {
        Some(url) => {
            tracing::info!(
                url = %url,
                timeout_ms = config.activity_generator_timeout.as_millis() as u64,
                "Activity generator configured"
            );
            ActivityGenerator::new(url.clone(), config.activity_generator_timeout)?
        }
        None => {
            tracing::info!("No activity generator configured; catalog enhancement disabled");
            ActivityGenerator::disabled()
        }
    };

    tracing::info!(
        high = config.match_policy.high_threshold,
        medium = config.match_policy.medium_threshold,
        "Match policy loaded"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, generator));

    // Build router
    let app = interest_match::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("interest_match=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
