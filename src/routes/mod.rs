// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod catalog;
pub mod cities;
pub mod interests;
pub mod matches;

use crate::error::{AppError, Result};
use crate::middleware::auth::require_auth;
use crate::models::CanonicalCity;
use crate::services::city::resolve_city;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest raw city name accepted in a path or query.
const MAX_CITY_NAME_LEN: usize = 100;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Resolve a raw city name from a request, rejecting blank or oversized input.
pub(crate) fn city_from_request(raw: &str) -> Result<CanonicalCity> {
    if raw.trim().is_empty() {
        return Err(AppError::Validation("city must not be blank".to_string()));
    }
    if raw.chars().count() > MAX_CITY_NAME_LEN {
        return Err(AppError::Validation(format!(
            "city must be at most {} characters",
            MAX_CITY_NAME_LEN
        )));
    }
    Ok(resolve_city(raw))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_check));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(cities::routes())
        .merge(catalog::routes())
        .merge(interests::routes())
        .merge(matches::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_from_request_resolves_aliases() {
        let city = city_from_request("Manhattan").unwrap();
        assert_eq!(city.city_key, "new york city");
    }

    #[test]
    fn test_city_from_request_rejects_bad_input() {
        assert!(matches!(
            city_from_request("  "),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            city_from_request(&"x".repeat(101)),
            Err(AppError::Validation(_))
        ));
    }
}
