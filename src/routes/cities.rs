// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! City lookup routes.

use crate::error::Result;
use crate::routes::city_from_request;
use crate::services::CityListing;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cities", get(list_cities))
        .route("/cities/resolve", get(resolve))
}

/// Known cities, featured metros first.
async fn list_cities(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CityListing>>> {
    Ok(Json(state.catalog.list_cities().await?))
}

#[derive(Deserialize)]
struct ResolveQuery {
    name: String,
}

/// Resolve a free-text city name without touching storage.
async fn resolve(Query(params): Query<ResolveQuery>) -> Result<Json<CityListing>> {
    let city = city_from_request(&params.name)?;
    Ok(Json(CityListing::from(city)))
}
