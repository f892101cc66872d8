// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-interest match routes.

use crate::error::Result;
use crate::models::MatchResult;
use crate::routes::city_from_request;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/cities/{city_key}/matches/{user_id}", get(compute_matches))
}

/// Ranked users sharing interests with `user_id` in a city.
async fn compute_matches(
    State(state): State<Arc<AppState>>,
    Path((city_key, user_id)): Path<(String, u64)>,
) -> Result<Json<Vec<MatchResult>>> {
    let city = city_from_request(&city_key)?;
    Ok(Json(
        state
            .matches
            .compute_matches(user_id, &city.city_key)
            .await?,
    ))
}
