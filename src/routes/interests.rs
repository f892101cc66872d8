// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest selection routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{InterestSelection, ItemType};
use crate::routes::city_from_request;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{user_id}/cities/{city_key}/interests",
            get(list_for_user),
        )
        .route("/interests", post(select))
        .route("/interests/{selection_id}", delete(deselect))
}

/// A user's selections in one city.
async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path((user_id, city_key)): Path<(u64, String)>,
) -> Result<Json<Vec<InterestSelection>>> {
    let city = city_from_request(&city_key)?;
    Ok(Json(
        state.interests.list_for_user(user_id, &city.city_key).await?,
    ))
}

#[derive(Deserialize, Validate)]
struct SelectRequest {
    #[validate(length(min = 1, max = 64))]
    item_id: String,
    item_type: ItemType,
    city_key: String,
}

/// Select an item for the caller.
///
/// 201 when a new selection was stored, 200 when it already existed.
async fn select(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SelectRequest>,
) -> Result<(StatusCode, Json<InterestSelection>)> {
    body.validate()?;
    let city = city_from_request(&body.city_key)?;

    let write = state
        .interests
        .select(user.user_id, &body.item_id, body.item_type, &city.city_key)
        .await?;

    let status = if write.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(write.selection)))
}

async fn deselect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(selection_id): Path<String>,
) -> Result<StatusCode> {
    state
        .interests
        .deselect(&selection_id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
