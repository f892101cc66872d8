// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog routes: activities, events and generator seeding.
//!
//! Every authenticated user may create, edit and delete any item. There is
//! deliberately no ownership check on these handlers.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityItem, ActivityUpdate, CatalogItem, EventItem};
use crate::routes::city_from_request;
use crate::services::{NewActivity, NewEvent};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/cities/{city_key}/activities",
            get(list_items).post(create_activity),
        )
        .route("/cities/{city_key}/activities/enhance", post(enhance))
        .route("/cities/{city_key}/events", post(create_event))
        .route(
            "/activities/{id}",
            patch(update_activity).delete(delete_activity),
        )
        .route("/events/{id}", delete(delete_event))
}

// ─── Listing ─────────────────────────────────────────────────

/// Current catalog for a city. Any spelling of the city works.
async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(city_key): Path<String>,
) -> Result<Json<Vec<CatalogItem>>> {
    let city = city_from_request(&city_key)?;
    Ok(Json(state.catalog.list_items(&city).await?))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateActivityRequest {
    #[validate(length(min = 1, max = 120))]
    name: String,
    #[validate(length(max = 60))]
    category: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
}

async fn create_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(city_key): Path<String>,
    Json(body): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityItem>)> {
    body.validate()?;
    let city = city_from_request(&city_key)?;

    let item = state
        .catalog
        .create_item(
            &city,
            NewActivity {
                name: body.name,
                category: body.category,
                description: body.description,
            },
            user.user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Deserialize, Validate)]
struct UpdateActivityRequest {
    #[validate(length(min = 1, max = 120))]
    name: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
    /// Opt-in optimistic concurrency. Omit for last-writer-wins.
    expected_revision: Option<u64>,
}

async fn update_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateActivityRequest>,
) -> Result<Json<ActivityItem>> {
    body.validate()?;
    tracing::debug!(item_id = %id, user_id = user.user_id, "Updating activity");

    let item = state
        .catalog
        .update_item(
            &id,
            ActivityUpdate {
                name: body.name,
                description: body.description,
                expected_revision: body.expected_revision,
            },
        )
        .await?;

    Ok(Json(item))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    tracing::debug!(item_id = %id, user_id = user.user_id, "Deleting activity");
    state.catalog.delete_item(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Enhancement ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EnhanceResponse {
    pub added_count: usize,
}

/// Seed more activities from the generator. Never fails because of the
/// generator itself; a failed call adds nothing.
async fn enhance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(city_key): Path<String>,
) -> Result<Json<EnhanceResponse>> {
    let city = city_from_request(&city_key)?;
    let added_count = state.catalog.enhance_catalog(&city, user.user_id).await?;
    Ok(Json(EnhanceResponse { added_count }))
}

// ─── Events ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    date: NaiveDate,
    end_date: Option<NaiveDate>,
    #[validate(length(max = 200))]
    venue: Option<String>,
    #[validate(length(max = 300))]
    address: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(city_key): Path<String>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventItem>)> {
    body.validate()?;
    let city = city_from_request(&city_key)?;

    let event = state
        .catalog
        .create_event(
            &city,
            NewEvent {
                title: body.title,
                date: body.date,
                end_date: body.end_date,
                venue: body.venue,
                address: body.address,
                description: body.description,
            },
            user.user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    tracing::debug!(event_id = %id, user_id = user.user_id, "Deleting event");
    state.catalog.delete_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
