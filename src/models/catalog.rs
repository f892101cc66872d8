// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community-editable catalog items: activities and events.
//!
//! Items have no owner after creation. Any authenticated user may edit or
//! delete them, and concurrent edits resolve as last-writer-wins.

use crate::models::city::normalize;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Category assigned when a creator does not pick one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Kind of catalog item a selection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Activity,
    Event,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Activity => f.write_str("activity"),
            ItemType::Event => f.write_str("event"),
        }
    }
}

/// Stored activity record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityItem {
    /// UUID (also used as document ID)
    pub id: String,
    pub city_key: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by_user_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every update; compared only when the caller asks for it.
    #[serde(default = "first_revision")]
    pub revision: u64,
}

fn first_revision() -> u64 {
    1
}

impl ActivityItem {
    pub fn new(
        city_key: &str,
        name: &str,
        category: Option<&str>,
        description: Option<String>,
        created_by_user_id: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            city_key: city_key.to_string(),
            name: name.trim().to_string(),
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            description: normalize_description(description),
            created_by_user_id,
            created_at: now,
            updated_at: now,
            revision: first_revision(),
        }
    }

    /// Apply a partial edit in place. The caller has already validated `name`.
    pub fn apply_update(&mut self, update: &ActivityUpdate) {
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = &update.description {
            self.description = normalize_description(Some(description.clone()));
        }
        self.updated_at = Utc::now();
        self.revision += 1;
    }

    /// Case-insensitive name key used for de-duplication.
    pub fn name_key(&self) -> String {
        normalize(&self.name)
    }
}

/// Partial edit of an activity.
#[derive(Debug, Clone, Default)]
pub struct ActivityUpdate {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    /// Opt-in optimistic versioning; `None` means last-writer-wins.
    pub expected_revision: Option<u64>,
}

/// Stored event record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventItem {
    /// UUID (also used as document ID)
    pub id: String,
    pub city_key: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub organizer_user_id: u64,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Either kind of catalog entry, as returned by catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "item_type", rename_all = "lowercase")]
pub enum CatalogItem {
    Activity(ActivityItem),
    Event(EventItem),
}

impl CatalogItem {
    pub fn id(&self) -> &str {
        match self {
            CatalogItem::Activity(a) => &a.id,
            CatalogItem::Event(e) => &e.id,
        }
    }

    pub fn city_key(&self) -> &str {
        match self {
            CatalogItem::Activity(a) => &a.city_key,
            CatalogItem::Event(e) => &e.city_key,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            CatalogItem::Activity(_) => ItemType::Activity,
            CatalogItem::Event(_) => ItemType::Event,
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Catalog listing order: activities oldest first, then events by date.
/// Ties fall back to the ID so the order is total.
pub fn sort_catalog(activities: &mut [ActivityItem], events: &mut [EventItem]) {
    activities.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}
