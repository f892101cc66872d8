// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest selection: the join between a user and a catalog item.

use crate::models::ItemType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A user's declared interest in one catalog item.
///
/// The document ID is derived from `(user_id, item_id)`, so the pair is unique
/// by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InterestSelection {
    pub id: String,
    pub user_id: u64,
    pub item_id: String,
    pub item_type: ItemType,
    pub city_key: String,
    pub created_at: DateTime<Utc>,
}

impl InterestSelection {
    pub fn new(user_id: u64, item_id: &str, item_type: ItemType, city_key: &str) -> Self {
        Self {
            id: Self::id_for(user_id, item_id),
            user_id,
            item_id: item_id.to_string(),
            item_type,
            city_key: city_key.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Deterministic ID for the unique `(user_id, item_id)` pair.
    pub fn id_for(user_id: u64, item_id: &str) -> String {
        format!("{}_{}", user_id, item_id)
    }
}

/// Order a user's selections oldest first.
pub fn sort_selections(selections: &mut [InterestSelection]) {
    selections.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
