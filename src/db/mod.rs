// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] is the handle the services hold. It dispatches to Firestore in
//! production and to process-local tables for development and tests. Both
//! backends enforce the same rules:
//! - at most one selection per `(user_id, item_id)`, with a duplicate insert
//!   returning the stored row
//! - deleting a catalog item removes every selection that references it
//! - a selection is never left pointing at a missing item

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    ActivityItem, ActivityUpdate, CanonicalCity, EventItem, InterestSelection, ItemType,
    UserProfile,
};
use std::collections::{HashMap, HashSet};

/// Collection names as constants.
pub mod collections {
    pub const CITIES: &str = "cities";
    pub const ACTIVITY_ITEMS: &str = "activity_items";
    pub const EVENT_ITEMS: &str = "event_items";
    /// Keyed by `{user_id}_{item_id}`
    pub const INTEREST_SELECTIONS: &str = "interest_selections";
    pub const USERS: &str = "users";
    pub const CONNECTIONS: &str = "connections";
}

/// Outcome of an idempotent selection insert.
#[derive(Debug, Clone)]
pub struct SelectionWrite {
    pub selection: InterestSelection,
    /// `false` when the pair was already selected and the stored row is returned.
    pub created: bool,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

macro_rules! dispatch {
    ($self:ident, $db:ident => $call:expr) => {
        match &$self.backend {
            Backend::Firestore($db) => $call,
            Backend::Memory($db) => $call,
        }
    };
}

/// Storage handle shared by all services.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to Firestore for the given project.
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreDb::new(project_id).await?),
        })
    }

    /// Fresh, empty process-local storage.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryDb::new()),
        }
    }

    // ─── Cities ──────────────────────────────────────────────────

    /// Record a city the first time it is seen. Existing rows are left alone.
    pub async fn ensure_city(&self, city: &CanonicalCity) -> Result<(), AppError> {
        dispatch!(self, db => db.ensure_city(city).await)
    }

    pub async fn list_cities(&self) -> Result<Vec<CanonicalCity>, AppError> {
        dispatch!(self, db => db.list_cities().await)
    }

    // ─── Activities ──────────────────────────────────────────────

    pub async fn get_activity(&self, id: &str) -> Result<Option<ActivityItem>, AppError> {
        dispatch!(self, db => db.get_activity(id).await)
    }

    pub async fn list_activities(&self, city_key: &str) -> Result<Vec<ActivityItem>, AppError> {
        dispatch!(self, db => db.list_activities(city_key).await)
    }

    pub async fn insert_activities(&self, items: &[ActivityItem]) -> Result<(), AppError> {
        dispatch!(self, db => db.insert_activities(items).await)
    }

    /// Apply a partial edit. Fails with `NotFound` for an unknown id and with
    /// `Conflict` when `expected_revision` is set and stale.
    pub async fn update_activity(
        &self,
        id: &str,
        update: &ActivityUpdate,
    ) -> Result<ActivityItem, AppError> {
        dispatch!(self, db => db.update_activity(id, update).await)
    }

    // ─── Events ──────────────────────────────────────────────────

    pub async fn get_event(&self, id: &str) -> Result<Option<EventItem>, AppError> {
        dispatch!(self, db => db.get_event(id).await)
    }

    pub async fn list_events(&self, city_key: &str) -> Result<Vec<EventItem>, AppError> {
        dispatch!(self, db => db.list_events(city_key).await)
    }

    pub async fn insert_event(&self, event: &EventItem) -> Result<(), AppError> {
        dispatch!(self, db => db.insert_event(event).await)
    }

    // ─── Cascading Delete ────────────────────────────────────────

    /// Delete a catalog item and all selections referencing it.
    ///
    /// Returns the number of selections removed, or `NotFound`.
    pub async fn delete_item_cascade(
        &self,
        item_type: ItemType,
        id: &str,
    ) -> Result<usize, AppError> {
        dispatch!(self, db => db.delete_item_cascade(item_type, id).await)
    }

    // ─── Interest Selections ─────────────────────────────────────

    pub async fn get_selection(&self, id: &str) -> Result<Option<InterestSelection>, AppError> {
        dispatch!(self, db => db.get_selection(id).await)
    }

    /// Insert keyed by the unique `(user_id, item_id)` pair. A concurrent or
    /// repeated insert returns the stored row with `created = false`.
    /// Fails with `NotFound` if the referenced item does not exist.
    pub async fn insert_selection(
        &self,
        selection: &InterestSelection,
    ) -> Result<SelectionWrite, AppError> {
        dispatch!(self, db => db.insert_selection(selection).await)
    }

    /// Returns `false` if there was nothing to delete.
    pub async fn delete_selection(&self, id: &str) -> Result<bool, AppError> {
        dispatch!(self, db => db.delete_selection(id).await)
    }

    pub async fn list_selections_for_user(
        &self,
        user_id: u64,
        city_key: &str,
    ) -> Result<Vec<InterestSelection>, AppError> {
        dispatch!(self, db => db.list_selections_for_user(user_id, city_key).await)
    }

    pub async fn list_selections_for_city(
        &self,
        city_key: &str,
    ) -> Result<Vec<InterestSelection>, AppError> {
        dispatch!(self, db => db.list_selections_for_city(city_key).await)
    }

    // ─── Collaborator Data ───────────────────────────────────────

    pub async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        dispatch!(self, db => db.upsert_user_profile(profile).await)
    }

    /// Usernames for the given ids. Ids without a profile are absent.
    pub async fn get_usernames(&self, user_ids: &[u64]) -> Result<HashMap<u64, String>, AppError> {
        dispatch!(self, db => db.get_usernames(user_ids).await)
    }

    /// Store a connection in both directions.
    pub async fn add_connection(&self, a: u64, b: u64) -> Result<(), AppError> {
        dispatch!(self, db => db.add_connection(a, b).await)
    }

    pub async fn get_connections(&self, user_id: u64) -> Result<HashSet<u64>, AppError> {
        dispatch!(self, db => db.get_connections(user_id).await)
    }
}
