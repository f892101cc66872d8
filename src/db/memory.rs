// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local storage backend.
//!
//! Every table sits behind one async `RwLock`. Each mutation, including the
//! cascading item delete, runs under a single write guard, so readers see
//! either all of a change or none of it.
//!
//! Rows are partitioned by city, and the ID indexes below point into the
//! partitions. City-scoped reads touch only their own city.

use crate::error::AppError;
use crate::models::{
    ActivityItem, ActivityUpdate, CanonicalCity, EventItem, InterestSelection, ItemType,
    UserProfile,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::SelectionWrite;

/// Rows belonging to one city.
#[derive(Default)]
struct CityTables {
    activities: HashMap<String, ActivityItem>,
    events: HashMap<String, EventItem>,
    /// Keyed by the deterministic selection ID, which doubles as the
    /// `(user_id, item_id)` unique index.
    selections: HashMap<String, InterestSelection>,
}

#[derive(Default)]
struct Tables {
    cities: BTreeMap<String, CanonicalCity>,
    by_city: HashMap<String, CityTables>,
    /// Item ID to owning city key.
    item_city: HashMap<String, String>,
    /// Selection ID to city key.
    selection_city: HashMap<String, String>,
    /// Item ID to the IDs of selections referencing it.
    item_selections: HashMap<String, HashSet<String>>,
    users: HashMap<u64, UserProfile>,
    /// Adjacency sets, stored in both directions.
    connections: HashMap<u64, HashSet<u64>>,
}

impl Tables {
    fn city_of(&self, item_id: &str) -> Option<&CityTables> {
        self.item_city
            .get(item_id)
            .and_then(|city_key| self.by_city.get(city_key))
    }

    fn item_exists(&self, item_type: ItemType, id: &str) -> bool {
        self.city_of(id).is_some_and(|city| match item_type {
            ItemType::Activity => city.activities.contains_key(id),
            ItemType::Event => city.events.contains_key(id),
        })
    }
}

/// In-memory database. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure_city(&self, city: &CanonicalCity) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables
            .cities
            .entry(city.city_key.clone())
            .or_insert_with(|| city.clone());
        Ok(())
    }

    pub async fn list_cities(&self) -> Result<Vec<CanonicalCity>, AppError> {
        Ok(self.tables.read().await.cities.values().cloned().collect())
    }

    pub async fn get_activity(&self, id: &str) -> Result<Option<ActivityItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .city_of(id)
            .and_then(|city| city.activities.get(id))
            .cloned())
    }

    pub async fn list_activities(&self, city_key: &str) -> Result<Vec<ActivityItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_city
            .get(city_key)
            .map(|city| city.activities.values().cloned().collect())
            .unwrap_or_default())
    }

    pub async fn insert_activities(&self, items: &[ActivityItem]) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        for item in items {
            tables
                .item_city
                .insert(item.id.clone(), item.city_key.clone());
            tables
                .by_city
                .entry(item.city_key.clone())
                .or_default()
                .activities
                .insert(item.id.clone(), item.clone());
        }
        Ok(())
    }

    pub async fn update_activity(
        &self,
        id: &str,
        update: &ActivityUpdate,
    ) -> Result<ActivityItem, AppError> {
        let mut tables = self.tables.write().await;
        let city_key = tables.item_city.get(id).cloned();
        let item = city_key
            .and_then(|key| tables.by_city.get_mut(&key))
            .and_then(|city| city.activities.get_mut(id))
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))?;

        if let Some(expected) = update.expected_revision {
            if expected != item.revision {
                return Err(AppError::Conflict(format!(
                    "Activity {} is at revision {}, expected {}",
                    id, item.revision, expected
                )));
            }
        }

        item.apply_update(update);
        Ok(item.clone())
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<EventItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .city_of(id)
            .and_then(|city| city.events.get(id))
            .cloned())
    }

    pub async fn list_events(&self, city_key: &str) -> Result<Vec<EventItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_city
            .get(city_key)
            .map(|city| city.events.values().cloned().collect())
            .unwrap_or_default())
    }

    pub async fn insert_event(&self, event: &EventItem) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables
            .item_city
            .insert(event.id.clone(), event.city_key.clone());
        tables
            .by_city
            .entry(event.city_key.clone())
            .or_default()
            .events
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    pub async fn delete_item_cascade(
        &self,
        item_type: ItemType,
        id: &str,
    ) -> Result<usize, AppError> {
        let mut tables = self.tables.write().await;
        let not_found = || AppError::NotFound(format!("{} {} not found", item_type, id));

        if !tables.item_exists(item_type, id) {
            return Err(not_found());
        }
        let city_key = tables.item_city.remove(id).ok_or_else(not_found)?;
        let selection_ids = tables.item_selections.remove(id).unwrap_or_default();

        let Tables {
            by_city,
            selection_city,
            ..
        } = &mut *tables;
        let removed = by_city.get_mut(&city_key).and_then(|city| match item_type {
            ItemType::Activity => city.activities.remove(id).map(|_| ()),
            ItemType::Event => city.events.remove(id).map(|_| ()),
        });
        removed.ok_or_else(not_found)?;

        for selection_id in &selection_ids {
            if let Some(key) = selection_city.remove(selection_id) {
                if let Some(city) = by_city.get_mut(&key) {
                    city.selections.remove(selection_id);
                }
            }
        }
        Ok(selection_ids.len())
    }

    pub async fn get_selection(&self, id: &str) -> Result<Option<InterestSelection>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .selection_city
            .get(id)
            .and_then(|city_key| tables.by_city.get(city_key))
            .and_then(|city| city.selections.get(id))
            .cloned())
    }

    pub async fn insert_selection(
        &self,
        selection: &InterestSelection,
    ) -> Result<SelectionWrite, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.item_exists(selection.item_type, &selection.item_id) {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                selection.item_type, selection.item_id
            )));
        }

        let existing = tables
            .selection_city
            .get(&selection.id)
            .and_then(|city_key| tables.by_city.get(city_key))
            .and_then(|city| city.selections.get(&selection.id));
        if let Some(existing) = existing {
            return Ok(SelectionWrite {
                selection: existing.clone(),
                created: false,
            });
        }

        tables
            .selection_city
            .insert(selection.id.clone(), selection.city_key.clone());
        tables
            .item_selections
            .entry(selection.item_id.clone())
            .or_default()
            .insert(selection.id.clone());
        tables
            .by_city
            .entry(selection.city_key.clone())
            .or_default()
            .selections
            .insert(selection.id.clone(), selection.clone());
        Ok(SelectionWrite {
            selection: selection.clone(),
            created: true,
        })
    }

    pub async fn delete_selection(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let Some(city_key) = tables.selection_city.remove(id) else {
            return Ok(false);
        };

        let removed = tables
            .by_city
            .get_mut(&city_key)
            .and_then(|city| city.selections.remove(id));
        if let Some(selection) = &removed {
            if let Some(ids) = tables.item_selections.get_mut(&selection.item_id) {
                ids.remove(id);
            }
        }
        Ok(removed.is_some())
    }

    pub async fn list_selections_for_user(
        &self,
        user_id: u64,
        city_key: &str,
    ) -> Result<Vec<InterestSelection>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_city
            .get(city_key)
            .map(|city| {
                city.selections
                    .values()
                    .filter(|s| s.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn list_selections_for_city(
        &self,
        city_key: &str,
    ) -> Result<Vec<InterestSelection>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_city
            .get(city_key)
            .map(|city| city.selections.values().cloned().collect())
            .unwrap_or_default())
    }

    pub async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .users
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    pub async fn get_usernames(&self, user_ids: &[u64]) -> Result<HashMap<u64, String>, AppError> {
        let tables = self.tables.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|p| (*id, p.username.clone())))
            .collect())
    }

    pub async fn add_connection(&self, a: u64, b: u64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.connections.entry(a).or_default().insert(b);
        tables.connections.entry(b).or_default().insert(a);
        Ok(())
    }

    pub async fn get_connections(&self, user_id: u64) -> Result<HashSet<u64>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .connections
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}
