// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Cities (canonical city records)
//! - Activity and event items (the shared catalog)
//! - Interest selections (user/item join collection)
//! - Users and connections (read-mostly collaborator data)
//!
//! Selection documents are keyed by `{user_id}_{item_id}`, so Firestore's
//! document-ID uniqueness acts as the unique index on that pair.
//!
//! Selecting, cascading deletes and revision-checked edits read through a
//! transaction-bound client, so Firestore detects a concurrent write to
//! anything they read and the commit fails instead of leaving an orphan or a
//! lost update.

use crate::db::collections;
use crate::db::SelectionWrite;
use crate::error::AppError;
use crate::models::{
    ActivityItem, ActivityUpdate, CanonicalCity, Connection, EventItem, InterestSelection,
    ItemType, UserProfile,
};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreTransaction};
use futures_util::{stream, StreamExt};
use std::collections::{HashMap, HashSet};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;
/// Commits that fail under contention are retried this many times in total.
const MAX_TXN_ATTEMPTS: usize = 3;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// A client whose reads run inside `transaction`.
    fn reader_for(&self, transaction: &FirestoreTransaction<'_>) -> firestore::FirestoreDb {
        self.client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ))
    }

    async fn begin(&self) -> Result<FirestoreTransaction<'_>, AppError> {
        self.client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    // ─── City Operations ─────────────────────────────────────────

    /// Create the city document if it does not exist yet.
    pub async fn ensure_city(&self, city: &CanonicalCity) -> Result<(), AppError> {
        let existing: Option<CanonicalCity> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::CITIES)
            .obj()
            .one(&city.city_key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        let result: Result<CanonicalCity, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::CITIES)
            .document_id(&city.city_key)
            .object(city)
            .execute()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(city_key = %city.city_key, "City created");
                Ok(())
            }
            // Another request got there first
            Err(FirestoreError::DataConflictError(_)) => Ok(()),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    pub async fn list_cities(&self) -> Result<Vec<CanonicalCity>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::CITIES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn get_activity(&self, id: &str) -> Result<Option<ActivityItem>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITY_ITEMS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_activities(&self, city_key: &str) -> Result<Vec<ActivityItem>, AppError> {
        let city_key = city_key.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::ACTIVITY_ITEMS)
            .filter(move |q| q.for_all([q.field("city_key").eq(city_key.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store several new activities.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn insert_activities(&self, items: &[ActivityItem]) -> Result<(), AppError> {
        let client = &self.client;

        stream::iter(items.to_vec())
            .map(|item| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::ACTIVITY_ITEMS)
                    .document_id(&item.id)
                    .object(&item)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Read-modify-write of an activity inside a transaction.
    ///
    /// Without `expected_revision` the last writer wins: a commit that loses
    /// a race is retried against the fresh document. With it, losing the race
    /// is a conflict.
    pub async fn update_activity(
        &self,
        id: &str,
        update: &ActivityUpdate,
    ) -> Result<ActivityItem, AppError> {
        for attempt in 1..=MAX_TXN_ATTEMPTS {
            let mut transaction = self.begin().await?;
            let reader = self.reader_for(&transaction);

            let current: Option<ActivityItem> = reader
                .fluent()
                .select()
                .by_id_in(collections::ACTIVITY_ITEMS)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let Some(mut item) = current else {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Activity {} not found", id)));
            };

            if let Some(expected) = update.expected_revision {
                if expected != item.revision {
                    let _ = transaction.rollback().await;
                    return Err(AppError::Conflict(format!(
                        "Activity {} is at revision {}, expected {}",
                        id, item.revision, expected
                    )));
                }
            }

            item.apply_update(update);

            self.client
                .fluent()
                .update()
                .in_col(collections::ACTIVITY_ITEMS)
                .document_id(&item.id)
                .object(&item)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add update to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(item),
                Err(e) if update.expected_revision.is_some() => {
                    tracing::debug!(item_id = id, error = %e, "Revision-checked update lost a race");
                    return Err(AppError::Conflict(format!(
                        "Activity {} was modified concurrently",
                        id
                    )));
                }
                Err(e) => {
                    tracing::warn!(item_id = id, attempt, error = %e, "Update commit failed, retrying");
                }
            }
        }

        Err(AppError::Database(format!(
            "Update of activity {} failed after {} attempts",
            id, MAX_TXN_ATTEMPTS
        )))
    }

    // ─── Event Operations ────────────────────────────────────────

    pub async fn get_event(&self, id: &str) -> Result<Option<EventItem>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::EVENT_ITEMS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_events(&self, city_key: &str) -> Result<Vec<EventItem>, AppError> {
        let city_key = city_key.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::EVENT_ITEMS)
            .filter(move |q| q.for_all([q.field("city_key").eq(city_key.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn insert_event(&self, event: &EventItem) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::EVENT_ITEMS)
            .document_id(&event.id)
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Cascading Delete ────────────────────────────────────────

    /// Delete an item together with every selection that references it.
    ///
    /// Each pass reads the item and its selections inside a transaction.
    /// When the remaining selections fit in one transaction they are deleted
    /// together with the item; otherwise a full batch of selections is
    /// deleted and the pass repeats. A reader may briefly see the item with
    /// fewer selections, never a selection without its item.
    pub async fn delete_item_cascade(
        &self,
        item_type: ItemType,
        id: &str,
    ) -> Result<usize, AppError> {
        let collection = match item_type {
            ItemType::Activity => collections::ACTIVITY_ITEMS,
            ItemType::Event => collections::EVENT_ITEMS,
        };

        let mut removed = 0;
        let mut failed_commits = 0;
        loop {
            let mut transaction = self.begin().await?;
            let reader = self.reader_for(&transaction);

            if !Self::item_exists_in(&reader, item_type, id).await? {
                let _ = transaction.rollback().await;
                if removed == 0 {
                    return Err(AppError::NotFound(format!("{} {} not found", item_type, id)));
                }
                // Deleted by someone else between our passes
                return Ok(removed);
            }

            let item_id = id.to_string();
            let selections: Vec<InterestSelection> = reader
                .fluent()
                .select()
                .from(collections::INTEREST_SELECTIONS)
                .filter(move |q| q.for_all([q.field("item_id").eq(item_id.clone())]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            // Reserve one write for the item itself on the final pass.
            let final_pass = selections.len() < BATCH_SIZE;
            let batch = if final_pass {
                &selections[..]
            } else {
                &selections[..BATCH_SIZE]
            };

            for selection in batch {
                self.client
                    .fluent()
                    .delete()
                    .from(collections::INTEREST_SELECTIONS)
                    .document_id(&selection.id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add selection deletion to transaction: {}",
                            e
                        ))
                    })?;
            }

            if final_pass {
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add item deletion to transaction: {}",
                            e
                        ))
                    })?;
            }

            match transaction.commit().await {
                Ok(_) => {
                    removed += batch.len();
                    failed_commits = 0;
                    if final_pass {
                        break;
                    }
                }
                Err(e) => {
                    failed_commits += 1;
                    if failed_commits >= MAX_TXN_ATTEMPTS {
                        return Err(AppError::Database(format!(
                            "Transaction commit failed: {}",
                            e
                        )));
                    }
                    tracing::warn!(item_id = id, error = %e, "Cascade commit failed, retrying");
                }
            }
        }

        tracing::info!(
            item_id = id,
            item_type = %item_type,
            selections_removed = removed,
            "Catalog item deleted"
        );

        Ok(removed)
    }

    // ─── Interest Selection Operations ───────────────────────────

    pub async fn get_selection(&self, id: &str) -> Result<Option<InterestSelection>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::INTEREST_SELECTIONS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn item_exists_in(
        reader: &firestore::FirestoreDb,
        item_type: ItemType,
        id: &str,
    ) -> Result<bool, AppError> {
        let found = match item_type {
            ItemType::Activity => reader
                .fluent()
                .select()
                .by_id_in(collections::ACTIVITY_ITEMS)
                .obj::<ActivityItem>()
                .one(id)
                .await
                .map(|item| item.is_some()),
            ItemType::Event => reader
                .fluent()
                .select()
                .by_id_in(collections::EVENT_ITEMS)
                .obj::<EventItem>()
                .one(id)
                .await
                .map(|item| item.is_some()),
        };
        found.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a selection unless the pair already has one.
    ///
    /// The item and the selection slot are both read inside the transaction
    /// that writes the selection. A concurrent item delete or a concurrent
    /// select of the same pair makes the commit fail, and the next attempt
    /// sees the winner's outcome.
    pub async fn insert_selection(
        &self,
        selection: &InterestSelection,
    ) -> Result<SelectionWrite, AppError> {
        for attempt in 1..=MAX_TXN_ATTEMPTS {
            let mut transaction = self.begin().await?;
            let reader = self.reader_for(&transaction);

            if !Self::item_exists_in(&reader, selection.item_type, &selection.item_id).await? {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!(
                    "{} {} not found",
                    selection.item_type, selection.item_id
                )));
            }

            let existing: Option<InterestSelection> = reader
                .fluent()
                .select()
                .by_id_in(collections::INTEREST_SELECTIONS)
                .obj()
                .one(&selection.id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            if let Some(existing) = existing {
                let _ = transaction.rollback().await;
                tracing::debug!(
                    selection_id = %selection.id,
                    "Selection already exists (idempotent)"
                );
                return Ok(SelectionWrite {
                    selection: existing,
                    created: false,
                });
            }

            self.client
                .fluent()
                .update()
                .in_col(collections::INTEREST_SELECTIONS)
                .document_id(&selection.id)
                .object(selection)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add selection to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => {
                    return Ok(SelectionWrite {
                        selection: selection.clone(),
                        created: true,
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        selection_id = %selection.id,
                        attempt,
                        error = %e,
                        "Selection commit failed, retrying"
                    );
                }
            }
        }

        Err(AppError::Database(format!(
            "Selection {} failed after {} attempts",
            selection.id, MAX_TXN_ATTEMPTS
        )))
    }

    pub async fn delete_selection(&self, id: &str) -> Result<bool, AppError> {
        if self.get_selection(id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .fluent()
            .delete()
            .from(collections::INTEREST_SELECTIONS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    pub async fn list_selections_for_user(
        &self,
        user_id: u64,
        city_key: &str,
    ) -> Result<Vec<InterestSelection>, AppError> {
        let city_key = city_key.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::INTEREST_SELECTIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("city_key").eq(city_key.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_selections_for_city(
        &self,
        city_key: &str,
    ) -> Result<Vec<InterestSelection>, AppError> {
        let city_key = city_key.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::INTEREST_SELECTIONS)
            .filter(move |q| q.for_all([q.field("city_key").eq(city_key.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User & Connection Operations ────────────────────────────

    pub async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(profile.user_id.to_string())
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch profiles concurrently, bounded by `MAX_CONCURRENT_DB_OPS`.
    pub async fn get_usernames(&self, user_ids: &[u64]) -> Result<HashMap<u64, String>, AppError> {
        let client = &self.client;

        let profiles = stream::iter(user_ids.to_vec())
            .map(|user_id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj::<UserProfile>()
                    .one(&user_id.to_string())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<UserProfile>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(profiles
            .into_iter()
            .flatten()
            .map(|p| (p.user_id, p.username))
            .collect())
    }

    pub async fn add_connection(&self, a: u64, b: u64) -> Result<(), AppError> {
        for (from, to) in [(a, b), (b, a)] {
            let edge = Connection {
                user_id: from,
                connected_user_id: to,
            };
            let _: () = self
                .client
                .fluent()
                .update()
                .in_col(collections::CONNECTIONS)
                .document_id(format!("{}_{}", from, to))
                .object(&edge)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn get_connections(&self, user_id: u64) -> Result<HashSet<u64>, AppError> {
        let edges: Vec<Connection> = self
            .client
            .fluent()
            .select()
            .from(collections::CONNECTIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(edges.into_iter().map(|e| e.connected_user_id).collect())
    }
}
