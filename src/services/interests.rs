// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest selection service.
//!
//! Selecting is an upsert on the unique `(user_id, item_id)` pair: repeating a
//! select, or racing two of them, leaves exactly one row and returns it.

use crate::db::{Database, SelectionWrite};
use crate::error::{AppError, Result};
use crate::models::interest::sort_selections;
use crate::models::{CatalogItem, InterestSelection, ItemType};
use crate::services::CatalogService;

#[derive(Clone)]
pub struct InterestService {
    db: Database,
    catalog: CatalogService,
}

impl InterestService {
    pub fn new(db: Database, catalog: CatalogService) -> Self {
        Self { db, catalog }
    }

    /// Mark `user_id` as interested in an item.
    ///
    /// `city_key` must be the item's own city (already resolved by the caller).
    pub async fn select(
        &self,
        user_id: u64,
        item_id: &str,
        item_type: ItemType,
        city_key: &str,
    ) -> Result<SelectionWrite> {
        let item: CatalogItem = self
            .catalog
            .get_item(item_type, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", item_type, item_id)))?;

        if item.city_key() != city_key {
            return Err(AppError::Validation(format!(
                "{} {} belongs to {}, not {}",
                item_type,
                item_id,
                item.city_key(),
                city_key
            )));
        }

        let selection = InterestSelection::new(user_id, item_id, item_type, item.city_key());
        let write = self.db.insert_selection(&selection).await?;

        if write.created {
            tracing::info!(
                user_id,
                item_id,
                item_type = %item_type,
                city_key,
                "Interest selected"
            );
        } else {
            tracing::debug!(user_id, item_id, "Interest already selected");
        }
        Ok(write)
    }

    /// Remove a selection. Only its owner may do this.
    pub async fn deselect(&self, selection_id: &str, requesting_user_id: u64) -> Result<()> {
        let selection = self
            .db
            .get_selection(selection_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Selection {} not found", selection_id)))?;

        if selection.user_id != requesting_user_id {
            tracing::warn!(
                selection_id,
                owner = selection.user_id,
                requesting_user_id,
                "Blocked deselect by non-owner"
            );
            return Err(AppError::Forbidden(
                "Selection belongs to another user".to_string(),
            ));
        }

        if !self.db.delete_selection(selection_id).await? {
            // Removed concurrently (item cascade or a parallel deselect)
            return Err(AppError::NotFound(format!(
                "Selection {} not found",
                selection_id
            )));
        }

        tracing::info!(
            selection_id,
            user_id = requesting_user_id,
            "Interest deselected"
        );
        Ok(())
    }

    /// A user's selections in one city, oldest first.
    pub async fn list_for_user(&self, user_id: u64, city_key: &str) -> Result<Vec<InterestSelection>> {
        let mut selections = self.db.list_selections_for_user(user_id, city_key).await?;
        sort_selections(&mut selections);
        Ok(selections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::NewActivity;
    use crate::services::city::resolve_city;
    use crate::services::generator::ActivityGenerator;

    async fn setup() -> (InterestService, CatalogService, String) {
        let db = Database::in_memory();
        let catalog = CatalogService::new(db.clone(), ActivityGenerator::disabled());
        let item = catalog
            .create_item(
                &resolve_city("NYC"),
                NewActivity {
                    name: "Jazz".to_string(),
                    ..Default::default()
                },
                1,
            )
            .await
            .unwrap();
        (InterestService::new(db, catalog.clone()), catalog, item.id)
    }

    #[tokio::test]
    async fn test_select_is_idempotent() {
        let (interests, _, item_id) = setup().await;

        let first = interests
            .select(5, &item_id, ItemType::Activity, "new york city")
            .await
            .unwrap();
        let second = interests
            .select(5, &item_id, ItemType::Activity, "new york city")
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.selection.id, second.selection.id);
        assert_eq!(
            interests.list_for_user(5, "new york city").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_selects_collapse() {
        let (interests, _, item_id) = setup().await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let interests = interests.clone();
                let item_id = item_id.clone();
                tokio::spawn(async move {
                    interests
                        .select(5, &item_id, ItemType::Activity, "new york city")
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(
            interests.list_for_user(5, "new york city").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_select_unknown_item() {
        let (interests, _, _) = setup().await;

        let err = interests
            .select(5, "nope", ItemType::Activity, "new york city")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_select_wrong_city() {
        let (interests, _, item_id) = setup().await;

        let err = interests
            .select(5, &item_id, ItemType::Activity, "chicago metro")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_deselect_requires_owner() {
        let (interests, catalog, item_id) = setup().await;
        let write = interests
            .select(5, &item_id, ItemType::Activity, "new york city")
            .await
            .unwrap();

        let err = interests.deselect(&write.selection.id, 6).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        interests.deselect(&write.selection.id, 5).await.unwrap();
        assert!(interests
            .list_for_user(5, "new york city")
            .await
            .unwrap()
            .is_empty());

        // The item itself survives
        assert!(catalog
            .get_item(ItemType::Activity, &item_id)
            .await
            .unwrap()
            .is_some());

        let err = interests.deselect(&write.selection.id, 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
