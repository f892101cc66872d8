// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity/event catalog service.
//!
//! The catalog is a shared wiki: any authenticated user may create, edit or
//! delete any item, and there is no ownership check anywhere in this module.
//! Concurrent edits to one item resolve as last-writer-wins unless the caller
//! passes an expected revision.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::catalog::sort_catalog;
use crate::models::city::normalize;
use crate::models::{
    ActivityItem, ActivityUpdate, CanonicalCity, CatalogItem, EventItem, ItemType,
};
use crate::services::featured::is_featured;
use crate::services::generator::ActivityGenerator;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Per-city async locks, created on first use.
pub type CityLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

fn city_lock(locks: &CityLocks, city_key: &str) -> Arc<Mutex<()>> {
    locks
        .entry(city_key.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Fields for a new activity.
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Fields for a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// A known city with its featured flag.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CityListing {
    #[serde(flatten)]
    pub city: CanonicalCity,
    pub featured: bool,
}

impl From<CanonicalCity> for CityListing {
    fn from(city: CanonicalCity) -> Self {
        let featured = is_featured(&city.city_key, &city.display_name, &city.state);
        Self { city, featured }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    generator: ActivityGenerator,
    /// Serializes whole enhancement runs per city.
    enhance_locks: CityLocks,
    /// Held around activity inserts so enhancement's name check and insert
    /// see no interleaved create.
    insert_locks: CityLocks,
}

impl CatalogService {
    pub fn new(db: Database, generator: ActivityGenerator) -> Self {
        Self {
            db,
            generator,
            enhance_locks: Arc::new(DashMap::new()),
            insert_locks: Arc::new(DashMap::new()),
        }
    }

    /// Known cities, featured first, then by display name.
    pub async fn list_cities(&self) -> Result<Vec<CityListing>> {
        let mut cities: Vec<CityListing> = self
            .db
            .list_cities()
            .await?
            .into_iter()
            .map(CityListing::from)
            .collect();

        cities.sort_by(|a, b| {
            b.featured
                .cmp(&a.featured)
                .then_with(|| {
                    a.city
                        .display_name
                        .to_lowercase()
                        .cmp(&b.city.display_name.to_lowercase())
                })
                .then_with(|| a.city.city_key.cmp(&b.city.city_key))
        });
        Ok(cities)
    }

    /// Current catalog for a city: activities, then events.
    ///
    /// An unknown city has an empty catalog, not an error. Reading never
    /// registers the city; only writes do.
    pub async fn list_items(&self, city: &CanonicalCity) -> Result<Vec<CatalogItem>> {
        let (mut activities, mut events) = tokio::try_join!(
            self.db.list_activities(&city.city_key),
            self.db.list_events(&city.city_key),
        )?;
        sort_catalog(&mut activities, &mut events);

        Ok(activities
            .into_iter()
            .map(CatalogItem::Activity)
            .chain(events.into_iter().map(CatalogItem::Event))
            .collect())
    }

    /// Look up one item of a known kind.
    pub async fn get_item(&self, item_type: ItemType, id: &str) -> Result<Option<CatalogItem>> {
        Ok(match item_type {
            ItemType::Activity => self.db.get_activity(id).await?.map(CatalogItem::Activity),
            ItemType::Event => self.db.get_event(id).await?.map(CatalogItem::Event),
        })
    }

    /// Add an activity to a city's catalog.
    ///
    /// The creator is not auto-selected; callers that want that issue a
    /// separate select so either step can be retried alone.
    pub async fn create_item(
        &self,
        city: &CanonicalCity,
        new: NewActivity,
        created_by: u64,
    ) -> Result<ActivityItem> {
        require_text("name", &new.name)?;

        self.db.ensure_city(city).await?;
        let item = ActivityItem::new(
            &city.city_key,
            &new.name,
            new.category.as_deref(),
            new.description,
            created_by,
        );
        {
            let lock = city_lock(&self.insert_locks, &city.city_key);
            let _guard = lock.lock().await;
            self.db.insert_activities(std::slice::from_ref(&item)).await?;
        }

        tracing::info!(
            item_id = %item.id,
            city_key = %item.city_key,
            created_by,
            "Activity created"
        );
        Ok(item)
    }

    /// Edit an activity. Any authenticated caller may edit any item.
    pub async fn update_item(&self, id: &str, update: ActivityUpdate) -> Result<ActivityItem> {
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }

        let item = self.db.update_activity(id, &update).await?;
        tracing::info!(
            item_id = %item.id,
            revision = item.revision,
            "Activity updated"
        );
        Ok(item)
    }

    /// Delete an activity and every selection of it.
    pub async fn delete_item(&self, id: &str) -> Result<()> {
        let removed = self.db.delete_item_cascade(ItemType::Activity, id).await?;
        tracing::info!(item_id = id, selections_removed = removed, "Activity deleted");
        Ok(())
    }

    pub async fn create_event(
        &self,
        city: &CanonicalCity,
        new: NewEvent,
        organizer: u64,
    ) -> Result<EventItem> {
        require_text("title", &new.title)?;
        if new.end_date.is_some_and(|end| end < new.date) {
            return Err(AppError::Validation(
                "end_date must not be before date".to_string(),
            ));
        }

        self.db.ensure_city(city).await?;
        let event = EventItem {
            id: uuid::Uuid::new_v4().to_string(),
            city_key: city.city_key.clone(),
            title: new.title.trim().to_string(),
            date: new.date,
            end_date: new.end_date,
            venue: trimmed(new.venue),
            address: trimmed(new.address),
            organizer_user_id: organizer,
            description: trimmed(new.description),
            created_at: chrono::Utc::now(),
        };
        self.db.insert_event(&event).await?;

        tracing::info!(event_id = %event.id, city_key = %event.city_key, "Event created");
        Ok(event)
    }

    /// Delete an event and every selection of it.
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        let removed = self.db.delete_item_cascade(ItemType::Event, id).await?;
        tracing::info!(event_id = id, selections_removed = removed, "Event deleted");
        Ok(())
    }

    /// Seed a city's catalog from the activity generator.
    ///
    /// Candidates whose names already exist (case-insensitive) are skipped, so
    /// repeated calls never duplicate names. Generator failures and timeouts
    /// are logged and reported as zero additions.
    pub async fn enhance_catalog(&self, city: &CanonicalCity, requested_by: u64) -> Result<usize> {
        if !self.generator.is_enabled() {
            tracing::debug!(city_key = %city.city_key, "Activity generator disabled");
            return Ok(0);
        }

        let lock = city_lock(&self.enhance_locks, &city.city_key);
        let _guard = lock.lock().await;

        self.db.ensure_city(city).await?;
        let prompt_names: Vec<String> = self
            .existing_names(&city.city_key)
            .await?
            .into_iter()
            .map(|(_, name)| name)
            .collect();

        let candidates = match self.generator.generate(city, &prompt_names).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    city_key = %city.city_key,
                    error = %e,
                    "Activity generator failed, continuing without additions"
                );
                return Ok(0);
            }
        };

        // The generator call can take seconds and creates are not blocked
        // meanwhile. Dedupe against the catalog as it is now.
        let insert_lock = city_lock(&self.insert_locks, &city.city_key);
        let _insert_guard = insert_lock.lock().await;
        let mut seen: HashSet<String> = self
            .existing_names(&city.city_key)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        let additions: Vec<ActivityItem> = candidates
            .into_iter()
            .filter(|c| !c.name.trim().is_empty())
            .filter(|c| seen.insert(normalize(&c.name)))
            .map(|c| {
                ActivityItem::new(
                    &city.city_key,
                    &c.name,
                    c.category.as_deref(),
                    c.description,
                    requested_by,
                )
            })
            .collect();

        if !additions.is_empty() {
            self.db.insert_activities(&additions).await?;
        }

        tracing::info!(
            city_key = %city.city_key,
            added = additions.len(),
            "Catalog enhanced"
        );
        Ok(additions.len())
    }

    /// `(normalized, original)` names of every activity and event in a city.
    async fn existing_names(&self, city_key: &str) -> Result<Vec<(String, String)>> {
        let (activities, events) = tokio::try_join!(
            self.db.list_activities(city_key),
            self.db.list_events(city_key),
        )?;

        Ok(activities
            .into_iter()
            .map(|a| a.name)
            .chain(events.into_iter().map(|e| e.title))
            .map(|name| (normalize(&name), name))
            .collect())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InterestSelection;
    use crate::services::city::resolve_city;
    use crate::services::generator::GeneratedActivity;

    fn service_with(generator: ActivityGenerator) -> (CatalogService, Database) {
        let db = Database::in_memory();
        (CatalogService::new(db.clone(), generator), db)
    }

    fn activity(name: &str) -> NewActivity {
        NewActivity {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");

        for name in ["", "   ", "\t\n"] {
            let err = catalog.create_item(&city, activity(name), 1).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(catalog.list_items(&city).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_does_not_select() {
        let (catalog, db) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");

        catalog.create_item(&city, activity("Jazz"), 1).await.unwrap();

        assert!(db
            .list_selections_for_user(1, &city.city_key)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_anyone_can_edit() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");
        let item = catalog.create_item(&city, activity("Jazz"), 1).await.unwrap();

        // No caller identity is involved at all: edits are not owner-checked.
        let updated = catalog
            .update_item(
                &item.id,
                ActivityUpdate {
                    description: Some("Smalls, Mezzrow".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Jazz");
        assert_eq!(updated.description.as_deref(), Some("Smalls, Mezzrow"));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");
        let item = catalog.create_item(&city, activity("Jazz"), 1).await.unwrap();

        let err = catalog
            .update_item(
                &item.id,
                ActivityUpdate {
                    name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_selections() {
        let (catalog, db) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");
        let item = catalog.create_item(&city, activity("Jazz"), 1).await.unwrap();
        db.insert_selection(&InterestSelection::new(
            2,
            &item.id,
            ItemType::Activity,
            &city.city_key,
        ))
        .await
        .unwrap();

        catalog.delete_item(&item.id).await.unwrap();

        assert!(db
            .list_selections_for_city(&city.city_key)
            .await
            .unwrap()
            .is_empty());
        let again = catalog.delete_item(&item.id).await.unwrap_err();
        assert!(matches!(again, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_event_end_before_start_rejected() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");
        let new = NewEvent {
            title: "Marathon".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 31),
            venue: None,
            address: None,
            description: None,
        };

        let err = catalog.create_event(&city, new, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_listing_puts_activities_before_events() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        let city = resolve_city("NYC");
        catalog
            .create_event(
                &city,
                NewEvent {
                    title: "Marathon".to_string(),
                    date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
                    end_date: None,
                    venue: Some("Central Park".to_string()),
                    address: None,
                    description: None,
                },
                1,
            )
            .await
            .unwrap();
        catalog.create_item(&city, activity("Jazz"), 1).await.unwrap();

        let items = catalog.list_items(&city).await.unwrap();
        let kinds: Vec<ItemType> = items.iter().map(CatalogItem::item_type).collect();
        assert_eq!(kinds, vec![ItemType::Activity, ItemType::Event]);
    }

    #[tokio::test]
    async fn test_enhance_dedupes_case_insensitively() {
        let generator = ActivityGenerator::new_mock(vec![
            GeneratedActivity::named("surfing"),
            GeneratedActivity::named("Hiking"),
            GeneratedActivity::named("HIKING "),
            GeneratedActivity::named("   "),
        ]);
        let (catalog, _) = service_with(generator);
        let city = resolve_city("LA");
        catalog.create_item(&city, activity("Surfing"), 1).await.unwrap();

        let added = catalog.enhance_catalog(&city, 1).await.unwrap();
        assert_eq!(added, 1);

        let again = catalog.enhance_catalog(&city, 1).await.unwrap();
        assert_eq!(again, 0);
        assert_eq!(catalog.list_items(&city).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_enhance_survives_generator_failure() {
        let (catalog, _) = service_with(ActivityGenerator::new_mock_failure("boom"));
        let city = resolve_city("LA");

        assert_eq!(catalog.enhance_catalog(&city, 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_enhance_adds_each_name_once() {
        let generator = ActivityGenerator::new_mock(vec![
            GeneratedActivity::named("Surfing"),
            GeneratedActivity::named("Hiking"),
        ]);
        let (catalog, _) = service_with(generator);
        let city = resolve_city("LA");

        let (a, b) = tokio::join!(
            catalog.enhance_catalog(&city, 1),
            catalog.enhance_catalog(&city, 2)
        );

        assert_eq!(a.unwrap() + b.unwrap(), 2);
        assert_eq!(catalog.list_items(&city).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cities_listed_featured_first() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        for raw in ["Austin", "Chicago", "Brooklyn"] {
            catalog
                .create_item(&resolve_city(raw), activity("Coffee"), 1)
                .await
                .unwrap();
        }

        let keys: Vec<String> = catalog
            .list_cities()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.city.city_key)
            .collect();
        assert_eq!(keys, vec!["new york city", "austin", "chicago metro"]);
    }

    #[tokio::test]
    async fn test_city_order_ignores_case() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());
        for raw in ["Zurich", "boise", "Austin"] {
            catalog
                .create_item(&resolve_city(raw), activity("Coffee"), 1)
                .await
                .unwrap();
        }

        let names: Vec<String> = catalog
            .list_cities()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.city.display_name)
            .collect();
        assert_eq!(names, vec!["Austin", "boise", "Zurich"]);
    }

    #[tokio::test]
    async fn test_reading_a_catalog_does_not_register_the_city() {
        let (catalog, _) = service_with(ActivityGenerator::disabled());

        assert!(catalog
            .list_items(&resolve_city("Reno"))
            .await
            .unwrap()
            .is_empty());
        assert!(catalog.list_cities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enhance_skips_names_created_during_generation() {
        let generator = ActivityGenerator::new_mock_slow(
            vec![
                GeneratedActivity::named("Surfing"),
                GeneratedActivity::named("Tacos"),
            ],
            std::time::Duration::from_millis(300),
            std::time::Duration::from_secs(5),
        );
        let (catalog, _) = service_with(generator);
        let city = resolve_city("LA");

        let enhancing = {
            let catalog = catalog.clone();
            let city = city.clone();
            tokio::spawn(async move { catalog.enhance_catalog(&city, 1).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        catalog.create_item(&city, activity("surfing"), 2).await.unwrap();

        assert_eq!(enhancing.await.unwrap().unwrap(), 1);

        let mut names: Vec<String> = catalog
            .list_items(&city)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|item| match item {
                CatalogItem::Activity(a) => Some(a.name),
                CatalogItem::Event(_) => None,
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["Tacos", "surfing"]);
    }

    #[tokio::test]
    async fn test_enhance_skips_event_titles() {
        let generator = ActivityGenerator::new_mock(vec![GeneratedActivity::named("Rose Parade")]);
        let (catalog, _) = service_with(generator);
        let city = resolve_city("Pasadena");
        catalog
            .create_event(
                &city,
                NewEvent {
                    title: "rose parade".to_string(),
                    date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
                    end_date: None,
                    venue: None,
                    address: None,
                    description: None,
                },
                1,
            )
            .await
            .unwrap();

        assert_eq!(catalog.enhance_catalog(&city, 1).await.unwrap(), 0);
    }
}
