// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest-Match: city-scoped shared-interest matching
//!
//! This crate provides the backend API for a community-edited catalog of
//! activities and events per city, per-user interest selections, and ranking
//! of users who share those interests.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use services::{ActivityGenerator, CatalogService, InterestService, MatchService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub catalog: CatalogService,
    pub interests: InterestService,
    pub matches: MatchService,
}

impl AppState {
    /// Wire the services together over one database handle.
    pub fn new(config: Config, db: Database, generator: ActivityGenerator) -> Self {
        let catalog = CatalogService::new(db.clone(), generator);
        let interests = InterestService::new(db.clone(), catalog.clone());
        let matches = MatchService::new(db.clone(), config.match_policy);

        Self {
            config,
            db,
            catalog,
            interests,
            matches,
        }
    }
}
