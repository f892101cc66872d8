// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod catalog;
pub mod city;
pub mod interest;
pub mod matching;
pub mod user;

pub use catalog::{ActivityItem, ActivityUpdate, CatalogItem, EventItem, ItemType};
pub use city::CanonicalCity;
pub use interest::InterestSelection;
pub use matching::{MatchPolicy, MatchResult, MatchStrength};
pub use user::{Connection, UserProfile};
