// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod city;
pub mod featured;
pub mod generator;
pub mod interests;
pub mod matching;

pub use catalog::{CatalogService, CityListing, NewActivity, NewEvent};
pub use generator::{ActivityGenerator, GeneratedActivity};
pub use interests::InterestService;
pub use matching::MatchService;
