// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Featured-city classification for city pickers.
//!
//! Presentation only: featured cities sort first in listings. Matching never
//! looks at this.

use crate::services::city::{self, Metro};

/// Metros promoted in city selection, by canonical key.
pub const FEATURED_METROS: &[&str] = &[
    "new york city",
    "los angeles metro",
    "san francisco bay area",
    "miami metro",
];

/// Whether a city belongs to a promoted metro cluster.
///
/// The name must match: either `city_key` or `display_name` resolves to a
/// featured metro. State is checked leniently because many stored rows lack
/// it: a blank state passes, as does the expected state written either as its
/// code ("CA") or full name ("California"), in any case.
pub fn is_featured(city_key: &str, display_name: &str, state: &str) -> bool {
    let metro = [city_key, display_name]
        .into_iter()
        .map(city::resolve)
        .find_map(|key| featured_metro(&key));

    match metro {
        Some(metro) => state_matches(metro, state),
        None => false,
    }
}

fn featured_metro(key: &str) -> Option<&'static Metro> {
    if !FEATURED_METROS.contains(&key) {
        return None;
    }
    city::find_metro(key)
}

fn state_matches(metro: &Metro, state: &str) -> bool {
    let state = state.trim();
    state.is_empty()
        || state.eq_ignore_ascii_case(metro.state)
        || state.eq_ignore_ascii_case(metro.state_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_featured_by_key_or_display_name() {
        assert!(is_featured("new york city", "New York City", "NY"));
        assert!(is_featured("", "Manhattan", "NY"));
        assert!(is_featured("santa monica", "", "CA"));
    }

    #[test]
    fn test_missing_state_is_tolerated() {
        assert!(is_featured("los angeles metro", "Los Angeles Metro", ""));
        assert!(is_featured("los angeles metro", "Los Angeles Metro", "   "));
    }

    #[test]
    fn test_state_name_or_code_accepted() {
        assert!(is_featured("miami metro", "Miami", "florida"));
        assert!(is_featured("miami metro", "Miami", "fl"));
    }

    #[test]
    fn test_wrong_state_is_not_featured() {
        assert!(!is_featured("miami metro", "Miami", "OH"));
    }

    #[test]
    fn test_unlisted_cities_are_not_featured() {
        // Known metro, but not promoted
        assert!(!is_featured("chicago metro", "Chicago", "IL"));
        assert!(!is_featured("tulsa", "Tulsa", ""));
    }
}
