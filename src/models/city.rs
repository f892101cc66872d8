// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Canonical city record.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A city as grouped by the catalog. Stored in Firestore keyed by `city_key`.
///
/// Created the first time anyone touches the city's catalog and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CanonicalCity {
    /// Lower-cased, alias-resolved identity (also used as document ID)
    pub city_key: String,
    /// Human-readable name
    pub display_name: String,
    /// State or region; empty when unknown
    #[serde(default)]
    pub state: String,
    /// Country; empty when unknown
    #[serde(default)]
    pub country: String,
}

/// Trim, collapse inner whitespace and lower-case.
///
/// Shared by city keys and catalog name de-duplication so both fold the same
/// way.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_case_and_spacing() {
        assert_eq!(normalize("  Street   Food "), "street food");
        assert_eq!(normalize("\tNEW\nYork "), "new york");
        assert_eq!(normalize("   "), "");
    }
}
