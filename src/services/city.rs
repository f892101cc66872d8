// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! City identity resolution.
//!
//! Free-text city names are normalized (trimmed, lower-cased, whitespace
//! collapsed) and then folded through a static alias table so that every
//! spelling of a metro area lands on one canonical key. Names not in the
//! table are their own key, so new cities work without configuration.
//!
//! Adding an alias means adding a string to [`METROS`]; nothing else changes.

use crate::models::CanonicalCity;

pub use crate::models::city::normalize;

/// A metro area and every raw name that should resolve to it.
#[derive(Debug)]
pub struct Metro {
    /// Canonical key. Must already be normalized.
    pub key: &'static str,
    pub display_name: &'static str,
    /// Two-letter state/region code
    pub state: &'static str,
    pub state_name: &'static str,
    pub country: &'static str,
    /// Normalized aliases, not including `key` itself.
    pub aliases: &'static [&'static str],
}

/// Known metro areas and their aliases.
pub static METROS: &[Metro] = &[
    Metro {
        key: "new york city",
        display_name: "New York City",
        state: "NY",
        state_name: "New York",
        country: "United States",
        aliases: &[
            "nyc",
            "new york",
            "new york, ny",
            "new york ny",
            "manhattan",
            "brooklyn",
            "queens",
            "the bronx",
            "bronx",
            "staten island",
        ],
    },
    Metro {
        key: "los angeles metro",
        display_name: "Los Angeles Metro",
        state: "CA",
        state_name: "California",
        country: "United States",
        aliases: &[
            "la",
            "l.a.",
            "los angeles",
            "los angeles, ca",
            "hollywood",
            "west hollywood",
            "santa monica",
            "venice beach",
            "pasadena",
            "long beach",
            "burbank",
            "culver city",
        ],
    },
    Metro {
        key: "san francisco bay area",
        display_name: "San Francisco Bay Area",
        state: "CA",
        state_name: "California",
        country: "United States",
        aliases: &[
            "sf",
            "san francisco",
            "san francisco, ca",
            "bay area",
            "oakland",
            "berkeley",
            "palo alto",
            "san jose",
            "mountain view",
        ],
    },
    Metro {
        key: "chicago metro",
        display_name: "Chicago Metro",
        state: "IL",
        state_name: "Illinois",
        country: "United States",
        aliases: &["chicago", "chi-town", "evanston", "oak park"],
    },
    Metro {
        key: "miami metro",
        display_name: "Miami Metro",
        state: "FL",
        state_name: "Florida",
        country: "United States",
        aliases: &[
            "miami",
            "miami beach",
            "south beach",
            "fort lauderdale",
            "coral gables",
        ],
    },
    Metro {
        key: "washington dc metro",
        display_name: "Washington DC Metro",
        state: "DC",
        state_name: "District of Columbia",
        country: "United States",
        aliases: &[
            "dc",
            "d.c.",
            "washington dc",
            "washington, dc",
            "washington d.c.",
            "arlington",
            "alexandria",
        ],
    },
];

/// Find the metro a normalized name belongs to.
pub fn find_metro(normalized: &str) -> Option<&'static Metro> {
    METROS
        .iter()
        .find(|m| m.key == normalized || m.aliases.contains(&normalized))
}

/// Resolve a raw city name to its canonical key.
///
/// Idempotent: `resolve(&resolve(x)) == resolve(x)`.
pub fn resolve(raw: &str) -> String {
    let normalized = normalize(raw);
    match find_metro(&normalized) {
        Some(metro) => metro.key.to_string(),
        None => normalized,
    }
}

/// Resolve a raw city name to a full [`CanonicalCity`].
///
/// Unknown cities keep the caller's spelling (whitespace collapsed) as the
/// display name and have no state or country.
pub fn resolve_city(raw: &str) -> CanonicalCity {
    let normalized = normalize(raw);
    match find_metro(&normalized) {
        Some(metro) => CanonicalCity {
            city_key: metro.key.to_string(),
            display_name: metro.display_name.to_string(),
            state: metro.state.to_string(),
            country: metro.country.to_string(),
        },
        None => CanonicalCity {
            city_key: normalized,
            display_name: raw.split_whitespace().collect::<Vec<_>>().join(" "),
            state: String::new(),
            country: String::new(),
        },
    }
}
