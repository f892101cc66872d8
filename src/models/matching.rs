// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match results and the strength policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Coarse display tier derived from a shared-item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrength {
    Low,
    Medium,
    High,
}

/// Thresholds mapping a shared count to a [`MatchStrength`].
///
/// Policy constants, configurable through `MATCH_HIGH_THRESHOLD` and
/// `MATCH_MEDIUM_THRESHOLD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub high_threshold: usize,
    pub medium_threshold: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            high_threshold: 3,
            medium_threshold: 2,
        }
    }
}

impl MatchPolicy {
    /// Returns `None` unless `1 <= medium_threshold <= high_threshold`.
    pub fn new(high_threshold: usize, medium_threshold: usize) -> Option<Self> {
        (medium_threshold >= 1 && medium_threshold <= high_threshold).then_some(Self {
            high_threshold,
            medium_threshold,
        })
    }

    /// Classify a non-zero shared count.
    pub fn classify(&self, shared_count: usize) -> MatchStrength {
        if shared_count >= self.high_threshold {
            MatchStrength::High
        } else if shared_count >= self.medium_threshold {
            MatchStrength::Medium
        } else {
            MatchStrength::Low
        }
    }
}

/// One ranked candidate. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MatchResult {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub username: String,
    pub shared_item_ids: BTreeSet<String>,
    pub shared_count: usize,
    pub match_strength: MatchStrength,
    /// Display-only annotation from the connection graph.
    pub is_connected: bool,
}
