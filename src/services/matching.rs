// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-interest match engine.
//!
//! For a user and a city, every other user with at least one selection in
//! common is a match. The work is scoped to one city's selections, so a query
//! costs O(selections in that city) regardless of the total user count.
//!
//! Ranking: shared count descending, then username ascending, then user ID,
//! which makes the order total and repeatable for fixed data.

use crate::db::Database;
use crate::error::Result;
use crate::models::{InterestSelection, MatchPolicy, MatchResult, UserProfile};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Items `user_id` shares with each other user, keyed by that user.
///
/// Users with no overlap and `user_id` itself are absent.
pub fn find_overlaps(
    user_id: u64,
    selections: &[InterestSelection],
) -> BTreeMap<u64, BTreeSet<String>> {
    let own: HashSet<&str> = selections
        .iter()
        .filter(|s| s.user_id == user_id)
        .map(|s| s.item_id.as_str())
        .collect();

    let mut overlaps: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
    if own.is_empty() {
        return overlaps;
    }

    for selection in selections {
        if selection.user_id == user_id || !own.contains(selection.item_id.as_str()) {
            continue;
        }
        overlaps
            .entry(selection.user_id)
            .or_default()
            .insert(selection.item_id.clone());
    }
    overlaps
}

/// Turn overlaps into ranked, labelled results.
///
/// `connections` only sets `is_connected`; it never changes the order.
pub fn rank_matches(
    overlaps: BTreeMap<u64, BTreeSet<String>>,
    usernames: &HashMap<u64, String>,
    connections: &HashSet<u64>,
    policy: &MatchPolicy,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = overlaps
        .into_iter()
        .filter(|(_, shared)| !shared.is_empty())
        .map(|(user_id, shared)| {
            let shared_count = shared.len();
            MatchResult {
                user_id,
                username: usernames
                    .get(&user_id)
                    .cloned()
                    .unwrap_or_else(|| UserProfile::fallback_username(user_id)),
                shared_item_ids: shared,
                shared_count,
                match_strength: policy.classify(shared_count),
                is_connected: connections.contains(&user_id),
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.shared_count
            .cmp(&a.shared_count)
            .then_with(|| a.username.cmp(&b.username))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    results
}

#[derive(Clone)]
pub struct MatchService {
    db: Database,
    policy: MatchPolicy,
}

impl MatchService {
    pub fn new(db: Database, policy: MatchPolicy) -> Self {
        Self { db, policy }
    }

    /// Rank other users in `city_key` by interests shared with `user_id`.
    ///
    /// No selections means no matches, never an error.
    pub async fn compute_matches(&self, user_id: u64, city_key: &str) -> Result<Vec<MatchResult>> {
        let selections = self.db.list_selections_for_city(city_key).await?;
        let overlaps = find_overlaps(user_id, &selections);

        if overlaps.is_empty() {
            tracing::debug!(
                user_id,
                city_key,
                selections = selections.len(),
                "No matches"
            );
            return Ok(Vec::new());
        }

        let candidate_ids: Vec<u64> = overlaps.keys().copied().collect();
        let (usernames, connections) = tokio::try_join!(
            self.db.get_usernames(&candidate_ids),
            self.db.get_connections(user_id),
        )?;

        let results = rank_matches(overlaps, &usernames, &connections, &self.policy);
        tracing::debug!(
            user_id,
            city_key,
            selections = selections.len(),
            matches = results.len(),
            "Matches computed"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemType, MatchStrength};

    fn sel(user_id: u64, item_id: &str) -> InterestSelection {
        InterestSelection::new(user_id, item_id, ItemType::Activity, "los angeles metro")
    }

    fn names(pairs: &[(u64, &str)]) -> HashMap<u64, String> {
        pairs.iter().map(|(id, n)| (*id, n.to_string())).collect()
    }

    #[test]
    fn test_overlap_is_exact_intersection() {
        let selections = vec![
            sel(1, "a"),
            sel(1, "b"),
            sel(2, "a"),
            sel(2, "b"),
            sel(2, "c"),
            sel(3, "c"),
        ];

        let overlaps = find_overlaps(1, &selections);

        assert_eq!(overlaps.len(), 1);
        let shared: Vec<&str> = overlaps[&2].iter().map(String::as_str).collect();
        assert_eq!(shared, vec!["a", "b"]);
    }

    #[test]
    fn test_self_never_matches() {
        let selections = vec![sel(1, "a"), sel(1, "b")];
        assert!(find_overlaps(1, &selections).is_empty());
    }

    #[test]
    fn test_no_own_selections_means_no_matches() {
        let selections = vec![sel(2, "a"), sel(3, "a")];
        assert!(find_overlaps(1, &selections).is_empty());
    }

    #[test]
    fn test_rank_by_count_then_username() {
        let selections = vec![
            sel(1, "a"),
            sel(1, "b"),
            sel(1, "c"),
            sel(2, "a"),
            sel(3, "a"),
            sel(3, "b"),
            sel(3, "c"),
            sel(4, "b"),
        ];
        let usernames = names(&[(2, "zoe"), (3, "mia"), (4, "ana")]);

        let results = rank_matches(
            find_overlaps(1, &selections),
            &usernames,
            &HashSet::new(),
            &MatchPolicy::default(),
        );

        let order: Vec<(u64, usize, MatchStrength)> = results
            .iter()
            .map(|r| (r.user_id, r.shared_count, r.match_strength))
            .collect();
        assert_eq!(
            order,
            vec![
                (3, 3, MatchStrength::High),
                (4, 1, MatchStrength::Low),
                (2, 1, MatchStrength::Low),
            ]
        );
    }

    #[test]
    fn test_connection_does_not_change_order() {
        let selections = vec![sel(1, "a"), sel(2, "a"), sel(3, "a")];
        let usernames = names(&[(2, "amy"), (3, "bob")]);
        let connections: HashSet<u64> = [3].into_iter().collect();

        let results = rank_matches(
            find_overlaps(1, &selections),
            &usernames,
            &connections,
            &MatchPolicy::default(),
        );

        assert_eq!(results[0].user_id, 2);
        assert!(!results[0].is_connected);
        assert_eq!(results[1].user_id, 3);
        assert!(results[1].is_connected);
    }

    #[test]
    fn test_missing_profile_uses_fallback_name() {
        let selections = vec![sel(1, "a"), sel(9, "a")];

        let results = rank_matches(
            find_overlaps(1, &selections),
            &HashMap::new(),
            &HashSet::new(),
            &MatchPolicy::default(),
        );

        assert_eq!(results[0].username, "user-9");
    }

    #[test]
    fn test_ranking_is_stable_across_input_order() {
        let mut selections = vec![
            sel(1, "a"),
            sel(1, "b"),
            sel(2, "a"),
            sel(3, "b"),
            sel(4, "a"),
            sel(4, "b"),
        ];
        let usernames = names(&[(2, "same"), (3, "same"), (4, "dee")]);
        let policy = MatchPolicy::default();

        let first = rank_matches(
            find_overlaps(1, &selections),
            &usernames,
            &HashSet::new(),
            &policy,
        );
        selections.reverse();
        let second = rank_matches(
            find_overlaps(1, &selections),
            &usernames,
            &HashSet::new(),
            &policy,
        );

        assert_eq!(first, second);
        let ids: Vec<u64> = first.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![4, 2, 3]);
    }
}
