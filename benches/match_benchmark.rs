use criterion::{black_box, criterion_group, criterion_main, Criterion};
use interest_match::models::{InterestSelection, ItemType, MatchPolicy};
use interest_match::services::matching::{find_overlaps, rank_matches};
use std::collections::{HashMap, HashSet};

/// A city with `users` users each selecting 20 of `items` items.
fn city_selections(users: u64, items: u64) -> Vec<InterestSelection> {
    let mut selections = Vec::new();
    for user_id in 1..=users {
        for k in 0..20 {
            let item = (user_id * 7 + k * 13) % items;
            selections.push(InterestSelection::new(
                user_id,
                &format!("item-{}", item),
                ItemType::Activity,
                "bench city",
            ));
        }
    }
    selections
}

fn benchmark_matching(c: &mut Criterion) {
    let policy = MatchPolicy::default();
    let mut group = c.benchmark_group("city_matching");

    for (users, items) in [(100, 200), (2_000, 500)] {
        let selections = city_selections(users, items);
        let usernames: HashMap<u64, String> =
            (1..=users).map(|id| (id, format!("user{}", id))).collect();
        let connections: HashSet<u64> = (2..=users).step_by(10).collect();

        group.bench_function(format!("overlaps_{}_users", users), |b| {
            b.iter(|| find_overlaps(black_box(1), black_box(&selections)))
        });

        group.bench_function(format!("overlaps_and_rank_{}_users", users), |b| {
            b.iter(|| {
                let overlaps = find_overlaps(black_box(1), black_box(&selections));
                rank_matches(overlaps, &usernames, &connections, &policy)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_matching);
criterion_main!(benches);
