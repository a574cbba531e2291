// tests/scheduler_properties.rs

mod common;
use crate::common::target;

use std::collections::HashSet;
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use buildrun::sched::{LaunchId, LaunchScheduler};

// (delay seconds, cancel before any tick?)
fn launches_strategy() -> impl Strategy<Value = Vec<(u32, bool)>> {
    proptest::collection::vec((0u32..20, any::<bool>()), 0..40)
}

proptest! {
    /// Ticking every second for long enough fires every non-cancelled
    /// launch exactly once, never before its due time, and in due order.
    #[test]
    fn every_uncancelled_launch_fires_once_at_or_after_due(
        launches in launches_strategy(),
    ) {
        let t0 = Instant::now();
        let mut sched = LaunchScheduler::new();

        let mut expected = HashSet::new();
        let mut ids = Vec::new();
        for (i, (delay, _)) in launches.iter().enumerate() {
            let id = sched.enqueue(target("g", &format!("t{i}"), *delay), t0);
            ids.push(id);
        }
        for (id, (_, cancel)) in ids.iter().zip(launches.iter()) {
            if *cancel {
                prop_assert!(sched.cancel(*id).is_some());
            } else {
                expected.insert(*id);
            }
        }

        let mut fired: Vec<(LaunchId, Instant, Instant)> = Vec::new();
        for s in 0..=25u64 {
            let now = t0 + Duration::from_secs(s);
            for p in sched.take_due(now).due {
                prop_assert!(p.due_at <= now);
                fired.push((p.id, p.due_at, now));
            }
        }

        prop_assert!(sched.is_empty());
        let fired_ids: HashSet<LaunchId> = fired.iter().map(|(id, _, _)| *id).collect();
        prop_assert_eq!(fired_ids.len(), fired.len(), "a launch fired twice");
        prop_assert_eq!(fired_ids, expected);

        // Fired in non-decreasing (due_at, id) order.
        for pair in fired.windows(2) {
            prop_assert!((pair[0].1, pair[0].0) < (pair[1].1, pair[1].0));
        }
    }

    #[test]
    fn remaining_matches_len_after_each_tick(
        delays in proptest::collection::vec(0u32..10, 0..30),
        step in 1u64..4,
    ) {
        let t0 = Instant::now();
        let mut sched = LaunchScheduler::new();
        for (i, d) in delays.iter().enumerate() {
            sched.enqueue(target("g", &format!("t{i}"), *d), t0);
        }
        let mut total = 0;
        let mut s = 0;
        while !sched.is_empty() {
            let out = sched.take_due(t0 + Duration::from_secs(s));
            total += out.due.len();
            prop_assert_eq!(out.remaining, sched.len());
            s += step;
        }
        prop_assert_eq!(total, delays.len());
    }
}
