//! Property tests for casematrix-logging

use casematrix_logging::{DebugItems, LogLevel, MockMetrics, find_differences};
use proptest::prelude::*;

fn level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Error),
        Just(LogLevel::Warn),
        Just(LogLevel::Info),
        Just(LogLevel::Debug),
        Just(LogLevel::Trace),
    ]
}

proptest! {
    /// Every level logs itself
    #[test]
    fn prop_level_is_reflexive(level in level()) {
        prop_assert!(level.should_log(level));
    }

    /// Debug boxes are rectangular whatever they hold
    #[test]
    fn prop_debug_box_is_rectangular(values in prop::collection::vec("[a-z0-9 ]{0,60}", 1..6)) {
        let mut items = DebugItems::new();
        for value in &values {
            items.push(value);
        }
        let rendered = items.render();
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        prop_assert!(widths.iter().all(|w| *w == widths[0]));
    }

    /// Metric boxes stay rectangular for any counts
    #[test]
    fn prop_metrics_box_is_rectangular(thrown in 0usize..100_000, returned in 0usize..100_000) {
        let rendered = MockMetrics { thrown, returned, ..MockMetrics::default() }.render();
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        prop_assert!(widths.iter().all(|w| *w == widths[0]));
    }

    /// Both diff lines span the longer input, and equal inputs diff to underscores
    #[test]
    fn prop_difference_lengths(a in "[a-z]{0,20}", b in "[a-z]{0,20}") {
        let group = find_differences(&a, &b);
        let len = a.len().max(b.len());
        prop_assert_eq!(group.first.differences.chars().count(), len);
        prop_assert_eq!(group.second.differences.chars().count(), len);

        let same = find_differences(&a, &a);
        prop_assert!(same.first.differences.chars().all(|c| c == '_'));
    }
}
