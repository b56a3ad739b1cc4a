//! Property-based tests for sieve using proptest.

use proptest::prelude::*;
use sieve::{Entity, FilterDescriptor, Query, Sieve, SieveOptions, SortDescriptor};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Entity)]
struct Item {
    id: usize,
    value: i64,
    group: i64,
    name: String,
    active: bool,
}

// Strategy to generate test items; ids are assigned by position
fn items_strategy(max: usize) -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec((-50i64..50, 0i64..4, "[a-z]{1,6}", any::<bool>()), 0..max).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(id, (value, group, name, active))| Item {
                    id,
                    value,
                    group,
                    name,
                    active,
                })
                .collect()
        },
    )
}

fn ids(items: &[&Item]) -> Vec<usize> {
    items.iter().map(|i| i.id).collect()
}

fn filter(sieve: &Sieve, filters: &[FilterDescriptor], items: &[Item]) -> Vec<usize> {
    ids(&sieve.apply_filters(filters, items).unwrap())
}

// ============================================================================
// Filter properties
// ============================================================================

proptest! {
    /// Filter should never return more items than the input.
    #[test]
    fn filter_never_grows_collection(
        items in items_strategy(60),
        threshold in -60i64..60,
    ) {
        let sieve = Sieve::default();
        let f = FilterDescriptor::leaf("value", ">", [threshold]);
        let results = sieve.apply_filters(&[f], &items).unwrap();
        prop_assert!(results.len() <= items.len());
    }

    /// Matching records keep their input order.
    #[test]
    fn filter_preserves_order(items in items_strategy(60), threshold in -60i64..60) {
        let sieve = Sieve::default();
        let matched = filter(&sieve, &[FilterDescriptor::leaf("value", "<=", [threshold])], &items);
        let mut sorted = matched.clone();
        sorted.sort();
        prop_assert_eq!(matched, sorted);
    }

    /// `!=` over a value set selects exactly the records `==` rejects.
    #[test]
    fn not_equal_is_complement_of_equal(
        items in items_strategy(60),
        values in prop::collection::vec(-50i64..50, 1..4),
    ) {
        let sieve = Sieve::default();
        let eq = filter(&sieve, &[FilterDescriptor::leaf("value", "==", values.clone())], &items);
        let ne = filter(&sieve, &[FilterDescriptor::leaf("value", "!=", values)], &items);

        prop_assert_eq!(eq.len() + ne.len(), items.len());
        for id in &eq {
            prop_assert!(!ne.contains(id));
        }
    }

    /// `>` and `<=` partition every collection.
    #[test]
    fn complementary_operators_partition(items in items_strategy(60), threshold in -60i64..60) {
        let sieve = Sieve::default();
        let gt = filter(&sieve, &[FilterDescriptor::leaf("value", ">", [threshold])], &items);
        let le = filter(&sieve, &[FilterDescriptor::leaf("value", "<=", [threshold])], &items);
        prop_assert_eq!(gt.len() + le.len(), items.len());
    }

    /// Adding filters can only narrow the result.
    #[test]
    fn and_is_monotone(items in items_strategy(60), threshold in -60i64..60, flag in any::<bool>()) {
        let sieve = Sieve::default();
        let one = [FilterDescriptor::leaf("value", ">=", [threshold])];
        let two = [
            FilterDescriptor::leaf("value", ">=", [threshold]),
            FilterDescriptor::leaf("active", "==", [flag]),
        ];
        let wide = filter(&sieve, &one, &items);
        let narrow = filter(&sieve, &two, &items);
        for id in &narrow {
            prop_assert!(wide.contains(id));
        }
    }

    /// An OR group is the union of its children.
    #[test]
    fn or_group_is_union(items in items_strategy(60), low in -60i64..0, high in 0i64..60) {
        let sieve = Sieve::default();
        let below = FilterDescriptor::leaf("value", "<", [low]);
        let above = FilterDescriptor::leaf("value", ">", [high]);
        let union = filter(&sieve, &[FilterDescriptor::or([below.clone(), above.clone()])], &items);

        let expected: Vec<usize> = items
            .iter()
            .filter(|i| i.value < low || i.value > high)
            .map(|i| i.id)
            .collect();
        prop_assert_eq!(union, expected);
    }

    /// Descriptors that lenient mode drops leave the collection untouched.
    #[test]
    fn dropped_descriptors_have_no_effect(items in items_strategy(40), field in "[A-Z]{3,8}") {
        let sieve = Sieve::default();
        let unknown = [FilterDescriptor::leaf(format!("missing{}", field), "==", ["x"])];
        prop_assert_eq!(filter(&sieve, &unknown, &items), (0..items.len()).collect::<Vec<_>>());
    }

    /// Case-insensitive equality matches whatever the stored casing.
    #[test]
    fn case_insensitive_equality(items in items_strategy(40)) {
        prop_assume!(!items.is_empty());
        let sieve = Sieve::default();
        let target = items[0].name.to_uppercase();
        let found = filter(&sieve, &[FilterDescriptor::leaf("name", "==*", [target])], &items);
        prop_assert!(found.contains(&0));
    }
}

// ============================================================================
// Sort properties
// ============================================================================

proptest! {
    /// Ascending sort yields non-decreasing values.
    #[test]
    fn sort_asc_is_ordered(items in items_strategy(60)) {
        let sieve = Sieve::default();
        let sorted = sieve
            .apply_sort(&[SortDescriptor::asc("value")], items.iter().collect())
            .unwrap();
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].value <= pair[1].value);
        }
    }

    /// Sorting never drops or duplicates records.
    #[test]
    fn sort_is_permutation(items in items_strategy(60)) {
        let sieve = Sieve::default();
        let sorted = sieve
            .apply_sort(&[SortDescriptor::desc("name")], items.iter().collect())
            .unwrap();
        let mut seen = ids(&sorted);
        seen.sort();
        prop_assert_eq!(seen, (0..items.len()).collect::<Vec<_>>());
    }

    /// A secondary key only breaks ties of the primary.
    #[test]
    fn secondary_key_preserves_primary(items in items_strategy(60)) {
        let sieve = Sieve::default();
        let sorted = sieve
            .apply_sort(
                &[SortDescriptor::asc("group"), SortDescriptor::desc("value")],
                items.iter().collect(),
            )
            .unwrap();
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].group <= pair[1].group);
            if pair[0].group == pair[1].group {
                prop_assert!(pair[0].value >= pair[1].value);
            }
        }
    }

    /// Records equal on every key keep their input order.
    #[test]
    fn sort_is_stable(items in items_strategy(60)) {
        let sieve = Sieve::default();
        let sorted = sieve
            .apply_sort(&[SortDescriptor::asc("group")], items.iter().collect())
            .unwrap();
        for pair in sorted.windows(2) {
            if pair[0].group == pair[1].group {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Entity)]
struct Reading {
    score: f64,
}

fn readings_strategy() -> impl Strategy<Value = Vec<Reading>> {
    prop::collection::vec(
        prop_oneof![3 => -1e6f64..1e6, 1 => Just(f64::NAN)].prop_map(|score| Reading { score }),
        0..120,
    )
}

proptest! {
    /// NaN scores sort after every number.
    #[test]
    fn sort_with_nan_is_total(readings in readings_strategy()) {
        let sieve = Sieve::default();
        let sorted = sieve
            .apply_sort(&[SortDescriptor::asc("score")], readings.iter().collect())
            .unwrap();
        prop_assert_eq!(sorted.len(), readings.len());

        let split = sorted.iter().position(|r| r.score.is_nan()).unwrap_or(sorted.len());
        prop_assert!(sorted[split..].iter().all(|r| r.score.is_nan()));
        for pair in sorted[..split].windows(2) {
            prop_assert!(pair[0].score <= pair[1].score);
        }
    }
}

// ============================================================================
// Pagination properties
// ============================================================================

proptest! {
    /// A page never exceeds the effective page size.
    #[test]
    fn page_within_bounds(
        items in items_strategy(80),
        page in -3i64..10,
        size in -3i64..100,
        max in 1u32..30,
    ) {
        let sieve = Sieve::new(Default::default(), SieveOptions::new().max_page_size(max));
        let query = Query::new().page(page).page_size(size);
        let result = sieve.apply(&query, &items).unwrap();
        prop_assert!(result.len() <= max as usize);
        prop_assert!(result.len() <= items.len());
    }

    /// Consecutive pages tile the sorted collection without overlap.
    #[test]
    fn pages_tile_collection(items in items_strategy(50), size in 1i64..8) {
        let sieve = Sieve::default();
        let pages = items.len() / size as usize + 1;
        let mut collected = Vec::new();
        for page in 1..=pages as i64 {
            let query = Query::new().page(page).page_size(size);
            collected.extend(ids(&sieve.apply(&query, &items).unwrap()));
        }
        prop_assert_eq!(collected, (0..items.len()).collect::<Vec<_>>());
    }
}
