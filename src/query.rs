//! Linear-scan filters and aggregates over store values.

use indexmap::IndexMap;
use std::hash::Hash;
use std::ops::AddAssign;

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// True when any value contains `needle`, ignoring case.
pub fn any_contains_ci<S: AsRef<str>>(values: &[S], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    values
        .iter()
        .any(|v| v.as_ref().to_lowercase().contains(&needle))
}

/// Sums `value` per `key`. Groups keep the order in which their key was first seen.
pub fn group_sum<'a, T, K, V, I>(
    items: I,
    key: impl Fn(&T) -> K,
    value: impl Fn(&T) -> V,
) -> IndexMap<K, V>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    K: Hash + Eq,
    V: AddAssign + Default,
{
    let mut groups: IndexMap<K, V> = IndexMap::new();
    for item in items {
        *groups.entry(key(item)).or_default() += value(item);
    }
    groups
}

/// Counts items per `key`, first-seen order.
pub fn group_count<'a, T, K, I>(items: I, key: impl Fn(&T) -> K) -> IndexMap<K, usize>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    K: Hash + Eq,
{
    group_sum(items, key, |_| 1usize)
}

/// The `n` largest groups, descending. Equal values keep their group order.
pub fn top_n<K, V: PartialOrd>(groups: IndexMap<K, V>, n: usize) -> Vec<(K, V)> {
    let mut ranked: Vec<(K, V)> = groups.into_iter().collect();
    // sort_by is stable
    ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(n);
    ranked
}
