use chrono::{DateTime, Datelike, TimeZone};
use std::collections::HashMap;
use std::hash::Hash;

/// Call `f` with each element and its index.
pub fn for_each_indexed<T, F>(items: &[T], mut f: F)
where
    F: FnMut(&T, usize),
{
    for (idx, item) in items.iter().enumerate() {
        f(item, idx);
    }
}

/// Clone the elements for which `keep(element, index)` is true.
pub fn filter_indexed<T, F>(items: &[T], mut keep: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T, usize) -> bool,
{
    items
        .iter()
        .enumerate()
        .filter(|(idx, item)| keep(*item, *idx))
        .map(|(_, item)| item.clone())
        .collect()
}

pub fn map_indexed<T, U, F>(items: &[T], mut f: F) -> Vec<U>
where
    F: FnMut(&T, usize) -> U,
{
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| f(item, idx))
        .collect()
}

/// First element matching `pred(element, index)`.
pub fn find_indexed<T, F>(items: &[T], mut pred: F) -> Option<&T>
where
    F: FnMut(&T, usize) -> bool,
{
    items
        .iter()
        .enumerate()
        .find(|(idx, item)| pred(*item, *idx))
        .map(|(_, item)| item)
}

/// Last element, or `T::default()` for an empty slice.
pub fn last_or_default<T: Clone + Default>(items: &[T]) -> T {
    items.last().cloned().unwrap_or_default()
}

pub fn get_map_keys<K: Clone, V>(map: &HashMap<K, V>) -> Vec<K> {
    map.keys().cloned().collect()
}

/// Value under `key`, inserting `V::default()` first when absent.
pub fn get_or_fill<K, V>(map: &mut HashMap<K, V>, key: K) -> &mut V
where
    K: Eq + Hash,
    V: Default,
{
    map.entry(key).or_default()
}

pub fn value_or_default<T>(value: Option<T>, default: T) -> T {
    value.unwrap_or(default)
}

pub fn value_or_zero<T: Default>(value: Option<T>) -> T {
    value.unwrap_or_default()
}

/// Midnight at the start of `t`'s day, in `t`'s own time zone.
///
/// Returns `t` unchanged when local midnight does not exist (a DST gap at
/// 00:00).
pub fn start_of_day<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
    t.timezone()
        .with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
        .earliest()
        .unwrap_or_else(|| t.clone())
}
