use crate::error::{AppError, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A stored value that [`ThreadSafeMap::add_list_item`] can append to.
pub trait ListValue: Sized {
    type Item;

    /// Build a one-element sequence.
    fn from_item(item: Self::Item) -> Self;

    /// Append `item`, handing it back when `self` is not a sequence.
    fn try_push(&mut self, item: Self::Item) -> std::result::Result<(), Self::Item>;

    /// Short name of the stored variant, used in mismatch errors.
    fn kind(&self) -> &'static str;
}

impl<T> ListValue for Vec<T> {
    type Item = T;

    fn from_item(item: T) -> Self {
        vec![item]
    }

    fn try_push(&mut self, item: T) -> std::result::Result<(), T> {
        self.push(item);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "array"
    }
}

impl ListValue for Value {
    type Item = Value;

    fn from_item(item: Value) -> Self {
        Value::Array(vec![item])
    }

    fn try_push(&mut self, item: Value) -> std::result::Result<(), Value> {
        match self {
            Value::Array(items) => {
                items.push(item);
                Ok(())
            }
            _ => Err(item),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Thread-safe string-keyed map guarded by a single exclusive lock.
///
/// Every operation, reads and enumeration included, takes the same mutex, so
/// no two operations ever run their critical sections concurrently.
/// [`update`](Self::update) and [`add_list_item`](Self::add_list_item) do
/// their read, compute and write under one lock acquisition; use them instead
/// of a `get` followed by a `set`.
///
/// Share it between threads or tasks behind an `Arc`.
pub struct ThreadSafeMap<V> {
    inner: Mutex<HashMap<String, V>>,
}

impl<V> ThreadSafeMap<V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Look up `key`. `None` signals absence; it is never an error.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.inner.lock().insert(key.into(), value);
    }

    /// Atomically replace the value under `key` with `combine(current, value)`.
    ///
    /// An absent key is treated as holding `V::default()`. The lock is held
    /// while `combine` runs, so it must not touch this map. `combine` works on
    /// a copy of the stored value; if it panics the map is left unchanged.
    pub fn update<F>(&self, key: impl Into<String>, value: V, combine: F)
    where
        V: Clone + Default,
        F: FnOnce(V, V) -> V,
    {
        let key = key.into();
        let mut map = self.inner.lock();
        let current = map.get(&key).cloned().unwrap_or_default();
        let combined = combine(current, value);
        map.insert(key, combined);
    }

    /// Remove `key`, returning its value. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) -> Option<V> {
        self.inner.lock().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Snapshot of all keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Snapshot of all values, in no particular order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.lock().values().cloned().collect()
    }

    /// Clone of every entry, taken under one lock acquisition.
    pub fn snapshot(&self) -> HashMap<String, V>
    where
        V: Clone,
    {
        self.inner.lock().clone()
    }

    /// Call `visitor` once per entry while holding the lock.
    ///
    /// The lock is not reentrant: a visitor that calls back into this map
    /// deadlocks. Take a [`snapshot`](Self::snapshot) first if the visitor
    /// needs to.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &V),
    {
        let map = self.inner.lock();
        for (key, value) in map.iter() {
            visitor(key, value);
        }
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<V: ListValue> ThreadSafeMap<V> {
    /// Append `item` to the sequence stored under `key`.
    ///
    /// An absent key starts a new one-element sequence. Appends to the same
    /// key are ordered by lock acquisition. Appending to a key that holds a
    /// non-sequence value is a caller bug and returns
    /// [`AppError::TypeMismatch`], leaving the stored value untouched.
    pub fn add_list_item(&self, key: impl Into<String>, item: V::Item) -> Result<()> {
        let key = key.into();
        let mut map = self.inner.lock();
        match map.get_mut(&key) {
            Some(existing) => existing
                .try_push(item)
                .map_err(|_| AppError::type_mismatch(key.as_str(), "array", existing.kind())),
            None => {
                map.insert(key, V::from_item(item));
                Ok(())
            }
        }
    }
}

impl<V> Default for ThreadSafeMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for ThreadSafeMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            inner: Mutex::new(map),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ThreadSafeMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadSafeMap")
            .field("entries", &*self.inner.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn run_concurrently<F>(threads: usize, op: F)
    where
        F: Fn() + Send + Sync,
    {
        thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(&op);
            }
        });
    }

    #[test]
    fn test_get_set() {
        let map = ThreadSafeMap::new();
        map.set("a", 1);
        map.set("b", 2);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(map.get("c"), None);

        let mut keys = map.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_set_overwrite() {
        let map = ThreadSafeMap::new();
        map.set("key", "old");
        map.set("key", "new");
        assert_eq!(map.get("key"), Some("new"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_concurrent() {
        let map = ThreadSafeMap::new();
        map.set("key", "value".to_string());

        run_concurrently(100, || {
            assert_eq!(map.get("key").as_deref(), Some("value"));
            assert_eq!(map.get("missing"), None);
        });
    }

    #[test]
    fn test_update_sum_concurrent() {
        let map: ThreadSafeMap<i64> = ThreadSafeMap::new();
        run_concurrently(100, || map.update("counter", 1, |old, new| old + new));
        assert_eq!(map.get("counter"), Some(100));
    }

    #[test]
    fn test_update_replaces_existing() {
        let map = ThreadSafeMap::new();
        map.set("key", "old".to_string());
        map.update("key", "new".to_string(), |old, new| format!("{old}+{new}"));
        assert_eq!(map.get("key").as_deref(), Some("old+new"));
    }

    #[test]
    fn test_update_absent_uses_default() {
        let map: ThreadSafeMap<Vec<u8>> = ThreadSafeMap::new();
        map.update("key", vec![1], |old, new| {
            assert!(old.is_empty());
            new
        });
        assert_eq!(map.get("key"), Some(vec![1]));
    }

    #[test]
    fn test_add_list_item_sequential_order() {
        let map: ThreadSafeMap<Vec<&str>> = ThreadSafeMap::new();
        map.add_list_item("log", "e1").unwrap();
        map.add_list_item("log", "e2").unwrap();
        assert_eq!(map.get("log"), Some(vec!["e1", "e2"]));
    }

    #[test]
    fn test_add_list_item_existing_concurrent() {
        let map: ThreadSafeMap<Vec<&str>> = ThreadSafeMap::new();
        map.set("key", vec!["value"]);
        run_concurrently(99, || map.add_list_item("key", "value").unwrap());
        assert_eq!(map.get("key"), Some(vec!["value"; 100]));
    }

    #[test]
    fn test_add_list_item_json_value() {
        let map: ThreadSafeMap<Value> = ThreadSafeMap::new();
        map.add_list_item("events", json!("e1")).unwrap();
        map.add_list_item("events", json!({"id": 2})).unwrap();
        assert_eq!(map.get("events"), Some(json!(["e1", {"id": 2}])));
    }

    #[test]
    fn test_add_list_item_type_mismatch() {
        let map: ThreadSafeMap<Value> = ThreadSafeMap::new();
        map.set("n", json!(42));

        let err = map.add_list_item("n", json!(5)).unwrap_err();
        match err {
            AppError::TypeMismatch {
                key,
                expected,
                found,
            } => {
                assert_eq!(key, "n");
                assert_eq!(expected, "array");
                assert_eq!(found, "number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(map.get("n"), Some(json!(42)));
    }

    #[test]
    fn test_delete() {
        let map = ThreadSafeMap::new();
        map.set("key", 1);
        assert_eq!(map.delete("key"), Some(1));
        assert_eq!(map.delete("key"), None);
        assert_eq!(map.get("key"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_delete_concurrent() {
        let map = ThreadSafeMap::new();
        map.set("key", 1);
        run_concurrently(100, || {
            map.delete("key");
        });
        assert!(!map.contains_key("key"));
    }

    #[test]
    fn test_keys_values_empty() {
        let map: ThreadSafeMap<u32> = ThreadSafeMap::new();
        assert!(map.keys().is_empty());
        assert!(map.values().is_empty());
        assert!(map.snapshot().is_empty());
    }

    #[test]
    fn test_values_concurrent() {
        let map: ThreadSafeMap<&str> = [("key1", "value1"), ("key2", "value2"), ("key3", "value3")]
            .into_iter()
            .collect();

        run_concurrently(100, || {
            let mut values = map.values();
            values.sort();
            assert_eq!(values, vec!["value1", "value2", "value3"]);
        });
    }

    #[test]
    fn test_for_each_visits_every_entry() {
        let map: ThreadSafeMap<&str> = [("key1", "value1"), ("key2", "value2"), ("key3", "value3")]
            .into_iter()
            .collect();
        let expected = map.snapshot();

        let mut visited = HashMap::new();
        map.for_each(|key, value| {
            visited.insert(key.to_string(), *value);
        });
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_for_each_empty() {
        let map: ThreadSafeMap<u32> = ThreadSafeMap::new();
        let mut calls = 0;
        map.for_each(|_, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_clear() {
        let map = ThreadSafeMap::new();
        map.set("a", 1);
        map.set("b", 2);
        map.clear();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_update_panic_keeps_old_value() {
        let map = Arc::new(ThreadSafeMap::new());
        map.set("balance", 100);

        let worker = Arc::clone(&map);
        let result = thread::spawn(move || {
            worker.update("balance", 5, |_, _| panic!("combine failed"));
        })
        .join();

        assert!(result.is_err());
        assert_eq!(map.get("balance"), Some(100));
        assert_eq!(map.len(), 1);

        // Lock was released by the panicking thread
        map.update("balance", 5, |old, new| old + new);
        assert_eq!(map.get("balance"), Some(105));
    }

    #[test]
    fn test_update_panic_on_absent_key_inserts_nothing() {
        let map: Arc<ThreadSafeMap<u64>> = Arc::new(ThreadSafeMap::new());

        let worker = Arc::clone(&map);
        let result = thread::spawn(move || {
            worker.update("missing", 1, |_, _| panic!("combine failed"));
        })
        .join();

        assert!(result.is_err());
        assert!(!map.contains_key("missing"));
    }

    #[test]
    fn test_debug_shows_entries() {
        let map = ThreadSafeMap::new();
        map.set("a", 1);
        assert_eq!(format!("{map:?}"), r#"ThreadSafeMap { entries: {"a": 1} }"#);
    }
}
