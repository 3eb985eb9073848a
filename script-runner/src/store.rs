//! Per-script state and the run-wide shared bus
//!
//! A [`Store`] is a type-erased map owned by exactly one script for one run.
//! Values inserted with [`Store::insert`] implement [`SnapshotValue`] and show
//! up in snapshots; values inserted with [`Store::insert_opaque`] are live-only
//! and never leave the store.

use crate::StoreError;
use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, Any};
use std::collections::BTreeMap;

/// Storable value that knows how to copy itself into a snapshot
///
/// Implemented for every `Serialize` type. A value whose serialization fails
/// (for instance a map keyed by tuples) yields `None` and is left out of the
/// snapshot.
pub trait SnapshotValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn snapshot_value(&self) -> Option<Value>;
}

impl<T> SnapshotValue for T
where
    T: Serialize + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot_value(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }
}

enum Slot {
    Data(Box<dyn SnapshotValue>),
    Opaque(Box<dyn Any + Send + Sync>),
}

impl Slot {
    fn as_any(&self) -> &dyn Any {
        match self {
            Slot::Data(value) => value.as_ref().as_any(),
            Slot::Opaque(value) => value.as_ref(),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        match self {
            Slot::Data(value) => value.as_mut().as_any_mut(),
            Slot::Opaque(value) => value.as_mut(),
        }
    }
}

/// Private state of one script for one run
#[derive(Default)]
pub struct Store {
    entries: BTreeMap<String, Slot>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snapshot-visible value, replacing any previous one
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Slot::Data(Box::new(value)));
    }

    /// Insert a live-only value; it is never copied into snapshots
    pub fn insert_opaque<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.entries.insert(key.into(), Slot::Opaque(Box::new(value)));
    }

    /// Typed read; `None` if absent or of another type
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access; `None` if absent or of another type
    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)?.as_any_mut().downcast_mut::<T>()
    }

    /// Mutable access to `key`, inserting `default()` first if it is absent
    pub fn get_or_insert_with<T, F>(&mut self, key: &str, default: F) -> Result<&mut T, StoreError>
    where
        T: Serialize + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if !self.entries.contains_key(key) {
            self.insert(key, default());
        }
        self.get_mut::<T>(key).ok_or_else(|| StoreError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
        })
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Deep, owned copy of every snapshot-visible value
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Data(value) => {
                    let copied = value.snapshot_value();
                    if copied.is_none() {
                        tracing::trace!(
                            "Dropping unserializable store value {:?} from snapshot",
                            key
                        );
                    }
                    copied.map(|v| (key.clone(), v))
                }
                Slot::Opaque(_) => None,
            })
            .collect()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Run-wide results bus, keyed by script id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedBus {
    results: BTreeMap<String, Value>,
}

impl SharedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value published by `script_id`
    pub fn get(&self, script_id: &str) -> Option<&Value> {
        self.results.get(script_id)
    }

    /// Publish `value` under `script_id`, replacing any previous value
    pub fn publish(&mut self, script_id: impl Into<String>, value: Value) {
        self.results.insert(script_id.into(), value);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Owned copy of the whole bus
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.results.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_insert_and_get() {
        let mut store = Store::new();
        store.insert("count", 3u64);
        store.insert("label", String::from("hot"));

        assert_eq!(store.get::<u64>("count"), Some(&3));
        assert_eq!(store.get::<String>("label").map(String::as_str), Some("hot"));
        assert_eq!(store.get::<u32>("count"), None, "wrong type is not returned");
        assert_eq!(store.get::<u64>("missing"), None);

        *store.get_mut::<u64>("count").unwrap() += 1;
        assert_eq!(store.get::<u64>("count"), Some(&4));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut store = Store::new();
        let hits = store
            .get_or_insert_with("hits", BTreeMap::<u64, u64>::new)
            .unwrap();
        *hits.entry(10).or_default() += 1;

        let hits = store
            .get_or_insert_with("hits", BTreeMap::<u64, u64>::new)
            .unwrap();
        assert_eq!(hits.get(&10), Some(&1));

        let err = store.get_or_insert_with("hits", || 0u8).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { ref key, .. } if key == "hits"));
    }

    #[test]
    fn test_snapshot_drops_opaque_and_unserializable() {
        let mut store = Store::new();
        store.insert("hits", BTreeMap::from([(10u64, 3u64)]));
        store.insert("pairs", BTreeMap::from([((1u8, 2u8), 3u8)]));
        store.insert_opaque("callback", Box::new(|| 42) as Box<dyn Fn() -> i32 + Send + Sync>);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("hits"), Some(&json!({"10": 3})));
        assert!(!snapshot.contains_key("pairs"));
        assert!(!snapshot.contains_key("callback"));

        // The opaque value is still live
        let callback = store
            .get::<Box<dyn Fn() -> i32 + Send + Sync>>("callback")
            .unwrap();
        assert_eq!(callback(), 42);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        let mut store = Store::new();
        store.insert("n", 1u64);
        let before = store.snapshot();

        *store.get_mut::<u64>("n").unwrap() = 2;
        assert_eq!(before.get("n"), Some(&json!(1)));
        assert_eq!(store.snapshot().get("n"), Some(&json!(2)));
    }

    #[test]
    fn test_shared_bus_publish_and_snapshot() {
        let mut bus = SharedBus::new();
        assert!(bus.get("a").is_none());

        bus.publish("a", json!({"x": 5}));
        let snapshot = bus.snapshot();
        bus.publish("a", json!({"x": 6}));

        assert_eq!(snapshot.get("a"), Some(&json!({"x": 5})));
        assert_eq!(bus.get("a"), Some(&json!({"x": 6})));
    }
}
