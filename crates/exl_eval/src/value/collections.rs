//! Shared, interior-mutable arrays and maps.
//!
//! Both are handles: cloning a `Value::Array` or `Value::Map` shares the
//! storage, so `a[0] = 1` is visible through every copy. Locks are held for
//! the duration of one accessor call only.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{MapKey, Value};

#[derive(Clone, Debug, Default)]
pub struct ArrayRef(Arc<RwLock<Vec<Value>>>);

impl ArrayRef {
    pub fn new(items: Vec<Value>) -> Self {
        ArrayRef(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Store `value` at `index`; `false` when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.read().iter().any(|item| item == value)
    }

    /// Copy of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapRef(Arc<RwLock<FxHashMap<MapKey, Value>>>);

impl MapRef {
    pub fn new() -> Self {
        MapRef::default()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Insert, returning the previous value.
    pub fn insert(&self, key: MapKey, value: Value) -> Option<Value> {
        self.0.write().insert(key, value)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.0.read().contains_key(key)
    }

    /// Copy of the current values, in key order.
    pub fn values(&self) -> Vec<Value> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }

    /// Copy of the current entries, in key order.
    pub fn entries(&self) -> Vec<(MapKey, Value)> {
        let mut entries: Vec<_> = self
            .0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl FromIterator<(MapKey, Value)> for MapRef {
    fn from_iter<I: IntoIterator<Item = (MapKey, Value)>>(iter: I) -> Self {
        MapRef(Arc::new(RwLock::new(iter.into_iter().collect())))
    }
}
