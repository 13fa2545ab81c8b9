//! The external named-variable store.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::ReadonlyError;
use crate::namespace::Namespace;
use crate::value::Value;

/// Per-evaluation overrides of the engine configuration.
///
/// `None` keeps the engine setting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextOptions {
    pub strict: Option<bool>,
    pub silent: Option<bool>,
    pub strict_arithmetic: Option<bool>,
}

/// Caller-owned variables an evaluation reads and writes by name.
///
/// Thread-safety across concurrent evaluations is the implementor's concern.
pub trait Context {
    /// Value bound to `name`, if any.
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&self, name: &str, value: Value) -> Result<(), ReadonlyError>;

    /// Whether `name` is bound, even to null.
    fn has(&self, name: &str) -> bool;

    /// Namespace for a `prefix:` function call. The global namespace has
    /// the empty prefix.
    fn namespace(&self, _prefix: &str) -> Option<Namespace> {
        None
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::default()
    }
}

/// A read/write context backed by a hash map.
#[derive(Debug, Default)]
pub struct MapContext {
    vars: RwLock<FxHashMap<String, Value>>,
    options: ContextOptions,
}

impl MapContext {
    pub fn new() -> Self {
        MapContext::default()
    }

    #[must_use]
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.write().insert(name.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }

    pub fn insert(&self, name: &str, value: impl Into<Value>) {
        self.vars.write().insert(name.to_owned(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.vars.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.read().is_empty()
    }
}

impl Context for MapContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) -> Result<(), ReadonlyError> {
        self.vars.write().insert(name.to_owned(), value);
        Ok(())
    }

    fn has(&self, name: &str) -> bool {
        self.vars.read().contains_key(name)
    }

    fn options(&self) -> ContextOptions {
        self.options
    }
}

/// Wraps a context and rejects every write.
pub struct ReadOnlyContext<'a> {
    inner: &'a dyn Context,
}

impl<'a> ReadOnlyContext<'a> {
    pub fn new(inner: &'a dyn Context) -> Self {
        ReadOnlyContext { inner }
    }
}

impl Context for ReadOnlyContext<'_> {
    fn get(&self, name: &str) -> Option<Value> {
        self.inner.get(name)
    }

    fn set(&self, _name: &str, _value: Value) -> Result<(), ReadonlyError> {
        Err(ReadonlyError)
    }

    fn has(&self, name: &str) -> bool {
        self.inner.has(name)
    }

    fn namespace(&self, prefix: &str) -> Option<Namespace> {
        self.inner.namespace(prefix)
    }

    fn options(&self) -> ContextOptions {
        self.inner.options()
    }
}
