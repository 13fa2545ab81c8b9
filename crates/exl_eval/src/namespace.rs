//! Function namespaces for `prefix:name(...)` calls.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::errors::HostError;
use crate::value::Value;

/// Builds a namespace instance bound to the evaluating context.
///
/// The instance lives for one top-level evaluation.
pub trait NamespaceFactory: Send + Sync {
    fn instantiate(&self, context: &dyn Context) -> Result<Value, HostError>;
}

impl<F> NamespaceFactory for F
where
    F: Fn(&dyn Context) -> Result<Value, HostError> + Send + Sync,
{
    fn instantiate(&self, context: &dyn Context) -> Result<Value, HostError> {
        self(context)
    }
}

/// A registered namespace: a ready value, or a factory run on first use.
#[derive(Clone)]
pub enum Namespace {
    Value(Value),
    Factory(Arc<dyn NamespaceFactory>),
}

impl Namespace {
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&dyn Context) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Namespace::Factory(Arc::new(factory))
    }
}

impl From<Value> for Namespace {
    fn from(value: Value) -> Self {
        Namespace::Value(value)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Namespace::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
