//! Host-provided values: opaque objects and native callables.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::HostError;
use crate::introspect::HostClass;

use super::Value;

/// An opaque host object together with the class describing its members.
///
/// State needing mutation from setters should use interior mutability.
#[derive(Clone)]
pub struct HostObject {
    class: Arc<HostClass>,
    state: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(class: Arc<HostClass>, state: T) -> Self {
        HostObject {
            class,
            state: Arc::new(state),
        }
    }

    #[inline]
    pub fn class(&self) -> &Arc<HostClass> {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({})", self.class.name())
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, HostError> + Send + Sync;

/// A host callable usable as a functor.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        NativeFunction {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, HostError> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}
