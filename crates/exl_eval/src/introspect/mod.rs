//! Member resolution on runtime values.
//!
//! The interpreter never inspects host values itself. It asks an
//! [`Uberspect`] for a handle (a method, constructor, property getter or
//! setter) and calls through it. Handles that report themselves cacheable are
//! stored per call site and probed with `try_invoke` on later evaluations.

mod builtin;
mod host_class;

use std::fmt;
use std::sync::Arc;

pub use builtin::BuiltinUberspect;
pub use host_class::{
    ConstructorFn, GetterFn, HostClass, HostClassBuilder, HostConstructor, HostMethod, HostSetter,
    IterateFn, MethodFn, ParamType, SetterFn,
};

use crate::errors::HostError;
use crate::value::Value;

/// Iterator over the elements of a collection value.
pub type ValueIter = Box<dyn Iterator<Item = Value>>;

/// A resolved method or constructor.
pub trait MethodHandle: Send + Sync + fmt::Debug {
    fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value, HostError>;

    /// Invoke only when this handle still resolves `name` on `target` for
    /// these arguments. `None` means the handle does not apply.
    fn try_invoke(
        &self,
        name: &str,
        target: &Value,
        args: &[Value],
    ) -> Option<Result<Value, HostError>>;

    fn is_cacheable(&self) -> bool {
        true
    }
}

/// A resolved property read.
pub trait PropertyGet: Send + Sync + fmt::Debug {
    fn invoke(&self, target: &Value) -> Result<Value, HostError>;

    /// Read `key` from `target` when the handle applies to that shape.
    fn try_invoke(&self, target: &Value, key: &Value) -> Option<Result<Value, HostError>>;

    fn is_cacheable(&self) -> bool {
        true
    }
}

/// A resolved property write.
pub trait PropertySet: Send + Sync + fmt::Debug {
    fn invoke(&self, target: &Value, value: Value) -> Result<(), HostError>;

    fn try_invoke(
        &self,
        target: &Value,
        key: &Value,
        value: &Value,
    ) -> Option<Result<(), HostError>>;

    fn is_cacheable(&self) -> bool {
        true
    }
}

/// The member-resolution service.
pub trait Uberspect: Send + Sync {
    fn find_method(&self, target: &Value, name: &str, args: &[Value])
        -> Option<Arc<dyn MethodHandle>>;

    /// Constructor of `class`, given as a class value or a registered class name.
    fn find_constructor(&self, class: &Value, args: &[Value]) -> Option<Arc<dyn MethodHandle>>;

    fn find_property_get(&self, target: &Value, key: &Value) -> Option<Arc<dyn PropertyGet>>;

    fn find_property_set(
        &self,
        target: &Value,
        key: &Value,
        value: &Value,
    ) -> Option<Arc<dyn PropertySet>>;

    fn iterator(&self, value: &Value) -> Option<ValueIter>;
}

/// A handle stored in a call-site cache slot.
#[derive(Clone, Debug)]
pub enum CachedHandle {
    Method(Arc<dyn MethodHandle>),
    Constructor(Arc<dyn MethodHandle>),
    Get(Arc<dyn PropertyGet>),
    Set(Arc<dyn PropertySet>),
}
