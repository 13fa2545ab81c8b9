//! Descriptors for host types exposed to scripts.
//!
//! A [`HostClass`] lists typed methods, constructors, property getters and
//! setters, and optionally an iterator. Parameters match with widening only:
//! an `Int` parameter takes byte, short and int arguments but not long. The
//! interpreter's narrowing retry is what lets `obj.f(5L)` reach `f(int)`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::HostError;
use crate::value::{HostObject, Value};

pub type MethodFn = Arc<dyn Fn(&HostObject, &[Value]) -> Result<Value, HostError> + Send + Sync>;
pub type ConstructorFn =
    Arc<dyn Fn(&Arc<HostClass>, &[Value]) -> Result<Value, HostError> + Send + Sync>;
pub type GetterFn = Arc<dyn Fn(&HostObject) -> Result<Value, HostError> + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(&HostObject, Value) -> Result<(), HostError> + Send + Sync>;
pub type IterateFn = Arc<dyn Fn(&HostObject) -> Vec<Value> + Send + Sync>;

/// Declared type of a host parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Any,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Str,
    Array,
    Map,
    Object,
}

impl ParamType {
    /// Whether an argument of this runtime value binds to the parameter.
    /// Null binds to reference types only.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Bool => matches!(value, Value::Bool(_)),
            ParamType::Byte => matches!(value, Value::Byte(_)),
            ParamType::Short => matches!(value, Value::Byte(_) | Value::Short(_)),
            ParamType::Int => matches!(value, Value::Byte(_) | Value::Short(_) | Value::Int(_)),
            ParamType::Long => value.as_i64().is_some(),
            ParamType::Float => value.as_i64().is_some() || matches!(value, Value::Float(_)),
            ParamType::Double => value.is_number(),
            ParamType::Str => matches!(value, Value::Null | Value::Str(_)),
            ParamType::Array => matches!(value, Value::Null | Value::Array(_)),
            ParamType::Map => matches!(value, Value::Null | Value::Map(_)),
            ParamType::Object => matches!(value, Value::Null | Value::Object(_)),
        }
    }
}

fn params_accept(params: &[ParamType], args: &[Value]) -> bool {
    params.len() == args.len() && params.iter().zip(args).all(|(p, a)| p.accepts(a))
}

pub struct HostMethod {
    name: Box<str>,
    params: Box<[ParamType]>,
    call: MethodFn,
}

impl HostMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, name: &str, args: &[Value]) -> bool {
        &*self.name == name && params_accept(&self.params, args)
    }

    pub fn call(&self, object: &HostObject, args: &[Value]) -> Result<Value, HostError> {
        (self.call)(object, args)
    }
}

pub struct HostConstructor {
    params: Box<[ParamType]>,
    call: ConstructorFn,
}

impl HostConstructor {
    pub fn accepts(&self, args: &[Value]) -> bool {
        params_accept(&self.params, args)
    }
}

pub struct HostSetter {
    param: ParamType,
    call: SetterFn,
}

impl HostSetter {
    pub fn accepts(&self, value: &Value) -> bool {
        self.param.accepts(value)
    }

    pub fn call(&self, object: &HostObject, value: Value) -> Result<(), HostError> {
        (self.call)(object, value)
    }
}

/// Members of one host type.
pub struct HostClass {
    name: Box<str>,
    methods: Vec<HostMethod>,
    constructors: Vec<HostConstructor>,
    getters: FxHashMap<Box<str>, GetterFn>,
    setters: FxHashMap<Box<str>, HostSetter>,
    iterate: Option<IterateFn>,
}

impl HostClass {
    pub fn builder(name: &str) -> HostClassBuilder {
        HostClassBuilder {
            class: HostClass {
                name: name.into(),
                methods: Vec::new(),
                constructors: Vec::new(),
                getters: FxHashMap::default(),
                setters: FxHashMap::default(),
                iterate: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the first method declared with this name that accepts `args`.
    pub fn find_method(&self, name: &str, args: &[Value]) -> Option<usize> {
        self.methods.iter().position(|m| m.accepts(name, args))
    }

    pub fn method(&self, index: usize) -> Option<&HostMethod> {
        self.methods.get(index)
    }

    pub fn find_constructor(&self, args: &[Value]) -> Option<usize> {
        self.constructors.iter().position(|c| c.accepts(args))
    }

    pub fn constructor(&self, index: usize) -> Option<&HostConstructor> {
        self.constructors.get(index)
    }

    /// Run constructor `index` of this class.
    pub fn instantiate(self: &Arc<Self>, index: usize, args: &[Value]) -> Result<Value, HostError> {
        match self.constructors.get(index) {
            Some(ctor) => (ctor.call)(self, args),
            None => Err(HostError::new(format!("no constructor #{index} on {}", self.name))),
        }
    }

    pub fn getter(&self, name: &str) -> Option<&GetterFn> {
        self.getters.get(name)
    }

    pub fn setter(&self, name: &str) -> Option<&HostSetter> {
        self.setters.get(name)
    }

    /// Elements of `object`, when the class declares an iterator.
    pub fn iterate(&self, object: &HostObject) -> Option<Vec<Value>> {
        self.iterate.as_ref().map(|f| f(object))
    }
}

impl fmt::Debug for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClass")
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`HostClass`].
pub struct HostClassBuilder {
    class: HostClass,
}

impl HostClassBuilder {
    #[must_use]
    pub fn method<F>(mut self, name: &str, params: &[ParamType], call: F) -> Self
    where
        F: Fn(&HostObject, &[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.class.methods.push(HostMethod {
            name: name.into(),
            params: params.into(),
            call: Arc::new(call),
        });
        self
    }

    #[must_use]
    pub fn constructor<F>(mut self, params: &[ParamType], call: F) -> Self
    where
        F: Fn(&Arc<HostClass>, &[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.class.constructors.push(HostConstructor {
            params: params.into(),
            call: Arc::new(call),
        });
        self
    }

    #[must_use]
    pub fn getter<F>(mut self, name: &str, call: F) -> Self
    where
        F: Fn(&HostObject) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.class.getters.insert(name.into(), Arc::new(call));
        self
    }

    #[must_use]
    pub fn setter<F>(mut self, name: &str, param: ParamType, call: F) -> Self
    where
        F: Fn(&HostObject, Value) -> Result<(), HostError> + Send + Sync + 'static,
    {
        self.class.setters.insert(
            name.into(),
            HostSetter {
                param,
                call: Arc::new(call),
            },
        );
        self
    }

    #[must_use]
    pub fn iterator<F>(mut self, iterate: F) -> Self
    where
        F: Fn(&HostObject) -> Vec<Value> + Send + Sync + 'static,
    {
        self.class.iterate = Some(Arc::new(iterate));
        self
    }

    pub fn build(self) -> Arc<HostClass> {
        Arc::new(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_match_by_widening_only() {
        assert!(ParamType::Int.accepts(&Value::Byte(1)));
        assert!(ParamType::Int.accepts(&Value::Int(1)));
        assert!(!ParamType::Int.accepts(&Value::Long(1)));
        assert!(ParamType::Double.accepts(&Value::Long(1)));
        assert!(!ParamType::Float.accepts(&Value::Double(1.0)));
        assert!(ParamType::Str.accepts(&Value::Null));
        assert!(!ParamType::Int.accepts(&Value::Null));
    }

    #[test]
    fn method_lookup_checks_name_and_arity() {
        let class = HostClass::builder("Counter")
            .method("add", &[ParamType::Int], |_, args| Ok(args[0].clone()))
            .method("add", &[ParamType::Int, ParamType::Int], |_, _| Ok(Value::Null))
            .build();
        assert_eq!(class.find_method("add", &[Value::Int(1)]), Some(0));
        assert_eq!(class.find_method("add", &[Value::Int(1), Value::Int(2)]), Some(1));
        assert_eq!(class.find_method("add", &[Value::Long(1)]), None);
        assert_eq!(class.find_method("sub", &[Value::Int(1)]), None);
    }
}
