//! The shipped introspection service: built-in members of arrays, maps and
//! strings, plus registered host classes.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{HostClass, MethodHandle, PropertyGet, PropertySet, Uberspect, ValueIter};
use crate::errors::HostError;
use crate::value::{MapKey, Value};

/// Resolves members against built-in value types and a class registry.
#[derive(Debug, Default)]
pub struct BuiltinUberspect {
    classes: FxHashMap<Box<str>, Arc<HostClass>>,
}

impl BuiltinUberspect {
    pub fn new() -> Self {
        BuiltinUberspect::default()
    }

    /// Register a class so constructors can name it with a string.
    #[must_use]
    pub fn with_class(mut self, class: Arc<HostClass>) -> Self {
        self.classes.insert(class.name().into(), class);
        self
    }

    pub fn class(&self, name: &str) -> Option<&Arc<HostClass>> {
        self.classes.get(name)
    }

    fn resolve_class(&self, class: &Value) -> Option<Arc<HostClass>> {
        match class {
            Value::Class(class) => Some(Arc::clone(class)),
            Value::Str(name) => self.classes.get(&**name).cloned(),
            _ => None,
        }
    }
}

impl Uberspect for BuiltinUberspect {
    fn find_method(
        &self,
        target: &Value,
        name: &str,
        args: &[Value],
    ) -> Option<Arc<dyn MethodHandle>> {
        if let Value::Object(object) = target {
            let class = object.class();
            let index = class.find_method(name, args)?;
            return Some(Arc::new(HostMethodHandle {
                class: Arc::clone(class),
                index,
            }));
        }
        Builtin::lookup(target, name, args)
            .map(|builtin| Arc::new(BuiltinMethod(builtin)) as Arc<dyn MethodHandle>)
    }

    fn find_constructor(&self, class: &Value, args: &[Value]) -> Option<Arc<dyn MethodHandle>> {
        let class = self.resolve_class(class)?;
        let index = class.find_constructor(args)?;
        Some(Arc::new(HostConstructorHandle { class, index }))
    }

    fn find_property_get(&self, target: &Value, key: &Value) -> Option<Arc<dyn PropertyGet>> {
        match target {
            Value::Array(_) => {
                let index = key.as_exact_i64()?;
                Some(Arc::new(ArrayIndexGet { index }))
            }
            Value::Map(_) => {
                let key = MapKey::from_value(key)?;
                Some(Arc::new(MapEntryGet { key }))
            }
            Value::Object(object) => {
                let name = key.as_str()?;
                object.class().getter(name)?;
                Some(Arc::new(HostPropertyGet {
                    class: Arc::clone(object.class()),
                    name: name.into(),
                }))
            }
            _ => None,
        }
    }

    fn find_property_set(
        &self,
        target: &Value,
        key: &Value,
        value: &Value,
    ) -> Option<Arc<dyn PropertySet>> {
        match target {
            Value::Array(_) => {
                let index = key.as_exact_i64()?;
                Some(Arc::new(ArrayIndexSet { index }))
            }
            Value::Map(_) => {
                let key = MapKey::from_value(key)?;
                Some(Arc::new(MapEntrySet { key }))
            }
            Value::Object(object) => {
                let name = key.as_str()?;
                if !object.class().setter(name)?.accepts(value) {
                    return None;
                }
                Some(Arc::new(HostPropertySet {
                    class: Arc::clone(object.class()),
                    name: name.into(),
                }))
            }
            _ => None,
        }
    }

    fn iterator(&self, value: &Value) -> Option<ValueIter> {
        match value {
            Value::Array(items) => Some(Box::new(items.snapshot().into_iter())),
            Value::Map(map) => Some(Box::new(map.values().into_iter())),
            Value::Str(s) => {
                let chars: Vec<Value> = s.chars().map(|c| Value::string(c.to_string())).collect();
                Some(Box::new(chars.into_iter()))
            }
            Value::Object(object) => object
                .class()
                .iterate(object)
                .map(|items| Box::new(items.into_iter()) as ValueIter),
            _ => None,
        }
    }
}

// Built-in methods

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Builtin {
    ArraySize,
    ArrayContains,
    ArrayGet,
    MapSize,
    MapGet,
    MapContainsKey,
    MapPut,
    StrLength,
    StrUpper,
    StrLower,
    StrTrim,
    StrContains,
    StrStartsWith,
    StrEndsWith,
    StrSubstring,
    StrCharAt,
}

impl Builtin {
    fn lookup(target: &Value, name: &str, args: &[Value]) -> Option<Builtin> {
        let integers = || args.iter().all(|a| a.as_i64().is_some());
        let string_arg = || matches!(args, [Value::Str(_)]);
        let builtin = match (target, name, args.len()) {
            (Value::Array(_), "size" | "length", 0) => Builtin::ArraySize,
            (Value::Array(_), "contains", 1) => Builtin::ArrayContains,
            (Value::Array(_), "get", 1) if integers() => Builtin::ArrayGet,
            (Value::Map(_), "size", 0) => Builtin::MapSize,
            (Value::Map(_), "get", 1) => Builtin::MapGet,
            (Value::Map(_), "containsKey", 1) => Builtin::MapContainsKey,
            (Value::Map(_), "put", 2) => Builtin::MapPut,
            (Value::Str(_), "length" | "size", 0) => Builtin::StrLength,
            (Value::Str(_), "toUpperCase", 0) => Builtin::StrUpper,
            (Value::Str(_), "toLowerCase", 0) => Builtin::StrLower,
            (Value::Str(_), "trim", 0) => Builtin::StrTrim,
            (Value::Str(_), "contains", 1) if string_arg() => Builtin::StrContains,
            (Value::Str(_), "startsWith", 1) if string_arg() => Builtin::StrStartsWith,
            (Value::Str(_), "endsWith", 1) if string_arg() => Builtin::StrEndsWith,
            (Value::Str(_), "substring", 1 | 2) if integers() => Builtin::StrSubstring,
            (Value::Str(_), "charAt", 1) if integers() => Builtin::StrCharAt,
            _ => return None,
        };
        Some(builtin)
    }

    fn invoke(self, target: &Value, args: &[Value]) -> Result<Value, HostError> {
        match (self, target) {
            (Builtin::ArraySize, Value::Array(items)) => Ok(size_value(items.len())),
            (Builtin::ArrayContains, Value::Array(items)) => Ok(Value::Bool(items.contains(&args[0]))),
            (Builtin::ArrayGet, Value::Array(items)) => {
                let index = integer_arg(args, 0)?;
                array_index(index, items.len()).and_then(|i| items.get(i)).ok_or_else(|| out_of_bounds(index))
            }
            (Builtin::MapSize, Value::Map(map)) => Ok(size_value(map.len())),
            (Builtin::MapGet, Value::Map(map)) => {
                Ok(MapKey::from_value(&args[0]).and_then(|k| map.get(&k)).unwrap_or_default())
            }
            (Builtin::MapContainsKey, Value::Map(map)) => Ok(Value::Bool(
                MapKey::from_value(&args[0]).is_some_and(|k| map.contains_key(&k)),
            )),
            (Builtin::MapPut, Value::Map(map)) => {
                let key = hashable(&args[0])?;
                Ok(map.insert(key, args[1].clone()).unwrap_or_default())
            }
            (Builtin::StrLength, Value::Str(s)) => Ok(size_value(s.chars().count())),
            (Builtin::StrUpper, Value::Str(s)) => Ok(Value::string(s.to_uppercase())),
            (Builtin::StrLower, Value::Str(s)) => Ok(Value::string(s.to_lowercase())),
            (Builtin::StrTrim, Value::Str(s)) => Ok(Value::string(s.trim())),
            (Builtin::StrContains, Value::Str(s)) => Ok(Value::Bool(s.contains(str_arg(args)?))),
            (Builtin::StrStartsWith, Value::Str(s)) => {
                Ok(Value::Bool(s.starts_with(str_arg(args)?)))
            }
            (Builtin::StrEndsWith, Value::Str(s)) => Ok(Value::Bool(s.ends_with(str_arg(args)?))),
            (Builtin::StrSubstring, Value::Str(s)) => {
                let chars: Vec<char> = s.chars().collect();
                let begin = integer_arg(args, 0)?;
                let end = if args.len() > 1 {
                    integer_arg(args, 1)?
                } else {
                    i64::try_from(chars.len()).unwrap_or(i64::MAX)
                };
                let range = usize::try_from(begin)
                    .ok()
                    .zip(usize::try_from(end).ok())
                    .filter(|&(b, e)| b <= e && e <= chars.len());
                match range {
                    Some((b, e)) => Ok(Value::string(chars[b..e].iter().collect::<String>())),
                    None => Err(HostError::new(format!("string index out of range: {begin}..{end}"))),
                }
            }
            (Builtin::StrCharAt, Value::Str(s)) => {
                let index = integer_arg(args, 0)?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::string(c.to_string()))
                    .ok_or_else(|| HostError::new(format!("string index out of range: {index}")))
            }
            (_, other) => Err(HostError::new(format!(
                "{self:?} does not apply to {}",
                other.type_name()
            ))),
        }
    }
}

fn size_value(n: usize) -> Value {
    Value::integer(i64::try_from(n).unwrap_or(i64::MAX))
}

fn integer_arg(args: &[Value], index: usize) -> Result<i64, HostError> {
    args.get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| HostError::new("expected an integer argument"))
}

fn str_arg(args: &[Value]) -> Result<&str, HostError> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| HostError::new("expected a string argument"))
}

fn hashable(key: &Value) -> Result<MapKey, HostError> {
    MapKey::from_value(key)
        .ok_or_else(|| HostError::new(format!("map key not hashable: {}", key.type_name())))
}

fn array_index(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}

fn out_of_bounds(index: i64) -> HostError {
    HostError::new(format!("index out of bounds: {index}"))
}

#[derive(Debug)]
struct BuiltinMethod(Builtin);

impl MethodHandle for BuiltinMethod {
    fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value, HostError> {
        self.0.invoke(target, args)
    }

    fn try_invoke(
        &self,
        name: &str,
        target: &Value,
        args: &[Value],
    ) -> Option<Result<Value, HostError>> {
        (Builtin::lookup(target, name, args) == Some(self.0)).then(|| self.0.invoke(target, args))
    }
}

// Host class members

#[derive(Debug)]
struct HostMethodHandle {
    class: Arc<HostClass>,
    index: usize,
}

impl HostMethodHandle {
    fn applies(&self, target: &Value) -> bool {
        matches!(target, Value::Object(object) if Arc::ptr_eq(object.class(), &self.class))
    }
}

impl MethodHandle for HostMethodHandle {
    fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value, HostError> {
        match (target, self.class.method(self.index)) {
            (Value::Object(object), Some(method)) if self.applies(target) => {
                method.call(object, args)
            }
            _ => Err(HostError::new(format!(
                "method does not apply to {}",
                target.type_name()
            ))),
        }
    }

    fn try_invoke(
        &self,
        name: &str,
        target: &Value,
        args: &[Value],
    ) -> Option<Result<Value, HostError>> {
        let Value::Object(object) = target else {
            return None;
        };
        let method = self.class.method(self.index)?;
        (self.applies(target) && method.accepts(name, args)).then(|| method.call(object, args))
    }
}

#[derive(Debug)]
struct HostConstructorHandle {
    class: Arc<HostClass>,
    index: usize,
}

impl MethodHandle for HostConstructorHandle {
    fn invoke(&self, _target: &Value, args: &[Value]) -> Result<Value, HostError> {
        self.class.instantiate(self.index, args)
    }

    fn try_invoke(
        &self,
        _name: &str,
        target: &Value,
        args: &[Value],
    ) -> Option<Result<Value, HostError>> {
        let same_class = match target {
            Value::Class(class) => Arc::ptr_eq(class, &self.class),
            Value::Str(name) => **name == *self.class.name(),
            _ => false,
        };
        let accepts = self
            .class
            .constructor(self.index)
            .is_some_and(|ctor| ctor.accepts(args));
        (same_class && accepts).then(|| self.class.instantiate(self.index, args))
    }
}

// Property access

#[derive(Debug)]
struct ArrayIndexGet {
    index: i64,
}

fn read_index(target: &Value, index: i64) -> Result<Value, HostError> {
    match target {
        Value::Array(items) => array_index(index, items.len())
            .and_then(|i| items.get(i))
            .ok_or_else(|| out_of_bounds(index)),
        other => Err(HostError::new(format!("{} is not an array", other.type_name()))),
    }
}

impl PropertyGet for ArrayIndexGet {
    fn invoke(&self, target: &Value) -> Result<Value, HostError> {
        read_index(target, self.index)
    }

    fn try_invoke(&self, target: &Value, key: &Value) -> Option<Result<Value, HostError>> {
        match target {
            Value::Array(_) => key.as_exact_i64().map(|index| read_index(target, index)),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct MapEntryGet {
    key: MapKey,
}

impl PropertyGet for MapEntryGet {
    fn invoke(&self, target: &Value) -> Result<Value, HostError> {
        match target {
            Value::Map(map) => Ok(map.get(&self.key).unwrap_or_default()),
            other => Err(HostError::new(format!("{} is not a map", other.type_name()))),
        }
    }

    fn try_invoke(&self, target: &Value, key: &Value) -> Option<Result<Value, HostError>> {
        let Value::Map(map) = target else {
            return None;
        };
        MapKey::from_value(key).map(|key| Ok(map.get(&key).unwrap_or_default()))
    }
}

#[derive(Debug)]
struct HostPropertyGet {
    class: Arc<HostClass>,
    name: Box<str>,
}

impl PropertyGet for HostPropertyGet {
    fn invoke(&self, target: &Value) -> Result<Value, HostError> {
        match (target, self.class.getter(&self.name)) {
            (Value::Object(object), Some(getter)) if Arc::ptr_eq(object.class(), &self.class) => {
                getter(object)
            }
            _ => Err(HostError::new(format!("no property {} on {}", self.name, target.type_name()))),
        }
    }

    fn try_invoke(&self, target: &Value, key: &Value) -> Option<Result<Value, HostError>> {
        match target {
            Value::Object(object)
                if Arc::ptr_eq(object.class(), &self.class)
                    && key.as_str() == Some(&*self.name) =>
            {
                Some(self.invoke(target))
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
struct ArrayIndexSet {
    index: i64,
}

fn write_index(target: &Value, index: i64, value: Value) -> Result<(), HostError> {
    match target {
        Value::Array(items) => match array_index(index, items.len()) {
            Some(i) if items.set(i, value) => Ok(()),
            _ => Err(out_of_bounds(index)),
        },
        other => Err(HostError::new(format!("{} is not an array", other.type_name()))),
    }
}

impl PropertySet for ArrayIndexSet {
    fn invoke(&self, target: &Value, value: Value) -> Result<(), HostError> {
        write_index(target, self.index, value)
    }

    fn try_invoke(
        &self,
        target: &Value,
        key: &Value,
        value: &Value,
    ) -> Option<Result<(), HostError>> {
        match target {
            Value::Array(_) => key
                .as_exact_i64()
                .map(|index| write_index(target, index, value.clone())),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct MapEntrySet {
    key: MapKey,
}

impl PropertySet for MapEntrySet {
    fn invoke(&self, target: &Value, value: Value) -> Result<(), HostError> {
        match target {
            Value::Map(map) => {
                map.insert(self.key.clone(), value);
                Ok(())
            }
            other => Err(HostError::new(format!("{} is not a map", other.type_name()))),
        }
    }

    fn try_invoke(
        &self,
        target: &Value,
        key: &Value,
        value: &Value,
    ) -> Option<Result<(), HostError>> {
        let Value::Map(map) = target else {
            return None;
        };
        let key = MapKey::from_value(key)?;
        map.insert(key, value.clone());
        Some(Ok(()))
    }
}

#[derive(Debug)]
struct HostPropertySet {
    class: Arc<HostClass>,
    name: Box<str>,
}

impl PropertySet for HostPropertySet {
    fn invoke(&self, target: &Value, value: Value) -> Result<(), HostError> {
        match (target, self.class.setter(&self.name)) {
            (Value::Object(object), Some(setter)) if Arc::ptr_eq(object.class(), &self.class) => {
                setter.call(object, value)
            }
            _ => Err(HostError::new(format!("no property {} on {}", self.name, target.type_name()))),
        }
    }

    fn try_invoke(
        &self,
        target: &Value,
        key: &Value,
        value: &Value,
    ) -> Option<Result<(), HostError>> {
        let Value::Object(object) = target else {
            return None;
        };
        let setter = self.class.setter(&self.name)?;
        let applies = Arc::ptr_eq(object.class(), &self.class)
            && key.as_str() == Some(&*self.name)
            && setter.accepts(value);
        applies.then(|| setter.call(object, value.clone()))
    }
}
