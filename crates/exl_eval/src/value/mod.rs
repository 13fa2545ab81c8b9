//! Dynamic values produced and consumed by the interpreter.

mod collections;
mod host;
mod map_key;

use std::fmt;
use std::sync::Arc;

use exl_ir::{NumberClass, NumberLiteral};

pub use collections::{ArrayRef, MapRef};
pub use host::{HostObject, NativeFunction};
pub use map_key::MapKey;

use crate::closure::Closure;
use crate::introspect::HostClass;

/// A dynamically typed value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Arc<str>),
    Array(ArrayRef),
    Map(MapRef),
    Object(HostObject),
    /// A host class reference, the target of `new(...)`.
    Class(Arc<HostClass>),
    Function(NativeFunction),
    Closure(Closure),
}

impl Value {
    // Factory methods

    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(ArrayRef::new(items))
    }

    pub fn map<I: IntoIterator<Item = (MapKey, Value)>>(entries: I) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    pub fn function<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, crate::HostError> + Send + Sync + 'static,
    {
        Value::Function(NativeFunction::new(name, func))
    }

    /// An integer in the narrowest of `Int` and `Long` that holds it.
    pub fn integer(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::Long(n),
        }
    }

    // Inspection

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value can be invoked as a functor.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Function(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
            Value::Function(_) => "function",
            Value::Closure(_) => "closure",
        }
    }

    /// Numeric class, for numbers only.
    pub fn number_class(&self) -> Option<NumberClass> {
        match self {
            Value::Byte(_) => Some(NumberClass::Byte),
            Value::Short(_) => Some(NumberClass::Short),
            Value::Int(_) => Some(NumberClass::Int),
            Value::Long(_) => Some(NumberClass::Long),
            Value::Float(_) => Some(NumberClass::Float),
            Value::Double(_) => Some(NumberClass::Double),
            _ => None,
        }
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.number_class().is_some()
    }

    /// Value of an integer-class number.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(n) => Some(i64::from(n)),
            Value::Short(n) => Some(i64::from(n)),
            Value::Int(n) => Some(i64::from(n)),
            Value::Long(n) => Some(n),
            _ => None,
        }
    }

    /// Integer value of any number that is exactly integral.
    pub fn as_exact_i64(&self) -> Option<i64> {
        match *self {
            Value::Float(x) => exact_i64(f64::from(x)),
            Value::Double(x) => exact_i64(x),
            _ => self.as_i64(),
        }
    }

    /// Any number widened to `f64`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "long to double widening mirrors numeric promotion"
    )]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(x) => Some(f64::from(x)),
            Value::Double(x) => Some(x),
            _ => self.as_i64().map(|n| n as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp,
    reason = "range and fraction checks guard the truncating cast"
)]
fn exact_i64(x: f64) -> Option<i64> {
    if !x.is_finite() || x.fract() != 0.0 || x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return None;
    }
    Some(x as i64)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Float(_) | Value::Double(_), Value::Float(_) | Value::Double(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || a.snapshot() == b.snapshot(),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b) || a.entries() == b.entries(),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Closure(a), Value::Closure(b)) => a.ptr_eq(b),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Byte(n) => write!(f, "{n}"),
            Value::Short(n) => write!(f, "{n}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.snapshot().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => write!(f, "<{}>", obj.class().name()),
            Value::Class(class) => write!(f, "<class {}>", class.name()),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Closure(_) => f.write_str("<closure>"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<NumberLiteral> for Value {
    fn from(literal: NumberLiteral) -> Self {
        match literal {
            NumberLiteral::Int(n) => Value::Int(n),
            NumberLiteral::Long(n) => Value::Long(n),
            NumberLiteral::Float(x) => Value::Float(x),
            NumberLiteral::Double(x) => Value::Double(x),
        }
    }
}
