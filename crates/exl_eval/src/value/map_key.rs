use std::fmt;
use std::sync::Arc;

use super::Value;

/// Hashable view of a value used as a map key.
///
/// Integral numbers of every width (and integral floats) collapse onto
/// `Int`, so `m[1]`, `m[1L]` and `m[1.0]` address the same entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Null,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
}

impl MapKey {
    /// Key for `value`, or `None` when the value is not hashable.
    pub fn from_value(value: &Value) -> Option<MapKey> {
        match value {
            Value::Null => Some(MapKey::Null),
            Value::Bool(b) => Some(MapKey::Bool(*b)),
            Value::Str(s) => Some(MapKey::Str(Arc::clone(s))),
            Value::Float(_) | Value::Double(_) => value.as_exact_i64().map(MapKey::Int),
            other => other.as_i64().map(MapKey::Int),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Null => Value::Null,
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(n) => Value::integer(*n),
            MapKey::Str(s) => Value::Str(Arc::clone(s)),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.into())
    }
}

impl From<i64> for MapKey {
    fn from(n: i64) -> Self {
        MapKey::Int(n)
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Null => f.write_str("null"),
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Int(n) => write!(f, "{n}"),
            MapKey::Str(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_keys_collapse_across_widths() {
        assert_eq!(MapKey::from_value(&Value::Byte(1)), Some(MapKey::Int(1)));
        assert_eq!(MapKey::from_value(&Value::Long(1)), Some(MapKey::Int(1)));
        assert_eq!(MapKey::from_value(&Value::Double(1.0)), Some(MapKey::Int(1)));
    }

    #[test]
    fn unhashable_values_are_rejected() {
        assert_eq!(MapKey::from_value(&Value::Double(1.5)), None);
        assert_eq!(MapKey::from_value(&Value::array(vec![])), None);
    }
}
