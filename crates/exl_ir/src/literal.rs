//! Number literals and numeric classes.

use std::fmt;

/// Numeric width/kind, ordered from narrowest to widest.
///
/// Literals only ever produce `Int`, `Long`, `Float` or `Double`; the
/// narrower integer classes exist for argument narrowing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberClass {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl NumberClass {
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

/// A number literal as the parser produced it.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberLiteral {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl NumberLiteral {
    /// The literal's class, used to narrow a negated literal back.
    pub const fn class(self) -> NumberClass {
        match self {
            Self::Int(_) => NumberClass::Int,
            Self::Long(_) => NumberClass::Long,
            Self::Float(_) => NumberClass::Float,
            Self::Double(_) => NumberClass::Double,
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int(_) | Self::Long(_))
    }

    /// Integer value, if this is an integer literal.
    pub const fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n as i64),
            Self::Long(n) => Some(n),
            Self::Float(_) | Self::Double(_) => None,
        }
    }

    /// Pick the narrowest integer literal class that holds `n`.
    pub fn integer(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(small) => Self::Int(small),
            Err(_) => Self::Long(n),
        }
    }
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Double(x) => write!(f, "{x}"),
        }
    }
}
