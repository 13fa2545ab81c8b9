//! The pluggable arithmetic and coercion strategy.
//!
//! The interpreter never computes on values itself: every operator,
//! comparison, boolean coercion and numeric narrowing goes through an
//! [`Arithmetic`] implementation. [`DefaultArithmetic`] is the shipped one.

mod default;

use std::fmt;
use std::sync::Arc;

use exl_ir::NumberClass;

pub use default::DefaultArithmetic;

use crate::value::Value;

/// Operator-level fault raised by an arithmetic strategy.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    /// An operand was null under strict arithmetic. The interpreter uses
    /// this to attribute the error to the null operand's node.
    #[error("null operand")]
    NullOperand,

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("{type_name} is not a number")]
    NotNumeric { type_name: &'static str },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

pub type ArithResult<T> = Result<T, ArithmeticError>;

/// Numeric and boolean operators over dynamic values.
pub trait Arithmetic: Send + Sync + fmt::Debug {
    /// Strict arithmetic rejects null operands instead of treating them as
    /// zero, false or empty.
    fn is_strict(&self) -> bool;

    /// The same strategy with a different strictness.
    fn with_strictness(&self, strict: bool) -> Arc<dyn Arithmetic>;

    fn add(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn subtract(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn multiply(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn divide(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn modulo(&self, left: &Value, right: &Value) -> ArithResult<Value>;

    fn bitwise_and(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn bitwise_or(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn bitwise_xor(&self, left: &Value, right: &Value) -> ArithResult<Value>;
    fn bitwise_complement(&self, value: &Value) -> ArithResult<Value>;

    fn negate(&self, value: &Value) -> ArithResult<Value>;

    fn equals(&self, left: &Value, right: &Value) -> ArithResult<bool>;
    fn less_than(&self, left: &Value, right: &Value) -> ArithResult<bool>;
    fn less_than_or_equal(&self, left: &Value, right: &Value) -> ArithResult<bool>;
    fn greater_than(&self, left: &Value, right: &Value) -> ArithResult<bool>;
    fn greater_than_or_equal(&self, left: &Value, right: &Value) -> ArithResult<bool>;

    fn to_boolean(&self, value: &Value) -> ArithResult<bool>;

    /// Pattern test for `=~` when the right operand is a pattern string.
    fn matches(&self, left: &Value, pattern: &Value) -> ArithResult<bool>;

    /// Replace numeric arguments with the narrowest class that holds them.
    /// Returns whether any argument changed.
    fn narrow_arguments(&self, args: &mut [Value]) -> bool;

    /// Convert `value` to `class` when that loses nothing, else return it as is.
    fn narrow_number(&self, value: Value, class: NumberClass) -> Value;
}
