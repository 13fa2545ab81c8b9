//! The shipped arithmetic strategy.
//!
//! Integer operations run checked in `i64` and the result is fitted back into
//! the widest operand class (at least `int`), widening further when it does
//! not fit. Any floating operand promotes the operation to `double`.

use std::cmp::Ordering;
use std::sync::Arc;

use exl_ir::NumberClass;
use regex::Regex;

use super::{ArithResult, Arithmetic, ArithmeticError};
use crate::value::Value;

/// Default numeric promotion and coercion rules.
///
/// Lenient mode (the default) reads null as zero, false or the empty string.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultArithmetic {
    strict: bool,
}

impl DefaultArithmetic {
    pub const fn new(strict: bool) -> Self {
        DefaultArithmetic { strict }
    }

    fn null_operand(&self) -> ArithResult<()> {
        if self.strict {
            Err(ArithmeticError::NullOperand)
        } else {
            Ok(())
        }
    }

    fn operand(&self, value: &Value) -> ArithResult<Operand> {
        match value {
            Value::Null => {
                self.null_operand()?;
                Ok(Operand::Integer(0, NumberClass::Int))
            }
            Value::Bool(b) => Ok(Operand::Integer(i64::from(*b), NumberClass::Int)),
            Value::Float(x) => Ok(Operand::Real(f64::from(*x))),
            Value::Double(x) => Ok(Operand::Real(*x)),
            Value::Str(s) => parse_number(s).ok_or(ArithmeticError::NotNumeric {
                type_name: "string",
            }),
            other => match (other.as_i64(), other.number_class()) {
                (Some(n), Some(class)) => Ok(Operand::Integer(n, class)),
                _ => Err(ArithmeticError::NotNumeric {
                    type_name: other.type_name(),
                }),
            },
        }
    }

    fn integer_operand(&self, value: &Value) -> ArithResult<(i64, NumberClass)> {
        match self.operand(value)? {
            Operand::Integer(n, class) => Ok((n, class)),
            Operand::Real(_) => Err(ArithmeticError::NotNumeric {
                type_name: value.type_name(),
            }),
        }
    }

    fn arith(
        &self,
        left: &Value,
        right: &Value,
        int_op: impl FnOnce(i64, i64) -> ArithResult<i64>,
        real_op: impl FnOnce(f64, f64) -> ArithResult<f64>,
    ) -> ArithResult<Value> {
        match (self.operand(left)?, self.operand(right)?) {
            (Operand::Integer(a, ca), Operand::Integer(b, cb)) => {
                Ok(fit_integer(int_op(a, b)?, result_class(ca, cb)))
            }
            (a, b) => real_op(a.to_f64(), b.to_f64()).map(Value::Double),
        }
    }

    fn bitwise(&self, left: &Value, right: &Value, op: fn(i64, i64) -> i64) -> ArithResult<Value> {
        let (a, ca) = self.integer_operand(left)?;
        let (b, cb) = self.integer_operand(right)?;
        Ok(fit_integer(op(a, b), result_class(ca, cb)))
    }

    fn compare(&self, left: &Value, right: &Value) -> ArithResult<Ordering> {
        if let (Value::Str(a), Value::Str(b)) = (left, right) {
            return Ok(a.cmp(b));
        }
        match (self.operand(left)?, self.operand(right)?) {
            (Operand::Integer(a, _), Operand::Integer(b, _)) => Ok(a.cmp(&b)),
            (a, b) => Ok(a.to_f64().total_cmp(&b.to_f64())),
        }
    }

    fn concat_part(&self, value: &Value) -> ArithResult<String> {
        if value.is_null() {
            self.null_operand()?;
            return Ok(String::new());
        }
        Ok(value.to_string())
    }
}

#[derive(Copy, Clone, Debug)]
enum Operand {
    Integer(i64, NumberClass),
    Real(f64),
}

impl Operand {
    #[expect(
        clippy::cast_precision_loss,
        reason = "long to double promotion"
    )]
    fn to_f64(self) -> f64 {
        match self {
            Operand::Integer(n, _) => n as f64,
            Operand::Real(x) => x,
        }
    }
}

fn parse_number(s: &str) -> Option<Operand> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(Operand::Integer(0, NumberClass::Int));
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        let class = if i32::try_from(n).is_ok() {
            NumberClass::Int
        } else {
            NumberClass::Long
        };
        return Some(Operand::Integer(n, class));
    }
    trimmed.parse::<f64>().ok().map(Operand::Real)
}

fn result_class(a: NumberClass, b: NumberClass) -> NumberClass {
    a.max(b).max(NumberClass::Int)
}

/// Fit `n` into `class`, widening until it fits.
fn fit_integer(n: i64, class: NumberClass) -> Value {
    if class <= NumberClass::Byte {
        if let Ok(v) = i8::try_from(n) {
            return Value::Byte(v);
        }
    }
    if class <= NumberClass::Short {
        if let Ok(v) = i16::try_from(n) {
            return Value::Short(v);
        }
    }
    if class <= NumberClass::Int {
        if let Ok(v) = i32::try_from(n) {
            return Value::Int(v);
        }
    }
    Value::Long(n)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    reason = "round-trip comparison detects lossy narrowing"
)]
fn exact_f32(x: f64) -> Option<f32> {
    let narrowed = x as f32;
    (f64::from(narrowed) == x).then_some(narrowed)
}

fn checked_divisor(b: i64) -> ArithResult<i64> {
    if b == 0 {
        Err(ArithmeticError::DivisionByZero)
    } else {
        Ok(b)
    }
}

#[allow(clippy::float_cmp, reason = "exact zero test")]
fn checked_real_divisor(b: f64) -> ArithResult<f64> {
    if b == 0.0 {
        Err(ArithmeticError::DivisionByZero)
    } else {
        Ok(b)
    }
}

impl Arithmetic for DefaultArithmetic {
    fn is_strict(&self) -> bool {
        self.strict
    }

    fn with_strictness(&self, strict: bool) -> Arc<dyn Arithmetic> {
        Arc::new(DefaultArithmetic::new(strict))
    }

    fn add(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
            let l = self.concat_part(left)?;
            let r = self.concat_part(right)?;
            return Ok(Value::string(format!("{l}{r}")));
        }
        self.arith(
            left,
            right,
            |a, b| a.checked_add(b).ok_or(ArithmeticError::Overflow("addition")),
            |a, b| Ok(a + b),
        )
    }

    fn subtract(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.arith(
            left,
            right,
            |a, b| a.checked_sub(b).ok_or(ArithmeticError::Overflow("subtraction")),
            |a, b| Ok(a - b),
        )
    }

    fn multiply(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.arith(
            left,
            right,
            |a, b| a.checked_mul(b).ok_or(ArithmeticError::Overflow("multiplication")),
            |a, b| Ok(a * b),
        )
    }

    fn divide(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.arith(
            left,
            right,
            |a, b| {
                a.checked_div(checked_divisor(b)?)
                    .ok_or(ArithmeticError::Overflow("division"))
            },
            |a, b| Ok(a / checked_real_divisor(b)?),
        )
    }

    fn modulo(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.arith(
            left,
            right,
            |a, b| {
                a.checked_rem(checked_divisor(b)?)
                    .ok_or(ArithmeticError::Overflow("remainder"))
            },
            |a, b| Ok(a % checked_real_divisor(b)?),
        )
    }

    fn bitwise_and(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.bitwise(left, right, |a, b| a & b)
    }

    fn bitwise_or(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.bitwise(left, right, |a, b| a | b)
    }

    fn bitwise_xor(&self, left: &Value, right: &Value) -> ArithResult<Value> {
        self.bitwise(left, right, |a, b| a ^ b)
    }

    fn bitwise_complement(&self, value: &Value) -> ArithResult<Value> {
        let (n, class) = self.integer_operand(value)?;
        Ok(fit_integer(!n, class.max(NumberClass::Int)))
    }

    fn negate(&self, value: &Value) -> ArithResult<Value> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            Value::Float(x) => Ok(Value::Float(-x)),
            Value::Double(x) => Ok(Value::Double(-x)),
            _ => match self.operand(value)? {
                Operand::Integer(n, class) => n
                    .checked_neg()
                    .map(|m| fit_integer(m, class))
                    .ok_or(ArithmeticError::Overflow("negation")),
                Operand::Real(x) => Ok(Value::Double(-x)),
            },
        }
    }

    #[allow(clippy::float_cmp, reason = "numeric equality across classes")]
    fn equals(&self, left: &Value, right: &Value) -> ArithResult<bool> {
        match (left, right) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            _ if left.is_number() || right.is_number() => {
                match (self.operand(left), self.operand(right)) {
                    (Ok(Operand::Integer(a, _)), Ok(Operand::Integer(b, _))) => Ok(a == b),
                    (Ok(a), Ok(b)) => Ok(a.to_f64() == b.to_f64()),
                    _ => Ok(false),
                }
            }
            _ => Ok(left == right),
        }
    }

    fn less_than(&self, left: &Value, right: &Value) -> ArithResult<bool> {
        Ok(self.compare(left, right)? == Ordering::Less)
    }

    fn less_than_or_equal(&self, left: &Value, right: &Value) -> ArithResult<bool> {
        Ok(self.compare(left, right)? != Ordering::Greater)
    }

    fn greater_than(&self, left: &Value, right: &Value) -> ArithResult<bool> {
        Ok(self.compare(left, right)? == Ordering::Greater)
    }

    fn greater_than_or_equal(&self, left: &Value, right: &Value) -> ArithResult<bool> {
        Ok(self.compare(left, right)? != Ordering::Less)
    }

    fn to_boolean(&self, value: &Value) -> ArithResult<bool> {
        match value {
            Value::Null => {
                self.null_operand()?;
                Ok(false)
            }
            Value::Bool(b) => Ok(*b),
            Value::Str(s) => Ok(!s.is_empty() && &**s != "false"),
            Value::Array(items) => Ok(!items.is_empty()),
            Value::Map(map) => Ok(!map.is_empty()),
            other => match other.as_f64() {
                Some(x) => Ok(x != 0.0 && !x.is_nan()),
                None => Ok(true),
            },
        }
    }

    fn matches(&self, left: &Value, pattern: &Value) -> ArithResult<bool> {
        let Value::Str(pattern) = pattern else {
            return Err(ArithmeticError::InvalidPattern(format!(
                "{} is not a pattern",
                pattern.type_name()
            )));
        };
        if left.is_null() {
            self.null_operand()?;
            return Ok(false);
        }
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| ArithmeticError::InvalidPattern(e.to_string()))?;
        Ok(regex.is_match(&left.to_string()))
    }

    fn narrow_arguments(&self, args: &mut [Value]) -> bool {
        let mut changed = false;
        for arg in args.iter_mut() {
            let narrowed = match *arg {
                Value::Short(_) | Value::Int(_) | Value::Long(_) => {
                    arg.as_i64().map(|n| fit_integer(n, NumberClass::Byte))
                }
                Value::Double(x) => exact_f32(x).map(Value::Float),
                _ => None,
            };
            if let Some(value) = narrowed {
                if value.number_class() != arg.number_class() {
                    *arg = value;
                    changed = true;
                }
            }
        }
        changed
    }

    fn narrow_number(&self, value: Value, class: NumberClass) -> Value {
        let exact = value.as_exact_i64();
        let narrowed = match class {
            NumberClass::Byte => exact.and_then(|n| i8::try_from(n).ok()).map(Value::Byte),
            NumberClass::Short => exact.and_then(|n| i16::try_from(n).ok()).map(Value::Short),
            NumberClass::Int => exact.and_then(|n| i32::try_from(n).ok()).map(Value::Int),
            NumberClass::Long => exact.map(Value::Long),
            NumberClass::Float => value.as_f64().and_then(exact_f32).map(Value::Float),
            NumberClass::Double => value.as_f64().map(Value::Double),
        };
        narrowed.unwrap_or(value)
    }
}
