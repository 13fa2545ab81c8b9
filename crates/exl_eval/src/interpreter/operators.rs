//! Binary and unary operators.
//!
//! Values are never combined here: every operator delegates to the
//! arithmetic strategy. This module only sequences operand evaluation and
//! attributes faults to nodes.

use std::sync::Arc;

use exl_ir::{BinaryOp, NodeId, NodeKind, UnaryOp};

use super::Interpreter;
use crate::arithmetic::{ArithResult, Arithmetic, ArithmeticError};
use crate::errors::{self, ControlAction, EvalError, EvalResult};
use crate::value::{MapKey, Value};

type BinaryFn = fn(&dyn Arithmetic, &Value, &Value) -> ArithResult<Value>;

impl Interpreter<'_> {
    pub(super) fn eval_binary(&mut self, node: NodeId, op: BinaryOp) -> EvalResult {
        let apply: BinaryFn = match op {
            BinaryOp::And | BinaryOp::Or => return self.eval_logical(node, op),
            BinaryOp::Match | BinaryOp::NotMatch => return self.eval_pattern(node, op),
            BinaryOp::Add => |a, l, r| a.add(l, r),
            BinaryOp::Sub => |a, l, r| a.subtract(l, r),
            BinaryOp::Mul => |a, l, r| a.multiply(l, r),
            BinaryOp::Div => |a, l, r| a.divide(l, r),
            BinaryOp::Mod => |a, l, r| a.modulo(l, r),
            BinaryOp::BitAnd => |a, l, r| a.bitwise_and(l, r),
            BinaryOp::BitOr => |a, l, r| a.bitwise_or(l, r),
            BinaryOp::BitXor => |a, l, r| a.bitwise_xor(l, r),
            BinaryOp::Eq => |a, l, r| a.equals(l, r).map(Value::Bool),
            BinaryOp::NotEq => |a, l, r| a.equals(l, r).map(|eq| Value::Bool(!eq)),
            BinaryOp::Lt => |a, l, r| a.less_than(l, r).map(Value::Bool),
            BinaryOp::LtEq => |a, l, r| a.less_than_or_equal(l, r).map(Value::Bool),
            BinaryOp::Gt => |a, l, r| a.greater_than(l, r).map(Value::Bool),
            BinaryOp::GtEq => |a, l, r| a.greater_than_or_equal(l, r).map(Value::Bool),
        };

        let tree = self.tree;
        let left = self.eval(tree.child(node, 0))?;
        let right = self.eval(tree.child(node, 1))?;
        match apply(&*self.arithmetic, &left, &right) {
            Ok(value) => Ok(value),
            Err(cause) => self.binary_fault(node, op, &left, &right, cause),
        }
    }

    /// `&&` and `||`: `false && _` and `true || _` skip the right operand.
    fn eval_logical(&mut self, node: NodeId, op: BinaryOp) -> EvalResult {
        let tree = self.tree;
        let left_node = tree.child(node, 0);
        let right_node = tree.child(node, 1);
        let left = self.eval(left_node)?;
        let left = self.coerce_boolean(left_node, &left)?;
        if left != (op == BinaryOp::And) {
            return Ok(Value::Bool(left));
        }
        let right = self.eval(right_node)?;
        Ok(Value::Bool(self.coerce_boolean(right_node, &right)?))
    }

    /// `=~` and `!~`.
    fn eval_pattern(&mut self, node: NodeId, op: BinaryOp) -> EvalResult {
        let tree = self.tree;
        let left = self.eval(tree.child(node, 0))?;
        let right = self.eval(tree.child(node, 1))?;
        match self.eval_match(node, &left, &right)? {
            Ok(matched) => Ok(Value::Bool(matched == (op == BinaryOp::Match))),
            Err(cause) => self.binary_fault(node, op, &left, &right, cause),
        }
    }

    /// Any fault of a lenient division or modulo yields zero. Other faults
    /// are arithmetic errors, attributed to the null operand when that is
    /// the cause.
    fn binary_fault(
        &self,
        node: NodeId,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        cause: ArithmeticError,
    ) -> EvalResult {
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && !self.arithmetic.is_strict() {
            return Ok(Value::Double(0.0));
        }
        let tree = self.tree;
        let culprit = if cause == ArithmeticError::NullOperand {
            if left.is_null() {
                tree.child(node, 0)
            } else if right.is_null() {
                tree.child(node, 1)
            } else {
                node
            }
        } else {
            node
        };
        self.arithmetic_fault(culprit, errors::arithmetic_error(op.as_symbol(), cause))
    }

    /// Arithmetic faults escalate under strict arithmetic as well as under
    /// a strict engine.
    fn arithmetic_fault(&self, node: NodeId, error: EvalError) -> EvalResult {
        if self.arithmetic.is_strict() {
            return Err(self.fail(node, error));
        }
        self.recover(node, error)
    }

    /// `left =~ right`: a pattern when `right` is a string, else membership
    /// in a collection or in anything exposing `contains` or an iterator,
    /// else equality.
    fn eval_match(
        &mut self,
        node: NodeId,
        left: &Value,
        right: &Value,
    ) -> Result<ArithResult<bool>, ControlAction> {
        let arithmetic = Arc::clone(&self.arithmetic);
        match right {
            Value::Str(_) => return Ok(arithmetic.matches(left, right)),
            Value::Map(map) => {
                return Ok(Ok(MapKey::from_value(left).is_some_and(|key| map.contains_key(&key))));
            }
            Value::Array(items) => {
                let items = items.snapshot();
                return Ok(self.any_equals(left, items));
            }
            _ => {}
        }

        self.check_cancel()?;
        let engine = self.engine;
        let uberspect = engine.uberspect();
        let mut args = [left.clone()];
        let mut handle = uberspect.find_method(right, "contains", &args);
        if handle.is_none() && arithmetic.narrow_arguments(&mut args) {
            handle = uberspect.find_method(right, "contains", &args);
        }
        if let Some(handle) = handle {
            return match handle.invoke(right, &args) {
                Ok(found) => Ok(arithmetic.to_boolean(&found)),
                Err(cause) => self
                    .recover(node, errors::invocation_failed("contains", cause))
                    .map(|_| Ok(false)),
            };
        }

        if let Some(iter) = uberspect.iterator(right) {
            return Ok(self.any_equals(left, iter));
        }
        Ok(arithmetic.equals(left, right))
    }

    fn any_equals(&self, needle: &Value, items: impl IntoIterator<Item = Value>) -> ArithResult<bool> {
        for item in items {
            if self.arithmetic.equals(&item, needle)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(super) fn eval_unary(&mut self, node: NodeId, op: UnaryOp) -> EvalResult {
        let tree = self.tree;
        let operand_node = tree.child(node, 0);
        let operand = self.eval(operand_node)?;
        let arithmetic = &*self.arithmetic;
        match op {
            UnaryOp::Neg => match arithmetic.negate(&operand) {
                // A negated literal keeps the literal's class where it fits.
                Ok(negated) => match tree.kind(operand_node) {
                    NodeKind::Number(literal) => Ok(arithmetic.narrow_number(negated, literal.class())),
                    _ => Ok(negated),
                },
                Err(cause) => self.arithmetic_fault(operand_node, errors::arithmetic_error("-", cause)),
            },
            UnaryOp::Not => Ok(Value::Bool(!self.coerce_boolean(operand_node, &operand)?)),
            UnaryOp::BitNot => match arithmetic.bitwise_complement(&operand) {
                Ok(complement) => Ok(complement),
                Err(cause) => self.arithmetic_fault(operand_node, errors::arithmetic_error("~", cause)),
            },
        }
    }

    /// Truth value of `value`. A coercion fault is attributed to `node` and,
    /// when recovered, reads as false.
    pub(super) fn coerce_boolean(&self, node: NodeId, value: &Value) -> Result<bool, ControlAction> {
        match self.arithmetic.to_boolean(value) {
            Ok(truth) => Ok(truth),
            Err(cause) => self
                .arithmetic_fault(node, errors::boolean_coercion(cause))
                .map(|_| false),
        }
    }
}
