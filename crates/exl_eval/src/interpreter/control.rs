//! Statements, lambdas and the `size`/`empty` built-ins.

use exl_ir::{LambdaLayout, NodeId, NodeKind};

use super::Interpreter;
use crate::closure::Closure;
use crate::errors::{self, ControlAction, EvalResult};
use crate::value::Value;

impl Interpreter<'_> {
    /// Statements in order; the value of the last one, or null.
    pub(super) fn eval_block(&mut self, node: NodeId) -> EvalResult {
        let mut last = Value::Null;
        for &statement in self.tree.children(node) {
            last = self.eval(statement)?;
        }
        Ok(last)
    }

    pub(super) fn eval_if(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let children = tree.children(node);
        let condition = self.eval(children[0])?;
        if self.coerce_boolean(children[0], &condition)? {
            self.eval(children[1])
        } else if let Some(&otherwise) = children.get(2) {
            self.eval(otherwise)
        } else {
            Ok(Value::Null)
        }
    }

    pub(super) fn eval_while(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let children = tree.children(node);
        let condition_node = children[0];
        let body = children.get(1).copied();
        let mut result = Value::Null;
        loop {
            let condition = self.eval(condition_node)?;
            if !self.coerce_boolean(condition_node, &condition)? {
                break;
            }
            self.check_cancel()?;
            if let Some(body) = body {
                result = self.eval(body)?;
            }
        }
        Ok(result)
    }

    /// `for (x : items) body`. Null or non-iterable collections run no
    /// iteration. The loop variable is a register or a context name.
    pub(super) fn eval_foreach(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let children = tree.children(node);
        let mut variable = children[0];
        if matches!(tree.kind(variable), NodeKind::Reference) {
            variable = tree.child(variable, 0);
        }
        let Some(ident) = tree.kind(variable).ident() else {
            return self.recover(variable, errors::illegal_assignment("loop variable is not a name"));
        };

        let iterable = self.eval(children[1])?;
        let Some(&body) = children.get(2) else {
            return Ok(Value::Null);
        };
        if iterable.is_null() {
            return Ok(Value::Null);
        }
        let engine = self.engine;
        let Some(items) = engine.uberspect().iterator(&iterable) else {
            return Ok(Value::Null);
        };

        let mut result = Value::Null;
        for item in items {
            self.check_cancel()?;
            self.assign_variable(variable, ident, item)?;
            result = self.eval(body)?;
        }
        Ok(result)
    }

    /// `c ? a : b`, or the elvis form `c ?: b`. A null condition always
    /// selects the last branch.
    pub(super) fn eval_ternary(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let children = tree.children(node);
        let condition_node = children[0];
        let otherwise = children[children.len() - 1];
        let condition = self.eval(condition_node)?;
        if condition.is_null() {
            return self.eval(otherwise);
        }
        let truthy = self.coerce_boolean(condition_node, &condition)?;
        match children {
            [_, then, _] if truthy => self.eval(*then),
            [_, _] if truthy => Ok(condition),
            _ => self.eval(otherwise),
        }
    }

    pub(super) fn eval_return(&mut self, node: NodeId) -> EvalResult {
        let value = self.eval(self.tree.child(node, 0))?;
        Err(ControlAction::Return(value))
    }

    /// A closure over a fresh frame with this frame's captured slots copied in.
    pub(super) fn make_closure(&self, node: NodeId, layout: &LambdaLayout) -> Value {
        Value::Closure(Closure::new(
            self.program.clone(),
            node,
            self.frame.child(layout),
        ))
    }

    /// `size(x)`: characters of a string, elements of a collection, or the
    /// integer result of the value's own `size()` method.
    pub(super) fn size_of(&mut self, node: NodeId, value: &Value) -> EvalResult {
        let size = match value {
            Value::Null => {
                return self.recover(node, errors::null_target("size() : argument is null"));
            }
            Value::Str(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Map(map) => map.len(),
            other => return self.size_by_method(node, other),
        };
        Ok(Value::integer(i64::try_from(size).unwrap_or(i64::MAX)))
    }

    fn size_by_method(&mut self, node: NodeId, value: &Value) -> EvalResult {
        self.check_cancel()?;
        let engine = self.engine;
        if let Some(handle) = engine.uberspect().find_method(value, "size", &[]) {
            return match handle.invoke(value, &[]) {
                Ok(size) if size.as_i64().is_some() => Ok(size),
                Ok(_) => self.recover(node, errors::unsupported_size(value.type_name())),
                Err(cause) => self.recover(node, errors::invocation_failed("size", cause)),
            };
        }
        self.recover(node, errors::unsupported_size(value.type_name()))
    }

    /// `empty(x)`: null, empty strings and empty collections are empty; an
    /// object is empty when its `size()` is zero.
    pub(super) fn is_empty_value(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Object(_) => {
                let engine = self.engine;
                engine
                    .uberspect()
                    .find_method(value, "size", &[])
                    .and_then(|handle| handle.invoke(value, &[]).ok())
                    .and_then(|size| size.as_i64())
                    .is_some_and(|size| size == 0)
            }
            _ => false,
        }
    }
}
