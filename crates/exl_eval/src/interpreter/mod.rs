//! Tree-walking interpreter.
//!
//! One [`Interpreter`] runs one evaluation: it owns the activation frame, the
//! functor table and the cancellation state, and borrows everything shared
//! (engine, program, context). Lambda calls run a nested interpreter over the
//! closure's program and frame.
//!
//! # Architecture
//!
//! All evaluation goes through `eval(NodeId)` in `eval.rs`, a single `match`
//! over `NodeKind`. The other modules add the node families:
//!
//! - `reference` - identifier chains, array access, property reads
//! - `assign` - assignment targets and property writes
//! - `operators` - binary and unary operators
//! - `control` - statements, lambdas, `size` and `empty`
//! - `invoke` - method, function and constructor calls, namespaces
//!
//! # Error policy
//!
//! Most faults go through [`Interpreter::recover`]: escalated when strict,
//! else logged and replaced by null. Call-target mismatches (no such method,
//! constructor or namespace, a failing namespace factory) and unhashable map
//! keys are returned directly. `Return` and `Cancel` travel as
//! [`ControlAction`] variants and ignore both policies.

mod assign;
mod control;
mod eval;
mod invoke;
mod operators;
mod reference;
mod scope_guard;

use std::sync::Arc;

use exl_ir::{NodeId, SyntaxTree};
use rustc_hash::FxHashMap;

use crate::arithmetic::Arithmetic;
use crate::cancel::CancelToken;
use crate::context::Context;
use crate::engine::{Engine, SharedProgram};
use crate::errors::{self, ControlAction, EvalError, EvalResult};
use crate::frame::Frame;
use crate::value::Value;

use scope_guard::FunctorScope;

/// State of one evaluation.
pub(crate) struct Interpreter<'a> {
    engine: &'a Engine,
    program: &'a SharedProgram,
    tree: &'a SyntaxTree,
    context: &'a dyn Context,
    frame: Frame,
    arithmetic: Arc<dyn Arithmetic>,
    strict: bool,
    silent: bool,
    cache: bool,
    cancel: CancelToken,
    /// Sticky once set.
    cancelled: bool,
    /// Namespace instances created during this evaluation, by prefix.
    functors: Option<FxHashMap<Box<str>, Value>>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter for a top-level evaluation. Per-context options override
    /// the engine's.
    pub(crate) fn new(
        engine: &'a Engine,
        program: &'a SharedProgram,
        context: &'a dyn Context,
        frame: Frame,
        cancel: CancelToken,
    ) -> Self {
        let options = context.options();
        let defaults = engine.options();
        let arithmetic = match options.strict_arithmetic {
            Some(strict) if strict != engine.arithmetic().is_strict() => {
                engine.arithmetic().with_strictness(strict)
            }
            _ => Arc::clone(engine.arithmetic()),
        };
        Interpreter {
            engine,
            program,
            tree: program.tree(),
            context,
            frame,
            arithmetic,
            strict: options.strict.unwrap_or(defaults.strict),
            silent: options.silent.unwrap_or(defaults.silent),
            cache: defaults.cache,
            cancel,
            cancelled: false,
            functors: None,
        }
    }

    /// Interpreter for a closure body: same engine, context and policies,
    /// the closure's own program and frame, and a fresh functor table.
    fn nested<'b>(&self, program: &'b SharedProgram, frame: Frame) -> Interpreter<'b>
    where
        'a: 'b,
    {
        Interpreter {
            engine: self.engine,
            program,
            tree: program.tree(),
            context: self.context,
            frame,
            arithmetic: Arc::clone(&self.arithmetic),
            strict: self.strict,
            silent: self.silent,
            cache: self.cache,
            cancel: self.cancel.clone(),
            cancelled: self.cancelled,
            functors: None,
        }
    }

    /// Evaluate `root` as a whole script.
    ///
    /// A `Return` yields its value; a cancellation becomes a `Cancelled`
    /// error whatever the policies; any other error is logged and turned
    /// into null when silent. The functor table is released on every path.
    pub(crate) fn interpret(&mut self, root: NodeId) -> Result<Value, EvalError> {
        let result = self.functor_scope().eval(root);
        match result {
            Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Cancel) => Err(self.error_at(root, errors::cancelled())),
            Err(ControlAction::Error(error)) if self.silent && !error.is_cancelled() => {
                tracing::warn!(error = %error, node = ?error.node, "evaluation failed");
                Ok(Value::Null)
            }
            Err(ControlAction::Error(error)) => Err(*error),
        }
    }

    fn functor_scope(&mut self) -> FunctorScope<'_, 'a> {
        FunctorScope::new(self)
    }

    /// Sample the cancellation flag.
    fn check_cancel(&mut self) -> Result<(), ControlAction> {
        if self.cancelled || self.cancel.is_cancelled() {
            self.cancelled = true;
            return Err(ControlAction::Cancel);
        }
        Ok(())
    }

    fn error_at(&self, node: NodeId, error: EvalError) -> EvalError {
        error.at(node, self.tree.span(node))
    }

    /// An error that escalates whatever the policies.
    fn fail(&self, node: NodeId, error: EvalError) -> ControlAction {
        self.error_at(node, error).into()
    }

    /// A missing-value error: escalated when strict, else logged (unless
    /// silent) and evaluated as null.
    fn recover(&self, node: NodeId, error: EvalError) -> EvalResult {
        let error = self.error_at(node, error);
        if self.strict {
            return Err(error.into());
        }
        if !self.silent {
            tracing::warn!(error = %error, node = %node, "recovered evaluation error");
        }
        Ok(Value::Null)
    }

    /// [`recover`](Self::recover) for statements that produce no value.
    fn recover_unit(&self, node: NodeId, error: EvalError) -> Result<(), ControlAction> {
        self.recover(node, error).map(drop)
    }
}
