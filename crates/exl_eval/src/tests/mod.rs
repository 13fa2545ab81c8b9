//! Test modules relocated from implementation files.
//!
//! The interpreter is exercised end to end: each test builds a tree with
//! `exl_ir::TreeBuilder` and runs it through an [`Engine`] against a
//! [`MapContext`](crate::MapContext).
//!
//! - `scenario_tests`: small expressions over a handful of context variables
//! - `reference_tests`: identifier chains, dotted names, assignment targets
//! - `invoke_tests`: methods, functions, namespaces, constructors, closures
//! - `operators_tests`: operator faults, short-circuiting, `=~`
//! - `control_tests`: statements, `size`/`empty`, cancellation
//! - `property_tests`: determinism and cache transparency

mod control_tests;
mod invoke_tests;
mod scenario_tests;

use std::sync::Once;

use exl_ir::SyntaxTree;

use crate::{Context, Engine, EvalError, EvalErrorKind, Value};

/// Install a fmt subscriber once per test binary, filtered by `RUST_LOG`.
pub(crate) fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Evaluate `tree` with a default (lenient) engine.
pub(crate) fn eval(tree: SyntaxTree, context: &dyn Context) -> Result<Value, EvalError> {
    eval_with(&Engine::new(), tree, context)
}

pub(crate) fn eval_with(
    engine: &Engine,
    tree: SyntaxTree,
    context: &dyn Context,
) -> Result<Value, EvalError> {
    init_tracing();
    engine.evaluate(tree, context)
}

pub(crate) fn strict_engine() -> Engine {
    Engine::builder().strict(true).build()
}

/// The error kind of a failed evaluation.
#[track_caller]
pub(crate) fn error_kind(result: Result<Value, EvalError>) -> EvalErrorKind {
    match result {
        Ok(value) => panic!("expected an error, got {value}"),
        Err(error) => error.kind,
    }
}
