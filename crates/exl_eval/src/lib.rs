//! Exl Eval - tree-walking interpreter for exl expressions and scripts.
//!
//! This crate evaluates the syntax trees built with `exl_ir` against a
//! caller-owned [`Context`].
//!
//! # Architecture
//!
//! - [`Engine`]: shared configuration (options, arithmetic, introspection,
//!   function namespaces)
//! - [`Script`]: one tree plus its call-site cache, executed against contexts
//! - `Interpreter`: the per-evaluation walker (frame, functors, cancellation)
//! - [`Arithmetic`]: every operator and coercion, pluggable
//! - [`Uberspect`]: member resolution on runtime values, pluggable
//!
//! # Error policy
//!
//! Unknown variables and properties, failed host calls and null targets are
//! logged and evaluate to null unless the engine or context is strict.
//! A silent evaluation returns null instead of any error except
//! cancellation. See [`EvalErrorKind`] for every category.

mod arithmetic;
mod cache;
mod cancel;
mod closure;
mod context;
mod engine;
pub mod errors;
mod frame;
mod interpreter;
pub mod introspect;
mod namespace;
mod stack;
mod value;

pub use arithmetic::{ArithResult, Arithmetic, ArithmeticError, DefaultArithmetic};
pub use cache::CallSiteCache;
pub use cancel::CancelToken;
pub use closure::Closure;
pub use context::{Context, ContextOptions, MapContext, ReadOnlyContext};
pub use engine::{Engine, EngineBuilder, EngineOptions, Program, Script, SharedProgram};
pub use errors::{
    ControlAction, ErrorCause, EvalError, EvalErrorKind, EvalResult, HostError, ReadonlyError,
};
pub use frame::Frame;
pub use introspect::{
    BuiltinUberspect, CachedHandle, HostClass, HostClassBuilder, MethodHandle, ParamType,
    PropertyGet, PropertySet, Uberspect, ValueIter,
};
pub use namespace::{Namespace, NamespaceFactory};
pub use stack::ensure_sufficient_stack;
pub use value::{ArrayRef, HostObject, MapKey, MapRef, NativeFunction, Value};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests use unwrap for brevity")]
mod tests;
