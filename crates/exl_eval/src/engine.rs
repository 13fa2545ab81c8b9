//! Engine configuration and compiled scripts.
//!
//! An [`Engine`] bundles the collaborators every evaluation needs: the
//! arithmetic strategy, the introspection service and the registry of
//! function namespaces. It is cheap to clone and safe to share. A [`Script`]
//! pairs an engine with one tree and that tree's call-site cache.

use std::fmt;
use std::sync::Arc;

use exl_ir::{FrameLayout, NodeKind, SharedTree, SyntaxTree};
use rustc_hash::FxHashMap;

use crate::arithmetic::{Arithmetic, DefaultArithmetic};
use crate::cache::CallSiteCache;
use crate::cancel::CancelToken;
use crate::closure::Closure;
use crate::context::Context;
use crate::errors::EvalError;
use crate::frame::Frame;
use crate::interpreter::Interpreter;
use crate::introspect::{BuiltinUberspect, Uberspect};
use crate::namespace::Namespace;
use crate::value::Value;

/// Engine-wide flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// Escalate unknown variables, unknown properties and failed invocations
    /// instead of logging them and yielding null.
    pub strict: bool,
    /// Swallow errors at the top level (logged, result null) and do not log
    /// recovered ones.
    pub silent: bool,
    /// Reuse resolved call-site handles across evaluations.
    pub cache: bool,
    /// Strictness of the default arithmetic strategy.
    pub strict_arithmetic: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            strict: false,
            silent: false,
            cache: true,
            strict_arithmetic: false,
        }
    }
}

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    options: EngineOptions,
    arithmetic: Option<Arc<dyn Arithmetic>>,
    uberspect: Option<Arc<dyn Uberspect>>,
    namespaces: FxHashMap<Box<str>, Namespace>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        EngineBuilder::default()
    }

    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.options.silent = silent;
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: bool) -> Self {
        self.options.cache = cache;
        self
    }

    /// Strictness of the default arithmetic. Ignored when a custom strategy
    /// is set with [`arithmetic`](Self::arithmetic).
    #[must_use]
    pub fn strict_arithmetic(mut self, strict: bool) -> Self {
        self.options.strict_arithmetic = strict;
        self
    }

    #[must_use]
    pub fn arithmetic(mut self, arithmetic: Arc<dyn Arithmetic>) -> Self {
        self.arithmetic = Some(arithmetic);
        self
    }

    #[must_use]
    pub fn uberspect(mut self, uberspect: Arc<dyn Uberspect>) -> Self {
        self.uberspect = Some(uberspect);
        self
    }

    /// Register a function namespace. The empty prefix is the global one.
    #[must_use]
    pub fn namespace(mut self, prefix: &str, namespace: impl Into<Namespace>) -> Self {
        self.namespaces.insert(prefix.into(), namespace.into());
        self
    }

    pub fn build(self) -> Engine {
        let mut options = self.options;
        let arithmetic = self.arithmetic.unwrap_or_else(|| {
            Arc::new(DefaultArithmetic::new(options.strict_arithmetic)) as Arc<dyn Arithmetic>
        });
        options.strict_arithmetic = arithmetic.is_strict();
        let uberspect = self
            .uberspect
            .unwrap_or_else(|| Arc::new(BuiltinUberspect::new()) as Arc<dyn Uberspect>);
        Engine {
            inner: Arc::new(EngineInner {
                options,
                arithmetic,
                uberspect,
                namespaces: self.namespaces,
            }),
        }
    }
}

struct EngineInner {
    options: EngineOptions,
    arithmetic: Arc<dyn Arithmetic>,
    uberspect: Arc<dyn Uberspect>,
    namespaces: FxHashMap<Box<str>, Namespace>,
}

/// Shared evaluation configuration.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// An engine with default options, arithmetic and introspection.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn arithmetic(&self) -> &Arc<dyn Arithmetic> {
        &self.inner.arithmetic
    }

    pub fn uberspect(&self) -> &dyn Uberspect {
        &*self.inner.uberspect
    }

    /// Registered namespace for `prefix`.
    pub fn namespace(&self, prefix: &str) -> Option<&Namespace> {
        self.inner.namespaces.get(prefix)
    }

    pub fn script(&self, tree: impl Into<SharedTree>) -> Script {
        Script {
            engine: self.clone(),
            program: SharedProgram::new(tree.into()),
        }
    }

    /// One-shot evaluation of `tree` without arguments.
    pub fn evaluate(&self, tree: SyntaxTree, context: &dyn Context) -> Result<Value, EvalError> {
        self.script(tree).execute(context, &[])
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.inner.options)
            .field("arithmetic", &self.inner.arithmetic)
            .field("namespaces", &self.inner.namespaces.len())
            .finish_non_exhaustive()
    }
}

/// A tree plus the call-site cache of its nodes.
#[derive(Debug)]
pub struct Program {
    tree: SharedTree,
    cache: CallSiteCache,
}

/// Thread-safe shared handle to a [`Program`].
#[derive(Clone, Debug)]
pub struct SharedProgram(Arc<Program>);

impl SharedProgram {
    pub fn new(tree: SharedTree) -> Self {
        SharedProgram(Arc::new(Program {
            tree,
            cache: CallSiteCache::new(),
        }))
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.0.tree
    }

    pub fn cache(&self) -> &CallSiteCache {
        &self.0.cache
    }

    pub fn ptr_eq(&self, other: &SharedProgram) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A tree ready to run against contexts.
#[derive(Clone, Debug)]
pub struct Script {
    engine: Engine,
    program: SharedProgram,
}

impl Script {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    /// Register layout of the root activation.
    pub fn layout(&self) -> FrameLayout {
        let tree = self.program.tree();
        match tree.kind(tree.root()) {
            NodeKind::Script(layout) => *layout,
            NodeKind::Lambda(layout) => layout.frame,
            _ => FrameLayout::default(),
        }
    }

    /// Number of declared script parameters.
    pub fn parameters(&self) -> u32 {
        self.layout().parameters
    }

    /// Run the script; `args` fill the declared parameters in order.
    pub fn execute(&self, context: &dyn Context, args: &[Value]) -> Result<Value, EvalError> {
        self.execute_with_cancel(context, args, &CancelToken::new())
    }

    /// Run the script, giving up with a `Cancelled` error once `cancel` is set.
    pub fn execute_with_cancel(
        &self,
        context: &dyn Context,
        args: &[Value],
        cancel: &CancelToken,
    ) -> Result<Value, EvalError> {
        let frame = Frame::new(self.layout());
        frame.assign(args);
        let mut interpreter =
            Interpreter::new(&self.engine, &self.program, context, frame, cancel.clone());
        interpreter.interpret(self.program.tree().root())
    }

    /// The script as a callable value, so it can be stored in a context and
    /// called like a lambda.
    pub fn as_callable(&self) -> Value {
        let root = self.program.tree().root();
        Value::Closure(Closure::new(
            self.program.clone(),
            root,
            Frame::new(self.layout()),
        ))
    }
}
