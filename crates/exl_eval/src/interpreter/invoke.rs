//! Method, function and constructor calls.
//!
//! A call resolves in a fixed order: the cached handle of the call site, a
//! method found by the introspection service, the same lookup after
//! narrowing numeric arguments, and finally a functor (a closure or native
//! function) stored under the method's name. Namespace instances built by a
//! factory are kept for the rest of the evaluation.

use exl_ir::NodeId;
use smallvec::SmallVec;

use super::Interpreter;
use crate::closure::Closure;
use crate::errors::{self, ControlAction, EvalResult, HostError};
use crate::introspect::CachedHandle;
use crate::namespace::Namespace;
use crate::value::Value;

type Args = SmallVec<[Value; 4]>;

/// What a call is made on.
enum Receiver {
    /// A top-level call with no global namespace: only functors stored in
    /// registers or context variables apply.
    Context,
    /// A top-level call on the global namespace, falling back to functors
    /// stored in registers or context variables.
    Global(Value),
    Value(Value),
}

impl Receiver {
    fn target(&self) -> Option<&Value> {
        match self {
            Receiver::Context => None,
            Receiver::Global(target) | Receiver::Value(target) => Some(target),
        }
    }
}

impl Interpreter<'_> {
    /// `name(args)` outside any chain.
    pub(super) fn eval_top_method(&mut self, node: NodeId) -> EvalResult {
        let receiver = match self.resolve_namespace(node, "")? {
            Some(namespace) => Receiver::Global(namespace),
            None => Receiver::Context,
        };
        self.call(node, receiver)
    }

    /// `object.name(args)`.
    pub(super) fn eval_method(&mut self, node: NodeId, object: Value) -> EvalResult {
        if object.is_null() {
            return self.recover(node, errors::null_target("attempting to call method on null"));
        }
        self.call(node, Receiver::Value(object))
    }

    /// `prefix:name(args)`.
    pub(super) fn eval_function(&mut self, node: NodeId, prefix: &str) -> EvalResult {
        let receiver = match self.resolve_namespace(node, prefix)? {
            Some(namespace) => Receiver::Value(namespace),
            None => Receiver::Context,
        };
        self.call(node, receiver)
    }

    fn eval_args(&mut self, arg_nodes: &[NodeId]) -> Result<Args, ControlAction> {
        let mut args = Args::with_capacity(arg_nodes.len());
        for &arg in arg_nodes {
            args.push(self.eval(arg)?);
        }
        Ok(args)
    }

    fn call(&mut self, node: NodeId, receiver: Receiver) -> EvalResult {
        self.check_cancel()?;
        let tree = self.tree;
        let program = self.program;
        let engine = self.engine;
        let children = tree.children(node);
        let name_node = children[0];
        let name = tree.image(name_node);
        let mut args = self.eval_args(&children[1..])?;

        if let Some(target) = receiver.target() {
            if self.cache {
                if let Some(CachedHandle::Method(handle)) = program.cache().get(node) {
                    if let Some(result) = handle.try_invoke(&name, target, &args) {
                        return self.invocation_result(node, &name, result);
                    }
                }
            }

            let uberspect = engine.uberspect();
            let mut handle = uberspect.find_method(target, &name, &args);
            if handle.is_none() && self.arithmetic.narrow_arguments(&mut args) {
                handle = uberspect.find_method(target, &name, &args);
            }
            if let Some(handle) = handle {
                let result = handle.invoke(target, &args);
                if result.is_ok() && self.cache && handle.is_cacheable() {
                    tracing::debug!(node = %node, method = %name, "caching method");
                    program.cache().store(node, CachedHandle::Method(handle));
                }
                return self.invocation_result(node, &name, result);
            }
        }

        let mut functor = receiver.target().and_then(|target| {
            engine
                .uberspect()
                .find_property_get(target, &Value::string(&*name))
                .and_then(|getter| getter.invoke(target).ok())
                .filter(Value::is_callable)
        });
        if functor.is_none() && !matches!(receiver, Receiver::Value(_)) {
            functor = match tree.kind(name_node).ident().and_then(|ident| ident.register) {
                Some(register) => Some(self.frame.get(register)),
                None => self.context.get(&name),
            };
        }
        match functor {
            Some(Value::Closure(closure)) => self.call_closure(&closure, &args),
            Some(Value::Function(function)) => {
                let result = function.call(&args);
                self.invocation_result(node, &name, result)
            }
            _ => Err(self.fail(node, errors::no_such_method(&*name))),
        }
    }

    fn invocation_result(
        &self,
        node: NodeId,
        name: &str,
        result: Result<Value, HostError>,
    ) -> EvalResult {
        match result {
            Ok(value) => Ok(value),
            Err(cause) => self.recover(node, errors::invocation_failed(name, cause)),
        }
    }

    /// The namespace object for `prefix`, instantiating a factory on first
    /// use in this evaluation. The empty prefix may be unbound.
    fn resolve_namespace(&mut self, node: NodeId, prefix: &str) -> Result<Option<Value>, ControlAction> {
        if let Some(instance) = self.functors.as_ref().and_then(|f| f.get(prefix)) {
            return Ok(Some(instance.clone()));
        }
        let engine = self.engine;
        let namespace = self
            .context
            .namespace(prefix)
            .or_else(|| engine.namespace(prefix).cloned());
        match namespace {
            None if prefix.is_empty() => Ok(None),
            None => Err(self.fail(node, errors::no_such_namespace(prefix))),
            Some(Namespace::Value(value)) => Ok(Some(value)),
            Some(Namespace::Factory(factory)) => match factory.instantiate(self.context) {
                Ok(instance) => {
                    tracing::debug!(prefix, "instantiated namespace");
                    self.functors
                        .get_or_insert_with(Default::default)
                        .insert(prefix.into(), instance.clone());
                    Ok(Some(instance))
                }
                Err(cause) => Err(self.fail(node, errors::namespace_instantiation(prefix, cause))),
            },
        }
    }

    /// `new(class, args)`.
    pub(super) fn eval_constructor(&mut self, node: NodeId) -> EvalResult {
        self.check_cancel()?;
        let tree = self.tree;
        let program = self.program;
        let engine = self.engine;
        let children = tree.children(node);
        let class = self.eval(children[0])?;
        let mut args = self.eval_args(&children[1..])?;

        if self.cache {
            if let Some(CachedHandle::Constructor(handle)) = program.cache().get(node) {
                if let Some(result) = handle.try_invoke("", &class, &args) {
                    return self.invocation_result(node, "new", result);
                }
            }
        }

        let uberspect = engine.uberspect();
        let mut handle = uberspect.find_constructor(&class, &args);
        if handle.is_none() && self.arithmetic.narrow_arguments(&mut args) {
            handle = uberspect.find_constructor(&class, &args);
        }
        let Some(handle) = handle else {
            return Err(self.fail(node, errors::no_such_constructor(class.to_string())));
        };
        let result = handle.invoke(&class, &args);
        if result.is_ok() && self.cache && handle.is_cacheable() {
            tracing::debug!(node = %node, class = %class, "caching constructor");
            program.cache().store(node, CachedHandle::Constructor(handle));
        }
        self.invocation_result(node, "new", result)
    }

    /// Run a closure body with `args` written into its frame. The body runs
    /// in a nested interpreter over the closure's own program, so a closure
    /// made by another script evaluates against that script's tree.
    pub(super) fn call_closure(&mut self, closure: &Closure, args: &[Value]) -> EvalResult {
        let frame = closure.frame().clone();
        frame.assign(args);
        let program = closure.program().clone();
        let mut nested = self.nested(&program, frame);
        let result = nested.eval(closure.body());
        if nested.cancelled {
            self.cancelled = true;
        }
        match result {
            Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }
}
