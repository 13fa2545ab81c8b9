//! Evaluation errors and the control signals threaded through evaluation.
//!
//! Errors are built through the factory functions at the bottom of this
//! module so that message wording lives in one place. The interpreter then
//! attributes each error to a node with [`EvalError::at`].

use exl_ir::{NodeId, Span};

use crate::arithmetic::ArithmeticError;
use crate::value::Value;

/// Result of evaluating one node.
pub type EvalResult = Result<Value, ControlAction>;

/// A fault raised by host code: a native function, a host class member or a
/// namespace factory.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        HostError {
            message: message.into(),
        }
    }
}

/// Returned by [`Context::set`](crate::Context::set) on a read-only context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("context is readonly")]
pub struct ReadonlyError;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error("undefined variable {name}")]
    UnknownVariable { name: String },

    #[error("undefined property {name}")]
    UnknownProperty { name: String },

    #[error("illegal assignment form: {detail}")]
    IllegalAssignment { detail: &'static str },

    #[error("unknown, ambiguous or inaccessible method {name}")]
    NoSuchMethod { name: String },

    #[error("unknown, ambiguous or inaccessible constructor for {class}")]
    NoSuchConstructor { class: String },

    #[error("invocation of {name} failed")]
    Invocation { name: String },

    #[error("{op} error")]
    Arithmetic { op: &'static str },

    #[error("boolean coercion error")]
    BooleanCoercion,

    #[error("context is readonly")]
    ReadonlyContext,

    #[error("no such function namespace {prefix}")]
    NoSuchNamespace { prefix: String },

    #[error("unable to instantiate namespace {prefix}")]
    NamespaceInstantiation { prefix: String },

    #[error("{what}")]
    NullTarget { what: &'static str },

    #[error("size() : unsupported type : {type_name}")]
    UnsupportedSize { type_name: String },

    #[error("map key not hashable: {type_name}")]
    MapKeyNotHashable { type_name: &'static str },

    #[error("execution cancelled")]
    Cancelled,

    #[error("{message}")]
    Custom { message: String },
}

/// Underlying cause attached to an [`EvalError`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCause {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// An evaluation error attributed to a node of the tree.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Node the error is attributed to.
    pub node: Option<NodeId>,
    pub span: Option<Span>,
    #[source]
    pub cause: Option<ErrorCause>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            node: None,
            span: None,
            cause: None,
        }
    }

    /// Attribute the error to `node`, keeping any earlier attribution.
    #[must_use]
    pub fn at(mut self, node: NodeId, span: Option<Span>) -> Self {
        if self.node.is_none() {
            self.node = Some(node);
            self.span = span;
        }
        self
    }

    #[must_use]
    pub fn caused_by(mut self, cause: impl Into<ErrorCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Whether this error is a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.kind == EvalErrorKind::Cancelled
    }
}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::new(kind)
    }
}

/// Non-value outcome of evaluating a node.
///
/// `Return` unwinds to the nearest script or lambda boundary, `Cancel` to the
/// top-level `interpret` call. Neither is subject to strict/silent policy.
#[derive(Debug)]
pub enum ControlAction {
    Error(Box<EvalError>),
    Return(Value),
    Cancel,
}

impl ControlAction {
    pub fn is_error(&self) -> bool {
        matches!(self, ControlAction::Error(_))
    }

    /// Collapse into an error; a stray `Return` becomes a custom error.
    pub fn into_eval_error(self) -> EvalError {
        match self {
            ControlAction::Error(e) => *e,
            ControlAction::Cancel => cancelled(),
            ControlAction::Return(value) => EvalError::new(EvalErrorKind::Custom {
                message: format!("return:{value}"),
            }),
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(error: EvalError) -> Self {
        ControlAction::Error(Box::new(error))
    }
}

// Factory functions

pub fn unknown_variable(name: impl Into<String>) -> EvalError {
    EvalErrorKind::UnknownVariable { name: name.into() }.into()
}

pub fn unknown_property(name: impl Into<String>) -> EvalError {
    EvalErrorKind::UnknownProperty { name: name.into() }.into()
}

pub fn illegal_assignment(detail: &'static str) -> EvalError {
    EvalErrorKind::IllegalAssignment { detail }.into()
}

pub fn no_such_method(name: impl Into<String>) -> EvalError {
    EvalErrorKind::NoSuchMethod { name: name.into() }.into()
}

pub fn no_such_constructor(class: impl Into<String>) -> EvalError {
    EvalErrorKind::NoSuchConstructor {
        class: class.into(),
    }
    .into()
}

pub fn invocation_failed(name: impl Into<String>, cause: HostError) -> EvalError {
    EvalError::from(EvalErrorKind::Invocation { name: name.into() }).caused_by(cause)
}

pub fn arithmetic_error(op: &'static str, cause: ArithmeticError) -> EvalError {
    EvalError::from(EvalErrorKind::Arithmetic { op }).caused_by(cause)
}

pub fn boolean_coercion(cause: ArithmeticError) -> EvalError {
    EvalError::from(EvalErrorKind::BooleanCoercion).caused_by(cause)
}

pub fn readonly_context() -> EvalError {
    EvalErrorKind::ReadonlyContext.into()
}

pub fn no_such_namespace(prefix: impl Into<String>) -> EvalError {
    EvalErrorKind::NoSuchNamespace {
        prefix: prefix.into(),
    }
    .into()
}

pub fn namespace_instantiation(prefix: impl Into<String>, cause: HostError) -> EvalError {
    EvalError::from(EvalErrorKind::NamespaceInstantiation {
        prefix: prefix.into(),
    })
    .caused_by(cause)
}

pub fn null_target(what: &'static str) -> EvalError {
    EvalErrorKind::NullTarget { what }.into()
}

pub fn unsupported_size(type_name: impl Into<String>) -> EvalError {
    EvalErrorKind::UnsupportedSize {
        type_name: type_name.into(),
    }
    .into()
}

pub fn map_key_not_hashable(type_name: &'static str) -> EvalError {
    EvalErrorKind::MapKeyNotHashable { type_name }.into()
}

pub fn cancelled() -> EvalError {
    EvalErrorKind::Cancelled.into()
}

pub fn custom(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Custom {
        message: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages() {
        assert_eq!(unknown_variable("foo").to_string(), "undefined variable foo");
        assert_eq!(
            arithmetic_error("/", ArithmeticError::DivisionByZero).to_string(),
            "/ error"
        );
        assert_eq!(
            null_target("attempting to call method on null").to_string(),
            "attempting to call method on null"
        );
    }

    #[test]
    fn first_attribution_wins() {
        let err = unknown_variable("x")
            .at(NodeId::new(3), None)
            .at(NodeId::new(7), Some(Span::new(0, 1)));
        assert_eq!(err.node, Some(NodeId::new(3)));
        assert_eq!(err.span, None);
    }

    #[test]
    fn cause_is_exposed_as_source() {
        use std::error::Error as _;
        let err = invocation_failed("size", HostError::new("boom"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn control_action_conversions() {
        let action: ControlAction = readonly_context().into();
        assert!(action.is_error());
        assert_eq!(action.into_eval_error().kind, EvalErrorKind::ReadonlyContext);
        assert!(ControlAction::Cancel.into_eval_error().is_cancelled());
        assert!(!ControlAction::Return(Value::Null).is_error());
    }
}
