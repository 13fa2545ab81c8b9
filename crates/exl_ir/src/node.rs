//! Syntax tree nodes.
//!
//! Each node is a `NodeKind` tag plus an ordered list of child `NodeId`s.
//! Child layout per kind (the interpreter relies on it and does not re-check):
//!
//! | kind            | children                                          |
//! |-----------------|---------------------------------------------------|
//! | `Reference`     | chain links, left to right                        |
//! | `ArrayAccess`   | object, index, index, ...                         |
//! | `MapLiteral`    | `MapEntry` nodes                                  |
//! | `MapEntry`      | key, value                                        |
//! | `Binary`        | left, right                                       |
//! | `Unary`         | operand                                           |
//! | `Assignment`    | target, value                                     |
//! | `Method`        | name identifier, arguments...                     |
//! | `Function`      | name identifier, arguments...                     |
//! | `Constructor`   | class expression, arguments...                    |
//! | `SizeFunction`  | operand                                           |
//! | `EmptyFunction` | operand                                           |
//! | `If`            | condition, then, [else]                           |
//! | `While`         | condition, [body]                                 |
//! | `Foreach`       | loop variable, iterable, [body]                   |
//! | `Ternary`       | condition, then, else (or condition, else: elvis) |
//! | `Return`        | operand                                           |
//! | `Script`        | statements                                        |
//! | `Lambda`        | body                                              |

use crate::{BinaryOp, NodeId, NumberLiteral, Span, UnaryOp};

/// An identifier, optionally bound to a register slot of the current frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Box<str>,
    /// Register slot, fixed at tree construction. `None` means the name
    /// resolves against the context.
    pub register: Option<u32>,
}

/// Register layout of one activation (script or lambda body).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameLayout {
    /// Leading slots that receive call arguments.
    pub parameters: u32,
    /// Total slot count (parameters, locals and captured variables).
    pub registers: u32,
}

/// One captured variable: copy `parent` slot of the defining frame into
/// `local` slot of the lambda frame when the closure is created.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    pub parent: u32,
    pub local: u32,
}

/// Layout of a lambda: its own frame plus the captures bound at creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LambdaLayout {
    pub frame: FrameLayout,
    pub captures: Box<[Capture]>,
}

/// The node forms the interpreter dispatches on.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Literals
    Null,
    True,
    False,
    Number(NumberLiteral),
    Str(Box<str>),
    ArrayLiteral,
    MapLiteral,
    MapEntry,

    // Names and access chains
    Identifier(Ident),
    /// Local declaration (`var x`); evaluates like a register identifier.
    Var(Ident),
    Reference,
    ArrayAccess,

    // Operators
    Binary(BinaryOp),
    Unary(UnaryOp),
    Assignment,

    // Calls
    Method,
    /// Namespaced function call `ns:fn(...)`.
    Function {
        namespace: Box<str>,
    },
    Constructor,
    SizeFunction,
    /// `.size()` link inside a reference chain.
    SizeMethod,
    EmptyFunction,

    // Statements
    If,
    While,
    Foreach,
    Block,
    Ternary,
    Return,

    // Roots
    Script(FrameLayout),
    Lambda(LambdaLayout),
}

impl NodeKind {
    /// Short, stable name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::True => "true",
            Self::False => "false",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::ArrayLiteral => "array literal",
            Self::MapLiteral => "map literal",
            Self::MapEntry => "map entry",
            Self::Identifier(_) => "identifier",
            Self::Var(_) => "var",
            Self::Reference => "reference",
            Self::ArrayAccess => "array access",
            Self::Binary(_) => "binary",
            Self::Unary(_) => "unary",
            Self::Assignment => "assignment",
            Self::Method => "method",
            Self::Function { .. } => "function",
            Self::Constructor => "constructor",
            Self::SizeFunction => "size",
            Self::SizeMethod => "size method",
            Self::EmptyFunction => "empty",
            Self::If => "if",
            Self::While => "while",
            Self::Foreach => "foreach",
            Self::Block => "block",
            Self::Ternary => "ternary",
            Self::Return => "return",
            Self::Script(_) => "script",
            Self::Lambda(_) => "lambda",
        }
    }

    /// Identifier payload for `Identifier` and `Var` nodes.
    #[inline]
    pub fn ident(&self) -> Option<&Ident> {
        match self {
            Self::Identifier(ident) | Self::Var(ident) => Some(ident),
            _ => None,
        }
    }

    /// Whether this is an integer number literal.
    #[inline]
    pub fn is_integer_literal(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_integer())
    }
}

/// A node in the flat tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Box<[NodeId]>,
    pub parent: Option<NodeId>,
    pub span: Option<Span>,
}
