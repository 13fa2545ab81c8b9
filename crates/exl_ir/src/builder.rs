//! Tree construction with register resolution.
//!
//! The builder is the parser-facing half of this crate: a parser (or a test)
//! allocates nodes bottom-up, and the builder tracks lexical scopes so every
//! identifier gets its register slot at creation time.
//!
//! # Scoping
//!
//! - Script parameters and `var` declarations get a slot in the innermost scope.
//! - An identifier resolves to the innermost scope declaring its name.
//! - When that scope is outside the current lambda, the name is hoisted: each
//!   lambda between the declaring scope and the current one gets its own slot
//!   plus a `Capture` that copies the value in when the closure is created.
//! - Names found in no scope stay unbound and resolve against the context.

use rustc_hash::FxHashMap;

use crate::{
    BinaryOp, Capture, FrameLayout, Ident, LambdaLayout, Node, NodeId, NodeKind, NumberLiteral,
    Span, SyntaxTree, UnaryOp,
};

#[derive(Default)]
struct LexicalScope {
    names: FxHashMap<Box<str>, u32>,
    layout: FrameLayout,
    captures: Vec<Capture>,
}

impl LexicalScope {
    fn with_parameters(parameters: &[&str]) -> Self {
        let mut scope = LexicalScope::default();
        for name in parameters {
            scope.allocate(name);
        }
        scope.layout.parameters = scope.layout.registers;
        scope
    }

    fn allocate(&mut self, name: &str) -> u32 {
        let register = self.layout.registers;
        self.layout.registers += 1;
        self.names.insert(name.into(), register);
        register
    }
}

/// Builds a [`SyntaxTree`], assigning register indices as it goes.
///
/// ```text
/// let mut b = TreeBuilder::new();
/// let foo = b.ident("foo");
/// let two = b.int(2);
/// let sum = b.binary(BinaryOp::Add, foo, two);
/// let tree = b.finish(vec![sum]);
/// ```
pub struct TreeBuilder {
    nodes: Vec<Node>,
    scopes: Vec<LexicalScope>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Builder for a script without parameters.
    pub fn new() -> Self {
        Self::with_parameters(&[])
    }

    /// Builder for a script whose leading registers receive `parameters`.
    pub fn with_parameters(parameters: &[&str]) -> Self {
        TreeBuilder {
            nodes: Vec::new(),
            scopes: vec![LexicalScope::with_parameters(parameters)],
        }
    }

    fn alloc(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "node ids are u32; trees never approach that size"
        )]
        let id = NodeId::new(self.nodes.len() as u32);
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            children: children.into_boxed_slice(),
            parent: None,
            span: None,
        });
        id
    }

    /// Resolve `name` to a register of the current scope, hoisting through
    /// enclosing lambdas as needed.
    fn resolve(&mut self, name: &str) -> Option<u32> {
        let depth = self
            .scopes
            .iter()
            .rposition(|scope| scope.names.contains_key(name))?;
        let mut register = self.scopes[depth].names.get(name).copied()?;
        for scope in &mut self.scopes[depth + 1..] {
            let local = scope.allocate(name);
            scope.captures.push(Capture {
                parent: register,
                local,
            });
            register = local;
        }
        Some(register)
    }

    fn current_scope(&mut self) -> &mut LexicalScope {
        if self.scopes.is_empty() {
            self.scopes.push(LexicalScope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Attach a source span to an already built node.
    pub fn at(&mut self, id: NodeId, span: Span) -> NodeId {
        self.nodes[id.index()].span = Some(span);
        id
    }

    // Literals

    pub fn null(&mut self) -> NodeId {
        self.alloc(NodeKind::Null, vec![])
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        let kind = if value { NodeKind::True } else { NodeKind::False };
        self.alloc(kind, vec![])
    }

    pub fn number(&mut self, literal: NumberLiteral) -> NodeId {
        self.alloc(NodeKind::Number(literal), vec![])
    }

    pub fn int(&mut self, n: i32) -> NodeId {
        self.number(NumberLiteral::Int(n))
    }

    pub fn long(&mut self, n: i64) -> NodeId {
        self.number(NumberLiteral::Long(n))
    }

    pub fn double(&mut self, x: f64) -> NodeId {
        self.number(NumberLiteral::Double(x))
    }

    pub fn string(&mut self, s: &str) -> NodeId {
        self.alloc(NodeKind::Str(s.into()), vec![])
    }

    pub fn array(&mut self, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ArrayLiteral, items)
    }

    pub fn map(&mut self, entries: Vec<(NodeId, NodeId)>) -> NodeId {
        let entries = entries
            .into_iter()
            .map(|(key, value)| self.alloc(NodeKind::MapEntry, vec![key, value]))
            .collect();
        self.alloc(NodeKind::MapLiteral, entries)
    }

    // Names

    /// An identifier in variable position; bound to a register when a scope
    /// declares `name`.
    pub fn ident(&mut self, name: &str) -> NodeId {
        let register = self.resolve(name);
        self.alloc(
            NodeKind::Identifier(Ident {
                name: name.into(),
                register,
            }),
            vec![],
        )
    }

    /// An identifier in property position (a chain link after the first);
    /// never bound to a register.
    pub fn property(&mut self, name: &str) -> NodeId {
        self.alloc(
            NodeKind::Identifier(Ident {
                name: name.into(),
                register: None,
            }),
            vec![],
        )
    }

    /// Declare a local variable in the current scope (`var name`).
    pub fn var(&mut self, name: &str) -> NodeId {
        let register = self.current_scope().allocate(name);
        self.alloc(
            NodeKind::Var(Ident {
                name: name.into(),
                register: Some(register),
            }),
            vec![],
        )
    }

    /// A dotted chain `a.b.c`, `a.b()`, `a[0].b` ...
    pub fn reference(&mut self, links: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Reference, links)
    }

    /// Shorthand for a reference made only of names: the first is a variable,
    /// the rest are properties.
    pub fn path(&mut self, names: &[&str]) -> NodeId {
        let mut links = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let link = if i == 0 {
                self.ident(name)
            } else {
                self.property(name)
            };
            links.push(link);
        }
        self.reference(links)
    }

    /// `object[index][index]...`
    pub fn array_access(&mut self, object: NodeId, indices: Vec<NodeId>) -> NodeId {
        let mut children = Vec::with_capacity(indices.len() + 1);
        children.push(object);
        children.extend(indices);
        self.alloc(NodeKind::ArrayAccess, children)
    }

    // Operators

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::Binary(op), vec![left, right])
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.alloc(NodeKind::Unary(op), vec![operand])
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.alloc(NodeKind::Assignment, vec![target, value])
    }

    // Calls

    /// A method link `name(args)`, invoked on the object to its left in a chain.
    pub fn method(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let name = self.property(name);
        self.call_node(name, args)
    }

    /// A top-level call `name(args)`; `name` may be a local holding a closure.
    ///
    /// Wrap the result in [`reference`](Self::reference) as its first link.
    pub fn call(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let name = self.ident(name);
        self.call_node(name, args)
    }

    fn call_node(&mut self, name: NodeId, args: Vec<NodeId>) -> NodeId {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(name);
        children.extend(args);
        self.alloc(NodeKind::Method, children)
    }

    /// `namespace:name(args)`.
    pub fn function(&mut self, namespace: &str, name: &str, args: Vec<NodeId>) -> NodeId {
        let name = self.property(name);
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(name);
        children.extend(args);
        self.alloc(
            NodeKind::Function {
                namespace: namespace.into(),
            },
            children,
        )
    }

    /// `new(class, args)`.
    pub fn constructor(&mut self, class: NodeId, args: Vec<NodeId>) -> NodeId {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(class);
        children.extend(args);
        self.alloc(NodeKind::Constructor, children)
    }

    pub fn size(&mut self, operand: NodeId) -> NodeId {
        self.alloc(NodeKind::SizeFunction, vec![operand])
    }

    /// `.size()` as a chain link.
    pub fn size_method(&mut self) -> NodeId {
        self.alloc(NodeKind::SizeMethod, vec![])
    }

    pub fn empty(&mut self, operand: NodeId) -> NodeId {
        self.alloc(NodeKind::EmptyFunction, vec![operand])
    }

    // Statements

    pub fn if_else(&mut self, cond: NodeId, then: NodeId, otherwise: Option<NodeId>) -> NodeId {
        let mut children = vec![cond, then];
        children.extend(otherwise);
        self.alloc(NodeKind::If, children)
    }

    pub fn while_loop(&mut self, cond: NodeId, body: Option<NodeId>) -> NodeId {
        let mut children = vec![cond];
        children.extend(body);
        self.alloc(NodeKind::While, children)
    }

    /// `for (variable : iterable) body`; `variable` is an identifier or a `var`.
    pub fn foreach(&mut self, variable: NodeId, iterable: NodeId, body: Option<NodeId>) -> NodeId {
        let mut children = vec![variable, iterable];
        children.extend(body);
        self.alloc(NodeKind::Foreach, children)
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block, statements)
    }

    pub fn ternary(&mut self, cond: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        self.alloc(NodeKind::Ternary, vec![cond, then, otherwise])
    }

    /// Elvis form `cond ?: otherwise`.
    pub fn elvis(&mut self, cond: NodeId, otherwise: NodeId) -> NodeId {
        self.alloc(NodeKind::Ternary, vec![cond, otherwise])
    }

    pub fn ret(&mut self, operand: NodeId) -> NodeId {
        self.alloc(NodeKind::Return, vec![operand])
    }

    // Lambdas

    /// Open a lambda scope; its parameters take the leading registers.
    pub fn begin_lambda(&mut self, parameters: &[&str]) {
        self.scopes.push(LexicalScope::with_parameters(parameters));
    }

    /// Close the innermost lambda scope around `body`.
    pub fn end_lambda(&mut self, body: NodeId) -> NodeId {
        let scope = if self.scopes.len() > 1 {
            self.scopes.pop().unwrap_or_default()
        } else {
            LexicalScope::default()
        };
        let layout = LambdaLayout {
            frame: scope.layout,
            captures: scope.captures.into_boxed_slice(),
        };
        self.alloc(NodeKind::Lambda(layout), vec![body])
    }

    /// Wrap `statements` in the script root and freeze the tree.
    pub fn finish(mut self, statements: Vec<NodeId>) -> SyntaxTree {
        self.scopes.truncate(1);
        let layout = self
            .scopes
            .first()
            .map(|scope| scope.layout)
            .unwrap_or_default();
        let root = self.alloc(NodeKind::Script(layout), statements);
        SyntaxTree::new(self.nodes, root)
    }
}
