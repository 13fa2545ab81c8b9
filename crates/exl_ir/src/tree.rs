//! The flat, immutable syntax tree.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::{Node, NodeId, NodeKind, Span};

/// Arena holding every node of one parsed script or expression.
///
/// Built once by [`TreeBuilder`](crate::TreeBuilder) and read-only afterwards.
#[derive(Clone, PartialEq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId) -> Self {
        SyntaxTree { nodes, root }
    }

    /// The script (or lambda) node evaluation starts from.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// The `index`-th child. The tree is assumed well-formed for its kind.
    #[inline]
    pub fn child(&self, id: NodeId, index: usize) -> NodeId {
        self.node(id).children[index]
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.node(id).span
    }

    /// Source-like text of a name or literal node, used to build dotted
    /// variable names (`a.b.0`).
    pub fn image(&self, id: NodeId) -> Cow<'_, str> {
        match self.kind(id) {
            NodeKind::Identifier(ident) | NodeKind::Var(ident) => Cow::Borrowed(&ident.name),
            NodeKind::Str(s) => Cow::Borrowed(s),
            NodeKind::Number(n) => Cow::Owned(n.to_string()),
            other => Cow::Borrowed(other.name()),
        }
    }

    /// Iterate over the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Thread-safe shared handle to a tree.
///
/// Closures keep the tree their lambda lives in alive through this handle,
/// so a closure stored in a context can outlive the evaluation that made it.
#[derive(Clone, Debug)]
pub struct SharedTree(Arc<SyntaxTree>);

impl SharedTree {
    pub fn new(tree: SyntaxTree) -> Self {
        SharedTree(Arc::new(tree))
    }

    /// Whether two handles point at the same tree.
    pub fn ptr_eq(&self, other: &SharedTree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SharedTree {
    type Target = SyntaxTree;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<SyntaxTree> for SharedTree {
    fn from(tree: SyntaxTree) -> Self {
        SharedTree::new(tree)
    }
}
