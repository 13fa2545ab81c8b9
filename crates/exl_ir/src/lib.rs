//! Exl IR - syntax tree types for the exl expression evaluator.
//!
//! This crate contains the immutable tree the interpreter walks:
//! - `NodeId` indices into a flat `SyntaxTree` arena
//! - `NodeKind`, the exhaustive set of node forms
//! - Operators and number literals
//! - Spans for diagnostics
//! - `TreeBuilder`, which assigns register slots while the tree is built
//!
//! # Design Philosophy
//!
//! - **Flatten Everything**: children are `NodeId(u32)` indices, never `Box<Node>`
//! - **Immutable After Build**: the interpreter only reads the tree; per-node
//!   mutable state (call-site caches) lives in side tables keyed by `NodeId`
//! - **Resolve Early**: register indices are fixed when an identifier node is
//!   created and never change afterwards

mod builder;
mod literal;
mod node;
mod node_id;
mod operators;
mod span;
mod tree;

pub use builder::TreeBuilder;
pub use literal::{NumberClass, NumberLiteral};
pub use node::{Capture, FrameLayout, Ident, LambdaLayout, Node, NodeKind};
pub use node_id::NodeId;
pub use operators::{BinaryOp, UnaryOp};
pub use span::Span;
pub use tree::{SharedTree, SyntaxTree};
