//! Lambda values.

use std::fmt;

use exl_ir::{NodeId, NodeKind};

use crate::engine::SharedProgram;
use crate::frame::Frame;

/// A lambda (or a whole script) bound to the frame it runs in.
///
/// The frame is created when the closure is: captured slots are copied in
/// then, and every call writes its arguments into the same frame.
#[derive(Clone)]
pub struct Closure {
    program: SharedProgram,
    node: NodeId,
    frame: Frame,
}

impl Closure {
    pub(crate) fn new(program: SharedProgram, node: NodeId, frame: Frame) -> Self {
        Closure {
            program,
            node,
            frame,
        }
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    /// The lambda or script node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Node evaluated on each call: the lambda body, or the script itself.
    pub fn body(&self) -> NodeId {
        let tree = self.program.tree();
        match tree.kind(self.node) {
            NodeKind::Lambda(_) => tree.child(self.node, 0),
            _ => self.node,
        }
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> u32 {
        match self.program.tree().kind(self.node) {
            NodeKind::Lambda(layout) => layout.frame.parameters,
            NodeKind::Script(layout) => layout.parameters,
            _ => 0,
        }
    }

    pub fn ptr_eq(&self, other: &Closure) -> bool {
        self.node == other.node
            && self.program.ptr_eq(&other.program)
            && self.frame.ptr_eq(&other.frame)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("node", &self.node)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}
