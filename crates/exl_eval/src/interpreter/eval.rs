//! Node dispatch, literals and identifiers.

use exl_ir::{Ident, NodeId, NodeKind};

use super::Interpreter;
use crate::errors::{self, EvalResult};
use crate::stack::ensure_sufficient_stack;
use crate::value::{MapKey, MapRef, Value};

impl Interpreter<'_> {
    /// Evaluate one node.
    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn eval(&mut self, node: NodeId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(node))
    }

    fn eval_inner(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        match tree.kind(node) {
            // Literals
            NodeKind::Null => Ok(Value::Null),
            NodeKind::True => Ok(Value::Bool(true)),
            NodeKind::False => Ok(Value::Bool(false)),
            NodeKind::Number(literal) => Ok(Value::from(*literal)),
            NodeKind::Str(s) => Ok(Value::string(&**s)),
            NodeKind::ArrayLiteral => self.eval_array_literal(node),
            NodeKind::MapLiteral => self.eval_map_literal(node),
            NodeKind::MapEntry => self.eval(tree.child(node, 1)),

            // Names and access chains
            NodeKind::Identifier(ident) | NodeKind::Var(ident) => self.eval_identifier(node, ident),
            NodeKind::Reference => self.eval_reference(node),
            NodeKind::ArrayAccess => self.eval_array_access(node, None),

            // Operators
            NodeKind::Binary(op) => self.eval_binary(node, *op),
            NodeKind::Unary(op) => self.eval_unary(node, *op),
            NodeKind::Assignment => self.eval_assignment(node),

            // Calls
            NodeKind::Method => self.eval_top_method(node),
            NodeKind::Function { namespace } => self.eval_function(node, namespace),
            NodeKind::Constructor => self.eval_constructor(node),
            NodeKind::SizeFunction => {
                let value = self.eval(tree.child(node, 0))?;
                self.size_of(node, &value)
            }
            NodeKind::SizeMethod => self.size_of(node, &Value::Null),
            NodeKind::EmptyFunction => {
                let value = self.eval(tree.child(node, 0))?;
                Ok(Value::Bool(self.is_empty_value(&value)))
            }

            // Statements
            NodeKind::If => self.eval_if(node),
            NodeKind::While => self.eval_while(node),
            NodeKind::Foreach => self.eval_foreach(node),
            NodeKind::Block | NodeKind::Script(_) => self.eval_block(node),
            NodeKind::Ternary => self.eval_ternary(node),
            NodeKind::Return => self.eval_return(node),
            NodeKind::Lambda(layout) => Ok(self.make_closure(node, layout)),
        }
    }

    /// A name outside any chain: a register read, or a context lookup that
    /// reports unknown names.
    fn eval_identifier(&mut self, node: NodeId, ident: &Ident) -> EvalResult {
        self.check_cancel()?;
        if let Some(register) = ident.register {
            return Ok(self.frame.get(register));
        }
        match self.context.get(&ident.name) {
            Some(value) if !value.is_null() => Ok(value),
            _ if self.in_chain(node)
                || self.context.has(&ident.name)
                || self.is_ternary_protected(node) =>
            {
                Ok(Value::Null)
            }
            _ => self.recover(node, errors::unknown_variable(&*ident.name)),
        }
    }

    fn in_chain(&self, node: NodeId) -> bool {
        let tree = self.tree;
        tree.parent(node)
            .is_some_and(|parent| matches!(tree.kind(parent), NodeKind::Reference))
    }

    fn eval_array_literal(&mut self, node: NodeId) -> EvalResult {
        let children = self.tree.children(node);
        let mut items = Vec::with_capacity(children.len());
        for &child in children {
            items.push(self.eval(child)?);
        }
        Ok(Value::array(items))
    }

    fn eval_map_literal(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let map = MapRef::new();
        for &entry in tree.children(node) {
            let key_node = tree.child(entry, 0);
            let key = self.eval(key_node)?;
            let value = self.eval(tree.child(entry, 1))?;
            let Some(key) = MapKey::from_value(&key) else {
                return Err(self.fail(key_node, errors::map_key_not_hashable(key.type_name())));
            };
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}
