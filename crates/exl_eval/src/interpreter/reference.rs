//! Reading chains: `a.b.c`, `a[0].b`, `a.m(x).c`, and the dotted-name
//! fallback that treats an unresolved identifier chain as one context key.

use exl_ir::{NodeId, NodeKind};

use super::Interpreter;
use crate::errors::{self, EvalResult};
use crate::introspect::CachedHandle;
use crate::value::{MapKey, Value};

impl Interpreter<'_> {
    /// Whether `node` sits in a chain whose nearest non-chain ancestor is a
    /// ternary. Such chains may evaluate to null without complaint.
    pub(super) fn is_ternary_protected(&self, node: NodeId) -> bool {
        let tree = self.tree;
        for ancestor in tree.ancestors(node) {
            match tree.kind(ancestor) {
                NodeKind::Reference | NodeKind::ArrayAccess => {}
                NodeKind::Ternary => return true,
                _ => return false,
            }
        }
        false
    }

    /// `a.b.c` as one context key.
    pub(super) fn chain_name(&self, links: &[NodeId]) -> String {
        let tree = self.tree;
        let mut name = String::new();
        for (i, &link) in links.iter().enumerate() {
            if i > 0 {
                name.push('.');
            }
            name.push_str(&tree.image(link));
        }
        name
    }

    /// Links that may continue a dotted context name.
    pub(super) fn is_dotted_link(&self, link: NodeId) -> bool {
        let kind = self.tree.kind(link);
        matches!(kind, NodeKind::Identifier(_)) || kind.is_integer_literal()
    }

    pub(super) fn eval_reference(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let links = tree.children(node);
        let head_is_register = links
            .first()
            .and_then(|&head| tree.kind(head).ident())
            .is_some_and(|ident| ident.register.is_some());

        // Cleared for good once a link is neither a name nor an integer
        // literal, or once a non-null object has been reached.
        let mut dotted = !head_is_register;
        let mut names_only = true;
        let mut bean_found = false;
        let mut object = Value::Null;

        for (c, &link) in links.iter().enumerate() {
            self.check_cancel()?;
            let dotted_link = self.is_dotted_link(link);
            if !dotted_link {
                dotted = false;
                names_only = false;
            }
            object = if c == 0 {
                self.eval(link)?
            } else if !object.is_null() {
                self.eval_link(link, &object)?
            } else if dotted && dotted_link {
                Value::Null
            } else if self.is_ternary_protected(node) {
                return Ok(Value::Null);
            } else {
                return self.recover(link, errors::null_target("attempting to access property of null"));
            };

            if object.is_null() {
                if dotted && c > 0 {
                    if let Some(value) = self.context.get(&self.chain_name(&links[..=c])) {
                        object = value;
                    }
                }
            } else {
                // A non-null object commits the rest of the chain to
                // property access.
                bean_found = true;
                dotted = false;
            }
        }

        if !object.is_null() || !names_only || self.is_ternary_protected(node) {
            return Ok(object);
        }
        if bean_found {
            let name = self.chain_name(links);
            if !self.context.has(&name) {
                return self.recover(node, errors::unknown_property(name));
            }
        } else if dotted && !self.has_any_prefix(links) {
            let name = self.chain_name(links);
            return self.recover(node, errors::unknown_variable(name));
        }
        Ok(object)
    }

    /// Whether the context binds any leading part of a dotted chain.
    fn has_any_prefix(&self, links: &[NodeId]) -> bool {
        (1..=links.len()).any(|end| self.context.has(&self.chain_name(&links[..end])))
    }

    /// Evaluate one chain link against the object on its left.
    pub(super) fn eval_link(&mut self, link: NodeId, object: &Value) -> EvalResult {
        let tree = self.tree;
        match tree.kind(link) {
            NodeKind::Identifier(ident) => {
                self.check_cancel()?;
                self.get_attribute(link, object, &Value::string(&*ident.name))
            }
            NodeKind::Number(literal) if literal.is_integer() => {
                self.get_attribute(link, object, &Value::from(*literal))
            }
            NodeKind::Str(s) => self.get_attribute(link, object, &Value::string(&**s)),
            NodeKind::Method => self.eval_method(link, object.clone()),
            NodeKind::SizeMethod => self.size_of(link, object),
            NodeKind::ArrayAccess => self.eval_array_access(link, Some(object)),
            _ => self.eval(link),
        }
    }

    /// `object[i][j]...`, with the object optionally resolved against `base`
    /// when the access is a chain link.
    pub(super) fn eval_array_access(&mut self, node: NodeId, base: Option<&Value>) -> EvalResult {
        let tree = self.tree;
        let children = tree.children(node);
        let Some((&head, indices)) = children.split_first() else {
            return Ok(Value::Null);
        };
        let mut object = match base {
            Some(base) => self.eval_link(head, base)?,
            None => self.eval(head)?,
        };
        for &index_node in indices {
            if object.is_null() {
                if self.is_ternary_protected(node) {
                    return Ok(Value::Null);
                }
                return self.recover(index_node, errors::null_target("array element is null"));
            }
            let index = self.eval(index_node)?;
            object = self.get_attribute(index_node, &object, &index)?;
        }
        Ok(object)
    }

    /// Read property `key` of `object` through the introspection service,
    /// reusing the handle cached at `node` when it still applies.
    pub(super) fn get_attribute(&mut self, node: NodeId, object: &Value, key: &Value) -> EvalResult {
        if object.is_null() {
            return self.recover(node, errors::null_target("attempting to access property of null"));
        }
        self.check_cancel()?;
        if matches!(object, Value::Map(_)) && MapKey::from_value(key).is_none() {
            return Err(self.fail(node, errors::map_key_not_hashable(key.type_name())));
        }

        let program = self.program;
        if self.cache {
            if let Some(CachedHandle::Get(handle)) = program.cache().get(node) {
                if let Some(result) = handle.try_invoke(object, key) {
                    return match result {
                        Ok(value) => Ok(value),
                        Err(cause) => self.recover(
                            node,
                            errors::unknown_property(key.to_string()).caused_by(cause),
                        ),
                    };
                }
            }
        }

        let engine = self.engine;
        let Some(handle) = engine.uberspect().find_property_get(object, key) else {
            if self.is_ternary_protected(node) {
                return Ok(Value::Null);
            }
            return self.recover(node, errors::unknown_property(key.to_string()));
        };
        match handle.invoke(object) {
            Ok(value) => {
                if self.cache && handle.is_cacheable() {
                    tracing::debug!(node = %node, key = %key, "caching property getter");
                    program.cache().store(node, CachedHandle::Get(handle));
                }
                Ok(value)
            }
            Err(cause) => {
                self.recover(node, errors::unknown_property(key.to_string()).caused_by(cause))
            }
        }
    }
}
