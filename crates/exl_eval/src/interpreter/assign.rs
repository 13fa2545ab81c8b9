//! Assignment targets and property writes.

use exl_ir::{Ident, NodeId, NodeKind};

use super::Interpreter;
use crate::errors::{self, ControlAction, EvalResult};
use crate::introspect::CachedHandle;
use crate::value::{MapKey, Value};

impl Interpreter<'_> {
    /// `target = value`. The right side is evaluated first and is the
    /// result of the whole expression.
    pub(super) fn eval_assignment(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree;
        let target = tree.child(node, 0);
        if !matches!(
            tree.kind(target),
            NodeKind::Identifier(_) | NodeKind::Var(_) | NodeKind::Reference | NodeKind::ArrayAccess
        ) {
            return self.recover(target, errors::illegal_assignment("left side is not assignable"));
        }

        let value = self.eval(tree.child(node, 1))?;
        match tree.kind(target) {
            NodeKind::Identifier(ident) | NodeKind::Var(ident) => {
                self.assign_variable(target, ident, value.clone())?;
            }
            NodeKind::ArrayAccess => {
                self.assign_array_element(target, true, Value::Null, value.clone())?;
            }
            _ => self.assign_reference(target, value.clone())?,
        }
        Ok(value)
    }

    /// Bind a name: its register when it has one, else the context.
    pub(super) fn assign_variable(
        &mut self,
        node: NodeId,
        ident: &Ident,
        value: Value,
    ) -> Result<(), ControlAction> {
        if let Some(register) = ident.register {
            self.frame.set(register, value);
            return Ok(());
        }
        match self.context.set(&ident.name, value) {
            Ok(()) => Ok(()),
            Err(_) => self.recover_unit(node, errors::readonly_context()),
        }
    }

    fn assign_reference(&mut self, node: NodeId, value: Value) -> Result<(), ControlAction> {
        let tree = self.tree;
        let links = tree.children(node);
        let Some((&last, init)) = links.split_last() else {
            return self.recover_unit(node, errors::illegal_assignment("empty reference"));
        };
        let head_is_register = links
            .first()
            .and_then(|&head| tree.kind(head).ident())
            .is_some_and(|ident| ident.register.is_some());

        // Same dotted-name rules as a read, over every link but the last.
        let mut dotted = !head_is_register;
        let mut object = Value::Null;
        for (c, &link) in init.iter().enumerate() {
            self.check_cancel()?;
            let dotted_link = self.is_dotted_link(link);
            if !dotted_link {
                dotted = false;
            }
            object = if c == 0 {
                self.eval(link)?
            } else if object.is_null() {
                Value::Null
            } else {
                self.eval_link(link, &object)?
            };
            if !object.is_null() {
                dotted = false;
            } else if dotted {
                if c > 0 {
                    if let Some(found) = self.context.get(&self.chain_name(&links[..=c])) {
                        object = found;
                    }
                }
            } else {
                return self.recover_unit(link, errors::illegal_assignment("intermediate object is null"));
            }
        }

        self.check_cancel()?;
        let key = match tree.kind(last) {
            NodeKind::Identifier(ident) | NodeKind::Var(ident)
                if init.is_empty() && ident.register.is_some() =>
            {
                return self.assign_variable(last, ident, value);
            }
            NodeKind::Identifier(ident) => Value::string(&*ident.name),
            NodeKind::Number(literal) if literal.is_integer() => Value::from(*literal),
            NodeKind::Str(s) => Value::string(&**s),
            NodeKind::ArrayAccess => {
                return self.assign_array_element(last, init.is_empty(), object, value);
            }
            _ => {
                return self.recover_unit(last, errors::illegal_assignment("unassignable chain link"));
            }
        };

        if object.is_null() {
            if dotted && self.is_dotted_link(last) {
                let name = self.chain_name(links);
                return match self.context.set(&name, value) {
                    Ok(()) => Ok(()),
                    Err(_) => self.recover_unit(last, errors::readonly_context()),
                };
            }
            return self.recover_unit(last, errors::null_target("bean is null"));
        }
        self.set_attribute(last, &object, key, value)
    }

    /// `...[i][j] = value`: resolve the object and every index but the last,
    /// then write the last one.
    fn assign_array_element(
        &mut self,
        node: NodeId,
        is_head: bool,
        base: Value,
        value: Value,
    ) -> Result<(), ControlAction> {
        let tree = self.tree;
        let children = tree.children(node);
        let Some((&head, indices)) = children.split_first() else {
            return self.recover_unit(node, errors::illegal_assignment("empty array access"));
        };
        let Some((&last_index, inner)) = indices.split_last() else {
            return self.recover_unit(node, errors::illegal_assignment("array access without index"));
        };

        let mut object = if is_head {
            self.eval(head)?
        } else if base.is_null() {
            return self.recover_unit(head, errors::null_target("bean is null"));
        } else {
            self.eval_link(head, &base)?
        };
        for &index_node in inner {
            if object.is_null() {
                return self.recover_unit(index_node, errors::null_target("array element is null"));
            }
            let index = self.eval(index_node)?;
            object = self.get_attribute(index_node, &object, &index)?;
        }
        if object.is_null() {
            return self.recover_unit(last_index, errors::null_target("array element is null"));
        }
        let key = self.eval(last_index)?;
        self.set_attribute(last_index, &object, key, value)
    }

    /// Write property `key` of `object`. When no setter accepts the value as
    /// is, the value is narrowed and the lookup retried once.
    pub(super) fn set_attribute(
        &mut self,
        node: NodeId,
        object: &Value,
        key: Value,
        value: Value,
    ) -> Result<(), ControlAction> {
        self.check_cancel()?;
        if matches!(object, Value::Map(_)) && MapKey::from_value(&key).is_none() {
            return Err(self.fail(node, errors::map_key_not_hashable(key.type_name())));
        }

        let program = self.program;
        if self.cache {
            if let Some(CachedHandle::Set(handle)) = program.cache().get(node) {
                if let Some(result) = handle.try_invoke(object, &key, &value) {
                    return match result {
                        Ok(()) => Ok(()),
                        Err(cause) => self.recover_unit(
                            node,
                            errors::unknown_property(key.to_string()).caused_by(cause),
                        ),
                    };
                }
            }
        }

        let engine = self.engine;
        let uberspect = engine.uberspect();
        let mut value = value;
        let mut handle = uberspect.find_property_set(object, &key, &value);
        if handle.is_none() {
            let mut narrowed = [value.clone()];
            if self.arithmetic.narrow_arguments(&mut narrowed) {
                let [narrowed] = narrowed;
                handle = uberspect.find_property_set(object, &key, &narrowed);
                if handle.is_some() {
                    value = narrowed;
                }
            }
        }
        let Some(handle) = handle else {
            return self.recover_unit(node, errors::unknown_property(key.to_string()));
        };
        match handle.invoke(object, value) {
            Ok(()) => {
                if self.cache && handle.is_cacheable() {
                    tracing::debug!(node = %node, key = %key, "caching property setter");
                    program.cache().store(node, CachedHandle::Set(handle));
                }
                Ok(())
            }
            Err(cause) => {
                self.recover_unit(node, errors::unknown_property(key.to_string()).caused_by(cause))
            }
        }
    }
}
