//! Register storage for one activation.

use std::sync::Arc;

use exl_ir::{FrameLayout, LambdaLayout};
use parking_lot::RwLock;

use crate::value::Value;

/// Fixed-size register slots of a script or lambda activation.
///
/// A frame is a shared handle: a closure keeps the frame it captured and
/// writes its arguments into it on every call. Slot locks are taken per
/// access and never held across evaluation.
#[derive(Clone, Debug)]
pub struct Frame {
    parameters: u32,
    slots: Arc<RwLock<Box<[Value]>>>,
}

impl Frame {
    pub fn new(layout: FrameLayout) -> Self {
        Frame {
            parameters: layout.parameters,
            slots: Arc::new(RwLock::new(
                vec![Value::Null; layout.registers as usize].into_boxed_slice(),
            )),
        }
    }

    /// Read a register; slots beyond the layout read as null.
    pub fn get(&self, register: u32) -> Value {
        self.slots
            .read()
            .get(register as usize)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&self, register: u32, value: Value) {
        if let Some(slot) = self.slots.write().get_mut(register as usize) {
            *slot = value;
        }
    }

    /// Write call arguments into the parameter slots. Missing arguments
    /// leave their slot untouched, extra arguments are ignored.
    pub fn assign(&self, args: &[Value]) {
        let mut slots = self.slots.write();
        for (slot, arg) in slots
            .iter_mut()
            .take(self.parameters as usize)
            .zip(args.iter())
        {
            *slot = arg.clone();
        }
    }

    /// Frame for a lambda created in this frame, with captured slots copied in.
    pub fn child(&self, layout: &LambdaLayout) -> Frame {
        let frame = Frame::new(layout.frame);
        {
            let parent = self.slots.read();
            let mut slots = frame.slots.write();
            for capture in layout.captures.iter() {
                if let (Some(value), Some(slot)) = (
                    parent.get(capture.parent as usize),
                    slots.get_mut(capture.local as usize),
                ) {
                    *slot = value.clone();
                }
            }
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exl_ir::Capture;
    use pretty_assertions::assert_eq;

    #[test]
    fn assign_fills_parameters_only() {
        let frame = Frame::new(FrameLayout {
            parameters: 2,
            registers: 3,
        });
        frame.assign(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(frame.get(0), Value::Int(1));
        assert_eq!(frame.get(1), Value::Int(2));
        assert_eq!(frame.get(2), Value::Null);
        assert_eq!(frame.get(99), Value::Null);
    }

    #[test]
    fn child_copies_captures_at_creation() {
        let parent = Frame::new(FrameLayout {
            parameters: 0,
            registers: 1,
        });
        parent.set(0, Value::Int(7));
        let child = parent.child(&LambdaLayout {
            frame: FrameLayout {
                parameters: 1,
                registers: 2,
            },
            captures: Box::new([Capture {
                parent: 0,
                local: 1,
            }]),
        });
        parent.set(0, Value::Int(8));
        assert_eq!(child.get(1), Value::Int(7));
        assert!(!child.ptr_eq(&parent));
    }
}
