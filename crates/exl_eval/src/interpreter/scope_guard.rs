//! Guard releasing the functor table when an evaluation ends.
//!
//! The guard holds `&mut Interpreter` and implements `Deref`/`DerefMut`, so
//! evaluation runs through it transparently. Dropping it clears the table,
//! on success, on error and during unwinding alike.

use std::ops::{Deref, DerefMut};

use super::Interpreter;

pub(crate) struct FunctorScope<'i, 'a> {
    interpreter: &'i mut Interpreter<'a>,
}

impl<'i, 'a> FunctorScope<'i, 'a> {
    pub(crate) fn new(interpreter: &'i mut Interpreter<'a>) -> Self {
        FunctorScope { interpreter }
    }
}

impl<'a> Deref for FunctorScope<'_, 'a> {
    type Target = Interpreter<'a>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for FunctorScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Drop for FunctorScope<'_, '_> {
    fn drop(&mut self) {
        if let Some(functors) = self.interpreter.functors.take() {
            tracing::trace!(count = functors.len(), "released namespace functors");
        }
    }
}
