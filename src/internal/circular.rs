//! Circular dependency detection for the reference activator.

use std::cell::RefCell;

use crate::error::{ActivationError, ActivationResult};
use crate::key::TypeKey;

pub(crate) const MAX_DEPTH: usize = 1024;

/// Services currently being activated, outermost first.
#[derive(Default)]
pub(crate) struct ResolutionStack {
    frames: RefCell<Vec<TypeKey>>,
}

impl ResolutionStack {
    /// Pushes `service` for the lifetime of the returned guard.
    ///
    /// Fails with the cycle path when `service` is already being activated.
    pub(crate) fn enter(&self, service: &TypeKey) -> ActivationResult<StackGuard<'_>> {
        let mut frames = self.frames.borrow_mut();

        // Circular detection BEFORE pushing the new frame
        if let Some(at) = frames.iter().position(|f| f == service) {
            let mut path = frames[at..].to_vec();
            path.push(service.clone());
            return Err(ActivationError::Circular(path));
        }

        if frames.len() >= MAX_DEPTH {
            return Err(ActivationError::DepthExceeded(frames.len()));
        }

        frames.push(service.clone());
        Ok(StackGuard { stack: self })
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Pops its frame on drop.
pub(crate) struct StackGuard<'a> {
    stack: &'a ResolutionStack,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.frames.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_pops_on_drop() {
        let stack = ResolutionStack::default();
        {
            let _a = stack.enter(&TypeKey::named("A")).unwrap();
            let _b = stack.enter(&TypeKey::named("B")).unwrap();
            assert_eq!(stack.depth(), 2);
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_reentry_reports_cycle_from_first_occurrence() {
        let stack = ResolutionStack::default();
        let _root = stack.enter(&TypeKey::named("Root")).unwrap();
        let _a = stack.enter(&TypeKey::named("A")).unwrap();
        let _b = stack.enter(&TypeKey::named("B")).unwrap();
        match stack.enter(&TypeKey::named("A")) {
            Err(ActivationError::Circular(path)) => assert_eq!(
                path,
                vec![TypeKey::named("A"), TypeKey::named("B"), TypeKey::named("A")]
            ),
            _ => panic!("expected a circular dependency error"),
        }
        assert_eq!(stack.depth(), 3);
    }
}
