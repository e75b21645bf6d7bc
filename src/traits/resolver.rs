//! Resolver traits used during activation.

use crate::activation::{downcast, AnyArc};
use crate::error::ActivationResult;
use crate::key::{ServiceKey, TypeKey};

/// Object-safe resolution seam.
///
/// Factories and activation functions receive a `&dyn ServiceResolver` so
/// the same composed registry can be activated by the reference
/// [`SnapshotResolver`](crate::SnapshotResolver) or by a host container.
pub trait ServiceResolver {
    /// Resolves the last binding registered for `service` and `key`.
    fn resolve(&self, service: &TypeKey, key: Option<&ServiceKey>) -> ActivationResult<AnyArc>;

    /// Resolves every binding registered for `service` and `key`, in
    /// registration order.
    fn resolve_all(&self, service: &TypeKey, key: Option<&ServiceKey>) -> ActivationResult<Vec<AnyArc>>;
}

/// Typed helpers on top of [`ServiceResolver`].
pub trait ServiceResolverExt: ServiceResolver {
    /// Resolves `service` and downcasts the activated value to `T`.
    ///
    /// Trait services are activated as `Arc<dyn Trait>`, so `T` is usually
    /// that `Arc`.
    fn get<T: Clone + 'static>(&self, service: &TypeKey) -> ActivationResult<T> {
        downcast(&self.resolve(service, None)?)
    }

    fn get_keyed<T: Clone + 'static>(&self, service: &TypeKey, key: &ServiceKey) -> ActivationResult<T> {
        downcast(&self.resolve(service, Some(key))?)
    }

    fn get_all<T: Clone + 'static>(&self, service: &TypeKey) -> ActivationResult<Vec<T>> {
        self.resolve_all(service, None)?.iter().map(downcast::<T>).collect()
    }
}

impl<R: ServiceResolver + ?Sized> ServiceResolverExt for R {}
