//! The registration log and its frozen snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::descriptors::{Binding, RegistrationMethod};
use crate::key::{ServiceKey, TypeKey};
use crate::lifetime::Lifetime;

type Identity = (TypeKey, Option<ServiceKey>);

/// Ordered, append-only log of bindings built during the registration pass.
///
/// Order is significant: single-value resolution picks the last binding for
/// a service, collection resolution returns all of them in log order.
#[derive(Debug, Default)]
pub struct Registry {
    bindings: Vec<Binding>,
    index: HashMap<Identity, Vec<usize>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a binding with this exact service and key exists.
    pub fn contains(&self, service: &TypeKey, key: Option<&ServiceKey>) -> bool {
        self.index.contains_key(&(service.clone(), key.cloned()))
    }

    /// Appends a binding and returns its position.
    ///
    /// A `TryAdd` binding is discarded, and `None` returned, when one with
    /// the same service and key is already present.
    pub fn add(&mut self, binding: Binding) -> Option<usize> {
        if binding.method == RegistrationMethod::TryAdd && self.contains(&binding.service, binding.key.as_ref()) {
            debug!(
                service = %binding.service,
                implementation = %binding.implementation,
                "TryAdd skipped, service already bound"
            );
            return None;
        }
        let at = self.bindings.len();
        self.index
            .entry((binding.service.clone(), binding.key.clone()))
            .or_default()
            .push(at);
        self.bindings.push(binding);
        Some(at)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Bindings of `implementation` that a decorator may wrap.
    ///
    /// Self-registered bindings are never decorated.
    pub(crate) fn decorable(&self, implementation: &TypeKey) -> impl Iterator<Item = &Binding> {
        let implementation = implementation.clone();
        self.bindings
            .iter()
            .filter(move |b| b.implementation == implementation && !b.is_self_registered())
    }

    pub(crate) fn decorable_mut(&mut self, implementation: &TypeKey) -> impl Iterator<Item = &mut Binding> {
        let implementation = implementation.clone();
        self.bindings
            .iter_mut()
            .filter(move |b| b.implementation == implementation && !b.is_self_registered())
    }

    /// Freezes the log. Nothing can be added afterwards.
    pub fn freeze(self) -> RegistrySnapshot {
        RegistrySnapshot {
            bindings: self.bindings.into(),
            index: Arc::new(self.index),
        }
    }
}

/// Immutable view of the registry handed to the validator, diagnostics and
/// the host container. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    bindings: Arc<[Binding]>,
    index: Arc<HashMap<Identity, Vec<usize>>>,
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Registry::new().freeze()
    }
}

impl RegistrySnapshot {
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, service: &TypeKey, key: Option<&ServiceKey>) -> bool {
        self.index.contains_key(&(service.clone(), key.cloned()))
    }

    /// The binding single-value resolution of `service` uses: the last one.
    pub fn resolve_single(&self, service: &TypeKey, key: Option<&ServiceKey>) -> Option<&Binding> {
        self.positions(service, key)
            .and_then(|at| at.last())
            .map(|&at| &self.bindings[at])
    }

    /// Every binding of `service`, in registration order.
    pub fn resolve_all(&self, service: &TypeKey, key: Option<&ServiceKey>) -> Vec<&Binding> {
        self.positions(service, key)
            .map(|at| at.iter().map(|&i| &self.bindings[i]).collect())
            .unwrap_or_default()
    }

    fn positions(&self, service: &TypeKey, key: Option<&ServiceKey>) -> Option<&Vec<usize>> {
        self.index.get(&(service.clone(), key.cloned()))
    }

    /// Bindings of `service` under any key.
    pub fn by_service<'a>(&'a self, service: &TypeKey) -> impl Iterator<Item = &'a Binding> + 'a {
        let service = service.clone();
        self.bindings.iter().filter(move |b| b.service == service)
    }

    pub fn by_lifetime(&self, lifetime: Lifetime) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(move |b| b.lifetime == lifetime)
    }

    /// Bindings matching an optional service and an optional lifetime.
    pub fn query(&self, service: Option<&TypeKey>, lifetime: Option<Lifetime>) -> Vec<&Binding> {
        self.bindings
            .iter()
            .filter(|b| service.map_or(true, |s| &b.service == s))
            .filter(|b| lifetime.map_or(true, |l| b.lifetime == l))
            .collect()
    }

    /// Distinct implementation types, in first-registration order.
    pub fn implementations(&self) -> Vec<&TypeKey> {
        let mut seen = Vec::new();
        for binding in self.bindings.iter() {
            if !seen.contains(&&binding.implementation) {
                seen.push(&binding.implementation);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(service: &'static str, implementation: &'static str) -> Binding {
        Binding::new(TypeKey::from(service), TypeKey::from(implementation), Lifetime::Scoped)
    }

    #[test]
    fn test_add_appends_and_last_wins() {
        let mut registry = Registry::new();
        registry.add(binding("app::Store", "app::MemStore"));
        registry.add(binding("app::Store", "app::PgStore"));
        let snapshot = registry.freeze();

        let service = TypeKey::from("app::Store");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.resolve_single(&service, None).unwrap().implementation, TypeKey::from("app::PgStore"));
        assert_eq!(snapshot.resolve_all(&service, None).len(), 2);
    }

    #[test]
    fn test_try_add_skips_existing_identity_only() {
        let mut registry = Registry::new();
        assert_eq!(registry.add(binding("app::Store", "app::MemStore")), Some(0));
        let try_add = binding("app::Store", "app::PgStore").with_method(RegistrationMethod::TryAdd);
        assert_eq!(registry.add(try_add.clone()), None);

        let keyed = try_add.with_key(Some(ServiceKey::from("pg")));
        assert_eq!(registry.add(keyed), Some(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_keyed_and_unkeyed_are_separate() {
        let mut registry = Registry::new();
        registry.add(binding("app::Store", "app::MemStore").with_key(Some(ServiceKey::from("mem"))));
        let snapshot = registry.freeze();
        let service = TypeKey::from("app::Store");
        assert!(snapshot.resolve_single(&service, None).is_none());
        assert!(snapshot.resolve_single(&service, Some(&ServiceKey::from("mem"))).is_some());
        assert_eq!(snapshot.by_service(&service).count(), 1);
    }

    #[test]
    fn test_query_filters() {
        let mut registry = Registry::new();
        registry.add(binding("app::A", "app::A1"));
        registry.add(Binding::new(TypeKey::from("app::B"), TypeKey::from("app::B1"), Lifetime::Singleton));
        let snapshot = registry.freeze();
        assert_eq!(snapshot.query(None, Some(Lifetime::Singleton)).len(), 1);
        assert_eq!(snapshot.query(Some(&TypeKey::from("app::A")), None).len(), 1);
        assert_eq!(snapshot.query(None, None).len(), 2);
        assert_eq!(snapshot.implementations().len(), 2);
    }
}
