//! Decorator composition over registered bindings.
//!
//! A decorator is a component that implements the decorated service and
//! takes the service it wraps as a constructor parameter. Composing a chain
//! replaces each binding's value source with a factory that builds the
//! original value and feeds it through the decorators, while the binding's
//! service, lifetime and key stay untouched.

use std::sync::Arc;

use tracing::debug;

use crate::activation::{activate, source_factory, Factory};
use crate::descriptors::{DecoratorInfo, ServiceSource};
use crate::error::{ConfigurationError, RegistrarResult};
use crate::intent::DecoratorSpec;
use crate::key::TypeKey;
use crate::registration::Registry;
use crate::types::TypeUniverse;

/// Applies decorator chains to the bindings of an implementation.
///
/// Decorators are sorted by descending `order` and applied in that
/// sequence, each wrapping the previous result, so the lowest order is the
/// outermost layer a caller talks to. Every decorator is checked against
/// every target binding before any binding is touched.
pub struct DecoratorComposer {
    universe: Arc<TypeUniverse>,
}

impl DecoratorComposer {
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        DecoratorComposer { universe }
    }

    /// Decorates every non-self-registered binding of `implementation` and
    /// returns how many bindings were decorated.
    pub fn compose(
        &self,
        implementation: &TypeKey,
        specs: &[DecoratorSpec],
        registry: &mut Registry,
    ) -> RegistrarResult<usize> {
        if specs.is_empty() {
            return Ok(0);
        }

        let mut ordered = specs.to_vec();
        ordered.sort_by(|a, b| b.order.cmp(&a.order));

        for binding in registry.decorable(implementation) {
            for spec in &ordered {
                self.check(spec, &binding.service)?;
            }
        }

        let mut decorated = 0;
        for binding in registry.decorable_mut(implementation) {
            let mut factory = source_factory(&self.universe, binding);
            for spec in &ordered {
                factory = self.wrap(factory, binding.service.clone(), spec.decorator.clone());
                binding.decorators.push(DecoratorInfo { decorator: spec.decorator.clone(), order: spec.order });
            }
            binding.source = ServiceSource::Factory(factory);
            decorated += 1;
        }

        debug!(
            implementation = %implementation,
            decorators = ordered.len(),
            bindings = decorated,
            "decorators applied"
        );
        Ok(decorated)
    }

    fn check(&self, spec: &DecoratorSpec, service: &TypeKey) -> RegistrarResult<()> {
        if !self.universe.contains(&spec.decorator) {
            return Err(ConfigurationError::UnknownType(spec.decorator.clone()));
        }
        if spec.decorator == *service || !self.universe.is_assignable(service, &spec.decorator) {
            return Err(ConfigurationError::DecoratorMismatch {
                decorator: spec.decorator.clone(),
                service: service.clone(),
            });
        }
        Ok(())
    }

    fn wrap(&self, inner: Factory, service: TypeKey, decorator: TypeKey) -> Factory {
        let universe = Arc::clone(&self.universe);
        Arc::new(move |resolver| {
            let value = inner(resolver)?;
            activate(&universe, &decorator, resolver, Some((&service, value)))
        })
    }
}
