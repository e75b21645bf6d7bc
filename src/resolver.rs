//! Binding resolution: from a registration intent to a binding.

use tracing::debug;

use crate::config::{RegistrarConfig, TryAddDefaults};
use crate::descriptors::{Binding, RegistrationMethod};
use crate::error::{ConfigurationError, RegistrarResult};
use crate::intent::RegistrationIntent;
use crate::key::TypeKey;
use crate::types::TypeUniverse;

/// Settings the resolver consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionPolicy {
    pub allow_self_registration: bool,
    pub try_add_defaults: TryAddDefaults,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        ResolutionPolicy::from(&RegistrarConfig::default())
    }
}

impl From<&RegistrarConfig> for ResolutionPolicy {
    fn from(config: &RegistrarConfig) -> Self {
        ResolutionPolicy {
            allow_self_registration: config.allow_self_registration,
            try_add_defaults: config.try_add_defaults,
        }
    }
}

/// Decides which service type an implementation is bound as.
///
/// 1. An implementation with no abstractions is bound to itself, when
///    self-registration is allowed.
/// 2. An explicit service type is used if the implementation satisfies it.
/// 3. Otherwise the most specific implemented abstraction is chosen: the
///    last one in declaration order that no other implemented abstraction
///    inherits from.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{BindingResolver, ResolutionPolicy, TypeDescriptor, TypeKey, TypeUniverse};
///
/// trait Repository {}
/// trait UserRepository: Repository {}
/// struct SqlUsers;
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::abstraction::<dyn Repository>())
///     .insert(TypeDescriptor::abstraction::<dyn UserRepository>().implements::<dyn Repository>())
///     .insert(
///         TypeDescriptor::implementation::<SqlUsers>()
///             .implements::<dyn Repository>()
///             .implements::<dyn UserRepository>(),
///     );
///
/// let resolver = BindingResolver::new(&universe, ResolutionPolicy::default());
/// let service = resolver.select_service(&TypeKey::of::<SqlUsers>(), None).unwrap();
/// assert_eq!(service, TypeKey::of::<dyn UserRepository>());
/// ```
pub struct BindingResolver<'a> {
    universe: &'a TypeUniverse,
    policy: ResolutionPolicy,
}

impl<'a> BindingResolver<'a> {
    pub fn new(universe: &'a TypeUniverse, policy: ResolutionPolicy) -> Self {
        BindingResolver { universe, policy }
    }

    pub fn select_service(&self, implementation: &TypeKey, explicit: Option<&TypeKey>) -> RegistrarResult<TypeKey> {
        if !self.universe.contains(implementation) {
            return Err(ConfigurationError::UnknownType(implementation.clone()));
        }

        let implemented = self.universe.implemented_abstractions(implementation);

        if implemented.is_empty() {
            if let Some(explicit) = explicit.filter(|e| *e != implementation) {
                return Err(ConfigurationError::AbstractionNotImplemented {
                    implementation: implementation.clone(),
                    abstraction: explicit.clone(),
                });
            }
            if !self.policy.allow_self_registration {
                return Err(ConfigurationError::NoAbstraction { implementation: implementation.clone() });
            }
            return Ok(implementation.clone());
        }

        if let Some(explicit) = explicit {
            if self.universe.is_assignable(explicit, implementation) {
                return Ok(explicit.clone());
            }
            return Err(ConfigurationError::AbstractionNotImplemented {
                implementation: implementation.clone(),
                abstraction: explicit.clone(),
            });
        }

        let leaves: Vec<&TypeKey> = implemented
            .iter()
            .filter(|candidate| {
                !implemented
                    .iter()
                    .any(|other| self.universe.inherits_from(other, candidate))
            })
            .collect();

        if leaves.len() > 1 {
            debug!(
                implementation = %implementation,
                candidates = leaves.len(),
                "several unrelated abstractions, binding the last declared"
            );
        }

        leaves
            .last()
            .map(|leaf| (*leaf).clone())
            .ok_or_else(|| ConfigurationError::NoAbstraction { implementation: implementation.clone() })
    }

    /// The binding an intent produces, before decoration.
    pub fn resolve(&self, intent: &RegistrationIntent) -> RegistrarResult<Binding> {
        let service = self.select_service(&intent.implementation, intent.service.as_ref())?;
        let try_add = intent
            .try_add
            .unwrap_or_else(|| self.policy.try_add_defaults.for_lifetime(intent.lifetime));
        let method = if try_add { RegistrationMethod::TryAdd } else { RegistrationMethod::Add };

        Ok(Binding::new(service, intent.implementation.clone(), intent.lifetime)
            .with_key(intent.key.clone())
            .with_method(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::AttributeKind;
    use crate::lifetime::Lifetime;
    use crate::types::TypeDescriptor;

    trait Reader {}
    trait Writer {}
    trait Store: Reader {}
    struct FileStore;
    struct Standalone;

    fn universe() -> TypeUniverse {
        let mut universe = TypeUniverse::new();
        universe
            .insert(TypeDescriptor::abstraction::<dyn Reader>())
            .insert(TypeDescriptor::abstraction::<dyn Writer>())
            .insert(TypeDescriptor::abstraction::<dyn Store>().implements::<dyn Reader>())
            .insert(
                TypeDescriptor::implementation::<FileStore>()
                    .implements::<dyn Store>()
                    .implements::<dyn Writer>(),
            )
            .insert(TypeDescriptor::implementation::<Standalone>());
        universe
    }

    #[test]
    fn test_unrelated_leaves_pick_last_declared() {
        let universe = universe();
        let resolver = BindingResolver::new(&universe, ResolutionPolicy::default());
        let service = resolver.select_service(&TypeKey::of::<FileStore>(), None).unwrap();
        assert_eq!(service, TypeKey::of::<dyn Writer>());
    }

    #[test]
    fn test_explicit_service_must_be_implemented() {
        let universe = universe();
        let resolver = BindingResolver::new(&universe, ResolutionPolicy::default());
        let ok = resolver
            .select_service(&TypeKey::of::<FileStore>(), Some(&TypeKey::of::<dyn Reader>()))
            .unwrap();
        assert_eq!(ok, TypeKey::of::<dyn Reader>());

        let err = resolver
            .select_service(&TypeKey::of::<Standalone>(), Some(&TypeKey::of::<dyn Reader>()))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::AbstractionNotImplemented { .. }));
    }

    #[test]
    fn test_self_registration_policy() {
        let universe = universe();
        let resolver = BindingResolver::new(&universe, ResolutionPolicy::default());
        let standalone = TypeKey::of::<Standalone>();
        assert_eq!(resolver.select_service(&standalone, None).unwrap(), standalone);

        let strict = ResolutionPolicy { allow_self_registration: false, ..ResolutionPolicy::default() };
        let resolver = BindingResolver::new(&universe, strict);
        assert!(matches!(
            resolver.select_service(&standalone, None),
            Err(ConfigurationError::NoAbstraction { .. })
        ));
    }

    #[test]
    fn test_unknown_implementation() {
        let universe = universe();
        let resolver = BindingResolver::new(&universe, ResolutionPolicy::default());
        assert!(matches!(
            resolver.select_service(&TypeKey::named("nowhere::Ghost"), None),
            Err(ConfigurationError::UnknownType(_))
        ));
    }

    #[test]
    fn test_resolve_applies_try_add_defaults() {
        let universe = universe();
        let resolver = BindingResolver::new(&universe, ResolutionPolicy::default());

        let scoped = resolver.resolve(&RegistrationIntent::scoped::<FileStore>()).unwrap();
        assert_eq!(scoped.method, RegistrationMethod::TryAdd);

        let transient = resolver.resolve(&RegistrationIntent::transient::<FileStore>()).unwrap();
        assert_eq!(transient.method, RegistrationMethod::Add);

        let forced = resolver
            .resolve(&RegistrationIntent::singleton::<FileStore>().try_add(false).keyed("disk"))
            .unwrap();
        assert_eq!(forced.method, RegistrationMethod::Add);
        assert_eq!(forced.attribute, AttributeKind::SingletonKeyed);
        assert_eq!(forced.lifetime, Lifetime::Singleton);
    }
}
