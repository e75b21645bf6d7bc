//! Convention-based registration.
//!
//! Instead of one intent per component, a convention selects implementations
//! out of the type universe by name or module and binds each to a service
//! picked by rule. Conventions are evaluated when the pass runs, against
//! the universe as it stands then.

use std::collections::HashSet;

use tracing::debug;

use crate::config::RegistrarConfig;
use crate::descriptors::{AttributeKind, Binding, RegistrationMethod};
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::registrar::Registrar;
use crate::types::{TypeCategory, TypeDescriptor, TypeKind, TypeUniverse};

/// Placeholder a naming pattern substitutes the implementation name into.
pub const NAME_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    /// Abstraction named by the pattern applied to the implementation name
    Naming(String),
    Suffix(String),
    Module { module: String, include_submodules: bool },
}

/// A rule that turns described implementations into bindings.
///
/// Naming conventions bind an implementation to the abstraction whose short
/// name is the pattern with `{}` replaced by the implementation's short
/// name. Suffix and module conventions bind to the first declared
/// abstraction, or to the implementation itself when it declares none.
///
/// By default bindings are scoped, use `TryAdd`, and implementations that
/// already have an intent of their own are left alone.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{Convention, Lifetime, Registrar, TypeDescriptor, TypeKey, TypeUniverse};
///
/// trait OrderRepository {}
/// struct SqlOrderRepository;
/// struct AuditRepository;
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::abstraction::<dyn OrderRepository>())
///     .insert(
///         TypeDescriptor::implementation::<SqlOrderRepository>()
///             .implements::<dyn OrderRepository>(),
///     )
///     .insert(TypeDescriptor::implementation::<AuditRepository>());
///
/// let mut registrar = Registrar::new(universe);
/// registrar.add_by_convention(Convention::by_suffix("Repository").lifetime(Lifetime::Singleton));
/// let composition = registrar.build().unwrap();
///
/// let services: Vec<_> = composition.registry().iter().map(|b| b.service.clone()).collect();
/// assert_eq!(
///     services,
///     vec![TypeKey::of::<dyn OrderRepository>(), TypeKey::of::<AuditRepository>()]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    selector: Selector,
    lifetime: Lifetime,
    try_add: bool,
    skip_declared: bool,
}

impl Convention {
    fn new(selector: Selector) -> Self {
        Convention { selector, lifetime: Lifetime::Scoped, try_add: true, skip_declared: true }
    }

    /// Binds implementations to the abstraction `pattern` names.
    pub fn naming(pattern: impl Into<String>) -> Self {
        Self::new(Selector::Naming(pattern.into()))
    }

    /// Selects implementations whose short name ends with `suffix`.
    pub fn by_suffix(suffix: impl Into<String>) -> Self {
        Self::new(Selector::Suffix(suffix.into()))
    }

    /// Selects implementations in `module` and its submodules.
    pub fn in_module(module: impl Into<String>) -> Self {
        Self::new(Selector::Module { module: module.into(), include_submodules: true })
    }

    /// Only meaningful for module conventions.
    pub fn include_submodules(mut self, include: bool) -> Self {
        if let Selector::Module { include_submodules, .. } = &mut self.selector {
            *include_submodules = include;
        }
        self
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// `false` appends every selected binding with `Add`.
    pub fn try_add(mut self, try_add: bool) -> Self {
        self.try_add = try_add;
        self
    }

    /// `false` also selects implementations that have an intent of their own.
    pub fn skip_declared(mut self, skip: bool) -> Self {
        self.skip_declared = skip;
        self
    }

    /// Bindings the convention produces, in universe order.
    ///
    /// `declared` holds the implementations that have an intent queued on
    /// the same registrar.
    pub(crate) fn bindings(
        &self,
        universe: &TypeUniverse,
        config: &RegistrarConfig,
        declared: &HashSet<TypeKey>,
    ) -> Vec<Binding> {
        let method = if self.try_add { RegistrationMethod::TryAdd } else { RegistrationMethod::Add };
        let mut bindings = Vec::new();

        for descriptor in universe.iter() {
            if descriptor.kind() != TypeKind::Implementation || *descriptor.category() != TypeCategory::Component {
                continue;
            }
            let implementation = descriptor.key();
            if self.skip_declared && declared.contains(implementation) {
                continue;
            }
            if !self.selects(implementation) || !config.filter.matches(implementation) {
                continue;
            }
            let Some(service) = self.service_for(universe, descriptor) else {
                continue;
            };
            if service == *implementation && !config.allow_self_registration {
                debug!(implementation = %implementation, "self-registration disabled, convention skipped type");
                continue;
            }
            bindings.push(
                Binding::new(service, implementation.clone(), self.lifetime)
                    .with_method(method)
                    .with_attribute(AttributeKind::Convention),
            );
        }

        debug!(convention = ?self.selector, bindings = bindings.len(), "convention evaluated");
        bindings
    }

    fn selects(&self, implementation: &TypeKey) -> bool {
        match &self.selector {
            Selector::Naming(_) => true,
            Selector::Suffix(suffix) => implementation.short_name().ends_with(suffix.as_str()),
            Selector::Module { module, include_submodules } => {
                let path = implementation.module_path();
                path == module
                    || (*include_submodules
                        && path.strip_prefix(module.as_str()).is_some_and(|rest| rest.starts_with("::")))
            }
        }
    }

    fn service_for(&self, universe: &TypeUniverse, descriptor: &TypeDescriptor) -> Option<TypeKey> {
        match &self.selector {
            Selector::Naming(pattern) => {
                let expected = pattern.replace(NAME_PLACEHOLDER, descriptor.key().short_name());
                universe
                    .implemented_abstractions(descriptor.key())
                    .into_iter()
                    .find(|abstraction| abstraction.short_name() == expected)
            }
            _ => Some(descriptor.interfaces().first().unwrap_or(descriptor.key()).clone()),
        }
    }
}

impl Registrar {
    /// Queues a convention for the registration pass.
    pub fn add_by_convention(&mut self, convention: Convention) -> &mut Self {
        self.push_convention(convention);
        self
    }

    /// Scoped `TryAdd` bindings for every implementation whose name ends
    /// with `suffix`.
    pub fn add_by_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.add_by_convention(Convention::by_suffix(suffix))
    }

    /// Scoped `TryAdd` bindings for every implementation under `module`.
    pub fn add_by_module(&mut self, module: impl Into<String>) -> &mut Self {
        self.add_by_convention(Convention::in_module(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Mailer {}
    trait Sender {}
    struct Smtp;
    struct SmtpClient;

    fn universe() -> TypeUniverse {
        let mut universe = TypeUniverse::new();
        universe
            .insert(TypeDescriptor::abstraction::<dyn Mailer>())
            .insert(TypeDescriptor::abstraction::<dyn Sender>())
            .insert(TypeDescriptor::implementation::<Smtp>().implements::<dyn Sender>())
            .insert(
                TypeDescriptor::implementation::<SmtpClient>()
                    .implements::<dyn Mailer>()
                    .implements::<dyn Sender>(),
            );
        universe
    }

    #[test]
    fn test_naming_pattern_selects_matching_abstraction() {
        trait SmtpService {}
        let mut universe = universe();
        universe
            .insert(TypeDescriptor::abstraction::<dyn SmtpService>())
            .insert(TypeDescriptor::implementation::<Smtp>().implements::<dyn SmtpService>());

        let convention = Convention::naming("{}Service");
        let bindings = convention.bindings(&universe, &RegistrarConfig::default(), &HashSet::new());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].service, TypeKey::of::<dyn SmtpService>());
        assert_eq!(bindings[0].implementation, TypeKey::of::<Smtp>());
    }

    #[test]
    fn test_suffix_binds_first_declared_abstraction() {
        let bindings = Convention::by_suffix("Client").bindings(&universe(), &RegistrarConfig::default(), &HashSet::new());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].service, TypeKey::of::<dyn Mailer>());
        assert_eq!(bindings[0].lifetime, Lifetime::Scoped);
        assert_eq!(bindings[0].method, RegistrationMethod::TryAdd);
        assert_eq!(bindings[0].attribute, AttributeKind::Convention);
    }

    #[test]
    fn test_declared_implementations_are_skipped() {
        let declared: HashSet<_> = [TypeKey::of::<SmtpClient>()].into_iter().collect();
        let convention = Convention::by_suffix("Client");
        assert!(convention.bindings(&universe(), &RegistrarConfig::default(), &declared).is_empty());
        let bindings = convention
            .skip_declared(false)
            .bindings(&universe(), &RegistrarConfig::default(), &declared);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_module_selection() {
        let module = TypeKey::of::<Smtp>().module_path().to_string();
        let parent = module.rsplit_once("::").map(|(parent, _)| parent.to_string()).unwrap();
        let config = RegistrarConfig::default();

        let exact = Convention::in_module(module.clone()).bindings(&universe(), &config, &HashSet::new());
        assert_eq!(exact.len(), 2);

        let nested = Convention::in_module(parent.clone()).bindings(&universe(), &config, &HashSet::new());
        assert_eq!(nested.len(), 2);

        let shallow = Convention::in_module(parent)
            .include_submodules(false)
            .bindings(&universe(), &config, &HashSet::new());
        assert!(shallow.is_empty());
    }
}
