//! The registrar: collects registration intents and runs the registration
//! pass that turns them into a composed, frozen registry.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::activation::{AnyArc, Factory, SnapshotResolver};
use crate::config::RegistrarConfig;
use crate::decoration::DecoratorComposer;
use crate::descriptors::{AttributeKind, Binding};
use crate::diagnostics::RegistrationStatistics;
use crate::error::{ActivationResult, ConfigurationError, RegistrarResult};
use crate::intent::{DecoratorSpec, RegistrationIntent};
use crate::interceptor::{Interceptors, RegistrationContext, RegistrationInterceptor};
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::registration::{Registry, RegistrySnapshot};
use crate::resolver::{BindingResolver, ResolutionPolicy};
use crate::traits::ServiceResolver;
use crate::types::{TypeDescriptor, TypeUniverse};
use crate::validation::{DependencyGraph, DependencyValidator, ValidationIssue, ValidationReport, ValidationSeverity};

pub mod batch;
pub mod convention;
pub mod module_system;

pub use batch::BatchRegistration;
pub use convention::Convention;
pub use module_system::{RegistrationModule, RegistrarExt, RegistrarModuleExt};

enum Pending {
    Intent(RegistrationIntent),
    Explicit(Binding),
    Convention(Convention),
}

/// Collects intents and composes them into a registry.
///
/// Intents are processed in the order they were given. Each one is
/// filtered, resolved to a binding and committed through the interceptors;
/// decorators are applied once every binding is in place. Any configuration
/// error aborts the whole pass.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{
///     Lifetime, RegistrationIntent, Registrar, TypeDescriptor, TypeKey, TypeUniverse,
/// };
///
/// trait Clock {}
/// struct SystemClock;
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::abstraction::<dyn Clock>())
///     .insert(TypeDescriptor::implementation::<SystemClock>().implements::<dyn Clock>());
///
/// let mut registrar = Registrar::new(universe);
/// registrar.register(RegistrationIntent::singleton::<SystemClock>());
/// let composition = registrar.build().unwrap();
///
/// let binding = &composition.registry().bindings()[0];
/// assert_eq!(binding.service, TypeKey::of::<dyn Clock>());
/// assert_eq!(binding.lifetime, Lifetime::Singleton);
/// ```
pub struct Registrar {
    universe: TypeUniverse,
    config: RegistrarConfig,
    pending: Vec<Pending>,
    interceptors: Interceptors,
}

impl Registrar {
    pub fn new(universe: TypeUniverse) -> Self {
        Self::with_config(universe, RegistrarConfig::default())
    }

    pub fn with_config(universe: TypeUniverse, config: RegistrarConfig) -> Self {
        Registrar { universe, config, pending: Vec::new(), interceptors: Interceptors::default() }
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RegistrarConfig {
        &mut self.config
    }

    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    /// Describes another type before the pass runs.
    pub fn describe(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.universe.insert(descriptor);
        self
    }

    pub fn register(&mut self, intent: RegistrationIntent) -> &mut Self {
        self.pending.push(Pending::Intent(intent));
        self
    }

    pub fn register_all<I>(&mut self, intents: I) -> &mut Self
    where
        I: IntoIterator<Item = RegistrationIntent>,
    {
        self.pending.extend(intents.into_iter().map(Pending::Intent));
        self
    }

    /// Binds a pre-built value as a singleton of `service`.
    pub fn add_instance(&mut self, service: TypeKey, value: AnyArc) -> &mut Self {
        let binding = Binding::new(service.clone(), service, Lifetime::Singleton).with_instance(value);
        self.pending.push(Pending::Explicit(binding));
        self
    }

    /// Binds `service` to a factory.
    pub fn add_factory<F>(&mut self, service: TypeKey, lifetime: Lifetime, factory: F) -> &mut Self
    where
        F: Fn(&dyn ServiceResolver) -> ActivationResult<AnyArc> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(factory);
        let binding = Binding::new(service.clone(), service, lifetime).with_factory(factory);
        self.pending.push(Pending::Explicit(binding));
        self
    }

    pub(crate) fn push_explicit(&mut self, binding: Binding) {
        self.pending.push(Pending::Explicit(binding));
    }

    pub(crate) fn push_convention(&mut self, convention: Convention) {
        self.pending.push(Pending::Convention(convention));
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn RegistrationInterceptor>) -> &mut Self {
        self.interceptors.add(interceptor);
        self
    }

    /// Number of intents and explicit bindings waiting for the pass.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Runs the registration pass.
    pub fn build(self) -> RegistrarResult<Composition> {
        let Registrar { mut universe, config, pending, interceptors } = self;
        universe.set_framework_prefixes(config.framework_prefixes.iter().cloned());
        let universe = Arc::new(universe);

        let resolver = BindingResolver::new(&universe, ResolutionPolicy::from(&config));
        let mut registry = Registry::new();
        let mut decorations: Vec<(TypeKey, Vec<DecoratorSpec>)> = Vec::new();
        let declared: HashSet<TypeKey> = pending
            .iter()
            .filter_map(|entry| match entry {
                Pending::Intent(intent) => Some(intent.implementation.clone()),
                _ => None,
            })
            .collect();

        info!(entries = pending.len(), interceptors = interceptors.len(), "registration pass started");

        for entry in pending {
            match entry {
                Pending::Intent(intent) => {
                    if !Self::admits(&config, &intent) {
                        continue;
                    }
                    let binding = resolver.resolve(&intent)?;
                    // Decorators follow only the intents that actually landed.
                    if commit(&interceptors, &mut registry, binding) && !intent.decorators.is_empty() {
                        collect_decorators(&mut decorations, &intent);
                    }
                }
                Pending::Explicit(binding) => {
                    if !universe.is_assignable(&binding.service, &binding.implementation) {
                        return Err(if universe.contains(&binding.implementation) {
                            ConfigurationError::AbstractionNotImplemented {
                                implementation: binding.implementation.clone(),
                                abstraction: binding.service.clone(),
                            }
                        } else {
                            ConfigurationError::UnknownType(binding.implementation.clone())
                        });
                    }
                    commit(&interceptors, &mut registry, binding);
                }
                Pending::Convention(convention) => {
                    for binding in convention.bindings(&universe, &config, &declared) {
                        commit(&interceptors, &mut registry, binding);
                    }
                }
            }
        }

        let composer = DecoratorComposer::new(Arc::clone(&universe));
        for (implementation, specs) in &decorations {
            if composer.compose(implementation, specs, &mut registry)? == 0 {
                debug!(implementation = %implementation, "no decorable bindings");
            }
        }

        let registry = registry.freeze();
        info!(bindings = registry.len(), "registration pass complete");

        Ok(Composition { registry, universe, config: Arc::new(config) })
    }

    fn admits(config: &RegistrarConfig, intent: &RegistrationIntent) -> bool {
        if !config.filter.matches(&intent.implementation) {
            debug!(implementation = %intent.implementation, "excluded by type filter");
            return false;
        }
        if let Some(condition) = &intent.condition {
            if !condition.allows(config.environment.as_deref()) {
                debug!(
                    implementation = %intent.implementation,
                    environment = ?config.environment,
                    "condition not met"
                );
                return false;
            }
        }
        if intent.key.is_some() && !config.keyed_bindings_supported {
            warn!(
                implementation = %intent.implementation,
                "keyed bindings are not supported, intent skipped"
            );
            return false;
        }
        true
    }
}

fn collect_decorators(decorations: &mut Vec<(TypeKey, Vec<DecoratorSpec>)>, intent: &RegistrationIntent) {
    let at = match decorations.iter().position(|(imp, _)| imp == &intent.implementation) {
        Some(at) => at,
        None => {
            decorations.push((intent.implementation.clone(), Vec::new()));
            decorations.len() - 1
        }
    };
    let specs = &mut decorations[at].1;
    for spec in &intent.decorators {
        if !specs.contains(spec) {
            specs.push(spec.clone());
        }
    }
}

/// Passes a binding through the interceptors and into the registry.
/// Returns whether it was appended.
fn commit(interceptors: &Interceptors, registry: &mut Registry, binding: Binding) -> bool {
    let mut context = RegistrationContext::from_binding(&binding);
    interceptors.before(&mut context);
    if context.skip {
        debug!(service = %binding.service, implementation = %binding.implementation, "registration vetoed");
    } else {
        context.registered = registry.add(binding).is_some();
    }
    interceptors.after(&context);
    context.registered
}

/// Output of a registration pass: the frozen registry with the universe
/// and settings it was composed under.
#[derive(Clone)]
pub struct Composition {
    registry: RegistrySnapshot,
    universe: Arc<TypeUniverse>,
    config: Arc<RegistrarConfig>,
}

impl Composition {
    pub fn registry(&self) -> &RegistrySnapshot {
        &self.registry
    }

    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    pub fn validator(&self) -> DependencyValidator<'_> {
        DependencyValidator::new(&self.universe).keyed_bindings(self.config.keyed_bindings_supported)
    }

    /// Validates with the configured minimum severity.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        self.validate_with(self.config.minimum_severity)
    }

    pub fn validate_with(&self, minimum: ValidationSeverity) -> Vec<ValidationIssue> {
        self.validator().validate(&self.registry, minimum)
    }

    pub fn validation_report(&self) -> ValidationReport {
        self.validator().report(&self.registry, self.config.minimum_severity)
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        self.validator().dependency_graph(&self.registry)
    }

    /// A reference activator over this composition.
    pub fn activator(&self) -> SnapshotResolver<'_> {
        SnapshotResolver::new(&self.registry, &self.universe)
    }

    pub fn statistics(&self) -> RegistrationStatistics {
        self.registry.statistics()
    }

    /// Bindings whose service type implements or is `base`.
    pub fn bindings_assignable_to(&self, base: &TypeKey) -> Vec<&Binding> {
        self.registry
            .iter()
            .filter(|b| self.universe.is_assignable(base, &b.service))
            .collect()
    }

    pub fn batch_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.registry.iter().filter(|b| b.attribute == AttributeKind::Batch)
    }

    pub fn convention_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.registry.iter().filter(|b| b.attribute == AttributeKind::Convention)
    }
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("bindings", &self.registry.len())
            .field("types", &self.universe.len())
            .finish()
    }
}
