//! Activation of composed bindings.
//!
//! The registrar's output is data. This module turns that data back into
//! values: a binding's source is invoked with its constructor arguments
//! resolved from the same snapshot, with decorator chains applied.
//! [`SnapshotResolver`] is a reference activator that caches nothing; host
//! containers can reuse [`activate`] and the binding sources behind their
//! own lifetime management.

use std::any::{type_name, Any};
use std::sync::Arc;

use tracing::trace;

use crate::descriptors::{Binding, ServiceSource};
use crate::error::{ActivationError, ActivationResult};
use crate::internal::ResolutionStack;
use crate::key::{ServiceKey, TypeKey};
use crate::registration::RegistrySnapshot;
use crate::traits::ServiceResolver;
use crate::types::{Parameter, TypeCategory, TypeUniverse};

/// Type-erased activated value.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Activation function of a [`Constructor`](crate::Constructor).
pub type ActivateFn = Arc<dyn Fn(Arguments) -> ActivationResult<AnyArc> + Send + Sync>;

/// Produces a service value from a resolver.
pub type Factory = Arc<dyn Fn(&dyn ServiceResolver) -> ActivationResult<AnyArc> + Send + Sync>;

/// Erases a value for storage in an [`AnyArc`].
#[inline]
pub fn erase<T: Send + Sync + 'static>(value: T) -> AnyArc {
    Arc::new(value)
}

/// Recovers a clone of the `T` stored in an [`AnyArc`].
pub fn downcast<T: Clone + 'static>(value: &AnyArc) -> ActivationResult<T> {
    (**value)
        .downcast_ref::<T>()
        .cloned()
        .ok_or(ActivationError::TypeMismatch(type_name::<T>()))
}

/// Resolved constructor arguments, in parameter order.
///
/// Optional parameters arrive as `Option<AnyArc>` and collection parameters
/// as `Vec<AnyArc>`; [`Arguments::optional`] and [`Arguments::all`] unwrap
/// them.
pub struct Arguments {
    values: Vec<AnyArc>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<AnyArc>) -> Self {
        Arguments { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn raw(&self, index: usize) -> ActivationResult<&AnyArc> {
        self.values
            .get(index)
            .ok_or(ActivationError::MissingArgument { index, expected: type_name::<AnyArc>() })
    }

    pub fn get<T: Clone + 'static>(&self, index: usize) -> ActivationResult<T> {
        let value = self
            .values
            .get(index)
            .ok_or(ActivationError::MissingArgument { index, expected: type_name::<T>() })?;
        downcast(value)
    }

    pub fn optional<T: Clone + 'static>(&self, index: usize) -> ActivationResult<Option<T>> {
        match self.get::<Option<AnyArc>>(index)? {
            Some(value) => downcast(&value).map(Some),
            None => Ok(None),
        }
    }

    pub fn all<T: Clone + 'static>(&self, index: usize) -> ActivationResult<Vec<T>> {
        self.get::<Vec<AnyArc>>(index)?.iter().map(downcast::<T>).collect()
    }
}

/// Constructs `implementation` through its primary constructor.
///
/// When `inner` is given, the first parameter whose type equals the inner
/// service receives the inner value instead of being resolved. Decorators
/// are activated this way.
pub fn activate(
    universe: &TypeUniverse,
    implementation: &TypeKey,
    resolver: &dyn ServiceResolver,
    inner: Option<(&TypeKey, AnyArc)>,
) -> ActivationResult<AnyArc> {
    let not_constructible = || ActivationError::NotConstructible(implementation.clone());
    let ctor = universe.primary_constructor(implementation).ok_or_else(not_constructible)?;
    let activate_fn = ctor.activator().ok_or_else(not_constructible)?;

    let mut inner = inner;
    let mut values = Vec::with_capacity(ctor.arity());
    for param in ctor.parameters() {
        let supplied = match inner.take() {
            Some((service, value)) if *service == param.ty => Some(value),
            other => {
                inner = other;
                None
            }
        };
        match supplied {
            Some(value) => values.push(value),
            None => values.push(resolve_parameter(universe, param, resolver)?),
        }
    }

    trace!(implementation = %implementation, arity = values.len(), "activating");
    activate_fn(Arguments::new(values))
}

fn resolve_parameter(
    universe: &TypeUniverse,
    param: &Parameter,
    resolver: &dyn ServiceResolver,
) -> ActivationResult<AnyArc> {
    let key = param.key.as_ref();
    match universe.category(&param.ty) {
        TypeCategory::Optional(inner) => match resolver.resolve(&inner, key) {
            Ok(value) => Ok(erase(Some(value))),
            Err(ActivationError::NotFound { .. }) => Ok(erase(None::<AnyArc>)),
            Err(e) => Err(e),
        },
        TypeCategory::Collection(inner) => Ok(erase(resolver.resolve_all(&inner, key)?)),
        _ => resolver.resolve(&param.ty, key),
    }
}

/// A factory producing the undecorated value of a binding.
pub(crate) fn source_factory(universe: &Arc<TypeUniverse>, binding: &Binding) -> Factory {
    match binding.source() {
        ServiceSource::Type => {
            let universe = Arc::clone(universe);
            let implementation = binding.implementation.clone();
            Arc::new(move |resolver| activate(&universe, &implementation, resolver, None))
        }
        ServiceSource::Instance(value) => {
            let value = Arc::clone(value);
            Arc::new(move |_| Ok(Arc::clone(&value)))
        }
        ServiceSource::Factory(factory) => Arc::clone(factory),
    }
}

/// Reference activator over a frozen registry.
///
/// Every resolution activates afresh: lifetimes are recorded on bindings
/// but not enforced here. Single-value resolution uses the last matching
/// binding; activation cycles and runaway depth are reported as errors.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{
///     erase, Constructor, RegistrationIntent, Registrar, ServiceResolverExt, TypeDescriptor,
///     TypeKey, TypeUniverse,
/// };
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct English;
/// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::abstraction::<dyn Greeter>())
///     .insert(
///         TypeDescriptor::implementation::<English>()
///             .implements::<dyn Greeter>()
///             .constructor(Constructor::new().activate(|_| {
///                 Ok(erase(Arc::new(English) as Arc<dyn Greeter>))
///             })),
///     );
///
/// let mut registrar = Registrar::new(universe);
/// registrar.register(RegistrationIntent::transient::<English>());
/// let composition = registrar.build().unwrap();
///
/// let activator = composition.activator();
/// let greeter: Arc<dyn Greeter> = activator.get(&TypeKey::of::<dyn Greeter>()).unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub struct SnapshotResolver<'a> {
    snapshot: &'a RegistrySnapshot,
    universe: &'a TypeUniverse,
    stack: ResolutionStack,
}

impl<'a> SnapshotResolver<'a> {
    pub fn new(snapshot: &'a RegistrySnapshot, universe: &'a TypeUniverse) -> Self {
        SnapshotResolver { snapshot, universe, stack: ResolutionStack::default() }
    }

    fn instantiate(&self, binding: &Binding) -> ActivationResult<AnyArc> {
        let frame = match &binding.key {
            Some(key) => TypeKey::named(format!("{} ({})", binding.service, key)),
            None => binding.service.clone(),
        };
        let _guard = self.stack.enter(&frame)?;
        trace!(service = %frame, depth = self.stack.depth(), "instantiating");
        match binding.source() {
            ServiceSource::Type => activate(self.universe, &binding.implementation, self, None),
            ServiceSource::Instance(value) => Ok(Arc::clone(value)),
            ServiceSource::Factory(factory) => factory(self),
        }
    }
}

impl ServiceResolver for SnapshotResolver<'_> {
    fn resolve(&self, service: &TypeKey, key: Option<&ServiceKey>) -> ActivationResult<AnyArc> {
        let binding = self.snapshot.resolve_single(service, key).ok_or_else(|| {
            ActivationError::NotFound { service: service.clone(), key: key.cloned() }
        })?;
        self.instantiate(binding)
    }

    fn resolve_all(&self, service: &TypeKey, key: Option<&ServiceKey>) -> ActivationResult<Vec<AnyArc>> {
        self.snapshot
            .resolve_all(service, key)
            .into_iter()
            .map(|binding| self.instantiate(binding))
            .collect()
    }
}
