//! Batch registration of explicit service/implementation pairs.

use tracing::debug;

use crate::descriptors::{AttributeKind, Binding, RegistrationMethod};
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::registrar::Registrar;

impl Registrar {
    /// Binds several implementations to one service with a shared lifetime.
    ///
    /// Pairs are checked when the pass runs: each implementation must be
    /// described and satisfy `service`.
    pub fn add_multiple<I>(&mut self, service: TypeKey, lifetime: Lifetime, implementations: I) -> &mut Self
    where
        I: IntoIterator<Item = TypeKey>,
    {
        for implementation in implementations {
            self.push_explicit(batch_binding(service.clone(), implementation, lifetime));
        }
        self
    }

    /// Starts a batch of pairs sharing `lifetime`.
    pub fn with_lifetime(&mut self, lifetime: Lifetime) -> BatchRegistration<'_> {
        BatchRegistration { registrar: self, lifetime, pairs: Vec::new() }
    }
}

fn batch_binding(service: TypeKey, implementation: TypeKey, lifetime: Lifetime) -> Binding {
    Binding::new(service, implementation, lifetime)
        .with_method(RegistrationMethod::Add)
        .with_attribute(AttributeKind::Batch)
}

/// Builder for a batch of registrations.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{Lifetime, Registrar, TypeDescriptor, TypeUniverse};
///
/// trait Handler {}
/// struct Ping;
/// struct Pong;
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::abstraction::<dyn Handler>())
///     .insert(TypeDescriptor::implementation::<Ping>().implements::<dyn Handler>())
///     .insert(TypeDescriptor::implementation::<Pong>().implements::<dyn Handler>());
///
/// let mut registrar = Registrar::new(universe);
/// registrar
///     .with_lifetime(Lifetime::Transient)
///     .add::<dyn Handler, Ping>()
///     .add::<dyn Handler, Pong>()
///     .finish();
///
/// let composition = registrar.build().unwrap();
/// assert_eq!(composition.batch_bindings().count(), 2);
/// ```
pub struct BatchRegistration<'a> {
    registrar: &'a mut Registrar,
    lifetime: Lifetime,
    pairs: Vec<(TypeKey, TypeKey)>,
}

impl<'a> BatchRegistration<'a> {
    pub fn add<S: ?Sized + 'static, I: ?Sized + 'static>(self) -> Self {
        self.add_pair(TypeKey::of::<S>(), TypeKey::of::<I>())
    }

    pub fn add_pair(mut self, service: TypeKey, implementation: TypeKey) -> Self {
        self.pairs.push((service, implementation));
        self
    }

    /// Queues the pairs on the registrar.
    pub fn finish(self) -> &'a mut Registrar {
        debug!(pairs = self.pairs.len(), lifetime = %self.lifetime, "batch queued");
        for (service, implementation) in self.pairs {
            self.registrar
                .push_explicit(batch_binding(service, implementation, self.lifetime));
        }
        self.registrar
    }
}
