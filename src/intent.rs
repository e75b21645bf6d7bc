//! Registration intents: what a component declares about its own binding.

use serde::{Deserialize, Serialize};

use crate::descriptors::AttributeKind;
use crate::key::{ServiceKey, TypeKey};
use crate::lifetime::Lifetime;

/// A decorator applied to every binding of an implementation.
///
/// Lower `order` ends up outermost: decorators are applied in descending
/// order, each wrapping the result of the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecoratorSpec {
    pub decorator: TypeKey,
    #[serde(default)]
    pub order: i32,
}

impl DecoratorSpec {
    pub fn new(decorator: TypeKey, order: i32) -> Self {
        DecoratorSpec { decorator, order }
    }

    pub fn of<D: ?Sized + 'static>(order: i32) -> Self {
        DecoratorSpec::new(TypeKey::of::<D>(), order)
    }
}

/// Environment gate on an intent.
///
/// Environment names compare case-insensitively. With no current
/// environment configured, an include condition never holds and an exclude
/// condition always does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub environments: Vec<String>,
    #[serde(default = "default_include")]
    pub include: bool,
}

fn default_include() -> bool {
    true
}

impl Condition {
    /// Holds only in the listed environments.
    pub fn only_in<I, S>(environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition { environments: environments.into_iter().map(Into::into).collect(), include: true }
    }

    /// Holds everywhere except the listed environments.
    pub fn except_in<I, S>(environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition { include: false, ..Condition::only_in(environments) }
    }

    pub fn allows(&self, environment: Option<&str>) -> bool {
        let listed = environment
            .map(|env| self.environments.iter().any(|e| e.eq_ignore_ascii_case(env)))
            .unwrap_or(false);
        listed == self.include
    }
}

/// A component's declared registration.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{Lifetime, RegistrationIntent, TypeKey};
///
/// trait Cache {}
/// struct RedisCache;
/// struct TracingCache;
///
/// let intent = RegistrationIntent::singleton::<RedisCache>()
///     .as_service::<dyn Cache>()
///     .keyed("primary")
///     .decorate_with::<TracingCache>(0);
///
/// assert_eq!(intent.lifetime, Lifetime::Singleton);
/// assert_eq!(intent.service, Some(TypeKey::of::<dyn Cache>()));
/// assert_eq!(intent.decorators.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationIntent {
    pub implementation: TypeKey,
    pub lifetime: Lifetime,
    /// Explicit service type; inferred from declared abstractions when absent
    #[serde(default)]
    pub service: Option<TypeKey>,
    #[serde(default)]
    pub key: Option<ServiceKey>,
    /// Add-if-absent; the configured per-lifetime default applies when absent
    #[serde(default)]
    pub try_add: Option<bool>,
    #[serde(default)]
    pub decorators: Vec<DecoratorSpec>,
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl RegistrationIntent {
    pub fn new(implementation: TypeKey, lifetime: Lifetime) -> Self {
        RegistrationIntent {
            implementation,
            lifetime,
            service: None,
            key: None,
            try_add: None,
            decorators: Vec::new(),
            condition: None,
        }
    }

    pub fn singleton<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), Lifetime::Singleton)
    }

    pub fn scoped<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), Lifetime::Scoped)
    }

    pub fn transient<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), Lifetime::Transient)
    }

    pub fn as_service<S: ?Sized + 'static>(self) -> Self {
        self.with_service(TypeKey::of::<S>())
    }

    pub fn with_service(mut self, service: TypeKey) -> Self {
        self.service = Some(service);
        self
    }

    pub fn keyed(mut self, key: impl Into<ServiceKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn try_add(mut self, try_add: bool) -> Self {
        self.try_add = Some(try_add);
        self
    }

    pub fn decorate_with<D: ?Sized + 'static>(self, order: i32) -> Self {
        self.with_decorator(DecoratorSpec::of::<D>(order))
    }

    pub fn with_decorator(mut self, spec: DecoratorSpec) -> Self {
        self.decorators.push(spec);
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn attribute(&self) -> AttributeKind {
        AttributeKind::for_lifetime(self.lifetime, self.key.is_some())
    }
}
