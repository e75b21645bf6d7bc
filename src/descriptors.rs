//! Bindings: the entries of the registration log.

use std::fmt;

use serde::Serialize;

use crate::activation::{AnyArc, Factory};
use crate::key::{ServiceKey, TypeKey};
use crate::lifetime::Lifetime;

/// How a binding entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegistrationMethod {
    /// Always appended
    Add,
    /// Appended only when no binding with the same service and key exists
    TryAdd,
}

impl fmt::Display for RegistrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationMethod::Add => f.write_str("Add"),
            RegistrationMethod::TryAdd => f.write_str("TryAdd"),
        }
    }
}

/// The declaration form a binding came from, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeKind {
    Singleton,
    Scoped,
    Transient,
    SingletonKeyed,
    ScopedKeyed,
    TransientKeyed,
    /// Registered through the batch API rather than a component intent
    Batch,
    /// Selected by a naming or module convention
    Convention,
}

impl AttributeKind {
    pub fn for_lifetime(lifetime: Lifetime, keyed: bool) -> Self {
        match (lifetime, keyed) {
            (Lifetime::Singleton, false) => AttributeKind::Singleton,
            (Lifetime::Scoped, false) => AttributeKind::Scoped,
            (Lifetime::Transient, false) => AttributeKind::Transient,
            (Lifetime::Singleton, true) => AttributeKind::SingletonKeyed,
            (Lifetime::Scoped, true) => AttributeKind::ScopedKeyed,
            (Lifetime::Transient, true) => AttributeKind::TransientKeyed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Singleton => "singleton",
            AttributeKind::Scoped => "scoped",
            AttributeKind::Transient => "transient",
            AttributeKind::SingletonKeyed => "singleton-keyed",
            AttributeKind::ScopedKeyed => "scoped-keyed",
            AttributeKind::TransientKeyed => "transient-keyed",
            AttributeKind::Batch => "batch",
            AttributeKind::Convention => "convention",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decorator recorded on a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DecoratorInfo {
    pub decorator: TypeKey,
    pub order: i32,
}

/// Where a binding's value comes from.
#[derive(Clone, Default)]
pub enum ServiceSource {
    /// Activated through the implementation's primary constructor
    #[default]
    Type,
    /// A pre-built value
    Instance(AnyArc),
    /// A factory, which is what decorated bindings become
    Factory(Factory),
}

impl fmt::Debug for ServiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceSource::Type => f.write_str("Type"),
            ServiceSource::Instance(_) => f.write_str("Instance(<value>)"),
            ServiceSource::Factory(_) => f.write_str("Factory(<fn>)"),
        }
    }
}

/// One entry in the registration log.
///
/// The service type, implementation type, lifetime and key are fixed when
/// the binding is created. Decorators only change how the value is
/// produced, never which service it answers for.
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    pub service: TypeKey,
    pub implementation: TypeKey,
    pub lifetime: Lifetime,
    pub key: Option<ServiceKey>,
    /// Applied decorators, innermost first
    pub decorators: Vec<DecoratorInfo>,
    pub method: RegistrationMethod,
    pub attribute: AttributeKind,
    #[serde(skip)]
    pub(crate) source: ServiceSource,
}

impl Binding {
    pub fn new(service: TypeKey, implementation: TypeKey, lifetime: Lifetime) -> Self {
        Binding {
            service,
            implementation,
            lifetime,
            key: None,
            decorators: Vec::new(),
            method: RegistrationMethod::Add,
            attribute: AttributeKind::for_lifetime(lifetime, false),
            source: ServiceSource::Type,
        }
    }

    pub fn with_key(mut self, key: Option<ServiceKey>) -> Self {
        self.attribute = match self.attribute {
            AttributeKind::Batch => AttributeKind::Batch,
            AttributeKind::Convention => AttributeKind::Convention,
            _ => AttributeKind::for_lifetime(self.lifetime, key.is_some()),
        };
        self.key = key;
        self
    }

    pub fn with_method(mut self, method: RegistrationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeKind) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn with_instance(mut self, value: AnyArc) -> Self {
        self.source = ServiceSource::Instance(value);
        self
    }

    pub fn with_factory(mut self, factory: Factory) -> Self {
        self.source = ServiceSource::Factory(factory);
        self
    }

    pub fn source(&self) -> &ServiceSource {
        &self.source
    }

    /// True when the binding answers for `service` under `key`.
    pub fn matches(&self, service: &TypeKey, key: Option<&ServiceKey>) -> bool {
        &self.service == service && self.key.as_ref() == key
    }

    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    pub fn is_self_registered(&self) -> bool {
        self.service == self.implementation
    }

    pub fn is_decorated(&self) -> bool {
        !self.decorators.is_empty()
    }

    /// Decorators sorted by ascending order, as reports show them.
    pub fn decorators_by_order(&self) -> Vec<&DecoratorInfo> {
        let mut decorators: Vec<_> = self.decorators.iter().collect();
        decorators.sort_by_key(|d| d.order);
        decorators
    }
}
