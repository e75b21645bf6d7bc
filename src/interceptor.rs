//! Registration interceptors.
//!
//! Interceptors observe every binding as it is committed to the registry
//! and may veto it before it lands.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::descriptors::{Binding, RegistrationMethod};
use crate::key::{ServiceKey, TypeKey};
use crate::lifetime::Lifetime;

/// A binding about to be committed, or just committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationContext {
    pub service: TypeKey,
    pub implementation: TypeKey,
    pub lifetime: Lifetime,
    pub key: Option<ServiceKey>,
    pub method: RegistrationMethod,
    /// Set by an interceptor to keep the binding out of the registry
    pub skip: bool,
    /// Whether the binding landed; only meaningful after registration
    pub registered: bool,
}

impl RegistrationContext {
    pub fn from_binding(binding: &Binding) -> Self {
        RegistrationContext {
            service: binding.service.clone(),
            implementation: binding.implementation.clone(),
            lifetime: binding.lifetime,
            key: binding.key.clone(),
            method: binding.method,
            skip: false,
            registered: false,
        }
    }
}

/// Hooks around each registry commit.
///
/// # Examples
///
/// ```
/// use ferrous_registrar::{RegistrationContext, RegistrationInterceptor};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl RegistrationInterceptor for Counter {
///     fn after_registration(&self, context: &RegistrationContext) {
///         if context.registered {
///             self.0.fetch_add(1, Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait RegistrationInterceptor: Send + Sync {
    /// Called before the binding is added; set `context.skip` to veto it.
    fn before_registration(&self, _context: &mut RegistrationContext) {}

    /// Called after the registry accepted, discarded or skipped the binding.
    fn after_registration(&self, _context: &RegistrationContext) {}
}

/// Interceptors in registration order.
#[derive(Default, Clone)]
pub(crate) struct Interceptors {
    interceptors: Vec<Arc<dyn RegistrationInterceptor>>,
}

impl Interceptors {
    pub(crate) fn add(&mut self, interceptor: Arc<dyn RegistrationInterceptor>) {
        self.interceptors.push(interceptor);
    }

    #[inline]
    pub(crate) fn before(&self, context: &mut RegistrationContext) {
        for interceptor in &self.interceptors {
            interceptor.before_registration(context);
        }
    }

    #[inline]
    pub(crate) fn after(&self, context: &RegistrationContext) {
        for interceptor in &self.interceptors {
            interceptor.after_registration(context);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.interceptors.len()
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interceptors({})", self.interceptors.len())
    }
}

/// Logs every registration through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingInterceptor {
    prefix: String,
}

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self { prefix: "[ferrous-registrar]".to_string() }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationInterceptor for LoggingInterceptor {
    fn before_registration(&self, context: &mut RegistrationContext) {
        info!(
            prefix = %self.prefix,
            service = %context.service,
            implementation = %context.implementation,
            lifetime = %context.lifetime,
            "registering"
        );
    }

    fn after_registration(&self, context: &RegistrationContext) {
        info!(
            prefix = %self.prefix,
            service = %context.service,
            registered = context.registered,
            skipped = context.skip,
            "registration finished"
        );
    }
}

/// Vetoes registrations the predicate rejects.
pub struct PredicateInterceptor<F> {
    predicate: F,
}

impl<F> PredicateInterceptor<F>
where
    F: Fn(&RegistrationContext) -> bool + Send + Sync,
{
    /// `predicate` returns `true` for bindings that may be registered.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> RegistrationInterceptor for PredicateInterceptor<F>
where
    F: Fn(&RegistrationContext) -> bool + Send + Sync,
{
    fn before_registration(&self, context: &mut RegistrationContext) {
        if !(self.predicate)(context) {
            context.skip = true;
        }
    }
}
