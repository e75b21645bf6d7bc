//! Type identities and binding keys for the registrar.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a type known to the registrar.
///
/// A `TypeKey` is the fully qualified name of a type. Keys produced by
/// [`TypeKey::of`] use [`std::any::type_name`], so `dyn Trait` abstractions
/// and concrete structs share one namespace. Hosts that describe their
/// components from metadata rather than Rust types can use
/// [`TypeKey::named`] with any stable path-like name.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::TypeKey;
///
/// trait Notifier {}
/// struct EmailNotifier;
///
/// let service = TypeKey::of::<dyn Notifier>();
/// let implementation = TypeKey::of::<EmailNotifier>();
///
/// assert_eq!(service.short_name(), "Notifier");
/// assert_eq!(implementation.short_name(), "EmailNotifier");
/// assert_eq!(TypeKey::named("app::mail::Smtp").module_path(), "app::mail");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    /// Key for a Rust type, sized or not.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Key for a type described only by name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        TypeKey(name.into())
    }

    /// Fully qualified name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Last path segment of the base type, generic arguments kept.
    ///
    /// `alloc::vec::Vec<app::Job>` becomes `Vec<app::Job>`, `dyn app::Clock`
    /// becomes `Clock`. Auto-trait and lifetime bounds on a trait object are
    /// dropped, so `dyn app::Clock + core::marker::Send` is also `Clock`.
    pub fn short_name(&self) -> &str {
        let name = self.principal();
        let base_end = name.find('<').unwrap_or(name.len());
        let start = name[..base_end].rfind("::").map_or(0, |i| i + 2);
        &name[start..]
    }

    /// Module path of the base type, empty for unqualified names.
    pub fn module_path(&self) -> &str {
        let name = self.principal();
        let base = &name[..name.find('<').unwrap_or(name.len())];
        base.rfind("::").map_or("", |i| &base[..i])
    }

    /// The name without a leading `dyn ` and without top-level `+` bounds.
    fn principal(&self) -> &str {
        let name = self.0.strip_prefix("dyn ").unwrap_or(&self.0);
        let mut depth = 0usize;
        for (i, c) in name.char_indices() {
            match c {
                '<' | '(' | '[' => depth += 1,
                '>' | ')' | ']' => depth = depth.saturating_sub(1),
                '+' if depth == 0 => return name[..i].trim_end(),
                _ => {}
            }
        }
        name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        TypeKey(Cow::Borrowed(name))
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        TypeKey(Cow::Owned(name))
    }
}

/// Opaque key distinguishing keyed bindings of the same service.
///
/// Two bindings with the same service and different keys never collide,
/// and a keyed constructor parameter only matches a binding carrying an
/// equal key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKey(String);

impl ServiceKey {
    pub fn new(key: impl Into<String>) -> Self {
        ServiceKey(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceKey {
    fn from(key: &str) -> Self {
        ServiceKey(key.to_string())
    }
}

impl From<String> for ServiceKey {
    fn from(key: String) -> Self {
        ServiceKey(key)
    }
}
