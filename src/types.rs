//! The tagged type universe.
//!
//! Rust has no runtime reflection, so the registrar reasons over an explicit
//! catalogue: every component type is described once with the abstractions
//! it declares and the constructors it can be built with. Everything the
//! binding resolver, the decorator composer and the validator know about
//! types comes from here.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::activation::{ActivateFn, AnyArc, Arguments};
use crate::error::ActivationResult;
use crate::key::{ServiceKey, TypeKey};

/// Whether a described type is an abstraction or something constructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A trait or base type components are bound to
    Abstraction,
    /// A concrete component
    Implementation,
}

/// How the validator treats a type when it appears as a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// An ordinary component that must be bound
    Component,
    /// A language primitive, never expected in the registry
    Primitive,
    /// A platform or library type, assumed to be provided by the host
    Framework,
    /// An optional dependency on the wrapped type
    Optional(TypeKey),
    /// A collection of every binding of the wrapped type
    Collection(TypeKey),
}

impl TypeCategory {
    /// Primitive, framework, optional and collection types are never
    /// reported as missing and never form graph edges.
    pub fn is_exempt(&self) -> bool {
        !matches!(self, TypeCategory::Component)
    }
}

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "&str", "&'static str", "()", "i8", "i16", "i32", "i64", "i128",
    "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32", "f64",
];

const OPTION_PREFIX: &str = "core::option::Option<";
const VEC_PREFIX: &str = "alloc::vec::Vec<";
const POINTER_PREFIXES: &[&str] = &["alloc::sync::Arc<", "alloc::boxed::Box<", "alloc::rc::Rc<"];

/// Prefixes treated as framework types when no configuration says otherwise.
pub const DEFAULT_FRAMEWORK_PREFIXES: &[&str] = &["std::", "core::", "alloc::"];

/// A constructor parameter: the type it needs and, optionally, the key of
/// the keyed binding it must come from.
///
/// Activated values are handed out behind `Arc`, so a parameter declared
/// as `Arc<T>`, `Box<T>` or `Rc<T>` depends on `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub ty: TypeKey,
    pub key: Option<ServiceKey>,
}

impl Parameter {
    pub fn new(ty: TypeKey) -> Self {
        Parameter { ty: pointee(ty), key: None }
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Parameter::new(TypeKey::of::<T>())
    }

    /// A parameter annotated with a service key.
    pub fn keyed(ty: TypeKey, key: impl Into<ServiceKey>) -> Self {
        Parameter { ty: pointee(ty), key: Some(key.into()) }
    }
}

/// One way to construct an implementation.
///
/// Parameters are listed in call order. The optional activation function
/// receives the resolved arguments in the same order; constructors without
/// one are still analysed by the validator but cannot be activated.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{erase, Constructor};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct Scheduler { clock: Arc<Clock> }
///
/// let ctor = Constructor::new()
///     .param::<Clock>()
///     .activate(|args| {
///         let clock: Arc<Clock> = args.get(0)?;
///         Ok(erase(Arc::new(Scheduler { clock })))
///     });
/// assert_eq!(ctor.arity(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Constructor {
    params: Vec<Parameter>,
    activate: Option<ActivateFn>,
}

impl Constructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param<T: ?Sized + 'static>(self) -> Self {
        self.parameter(Parameter::of::<T>())
    }

    pub fn keyed_param<T: ?Sized + 'static>(self, key: impl Into<ServiceKey>) -> Self {
        self.parameter(Parameter::keyed(TypeKey::of::<T>(), key))
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.params.push(parameter);
        self
    }

    pub fn activate<F>(mut self, f: F) -> Self
    where
        F: Fn(Arguments) -> ActivationResult<AnyArc> + Send + Sync + 'static,
    {
        self.activate = Some(Arc::new(f));
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    pub fn activator(&self) -> Option<&ActivateFn> {
        self.activate.as_ref()
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .field("activatable", &self.activate.is_some())
            .finish()
    }
}

/// Picks the constructor with the most parameters; ties go to the first
/// declared.
pub fn primary_constructor(constructors: &[Constructor]) -> Option<&Constructor> {
    let mut best: Option<&Constructor> = None;
    for ctor in constructors {
        if best.map_or(true, |b| ctor.arity() > b.arity()) {
            best = Some(ctor);
        }
    }
    best
}

/// Everything the registrar knows about one type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    kind: TypeKind,
    category: TypeCategory,
    interfaces: Vec<TypeKey>,
    constructors: Vec<Constructor>,
}

impl TypeDescriptor {
    fn with_kind(key: TypeKey, kind: TypeKind, category: TypeCategory) -> Self {
        TypeDescriptor { key, kind, category, interfaces: Vec::new(), constructors: Vec::new() }
    }

    pub fn abstraction<T: ?Sized + 'static>() -> Self {
        Self::abstraction_named(TypeKey::of::<T>())
    }

    pub fn abstraction_named(key: TypeKey) -> Self {
        Self::with_kind(key, TypeKind::Abstraction, TypeCategory::Component)
    }

    pub fn implementation<T: ?Sized + 'static>() -> Self {
        Self::implementation_named(TypeKey::of::<T>())
    }

    pub fn implementation_named(key: TypeKey) -> Self {
        Self::with_kind(key, TypeKind::Implementation, TypeCategory::Component)
    }

    /// A type the host provides itself, such as a logger handle.
    pub fn framework(key: TypeKey) -> Self {
        Self::with_kind(key, TypeKind::Implementation, TypeCategory::Framework)
    }

    pub fn optional(key: TypeKey, inner: TypeKey) -> Self {
        Self::with_kind(key, TypeKind::Abstraction, TypeCategory::Optional(inner))
    }

    pub fn collection(key: TypeKey, inner: TypeKey) -> Self {
        Self::with_kind(key, TypeKind::Abstraction, TypeCategory::Collection(inner))
    }

    /// Declares an abstraction this type implements, or, for an
    /// abstraction, a parent it extends.
    pub fn implements<T: ?Sized + 'static>(self) -> Self {
        self.with_interface(TypeKey::of::<T>())
    }

    pub fn with_interface(mut self, interface: TypeKey) -> Self {
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn category(&self) -> &TypeCategory {
        &self.category
    }

    /// Directly declared abstractions, in declaration order.
    pub fn interfaces(&self) -> &[TypeKey] {
        &self.interfaces
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn primary_constructor(&self) -> Option<&Constructor> {
        primary_constructor(&self.constructors)
    }
}

/// The catalogue of described types.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{TypeDescriptor, TypeKey, TypeUniverse};
///
/// trait Store {}
/// trait AuditedStore: Store {}
/// struct PgStore;
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::abstraction::<dyn Store>())
///     .insert(TypeDescriptor::abstraction::<dyn AuditedStore>().implements::<dyn Store>())
///     .insert(TypeDescriptor::implementation::<PgStore>().implements::<dyn AuditedStore>());
///
/// let implemented = universe.implemented_abstractions(&TypeKey::of::<PgStore>());
/// assert_eq!(
///     implemented,
///     vec![TypeKey::of::<dyn AuditedStore>(), TypeKey::of::<dyn Store>()]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TypeUniverse {
    types: Vec<TypeDescriptor>,
    index: HashMap<TypeKey, usize>,
    framework_prefixes: Vec<String>,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    pub fn new() -> Self {
        TypeUniverse {
            types: Vec::new(),
            index: HashMap::new(),
            framework_prefixes: DEFAULT_FRAMEWORK_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Adds a descriptor, replacing any earlier one with the same key.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        match self.index.get(descriptor.key()) {
            Some(&at) => self.types[at] = descriptor,
            None => {
                self.index.insert(descriptor.key().clone(), self.types.len());
                self.types.push(descriptor);
            }
        }
        self
    }

    pub fn set_framework_prefixes<I, S>(&mut self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.framework_prefixes = prefixes.into_iter().map(Into::into).collect();
    }

    pub fn framework_prefixes(&self) -> &[String] {
        &self.framework_prefixes
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.index.get(key).map(|&at| &self.types[at])
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Category of a type, described or not.
    ///
    /// Undescribed types are classified by name: primitives, `Option<_>`,
    /// `Vec<_>` and anything under a framework prefix. A smart pointer takes
    /// the category of what it points to.
    pub fn category(&self, key: &TypeKey) -> TypeCategory {
        if let Some(descriptor) = self.get(key) {
            return descriptor.category().clone();
        }
        let target = pointee(key.clone());
        if target != *key {
            return self.category(&target);
        }
        let name = key.name();
        if PRIMITIVES.contains(&name) {
            return TypeCategory::Primitive;
        }
        if let Some(inner) = unwrap_generic(name, OPTION_PREFIX) {
            return TypeCategory::Optional(pointee(TypeKey::named(inner.to_string())));
        }
        if let Some(inner) = unwrap_generic(name, VEC_PREFIX) {
            return TypeCategory::Collection(pointee(TypeKey::named(inner.to_string())));
        }
        if self.framework_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return TypeCategory::Framework;
        }
        TypeCategory::Component
    }

    /// True for dependencies the validator never expects in the registry.
    pub fn is_exempt(&self, key: &TypeKey) -> bool {
        self.category(key).is_exempt()
    }

    /// Every abstraction `key` implements, directly or through inherited
    /// abstractions: a depth-first preorder walk of declared interfaces,
    /// duplicates dropped.
    pub fn implemented_abstractions(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        if let Some(descriptor) = self.get(key) {
            for interface in descriptor.interfaces() {
                self.walk_interfaces(interface, &mut seen, &mut out);
            }
        }
        out
    }

    fn walk_interfaces(&self, key: &TypeKey, seen: &mut HashSet<TypeKey>, out: &mut Vec<TypeKey>) {
        if !seen.insert(key.clone()) {
            return;
        }
        out.push(key.clone());
        if let Some(descriptor) = self.get(key) {
            for parent in descriptor.interfaces() {
                self.walk_interfaces(parent, seen, out);
            }
        }
    }

    /// True when a value of `implementation` can be bound as `service`.
    pub fn is_assignable(&self, service: &TypeKey, implementation: &TypeKey) -> bool {
        service == implementation || self.implemented_abstractions(implementation).contains(service)
    }

    /// True when `descendant` strictly inherits from `ancestor`.
    pub fn inherits_from(&self, descendant: &TypeKey, ancestor: &TypeKey) -> bool {
        descendant != ancestor && self.implemented_abstractions(descendant).contains(ancestor)
    }

    pub fn primary_constructor(&self, key: &TypeKey) -> Option<&Constructor> {
        self.get(key).and_then(TypeDescriptor::primary_constructor)
    }
}

fn unwrap_generic<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)?.strip_suffix('>')
}

/// Strips `Arc`, `Box` and `Rc` wrappers, outermost first.
fn pointee(key: TypeKey) -> TypeKey {
    let mut name = key.name();
    while let Some(inner) = POINTER_PREFIXES.iter().find_map(|p| unwrap_generic(name, p)) {
        name = inner;
    }
    if name.len() == key.name().len() {
        key
    } else {
        TypeKey::named(name.to_string())
    }
}
