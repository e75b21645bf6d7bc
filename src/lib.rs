//! # ferrous-registrar
//!
//! Declarative component registration for Rust, inspired by
//! Microsoft.Extensions.DependencyInjection and attribute-driven service
//! registration.
//!
//! Components declare how they want to be registered: a lifetime, an
//! optional key, an optional explicit service type and decorators. A single
//! registration pass turns those intents into an ordered registry of
//! bindings, and a validator checks the result before anything is
//! activated.
//!
//! ## Features
//!
//! - **Binding resolution**: the service type is inferred from the most
//!   specific abstraction a component implements
//! - **Conventions**: bulk registration by type name suffix, naming
//!   pattern or module
//! - **Decorator chains**: ordered wrappers composed over every binding of
//!   an implementation
//! - **Static validation**: duplicates, missing dependencies, lifetime
//!   captivity and dependency cycles
//! - **Diagnostics**: reports, CSV, statistics and graph export
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_registrar::{
//!     erase, Constructor, Registrar, RegistrationIntent, ServiceResolverExt, TypeDescriptor,
//!     TypeKey, TypeUniverse, ValidationSeverity,
//! };
//! use std::sync::Arc;
//!
//! trait Weather: Send + Sync {
//!     fn forecast(&self) -> String;
//! }
//!
//! struct StaticWeather;
//! impl Weather for StaticWeather {
//!     fn forecast(&self) -> String { "sunny".to_string() }
//! }
//!
//! struct ShoutingWeather { inner: Arc<dyn Weather> }
//! impl Weather for ShoutingWeather {
//!     fn forecast(&self) -> String { self.inner.forecast().to_uppercase() }
//! }
//!
//! let mut universe = TypeUniverse::new();
//! universe
//!     .insert(TypeDescriptor::abstraction::<dyn Weather>())
//!     .insert(
//!         TypeDescriptor::implementation::<StaticWeather>()
//!             .implements::<dyn Weather>()
//!             .constructor(Constructor::new().activate(|_| {
//!                 Ok(erase(Arc::new(StaticWeather) as Arc<dyn Weather>))
//!             })),
//!     )
//!     .insert(
//!         TypeDescriptor::implementation::<ShoutingWeather>()
//!             .implements::<dyn Weather>()
//!             .constructor(Constructor::new().param::<dyn Weather>().activate(|args| {
//!                 let inner: Arc<dyn Weather> = args.get(0)?;
//!                 Ok(erase(Arc::new(ShoutingWeather { inner }) as Arc<dyn Weather>))
//!             })),
//!     );
//!
//! let mut registrar = Registrar::new(universe);
//! registrar.register(
//!     RegistrationIntent::scoped::<StaticWeather>().decorate_with::<ShoutingWeather>(0),
//! );
//! let composition = registrar.build()?;
//! assert!(composition.validate_with(ValidationSeverity::Warning).is_empty());
//!
//! let weather: Arc<dyn Weather> = composition.activator().get(&TypeKey::of::<dyn Weather>())?;
//! assert_eq!(weather.forecast(), "SUNNY");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Validation
//!
//! | Check | Severity |
//! |-------|----------|
//! | Several bindings for one service and key | Warning |
//! | Constructor parameter nothing satisfies | Error |
//! | Singleton depending on a scoped service | Error |
//! | Singleton depending on a transient service | Warning |
//! | Dependency cycle | Error |

pub mod activation;
pub mod config;
pub mod decoration;
pub mod descriptors;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod graph_export;
pub mod intent;
pub mod interceptor;
pub mod key;
pub mod lifetime;
pub mod registrar;
pub mod registration;
pub mod resolver;
pub mod traits;
pub mod types;
pub mod validation;

pub(crate) mod internal;

pub use activation::{activate, downcast, erase, ActivateFn, AnyArc, Arguments, Factory, SnapshotResolver};
pub use config::{ConfigSource, EnvironmentConfigSource, RegistrarConfig, TryAddDefaults, DEFAULT_ENV_PREFIX};
pub use decoration::DecoratorComposer;
pub use descriptors::{AttributeKind, Binding, DecoratorInfo, RegistrationMethod, ServiceSource};
pub use diagnostics::RegistrationStatistics;
pub use error::{ActivationError, ActivationResult, ConfigurationError, RegistrarResult};
pub use filter::TypeFilter;
pub use graph_export::{DefaultGraphExporter, ExportFormat, ExportOptions, GraphDocument, GraphExporter};
pub use intent::{Condition, DecoratorSpec, RegistrationIntent};
pub use interceptor::{LoggingInterceptor, PredicateInterceptor, RegistrationContext, RegistrationInterceptor};
pub use key::{ServiceKey, TypeKey};
pub use lifetime::Lifetime;
pub use registrar::{
    BatchRegistration, Composition, Convention, Registrar, RegistrarExt, RegistrarModuleExt,
    RegistrationModule,
};
pub use registration::{Registry, RegistrySnapshot};
pub use resolver::{BindingResolver, ResolutionPolicy};
pub use traits::{ServiceResolver, ServiceResolverExt};
pub use types::{Constructor, Parameter, TypeCategory, TypeDescriptor, TypeKind, TypeUniverse};
pub use validation::{
    DependencyGraph, DependencyValidator, IssueKind, ValidationIssue, ValidationReport, ValidationSeverity,
};
