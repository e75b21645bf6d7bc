//! Error types for registration and activation.

use thiserror::Error;

use crate::key::{ServiceKey, TypeKey};

/// Configuration errors raised while turning registration intents into
/// bindings.
///
/// Any of these aborts the registration pass: the registrar never hands out
/// a partially composed registry.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{ConfigurationError, TypeKey};
///
/// let err = ConfigurationError::AbstractionNotImplemented {
///     implementation: TypeKey::named("app::SmtpMailer"),
///     abstraction: TypeKey::named("app::Clock"),
/// };
/// assert_eq!(
///     err.to_string(),
///     "The type app::SmtpMailer does not implement the abstraction type app::Clock"
/// );
/// ```
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An explicit service type the implementation does not satisfy
    #[error("The type {implementation} does not implement the abstraction type {abstraction}")]
    AbstractionNotImplemented {
        implementation: TypeKey,
        abstraction: TypeKey,
    },
    /// No abstraction to bind to and self-registration is disabled
    #[error("The type {implementation} implements no abstraction and self-registration is disabled")]
    NoAbstraction { implementation: TypeKey },
    /// A decorator that cannot stand in for the decorated service
    #[error("Decorator type {decorator} does not implement the service type {service}")]
    DecoratorMismatch { decorator: TypeKey, service: TypeKey },
    /// A type that was never described to the type universe
    #[error("The type {0} is not part of the type universe")]
    UnknownType(TypeKey),
    /// Settings that could not be interpreted
    #[error("Invalid registrar settings: {message}")]
    InvalidSettings { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigurationError {
    pub(crate) fn invalid_settings(message: impl Into<String>) -> Self {
        ConfigurationError::InvalidSettings { message: message.into() }
    }
}

/// Errors raised by the reference activator.
///
/// Activation is outside the registration pass; these mirror what a host
/// container reports when it resolves from a composed registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// No binding for the requested service and key
    #[error("Service not found: {service}{}", describe_key(.key))]
    NotFound {
        service: TypeKey,
        key: Option<ServiceKey>,
    },
    /// Activated value was not of the requested Rust type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", join_path(.0))]
    Circular(Vec<TypeKey>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// The type has no activation function to construct it with
    #[error("Type {0} has no activation function")]
    NotConstructible(TypeKey),
    /// An activation function asked for an argument that is not there
    #[error("Missing constructor argument {index} of type {expected}")]
    MissingArgument { index: usize, expected: &'static str },
}

fn describe_key(key: &Option<ServiceKey>) -> String {
    key.as_ref().map(|k| format!(" (key '{}')", k)).unwrap_or_default()
}

fn join_path(path: &[TypeKey]) -> String {
    path.iter().map(TypeKey::name).collect::<Vec<_>>().join(" -> ")
}

/// Result type for the registration pass.
pub type RegistrarResult<T> = Result<T, ConfigurationError>;

/// Result type for activation.
pub type ActivationResult<T> = Result<T, ActivationError>;
