//! Module system for grouping registrations.
//!
//! A module bundles the intents and type descriptions of one feature so
//! the composition root can pull it in with a single call.

use crate::error::RegistrarResult;
use crate::registrar::Registrar;

/// A group of registrations contributed to a [`Registrar`].
///
/// # Example
///
/// ```rust
/// use ferrous_registrar::{
///     RegistrarResult, RegistrarExt, Registrar, RegistrationIntent, RegistrationModule,
///     TypeDescriptor, TypeUniverse,
/// };
///
/// trait Mailer {}
/// struct SmtpMailer;
///
/// struct MailModule;
///
/// impl RegistrationModule for MailModule {
///     fn register(self, registrar: &mut Registrar) -> RegistrarResult<()> {
///         registrar
///             .describe(TypeDescriptor::abstraction::<dyn Mailer>())
///             .describe(TypeDescriptor::implementation::<SmtpMailer>().implements::<dyn Mailer>())
///             .register(RegistrationIntent::singleton::<SmtpMailer>());
///         Ok(())
///     }
/// }
///
/// # fn main() -> RegistrarResult<()> {
/// let composition = Registrar::new(TypeUniverse::new()).add_module(MailModule)?.build()?;
/// assert_eq!(composition.registry().len(), 1);
/// # Ok(())
/// # }
/// ```
pub trait RegistrationModule {
    fn register(self, registrar: &mut Registrar) -> RegistrarResult<()>;
}

/// Chaining module registration by value.
pub trait RegistrarExt {
    fn add_module<M: RegistrationModule>(self, module: M) -> RegistrarResult<Self>
    where
        Self: Sized;
}

impl RegistrarExt for Registrar {
    fn add_module<M: RegistrationModule>(mut self, module: M) -> RegistrarResult<Self> {
        module.register(&mut self)?;
        Ok(self)
    }
}

/// In-place module registration.
pub trait RegistrarModuleExt {
    fn add_module_mut<M: RegistrationModule>(&mut self, module: M) -> RegistrarResult<&mut Self>;
}

impl RegistrarModuleExt for Registrar {
    fn add_module_mut<M: RegistrationModule>(&mut self, module: M) -> RegistrarResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }
}
