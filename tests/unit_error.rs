/// Unit tests for ConfigurationError, ActivationError and their result types
use ferrous_registrar::{
    ActivationError, ActivationResult, ConfigurationError, RegistrarResult, ServiceKey, TypeKey,
};
use std::error::Error;

#[test]
fn test_abstraction_not_implemented_display() {
    let error = ConfigurationError::AbstractionNotImplemented {
        implementation: TypeKey::named("app::SmtpMailer"),
        abstraction: TypeKey::named("app::Clock"),
    };
    assert_eq!(
        error.to_string(),
        "The type app::SmtpMailer does not implement the abstraction type app::Clock"
    );
}

#[test]
fn test_decorator_mismatch_display() {
    let error = ConfigurationError::DecoratorMismatch {
        decorator: TypeKey::named("app::Retrying"),
        service: TypeKey::named("dyn app::Store"),
    };
    let display_str = error.to_string();
    assert!(display_str.contains("app::Retrying"));
    assert!(display_str.contains("dyn app::Store"));
}

#[test]
fn test_no_abstraction_and_unknown_type_display() {
    let error = ConfigurationError::NoAbstraction { implementation: TypeKey::named("app::Job") };
    assert!(error.to_string().contains("self-registration is disabled"));

    let error = ConfigurationError::UnknownType(TypeKey::named("app::Ghost"));
    assert_eq!(error.to_string(), "The type app::Ghost is not part of the type universe");
}

#[test]
fn test_io_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.json");
    let error = ConfigurationError::from(io);
    assert!(error.to_string().starts_with("I/O error: "));
    assert!(error.source().is_some());
}

#[test]
fn test_error_display_not_found() {
    let error = ActivationError::NotFound { service: TypeKey::named("app::Cache"), key: None };
    assert_eq!(error.to_string(), "Service not found: app::Cache");

    let keyed = ActivationError::NotFound {
        service: TypeKey::named("app::Cache"),
        key: Some(ServiceKey::new("redis")),
    };
    assert_eq!(keyed.to_string(), "Service not found: app::Cache (key 'redis')");
}

#[test]
fn test_error_display_type_mismatch() {
    let error = ActivationError::TypeMismatch("alloc::string::String");
    assert_eq!(error.to_string(), "Type mismatch for: alloc::string::String");
}

#[test]
fn test_error_display_circular() {
    let path = vec![TypeKey::named("ServiceA"), TypeKey::named("ServiceB"), TypeKey::named("ServiceA")];
    let error = ActivationError::Circular(path);
    assert_eq!(error.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
}

#[test]
fn test_error_display_empty_circular_path() {
    let error = ActivationError::Circular(vec![]);
    assert_eq!(error.to_string(), "Circular dependency: ");
}

#[test]
fn test_error_display_depth_and_arguments() {
    assert_eq!(ActivationError::DepthExceeded(100).to_string(), "Max depth 100 exceeded");
    assert_eq!(
        ActivationError::MissingArgument { index: 2, expected: "u32" }.to_string(),
        "Missing constructor argument 2 of type u32"
    );
    assert_eq!(
        ActivationError::NotConstructible(TypeKey::named("app::Inert")).to_string(),
        "Type app::Inert has no activation function"
    );
}

#[test]
fn test_result_aliases() {
    let ok: RegistrarResult<u8> = Ok(1);
    assert!(ok.is_ok());

    let result: ActivationResult<String> = Err(ActivationError::DepthExceeded(3));
    match result {
        Err(ActivationError::DepthExceeded(depth)) => assert_eq!(depth, 3),
        _ => panic!("Expected DepthExceeded error"),
    }
}

#[test]
fn test_activation_error_clone_and_source() {
    let error = ActivationError::TypeMismatch("SomeType");
    let cloned = error.clone();
    assert_eq!(error, cloned);
    assert!(format!("{:?}", error).contains("TypeMismatch"));
    assert!(error.source().is_none());
}
