use std::env;
use std::io::Write;

use ferrous_registrar::{
    ConfigurationError, EnvironmentConfigSource, RegistrarConfig, TryAddDefaults, ValidationSeverity,
    DEFAULT_ENV_PREFIX,
};
use serial_test::serial;

const KEYS: [&str; 4] = ["ENVIRONMENT", "KEYED_BINDINGS", "ALLOW_SELF_REGISTRATION", "MINIMUM_SEVERITY"];

fn clear_env(prefix: &str) {
    for key in KEYS {
        env::remove_var(format!("{}_{}", prefix, key));
    }
}

#[test]
fn test_defaults() {
    let config = RegistrarConfig::default();
    assert!(config.keyed_bindings_supported);
    assert!(config.allow_self_registration);
    assert_eq!(config.try_add_defaults, TryAddDefaults { singleton: true, scoped: true, transient: false });
    assert_eq!(config.environment, None);
    assert_eq!(config.minimum_severity, ValidationSeverity::Warning);
    assert!(config.framework_prefixes.iter().any(|p| p == "std::"));
    assert!(config.filter.is_empty());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = RegistrarConfig::from_json_str(
        r#"{
            "allow_self_registration": false,
            "try_add_defaults": { "transient": true },
            "filter": { "exclude_patterns": ["*Mock"] }
        }"#,
    )
    .unwrap();

    assert!(!config.allow_self_registration);
    assert!(config.keyed_bindings_supported);
    assert_eq!(config.try_add_defaults, TryAddDefaults { singleton: true, scoped: true, transient: true });
    assert_eq!(config.filter.exclude_patterns, vec!["*Mock".to_string()]);
}

#[test]
fn test_malformed_json_is_rejected() {
    let err = RegistrarConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigurationError::Json(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RegistrarConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigurationError::Io(_)));
}

#[test]
#[serial]
fn test_load_file_then_environment() {
    let prefix = "REGISTRAR_LOAD_TEST";
    clear_env(prefix);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "environment": "Staging", "minimum_severity": "Warning" }}"#).unwrap();

    let from_file = RegistrarConfig::load(Some(file.path()), prefix).unwrap();
    assert_eq!(from_file.environment.as_deref(), Some("Staging"));

    env::set_var(format!("{}_ENVIRONMENT", prefix), "Production");
    env::set_var(format!("{}_MINIMUM_SEVERITY", prefix), "error");
    env::set_var(format!("{}_KEYED_BINDINGS", prefix), "off");

    let layered = RegistrarConfig::load(Some(file.path()), prefix).unwrap();
    clear_env(prefix);

    assert_eq!(layered.environment.as_deref(), Some("Production"));
    assert_eq!(layered.minimum_severity, ValidationSeverity::Error);
    assert!(!layered.keyed_bindings_supported);
    assert!(layered.allow_self_registration);
}

#[test]
#[serial]
fn test_invalid_environment_value() {
    let prefix = "REGISTRAR_INVALID_TEST";
    clear_env(prefix);
    env::set_var(format!("{}_ALLOW_SELF_REGISTRATION", prefix), "maybe");

    let result = RegistrarConfig::load(None, prefix);
    clear_env(prefix);

    match result {
        Err(ConfigurationError::InvalidSettings { message }) => {
            assert!(message.contains("allow_self_registration"));
            assert!(message.contains("maybe"));
        }
        other => panic!("expected invalid settings, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_default_prefix_source() {
    clear_env(DEFAULT_ENV_PREFIX);
    env::set_var("REGISTRAR_ENVIRONMENT", "Development");

    let config = RegistrarConfig::default()
        .with_overrides(&EnvironmentConfigSource::with_prefix(DEFAULT_ENV_PREFIX))
        .unwrap();
    clear_env(DEFAULT_ENV_PREFIX);

    assert_eq!(config.environment.as_deref(), Some("Development"));
}

#[test]
#[serial]
fn test_no_variables_means_defaults() {
    let prefix = "REGISTRAR_EMPTY_TEST";
    clear_env(prefix);
    assert_eq!(RegistrarConfig::load(None, prefix).unwrap(), RegistrarConfig::default());
}
