//! Registrar configuration.
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! environment variables under a prefix (`REGISTRAR_` by default).

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigurationError, RegistrarResult};
use crate::filter::TypeFilter;
use crate::lifetime::Lifetime;
use crate::types::DEFAULT_FRAMEWORK_PREFIXES;
use crate::validation::ValidationSeverity;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "REGISTRAR";

/// Whether an intent that does not say otherwise uses TryAdd, per lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryAddDefaults {
    pub singleton: bool,
    pub scoped: bool,
    pub transient: bool,
}

impl Default for TryAddDefaults {
    fn default() -> Self {
        TryAddDefaults { singleton: true, scoped: true, transient: false }
    }
}

impl TryAddDefaults {
    pub fn for_lifetime(&self, lifetime: Lifetime) -> bool {
        match lifetime {
            Lifetime::Singleton => self.singleton,
            Lifetime::Scoped => self.scoped,
            Lifetime::Transient => self.transient,
        }
    }
}

/// Settings of a registration pass.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{RegistrarConfig, ValidationSeverity};
///
/// let config = RegistrarConfig::from_json_str(
///     r#"{ "environment": "Staging", "minimum_severity": "Error" }"#,
/// ).unwrap();
///
/// assert_eq!(config.environment.as_deref(), Some("Staging"));
/// assert_eq!(config.minimum_severity, ValidationSeverity::Error);
/// assert!(config.keyed_bindings_supported);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
    /// Whether the host honours keyed bindings; keyed intents are skipped
    /// when it does not
    pub keyed_bindings_supported: bool,
    /// Bind implementations with no abstractions to themselves
    pub allow_self_registration: bool,
    pub try_add_defaults: TryAddDefaults,
    /// Current environment, matched by intent conditions
    pub environment: Option<String>,
    /// Issues below this severity are dropped by [`Composition::validate`](crate::Composition::validate)
    pub minimum_severity: ValidationSeverity,
    /// Module prefixes of host-provided types
    pub framework_prefixes: Vec<String>,
    pub filter: TypeFilter,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        RegistrarConfig {
            keyed_bindings_supported: true,
            allow_self_registration: true,
            try_add_defaults: TryAddDefaults::default(),
            environment: None,
            minimum_severity: ValidationSeverity::Warning,
            framework_prefixes: DEFAULT_FRAMEWORK_PREFIXES.iter().map(|p| p.to_string()).collect(),
            filter: TypeFilter::default(),
        }
    }
}

impl RegistrarConfig {
    pub fn from_json_str(json: &str) -> RegistrarResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> RegistrarResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Defaults, then the file if given, then `{prefix}_*` environment
    /// variables.
    pub fn load(path: Option<&Path>, env_prefix: &str) -> RegistrarResult<Self> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(&EnvironmentConfigSource::with_prefix(env_prefix))
    }

    /// Applies the recognised keys found in `source`.
    ///
    /// Keys: `environment`, `keyed_bindings`, `allow_self_registration`,
    /// `minimum_severity`.
    pub fn with_overrides(mut self, source: &dyn ConfigSource) -> RegistrarResult<Self> {
        if let Some(environment) = source.get("environment") {
            self.environment = Some(environment);
        }
        if let Some(value) = source.get("keyed_bindings") {
            self.keyed_bindings_supported = parse_bool("keyed_bindings", &value)?;
        }
        if let Some(value) = source.get("allow_self_registration") {
            self.allow_self_registration = parse_bool("allow_self_registration", &value)?;
        }
        if let Some(value) = source.get("minimum_severity") {
            self.minimum_severity = value.parse().map_err(ConfigurationError::invalid_settings)?;
        }
        debug!(source = ?source, "applied configuration overrides");
        Ok(self)
    }
}

fn parse_bool(key: &str, value: &str) -> RegistrarResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigurationError::invalid_settings(format!(
            "{} expects a boolean, got '{}'",
            key, other
        ))),
    }
}

/// A source of string settings looked up by lower-case key.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
}

/// Environment variable configuration source
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    /// Prefix to filter environment variables
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        let env_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        };
        env::var(env_key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct MapSource(HashMap<&'static str, &'static str>);

    impl ConfigSource for MapSource {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_try_add_defaults() {
        let defaults = TryAddDefaults::default();
        assert!(defaults.for_lifetime(Lifetime::Singleton));
        assert!(defaults.for_lifetime(Lifetime::Scoped));
        assert!(!defaults.for_lifetime(Lifetime::Transient));
    }

    #[test]
    fn test_overrides_from_source() {
        let source = MapSource(HashMap::from([
            ("environment", "Production"),
            ("keyed_bindings", "no"),
            ("minimum_severity", "error"),
        ]));
        let config = RegistrarConfig::default().with_overrides(&source).unwrap();
        assert_eq!(config.environment.as_deref(), Some("Production"));
        assert!(!config.keyed_bindings_supported);
        assert!(config.allow_self_registration);
        assert_eq!(config.minimum_severity, ValidationSeverity::Error);
    }

    #[test]
    fn test_bad_boolean_is_rejected() {
        let source = MapSource(HashMap::from([("allow_self_registration", "sometimes")]));
        let err = RegistrarConfig::default().with_overrides(&source).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSettings { .. }));
    }
}
