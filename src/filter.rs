//! Filtering which implementation types take part in a registration pass.

use serde::{Deserialize, Serialize};

use crate::key::TypeKey;

/// Include/exclude rules over module paths and type-name patterns.
///
/// Module rules compare against [`TypeKey::module_path`] and match the
/// module itself and everything nested below it. Patterns compare against
/// [`TypeKey::short_name`] and support a `*` wildcard at the start, the end
/// or both. An empty include list includes everything; exclusions always
/// win.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{TypeFilter, TypeKey};
///
/// let filter = TypeFilter::new()
///     .include_module("app::services")
///     .exclude_pattern("*Mock");
///
/// assert!(filter.matches(&TypeKey::named("app::services::mail::SmtpMailer")));
/// assert!(!filter.matches(&TypeKey::named("app::services::MailerMock")));
/// assert!(!filter.matches(&TypeKey::named("app::web::Router")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeFilter {
    pub include_modules: Vec<String>,
    pub exclude_modules: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl TypeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_module(mut self, module: impl Into<String>) -> Self {
        self.include_modules.push(module.into());
        self
    }

    pub fn exclude_module(mut self, module: impl Into<String>) -> Self {
        self.exclude_modules.push(module.into());
        self
    }

    pub fn include_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    pub fn exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.include_modules.is_empty()
            && self.exclude_modules.is_empty()
            && self.include_patterns.is_empty()
            && self.exclude_patterns.is_empty()
    }

    pub fn matches(&self, ty: &TypeKey) -> bool {
        let module = ty.module_path();
        let name = ty.short_name();

        if self.exclude_modules.iter().any(|m| in_module(module, m)) {
            return false;
        }
        if self.exclude_patterns.iter().any(|p| matches_pattern(name, p)) {
            return false;
        }
        if !self.include_modules.is_empty() && !self.include_modules.iter().any(|m| in_module(module, m)) {
            return false;
        }
        if !self.include_patterns.is_empty() && !self.include_patterns.iter().any(|p| matches_pattern(name, p)) {
            return false;
        }
        true
    }
}

fn in_module(module: &str, rule: &str) -> bool {
    module == rule || module.strip_prefix(rule).is_some_and(|rest| rest.starts_with("::"))
}

/// Matches `name` against a pattern with an optional leading and/or
/// trailing `*`.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
        (Some(rest), _) if rest.ends_with('*') => {
            let needle = &rest[..rest.len() - 1];
            name.contains(needle)
        }
        (Some(suffix), _) => name.ends_with(suffix),
        (None, Some(prefix)) => name.starts_with(prefix),
        (None, None) => name == pattern,
    }
}
