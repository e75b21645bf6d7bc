//! Human-readable diagnostics over a frozen registry.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::descriptors::{Binding, RegistrationMethod};
use crate::lifetime::Lifetime;
use crate::registration::RegistrySnapshot;

/// Counts over a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationStatistics {
    pub total: usize,
    pub singleton: usize,
    pub scoped: usize,
    pub transient: usize,
    pub keyed: usize,
    pub decorated: usize,
    /// Decorators across all bindings
    pub decorators: usize,
    pub try_add: usize,
    pub add: usize,
    /// Bindings per service type, by full name
    pub per_service: BTreeMap<String, usize>,
}

impl RegistrySnapshot {
    /// Report of every binding, grouped by lifetime.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Service Registration Diagnostic Report ===");
        let _ = writeln!(out, "Total Services Registered: {}", self.len());

        for lifetime in Lifetime::ALL {
            let bindings = sorted_by_service(self.by_lifetime(lifetime));
            if bindings.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "--- {} Services ({}) ---", lifetime, bindings.len());
            for binding in bindings {
                let _ = writeln!(out, "  Service: {}", binding.service);
                let _ = writeln!(out, "  Implementation: {}", binding.implementation);
                let _ = writeln!(out, "  Registration Method: {}", binding.method);
                let _ = writeln!(out, "  Attribute: {}", binding.attribute);
                if let Some(key) = &binding.key {
                    let _ = writeln!(out, "  Key: {}", key);
                }
                if binding.is_decorated() {
                    let _ = writeln!(out, "  Decorators ({}):", binding.decorators.len());
                    for decorator in binding.decorators_by_order() {
                        let _ = writeln!(out, "    - {} (Order: {})", decorator.decorator, decorator.order);
                    }
                }
                let _ = writeln!(out);
            }
        }
        out
    }

    /// Tree of services, their implementations and decorators.
    pub fn dependency_listing(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Service Dependency Graph ===");
        for binding in sorted_by_service(self.iter()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", binding.service.short_name());
            let keyed = binding.key.as_ref().map(|k| format!(" (key: {})", k)).unwrap_or_default();
            let _ = writeln!(
                out,
                "  └─ {} [{}]{}",
                binding.implementation.short_name(),
                binding.lifetime,
                keyed
            );
            for decorator in binding.decorators_by_order() {
                let _ = writeln!(out, "     └─ Decorator: {}", decorator.decorator.short_name());
            }
        }
        out
    }

    /// CSV export, one row per binding in registration order.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "ServiceType,ImplementationType,Lifetime,Key,RegistrationMethod,AttributeKind,DecoratorCount\n",
        );
        for binding in self.iter() {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{}",
                csv_field(binding.service.name()),
                csv_field(binding.implementation.name()),
                binding.lifetime,
                csv_field(binding.key.as_ref().map(|k| k.as_str()).unwrap_or("")),
                binding.method,
                binding.attribute,
                binding.decorators.len()
            );
        }
        out
    }

    pub fn statistics(&self) -> RegistrationStatistics {
        let mut stats = RegistrationStatistics { total: self.len(), ..Default::default() };
        for binding in self.iter() {
            match binding.lifetime {
                Lifetime::Singleton => stats.singleton += 1,
                Lifetime::Scoped => stats.scoped += 1,
                Lifetime::Transient => stats.transient += 1,
            }
            stats.keyed += usize::from(binding.is_keyed());
            stats.decorated += usize::from(binding.is_decorated());
            stats.decorators += binding.decorators.len();
            match binding.method {
                RegistrationMethod::TryAdd => stats.try_add += 1,
                RegistrationMethod::Add => stats.add += 1,
            }
            *stats.per_service.entry(binding.service.name().to_string()).or_default() += 1;
        }
        stats
    }

    /// Bindings whose service or implementation name contains `fragment`,
    /// ignoring case.
    pub fn find_by_name(&self, fragment: &str) -> Vec<&Binding> {
        let needle = fragment.to_lowercase();
        self.iter()
            .filter(|b| {
                b.service.name().to_lowercase().contains(&needle)
                    || b.implementation.name().to_lowercase().contains(&needle)
            })
            .collect()
    }
}

fn sorted_by_service<'a>(bindings: impl Iterator<Item = &'a Binding>) -> Vec<&'a Binding> {
    let mut bindings: Vec<_> = bindings.collect();
    bindings.sort_by(|a, b| a.service.short_name().cmp(b.service.short_name()));
    bindings
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
