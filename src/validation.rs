//! Static validation of a composed registry.
//!
//! The validator reads a frozen snapshot and the type universe and reports
//! configuration problems before anything is activated. Nothing here
//! mutates the registry.
//!
//! # Rules
//!
//! - **Duplicate bindings**: Warning - only the last binding is used for
//!   single-value resolution
//! - **Missing dependencies**: Error - a constructor parameter no binding
//!   satisfies
//! - **Singleton → Scoped**: Error - the scoped instance is captured
//! - **Singleton → Transient**: Warning - the transient instance is captured
//! - **Dependency cycles**: Error
//!
//! Dependencies are the primary constructor parameters of a binding's
//! implementation and of each decorator applied to it, minus the wrapped
//! service a decorator receives.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::descriptors::Binding;
use crate::key::{ServiceKey, TypeKey};
use crate::lifetime::Lifetime;
use crate::registration::RegistrySnapshot;
use crate::types::{Parameter, TypeCategory, TypeUniverse};

/// Severity of a validation issue. `Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Warning,
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Warning => f.write_str("Warning"),
            ValidationSeverity::Error => f.write_str("Error"),
        }
    }
}

impl FromStr for ValidationSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Ok(ValidationSeverity::Warning),
            "error" => Ok(ValidationSeverity::Error),
            other => Err(format!("unknown validation severity '{}'", other)),
        }
    }
}

/// What kind of problem an issue describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    DuplicateBinding { count: usize },
    MissingDependency { dependency: TypeKey, key: Option<ServiceKey> },
    /// A singleton holds a shorter-lived dependency
    Captivity { dependency: TypeKey, lifetime: Lifetime },
    /// Implementations forming the cycle, first node repeated at the end
    Cycle { path: Vec<TypeKey> },
}

/// One problem found by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub message: String,
    pub severity: ValidationSeverity,
    pub service: Option<TypeKey>,
    pub implementation: Option<TypeKey>,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Result of validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == ValidationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == ValidationSeverity::Warning)
    }

    /// True when there are no errors. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// One issue per line.
    pub fn format_issues(&self) -> String {
        self.issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    }
}

/// A node of the dependency graph: one implementation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub implementation: TypeKey,
    /// Services the implementation is bound as
    pub services: Vec<TypeKey>,
    /// Lifetime of its first binding
    pub lifetime: Lifetime,
}

/// A constructor dependency between two implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub parameter: TypeKey,
    pub key: Option<ServiceKey>,
}

/// Implementation-to-implementation dependency graph of a snapshot.
///
/// Edges come from the constructors of each implementation and of the
/// decorators applied to its bindings. A parameter leads to the
/// implementation of the binding that would satisfy it, the last
/// registered one. A parameter with no binding whose
/// type is itself a registered implementation leads to that
/// implementation. Exempt parameter types have no edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    fn successors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            let targets: &mut Vec<usize> = &mut adjacency[edge.from];
            if !targets.contains(&edge.to) {
                targets.push(edge.to);
            }
        }
        adjacency
    }

    /// Every cycle found by a depth-first walk in node order.
    pub fn cycles(&self) -> Vec<Vec<TypeKey>> {
        let adjacency = self.successors();
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for node in 0..self.nodes.len() {
            if !visited.contains(&node) {
                self.dfs_cycles(node, &adjacency, &mut visited, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_cycles(
        &self,
        current: usize,
        adjacency: &[Vec<usize>],
        visited: &mut HashSet<usize>,
        path: &mut Vec<usize>,
        cycles: &mut Vec<Vec<TypeKey>>,
    ) {
        if let Some(cycle_start) = path.iter().position(|&n| n == current) {
            let cycle = path[cycle_start..]
                .iter()
                .chain(std::iter::once(&current))
                .map(|&n| self.nodes[n].implementation.clone())
                .collect();
            cycles.push(cycle);
            return;
        }

        if visited.contains(&current) {
            return;
        }

        visited.insert(current);
        path.push(current);

        for &next in &adjacency[current] {
            self.dfs_cycles(next, adjacency, visited, path, cycles);
        }

        path.pop();
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles().is_empty()
    }
}

/// Validates a frozen registry against the type universe.
///
/// # Examples
///
/// ```rust
/// use ferrous_registrar::{
///     Constructor, DependencyValidator, Lifetime, RegistrationIntent, Registrar,
///     TypeDescriptor, TypeUniverse, ValidationSeverity,
/// };
///
/// struct RequestContext;
/// struct AuditLog;
///
/// let mut universe = TypeUniverse::new();
/// universe
///     .insert(TypeDescriptor::implementation::<RequestContext>())
///     .insert(
///         TypeDescriptor::implementation::<AuditLog>()
///             .constructor(Constructor::new().param::<RequestContext>()),
///     );
///
/// let mut registrar = Registrar::new(universe);
/// registrar
///     .register(RegistrationIntent::scoped::<RequestContext>())
///     .register(RegistrationIntent::singleton::<AuditLog>());
/// let composition = registrar.build().unwrap();
///
/// let issues = DependencyValidator::new(composition.universe())
///     .validate(composition.registry(), ValidationSeverity::Warning);
/// assert_eq!(issues.len(), 1);
/// assert_eq!(issues[0].severity, ValidationSeverity::Error);
/// ```
pub struct DependencyValidator<'a> {
    universe: &'a TypeUniverse,
    keyed_bindings_supported: bool,
}

impl<'a> DependencyValidator<'a> {
    pub fn new(universe: &'a TypeUniverse) -> Self {
        DependencyValidator { universe, keyed_bindings_supported: true }
    }

    /// Without keyed support, duplicates group by service alone and
    /// parameter keys are ignored.
    pub fn keyed_bindings(mut self, supported: bool) -> Self {
        self.keyed_bindings_supported = supported;
        self
    }

    /// Runs every check and keeps issues at or above `minimum`.
    pub fn validate(&self, snapshot: &RegistrySnapshot, minimum: ValidationSeverity) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_duplicates(snapshot, &mut issues);
        self.check_missing_dependencies(snapshot, &mut issues);
        self.check_captivity(snapshot, &mut issues);
        self.check_cycles(snapshot, &mut issues);

        issues.retain(|issue| issue.severity >= minimum);

        let errors = issues.iter().filter(|i| i.severity == ValidationSeverity::Error).count();
        if errors > 0 {
            warn!(errors, warnings = issues.len() - errors, "registry validation found errors");
        } else {
            info!(warnings = issues.len(), bindings = snapshot.len(), "registry validation complete");
        }
        issues
    }

    pub fn report(&self, snapshot: &RegistrySnapshot, minimum: ValidationSeverity) -> ValidationReport {
        ValidationReport { issues: self.validate(snapshot, minimum) }
    }

    fn effective_key<'k>(&self, key: Option<&'k ServiceKey>) -> Option<&'k ServiceKey> {
        key.filter(|_| self.keyed_bindings_supported)
    }

    fn bindings_for<'s>(&self, snapshot: &'s RegistrySnapshot, param: &Parameter) -> Vec<&'s Binding> {
        match self.effective_key(param.key.as_ref()) {
            Some(key) => snapshot.resolve_all(&param.ty, Some(key)),
            None if self.keyed_bindings_supported => snapshot.resolve_all(&param.ty, None),
            None => snapshot.by_service(&param.ty).collect(),
        }
    }

    /// Constructor parameters `binding` needs, paired with the type whose
    /// constructor declares them.
    fn dependencies<'b>(&self, binding: &'b Binding) -> Vec<(&'b TypeKey, &'a Parameter)> {
        let universe: &'a TypeUniverse = self.universe;
        let mut owners = vec![(&binding.implementation, None)];
        owners.extend(binding.decorators.iter().map(|d| (&d.decorator, Some(&binding.service))));

        let mut dependencies = Vec::new();
        for (owner, wrapped) in owners {
            let Some(ctor) = universe.primary_constructor(owner) else {
                continue;
            };
            let mut skip_wrapped = wrapped;
            for param in ctor.parameters() {
                if skip_wrapped.is_some_and(|service| *service == param.ty) {
                    skip_wrapped = None;
                    continue;
                }
                dependencies.push((owner, param));
            }
        }
        dependencies
    }

    fn check_duplicates(&self, snapshot: &RegistrySnapshot, issues: &mut Vec<ValidationIssue>) {
        let mut order: Vec<(TypeKey, Option<ServiceKey>)> = Vec::new();
        let mut groups: HashMap<(TypeKey, Option<ServiceKey>), Vec<&Binding>> = HashMap::new();

        for binding in snapshot.iter() {
            // Several bindings of a collection service are the point of it.
            if matches!(self.universe.category(&binding.service), TypeCategory::Collection(_)) {
                continue;
            }
            let identity = (binding.service.clone(), self.effective_key(binding.key.as_ref()).cloned());
            let group = groups.entry(identity.clone()).or_default();
            if group.is_empty() {
                order.push(identity);
            }
            group.push(binding);
        }

        for identity in order {
            let group = &groups[&identity];
            if group.len() < 2 {
                continue;
            }
            let (service, key) = identity;
            let last = group[group.len() - 1];
            let keyed = key.as_ref().map(|k| format!(" (key '{}')", k)).unwrap_or_default();
            issues.push(ValidationIssue {
                message: format!(
                    "Duplicate service registration detected for '{}'{}: {} registrations. Only the last registration ({}) will be used at resolution time; resolve a collection of '{}' to receive all of them.",
                    service,
                    keyed,
                    group.len(),
                    last.implementation,
                    service.short_name()
                ),
                severity: ValidationSeverity::Warning,
                implementation: Some(group[0].implementation.clone()),
                service: Some(service),
                kind: IssueKind::DuplicateBinding { count: group.len() },
            });
        }
    }

    fn check_missing_dependencies(&self, snapshot: &RegistrySnapshot, issues: &mut Vec<ValidationIssue>) {
        let mut reported: HashSet<(TypeKey, Parameter)> = HashSet::new();

        for binding in snapshot.iter() {
            for (owner, param) in self.dependencies(binding) {
                if self.universe.is_exempt(&param.ty) || !self.bindings_for(snapshot, param).is_empty() {
                    continue;
                }
                if !reported.insert((owner.clone(), param.clone())) {
                    continue;
                }
                let keyed = self
                    .effective_key(param.key.as_ref())
                    .map(|k| format!(" with key '{}'", k))
                    .unwrap_or_default();
                debug!(owner = %owner, dependency = %param.ty, "missing dependency");
                issues.push(ValidationIssue {
                    message: format!(
                        "Service {} depends on {}{} which is not registered in the container.",
                        owner, param.ty, keyed
                    ),
                    severity: ValidationSeverity::Error,
                    service: Some(binding.service.clone()),
                    implementation: Some(owner.clone()),
                    kind: IssueKind::MissingDependency {
                        dependency: param.ty.clone(),
                        key: self.effective_key(param.key.as_ref()).cloned(),
                    },
                });
            }
        }
    }

    fn check_captivity(&self, snapshot: &RegistrySnapshot, issues: &mut Vec<ValidationIssue>) {
        let mut reported: HashSet<(TypeKey, Parameter, Lifetime)> = HashSet::new();

        for binding in snapshot.by_lifetime(Lifetime::Singleton) {
            for (owner, param) in self.dependencies(binding) {
                if self.universe.is_exempt(&param.ty) {
                    continue;
                }
                let dependencies = self.bindings_for(snapshot, param);
                for captured in [Lifetime::Scoped, Lifetime::Transient] {
                    if !dependencies.iter().any(|d| d.lifetime == captured) {
                        continue;
                    }
                    if !reported.insert((owner.clone(), param.clone(), captured)) {
                        continue;
                    }
                    let through = if *owner == binding.implementation {
                        String::new()
                    } else {
                        format!(" through decorator {}", owner)
                    };
                    let (severity, message) = match captured {
                        Lifetime::Scoped => (
                            ValidationSeverity::Error,
                            format!(
                                "Singleton service {}{} depends on scoped service {}. The scoped instance will be captured for the lifetime of the application.",
                                binding.implementation, through, param.ty
                            ),
                        ),
                        _ => (
                            ValidationSeverity::Warning,
                            format!(
                                "Singleton service {}{} depends on transient service {}. The transient instance will be held for the lifetime of the application.",
                                binding.implementation, through, param.ty
                            ),
                        ),
                    };
                    issues.push(ValidationIssue {
                        message,
                        severity,
                        service: Some(binding.service.clone()),
                        implementation: Some(owner.clone()),
                        kind: IssueKind::Captivity { dependency: param.ty.clone(), lifetime: captured },
                    });
                }
            }
        }
    }

    fn check_cycles(&self, snapshot: &RegistrySnapshot, issues: &mut Vec<ValidationIssue>) {
        let graph = self.dependency_graph(snapshot);
        for path in graph.cycles() {
            let rendered = path.iter().map(TypeKey::name).collect::<Vec<_>>().join(" -> ");
            let service = snapshot
                .iter()
                .find(|b| Some(&b.implementation) == path.first())
                .map(|b| b.service.clone());
            issues.push(ValidationIssue {
                message: format!("Dependency cycle detected: {}", rendered),
                severity: ValidationSeverity::Error,
                service,
                implementation: path.first().cloned(),
                kind: IssueKind::Cycle { path },
            });
        }
    }

    /// Builds the implementation dependency graph of `snapshot`.
    pub fn dependency_graph(&self, snapshot: &RegistrySnapshot) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        let mut index: HashMap<TypeKey, usize> = HashMap::new();

        for binding in snapshot.iter() {
            match index.get(&binding.implementation) {
                Some(&at) => {
                    let services = &mut graph.nodes[at].services;
                    if !services.contains(&binding.service) {
                        services.push(binding.service.clone());
                    }
                }
                None => {
                    index.insert(binding.implementation.clone(), graph.nodes.len());
                    graph.nodes.push(GraphNode {
                        implementation: binding.implementation.clone(),
                        services: vec![binding.service.clone()],
                        lifetime: binding.lifetime,
                    });
                }
            }
        }

        for binding in snapshot.iter() {
            let from = index[&binding.implementation];
            for (_, param) in self.dependencies(binding) {
                if self.universe.is_exempt(&param.ty) {
                    continue;
                }
                let target = self
                    .bindings_for(snapshot, param)
                    .last()
                    .and_then(|b| index.get(&b.implementation))
                    .or_else(|| index.get(&param.ty));
                let Some(&to) = target else {
                    continue;
                };
                let edge = GraphEdge { from, to, parameter: param.ty.clone(), key: param.key.clone() };
                if !graph.edges.contains(&edge) {
                    graph.edges.push(edge);
                }
            }
        }

        graph
    }
}
