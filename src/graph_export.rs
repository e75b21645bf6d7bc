//! Dependency graph export for visualization.
//!
//! Turns the validator's implementation graph into JSON, DOT (Graphviz),
//! Mermaid or, with the `graph-export` feature, YAML.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{ConfigurationError, RegistrarResult};
use crate::registrar::Composition;
use crate::validation::DependencyGraph;

/// A node of the exported graph: one implementation.
#[derive(Debug, Clone, Serialize)]
pub struct ExportNode {
    /// Unique identifier for this node
    pub id: String,
    pub type_name: String,
    pub short_name: String,
    pub lifetime: String,
    /// Services the implementation answers for
    pub services: Vec<String>,
    /// Decorators, outermost first
    pub decorators: Vec<String>,
}

/// A constructor dependency between two nodes.
#[derive(Debug, Clone, Serialize)]
pub struct ExportEdge {
    pub from: String,
    pub to: String,
    pub parameter: String,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub cycle_count: usize,
    /// Export timestamp, RFC 3339
    pub exported_at: Option<String>,
}

/// Serializable form of a composition's dependency graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphDocument {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
    pub metadata: ExportMetadata,
}

/// Graph export configuration options.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_decorators: bool,
    /// Keep only nodes with these short names (empty = all)
    pub type_filter: HashSet<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { include_decorators: true, type_filter: HashSet::new() }
    }
}

/// Export formats supported for dependency graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format for web UIs and APIs
    Json,
    /// YAML format, requires the `graph-export` feature
    Yaml,
    /// DOT format for Graphviz visualization
    Dot,
    /// Mermaid format for documentation
    Mermaid,
}

/// Graph exporter for generating dependency visualizations.
pub trait GraphExporter {
    fn export(&self, graph: &GraphDocument, format: ExportFormat) -> RegistrarResult<String>;
}

/// Supports JSON, YAML, DOT and Mermaid.
#[derive(Debug, Default)]
pub struct DefaultGraphExporter;

impl GraphExporter for DefaultGraphExporter {
    fn export(&self, graph: &GraphDocument, format: ExportFormat) -> RegistrarResult<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(graph)?),
            ExportFormat::Yaml => self.export_yaml(graph),
            ExportFormat::Dot => Ok(self.export_dot(graph)),
            ExportFormat::Mermaid => Ok(self.export_mermaid(graph)),
        }
    }
}

impl DefaultGraphExporter {
    fn export_yaml(&self, graph: &GraphDocument) -> RegistrarResult<String> {
        #[cfg(feature = "graph-export")]
        {
            serde_yaml::to_string(graph)
                .map_err(|e| ConfigurationError::invalid_settings(format!("YAML serialization failed: {}", e)))
        }
        #[cfg(not(feature = "graph-export"))]
        {
            let _ = graph;
            Err(ConfigurationError::invalid_settings("YAML export requires the graph-export feature"))
        }
    }

    fn export_dot(&self, graph: &GraphDocument) -> String {
        let mut output = String::new();
        output.push_str("digraph DependencyGraph {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in &graph.nodes {
            let color = match node.lifetime.as_str() {
                "Singleton" => "lightblue",
                "Scoped" => "lightgreen",
                _ => "lightyellow",
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n({})\", fillcolor={}, style=filled];\n",
                node.id,
                escape_dot(&node.short_name),
                node.lifetime,
                color
            ));
        }

        output.push('\n');

        for edge in &graph.edges {
            let style = if edge.key.is_some() { "dashed" } else { "solid" };
            output.push_str(&format!("  \"{}\" -> \"{}\" [style={}];\n", edge.from, edge.to, style));
        }

        output.push_str("}\n");
        output
    }

    fn export_mermaid(&self, graph: &GraphDocument) -> String {
        let mut output = String::new();
        output.push_str("graph TD\n");

        for node in &graph.nodes {
            output.push_str(&format!("  {}[\"{}\"]\n", node.id, node.short_name.replace('"', "'")));
        }

        for edge in &graph.edges {
            let arrow = if edge.key.is_some() { "-.->" } else { "-->" };
            output.push_str(&format!("  {} {} {}\n", edge.from, arrow, edge.to));
        }

        output.push_str("\n  classDef singleton fill:#e1f5fe\n");
        output.push_str("  classDef scoped fill:#e8f5e8\n");
        output.push_str("  classDef transient fill:#fff3e0\n");

        for node in &graph.nodes {
            output.push_str(&format!("  class {} {}\n", node.id, node.lifetime.to_lowercase()));
        }

        output
    }
}

fn escape_dot(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Builds the exportable graph of a composition.
pub fn build_document(composition: &Composition, options: &ExportOptions) -> GraphDocument {
    let graph: DependencyGraph = composition.dependency_graph();
    let keep: Vec<bool> = graph
        .nodes
        .iter()
        .map(|n| options.type_filter.is_empty() || options.type_filter.contains(n.implementation.short_name()))
        .collect();

    let nodes = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(i, node)| {
            let decorators = if options.include_decorators {
                composition
                    .registry()
                    .iter()
                    .find(|b| b.implementation == node.implementation)
                    .map(|b| b.decorators_by_order().iter().map(|d| d.decorator.to_string()).collect())
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            ExportNode {
                id: node_id(i),
                type_name: node.implementation.to_string(),
                short_name: node.implementation.short_name().to_string(),
                lifetime: node.lifetime.to_string(),
                services: node.services.iter().map(ToString::to_string).collect(),
                decorators,
            }
        })
        .collect::<Vec<_>>();

    let edges = graph
        .edges
        .iter()
        .filter(|e| keep[e.from] && keep[e.to])
        .map(|e| ExportEdge {
            from: node_id(e.from),
            to: node_id(e.to),
            parameter: e.parameter.to_string(),
            key: e.key.as_ref().map(ToString::to_string),
        })
        .collect::<Vec<_>>();

    GraphDocument {
        metadata: ExportMetadata {
            node_count: nodes.len(),
            edge_count: edges.len(),
            cycle_count: graph.cycles().len(),
            exported_at: exported_at(),
        },
        nodes,
        edges,
    }
}

fn node_id(index: usize) -> String {
    format!("n{}", index)
}

#[cfg(feature = "graph-export")]
fn exported_at() -> Option<String> {
    Some(chrono::Utc::now().to_rfc3339())
}

#[cfg(not(feature = "graph-export"))]
fn exported_at() -> Option<String> {
    None
}

/// Convenience exports with default options.
pub mod exports {
    use super::*;

    pub fn to_json(composition: &Composition) -> RegistrarResult<String> {
        export(composition, ExportFormat::Json)
    }

    pub fn to_yaml(composition: &Composition) -> RegistrarResult<String> {
        export(composition, ExportFormat::Yaml)
    }

    pub fn to_dot(composition: &Composition) -> RegistrarResult<String> {
        export(composition, ExportFormat::Dot)
    }

    pub fn to_mermaid(composition: &Composition) -> RegistrarResult<String> {
        export(composition, ExportFormat::Mermaid)
    }

    pub fn export(composition: &Composition, format: ExportFormat) -> RegistrarResult<String> {
        let document = build_document(composition, &ExportOptions::default());
        DefaultGraphExporter.export(&document, format)
    }
}
