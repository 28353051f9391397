//! Workflow graph: stage nodes plus the slot-to-slot bindings between them.
//!
//! A `WorkflowDefinition` is a plain value. Building one performs no I/O and
//! registers nothing with an execution engine; the engine receives the finished
//! graph (directly, as JSON, or as DOT) and owns scheduling from there.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stages::StageKind;
use crate::{DwiprepError, Result};

/// Id of the node that exposes a graph's final results.
pub const OUTPUT_NODE: &str = "outputnode";

// ---------------------------------------------------------------------------
// Graph definition types
// ---------------------------------------------------------------------------

/// A value baked into a node at assembly time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Files(Vec<PathBuf>),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<&[PathBuf]> for ParamValue {
    fn from(v: &[PathBuf]) -> Self {
        ParamValue::Files(v.to_vec())
    }
}

/// A stage in the graph with its declared input and output slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    pub kind: StageKind,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Stage parameters (window size, thread count, ...).
    pub params: BTreeMap<String, ParamValue>,
    /// Input slots bound to a fixed value instead of an upstream output.
    pub static_inputs: BTreeMap<String, ParamValue>,
}

impl WorkflowNode {
    /// Create a node whose slots follow the schema of `kind`.
    pub fn new(id: impl Into<String>, kind: StageKind) -> Self {
        Self {
            id: id.into(),
            kind,
            inputs: kind.input_slots().iter().map(|s| s.to_string()).collect(),
            outputs: kind.output_slots().iter().map(|s| s.to_string()).collect(),
            params: BTreeMap::new(),
            static_inputs: BTreeMap::new(),
        }
    }

    /// Create a pass-through node exposing `fields` as both inputs and outputs.
    pub fn identity(id: impl Into<String>, fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
        Self {
            id: id.into(),
            kind: StageKind::Identity,
            inputs: fields.clone(),
            outputs: fields,
            params: BTreeMap::new(),
            static_inputs: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn has_input(&self, slot: &str) -> bool {
        self.inputs.iter().any(|s| s == slot)
    }

    pub fn has_output(&self, slot: &str) -> bool {
        self.outputs.iter().any(|s| s == slot)
    }
}

/// One binding: `source.source_output` feeds `destination.destination_input`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub source_output: String,
    pub destination: String,
    pub destination_input: String,
}

/// A named graph of stages assembled for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub connections: Vec<Connection>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Add a node. Node ids are unique within a graph.
    pub fn add_node(&mut self, node: WorkflowNode) -> Result<()> {
        if self.node(&node.id).is_some() {
            return Err(DwiprepError::Graph(format!(
                "node '{}' already exists in workflow '{}'",
                node.id, self.name
            )));
        }
        debug!(workflow = %self.name, node = %node.id, kind = %node.kind, "adding node");
        self.nodes.push(node);
        Ok(())
    }

    /// Bind `source.source_output` to `destination.destination_input`.
    ///
    /// Each input slot receives exactly one source, either a connection or a
    /// static value.
    pub fn connect(
        &mut self,
        source: &str,
        source_output: &str,
        destination: &str,
        destination_input: &str,
    ) -> Result<()> {
        if source == destination {
            return Err(DwiprepError::Graph(format!(
                "node '{source}' cannot feed itself"
            )));
        }

        let src = self.require_node(source)?;
        if !src.has_output(source_output) {
            return Err(DwiprepError::Graph(format!(
                "node '{source}' ({}) has no output '{source_output}'",
                src.kind
            )));
        }

        self.check_input_free(destination, destination_input)?;

        self.connections.push(Connection {
            source: source.to_string(),
            source_output: source_output.to_string(),
            destination: destination.to_string(),
            destination_input: destination_input.to_string(),
        });
        Ok(())
    }

    /// Connect several `(output, input)` pairs between the same two nodes.
    pub fn connect_all(
        &mut self,
        source: &str,
        destination: &str,
        pairs: &[(&str, &str)],
    ) -> Result<()> {
        for (output, input) in pairs {
            self.connect(source, output, destination, input)?;
        }
        Ok(())
    }

    /// Bind a fixed value to an input slot.
    pub fn set_input(&mut self, node: &str, slot: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.check_input_free(node, slot)?;
        let target = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node)
            .ok_or_else(|| unknown_node(node))?;
        target.static_inputs.insert(slot.to_string(), value.into());
        Ok(())
    }

    fn require_node(&self, id: &str) -> Result<&WorkflowNode> {
        self.node(id).ok_or_else(|| unknown_node(id))
    }

    fn check_input_free(&self, node: &str, slot: &str) -> Result<()> {
        let dst = self.require_node(node)?;
        if !dst.has_input(slot) {
            return Err(DwiprepError::Graph(format!(
                "node '{node}' ({}) has no input '{slot}'",
                dst.kind
            )));
        }
        if dst.static_inputs.contains_key(slot) || self.source_of(node, slot).is_some() {
            return Err(DwiprepError::Graph(format!(
                "input '{node}.{slot}' already has a source"
            )));
        }
        Ok(())
    }
}

fn unknown_node(id: &str) -> DwiprepError {
    DwiprepError::Graph(format!("unknown node '{id}'"))
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

impl WorkflowDefinition {
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of_kind(&self, kind: StageKind) -> Vec<&WorkflowNode> {
        self.nodes.iter().filter(|n| n.kind == kind).collect()
    }

    pub fn connections_from(&self, id: &str) -> Vec<&Connection> {
        self.connections.iter().filter(|c| c.source == id).collect()
    }

    pub fn connections_into(&self, id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.destination == id)
            .collect()
    }

    /// The connection feeding `node.slot`, if any.
    pub fn source_of(&self, node: &str, slot: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.destination == node && c.destination_input == slot)
    }

    /// Output slot of `outputnode` → `(source node, source output)`.
    pub fn output_bindings(&self) -> BTreeMap<&str, (&str, &str)> {
        self.connections_into(OUTPUT_NODE)
            .into_iter()
            .map(|c| {
                (
                    c.destination_input.as_str(),
                    (c.source.as_str(), c.source_output.as_str()),
                )
            })
            .collect()
    }

    /// Check the graph is complete: one `outputnode` with every slot bound, no cycles.
    pub fn validate(&self) -> Result<()> {
        let output = self.node(OUTPUT_NODE).ok_or_else(|| {
            DwiprepError::Graph(format!("workflow '{}' has no '{OUTPUT_NODE}'", self.name))
        })?;

        let unbound: Vec<&str> = output
            .inputs
            .iter()
            .filter(|slot| self.source_of(OUTPUT_NODE, slot).is_none())
            .map(String::as_str)
            .collect();
        if !unbound.is_empty() {
            return Err(DwiprepError::Graph(format!(
                "workflow '{}' leaves output slots unbound: {}",
                self.name,
                unbound.join(", ")
            )));
        }

        self.resolve_order().map(|_| ())
    }

    /// Resolve execution order via topological sort.
    ///
    /// Returns levels where each level contains nodes that can execute in parallel.
    /// Nodes in level N+1 depend only on nodes in levels 0..N.
    pub fn resolve_order(&self) -> Result<Vec<Vec<String>>> {
        let mut in_degree: BTreeMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        let mut dependents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for c in &self.connections {
            if !in_degree.contains_key(c.source.as_str()) {
                return Err(unknown_node(&c.source));
            }
            // Several slots between the same pair count as one dependency.
            if dependents
                .entry(c.source.as_str())
                .or_default()
                .insert(c.destination.as_str())
            {
                match in_degree.get_mut(c.destination.as_str()) {
                    Some(deg) => *deg += 1,
                    None => return Err(unknown_node(&c.destination)),
                }
            }
        }

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut queue: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut processed = 0;

        while !queue.is_empty() {
            let mut next_queue: Vec<&str> = Vec::new();

            for node_id in &queue {
                processed += 1;
                if let Some(deps) = dependents.get(node_id) {
                    for dep in deps {
                        if let Some(deg) = in_degree.get_mut(dep) {
                            *deg -= 1;
                            if *deg == 0 {
                                next_queue.push(dep);
                            }
                        }
                    }
                }
            }

            levels.push(queue.iter().map(|s| s.to_string()).collect());
            next_queue.sort();
            queue = next_queue;
        }

        if processed != self.nodes.len() {
            return Err(DwiprepError::Graph(format!(
                "workflow '{}' contains a dependency cycle",
                self.name
            )));
        }

        Ok(levels)
    }

    /// Render the graph as Graphviz DOT, one edge per slot binding.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"{}\" {{", dot_escape(&self.name));
        let _ = writeln!(out, "  rankdir=TB;");
        for node in &self.nodes {
            let shape = if node.kind == StageKind::Identity {
                "ellipse"
            } else {
                "box"
            };
            let id = dot_escape(&node.id);
            let _ = writeln!(
                out,
                "  \"{id}\" [label=\"{id}\\n({})\", shape={shape}];",
                node.kind
            );
        }
        for c in &self.connections {
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\" [label=\"{} -> {}\"];",
                dot_escape(&c.source),
                dot_escape(&c.destination),
                dot_escape(&c.source_output),
                dot_escape(&c.destination_input)
            );
        }
        out.push_str("}\n");
        out
    }
}

/// Escape a value for a double-quoted DOT string.
fn dot_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
