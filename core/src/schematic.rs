use crate::step::{Mode, StepSpec};
use serde::{Deserialize, Serialize};

/// The static view of a composition.
///
/// `Schematic` is the graph extracted from a combinator. It is used for
/// visualization and documentation; it never drives execution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Schematic {
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Schematic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a node for `spec`, returning its id.
    ///
    /// A spec produced by a combinator carries its own schematic, which is
    /// nested under the node.
    pub fn add_step(&mut self, kind: NodeKind, spec: &StepSpec) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.nodes.push(Node {
            id: id.clone(),
            kind,
            label: spec.label().to_string(),
            mode: spec.mode(),
            inner: spec.schematic().cloned().map(Box::new),
        });
        id
    }

    pub fn connect(&mut self, from: &str, to: &str, kind: EdgeType) {
        let label = match &kind {
            EdgeType::Linear => Some("Next".to_string()),
            EdgeType::Branch(key) => Some(format!("Branch:{key}")),
            EdgeType::Loop => Some("Repeat".to_string()),
        };
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            label,
        });
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<Schematic>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A step in a chain.
    Link,
    /// The step whose result picks a dispatcher option.
    Root,
    /// A dispatcher option.
    Option,
    /// The step that decides whether a loop continues.
    Predicate,
    /// The step a loop repeats.
    Body,
    /// A join member.
    Branch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeType {
    Linear,
    Branch(String),
    Loop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeType,
    pub label: Option<String>,
}
