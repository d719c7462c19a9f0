//! Portfolio graph types.
//!
//! The graph is read-only input to the snapshot builder: nodes are portfolio
//! entities (projects, skills, values, experience, education) and edges are
//! weighted relations between them. Lookups use BTree collections so every
//! traversal is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for a portfolio graph node.
///
/// Wraps the node's string id and implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of a portfolio node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A project or case study.
    Project,
    /// A skill or technology.
    Skill,
    /// A personal value.
    Value,
    /// A work experience entry.
    Experience,
    /// An education entry.
    Education,
}

impl NodeKind {
    /// Parse kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "project" => Some(Self::Project),
            "skill" => Some(Self::Skill),
            "value" => Some(Self::Value),
            "experience" => Some(Self::Experience),
            "education" => Some(Self::Education),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Skill => write!(f, "skill"),
            Self::Value => write!(f, "value"),
            Self::Experience => write!(f, "experience"),
            Self::Education => write!(f, "education"),
        }
    }
}

/// Time period covered by a node (experience, education, project).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Starting year.
    pub start_year: i32,
    /// Ending year; `None` means ongoing.
    pub end_year: Option<i32>,
}

impl Period {
    /// Create a closed period.
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year: Some(end_year),
        }
    }

    /// Create an ongoing period.
    pub fn ongoing(start_year: i32) -> Self {
        Self {
            start_year,
            end_year: None,
        }
    }
}

/// A node in the portfolio graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Node kind.
    pub kind: NodeKind,
    /// Short description shown on cards and the résumé.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Time period, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    /// Proficiency level [0, 1], for skills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f32>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Node {
    /// Create a new node with just the required fields.
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            summary: None,
            period: None,
            level: None,
            tags: Vec::new(),
        }
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the period.
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Set the proficiency level.
    pub fn with_level(mut self, level: f32) -> Self {
        self.level = Some(level.clamp(0.0, 1.0));
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A weighted, undirected relation between two portfolio nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Relation strength [0, 1].
    pub weight: f32,
}

impl GraphEdge {
    /// Create a new edge.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, weight: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: weight.clamp(0.0, 1.0),
        }
    }
}

/// The portfolio graph: read-only input to the snapshot builder.
///
/// Uses BTreeMap/BTreeSet so node iteration and neighbor queries are
/// deterministic, which keeps derived snapshots deeply equal across calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphData")]
pub struct PortfolioGraph {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<GraphEdge>,
    #[serde(skip)]
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

/// Wire shape of the graph; the adjacency index is rebuilt on load.
#[derive(Deserialize)]
struct GraphData {
    #[serde(default)]
    nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

impl From<GraphData> for PortfolioGraph {
    fn from(data: GraphData) -> Self {
        let mut graph = Self {
            nodes: data.nodes,
            edges: Vec::new(),
            adjacency: BTreeMap::new(),
        };
        for edge in data.edges {
            graph.add_edge(edge);
        }
        graph
    }
}

impl PortfolioGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Add an edge to the graph, updating the adjacency index.
    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.adjacency
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone());
        self.adjacency
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        self.edges.push(edge);
    }

    /// Fetch a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether the graph contains a node.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// All nodes of a given kind, ordered by id.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.kind == kind).collect()
    }

    /// Neighbor ids of a node, ordered by id.
    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Weight of the edge between two nodes, if one exists.
    pub fn edge_weight(&self, a: &NodeId, b: &NodeId) -> Option<f32> {
        self.edges
            .iter()
            .find(|e| {
                (&e.source == a && &e.target == b) || (&e.source == b && &e.target == a)
            })
            .map(|e| e.weight)
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}
