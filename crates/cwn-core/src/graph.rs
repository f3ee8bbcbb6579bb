//! Graph data model: node/edge records and the assembled plan graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The type of a node, derived from document structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    Action,
    /// An indicator without a level.
    Indicator,
    /// An indicator refined by its level, e.g. `indicator_STRATEGIC`.
    IndicatorLevel(String),
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action => f.write_str("action"),
            Self::Indicator => f.write_str("indicator"),
            Self::IndicatorLevel(level) => write!(f, "indicator_{}", level),
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "action" => Self::Action,
            "indicator" => Self::Indicator,
            other => match other.strip_prefix("indicator_") {
                Some(level) => Self::IndicatorLevel(level.to_string()),
                None => return Err(serde::de::Error::custom(format!("unknown node type {s}"))),
            },
        })
    }
}

/// One action or indicator extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub node_type: NodeType,
    /// Copied document fields plus the rendered node type under the
    /// configured type key.
    pub attributes: BTreeMap<String, Value>,
}

/// A directed link between two node IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: None,
        }
    }

    pub fn weighted(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..Self::new(source, target)
        }
    }
}

/// A node of the assembled graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub attributes: BTreeMap<String, Value>,
}

impl GraphNode {
    /// The node type as stored under `type_key`, if any.
    pub fn node_type<'a>(&'a self, type_key: &str) -> Option<&'a str> {
        self.attributes.get(type_key).and_then(Value::as_str)
    }
}

/// A directed edge of the assembled graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Directed simple graph of one municipality (or merged set of tags).
///
/// Nodes keep insertion order. A repeated `(source, target)` pair is stored
/// once; a later weight replaces the earlier one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanGraph {
    pub label: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Node ID → position in `nodes`.
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    /// (source, target) → position in `edges`.
    #[serde(skip)]
    edge_index: HashMap<(String, String), usize>,
}

impl PlanGraph {
    /// Create an empty graph with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Build a graph from extracted records.
    ///
    /// All node IDs are added first so isolated nodes survive, then edges
    /// (an edge may reference an ID no record declares; that node is created
    /// bare), then attributes record by record. A later record for the same ID
    /// overwrites earlier attribute values.
    pub fn assemble(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Self {
        let mut graph = Self::default();
        for record in nodes {
            graph.add_node(&record.id);
        }
        for edge in edges {
            graph.add_edge(&edge.source, &edge.target, edge.weight);
        }
        for record in nodes {
            if let Some(node) = graph.node_mut(&record.id) {
                for (key, value) in &record.attributes {
                    node.attributes.insert(key.clone(), value.clone());
                }
            }
        }
        graph
    }

    /// Same as [`PlanGraph::assemble`], labelled.
    pub fn assemble_labeled(
        label: impl Into<String>,
        nodes: &[NodeRecord],
        edges: &[EdgeRecord],
    ) -> Self {
        let mut graph = Self::assemble(nodes, edges);
        graph.label = label.into();
        graph
    }

    /// Add a node if absent. Returns its position.
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&i) = self.node_index.get(id) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(GraphNode {
            id: id.to_string(),
            attributes: BTreeMap::new(),
        });
        self.node_index.insert(id.to_string(), i);
        i
    }

    /// Add a directed edge, creating missing endpoints.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: Option<f64>) {
        self.add_node(source);
        self.add_node(target);
        let key = (source.to_string(), target.to_string());
        if let Some(&i) = self.edge_index.get(&key) {
            if weight.is_some() {
                self.edges[i].weight = weight;
            }
            return;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            weight,
        });
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.node_index.get(id).map(|&i| &mut self.nodes[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edge_index
            .contains_key(&(source.to_string(), target.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// In-degree plus out-degree of every node, keyed by node ID.
    /// A self-loop counts twice.
    pub fn degrees(&self) -> HashMap<&str, usize> {
        let mut degrees: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        for edge in &self.edges {
            *degrees.entry(edge.source.as_str()).or_insert(0) += 1;
            *degrees.entry(edge.target.as_str()).or_insert(0) += 1;
        }
        degrees
    }

    /// Iterate nodes whose type attribute equals `node_type`.
    pub fn nodes_of_type<'a>(
        &'a self,
        node_type: &'a str,
        type_key: &'a str,
    ) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.node_type(type_key) == Some(node_type))
    }

    /// Rebuild the lookup indexes. Call after deserializing or after editing
    /// `nodes`/`edges` directly.
    pub fn rebuild_index(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.edge_index = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.source.clone(), e.target.clone()), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_display() {
        assert_eq!(NodeType::Action.to_string(), "action");
        assert_eq!(NodeType::Indicator.to_string(), "indicator");
        assert_eq!(
            NodeType::IndicatorLevel("TACTICAL".to_string()).to_string(),
            "indicator_TACTICAL"
        );
    }

    #[test]
    fn test_node_type_serde() {
        let json = serde_json::to_string(&NodeType::IndicatorLevel("STRATEGIC".into())).unwrap();
        assert_eq!(json, "\"indicator_STRATEGIC\"");
        let back: NodeType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeType::IndicatorLevel("STRATEGIC".into()));
        assert!(serde_json::from_str::<NodeType>("\"policy\"").is_err());
    }

    #[test]
    fn test_duplicate_edge_stored_once() {
        let mut graph = PlanGraph::new("x");
        graph.add_edge("a", "b", None);
        graph.add_edge("a", "b", Some(2.0));
        graph.add_edge("b", "a", None);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges[0].weight, Some(2.0));
    }

    #[test]
    fn test_self_loop_counts_twice() {
        let mut graph = PlanGraph::new("x");
        graph.add_edge("a", "a", None);
        assert_eq!(graph.degrees()["a"], 2);
    }
}
