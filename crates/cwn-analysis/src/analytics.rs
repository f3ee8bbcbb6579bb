//! Per-graph statistics: degree distributions, type counts, density.

use crate::binning::{Distribution, linear_distribution};
use crate::error::AnalysisError;
use cwn_core::graph::PlanGraph;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Canonical key of an unordered type pair, in declaration order.
pub fn type_pair_key(first: &str, second: &str) -> String {
    format!("{}-{}", first, second)
}

/// Node and edge counts per declared type and unordered type pair.
///
/// Keys are the declared types followed by every pair `A-B` with `A` declared
/// no later than `B` (self pairs included), all starting at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCount {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl TypeCount {
    /// All buckets for `types`, zeroed.
    pub fn zeroed<S: AsRef<str>>(types: &[S]) -> Self {
        let mut keys: Vec<String> = types.iter().map(|t| t.as_ref().to_string()).collect();
        for (i, first) in types.iter().enumerate() {
            for second in &types[i..] {
                keys.push(type_pair_key(first.as_ref(), second.as_ref()));
            }
        }
        let index = keys.iter().enumerate().map(|(i, k)| (k.clone(), i)).collect();
        Self {
            entries: keys.into_iter().map(|k| (k, 0)).collect(),
            index,
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Buckets in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn increment(&mut self, key: &str) -> bool {
        match self.index.get(key) {
            Some(&i) => {
                self.entries[i].1 += 1;
                true
            }
            None => false,
        }
    }
}

impl Serialize for TypeCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

fn node_type_of<'a>(
    graph: &'a PlanGraph,
    id: &str,
    type_key: &str,
) -> Result<&'a str, AnalysisError> {
    graph
        .node(id)
        .and_then(|n| n.node_type(type_key))
        .ok_or_else(|| AnalysisError::UnknownType {
            key: format!("<node {} has no {} attribute>", id, type_key),
        })
}

/// Count nodes per type and edges per unordered type pair.
///
/// Fails with [`AnalysisError::UnknownType`] on the first node whose type is
/// missing or undeclared, or the first edge whose type pair has no bucket.
pub fn count_types<S: AsRef<str>>(
    graph: &PlanGraph,
    types: &[S],
    type_key: &str,
) -> Result<TypeCount, AnalysisError> {
    let mut count = TypeCount::zeroed(types);
    let declared = |t: &str| types.iter().any(|d| d.as_ref() == t);

    for node in &graph.nodes {
        let node_type = node_type_of(graph, &node.id, type_key)?;
        if !declared(node_type) {
            return Err(AnalysisError::UnknownType {
                key: node_type.to_string(),
            });
        }
        count.increment(node_type);
    }

    for edge in &graph.edges {
        let source_type = node_type_of(graph, &edge.source, type_key)?;
        let target_type = node_type_of(graph, &edge.target, type_key)?;
        let forward = type_pair_key(source_type, target_type);
        if !count.increment(&forward)
            && !count.increment(&type_pair_key(target_type, source_type))
        {
            return Err(AnalysisError::UnknownType { key: forward });
        }
    }

    Ok(count)
}

/// Degree distribution of each declared type, in `types` order.
///
/// Degree is in-degree plus out-degree. A type with no nodes yields the empty
/// distribution. Nodes without a type attribute belong to no type.
pub fn degree_distribution<S: AsRef<str>>(
    graph: &PlanGraph,
    types: &[S],
    type_key: &str,
    nbins: usize,
) -> Result<Vec<Distribution>, AnalysisError> {
    if nbins == 0 {
        return Err(AnalysisError::InvalidBinCount);
    }
    let degrees = graph.degrees();
    types
        .iter()
        .map(|node_type| {
            let data: Vec<f64> = graph
                .nodes_of_type(node_type.as_ref(), type_key)
                .map(|n| degrees.get(n.id.as_str()).copied().unwrap_or(0) as f64)
                .collect();
            linear_distribution(&data, nbins)
        })
        .collect()
}

fn directed_density(edges: usize, nodes: usize) -> f64 {
    if nodes < 2 {
        return 0.0;
    }
    edges as f64 / (nodes as f64 * (nodes - 1) as f64)
}

/// Directed density `|E| / (|V| (|V| - 1))`; 0 for fewer than two nodes.
pub fn density(graph: &PlanGraph) -> f64 {
    directed_density(graph.edge_count(), graph.node_count())
}

/// Density of the subgraph induced by nodes with at least one edge.
pub fn density_without_isolated(graph: &PlanGraph) -> f64 {
    let linked = graph.degrees().values().filter(|&&d| d > 0).count();
    // Every edge has both endpoints among the linked nodes.
    directed_density(graph.edge_count(), linked)
}
