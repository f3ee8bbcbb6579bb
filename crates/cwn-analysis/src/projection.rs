//! Projection of a plan graph onto one node type.
//!
//! Two spanning nodes are linked when an undirected path joins them whose
//! interior nodes are all of other types. Non-spanning nodes are grouped into
//! connected components (edges taken undirected); spanning nodes that touch a
//! common component, or are adjacent, become neighbours.

use crate::analytics::density;
use cwn_core::graph::PlanGraph;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Disjoint-set forest over node positions.
struct Components {
    parent: Vec<usize>,
}

impl Components {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Build the projection graph of `graph` onto `spanning_type`.
///
/// Every spanning node is kept with its attributes. Links are stored in both
/// directions; the weight counts distinct bridges (shared components, plus
/// one for a direct link). The result is labelled `<label>_<spanning_type>`.
pub fn projection(graph: &PlanGraph, spanning_type: &str, type_key: &str) -> PlanGraph {
    let position: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let spanning: Vec<bool> = graph
        .nodes
        .iter()
        .map(|n| n.node_type(type_key) == Some(spanning_type))
        .collect();

    let mut components = Components::new(graph.nodes.len());
    let mut direct: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut touches: Vec<(usize, usize)> = Vec::new();

    for edge in &graph.edges {
        let (Some(&s), Some(&t)) = (
            position.get(edge.source.as_str()),
            position.get(edge.target.as_str()),
        ) else {
            continue;
        };
        match (spanning[s], spanning[t]) {
            (true, true) if s != t => {
                direct.insert((s.min(t), s.max(t)));
            }
            (true, true) => {}
            (false, false) => components.union(s, t),
            (true, false) => touches.push((s, t)),
            (false, true) => touches.push((t, s)),
        }
    }

    // Component root -> spanning nodes touching it.
    let mut members: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (span, other) in touches {
        let root = components.find(other);
        members.entry(root).or_default().insert(span);
    }

    let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for nodes in members.values() {
        let nodes: Vec<usize> = nodes.iter().copied().collect();
        for (i, &u) in nodes.iter().enumerate() {
            for &v in &nodes[i + 1..] {
                *weights.entry((u, v)).or_insert(0.0) += 1.0;
            }
        }
    }
    for pair in direct {
        *weights.entry(pair).or_insert(0.0) += 1.0;
    }

    let mut projected = PlanGraph::new(format!("{}_{}", graph.label, spanning_type));
    for (i, node) in graph.nodes.iter().enumerate() {
        if spanning[i] {
            projected.add_node(&node.id);
            if let Some(target) = projected.node_mut(&node.id) {
                target.attributes.clone_from(&node.attributes);
            }
        }
    }
    for (&(u, v), &weight) in &weights {
        let (a, b) = (&graph.nodes[u].id, &graph.nodes[v].id);
        projected.add_edge(a, b, Some(weight));
        projected.add_edge(b, a, Some(weight));
    }

    debug!(
        label = %projected.label,
        nodes = projected.node_count(),
        links = weights.len(),
        "projection built"
    );
    projected
}

/// Directed density of the projection onto `spanning_type`.
pub fn projection_density(graph: &PlanGraph, spanning_type: &str, type_key: &str) -> f64 {
    density(&projection(graph, spanning_type, type_key))
}
