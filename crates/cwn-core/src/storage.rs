//! Read/write assembled graphs.
//!
//! Two formats: a weighted edge list (`<label>.edg`, one `source target weight`
//! line per edge) that drops node attributes, and a versioned JSON snapshot
//! that keeps them.

use crate::graph::PlanGraph;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: &str = "1.0.0";
const EDGE_LIST_EXT: &str = "edg";

#[derive(Deserialize)]
struct Snapshot {
    version: String,
    graph: PlanGraph,
}

/// Path of the edge-list file for a graph label.
pub fn edge_list_path(save_dir: &Path, label: &str) -> PathBuf {
    save_dir.join(format!("{}.{}", label, EDGE_LIST_EXT))
}

/// Render the edge list. Edges without a weight are written with weight 1.
pub fn to_edge_list(graph: &PlanGraph) -> String {
    let mut out = String::new();
    for edge in &graph.edges {
        let _ = writeln!(
            out,
            "{} {} {}",
            edge.source,
            edge.target,
            edge.weight.unwrap_or(1.0)
        );
    }
    out
}

/// Parse an edge list. Node attributes (including node types) are not part of
/// the format and come back empty.
pub fn from_edge_list(label: &str, content: &str) -> Result<PlanGraph> {
    let mut graph = PlanGraph::new(label);
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (source, target, weight) = match fields.as_slice() {
            [s, t] => (*s, *t, None),
            [s, t, w] => {
                let weight: f64 = w
                    .parse()
                    .with_context(|| format!("line {}: invalid weight {:?}", lineno + 1, w))?;
                (*s, *t, Some(weight))
            }
            _ => anyhow::bail!("line {}: expected `source target [weight]`", lineno + 1),
        };
        graph.add_edge(source, target, weight);
    }
    Ok(graph)
}

/// Write `<save_dir>/<label>.edg`, creating the directory if needed.
pub fn save_edge_list(save_dir: &Path, graph: &PlanGraph) -> Result<PathBuf> {
    fs::create_dir_all(save_dir)
        .with_context(|| format!("failed to create directory {}", save_dir.display()))?;
    let path = edge_list_path(save_dir, &graph.label);
    fs::write(&path, to_edge_list(graph))
        .with_context(|| format!("failed to write edge list to {}", path.display()))?;
    Ok(path)
}

/// Load `<save_dir>/<label>.edg`.
pub fn load_edge_list(save_dir: &Path, label: &str) -> Result<PlanGraph> {
    let path = edge_list_path(save_dir, label);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read edge list from {}", path.display()))?;
    from_edge_list(label, &content)
}

/// Serialize a graph snapshot to pretty-printed JSON.
pub fn to_json(graph: &PlanGraph) -> Result<String> {
    #[derive(Serialize)]
    struct SnapshotRef<'a> {
        version: &'a str,
        graph: &'a PlanGraph,
    }
    serde_json::to_string_pretty(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        graph,
    })
    .context("failed to serialize graph to JSON")
}

/// Deserialize a graph snapshot, checking its version and rebuilding indexes.
pub fn from_json(json: &str) -> Result<PlanGraph> {
    let snapshot: Snapshot =
        serde_json::from_str(json).context("failed to deserialize graph from JSON")?;
    if snapshot.version != SNAPSHOT_VERSION {
        anyhow::bail!(
            "graph snapshot version mismatch: expected {}, found {}",
            SNAPSHOT_VERSION,
            snapshot.version
        );
    }
    let mut graph = snapshot.graph;
    graph.rebuild_index();
    Ok(graph)
}

/// Write `<save_dir>/<label>.json`.
pub fn save_json(save_dir: &Path, graph: &PlanGraph) -> Result<PathBuf> {
    fs::create_dir_all(save_dir)
        .with_context(|| format!("failed to create directory {}", save_dir.display()))?;
    let path = save_dir.join(format!("{}.json", graph.label));
    fs::write(&path, to_json(graph)?)
        .with_context(|| format!("failed to write graph to {}", path.display()))?;
    Ok(path)
}

/// Load a JSON snapshot from a file.
pub fn load_json(path: &Path) -> Result<PlanGraph> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph from {}", path.display()))?;
    from_json(&json)
}
