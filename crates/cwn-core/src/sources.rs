//! Loading source documents and merging multi-source tags.
//!
//! A municipality tag such as `tampere-ilmasto+tampere-lumo` names several
//! plans that are analysed as one network. Each source is extracted on its
//! own; node and edge records are concatenated in source order. Node IDs are
//! not reconciled across sources, so a colliding ID keeps the attributes of
//! the last source.

use crate::config::{DataConfig, SchemaConfig};
use crate::error::ExtractError;
use crate::extract::{Extraction, extract};
use crate::graph::PlanGraph;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Path of the document for a single (non-merged) source tag.
pub fn document_path(data_folder: &Path, source_tag: &str) -> PathBuf {
    data_folder.join(format!("{}.json", source_tag))
}

/// Read and parse one JSON document.
pub fn load_document(path: &Path) -> Result<Value, ExtractError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ExtractError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Split a municipality tag into its source tags.
pub fn split_tag<'a>(tag: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    tag.split(delimiter).map(str::trim).filter(|s| !s.is_empty())
}

/// Concatenate extractions and join their labels with `+`.
///
/// Labels are deduplicated, keeping the first occurrence; empty labels are
/// dropped.
pub fn merge_extractions(parts: impl IntoIterator<Item = Extraction>) -> Extraction {
    let mut merged = Extraction::default();
    let mut labels: Vec<String> = Vec::new();
    for part in parts {
        merged.nodes.extend(part.nodes);
        merged.edges.extend(part.edges);
        if !part.label.is_empty() && !labels.contains(&part.label) {
            labels.push(part.label);
        }
    }
    merged.label = labels.join("+");
    merged
}

/// Extract every source of `tag` from `data.data_folder` and merge the results.
pub fn extract_tag(
    tag: &str,
    data: &DataConfig,
    schema: &SchemaConfig,
) -> Result<Extraction, ExtractError> {
    let mut parts = Vec::new();
    for source in split_tag(tag, &data.tag_delimiter) {
        let path = document_path(&data.data_folder, source);
        info!(source, path = %path.display(), "extracting source");
        let document = load_document(&path)?;
        parts.push(extract(&document, schema)?);
    }
    if parts.is_empty() {
        return Err(ExtractError::MalformedDocument(format!(
            "tag {:?} names no sources",
            tag
        )));
    }
    Ok(merge_extractions(parts))
}

/// Extract, merge and assemble the graph of one municipality tag.
pub fn build_graph(
    tag: &str,
    data: &DataConfig,
    schema: &SchemaConfig,
) -> Result<PlanGraph, ExtractError> {
    let extraction = extract_tag(tag, data, schema)?;
    let graph = PlanGraph::assemble_labeled(extraction.label, &extraction.nodes, &extraction.edges);
    info!(
        tag,
        label = %graph.label,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph assembled"
    );
    Ok(graph)
}
