use cwn_core::graph::*;
use cwn_core::storage;
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn make_graph() -> PlanGraph {
    let mut attributes = BTreeMap::new();
    attributes.insert("node_type".to_string(), json!("action"));
    attributes.insert("name".to_string(), json!("Bike lanes"));
    let nodes = vec![
        NodeRecord {
            id: "a1".to_string(),
            node_type: NodeType::Action,
            attributes,
        },
        NodeRecord {
            id: "lonely".to_string(),
            node_type: NodeType::Action,
            attributes: BTreeMap::new(),
        },
    ];
    let edges = vec![
        EdgeRecord::new("a1", "i1"),
        EdgeRecord::weighted("i1", "i2", 3.0),
    ];
    PlanGraph::assemble_labeled("espoo", &nodes, &edges)
}

#[test]
fn test_edge_list_roundtrip_drops_attributes() {
    let tmp = TempDir::new().unwrap();
    let graph = make_graph();

    let path = storage::save_edge_list(tmp.path(), &graph).unwrap();
    assert_eq!(path, storage::edge_list_path(tmp.path(), "espoo"));

    let loaded = storage::load_edge_list(tmp.path(), "espoo").unwrap();
    assert_eq!(loaded.edge_count(), 2);
    assert!(loaded.has_edge("a1", "i1"));
    assert_eq!(loaded.edges[1].weight, Some(3.0));
    // Isolated nodes and attributes are not part of the edge list.
    assert!(!loaded.contains_node("lonely"));
    assert!(loaded.node("a1").unwrap().attributes.is_empty());
}

#[test]
fn test_json_roundtrip_keeps_attributes() {
    let tmp = TempDir::new().unwrap();
    let graph = make_graph();

    let path = storage::save_json(tmp.path(), &graph).unwrap();
    let loaded = storage::load_json(&path).unwrap();

    assert_eq!(loaded.label, "espoo");
    assert_eq!(loaded.node_count(), graph.node_count());
    assert!(loaded.contains_node("lonely"));
    assert_eq!(
        loaded.node("a1").unwrap().attributes["name"],
        json!("Bike lanes")
    );
    assert!(loaded.has_edge("i1", "i2"));
}

#[test]
fn test_load_edge_list_missing_file() {
    let tmp = TempDir::new().unwrap();
    assert!(storage::load_edge_list(tmp.path(), "nowhere").is_err());
}
