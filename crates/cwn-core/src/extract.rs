//! Record extraction: one planning document → node and edge records.
//!
//! Links are read downwards. Each indicator lists the actions and lower-level
//! indicators contributing to it, and edge direction follows the hierarchy:
//! action → indicator, lower indicator → higher indicator.
//!
//! Action-to-action links are symmetric in the source data and are
//! deduplicated (first direction seen wins). Action→indicator and
//! indicator→indicator links are kept as they appear.

use crate::config::SchemaConfig;
use crate::error::ExtractError;
use crate::graph::{EdgeRecord, NodeRecord, NodeType};
use crate::resolve::{id_string, resolve};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Records extracted from one document (or a merged set of documents).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    /// Normalised municipality name.
    pub label: String,
}

/// Extract node and edge records from a parsed document.
pub fn extract(document: &Value, schema: &SchemaConfig) -> Result<Extraction, ExtractError> {
    let plan = resolve(document, &schema.plan_path)?;
    let plan_obj = plan.as_object().ok_or_else(|| {
        ExtractError::MalformedDocument(format!("{} is not an object", schema.plan_path.join(".")))
    })?;

    let raw_name = resolve(plan, &schema.municipality_name_key)?;
    let label = normalize_name(raw_name.as_str().ok_or_else(|| {
        ExtractError::MalformedDocument(format!(
            "municipality name at {} is not a string",
            schema.municipality_name_key.join(".")
        ))
    })?);
    info!(municipality = %label, "reading plan");

    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    match plan_obj.get(&schema.action_key).and_then(Value::as_array) {
        Some(actions) => {
            extract_actions(actions, schema, &mut nodes, &mut edges)?;
            info!("{} actions found", actions.len());
        }
        None => warn!(
            key = %schema.action_key,
            "no actions found, check the action key"
        ),
    }

    match plan_obj
        .get(&schema.indicator_level_key)
        .and_then(Value::as_array)
    {
        Some(levels) => {
            extract_indicators(levels, schema, &mut nodes, &mut edges)?;
            info!("{} indicators found", levels.len());
        }
        None => warn!(
            key = %schema.indicator_level_key,
            "no indicators found, check the indicator key"
        ),
    }

    Ok(Extraction {
        nodes,
        edges,
        label,
    })
}

/// Lowercase, spaces to underscores, diacritics transliterated to ASCII.
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(&name.replace(' ', "_")).to_lowercase()
}

fn extract_actions(
    actions: &[Value],
    schema: &SchemaConfig,
    nodes: &mut Vec<NodeRecord>,
    edges: &mut Vec<EdgeRecord>,
) -> Result<(), ExtractError> {
    // Action links are only read when the first action carries the key.
    let link_key = schema.action_to_action_link_key.as_deref().filter(|key| {
        actions
            .first()
            .and_then(Value::as_object)
            .is_some_and(|first| first.contains_key(*key))
    });
    if schema.action_to_action_link_key.is_some() && link_key.is_none() && !actions.is_empty() {
        debug!("first action carries no action-to-action links, skipping them");
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut n_links = 0usize;

    for (i, action) in actions.iter().enumerate() {
        let action = action.as_object().ok_or_else(|| {
            ExtractError::MalformedDocument(format!("action #{} is not an object", i))
        })?;
        let id = record_id(action, || format!("action #{}", i))?;
        nodes.push(NodeRecord {
            attributes: copy_attributes(
                action,
                &schema.action_attributes,
                &NodeType::Action,
                &schema.node_type_key,
            ),
            id: id.clone(),
            node_type: NodeType::Action,
        });

        let Some(key) = link_key else { continue };
        for entry in link_entries(action, key) {
            let neighbour = neighbour_id(entry, schema.action_link_neighbour_key.as_deref())
                .ok_or_else(|| {
                    ExtractError::MalformedDocument(format!(
                        "action {} has a {} entry without an id",
                        id, key
                    ))
                })?;
            let reverse = (neighbour.clone(), id.clone());
            if seen.contains(&reverse) {
                continue;
            }
            if seen.insert((id.clone(), neighbour.clone())) {
                edges.push(EdgeRecord::new(id.clone(), neighbour));
                n_links += 1;
            }
        }
    }

    if link_key.is_some() {
        info!("{} links between actions found", n_links);
    }
    Ok(())
}

fn extract_indicators(
    levels: &[Value],
    schema: &SchemaConfig,
    nodes: &mut Vec<NodeRecord>,
    edges: &mut Vec<EdgeRecord>,
) -> Result<(), ExtractError> {
    let mut n_action_links = 0usize;
    let mut n_indicator_links = 0usize;
    let mut saw_action_key = false;
    let mut saw_indicator_key = false;

    for (i, level) in levels.iter().enumerate() {
        let level = level.as_object().ok_or_else(|| {
            ExtractError::MalformedDocument(format!("indicator level #{} is not an object", i))
        })?;
        let node_type = match level.get(&schema.indicator_type_key) {
            Some(Value::String(level_name)) => NodeType::IndicatorLevel(level_name.clone()),
            Some(other) if !other.is_null() => NodeType::IndicatorLevel(other.to_string()),
            _ => NodeType::Indicator,
        };
        let indicator = level
            .get(&schema.indicator_key)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ExtractError::MalformedDocument(format!(
                    "indicator level #{} has no {} record",
                    i, schema.indicator_key
                ))
            })?;
        let iid = record_id(indicator, || format!("indicator #{}", i))?;
        nodes.push(NodeRecord {
            attributes: copy_attributes(
                indicator,
                &schema.indicator_attributes,
                &node_type,
                &schema.node_type_key,
            ),
            id: iid.clone(),
            node_type,
        });

        saw_action_key |= indicator.contains_key(&schema.action_to_indicator_link_key);
        for entry in link_entries(indicator, &schema.action_to_indicator_link_key) {
            let aid = neighbour_id(entry, Some(schema.action_neighbour_key.as_str()))
                .ok_or_else(|| {
                    ExtractError::MalformedDocument(format!(
                        "indicator {} has an action link without {}.id",
                        iid, schema.action_neighbour_key
                    ))
                })?;
            edges.push(EdgeRecord::new(aid, iid.clone()));
            n_action_links += 1;
        }

        saw_indicator_key |= indicator.contains_key(&schema.indicator_to_indicator_link_key);
        for entry in link_entries(indicator, &schema.indicator_to_indicator_link_key) {
            let lower = neighbour_id(entry, Some(schema.indicator_neighbour_key.as_str()))
                .ok_or_else(|| {
                    ExtractError::MalformedDocument(format!(
                        "indicator {} has a cause link without {}.id",
                        iid, schema.indicator_neighbour_key
                    ))
                })?;
            edges.push(EdgeRecord::new(lower, iid.clone()));
            n_indicator_links += 1;
        }
    }

    if !levels.is_empty() && !saw_action_key {
        warn!(
            key = %schema.action_to_indicator_link_key,
            "no links from actions to indicators found, check the action to indicator link key"
        );
    }
    if !levels.is_empty() && !saw_indicator_key {
        warn!(
            key = %schema.indicator_to_indicator_link_key,
            "no links between indicators found, check the indicator to indicator link key"
        );
    }
    info!("{} links from actions to indicators found", n_action_links);
    info!("{} links from indicators to indicators found", n_indicator_links);
    Ok(())
}

fn record_id(
    record: &Map<String, Value>,
    describe: impl FnOnce() -> String,
) -> Result<String, ExtractError> {
    record
        .get("id")
        .and_then(id_string)
        .ok_or_else(|| ExtractError::MalformedDocument(format!("{} has no id", describe())))
}

fn copy_attributes(
    record: &Map<String, Value>,
    names: &[String],
    node_type: &NodeType,
    type_key: &str,
) -> BTreeMap<String, Value> {
    let mut attributes = BTreeMap::new();
    for name in names {
        match record.get(name) {
            Some(value) => {
                attributes.insert(name.clone(), value.clone());
            }
            None => debug!(attribute = %name, "attribute missing on record, skipped"),
        }
    }
    attributes.insert(type_key.to_string(), Value::String(node_type.to_string()));
    attributes
}

/// Entries of a link list; an absent or non-list key reads as empty.
fn link_entries<'a>(record: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// The neighbour ID of a link entry: `entry[sub_key].id`, `entry.id`, or the
/// entry itself when it is a bare ID.
fn neighbour_id(entry: &Value, sub_key: Option<&str>) -> Option<String> {
    let target = match sub_key {
        Some(key) => entry.get(key)?,
        None => entry,
    };
    match target {
        Value::Object(obj) => obj.get("id").and_then(id_string),
        other => id_string(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaConfig {
        SchemaConfig {
            action_attributes: vec!["name".to_string()],
            indicator_attributes: vec!["name".to_string()],
            ..SchemaConfig::default()
        }
    }

    fn plan(body: Value) -> Value {
        let mut plan = json!({"organization": {"name": "Lappeenranta"}});
        if let (Some(p), Some(b)) = (plan.as_object_mut(), body.as_object()) {
            p.extend(b.clone());
        }
        json!({"data": {"plan": plan}})
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Hämeenlinna Ilmasto"), "hameenlinna_ilmasto");
        assert_eq!(normalize_name("Äänekoski"), "aanekoski");
    }

    #[test]
    fn test_missing_municipality_name_is_fatal() {
        let doc = json!({"data": {"plan": {"actions": []}}});
        let err = extract(&doc, &schema()).unwrap_err();
        assert!(
            matches!(err, ExtractError::MissingKey { ref path } if path == "organization.name")
        );
    }

    #[test]
    fn test_missing_plan_root_is_fatal() {
        let doc = json!({"plan": {}});
        assert!(matches!(
            extract(&doc, &schema()),
            Err(ExtractError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_missing_containers_yield_empty_records() {
        let out = extract(&plan(json!({})), &schema()).unwrap();
        assert!(out.nodes.is_empty());
        assert!(out.edges.is_empty());
        assert_eq!(out.label, "lappeenranta");
    }

    #[test]
    fn test_actions_copy_attributes_and_type() {
        let doc = plan(json!({
            "actions": [
                {"id": "a1", "name": "Bike lanes", "secret": 1},
                {"id": 7}
            ]
        }));
        let out = extract(&doc, &schema()).unwrap();
        assert_eq!(out.nodes.len(), 2);
        let a1 = &out.nodes[0];
        assert_eq!(a1.node_type, NodeType::Action);
        assert_eq!(a1.attributes["name"], json!("Bike lanes"));
        assert_eq!(a1.attributes["node_type"], json!("action"));
        assert!(!a1.attributes.contains_key("secret"));
        // Missing attribute is skipped, numeric id is stringified.
        assert_eq!(out.nodes[1].id, "7");
        assert!(!out.nodes[1].attributes.contains_key("name"));
    }

    #[test]
    fn test_action_without_id_is_malformed() {
        let doc = plan(json!({"actions": [{"name": "x"}]}));
        assert!(matches!(
            extract(&doc, &schema()),
            Err(ExtractError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_symmetric_action_links_collapse() {
        let doc = plan(json!({
            "actions": [
                {"id": "a", "relatedActions": [{"id": "b"}, {"id": "c"}]},
                {"id": "b", "relatedActions": [{"id": "a"}]},
                {"id": "c", "relatedActions": [{"id": "a"}, {"id": "b"}]}
            ]
        }));
        let out = extract(&doc, &schema()).unwrap();
        let pairs: Vec<(&str, &str)> = out
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("c", "b")]);
    }

    #[test]
    fn test_action_links_skipped_when_first_action_lacks_key() {
        let doc = plan(json!({
            "actions": [
                {"id": "a"},
                {"id": "b", "relatedActions": [{"id": "a"}]}
            ]
        }));
        let out = extract(&doc, &schema()).unwrap();
        assert!(out.edges.is_empty());
    }

    #[test]
    fn test_action_links_with_neighbour_sub_key() {
        let mut schema = schema();
        schema.action_link_neighbour_key = Some("action".to_string());
        let doc = plan(json!({
            "actions": [{"id": "a", "relatedActions": [{"action": {"id": "b"}}]}]
        }));
        let out = extract(&doc, &schema).unwrap();
        assert_eq!(out.edges, vec![EdgeRecord::new("a", "b")]);
    }

    #[test]
    fn test_indicators_types_and_links() {
        let doc = plan(json!({
            "indicatorLevels": [
                {
                    "level": "OPERATIONAL",
                    "indicator": {
                        "id": "i1",
                        "name": "Emissions",
                        "relatedActions": [{"action": {"id": "a1"}}, {"action": {"id": "a1"}}],
                        "relatedCauses": []
                    }
                },
                {
                    "indicator": {
                        "id": "i2",
                        "relatedActions": [],
                        "relatedCauses": [{"causalIndicator": {"id": "i1"}}]
                    }
                }
            ]
        }));
        let out = extract(&doc, &schema()).unwrap();
        assert_eq!(
            out.nodes[0].node_type,
            NodeType::IndicatorLevel("OPERATIONAL".to_string())
        );
        assert_eq!(out.nodes[0].attributes["node_type"], json!("indicator_OPERATIONAL"));
        assert_eq!(out.nodes[1].node_type, NodeType::Indicator);
        // Action→indicator links are not deduplicated.
        assert_eq!(
            out.edges,
            vec![
                EdgeRecord::new("a1", "i1"),
                EdgeRecord::new("a1", "i1"),
                EdgeRecord::new("i1", "i2"),
            ]
        );
    }

    #[test]
    fn test_missing_indicator_record_is_malformed() {
        let doc = plan(json!({"indicatorLevels": [{"level": "TACTICAL"}]}));
        assert!(matches!(
            extract(&doc, &schema()),
            Err(ExtractError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_missing_indicator_link_keys_are_not_fatal() {
        let doc = plan(json!({"indicatorLevels": [{"indicator": {"id": "i1"}}]}));
        let out = extract(&doc, &schema()).unwrap();
        assert_eq!(out.nodes.len(), 1);
        assert!(out.edges.is_empty());
    }
}
