//! Configuration for document extraction and network analysis.
//!
//! Load order: TOML file (if given and present) → environment variables → defaults.
//! Every key path and attribute list the extractor uses is configuration, so the
//! same code reads any plan export that follows the Kausal Watch layout.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetsConfig {
    pub data: DataConfig,
    pub schema: SchemaConfig,
    pub analysis: AnalysisConfig,
}

/// Where documents live and which tags to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Folder holding one `<tag>.json` document per source tag.
    pub data_folder: PathBuf,
    /// Municipality tags. A tag joining several sources with `tag_delimiter`
    /// (e.g. `tampere-ilmasto+tampere-lumo`) is merged into one graph.
    pub municipality_tags: Vec<String>,
    pub tag_delimiter: String,
    /// Folder receiving edge lists and reports.
    pub save_path: PathBuf,
}

/// Field names used to walk a planning document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Path from the document root to the plan object.
    pub plan_path: Vec<String>,
    /// Path from the plan object to the municipality name.
    pub municipality_name_key: Vec<String>,
    pub action_key: String,
    /// Action fields copied onto action nodes.
    pub action_attributes: Vec<String>,
    /// Key of action-to-action links on each action. Links are only read when
    /// the first action carries this key.
    pub action_to_action_link_key: Option<String>,
    /// Sub-key holding the neighbour inside an action-to-action link entry.
    pub action_link_neighbour_key: Option<String>,
    pub indicator_level_key: String,
    /// Key of the level (OPERATIONAL, TACTICAL, ...) on each indicator level entry.
    pub indicator_type_key: String,
    /// Key of the indicator record inside each indicator level entry.
    pub indicator_key: String,
    /// Indicator fields copied onto indicator nodes.
    pub indicator_attributes: Vec<String>,
    pub action_to_indicator_link_key: String,
    pub action_neighbour_key: String,
    pub indicator_to_indicator_link_key: String,
    pub indicator_neighbour_key: String,
    /// Node attribute that carries the node type in the assembled graph.
    pub node_type_key: String,
}

/// How cross-municipality histograms are binned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinType {
    #[default]
    Linear,
    Log,
}

/// Network analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Declared node types, in reporting order. Type-pair keys are formed in
    /// this order.
    pub node_types: Vec<String>,
    /// Node types used as the spanning type of projection graphs.
    pub projection_spanning_types: Vec<String>,
    pub degree_bins: usize,
    pub type_histogram_bins: usize,
    pub type_histogram_bin_type: BinType,
    pub projection_density_bins: usize,
    pub projection_density_bin_type: BinType,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("data"),
            municipality_tags: Vec::new(),
            tag_delimiter: "+".to_string(),
            save_path: PathBuf::from("results"),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            plan_path: strings(&["data", "plan"]),
            municipality_name_key: strings(&["organization", "name"]),
            action_key: "actions".to_string(),
            action_attributes: strings(&[
                "name",
                "description",
                "schedule",
                "implementationPhase",
                "responsibleParties",
                "categories",
                "contactPersons",
                "updatedAt",
            ]),
            action_to_action_link_key: Some("relatedActions".to_string()),
            action_link_neighbour_key: None,
            indicator_level_key: "indicatorLevels".to_string(),
            indicator_type_key: "level".to_string(),
            indicator_key: "indicator".to_string(),
            indicator_attributes: strings(&[
                "name",
                "organization",
                "categories",
                "maxValue",
                "minValue",
                "latestValue",
            ]),
            action_to_indicator_link_key: "relatedActions".to_string(),
            action_neighbour_key: "action".to_string(),
            indicator_to_indicator_link_key: "relatedCauses".to_string(),
            indicator_neighbour_key: "causalIndicator".to_string(),
            node_type_key: "node_type".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            node_types: strings(&[
                "action",
                "indicator_OPERATIONAL",
                "indicator_TACTICAL",
                "indicator_STRATEGIC",
                "indicator",
            ]),
            projection_spanning_types: strings(&["action"]),
            degree_bins: 10,
            type_histogram_bins: 10,
            type_histogram_bin_type: BinType::Linear,
            projection_density_bins: 10,
            projection_density_bin_type: BinType::Linear,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl NetsConfig {
    /// Load config from a TOML file, with env var overrides.
    /// Falls back to defaults if no path is given or the file does not exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => Self::from_toml(&std::fs::read_to_string(path)?)?,
            _ => Self::default(),
        };

        env_override("CWN_DATA_FOLDER", &mut config.data.data_folder);
        env_override("CWN_SAVE_PATH", &mut config.data.save_path);
        env_override("CWN_DEGREE_BINS", &mut config.analysis.degree_bins);
        env_override(
            "CWN_TYPE_HISTOGRAM_BINS",
            &mut config.analysis.type_histogram_bins,
        );
        env_override(
            "CWN_PROJECTION_DENSITY_BINS",
            &mut config.analysis.projection_density_bins,
        );

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string without env overrides or validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check that every key is usable and the type declarations are consistent.
    pub fn validate(&self) -> Result<()> {
        let schema = &self.schema;
        if schema.plan_path.iter().any(String::is_empty) {
            anyhow::bail!("plan_path contains an empty key");
        }
        if schema.municipality_name_key.is_empty()
            || schema.municipality_name_key.iter().any(String::is_empty)
        {
            anyhow::bail!("municipality_name_key must be a non-empty list of non-empty keys");
        }
        let named_keys = [
            ("action_key", &schema.action_key),
            ("indicator_level_key", &schema.indicator_level_key),
            ("indicator_type_key", &schema.indicator_type_key),
            ("indicator_key", &schema.indicator_key),
            (
                "action_to_indicator_link_key",
                &schema.action_to_indicator_link_key,
            ),
            ("action_neighbour_key", &schema.action_neighbour_key),
            (
                "indicator_to_indicator_link_key",
                &schema.indicator_to_indicator_link_key,
            ),
            ("indicator_neighbour_key", &schema.indicator_neighbour_key),
            ("node_type_key", &schema.node_type_key),
        ];
        for (name, value) in named_keys {
            if value.is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }
        if self.data.tag_delimiter.is_empty() {
            anyhow::bail!("tag_delimiter must not be empty");
        }

        let analysis = &self.analysis;
        if analysis.node_types.is_empty() {
            anyhow::bail!("node_types must declare at least one type");
        }
        for (i, node_type) in analysis.node_types.iter().enumerate() {
            if node_type.is_empty() || node_type.contains('-') {
                anyhow::bail!(
                    "invalid node type {:?}: must be non-empty and contain no '-'",
                    node_type
                );
            }
            if analysis.node_types[..i].contains(node_type) {
                anyhow::bail!("node type {:?} is declared twice", node_type);
            }
        }
        for spanning in &analysis.projection_spanning_types {
            if !analysis.node_types.contains(spanning) {
                anyhow::bail!(
                    "projection spanning type {:?} is not a declared node type",
                    spanning
                );
            }
        }
        for (name, bins) in [
            ("degree_bins", analysis.degree_bins),
            ("type_histogram_bins", analysis.type_histogram_bins),
            ("projection_density_bins", analysis.projection_density_bins),
        ] {
            if bins == 0 {
                anyhow::bail!("{} must be greater than zero", name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetsConfig::default();
        assert_eq!(config.schema.plan_path, vec!["data", "plan"]);
        assert_eq!(config.schema.action_key, "actions");
        assert_eq!(config.schema.indicator_neighbour_key, "causalIndicator");
        assert_eq!(config.analysis.node_types.len(), 5);
        assert_eq!(config.analysis.projection_spanning_types, vec!["action"]);
        assert_eq!(config.data.tag_delimiter, "+");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[data]
municipality_tags = ["espoo-ilmasto", "lpr-ilmasto+lpr-kierto"]

[schema]
action_attributes = ["name"]
action_to_action_link_key = "similarActions"

[analysis]
degree_bins = 5
type_histogram_bin_type = "log"
"#;
        let config = NetsConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.data.municipality_tags.len(), 2);
        assert_eq!(config.schema.action_attributes, vec!["name"]);
        assert_eq!(
            config.schema.action_to_action_link_key.as_deref(),
            Some("similarActions")
        );
        assert_eq!(config.analysis.degree_bins, 5);
        assert_eq!(config.analysis.type_histogram_bin_type, BinType::Log);
        // Defaults for unspecified fields
        assert_eq!(config.schema.indicator_key, "indicator");
        assert_eq!(config.analysis.projection_density_bins, 10);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = NetsConfig::load(Some(Path::new("/nonexistent/cwn.toml"))).unwrap();
        assert_eq!(config.schema.action_key, "actions");
    }

    #[test]
    fn test_load_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cwn.toml");
        std::fs::write(
            &path,
            r#"
[analysis]
node_types = ["action", "indicator"]
"#,
        )
        .unwrap();

        let config = NetsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.analysis.node_types, vec!["action", "indicator"]);
    }

    #[test]
    fn test_validate_rejects_undeclared_spanning_type() {
        let mut config = NetsConfig::default();
        config.analysis.projection_spanning_types = vec!["policy".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_and_dashed_types() {
        let mut config = NetsConfig::default();
        config.analysis.node_types = vec!["action".to_string(), "action".to_string()];
        config.analysis.projection_spanning_types.clear();
        assert!(config.validate().is_err());

        config.analysis.node_types = vec!["action-plan".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_bins() {
        let mut config = NetsConfig::default();
        config.analysis.degree_bins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name_path() {
        let mut config = NetsConfig::default();
        config.schema.municipality_name_key.clear();
        assert!(config.validate().is_err());
    }
}
