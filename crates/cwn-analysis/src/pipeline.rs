//! Batch pipeline: analyse many municipality tags and aggregate the results.
//!
//! Tags are processed in parallel; aggregation happens afterwards in tag order
//! so the summary does not depend on scheduling. A tag that fails to load or
//! analyse is logged and listed in the summary without aborting the batch.

use crate::analytics::{
    TypeCount, count_types, degree_distribution, density, density_without_isolated,
};
use crate::binning::{Distribution, Histogram, histogram};
use crate::error::AnalysisError;
use crate::projection::projection;
use chrono::{DateTime, Utc};
use cwn_core::ExtractError;
use cwn_core::config::{BinType, NetsConfig};
use cwn_core::graph::PlanGraph;
use cwn_core::sources::build_graph;
use serde::Serialize;
use tracing::{error, info, warn};

/// Degree distribution of one node type.
#[derive(Debug, Clone, Serialize)]
pub struct TypedDistribution {
    pub node_type: String,
    pub distribution: Distribution,
}

/// Size and density of one projection graph.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionStats {
    pub spanning_type: String,
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    /// Density over projection nodes that have at least one link.
    pub density_without_isolated: f64,
}

/// Every statistic computed for one municipality tag.
#[derive(Debug, Clone, Serialize)]
pub struct MunicipalityStats {
    pub tag: String,
    pub label: String,
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub density_without_isolated: f64,
    pub degree_distributions: Vec<TypedDistribution>,
    pub type_counts: TypeCount,
    pub projections: Vec<ProjectionStats>,
}

/// Why a single tag could not be analysed.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Compute all per-graph statistics.
pub fn analyze_graph(
    tag: &str,
    graph: &PlanGraph,
    config: &NetsConfig,
) -> Result<MunicipalityStats, AnalysisError> {
    let analysis = &config.analysis;
    let type_key = config.schema.node_type_key.as_str();

    let degree_distributions = degree_distribution(
        graph,
        &analysis.node_types,
        type_key,
        analysis.degree_bins,
    )?
    .into_iter()
    .zip(&analysis.node_types)
    .map(|(distribution, node_type)| TypedDistribution {
        node_type: node_type.clone(),
        distribution,
    })
    .collect();

    let type_counts = count_types(graph, &analysis.node_types, type_key)?;

    let projections = analysis
        .projection_spanning_types
        .iter()
        .map(|spanning_type| {
            let projected = projection(graph, spanning_type, type_key);
            ProjectionStats {
                spanning_type: spanning_type.clone(),
                nodes: projected.node_count(),
                edges: projected.edge_count(),
                density: density(&projected),
                density_without_isolated: density_without_isolated(&projected),
            }
        })
        .collect();

    Ok(MunicipalityStats {
        tag: tag.to_string(),
        label: graph.label.clone(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        density: density(graph),
        density_without_isolated: density_without_isolated(graph),
        degree_distributions,
        type_counts,
        projections,
    })
}

/// Load, assemble and analyse one tag.
pub fn analyze_tag(tag: &str, config: &NetsConfig) -> Result<MunicipalityStats, TagError> {
    let graph = build_graph(tag, &config.data, &config.schema)?;
    Ok(analyze_graph(tag, &graph, config)?)
}

/// A tag that failed, with the rendered error.
#[derive(Debug, Clone, Serialize)]
pub struct TagFailure {
    pub tag: String,
    pub error: String,
}

/// Per-type degree distributions across municipalities, in tag order.
///
/// Municipalities with no node of the type contribute nothing, so
/// `distributions` is not aligned with `BatchSummary::municipalities`.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDistributions {
    pub node_type: String,
    pub distributions: Vec<Distribution>,
}

/// Histogram of one per-municipality quantity across the batch.
#[derive(Debug, Clone, Serialize)]
pub struct KeyHistogram {
    pub key: String,
    pub bin_type: BinType,
    pub histogram: Histogram,
    /// Values left out of a log histogram because they are zero or negative.
    pub excluded_non_positive: usize,
    /// Set when the values could not be binned; `histogram` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Cross-municipality comparison produced by [`run_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub municipalities: Vec<MunicipalityStats>,
    pub failures: Vec<TagFailure>,
    pub degree_distributions: Vec<TypeDistributions>,
    pub type_count_histograms: Vec<KeyHistogram>,
    pub projection_density_histograms: Vec<KeyHistogram>,
    pub projection_density_without_isolated_histograms: Vec<KeyHistogram>,
}

/// Append-only collector of per-municipality values, keyed by type.
#[derive(Debug, Clone)]
pub struct BatchAggregator {
    distributions: Vec<(String, Vec<Distribution>)>,
    type_counts: Vec<(String, Vec<f64>)>,
    projection_densities: Vec<(String, Vec<f64>)>,
    projection_densities_without_isolated: Vec<(String, Vec<f64>)>,
}

fn empty_series(keys: impl IntoIterator<Item = String>) -> Vec<(String, Vec<f64>)> {
    keys.into_iter().map(|k| (k, Vec::new())).collect()
}

fn series_values<'a>(series: &'a [(String, Vec<f64>)], key: &str) -> Option<&'a [f64]> {
    series
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_slice())
}

impl BatchAggregator {
    pub fn new(config: &NetsConfig) -> Self {
        let analysis = &config.analysis;
        let spanning = || analysis.projection_spanning_types.iter().cloned();
        Self {
            distributions: analysis
                .node_types
                .iter()
                .map(|t| (t.clone(), Vec::new()))
                .collect(),
            type_counts: empty_series(
                TypeCount::zeroed(&analysis.node_types)
                    .iter()
                    .map(|(key, _)| key.to_string()),
            ),
            projection_densities: empty_series(spanning()),
            projection_densities_without_isolated: empty_series(spanning()),
        }
    }

    /// Append one municipality's values. Keys it lacks are skipped, as are
    /// empty degree distributions.
    pub fn push(&mut self, stats: &MunicipalityStats) {
        for (node_type, dists) in &mut self.distributions {
            if let Some(typed) = stats
                .degree_distributions
                .iter()
                .find(|d| d.node_type == *node_type && !d.distribution.is_empty())
            {
                dists.push(typed.distribution.clone());
            }
        }
        for (key, values) in &mut self.type_counts {
            if let Some(count) = stats.type_counts.get(key) {
                values.push(count as f64);
            }
        }
        for p in &stats.projections {
            if let Some((_, values)) = self
                .projection_densities
                .iter_mut()
                .find(|(k, _)| *k == p.spanning_type)
            {
                values.push(p.density);
            }
            if let Some((_, values)) = self
                .projection_densities_without_isolated
                .iter_mut()
                .find(|(k, _)| *k == p.spanning_type)
            {
                values.push(p.density_without_isolated);
            }
        }
    }

    /// Degree distributions collected so far for a node type.
    pub fn distributions(&self, node_type: &str) -> Option<&[Distribution]> {
        self.distributions
            .iter()
            .find(|(k, _)| k == node_type)
            .map(|(_, v)| v.as_slice())
    }

    /// Values collected so far for a type-count key, in push order.
    pub fn type_count_values(&self, key: &str) -> Option<&[f64]> {
        series_values(&self.type_counts, key)
    }

    /// Projection densities collected so far for a spanning type.
    pub fn projection_density_values(&self, spanning_type: &str) -> Option<&[f64]> {
        series_values(&self.projection_densities, spanning_type)
    }

    /// Projection densities over linked nodes only, for a spanning type.
    pub fn projection_density_without_isolated_values(
        &self,
        spanning_type: &str,
    ) -> Option<&[f64]> {
        series_values(&self.projection_densities_without_isolated, spanning_type)
    }

    /// Bin the collected values into the summary histograms.
    ///
    /// A series that cannot be binned gets an empty histogram carrying the
    /// error; the other series and the per-municipality stats are kept.
    pub fn finish(
        self,
        config: &NetsConfig,
        municipalities: Vec<MunicipalityStats>,
        failures: Vec<TagFailure>,
    ) -> BatchSummary {
        let analysis = &config.analysis;
        let type_count_histograms = series_histograms(
            &self.type_counts,
            analysis.type_histogram_bin_type,
            analysis.type_histogram_bins,
        );
        let projection_density_histograms = series_histograms(
            &self.projection_densities,
            analysis.projection_density_bin_type,
            analysis.projection_density_bins,
        );
        let projection_density_without_isolated_histograms = series_histograms(
            &self.projection_densities_without_isolated,
            analysis.projection_density_bin_type,
            analysis.projection_density_bins,
        );

        BatchSummary {
            generated_at: Utc::now(),
            municipalities,
            failures,
            degree_distributions: self
                .distributions
                .into_iter()
                .map(|(node_type, distributions)| TypeDistributions {
                    node_type,
                    distributions,
                })
                .collect(),
            type_count_histograms,
            projection_density_histograms,
            projection_density_without_isolated_histograms,
        }
    }
}

fn series_histograms(
    series: &[(String, Vec<f64>)],
    bin_type: BinType,
    nbins: usize,
) -> Vec<KeyHistogram> {
    series
        .iter()
        .map(|(key, values)| key_histogram(key, values, bin_type, nbins))
        .collect()
}

/// Histogram of `values`; log bins drop non-positive values and count them.
fn key_histogram(key: &str, values: &[f64], bin_type: BinType, nbins: usize) -> KeyHistogram {
    let (kept, excluded_non_positive) = match bin_type {
        BinType::Linear => (values.to_vec(), 0),
        BinType::Log => {
            let kept: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
            let excluded = values.len() - kept.len();
            (kept, excluded)
        }
    };
    let (histogram, error) = match histogram(&kept, bin_type, nbins) {
        Ok(histogram) => (histogram, None),
        Err(e) => {
            warn!(key, error = %e, "could not bin values, histogram left empty");
            (Histogram::default(), Some(e.to_string()))
        }
    };
    KeyHistogram {
        key: key.to_string(),
        bin_type,
        histogram,
        excluded_non_positive,
        error,
    }
}

/// Analyse every tag and aggregate the results in input order.
///
/// `on_done` is called once per tag as soon as it finishes (from worker
/// threads, in completion order).
pub fn run_batch<S, F>(tags: &[S], config: &NetsConfig, on_done: F) -> BatchSummary
where
    S: AsRef<str> + Sync,
    F: Fn(&str) + Sync,
{
    use rayon::prelude::*;

    let results: Vec<(&str, Result<MunicipalityStats, TagError>)> = tags
        .par_iter()
        .map(|tag| {
            let tag = tag.as_ref();
            let result = analyze_tag(tag, config);
            on_done(tag);
            (tag, result)
        })
        .collect();

    let mut aggregator = BatchAggregator::new(config);
    let mut municipalities = Vec::new();
    let mut failures = Vec::new();
    for (tag, result) in results {
        match result {
            Ok(stats) => {
                aggregator.push(&stats);
                municipalities.push(stats);
            }
            Err(e) => {
                error!(tag, error = %e, "tag failed");
                failures.push(TagFailure {
                    tag: tag.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    info!(
        analysed = municipalities.len(),
        failed = failures.len(),
        "batch finished"
    );
    aggregator.finish(config, municipalities, failures)
}
