//! Errors raised by the analytics engine.

/// Errors from binning and graph statistics.
///
/// All of these point at a configuration or schema mismatch and abort the
/// current computation.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A node type or type pair that the configured type list does not declare.
    #[error("undeclared node type or type pair: {key}")]
    UnknownType { key: String },
    /// Logarithmic binning needs strictly positive, finite bounds.
    #[error("invalid range for logarithmic bins: min {min}, max {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("number of bins must be greater than zero")]
    InvalidBinCount,
}
