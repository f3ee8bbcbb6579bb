//! Structural statistics over assembled plan graphs.
//!
//! Provides binning ([`binning`]), per-graph metrics ([`analytics`]),
//! projection graphs ([`projection`]), and the batch pipeline that compares
//! municipalities ([`pipeline`]).

pub mod analytics;
pub mod binning;
pub mod error;
pub mod pipeline;
pub mod projection;

pub use error::AnalysisError;
