//! Core types for Climate Watch Nets.
//!
//! Reads municipal climate plans (actions and leveled indicators) from JSON
//! documents, turns them into node and edge records ([`extract`]), merges
//! multi-source tags ([`sources`]), and assembles the typed directed graph
//! ([`graph::PlanGraph`]) that the analytics crate consumes.

pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod resolve;
pub mod sources;
pub mod storage;

pub use error::ExtractError;
