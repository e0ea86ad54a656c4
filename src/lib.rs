//! # litmerge
//!
//! Aggregates biomedical literature metadata from PubMed, Crossref and
//! bioRxiv/medRxiv into one merged result per keyword or DOI.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (SourceRecord, Metadata, AggregateResult)
//! - [`sources`]: Upstream clients behind role traits, plus test doubles
//! - [`aggregator`]: Search, detail fetch, enrichment and merge
//! - [`server`]: HTTP service shell
//! - [`utils`]: HTTP client, markup stripping and input validation
//! - [`config`]: Configuration management

pub mod aggregator;
pub mod config;
pub mod models;
pub mod server;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use aggregator::Aggregator;
pub use models::{AggregateResult, Metadata, SourceRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
