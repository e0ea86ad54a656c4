//! Upstream client plugins with a trait-based architecture.
//!
//! Each upstream role is a trait so the [`Aggregator`](crate::Aggregator) can
//! be wired with real clients or test doubles:
//!
//! - [`SearchClient`]: keyword to an ordered identifier list (PubMed ESearch)
//! - [`DetailClient`]: identifier to title and cross-reference (PubMed EFetch)
//! - [`MetadataClient`]: DOI to bibliographic [`Metadata`] (Crossref)
//! - [`CollectionClient`]: keyword to records from a secondary source (bioRxiv/medRxiv)
//!
//! # Failure model
//!
//! Clients never return errors to their callers. Every trait method yields a
//! [`Fetched`] value: either `Ok` with the real data, or `Degraded` with the
//! placeholder value for that role together with the [`SourceError`] that
//! caused it. A degraded search result is the `SearchUnavailable` condition:
//! its value is an empty identifier list.

mod biorxiv;
mod crossref;
mod pubmed;

pub mod mock;

pub use biorxiv::{BiorxivSource, ServerType, BIORXIV_API_URL};
pub use crossref::{CrossRefSource, CROSSREF_API_BASE};
pub use pubmed::{PubMedSource, PUBMED_EUTILS_URL};

use async_trait::async_trait;

use crate::models::{ArticleDetail, CrossReference, Metadata, SourceRecord, SourceType};

/// Primary literature index search
#[async_trait]
pub trait SearchClient: Send + Sync + std::fmt::Debug {
    /// Source the identifiers belong to
    fn source(&self) -> SourceType;

    /// Up to the configured number of identifiers for `keyword`, in relevance order
    async fn search_ids(&self, keyword: &str) -> Fetched<Vec<String>>;
}

/// Per-identifier detail document fetch
#[async_trait]
pub trait DetailClient: Send + Sync + std::fmt::Debug {
    /// Title and cross-reference for one identifier.
    ///
    /// On failure the value is [`ArticleDetail::placeholder`].
    async fn fetch_detail(&self, identifier: &str) -> Fetched<ArticleDetail>;
}

/// DOI metadata enrichment
#[async_trait]
pub trait MetadataClient: Send + Sync + std::fmt::Debug {
    /// Look up one DOI. On failure the value is [`Metadata::failed`].
    async fn lookup_doi(&self, doi: &str) -> Fetched<Metadata>;

    /// Enrich a cross-reference.
    ///
    /// `Absent` short-circuits to [`Metadata::skipped`] without calling
    /// [`lookup_doi`](Self::lookup_doi).
    async fn enrich(&self, reference: &CrossReference) -> Fetched<Metadata> {
        match reference {
            CrossReference::Doi(doi) => self.lookup_doi(doi).await,
            CrossReference::Absent => Fetched::Ok(Metadata::skipped()),
        }
    }
}

/// Secondary collection source queried independently of the primary search
#[async_trait]
pub trait CollectionClient: Send + Sync + std::fmt::Debug {
    fn source(&self) -> SourceType;

    /// Records for `keyword`.
    ///
    /// On failure the value is a single [`SourceRecord::unavailable`] sentinel,
    /// never an empty list.
    async fn collect(&self, keyword: &str) -> Fetched<Vec<SourceRecord>>;
}

/// Outcome of a client call: real data, or a placeholder plus the cause
#[derive(Debug)]
pub enum Fetched<T> {
    Ok(T),
    Degraded { value: T, error: SourceError },
}

impl<T> Fetched<T> {
    pub fn degraded(value: T, error: SourceError) -> Self {
        Fetched::Degraded { value, error }
    }

    /// Convert a fallible call, substituting `fallback` on error
    pub fn from_result<F>(result: Result<T, SourceError>, fallback: F) -> Self
    where
        F: FnOnce(&SourceError) -> T,
    {
        match result {
            Ok(value) => Fetched::Ok(value),
            Err(error) => {
                let value = fallback(&error);
                Fetched::Degraded { value, error }
            }
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Fetched::Ok(value) | Fetched::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Fetched::Ok(value) | Fetched::Degraded { value, .. } => value,
        }
    }

    pub fn error(&self) -> Option<&SourceError> {
        match self {
            Fetched::Ok(_) => None,
            Fetched::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }
}

/// Coarse classification of upstream failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, timeout or non-success status
    TransportFailure,
    /// Malformed JSON/XML
    ParseFailure,
    /// Upstream explicitly reported no such record
    NotFound,
    /// Valid payload without an expected field
    MissingField,
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success status other than 404
    #[error("API error: {0}")]
    Api(String),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Expected field absent from an otherwise valid payload
    #[error("Missing field: {0}")]
    MissingField(String),
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Network(_) | SourceError::Timeout(_) | SourceError::Api(_) => {
                ErrorKind::TransportFailure
            }
            SourceError::Parse(_) => ErrorKind::ParseFailure,
            SourceError::NotFound(_) => ErrorKind::NotFound,
            SourceError::MissingField(_) => ErrorKind::MissingField,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
