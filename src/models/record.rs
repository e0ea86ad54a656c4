//! Source records produced by the upstream clients.

use serde::{Deserialize, Serialize};

/// Title used when a detail document carries no article title
pub const TITLE_UNAVAILABLE: &str = "title unavailable";

/// Title used when a collection item has no title
pub const NO_TITLE: &str = "No title";

/// Link used when a collection item has no link
pub const NO_LINK: &str = "No link";

/// The source/repository a record came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    PubMed,
    BioRxiv,
    MedRxiv,
}

impl SourceType {
    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::PubMed => "PubMed",
            SourceType::BioRxiv => "bioRxiv",
            SourceType::MedRxiv => "medRxiv",
        }
    }

    /// Returns the source tag used in serialized records
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::PubMed => "pubmed",
            SourceType::BioRxiv => "biorxiv",
            SourceType::MedRxiv => "medrxiv",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single literature record from one source.
///
/// `link` is always present; it is the empty string when the source could not
/// provide one. A record with `error` set is the sentinel for a source that
/// could not be reached at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source-specific identifier (PMID, DOI, ...)
    pub identifier: String,

    pub title: String,

    pub link: String,

    pub source: SourceType,

    /// Digital Object Identifier, when the source carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// Retrieval failure description for sentinel records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceRecord {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        source: SourceType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            link: link.into(),
            source,
            doi: None,
            error: None,
        }
    }

    /// Attach a DOI. Blank values are ignored.
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        let doi = doi.into();
        let doi = doi.trim();
        if !doi.is_empty() {
            self.doi = Some(doi.to_string());
        }
        self
    }

    /// Sentinel record signalling that a whole source was unreachable
    pub fn unavailable(source: SourceType, reason: impl Into<String>) -> Self {
        let title = format!("{} data unavailable", source.name());
        Self {
            identifier: String::new(),
            title,
            link: String::new(),
            source,
            doi: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.error.is_some()
    }
}

/// Cross-reference carried by a detail document.
///
/// `Absent` is distinct from an empty DOI string: it tells the caller to skip
/// enrichment entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossReference {
    Doi(String),
    Absent,
}

impl CrossReference {
    /// Build from an optional DOI; blank strings become `Absent`
    pub fn from_doi(doi: Option<&str>) -> Self {
        match doi.map(str::trim) {
            Some(doi) if !doi.is_empty() => CrossReference::Doi(doi.to_string()),
            _ => CrossReference::Absent,
        }
    }

    pub fn doi(&self) -> Option<&str> {
        match self {
            CrossReference::Doi(doi) => Some(doi),
            CrossReference::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CrossReference::Absent)
    }
}

/// Result of a per-identifier detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub record: SourceRecord,
    pub cross_reference: CrossReference,
}

impl ArticleDetail {
    /// Pair a record with its cross-reference, copying the DOI onto the record
    pub fn new(record: SourceRecord, cross_reference: CrossReference) -> Self {
        let record = match cross_reference.doi() {
            Some(doi) => record.with_doi(doi),
            None => record,
        };
        Self {
            record,
            cross_reference,
        }
    }

    /// Degraded detail for an identifier whose document could not be fetched
    pub fn placeholder(
        identifier: impl Into<String>,
        link: impl Into<String>,
        source: SourceType,
    ) -> Self {
        Self {
            record: SourceRecord::new(identifier, TITLE_UNAVAILABLE, link, source),
            cross_reference: CrossReference::Absent,
        }
    }
}
