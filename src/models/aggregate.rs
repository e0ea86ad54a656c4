//! Merged result of one aggregated query.

use serde::{Deserialize, Serialize};

use super::{Metadata, SourceRecord, SourceType};

/// One record with its optional enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateEntry {
    #[serde(flatten)]
    pub record: SourceRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl AggregateEntry {
    pub fn enriched(record: SourceRecord, metadata: Metadata) -> Self {
        Self {
            record,
            metadata: Some(metadata),
        }
    }

    pub fn bare(record: SourceRecord) -> Self {
        Self {
            record,
            metadata: None,
        }
    }
}

/// Ordered records across all sources.
///
/// Primary-source entries come first, in the order the search returned their
/// identifiers; secondary-source records follow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub papers: Vec<AggregateEntry>,
}

impl AggregateResult {
    pub fn new(primary: Vec<AggregateEntry>, secondary: Vec<SourceRecord>) -> Self {
        let mut papers = primary;
        papers.extend(secondary.into_iter().map(AggregateEntry::bare));
        Self { papers }
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregateEntry> {
        self.papers.iter()
    }

    /// Entries that came from the given source, in result order
    pub fn from_source<'a>(
        &'a self,
        source: &'a SourceType,
    ) -> impl Iterator<Item = &'a AggregateEntry> + 'a {
        self.papers.iter().filter(move |e| &e.record.source == source)
    }
}
