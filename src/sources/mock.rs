//! Mock clients for testing purposes.
//!
//! Each mock counts its calls so tests can assert which upstream requests the
//! aggregator made.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{ArticleDetail, CrossReference, Metadata, SourceRecord, SourceType};
use crate::sources::{
    CollectionClient, DetailClient, Fetched, MetadataClient, SearchClient, SourceError,
};

/// A search client returning a fixed identifier list, or failing outright.
#[derive(Debug, Default)]
pub struct MockSearchClient {
    ids: Option<Vec<String>>,
    calls: AtomicUsize,
}

impl MockSearchClient {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            ids: Some(ids.iter().map(|id| id.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A search client whose upstream is unreachable
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    fn source(&self) -> SourceType {
        SourceType::PubMed
    }

    async fn search_ids(&self, _keyword: &str) -> Fetched<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.ids {
            Some(ids) => Fetched::Ok(ids.clone()),
            None => Fetched::degraded(
                Vec::new(),
                SourceError::Network("mock search unavailable".to_string()),
            ),
        }
    }
}

/// A detail client serving predefined articles.
///
/// Unknown identifiers degrade to the placeholder detail.
#[derive(Debug, Default)]
pub struct MockDetailClient {
    articles: HashMap<String, ArticleDetail>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl MockDetailClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an article with an optional DOI
    pub fn with_article(mut self, identifier: &str, title: &str, doi: Option<&str>) -> Self {
        let record = SourceRecord::new(identifier, title, link_for(identifier), SourceType::PubMed);
        self.articles.insert(
            identifier.to_string(),
            ArticleDetail::new(record, CrossReference::from_doi(doi)),
        );
        self
    }

    /// Delay the response for one identifier
    pub fn with_delay(mut self, identifier: &str, delay: Duration) -> Self {
        self.delays.insert(identifier.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn link_for(identifier: &str) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{}/", identifier)
}

#[async_trait]
impl DetailClient for MockDetailClient {
    async fn fetch_detail(&self, identifier: &str) -> Fetched<ArticleDetail> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(identifier) {
            tokio::time::sleep(*delay).await;
        }

        match self.articles.get(identifier) {
            Some(detail) => Fetched::Ok(detail.clone()),
            None => Fetched::degraded(
                ArticleDetail::placeholder(identifier, link_for(identifier), SourceType::PubMed),
                SourceError::NotFound(identifier.to_string()),
            ),
        }
    }
}

/// A metadata client serving predefined works.
///
/// Unknown DOIs degrade to [`Metadata::failed`].
#[derive(Debug, Default)]
pub struct MockMetadataClient {
    works: HashMap<String, Metadata>,
    lookups: AtomicUsize,
}

impl MockMetadataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_work(mut self, doi: &str, metadata: Metadata) -> Self {
        self.works.insert(doi.to_string(), metadata);
        self
    }

    /// Number of network-equivalent DOI lookups performed
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataClient for MockMetadataClient {
    async fn lookup_doi(&self, doi: &str) -> Fetched<Metadata> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.works.get(doi) {
            Some(metadata) => Fetched::Ok(metadata.clone()),
            None => Fetched::degraded(
                Metadata::failed(),
                SourceError::NotFound(format!("DOI {}", doi)),
            ),
        }
    }
}

/// A collection client returning fixed records, or the unreachable sentinel.
#[derive(Debug)]
pub struct MockCollectionClient {
    source: SourceType,
    records: Option<Vec<SourceRecord>>,
    calls: AtomicUsize,
}

impl MockCollectionClient {
    pub fn new(source: SourceType, records: Vec<SourceRecord>) -> Self {
        Self {
            source,
            records: Some(records),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable(source: SourceType) -> Self {
        Self {
            source,
            records: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectionClient for MockCollectionClient {
    fn source(&self) -> SourceType {
        self.source.clone()
    }

    async fn collect(&self, _keyword: &str) -> Fetched<Vec<SourceRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.records {
            Some(records) => Fetched::Ok(records.clone()),
            None => {
                let error = SourceError::Network("mock collection unreachable".to_string());
                Fetched::degraded(
                    vec![SourceRecord::unavailable(self.source.clone(), error.to_string())],
                    error,
                )
            }
        }
    }
}

/// Helper function to create a collection record for testing.
pub fn make_record(title: &str, link: &str, source: SourceType) -> SourceRecord {
    SourceRecord::new("", title, link, source)
}
