//! Query orchestration across the upstream clients.
//!
//! For a keyword the [`Aggregator`]:
//!
//! 1. runs the primary search for an ordered identifier list,
//! 2. fetches each identifier's detail document and enriches its DOI, with at
//!    most `max_concurrent` identifiers in flight, reassembled in search order,
//! 3. runs the secondary collection sources alongside the primary pipeline,
//! 4. returns primary entries followed by secondary records.
//!
//! No step can fail the query. Client failures arrive as degraded values and
//! are logged here.

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{AggregateEntry, AggregateResult, Metadata, SourceRecord};
use crate::sources::{
    BiorxivSource, CollectionClient, CrossRefSource, DetailClient, Fetched, MetadataClient,
    PubMedSource, SearchClient, SourceError,
};
use crate::utils::HttpClient;

/// Default bound on in-flight per-identifier fetches
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Aggregates primary search, enrichment and secondary sources
#[derive(Debug, Clone)]
pub struct Aggregator {
    search: Arc<dyn SearchClient>,
    detail: Arc<dyn DetailClient>,
    metadata: Arc<dyn MetadataClient>,
    collections: Vec<Arc<dyn CollectionClient>>,
    max_concurrent: usize,
}

impl Aggregator {
    pub fn new(
        search: Arc<dyn SearchClient>,
        detail: Arc<dyn DetailClient>,
        metadata: Arc<dyn MetadataClient>,
    ) -> Self {
        Self {
            search,
            detail,
            metadata,
            collections: Vec::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Wire the PubMed, CrossRef and bioRxiv/medRxiv clients from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let timeout = config.http.timeout();
        let client = Arc::new(HttpClient::new(timeout)?);

        let pubmed = Arc::new(PubMedSource::from_config(&config.pubmed, Arc::clone(&client)));
        let crossref = Arc::new(CrossRefSource::from_config(&config.crossref, timeout)?);
        let biorxiv = Arc::new(BiorxivSource::from_config(&config.biorxiv, client));

        Ok(Self::new(pubmed.clone(), pubmed, crossref)
            .with_collection(biorxiv)
            .max_concurrent(config.http.max_concurrent_requests))
    }

    /// Append a secondary source; sources are concatenated in registration order
    pub fn with_collection(mut self, collection: Arc<dyn CollectionClient>) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Run the full pipeline for a keyword. Never fails.
    pub async fn search(&self, keyword: &str) -> AggregateResult {
        let (primary, secondary) =
            tokio::join!(self.primary_segment(keyword), self.secondary_segment(keyword));

        tracing::info!(
            keyword,
            primary = primary.len(),
            secondary = secondary.len(),
            "aggregated query"
        );

        AggregateResult::new(primary, secondary)
    }

    /// Resolve a single DOI to metadata
    pub async fn lookup_doi(&self, doi: &str) -> Metadata {
        let fetched = self.metadata.lookup_doi(doi).await;
        settle(fetched, "metadata lookup", doi)
    }

    async fn primary_segment(&self, keyword: &str) -> Vec<AggregateEntry> {
        let ids = settle(self.search.search_ids(keyword).await, "search", keyword);

        // `buffered` yields in input order regardless of completion order
        stream::iter(ids)
            .map(|id| async move { self.resolve_identifier(&id).await })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    async fn resolve_identifier(&self, identifier: &str) -> AggregateEntry {
        let detail = settle(
            self.detail.fetch_detail(identifier).await,
            "detail fetch",
            identifier,
        );

        let subject = detail.cross_reference.doi().unwrap_or(identifier).to_string();
        let metadata = settle(
            self.metadata.enrich(&detail.cross_reference).await,
            "enrichment",
            &subject,
        );

        AggregateEntry::enriched(detail.record, metadata)
    }

    async fn secondary_segment(&self, keyword: &str) -> Vec<SourceRecord> {
        let fetches = self.collections.iter().map(|collection| async move {
            let source = collection.source();
            let fetched = collection.collect(keyword).await;
            settle(fetched, "collection", source.id())
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }
}

/// Unwrap a client outcome, logging the cause when it was degraded
fn settle<T>(fetched: Fetched<T>, step: &str, subject: &str) -> T {
    if let Some(error) = fetched.error() {
        tracing::warn!(step, subject, kind = ?error.kind(), error = %error, "upstream degraded");
    }
    fetched.into_value()
}
