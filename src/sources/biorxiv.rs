//! bioRxiv/medRxiv collection source implementation.
//!
//! Both servers share one API with a different server segment, so a single
//! [`BiorxivSource`] covers either, selected by [`ServerType`].

use async_trait::async_trait;
use chrono::{Duration as DateDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::BiorxivConfig;
use crate::models::{SourceRecord, SourceType, NO_LINK, NO_TITLE};
use crate::sources::{CollectionClient, Fetched, SourceError};
use crate::utils::{normalize_whitespace, HttpClient};

/// bioRxiv/medRxiv API base URL
pub const BIORXIV_API_URL: &str = "https://api.biorxiv.org";

/// Server type for biorxiv/medrxiv
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    #[default]
    BioRxiv,
    MedRxiv,
}

impl ServerType {
    fn name(&self) -> &str {
        match self {
            ServerType::BioRxiv => "biorxiv",
            ServerType::MedRxiv => "medrxiv",
        }
    }

    fn source_type(&self) -> SourceType {
        match self {
            ServerType::BioRxiv => SourceType::BioRxiv,
            ServerType::MedRxiv => SourceType::MedRxiv,
        }
    }
}

/// bioRxiv/medRxiv collection source
///
/// Lists the preprints posted in the last `interval_days` days and keeps the
/// items whose title or subject category contains the keyword, ignoring case.
/// The listing endpoint has no keyword parameter, so matching happens here. A
/// blank keyword keeps every item.
#[derive(Debug, Clone)]
pub struct BiorxivSource {
    client: Arc<HttpClient>,
    base_url: String,
    server_type: ServerType,
    interval_days: u32,
    max_results: usize,
}

impl BiorxivSource {
    pub fn new(client: Arc<HttpClient>, server_type: ServerType) -> Self {
        Self {
            client,
            base_url: BIORXIV_API_URL.to_string(),
            server_type,
            interval_days: 30,
            max_results: 10,
        }
    }

    pub fn from_config(config: &BiorxivConfig, client: Arc<HttpClient>) -> Self {
        Self::new(client, config.server)
            .base_url(&config.base_url)
            .interval_days(config.interval_days)
            .max_results(config.max_results)
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn interval_days(mut self, days: u32) -> Self {
        self.interval_days = days;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Build the details URL for the interval ending on `today`
    fn build_details_url(&self, today: NaiveDate) -> String {
        let start = today - DateDuration::days(i64::from(self.interval_days));
        format!(
            "{}/details/{}/{}/{}/0/json",
            self.base_url,
            self.server_type.name(),
            start.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        )
    }

    /// Map a details response into records matching `keyword`
    fn parse_collection(
        &self,
        json: &str,
        keyword: &str,
    ) -> Result<Vec<SourceRecord>, SourceError> {
        let response: ApiResponse = serde_json::from_str(json)?;
        let collection = response
            .collection
            .ok_or_else(|| SourceError::MissingField("collection".to_string()))?;

        let source = self.server_type.source_type();
        let needle = keyword.trim().to_lowercase();

        Ok(collection
            .into_iter()
            .filter(|item| item.matches(&needle))
            .take(self.max_results)
            .map(|item| item.into_record(source.clone()))
            .collect())
    }

    async fn try_collect(&self, keyword: &str) -> Result<Vec<SourceRecord>, SourceError> {
        let url = self.build_details_url(Utc::now().date_naive());
        let json = self
            .client
            .get_text(&url, self.server_type.source_type().name())
            .await?;

        let records = self.parse_collection(&json, keyword)?;
        tracing::debug!(
            keyword,
            server = self.server_type.name(),
            count = records.len(),
            "collection listing mapped"
        );
        Ok(records)
    }
}

#[async_trait]
impl CollectionClient for BiorxivSource {
    fn source(&self) -> SourceType {
        self.server_type.source_type()
    }

    async fn collect(&self, keyword: &str) -> Fetched<Vec<SourceRecord>> {
        let source = self.source();
        Fetched::from_result(self.try_collect(keyword).await, |error| {
            vec![SourceRecord::unavailable(source, error.to_string())]
        })
    }
}

/// API response structure for bioRxiv/medRxiv
#[derive(Debug, Deserialize)]
struct ApiResponse {
    collection: Option<Vec<CollectionItem>>,
}

#[derive(Debug, Deserialize)]
struct CollectionItem {
    title: Option<String>,
    doi: Option<String>,
    link: Option<String>,
    category: Option<String>,
}

impl CollectionItem {
    /// Whether the lowercased `needle` occurs in the title or category
    fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        [&self.title, &self.category]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }

    fn into_record(self, source: SourceType) -> SourceRecord {
        let doi = self
            .doi
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let title = self
            .title
            .map(|t| normalize_whitespace(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let link = self
            .link
            .filter(|l| !l.trim().is_empty())
            .or_else(|| doi.as_ref().map(|d| format!("https://doi.org/{}", d)))
            .unwrap_or_else(|| NO_LINK.to_string());

        let record = SourceRecord::new(doi.clone().unwrap_or_default(), title, link, source);
        match doi {
            Some(doi) => record.with_doi(doi),
            None => record,
        }
    }
}
