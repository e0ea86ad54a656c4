//! CrossRef DOI metadata source.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CrossRefConfig;
use crate::models::Metadata;
use crate::sources::{Fetched, MetadataClient, SourceError};
use crate::utils::{strip_markup, HttpClient};

/// CrossRef REST API base URL
pub const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef works lookup
///
/// Uses the CrossRef REST API for DOI metadata lookup. Requests carry a
/// polite-pool User-Agent with a contact address.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(mailto: Option<&str>, timeout: Duration) -> Result<Self, SourceError> {
        let user_agent = Self::user_agent(mailto);
        Ok(Self {
            client: Arc::new(HttpClient::with_user_agent(&user_agent, timeout)?),
            base_url: CROSSREF_API_BASE.to_string(),
        })
    }

    pub fn from_config(config: &CrossRefConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::new(config.mailto.as_deref(), timeout)?.base_url(&config.base_url))
    }

    /// Create with a custom HTTP client (for testing)
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: CROSSREF_API_BASE.to_string(),
        }
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn user_agent(mailto: Option<&str>) -> String {
        format!(
            "{}/{} (mailto:{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            mailto.unwrap_or("litmerge@example.org")
        )
    }

    fn build_work_url(&self, doi: &str) -> String {
        format!("{}/works/{}", self.base_url, urlencoding::encode(doi))
    }

    /// Parse a `/works/{doi}` response into [`Metadata`]
    fn parse_work(json: &str) -> Result<Metadata, SourceError> {
        let response: CRWorkResponse = serde_json::from_str(json)?;
        let work = response
            .message
            .ok_or_else(|| SourceError::MissingField("message".to_string()))?;

        let title = work
            .title
            .first()
            .map(|t| strip_markup(t))
            .unwrap_or_default();

        let authors = work.author.iter().map(CRAuthor::display_name).collect();

        let journal = work.container_title.first().cloned().unwrap_or_default();

        let published = [
            &work.published,
            &work.published_print,
            &work.published_online,
            &work.issued,
        ]
        .into_iter()
        .flatten()
        .find_map(CRDate::first_parts)
        .unwrap_or_default();

        let r#abstract = work
            .abstract_text
            .as_deref()
            .map(strip_markup)
            .unwrap_or_default();

        Ok(Metadata {
            title,
            authors,
            journal,
            published,
            r#abstract,
        })
    }

    async fn try_lookup(&self, doi: &str) -> Result<Metadata, SourceError> {
        let url = self.build_work_url(doi);
        let json = self.client.get_text(&url, "CrossRef").await?;
        Self::parse_work(&json)
    }
}

#[async_trait]
impl MetadataClient for CrossRefSource {
    async fn lookup_doi(&self, doi: &str) -> Fetched<Metadata> {
        Fetched::from_result(self.try_lookup(doi).await, |_| Metadata::failed())
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRWorkResponse {
    message: Option<CRWork>,
}

#[derive(Debug, Deserialize)]
struct CRWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CRAuthor>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    published: Option<CRDate>,
    #[serde(rename = "published-print")]
    published_print: Option<CRDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CRDate>,
    issued: Option<CRDate>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
    /// Organisational authors carry only a name
    name: Option<String>,
}

impl CRAuthor {
    fn display_name(&self) -> String {
        let given = self.given.as_deref().unwrap_or("");
        let family = self.family.as_deref().unwrap_or("");

        if given.is_empty() && family.is_empty() {
            return self.name.clone().unwrap_or_default();
        }

        format!("{} {}", given, family).trim().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl CRDate {
    /// First date-parts sequence, or None when it carries no parts
    fn first_parts(&self) -> Option<Vec<i32>> {
        let parts: Vec<i32> = self.date_parts.first()?.iter().flatten().copied().collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }
}
