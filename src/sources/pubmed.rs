//! PubMed search and detail source using the E-utilities API.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::PubMedConfig;
use crate::models::{ArticleDetail, CrossReference, SourceRecord, SourceType, TITLE_UNAVAILABLE};
use crate::sources::{DetailClient, Fetched, SearchClient, SourceError};
use crate::utils::{strip_markup, HttpClient};

/// PubMed E-utilities API base URL
pub const PUBMED_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// PubMed ESearch/EFetch client
///
/// Uses ESearch (JSON) for keyword search and EFetch (XML) for per-PMID
/// detail documents.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    max_results: usize,
}

impl PubMedSource {
    /// Create a PubMed source against the public E-utilities endpoint
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: PUBMED_EUTILS_URL.to_string(),
            max_results: 5,
        }
    }

    pub fn from_config(config: &PubMedConfig, client: Arc<HttpClient>) -> Self {
        Self::new(client)
            .base_url(&config.base_url)
            .max_results(config.max_results)
    }

    /// Override the E-utilities base URL (for testing)
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Public landing page for a PMID
    pub fn article_url(pmid: &str) -> String {
        format!("{}/{}/", PUBMED_ARTICLE_URL, pmid)
    }

    /// Build ESearch URL
    fn build_search_url(&self, keyword: &str) -> String {
        let params = [
            ("db", "pubmed".to_string()),
            ("term", keyword.to_string()),
            ("retmode", "json".to_string()),
            ("retmax", self.max_results.to_string()),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/esearch.fcgi?{}", self.base_url, query)
    }

    /// Build EFetch URL for a single PMID
    fn build_fetch_url(&self, pmid: &str) -> String {
        format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml",
            self.base_url,
            urlencoding::encode(pmid)
        )
    }

    /// Parse ESearch JSON into the identifier list
    fn parse_search_response(json: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ESearchResponse {
            esearchresult: Option<ESearchResult>,
            error: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct ESearchResult {
            idlist: Option<Vec<String>>,
            #[serde(rename = "ERROR")]
            error: Option<String>,
        }

        let response: ESearchResponse = serde_json::from_str(json)?;

        let result = match (response.esearchresult, response.error) {
            (Some(result), _) => result,
            (None, Some(error)) => return Err(SourceError::Api(error)),
            (None, None) => return Err(SourceError::MissingField("esearchresult".to_string())),
        };

        match (result.idlist, result.error) {
            (Some(ids), _) => Ok(ids),
            (None, Some(error)) => Err(SourceError::Api(error)),
            (None, None) => Err(SourceError::MissingField("esearchresult.idlist".to_string())),
        }
    }

    /// Parse an EFetch document for one PMID.
    ///
    /// The DOI comes from `PubmedData/ArticleIdList`, falling back to the
    /// article's `ELocationID`. Article IDs inside the reference list belong to
    /// cited works and are ignored.
    fn parse_fetch_response(pmid: &str, xml: &str) -> Result<ArticleDetail, SourceError> {
        let mut reader = Reader::from_str(xml);

        let mut found_article = false;
        let mut in_title = false;
        let mut in_reference = false;
        let mut in_article_id_doi = false;
        let mut in_elocation_doi = false;

        let mut title = String::new();
        let mut article_id_doi: Option<String> = None;
        let mut elocation_doi: Option<String> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"PubmedArticle" | b"PubmedBookArticle" => {
                        if found_article {
                            // one PMID per request; ignore anything after the first article
                            break;
                        }
                        found_article = true;
                    }
                    b"ArticleTitle" => in_title = true,
                    b"Reference" => in_reference = true,
                    b"ArticleId" => {
                        in_article_id_doi = !in_reference && has_attr(e, b"IdType", b"doi")
                    }
                    b"ELocationID" => in_elocation_doi = has_attr(e, b"EIdType", b"doi"),
                    _ => {}
                },
                Event::End(ref e) => match e.name().as_ref() {
                    b"ArticleTitle" => in_title = false,
                    b"Reference" => in_reference = false,
                    b"ArticleId" => in_article_id_doi = false,
                    b"ELocationID" => in_elocation_doi = false,
                    _ => {}
                },
                Event::Text(ref e) => {
                    if !(in_title || in_article_id_doi || in_elocation_doi) {
                        continue;
                    }
                    let text = e.unescape()?;
                    if in_title {
                        title.push_str(&text);
                    } else if in_article_id_doi && article_id_doi.is_none() {
                        article_id_doi = Some(text.trim().to_string());
                    } else if in_elocation_doi && elocation_doi.is_none() {
                        elocation_doi = Some(text.trim().to_string());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !found_article {
            return Err(SourceError::NotFound(format!(
                "PubMed returned no article for PMID {}",
                pmid
            )));
        }

        let title = strip_markup(&title);
        let title = if title.is_empty() {
            tracing::debug!(pmid, "PubMed article has no title");
            TITLE_UNAVAILABLE.to_string()
        } else {
            title
        };

        let doi = article_id_doi
            .filter(|d| !d.is_empty())
            .or(elocation_doi);

        let record = SourceRecord::new(pmid, title, Self::article_url(pmid), SourceType::PubMed);

        Ok(ArticleDetail::new(
            record,
            CrossReference::from_doi(doi.as_deref()),
        ))
    }

    async fn try_search(&self, keyword: &str) -> Result<Vec<String>, SourceError> {
        let url = self.build_search_url(keyword);
        let json = self.client.get_text(&url, "PubMed").await?;

        let mut ids = Self::parse_search_response(&json)?;
        ids.truncate(self.max_results);

        tracing::debug!(keyword, count = ids.len(), "PubMed search returned identifiers");
        Ok(ids)
    }

    async fn try_fetch(&self, pmid: &str) -> Result<ArticleDetail, SourceError> {
        let url = self.build_fetch_url(pmid);
        let xml = self.client.get_text(&url, "PubMed").await?;
        Self::parse_fetch_response(pmid, &xml)
    }
}

fn has_attr(e: &BytesStart<'_>, key: &[u8], value: &[u8]) -> bool {
    e.attributes()
        .flatten()
        .any(|a| a.key.as_ref() == key && a.value.as_ref().eq_ignore_ascii_case(value))
}

#[async_trait]
impl SearchClient for PubMedSource {
    fn source(&self) -> SourceType {
        SourceType::PubMed
    }

    async fn search_ids(&self, keyword: &str) -> Fetched<Vec<String>> {
        Fetched::from_result(self.try_search(keyword).await, |_| Vec::new())
    }
}

#[async_trait]
impl DetailClient for PubMedSource {
    async fn fetch_detail(&self, identifier: &str) -> Fetched<ArticleDetail> {
        Fetched::from_result(self.try_fetch(identifier).await, |_| {
            ArticleDetail::placeholder(identifier, Self::article_url(identifier), SourceType::PubMed)
        })
    }
}
