//! End-to-end tests wiring the real clients to a mocked upstream.
//!
//! A single mockito server stands in for PubMed, Crossref and bioRxiv; their
//! paths do not overlap.

use litmerge::config::Config;
use litmerge::models::{SourceType, NO_DOI_MESSAGE, RETRIEVAL_FAILED_MESSAGE, TITLE_UNAVAILABLE};
use litmerge::sources::{
    BiorxivSource, CollectionClient, DetailClient, ErrorKind, PubMedSource, ServerType,
    SourceError,
};
use litmerge::utils::HttpClient;
use litmerge::Aggregator;
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

const ARTICLE_WITH_DOI: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation><PMID>111</PMID><Article>
      <ArticleTitle>Tumour <sup>suppressor</sup> signalling</ArticleTitle>
    </Article></MedlineCitation>
    <PubmedData><ArticleIdList>
      <ArticleId IdType="pubmed">111</ArticleId>
      <ArticleId IdType="doi">10.1/a</ArticleId>
    </ArticleIdList></PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

const ARTICLE_WITHOUT_DOI: &str = r#"<PubmedArticleSet><PubmedArticle>
    <MedlineCitation><PMID>222</PMID><Article>
      <ArticleTitle>No identifier here</ArticleTitle>
    </Article></MedlineCitation>
    <PubmedData><ArticleIdList><ArticleId IdType="pubmed">222</ArticleId></ArticleIdList></PubmedData>
  </PubmedArticle></PubmedArticleSet>"#;

const WORK_JSON: &str = r#"{"status": "ok", "message": {
    "title": ["T"],
    "author": [{"given": "A", "family": "B"}],
    "container-title": ["J"],
    "published": {"date-parts": [[2020, 1, 1]]},
    "abstract": "<jats:p>x</jats:p>"
}}"#;

const LISTING_JSON: &str = r#"{"messages": [{"status": "ok"}], "collection": [
    {"title": "S1", "doi": "10.1101/s1", "category": "cancer biology"},
    {"title": "Soil microbiome dynamics", "doi": "10.1101/s2", "category": "ecology"}
]}"#;

fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.pubmed.base_url = server.url();
    config.crossref.base_url = server.url();
    config.biorxiv.base_url = server.url();
    config.http.timeout_secs = 2;
    config
}

async fn mock_search(server: &mut ServerGuard, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::UrlEncoded("term".into(), "cancer".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_article(server: &mut ServerGuard, pmid: &str, xml: &str) -> mockito::Mock {
    server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), pmid.into()))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(xml)
        .create_async()
        .await
}

#[tokio::test]
async fn test_keyword_query_end_to_end() {
    let mut server = Server::new_async().await;

    let _search = mock_search(&mut server, r#"{"esearchresult":{"idlist":["111","222"]}}"#).await;
    let _a = mock_article(&mut server, "111", ARTICLE_WITH_DOI).await;
    let _b = mock_article(&mut server, "222", ARTICLE_WITHOUT_DOI).await;
    let work = server
        .mock("GET", Matcher::Regex(r"^/works/".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(WORK_JSON)
        .expect(1)
        .create_async()
        .await;
    let _listing = server
        .mock("GET", Matcher::Regex(r"^/details/biorxiv/".to_string()))
        .with_status(200)
        .with_body(LISTING_JSON)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator.search("cancer").await;

    work.assert_async().await;
    assert_eq!(result.len(), 3);

    let first = &result.papers[0];
    assert_eq!(first.record.identifier, "111");
    assert_eq!(first.record.title, "Tumour suppressor signalling");
    assert_eq!(first.record.doi.as_deref(), Some("10.1/a"));
    let metadata = first.metadata.as_ref().unwrap();
    assert_eq!(metadata.title, "T");
    assert_eq!(metadata.authors, vec!["A B"]);
    assert_eq!(metadata.journal, "J");
    assert_eq!(metadata.published, vec![2020, 1, 1]);
    assert_eq!(metadata.r#abstract, "x");

    let second = &result.papers[1];
    assert_eq!(second.record.identifier, "222");
    assert_eq!(
        second.metadata.as_ref().map(|m| m.r#abstract.as_str()),
        Some(NO_DOI_MESSAGE)
    );

    let third = &result.papers[2];
    assert_eq!(third.record.title, "S1");
    assert_eq!(third.record.link, "https://doi.org/10.1101/s1");
    assert_eq!(third.record.source, SourceType::BioRxiv);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["papers"][0]["source"], "pubmed");
    assert_eq!(json["papers"][0]["metadata"]["abstract"], "x");
    assert!(json["papers"][2].get("metadata").is_none());
}

#[tokio::test]
async fn test_everything_down_still_answers() {
    let mut server = Server::new_async().await;
    let _all = server
        .mock("GET", Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator.search("cancer").await;

    assert_eq!(result.len(), 1);
    assert!(result.papers[0].record.is_unavailable());
    assert_eq!(result.papers[0].record.title, "bioRxiv data unavailable");
}

#[tokio::test]
async fn test_crossref_outage_marks_failure() {
    let mut server = Server::new_async().await;

    let _search = mock_search(&mut server, r#"{"esearchresult":{"idlist":["111"]}}"#).await;
    let _a = mock_article(&mut server, "111", ARTICLE_WITH_DOI).await;
    let _works = server
        .mock("GET", Matcher::Regex(r"^/works/".to_string()))
        .with_status(503)
        .create_async()
        .await;
    let _listing = server
        .mock("GET", Matcher::Regex(r"^/details/".to_string()))
        .with_status(200)
        .with_body(r#"{"collection": []}"#)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator.search("cancer").await;

    assert_eq!(result.len(), 1);
    assert_eq!(
        result.papers[0]
            .metadata
            .as_ref()
            .map(|m| m.r#abstract.as_str()),
        Some(RETRIEVAL_FAILED_MESSAGE)
    );
}

#[tokio::test]
async fn test_medrxiv_server_from_config() {
    let mut server = Server::new_async().await;
    let _search = mock_search(&mut server, r#"{"esearchresult":{"idlist":[]}}"#).await;
    let listing = server
        .mock("GET", Matcher::Regex(r"^/details/medrxiv/".to_string()))
        .with_status(200)
        .with_body(r#"{"collection": [{"title": "M1", "category": "Cancer Epidemiology"}]}"#)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.biorxiv.server = ServerType::MedRxiv;

    let result = Aggregator::from_config(&config).unwrap().search("cancer").await;

    listing.assert_async().await;
    assert_eq!(result.len(), 1);
    assert_eq!(result.papers[0].record.source, SourceType::MedRxiv);
    assert_eq!(result.papers[0].record.link, "No link");
}

/// An upstream that accepts connections and never answers
async fn silent_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_stalled_upstream_times_out_per_call() {
    let base_url = silent_upstream().await;
    let client = Arc::new(HttpClient::new(Duration::from_secs(1)).unwrap());

    let started = Instant::now();
    let detail = PubMedSource::new(Arc::clone(&client))
        .base_url(&base_url)
        .fetch_detail("111")
        .await;
    assert!(started.elapsed() < Duration::from_secs(3));

    assert!(matches!(detail.error(), Some(SourceError::Timeout(_))));
    assert_eq!(
        detail.error().map(SourceError::kind),
        Some(ErrorKind::TransportFailure)
    );
    let detail = detail.into_value();
    assert_eq!(detail.record.title, TITLE_UNAVAILABLE);
    assert!(detail.cross_reference.is_absent());

    let started = Instant::now();
    let listing = BiorxivSource::new(client, ServerType::BioRxiv)
        .base_url(&base_url)
        .collect("cancer")
        .await;
    assert!(started.elapsed() < Duration::from_secs(3));

    assert!(matches!(listing.error(), Some(SourceError::Timeout(_))));
    let records = listing.into_value();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_unavailable());
}

#[tokio::test]
async fn test_stalled_upstreams_do_not_block_the_query() {
    let base_url = silent_upstream().await;
    let mut config = Config::default();
    config.pubmed.base_url = base_url.clone();
    config.crossref.base_url = base_url.clone();
    config.biorxiv.base_url = base_url;
    config.http.timeout_secs = 1;

    let aggregator = Aggregator::from_config(&config).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(3), aggregator.search("cancer"))
        .await
        .expect("query should finish once the per-call timeout fires");

    assert_eq!(result.len(), 1);
    assert!(result.papers[0].record.is_unavailable());
    assert_eq!(result.papers[0].record.source, SourceType::BioRxiv);
}
