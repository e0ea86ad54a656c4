//! Aggregation pipeline tests driven by the counting test doubles.

use async_trait::async_trait;
use litmerge::models::{
    ArticleDetail, CrossReference, Metadata, SourceRecord, SourceType, NO_DOI_MESSAGE,
    RETRIEVAL_FAILED_MESSAGE, TITLE_UNAVAILABLE,
};
use litmerge::sources::mock::{
    make_record, MockCollectionClient, MockDetailClient, MockMetadataClient, MockSearchClient,
};
use litmerge::sources::{DetailClient, Fetched};
use litmerge::Aggregator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn sample_metadata() -> Metadata {
    Metadata {
        title: "T".to_string(),
        authors: vec!["A B".to_string()],
        journal: "J".to_string(),
        published: vec![2020, 1, 1],
        r#abstract: "x".to_string(),
    }
}

#[tokio::test]
async fn test_keyword_query_merges_primary_and_secondary() {
    let search = Arc::new(MockSearchClient::new(&["111", "222"]));
    let detail = Arc::new(
        MockDetailClient::new()
            .with_article("111", "First", Some("10.1/a"))
            .with_article("222", "Second", None),
    );
    let metadata = Arc::new(MockMetadataClient::new().with_work("10.1/a", sample_metadata()));
    let collection = Arc::new(MockCollectionClient::new(
        SourceType::BioRxiv,
        vec![make_record("S1", "L1", SourceType::BioRxiv)],
    ));

    let aggregator = Aggregator::new(search, detail, metadata.clone()).with_collection(collection);
    let result = aggregator.search("cancer").await;

    assert_eq!(result.len(), 3);

    let first = &result.papers[0];
    assert_eq!(first.record.title, "First");
    assert_eq!(first.record.link, "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert_eq!(first.metadata.as_ref(), Some(&sample_metadata()));

    let second = &result.papers[1];
    assert_eq!(second.record.title, "Second");
    let skipped = second.metadata.as_ref().unwrap();
    assert!(skipped.is_skipped());
    assert_eq!(skipped.r#abstract, NO_DOI_MESSAGE);

    let third = &result.papers[2];
    assert_eq!(third.record.title, "S1");
    assert_eq!(third.record.link, "L1");
    assert_eq!(third.record.source, SourceType::BioRxiv);
    assert!(third.metadata.is_none());

    // only the record carrying a DOI reaches the metadata source
    assert_eq!(metadata.lookups(), 1);
}

#[tokio::test]
async fn test_zero_identifiers_still_returns_secondary() {
    let detail = Arc::new(MockDetailClient::new());
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&[])),
        detail.clone(),
        Arc::new(MockMetadataClient::new()),
    )
    .with_collection(Arc::new(MockCollectionClient::new(
        SourceType::BioRxiv,
        vec![
            make_record("S1", "L1", SourceType::BioRxiv),
            make_record("S2", "L2", SourceType::BioRxiv),
        ],
    )));

    let result = aggregator.search("nothing matches").await;

    assert_eq!(result.len(), 2);
    assert_eq!(detail.calls(), 0);
}

#[tokio::test]
async fn test_no_identifier_records_skip_lookup_entirely() {
    let metadata = Arc::new(MockMetadataClient::new());
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&["1", "2", "3"])),
        Arc::new(
            MockDetailClient::new()
                .with_article("1", "a", None)
                .with_article("2", "b", Some("   "))
                .with_article("3", "c", None),
        ),
        metadata.clone(),
    );

    let result = aggregator.search("q").await;

    assert_eq!(result.len(), 3);
    assert!(result
        .iter()
        .all(|e| e.metadata.as_ref().is_some_and(Metadata::is_skipped)));
    assert_eq!(metadata.lookups(), 0);
}

#[tokio::test]
async fn test_failed_lookup_is_distinct_from_skip() {
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&["1", "2"])),
        Arc::new(
            MockDetailClient::new()
                .with_article("1", "a", Some("10.9/missing"))
                .with_article("2", "b", None),
        ),
        Arc::new(MockMetadataClient::new()),
    );

    let result = aggregator.search("q").await;

    let failed = result.papers[0].metadata.as_ref().unwrap();
    let skipped = result.papers[1].metadata.as_ref().unwrap();
    assert_eq!(failed.r#abstract, RETRIEVAL_FAILED_MESSAGE);
    assert_eq!(skipped.r#abstract, NO_DOI_MESSAGE);
    assert_ne!(failed, skipped);
}

#[tokio::test]
async fn test_detail_failure_is_isolated() {
    let metadata = Arc::new(MockMetadataClient::new().with_work("10.1/a", sample_metadata()));
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&["1", "broken", "3"])),
        Arc::new(
            MockDetailClient::new()
                .with_article("1", "a", Some("10.1/a"))
                .with_article("3", "c", None),
        ),
        metadata.clone(),
    );

    let result = aggregator.search("q").await;

    assert_eq!(result.len(), 3);
    let broken = &result.papers[1];
    assert_eq!(broken.record.identifier, "broken");
    assert_eq!(broken.record.title, TITLE_UNAVAILABLE);
    assert!(broken.metadata.as_ref().unwrap().is_skipped());
    assert_eq!(result.papers[2].record.title, "c");
    assert_eq!(metadata.lookups(), 1);
}

#[tokio::test]
async fn test_order_follows_search_not_completion() {
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&["slow", "fast", "medium"])),
        Arc::new(
            MockDetailClient::new()
                .with_article("slow", "slow", None)
                .with_article("fast", "fast", None)
                .with_article("medium", "medium", None)
                .with_delay("slow", Duration::from_millis(80))
                .with_delay("medium", Duration::from_millis(30)),
        ),
        Arc::new(MockMetadataClient::new()),
    )
    .max_concurrent(3);

    let result = aggregator.search("q").await;

    let titles: Vec<&str> = result.iter().map(|e| e.record.title.as_str()).collect();
    assert_eq!(titles, vec!["slow", "fast", "medium"]);
}

#[tokio::test]
async fn test_unreachable_secondary_yields_one_sentinel() {
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&["1"])),
        Arc::new(MockDetailClient::new().with_article("1", "a", None)),
        Arc::new(MockMetadataClient::new()),
    )
    .with_collection(Arc::new(MockCollectionClient::unreachable(
        SourceType::BioRxiv,
    )));

    let result = aggregator.search("q").await;

    assert_eq!(result.len(), 2);
    let sentinel = &result.papers[1].record;
    assert!(sentinel.is_unavailable());
    assert_eq!(sentinel.title, "bioRxiv data unavailable");
    assert_eq!(sentinel.source, SourceType::BioRxiv);
    assert!(sentinel.error.is_some());
}

#[tokio::test]
async fn test_search_unavailable_keeps_secondary() {
    let detail = Arc::new(MockDetailClient::new());
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::unavailable()),
        detail.clone(),
        Arc::new(MockMetadataClient::new()),
    )
    .with_collection(Arc::new(MockCollectionClient::new(
        SourceType::MedRxiv,
        vec![make_record("M1", "L", SourceType::MedRxiv)],
    )));

    let result = aggregator.search("q").await;

    assert_eq!(result.len(), 1);
    assert_eq!(result.papers[0].record.source, SourceType::MedRxiv);
    assert_eq!(detail.calls(), 0);
}

#[tokio::test]
async fn test_secondary_sources_concatenate_in_registration_order() {
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&[])),
        Arc::new(MockDetailClient::new()),
        Arc::new(MockMetadataClient::new()),
    )
    .with_collection(Arc::new(MockCollectionClient::new(
        SourceType::BioRxiv,
        vec![make_record("B", "L", SourceType::BioRxiv)],
    )))
    .with_collection(Arc::new(MockCollectionClient::new(
        SourceType::MedRxiv,
        vec![make_record("M", "L", SourceType::MedRxiv)],
    )));

    let result = aggregator.search("q").await;

    let titles: Vec<&str> = result.iter().map(|e| e.record.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "M"]);
    assert_eq!(result.from_source(&SourceType::MedRxiv).count(), 1);
}

/// Detail client recording the peak number of concurrent fetches
#[derive(Debug, Default)]
struct PeakTracker {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl DetailClient for PeakTracker {
    async fn fetch_detail(&self, identifier: &str) -> Fetched<ArticleDetail> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let record = SourceRecord::new(identifier, identifier, "", SourceType::PubMed);
        Fetched::Ok(ArticleDetail::new(record, CrossReference::Absent))
    }
}

#[tokio::test]
async fn test_fan_out_is_bounded() {
    let ids: Vec<String> = (0..12).map(|i| i.to_string()).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let tracker = Arc::new(PeakTracker::default());

    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&id_refs)),
        tracker.clone(),
        Arc::new(MockMetadataClient::new()),
    )
    .max_concurrent(3);

    let result = aggregator.search("q").await;

    assert_eq!(result.len(), 12);
    assert!(tracker.peak.load(Ordering::SeqCst) <= 3);
    assert!(tracker.peak.load(Ordering::SeqCst) >= 2);
    let ids_out: Vec<&str> = result.iter().map(|e| e.record.identifier.as_str()).collect();
    assert_eq!(ids_out, id_refs);
}

#[tokio::test]
async fn test_lookup_doi_passes_through() {
    let aggregator = Aggregator::new(
        Arc::new(MockSearchClient::new(&[])),
        Arc::new(MockDetailClient::new()),
        Arc::new(MockMetadataClient::new().with_work("10.1/a", sample_metadata())),
    );

    assert_eq!(aggregator.lookup_doi("10.1/a").await, sample_metadata());
    assert!(aggregator.lookup_doi("10.1/b").await.is_failed());
}
