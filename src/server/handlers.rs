use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, SharedAggregator};
use crate::models::{AggregateResult, Metadata};
use crate::utils::{validate_doi, validate_query};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataParams {
    pub doi: Option<String>,
}

/// GET /search_papers
pub async fn search_papers(
    State(aggregator): State<SharedAggregator>,
    Query(params): Query<SearchParams>,
) -> Result<Json<AggregateResult>, ApiError> {
    let keyword = validate_query("keyword", params.keyword.as_deref())?;
    Ok(Json(aggregator.search(&keyword).await))
}

/// GET /paper_metadata
pub async fn paper_metadata(
    State(aggregator): State<SharedAggregator>,
    Query(params): Query<MetadataParams>,
) -> Result<Json<Metadata>, ApiError> {
    let doi = validate_doi(params.doi.as_deref())?;
    Ok(Json(aggregator.lookup_doi(&doi).await))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
