//! HTTP service shell over the [`Aggregator`].
//!
//! Routes:
//!
//! - `GET /search_papers?keyword=<kw>` returns `{"papers": [...]}`
//! - `GET /paper_metadata?doi=<doi>` returns one metadata object
//! - `GET /health` returns `{"status": "ok"}`

mod error;
mod handlers;

pub use error::ApiError;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregator::Aggregator;

/// State shared by every handler
pub type SharedAggregator = Arc<Aggregator>;

/// Build the router with tracing and CORS middleware
pub fn build_router(aggregator: SharedAggregator) -> Router {
    Router::new()
        .route("/search_papers", get(handlers::search_papers))
        .route("/paper_metadata", get(handlers::paper_metadata))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(aggregator)
}

/// Bind `addr` and serve until ctrl-c
pub async fn serve(addr: SocketAddr, aggregator: SharedAggregator) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("litmerge listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutting down");
}
