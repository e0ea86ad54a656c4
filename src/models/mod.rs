//! Core data models for source records, metadata and aggregated results.

mod aggregate;
mod metadata;
mod record;

pub use aggregate::{AggregateEntry, AggregateResult};
pub use metadata::{Metadata, NO_DOI_MESSAGE, RETRIEVAL_FAILED_MESSAGE};
pub use record::{
    ArticleDetail, CrossReference, SourceRecord, SourceType, NO_LINK, NO_TITLE,
    TITLE_UNAVAILABLE,
};
