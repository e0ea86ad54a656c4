//! Bibliographic metadata resolved from a DOI.

use serde::{Deserialize, Serialize};

/// Abstract text of the metadata returned when a record has no DOI
pub const NO_DOI_MESSAGE: &str = "No DOI found for this record";

/// Abstract text of the metadata returned when the DOI lookup failed
pub const RETRIEVAL_FAILED_MESSAGE: &str = "Metadata retrieval failed";

/// Bibliographic metadata for one work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,

    /// Display names in publication order ("given family")
    pub authors: Vec<String>,

    pub journal: String,

    /// Date parts, most significant first (year, month, day)
    pub published: Vec<i32>,

    /// Plain-text abstract
    #[serde(rename = "abstract")]
    pub r#abstract: String,
}

impl Metadata {
    /// Canonical value for a record without a cross-reference
    pub fn skipped() -> Self {
        Self {
            r#abstract: NO_DOI_MESSAGE.to_string(),
            ..Default::default()
        }
    }

    /// Canonical value for a lookup that failed upstream
    pub fn failed() -> Self {
        Self {
            r#abstract: RETRIEVAL_FAILED_MESSAGE.to_string(),
            ..Default::default()
        }
    }

    pub fn is_skipped(&self) -> bool {
        *self == Self::skipped()
    }

    pub fn is_failed(&self) -> bool {
        *self == Self::failed()
    }
}
