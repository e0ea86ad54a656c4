//! Input validation for query parameters accepted by the service shell.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("missing required query parameter: {0}")]
    Missing(String),

    #[error("query parameter '{0}' must not be blank")]
    Blank(String),

    #[error("query parameter '{0}' contains control characters")]
    ControlCharacters(String),
}

/// Validate a free-text query parameter.
///
/// Returns the trimmed value, or an error when it is absent, blank, or holds
/// control characters.
pub fn validate_query(name: &str, value: Option<&str>) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::Missing(name.to_string()))?;
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Blank(name.to_string()));
    }

    if value.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters(name.to_string()));
    }

    Ok(value.to_string())
}

/// Strip the `doi:` and resolver URL prefixes users commonly paste.
pub fn normalize_doi(doi: &str) -> String {
    let doi = doi.trim();
    let lower = doi.to_lowercase();

    for prefix in [
        "doi:",
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
    ] {
        if lower.starts_with(prefix) {
            if let Some(rest) = doi.get(prefix.len()..) {
                return rest.trim().to_string();
            }
        }
    }

    doi.to_string()
}

/// Validate and normalize a DOI query parameter
pub fn validate_doi(value: Option<&str>) -> Result<String, ValidationError> {
    let doi = normalize_doi(&validate_query("doi", value)?);
    if doi.is_empty() {
        return Err(ValidationError::Blank("doi".to_string()));
    }
    Ok(doi)
}
