//! Utility modules shared by the clients and the service shell.
//!
//! - [`HttpClient`]: reqwest wrapper with a bounded per-request timeout and
//!   status classification
//! - [`strip_markup`]: reduce HTML/JATS fragments to plain text
//! - [`validate_query`] / [`validate_doi`]: query parameter checks for the shell
//!
//! # Markup stripping
//!
//! ```rust
//! use litmerge::utils::strip_markup;
//!
//! assert_eq!(strip_markup("<jats:p>Hello <b>world</b></jats:p>"), "Hello world");
//! ```

mod http;
mod markup;
mod validate;

pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use markup::{normalize_whitespace, strip_markup};
pub use validate::{normalize_doi, validate_doi, validate_query, ValidationError};
