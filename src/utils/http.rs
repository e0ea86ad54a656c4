//! HTTP client utilities.

use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::sources::SourceError;

/// Default per-request timeout for upstream calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP client with a bounded per-request timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with the crate user agent
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Self::with_user_agent(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            timeout,
        )
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// GET a URL and return the body, classifying status failures.
    ///
    /// 404 maps to [`SourceError::NotFound`], any other non-success status to
    /// [`SourceError::Api`].
    pub async fn get_text(&self, url: &str, source_name: &str) -> Result<String, SourceError> {
        tracing::debug!(source = source_name, url, "GET");

        let response = self.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("{} returned 404 for {}", source_name, url)));
        }

        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "{} API returned status: {}",
                source_name, status
            )));
        }

        Ok(response.text().await?)
    }
}
