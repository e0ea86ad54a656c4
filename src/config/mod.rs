//! Configuration management.
//!
//! Configuration is read from a TOML file and overridden by `LITMERGE_`
//! environment variables, with `__` separating sections from keys.
//!
//! # Configuration File Format
//!
//! ```toml
//! [pubmed]
//! base_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//! max_results = 5
//!
//! [crossref]
//! base_url = "https://api.crossref.org"
//! mailto = "you@example.org"
//!
//! [biorxiv]
//! base_url = "https://api.biorxiv.org"
//! server = "biorxiv"
//! interval_days = 30
//! max_results = 10
//!
//! [http]
//! timeout_secs = 5
//! max_concurrent_requests = 5
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! ```
//!
//! Environment example: `LITMERGE_HTTP__TIMEOUT_SECS=3`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{ServerType, BIORXIV_API_URL, CROSSREF_API_BASE, PUBMED_EUTILS_URL};
use crate::utils::DEFAULT_TIMEOUT;

const CONFIG_FILE_NAME: &str = "litmerge.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pubmed: PubMedConfig,

    #[serde(default)]
    pub crossref: CrossRefConfig,

    #[serde(default)]
    pub biorxiv: BiorxivConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Primary search source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubMedConfig {
    #[serde(default = "default_pubmed_url")]
    pub base_url: String,

    /// Maximum identifiers taken from one search
    #[serde(default = "default_pubmed_max_results")]
    pub max_results: usize,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: default_pubmed_url(),
            max_results: default_pubmed_max_results(),
        }
    }
}

fn default_pubmed_url() -> String {
    PUBMED_EUTILS_URL.to_string()
}

fn default_pubmed_max_results() -> usize {
    5
}

/// DOI metadata source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefConfig {
    #[serde(default = "default_crossref_url")]
    pub base_url: String,

    /// Contact address sent in the polite-pool User-Agent
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for CrossRefConfig {
    fn default() -> Self {
        Self {
            base_url: default_crossref_url(),
            mailto: None,
        }
    }
}

fn default_crossref_url() -> String {
    CROSSREF_API_BASE.to_string()
}

/// Secondary collection source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiorxivConfig {
    #[serde(default = "default_biorxiv_url")]
    pub base_url: String,

    #[serde(default)]
    pub server: ServerType,

    /// Days of postings covered by one listing
    #[serde(default = "default_interval_days")]
    pub interval_days: u32,

    #[serde(default = "default_biorxiv_max_results")]
    pub max_results: usize,
}

impl Default for BiorxivConfig {
    fn default() -> Self {
        Self {
            base_url: default_biorxiv_url(),
            server: ServerType::default(),
            interval_days: default_interval_days(),
            max_results: default_biorxiv_max_results(),
        }
    }
}

fn default_biorxiv_url() -> String {
    BIORXIV_API_URL.to_string()
}

fn default_interval_days() -> u32 {
    30
}

fn default_biorxiv_max_results() -> usize {
    10
}

/// Upstream HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum in-flight per-identifier fetches
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_concurrent() -> usize {
    5
}

/// HTTP shell settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("LITMERGE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env_source())
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from the environment only
pub fn load_from_env() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(env_source())
        .build()?
        .try_deserialize()
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("litmerge").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pubmed.max_results, 5);
        assert_eq!(config.http.timeout(), Duration::from_secs(5));
        assert_eq!(config.http.max_concurrent_requests, 5);
        assert_eq!(config.biorxiv.server, ServerType::BioRxiv);
        assert_eq!(config.server.port, 8000);
        assert!(config.crossref.base_url.starts_with("https://api.crossref.org"));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("litmerge.toml");

        let toml_content = r#"
[pubmed]
max_results = 8

[crossref]
mailto = "lab@example.org"

[biorxiv]
server = "medrxiv"
interval_days = 7

[http]
timeout_secs = 3
"#;

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.pubmed.max_results, 8);
        assert_eq!(config.crossref.mailto.as_deref(), Some("lab@example.org"));
        assert_eq!(config.biorxiv.server, ServerType::MedRxiv);
        assert_eq!(config.biorxiv.interval_days, 7);
        assert_eq!(config.biorxiv.max_results, 10);
        assert_eq!(config.http.timeout_secs, 3);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_config_nonexistent() {
        let result = load_config(Path::new("/nonexistent/litmerge.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_to_toml_round_trips_through_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.port = 9100;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.server.port, 9100);
    }
}
