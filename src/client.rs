//! Results API integration

use crate::data::{Benchmark, ResultsPage};
use crate::error::{Error, Result};
use crate::query::{BenchmarkKey, ResultsKey};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default API root
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Where the remote values come from
pub trait DataSource {
    /// `GET /benchmarks/{id}`
    fn fetch_benchmark(&self, key: &BenchmarkKey) -> Result<Benchmark>;

    /// `GET /results` with pagination and benchmark filters
    fn fetch_results_page(&self, key: &ResultsKey) -> Result<ResultsPage>;
}

/// API client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://perf.example.org/api/v1`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("result-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Blocking HTTP client for the results API
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: url::Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| Error::ConfigError("Invalid user agent".to_string()))?,
        );

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    /// Build an endpoint URL below the API root
    fn endpoint(&self, segments: &[&str]) -> Result<url::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ConfigError(format!("API URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: url::Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorResponse>()
                .ok()
                .and_then(|body| body.message)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            return Err(Error::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json()?)
    }
}

impl DataSource for ApiClient {
    fn fetch_benchmark(&self, key: &BenchmarkKey) -> Result<Benchmark> {
        let url = self.endpoint(&["benchmarks", key.id()])?;
        self.get_json(url)
    }

    fn fetch_results_page(&self, key: &ResultsKey) -> Result<ResultsPage> {
        let mut url = self.endpoint(&["results"])?;
        url.query_pairs_mut().extend_pairs(key.query_params());
        self.get_json(url)
    }
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Parse and check an API root URL
pub fn parse_base_url(base_url: &str) -> Result<url::Url> {
    let url = url::Url::parse(base_url.trim())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::ConfigError(format!(
            "API URL must be an http(s) URL: {}",
            base_url
        )));
    }
    Ok(url)
}
