//! Browse query state and the cache keys derived from it

use crate::data::Benchmark;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default number of results per page
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Query string parameter naming the benchmark to browse
const BENCHMARK_PARAM: &str = "benchmark";

/// What the operator is browsing: benchmark scope, page position and filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowseQueryState {
    /// Requested benchmark id, empty for an unscoped browse
    pub benchmark_id: String,
    /// 1-based page number
    pub page: u32,
    /// Results per page
    pub per_page: u32,
    /// Extra query parameters forwarded to the results endpoint
    pub filters: BTreeMap<String, String>,
}

impl Default for BrowseQueryState {
    fn default() -> Self {
        Self {
            benchmark_id: String::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            filters: BTreeMap::new(),
        }
    }
}

impl BrowseQueryState {
    /// Seed the state from a browse URL query string (`?benchmark=<id>` or `benchmark=<id>`)
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let benchmark_id = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == BENCHMARK_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        Self {
            benchmark_id,
            ..Self::default()
        }
    }

    /// Seed the state from a full browse URL
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)?;
        Ok(Self::from_query_string(parsed.query().unwrap_or("")))
    }

    /// Whether a specific benchmark was requested
    pub fn is_scoped(&self) -> bool {
        !self.benchmark_id.is_empty()
    }

    /// Cache key of the benchmark fetch, if one is needed
    pub fn benchmark_key(&self) -> Option<BenchmarkKey> {
        self.is_scoped()
            .then(|| BenchmarkKey(self.benchmark_id.clone()))
    }

    /// Cache key of the results fetch, given the resolved benchmark (if any).
    ///
    /// A scoped browse always carries its benchmark id, so results of an
    /// unscoped browse are never served for a benchmark that has not loaded.
    pub fn results_key(&self, benchmark: Option<&Benchmark>) -> ResultsKey {
        ResultsKey {
            benchmark_id: self.is_scoped().then(|| self.benchmark_id.clone()),
            per_page: self.per_page,
            page: self.page,
            docker_image: benchmark.map(|b| b.docker_image.clone()),
            docker_tag: benchmark.map(|b| b.docker_tag.clone()),
            filters: self.filters.clone(),
        }
    }
}

/// Validate a 1-based page number
pub fn validate_page(page: u32) -> Result<u32> {
    if page == 0 {
        return Err(Error::InvalidQuery("page numbers start at 1".to_string()));
    }
    Ok(page)
}

/// Validate a page size
pub fn validate_per_page(per_page: u32) -> Result<u32> {
    if per_page == 0 {
        return Err(Error::InvalidQuery(
            "results per page must be greater than 0".to_string(),
        ));
    }
    Ok(per_page)
}

/// Cache key of a benchmark fetch: the benchmark id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BenchmarkKey(pub String);

impl BenchmarkKey {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BenchmarkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "benchmark-{}", self.0)
    }
}

/// Cache key of a results page fetch.
///
/// Compared field by field, so `per_page=1, page=23` and `per_page=12, page=3`
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResultsKey {
    /// Requested benchmark, `None` for an unscoped browse
    pub benchmark_id: Option<String>,
    pub per_page: u32,
    pub page: u32,
    pub docker_image: Option<String>,
    pub docker_tag: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ResultsKey {
    /// Query parameters for the results endpoint, unset filters omitted
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("per_page".to_string(), self.per_page.to_string()),
            ("page".to_string(), self.page.to_string()),
        ];
        if let Some(image) = &self.docker_image {
            params.push(("docker_image".to_string(), image.clone()));
        }
        if let Some(tag) = &self.docker_tag {
            params.push(("docker_tag".to_string(), tag.clone()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

impl std::fmt::Display for ResultsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "results(per_page={}, page={}", self.per_page, self.page)?;
        if let Some(id) = &self.benchmark_id {
            write!(f, ", benchmark={}", id)?;
        }
        if let (Some(image), Some(tag)) = (&self.docker_image, &self.docker_tag) {
            write!(f, ", image={}:{}", image, tag)?;
        }
        for (key, value) in &self.filters {
            write!(f, ", {}={}", key, value)?;
        }
        write!(f, ")")
    }
}
