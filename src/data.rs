//! Data structures returned by the results API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Docker Hub repository page prefix for benchmark images
const DOCKER_HUB_REPOSITORY: &str = "https://hub.docker.com/repository/docker/";

/// A benchmark definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Benchmark {
    /// Benchmark identifier
    pub id: String,
    /// Docker image the benchmark runs in
    pub docker_image: String,
    /// Docker image tag
    pub docker_tag: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Template every uploaded result document follows.
    /// Keys prefixed with `!` mark leaves worth comparing.
    #[serde(default)]
    pub json_template: Value,
}

impl Benchmark {
    /// `image:tag` reference of the benchmark container
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.docker_image, self.docker_tag)
    }

    /// Link to the image on Docker Hub
    pub fn docker_hub_url(&self) -> String {
        format!("{}{}", DOCKER_HUB_REPOSITORY, self.docker_image)
    }
}

/// A single uploaded benchmark result.
///
/// Only `id` is interpreted; everything else is kept verbatim in `fields`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    /// Result identifier
    pub id: String,
    /// Remaining payload fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultItem {
    /// Create a result with no payload
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Attach a payload field
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The uploaded benchmark document.
    ///
    /// Results carry the document under `json`; payloads without one are
    /// treated as the document themselves.
    pub fn document(&self) -> Value {
        match self.fields.get("json") {
            Some(doc @ Value::Object(_)) => doc.clone(),
            _ => Value::Object(self.fields.clone()),
        }
    }

    /// Look up a dotted path inside the uploaded document
    pub fn lookup(&self, path: &str) -> Option<Value> {
        lookup_path(&self.document(), path).cloned()
    }
}

/// Resolve a dotted path through object keys and array indices
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }

    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Load a benchmark template from a JSON file.
///
/// Accepts either a full benchmark document (its `json_template` is used) or
/// a bare template.
pub fn load_template(path: &std::path::Path) -> crate::error::Result<Value> {
    let content =
        std::fs::read_to_string(path).map_err(|e| crate::error::Error::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

    let mut value: Value = serde_json::from_str(&content)?;
    match value.get_mut("json_template") {
        Some(template) => Ok(template.take()),
        None => Ok(value),
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultsPage {
    /// Results on this page, in server order
    #[serde(default)]
    pub items: Vec<ResultItem>,
    /// Total number of results matching the query
    pub total: u64,
    /// 1-based page number
    pub page: u32,
    /// Page size used by the server
    pub per_page: u32,
}

impl ResultsPage {
    /// Number of pages needed for `total` results
    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether the page has anything to show
    pub fn is_empty(&self) -> bool {
        self.total == 0 || self.items.is_empty()
    }
}
