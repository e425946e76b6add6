//! Result browsing state machine
//!
//! [`ResultBrowser`] coordinates the benchmark resource, the results page
//! resource, the selection and the preview/report slots. It is driven by
//! discrete events: operator actions and fetch completions. Each event
//! returns the fetches that must be issued next; the caller performs them
//! and feeds the outcomes back through [`ResultBrowser::handle_outcome`].
//!
//! The results cache key embeds the requested benchmark id and the resolved
//! docker image and tag, so a
//! change of benchmark, page, page size or filters re-keys the results fetch
//! without further coordination. Results are only fetched for an unscoped
//! browse or once the requested benchmark has loaded.

use crate::data::{Benchmark, ResultItem, ResultsPage};
use crate::error::{Error, Result};
use crate::notable;
use crate::query::{self, BenchmarkKey, BrowseQueryState, ResultsKey, DEFAULT_PER_PAGE};
use crate::resource::{FetchError, RemoteResource, ResourceState};
use crate::selection::SelectionSet;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Browser settings
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Page size used when the browse starts
    pub default_per_page: u32,
    /// Page sizes offered to the operator
    pub per_page_choices: Vec<u32>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            per_page_choices: vec![5, 10, 20, 50, 100],
        }
    }
}

impl BrowserConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_per_page == 0 {
            return Err(Error::ConfigError(
                "default results per page must be greater than 0".to_string(),
            ));
        }
        if self.per_page_choices.contains(&0) {
            return Err(Error::ConfigError(
                "results per page choices must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fetch the controller needs performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Benchmark(BenchmarkKey),
    Results(ResultsKey),
}

/// A finished fetch, addressed by the key it was issued for
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Benchmark(BenchmarkKey, std::result::Result<Benchmark, FetchError>),
    Results(ResultsKey, std::result::Result<ResultsPage, FetchError>),
}

/// A modal target: the last result shown and whether the modal is open
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModalSlot {
    result: Option<ResultItem>,
    open: bool,
}

impl ModalSlot {
    fn show(&mut self, result: &ResultItem) {
        self.result = Some(result.clone());
        self.open = true;
    }

    /// Closing keeps the result around until another one replaces it
    fn close(&mut self) {
        self.open = false;
    }

    pub fn result(&self) -> Option<&ResultItem> {
        self.result.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Controller behind the result search page
#[derive(Debug)]
pub struct ResultBrowser {
    config: BrowserConfig,
    query: BrowseQueryState,
    benchmark: RemoteResource<BenchmarkKey, Benchmark>,
    results: RemoteResource<ResultsKey, ResultsPage>,
    suggestions: HashMap<String, Arc<[String]>>,
    selection: SelectionSet,
    preview: ModalSlot,
    report: ModalSlot,
}

impl ResultBrowser {
    /// Create a browser for `query`. Nothing is fetched until [`ResultBrowser::start`].
    pub fn new(query: BrowseQueryState, config: BrowserConfig) -> Self {
        Self {
            config,
            query,
            benchmark: RemoteResource::new("benchmark"),
            results: RemoteResource::new("results"),
            suggestions: HashMap::new(),
            selection: SelectionSet::new(),
            preview: ModalSlot::default(),
            report: ModalSlot::default(),
        }
    }

    /// Create a browser seeded from the browse URL query string
    pub fn from_query_string(query: &str, config: BrowserConfig) -> Result<Self> {
        config.validate()?;
        let mut state = BrowseQueryState::from_query_string(query);
        state.per_page = config.default_per_page;
        Ok(Self::new(state, config))
    }

    /// Initial fetches
    pub fn start(&mut self) -> Vec<FetchRequest> {
        info!(
            "Browsing results for {}",
            if self.query.is_scoped() {
                self.query.benchmark_id.as_str()
            } else {
                "all benchmarks"
            }
        );
        self.sync()
    }

    /// Re-derive both cache keys from the current state and bind the resources
    fn sync(&mut self) -> Vec<FetchRequest> {
        let mut requests = Vec::new();

        let benchmark_key = self.query.benchmark_key();
        let benchmark_enabled = benchmark_key.is_some();
        if let Some(key) = self.benchmark.bind(benchmark_key, benchmark_enabled) {
            requests.push(FetchRequest::Benchmark(key));
        }
        self.memoize_suggestions();

        let results_enabled = !self.query.is_scoped() || self.benchmark.is_success();
        let resolved = self.resolved_benchmark();
        let results_key = self.query.results_key(resolved);
        if let Some(key) = self.results.bind(Some(results_key), results_enabled) {
            requests.push(FetchRequest::Results(key));
        }

        requests
    }

    fn resolved_benchmark(&self) -> Option<&Benchmark> {
        if self.benchmark.is_success() {
            self.benchmark.data()
        } else {
            None
        }
    }

    fn memoize_suggestions(&mut self) {
        let Some(benchmark) = self.resolved_benchmark() else {
            return;
        };
        if self.suggestions.contains_key(&benchmark.id) {
            return;
        }

        let fields: Arc<[String]> = notable::extract(&benchmark.json_template).into();
        info!(
            "Benchmark {} suggests {} comparison fields",
            benchmark.id,
            fields.len()
        );
        let id = benchmark.id.clone();
        self.suggestions.insert(id, fields);
    }

    /// Feed a finished fetch back; returns the fetches it unlocked
    pub fn handle_outcome(&mut self, outcome: FetchOutcome) -> Vec<FetchRequest> {
        match outcome {
            FetchOutcome::Benchmark(key, result) => {
                if self.benchmark.resolve(&key, result) {
                    self.sync()
                } else {
                    Vec::new()
                }
            }
            FetchOutcome::Results(key, result) => {
                self.results.resolve(&key, result);
                Vec::new()
            }
        }
    }

    /// Navigate to page `page`
    pub fn set_page(&mut self, page: u32) -> Result<Vec<FetchRequest>> {
        self.query.page = query::validate_page(page)?;
        debug!("Page set to {}", page);
        Ok(self.sync())
    }

    /// Change the page size; the browse restarts at page 1
    pub fn set_results_per_page(&mut self, per_page: u32) -> Result<Vec<FetchRequest>> {
        self.query.per_page = query::validate_per_page(per_page)?;
        self.query.page = 1;
        debug!("Results per page set to {}", per_page);
        Ok(self.sync())
    }

    /// Replace the extra result filters; the browse restarts at page 1
    pub fn set_filters(&mut self, filters: BTreeMap<String, String>) -> Vec<FetchRequest> {
        self.query.filters = filters;
        self.query.page = 1;
        self.sync()
    }

    /// Scope the browse to another benchmark (empty for all); the browse restarts at page 1
    pub fn set_benchmark_id(&mut self, benchmark_id: impl Into<String>) -> Vec<FetchRequest> {
        self.query.benchmark_id = benchmark_id.into();
        self.query.page = 1;
        self.sync()
    }

    pub fn refetch_benchmark(&mut self) -> Vec<FetchRequest> {
        self.benchmark
            .refetch()
            .map(FetchRequest::Benchmark)
            .into_iter()
            .collect()
    }

    pub fn refetch_results(&mut self) -> Vec<FetchRequest> {
        self.results
            .refetch()
            .map(FetchRequest::Results)
            .into_iter()
            .collect()
    }

    pub fn select(&mut self, result: &ResultItem) {
        self.selection = self.selection.select(result);
    }

    pub fn unselect(&mut self, result: &ResultItem) {
        self.selection = self.selection.unselect(result);
    }

    pub fn is_selected(&self, result: &ResultItem) -> bool {
        self.selection.is_selected(result)
    }

    /// Select every result on the current page
    pub fn select_all(&mut self) {
        let items = self.page_items();
        self.selection = self.selection.select_all(&items);
    }

    /// Toggle every result on the current page
    pub fn invert_selection(&mut self) {
        let items = self.page_items();
        self.selection = self.selection.invert_selection(&items);
    }

    pub fn clear_selection(&mut self) {
        self.selection = self.selection.clear();
    }

    /// Open the JSON preview for `result`
    pub fn display(&mut self, result: &ResultItem) {
        debug!("Previewing result {}", result.id);
        self.preview.show(result);
    }

    pub fn close_preview(&mut self) {
        self.preview.close();
    }

    /// Open the report dialog for `result`
    pub fn report(&mut self, result: &ResultItem) {
        debug!("Reporting result {}", result.id);
        self.report.show(result);
    }

    pub fn close_report(&mut self) {
        self.report.close();
    }

    fn page_items(&self) -> Vec<ResultItem> {
        self.results_page()
            .map(|page| page.items.clone())
            .unwrap_or_default()
    }

    /// A result on the current page, by id
    pub fn find_on_page(&self, id: &str) -> Option<&ResultItem> {
        self.results_page()
            .and_then(|page| page.items.iter().find(|r| r.id == id))
    }

    pub fn query(&self) -> &BrowseQueryState {
        &self.query
    }

    pub fn benchmark_state(&self) -> ResourceState<Benchmark> {
        self.benchmark.state()
    }

    pub fn results_state(&self) -> ResourceState<ResultsPage> {
        self.results.state()
    }

    /// Current results cache key
    pub fn results_key(&self) -> Option<&ResultsKey> {
        self.results.key()
    }

    /// Whether the results fetch is allowed to run
    pub fn results_enabled(&self) -> bool {
        self.results.is_enabled()
    }

    pub fn benchmark(&self) -> Option<&Benchmark> {
        self.resolved_benchmark()
    }

    /// The current page, when the results fetch is enabled and loaded successfully
    pub fn results_page(&self) -> Option<&ResultsPage> {
        if self.results.is_enabled() && self.results.is_success() {
            self.results.data()
        } else {
            None
        }
    }

    /// Suggested comparison fields; `None` until the benchmark has loaded
    pub fn suggested_fields(&self) -> Option<&[String]> {
        let benchmark = self.resolved_benchmark()?;
        self.suggestions.get(&benchmark.id).map(|fields| &**fields)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn preview(&self) -> &ModalSlot {
        &self.preview
    }

    pub fn report_target(&self) -> &ModalSlot {
        &self.report
    }

    /// Snapshot of everything the view layer renders
    pub fn view(&self) -> BrowserView {
        let benchmark_state = self.benchmark.state();
        let results_state = self.results.state();

        BrowserView {
            query: self.query.clone(),
            benchmark_status: benchmark_state.label(),
            benchmark: self.benchmark().cloned(),
            benchmark_error: error_of(&benchmark_state),
            results_status: results_state.label(),
            results: self.results_page().cloned(),
            results_error: error_of(&results_state),
            suggested_fields: self.suggested_fields().map(<[String]>::to_vec),
            selection: self.selection.as_slice().to_vec(),
            preview: self.preview.clone(),
            report: self.report.clone(),
            per_page_choices: self.config.per_page_choices.clone(),
        }
    }
}

fn error_of<T>(state: &ResourceState<T>) -> Option<FetchError> {
    match state {
        ResourceState::Error(err) => Some(err.clone()),
        _ => None,
    }
}

/// Everything the view layer needs for one render
#[derive(Debug, Clone, Serialize)]
pub struct BrowserView {
    pub query: BrowseQueryState,
    pub benchmark_status: &'static str,
    pub benchmark: Option<Benchmark>,
    pub benchmark_error: Option<FetchError>,
    pub results_status: &'static str,
    pub results: Option<ResultsPage>,
    pub results_error: Option<FetchError>,
    pub suggested_fields: Option<Vec<String>>,
    pub selection: Vec<ResultItem>,
    pub preview: ModalSlot,
    pub report: ModalSlot,
    pub per_page_choices: Vec<u32>,
}
