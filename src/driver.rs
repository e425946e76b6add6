//! Performs the fetches a [`ResultBrowser`] asks for

use crate::client::DataSource;
use crate::controller::{FetchOutcome, FetchRequest, ResultBrowser};
use crate::resource::FetchError;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Run one fetch against `source`
pub fn perform(source: &dyn DataSource, request: &FetchRequest) -> FetchOutcome {
    match request {
        FetchRequest::Benchmark(key) => {
            let outcome = source.fetch_benchmark(key).map_err(|e| {
                warn!("Failed to load benchmark {}: {}", key.id(), e);
                FetchError::from(e)
            });
            FetchOutcome::Benchmark(key.clone(), outcome)
        }
        FetchRequest::Results(key) => {
            let outcome = source.fetch_results_page(key).map_err(|e| {
                warn!("Failed to load {}: {}", key, e);
                FetchError::from(e)
            });
            FetchOutcome::Results(key.clone(), outcome)
        }
    }
}

/// Perform `requests` and every fetch they unlock, until nothing is pending.
///
/// Failures end up in the browser's resource state; this never fails itself.
/// Returns the number of fetches performed.
pub fn settle(
    browser: &mut ResultBrowser,
    source: &dyn DataSource,
    requests: Vec<FetchRequest>,
) -> usize {
    let mut pending: VecDeque<FetchRequest> = requests.into();
    let mut performed = 0;

    while let Some(request) = pending.pop_front() {
        debug!("Performing {:?}", request);
        let outcome = perform(source, &request);
        performed += 1;
        pending.extend(browser.handle_outcome(outcome));
    }

    performed
}
