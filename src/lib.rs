//! result-search - browse, select and compare benchmark results
//!
//! This library holds the client-side core of a result search page: it
//! derives suggested comparison fields from a benchmark template, keeps the
//! benchmark and results page fetches coherent while the operator pages
//! through results, and tracks the selection and the preview/report targets.
//!
//! # Features
//!
//! - Suggested fields from `!`-marked leaves of a benchmark's JSON template
//! - Cache-keyed remote resources with stale response protection
//! - Result selection with select-all and page-scoped inversion
//! - Comparison tables and text/JSON rendering of the browser state
//!
//! # Example
//!
//! ```no_run
//! use result_search::{client, controller, driver, view};
//!
//! let source = client::ApiClient::new(&client::ClientConfig::default()).unwrap();
//! let mut browser = controller::ResultBrowser::from_query_string(
//!     "benchmark=3f1b2c",
//!     controller::BrowserConfig::default(),
//! )
//! .unwrap();
//!
//! let requests = browser.start();
//! driver::settle(&mut browser, &source, requests);
//! println!("{}", view::render_text(&browser.view()).unwrap());
//! ```

pub mod client;
pub mod compare;
pub mod controller;
pub mod data;
pub mod driver;
pub mod error;
pub mod notable;
pub mod query;
pub mod resource;
pub mod selection;
pub mod view;

pub use error::{Error, Result};
