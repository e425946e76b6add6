//! Text rendering of a browser snapshot

use crate::compare::{format_cell, ComparisonTable};
use crate::controller::BrowserView;
use crate::error::{Error, Result};
use minijinja::{context, Environment};
use serde::Serialize;
use std::path::Path;

/// Template for the plain text view
const TEXT_TEMPLATE: &str = r#"Result Search
=============

Benchmark: {% if view.results_error %}None{% elif view.benchmark %}{{ view.benchmark.docker_image }}:{{ view.benchmark.docker_tag }} <{{ docker_hub_url }}>{% elif view.benchmark_status == "loading" %}Loading{% elif view.benchmark_error %}None ({{ view.benchmark_error.message }}){% else %}None{% endif %}
{%- if view.query.filters %}
Filters: {% for key, value in view.query.filters|items %}{{ key }}={{ value }}{% if not loop.last %}, {% endif %}{% endfor %}
{%- endif %}
Suggested fields: {% if view.suggested_fields is none %}not available yet{% elif view.suggested_fields %}{{ view.suggested_fields|join(", ") }}{% else %}none{% endif %}

{% if view.benchmark_status == "loading" or view.results_status == "loading" -%}
Loading results...
{%- elif view.benchmark_error or view.results_error or empty -%}
No results found! :(
{%- elif view.results -%}
{{ header }}
{% for row in rows -%}
{{ row }}
{% endfor %}
Page {{ view.results.page }} of {{ pages }} ({{ view.results.total }} results, {{ view.query.per_page }} per page; choices: {{ view.per_page_choices|join(", ") }})
{%- if has_prev %} [prev: {{ view.results.page - 1 }}]{% endif %}
{%- if has_next %} [next: {{ view.results.page + 1 }}]{% endif %}
{%- endif %}

Selected ({{ view.selection|length }}): {% if view.selection %}{{ selected_ids|join(", ") }}{% else %}none{% endif %}
{%- if comparison %}

{{ comparison }}
{%- endif %}
{%- if view.preview.open %}

Preview of {{ view.preview.result.id }}:
{{ preview_json }}
{%- endif %}
{%- if view.report.open %}

Reporting result {{ view.report.result.id }}
{%- endif %}
"#;

#[derive(Serialize)]
struct TextRows {
    header: String,
    rows: Vec<String>,
}

fn table_rows(view: &BrowserView) -> TextRows {
    let fields: &[String] = view.suggested_fields.as_deref().unwrap_or(&[]);
    let mut header = String::from("    id");
    for field in fields {
        header.push_str(" | ");
        header.push_str(field);
    }

    let rows = view
        .results
        .iter()
        .flat_map(|page| page.items.iter())
        .map(|item| {
            let marker = if view.selection.iter().any(|s| s.id == item.id) {
                "[x]"
            } else {
                "[ ]"
            };
            let mut line = format!("{} {}", marker, item.id);
            let document = item.document();
            for field in fields {
                line.push_str(" | ");
                line.push_str(&format_cell(crate::data::lookup_path(&document, field)));
            }
            line
        })
        .collect();

    TextRows { header, rows }
}

/// Render the snapshot as plain text
pub fn render_text(view: &BrowserView) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("browser", TEXT_TEMPLATE)?;
    let template = env.get_template("browser")?;

    let TextRows { header, rows } = table_rows(view);
    let comparison = match &view.suggested_fields {
        Some(fields) if !view.selection.is_empty() && !fields.is_empty() => {
            ComparisonTable::build(&view.selection, fields).summary()
        }
        _ => String::new(),
    };
    let preview_json = match view.preview.result() {
        Some(result) => serde_json::to_string_pretty(result)?,
        None => String::new(),
    };
    let selected_ids: Vec<&str> = view.selection.iter().map(|r| r.id.as_str()).collect();

    let rendered = template.render(context! {
        view => view,
        header => header,
        rows => rows,
        pages => view.results.as_ref().map(|p| p.pages()).unwrap_or(0),
        empty => view.results.as_ref().is_some_and(|p| p.is_empty()),
        has_prev => view.results.as_ref().is_some_and(|p| p.has_prev()),
        has_next => view.results.as_ref().is_some_and(|p| p.has_next()),
        docker_hub_url => view.benchmark.as_ref().map(|b| b.docker_hub_url()),
        selected_ids => selected_ids,
        comparison => comparison,
        preview_json => preview_json,
    })?;

    Ok(rendered)
}

/// Render the snapshot as pretty JSON
pub fn render_json(view: &BrowserView) -> Result<String> {
    Ok(serde_json::to_string_pretty(view)?)
}

/// Write rendered output to `path`, creating parent directories
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    std::fs::write(path, content).map_err(|e| Error::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{BrowserConfig, FetchOutcome, FetchRequest, ResultBrowser};
    use crate::data::{Benchmark, ResultItem, ResultsPage};
    use crate::query::BenchmarkKey;
    use crate::resource::FetchError;
    use serde_json::json;

    fn browser() -> ResultBrowser {
        let mut browser =
            ResultBrowser::from_query_string("benchmark=b1", BrowserConfig::default()).unwrap();
        browser.start();
        let requests = browser.handle_outcome(FetchOutcome::Benchmark(
            BenchmarkKey("b1".to_string()),
            Ok(Benchmark {
                id: "b1".to_string(),
                docker_image: "deephdc/benchmarks_cnn".to_string(),
                docker_tag: "v1".to_string(),
                description: String::new(),
                json_template: json!({ "meta": { "!threads": 4 } }),
            }),
        ));
        let Some(FetchRequest::Results(key)) = requests.into_iter().next() else {
            panic!("expected a results fetch");
        };
        browser.handle_outcome(FetchOutcome::Results(
            key,
            Ok(ResultsPage {
                items: vec![
                    ResultItem::new("r1").with_field("json", json!({ "meta": { "threads": 4 } })),
                    ResultItem::new("r2").with_field("json", json!({ "meta": { "threads": 16 } })),
                ],
                total: 2,
                page: 1,
                per_page: 10,
            }),
        ));
        browser
    }

    #[test]
    fn test_render_table() {
        let mut browser = browser();
        let r2 = browser.find_on_page("r2").cloned().unwrap();
        browser.select(&r2);

        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("Benchmark: deephdc/benchmarks_cnn:v1"));
        assert!(text.contains("Suggested fields: meta.threads"));
        assert!(text.contains("[ ] r1 | 4"));
        assert!(text.contains("[x] r2 | 16"));
        assert!(text.contains("Page 1 of 1 (2 results, 10 per page"));
        assert!(text.contains("Selected (1): r2"));
        assert!(text.contains("| r2 | 16 |"));
    }

    #[test]
    fn test_render_preview_and_report() {
        let mut browser = browser();
        let r1 = browser.find_on_page("r1").cloned().unwrap();
        browser.display(&r1);
        browser.report(&r1);

        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("Preview of r1:"));
        assert!(text.contains("\"threads\": 4"));
        assert!(text.contains("Reporting result r1"));

        browser.close_preview();
        let text = render_text(&browser.view()).unwrap();
        assert!(!text.contains("Preview of r1:"));
    }

    #[test]
    fn test_render_failures() {
        let mut browser =
            ResultBrowser::from_query_string("benchmark=gone", BrowserConfig::default()).unwrap();
        browser.start();
        browser.handle_outcome(FetchOutcome::Benchmark(
            BenchmarkKey("gone".to_string()),
            Err(FetchError::new("Benchmark not found")),
        ));

        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("Benchmark: None (Benchmark not found)"));
        assert!(text.contains("Suggested fields: not available yet"));
        assert!(text.contains("No results found! :("));
    }

    #[test]
    fn test_render_loading() {
        let mut browser =
            ResultBrowser::from_query_string("benchmark=b1", BrowserConfig::default()).unwrap();
        browser.start();

        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("Benchmark: Loading"));
        assert!(text.contains("Loading results..."));
        assert!(!text.contains("No results found! :("));
    }

    #[test]
    fn test_render_results_failure_with_benchmark() {
        let mut browser =
            ResultBrowser::from_query_string("benchmark=b1", BrowserConfig::default()).unwrap();
        browser.start();
        let requests = browser.handle_outcome(FetchOutcome::Benchmark(
            BenchmarkKey("b1".to_string()),
            Ok(Benchmark {
                id: "b1".to_string(),
                docker_image: "deephdc/benchmarks_cnn".to_string(),
                docker_tag: "v1".to_string(),
                description: String::new(),
                json_template: json!({}),
            }),
        ));
        let Some(FetchRequest::Results(key)) = requests.into_iter().next() else {
            panic!("expected a results fetch");
        };
        browser.handle_outcome(FetchOutcome::Results(key, Err(FetchError::new("boom"))));

        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("Benchmark: None\n"));
        assert!(!text.contains("deephdc/benchmarks_cnn:v1"));
        assert!(text.contains("No results found! :("));
    }

    #[test]
    fn test_render_empty_page_and_page_links() {
        let mut browser = ResultBrowser::from_query_string("", BrowserConfig::default()).unwrap();
        let requests = browser.start();
        let Some(FetchRequest::Results(key)) = requests.into_iter().next() else {
            panic!("expected a results fetch");
        };
        browser.handle_outcome(FetchOutcome::Results(key, Ok(ResultsPage::default())));
        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("No results found! :("));

        let Some(FetchRequest::Results(key)) = browser.set_page(2).unwrap().into_iter().next()
        else {
            panic!("expected a results fetch");
        };
        browser.handle_outcome(FetchOutcome::Results(
            key,
            Ok(ResultsPage {
                items: vec![ResultItem::new("r11")],
                total: 25,
                page: 2,
                per_page: 10,
            }),
        ));
        let text = render_text(&browser.view()).unwrap();
        assert!(text.contains("Page 2 of 3"));
        assert!(text.contains("[prev: 1] [next: 3]"));
    }

    #[test]
    fn test_write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("page.txt");

        write_output(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&browser().view()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results_status"], "success");
        assert_eq!(value["suggested_fields"], json!(["meta.threads"]));
    }
}
