//! result-search CLI - browse and compare benchmark results
//!
//! Drives the result browser against a results API and prints the page.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use result_search::{
    client::{ApiClient, ClientConfig, DEFAULT_API_URL},
    compare::ComparisonTable,
    controller::{BrowserConfig, ResultBrowser},
    data, driver, notable,
    query::{self, BrowseQueryState},
    view,
};

/// result-search: browse, select and compare benchmark results
#[derive(Parser, Debug)]
#[command(name = "result-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a page of results and render it
    Browse(BrowseArgs),

    /// List the suggested comparison fields of a local benchmark template
    Fields(FieldsArgs),
}

#[derive(Parser, Debug)]
struct BrowseArgs {
    /// Root URL of the results API
    #[arg(long, env = "RESULT_SEARCH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "RESULT_SEARCH_TIMEOUT", default_value = "30")]
    timeout_secs: u64,

    /// Browse page query string (e.g. "benchmark=<id>")
    #[arg(long, default_value = "")]
    query: String,

    /// Benchmark to browse (overrides --query)
    #[arg(short, long)]
    benchmark: Option<String>,

    /// Page to show
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Results per page
    #[arg(long, default_value = "10")]
    per_page: u32,

    /// Extra result filters forwarded to the API (KEY=VALUE)
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Select a result on the page by id (repeatable)
    #[arg(long = "select", value_name = "ID")]
    select: Vec<String>,

    /// Select every result on the page
    #[arg(long, default_value = "false")]
    select_all: bool,

    /// Invert the selection on the page
    #[arg(long, default_value = "false")]
    invert: bool,

    /// Show the JSON of a result on the page
    #[arg(long, value_name = "ID")]
    preview: Option<String>,

    /// Open the report dialog for a result on the page
    #[arg(long, value_name = "ID")]
    report: Option<String>,

    /// Only print the comparison table of the selection
    #[arg(long, default_value = "false")]
    compare: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FieldsArgs {
    /// Benchmark JSON (full benchmark or bare template)
    #[arg(short, long, value_name = "FILE")]
    template: PathBuf,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid filter '{}', expected KEY=VALUE", raw)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Browse(args) => browse_command(args),
        Commands::Fields(args) => fields_command(args),
    }
}

/// Browse one page of results
fn browse_command(args: BrowseArgs) -> Result<()> {
    let client_config = ClientConfig {
        base_url: args.api_url.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        ..Default::default()
    };
    let client = ApiClient::new(&client_config).context("Failed to create API client")?;

    let mut state = BrowseQueryState::from_query_string(&args.query);
    if let Some(benchmark) = args.benchmark {
        state.benchmark_id = benchmark;
    }
    state.page = query::validate_page(args.page)?;
    state.per_page = query::validate_per_page(args.per_page)?;
    state.filters = args.filters.into_iter().collect();

    let config = BrowserConfig {
        default_per_page: state.per_page,
        ..Default::default()
    };
    config.validate()?;

    let mut browser = ResultBrowser::new(state, config);
    let requests = browser.start();
    let fetches = driver::settle(&mut browser, &client, requests);
    info!("Performed {} fetches", fetches);

    for id in &args.select {
        match browser.find_on_page(id).cloned() {
            Some(result) => browser.select(&result),
            None => warn!("Result {} is not on this page", id),
        }
    }
    if args.select_all {
        browser.select_all();
    }
    if args.invert {
        browser.invert_selection();
    }
    if let Some(id) = &args.preview {
        match browser.find_on_page(id).cloned() {
            Some(result) => browser.display(&result),
            None => warn!("Result {} is not on this page", id),
        }
    }
    if let Some(id) = &args.report {
        match browser.find_on_page(id).cloned() {
            Some(result) => browser.report(&result),
            None => warn!("Result {} is not on this page", id),
        }
    }

    let snapshot = browser.view();
    let rendered = if args.compare {
        let fields = snapshot.suggested_fields.clone().unwrap_or_default();
        let table = ComparisonTable::build(&snapshot.selection, &fields);
        match args.format.as_str() {
            "json" => serde_json::to_string_pretty(&table)?,
            _ => table.summary(),
        }
    } else {
        match args.format.as_str() {
            "json" => view::render_json(&snapshot)?,
            _ => view::render_text(&snapshot)?,
        }
    };

    match args.output {
        Some(path) => {
            view::write_output(&path, &rendered)
                .with_context(|| format!("Failed to write output to {:?}", path))?;
            info!("Wrote output to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// List suggested fields of a local template
fn fields_command(args: FieldsArgs) -> Result<()> {
    let template = data::load_template(&args.template)
        .with_context(|| format!("Failed to load template from {:?}", args.template))?;

    let fields = notable::extract(&template);
    info!("Found {} suggested fields", fields.len());

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&fields)?),
        _ => {
            for field in &fields {
                println!("{}", field);
            }
        }
    }

    Ok(())
}
