//! # News Harvest
//!
//! Crawls a fixed table of news sites, discovers article links on each
//! landing page, fetches every article through a bounded worker pool and
//! appends one CSV row per article: URL, title, raw publish date, parsed
//! publish date and body text.
//!
//! ## Usage
//!
//! ```sh
//! news_harvest -o Scraped_News.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: match anchors on each landing page against the site's patterns
//! 2. **Fetching**: drain the deduplicated link set with N concurrent workers
//! 3. **Extraction**: title, publish date (ordered fallback chain) and paragraph text
//! 4. **Output**: append rows to the CSV file
//!
//! Configuration and the output file are checked before the first request.
//! After that, failures only produce diagnostics.

use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod diagnostics;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::{AppConfig, load_config};
use diagnostics::TracingDiagnostics;
use outputs::csv::CsvSink;
use pipeline::Pipeline;
use scrapers::fetch::HttpFetcher;
use utils::ensure_parent_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let (writer, ansi) = match &args.log_file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(File::create(path)?)), false),
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_harvest starting up");
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => load_config(path),
        None => AppConfig::builtin(),
    }
    .inspect_err(|e| error!(error = %e, "Invalid configuration; aborting"))?;
    if let Some(workers) = args.workers {
        config.workers = usize::from(workers);
    }
    info!(
        sites = config.sites.len(),
        date_rules = config.date_rules.len(),
        date_formats = config.date_formats.len(),
        workers = config.workers,
        "Configuration ready"
    );

    // ---- Output ----
    let output = Path::new(&args.output);
    ensure_parent_dir(output).await?;
    let mut sink = CsvSink::open(output)
        .inspect_err(|e| error!(path = %args.output, error = %e, "Output file is not writable"))?;

    // ---- Crawl ----
    let fetcher = HttpFetcher::new(&config.http)?;
    let diagnostics = TracingDiagnostics;
    let summary = Pipeline::new(&config, &fetcher, &diagnostics)
        .run(&mut sink)
        .await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        links = summary.discovered,
        rows = sink.rows(),
        path = %args.output,
        "Execution complete"
    );

    Ok(())
}
