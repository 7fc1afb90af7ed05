//! Command-line interface definitions for News Harvest.
//!
//! Everything is read once at process start. Only `RUST_LOG` is read from
//! the environment, and only to filter log output.

use clap::Parser;

/// Command-line arguments for the News Harvest crawler.
///
/// # Examples
///
/// ```sh
/// # Crawl the built-in site table into ./Scraped_News.csv
/// news_harvest
///
/// # Custom site table, output file and pool size
/// news_harvest -c sites.yaml -o out/news.csv -w 8
///
/// # Keep diagnostics in a log file
/// news_harvest --log-file web_scraper.log
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML crawl table (defaults to the built-in table)
    #[arg(short, long)]
    pub config: Option<String>,

    /// CSV file to append article rows to
    #[arg(short, long, default_value = "Scraped_News.csv")]
    pub output: String,

    /// Number of concurrent fetch workers (overrides the crawl table)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<String>,
}
