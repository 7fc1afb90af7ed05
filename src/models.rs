//! Data models shared by the crawl pipeline stages.
//!
//! - [`LinkSet`]: deduplicated, absolute article URLs from every landing page
//! - [`FetchResult`]: the outcome of fetching one queued link
//! - [`ArticleRecord`]: the row extracted from one fetched article

use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fmt;

/// Absolute article URLs, unique across all configured sites.
pub type LinkSet = HashSet<String>;

/// Written in the raw date column when no date was found.
pub const NO_DATE_TEXT: &str = "No date found";
/// Written in the parsed date column when no date was found.
pub const NO_DATE_VALUE: &str = "No date to make date object";
/// Rendering of a parsed publish date in the output file.
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a link could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The server answered with a 4xx or 5xx status.
    StatusError,
    /// The link is not a fetchable http(s) URL.
    InvalidUrl,
    /// DNS, connect, TLS, timeout or body read failure.
    ConnectionError,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorKind::StatusError => "status error",
            FetchErrorKind::InvalidUrl => "invalid url",
            FetchErrorKind::ConnectionError => "connection error",
        };
        f.write_str(s)
    }
}

/// A page returned by the fetch primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: String,
    pub body: String,
}

/// The outcome of fetching one queued link. Produced exactly once per link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success { body: String, final_url: String },
    Failure { link: String, reason: FetchErrorKind },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }
}

/// One article extracted from a fetched page.
///
/// `raw_date_text` and `parsed_date` are either both present or both
/// absent: the date resolver only returns text it managed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub raw_date_text: Option<String>,
    pub parsed_date: Option<NaiveDateTime>,
    pub body_text: String,
}

impl ArticleRecord {
    /// The five output columns, with placeholders for a missing date.
    pub fn to_row(&self) -> [String; 5] {
        let raw = self
            .raw_date_text
            .clone()
            .unwrap_or_else(|| NO_DATE_TEXT.to_string());
        let parsed = self
            .parsed_date
            .map(|d| d.format(DATE_OUTPUT_FORMAT).to_string())
            .unwrap_or_else(|| NO_DATE_VALUE.to_string());
        [
            self.url.clone(),
            self.title.clone(),
            raw,
            parsed,
            self.body_text.clone(),
        ]
    }
}
