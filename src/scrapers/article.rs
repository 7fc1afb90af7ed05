//! Article record extraction from a fetched page.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::models::ArticleRecord;
use crate::scrapers::dates::{DateRule, ParseFormat, resolve_date};
use crate::scrapers::html::{first, normalized_text};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Builds [`ArticleRecord`]s with a fixed date fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct ArticleExtractor<'a> {
    rules: &'a [DateRule],
    formats: &'a [ParseFormat],
}

impl<'a> ArticleExtractor<'a> {
    pub fn new(rules: &'a [DateRule], formats: &'a [ParseFormat]) -> Self {
        Self { rules, formats }
    }

    /// Parse `body` and extract one record for `url`.
    ///
    /// A missing title or body becomes an empty string. A missing date is
    /// reported as [`Diagnostic::DateNotFound`] and left as `None`.
    pub fn extract(&self, url: &str, body: &str, diagnostics: &dyn Diagnostics) -> ArticleRecord {
        let document = Html::parse_document(body);
        self.extract_document(url, &document, diagnostics)
    }

    pub fn extract_document(
        &self,
        url: &str,
        document: &Html,
        diagnostics: &dyn Diagnostics,
    ) -> ArticleRecord {
        let title = scrape_title(document);
        let date = resolve_date(document, url, self.rules, self.formats, diagnostics);
        if date.parsed.is_none() {
            diagnostics.report(Diagnostic::DateNotFound {
                url: url.to_string(),
            });
        }
        let body_text = scrape_text(document);
        debug!(%url, title_len = title.len(), body_len = body_text.len(), "Extracted article");

        ArticleRecord {
            url: url.to_string(),
            title,
            raw_date_text: date.raw_text,
            parsed_date: date.parsed,
            body_text,
        }
    }
}

/// Normalized text of the document's `<title>`, or empty.
pub fn scrape_title(document: &Html) -> String {
    first(document, &TITLE_SELECTOR)
        .map(normalized_text)
        .unwrap_or_default()
}

/// Every `<p>`'s normalized text, in document order, concatenated as is.
pub fn scrape_text(document: &Html) -> String {
    document
        .select(&PARAGRAPH_SELECTOR)
        .map(normalized_text)
        .collect()
}
