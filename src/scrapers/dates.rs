//! Publish date extraction.
//!
//! A page's date is found by walking an ordered list of [`DateRule`]s. Each
//! rule locates some text; that text is tried against an ordered list of
//! [`ParseFormat`]s. The first rule whose text parses wins. Later rules and
//! formats are never tried.
//!
//! The two searches are kept separate ([`first_matching_rule`] and
//! [`first_parsing_format`]) so the fallback order can be tested without a
//! network.

use crate::config::{ConfigError, compile_pattern};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::scrapers::html::{child_text, first, normalized_text, own_text};
use chrono::format::{Fixed, Item, Numeric, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use itertools::Itertools;
use tracing::debug;

static DOTTED_MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d)(\s*)([ap])\.m\.").unwrap());

/// How a rule picks the date-bearing text once its tag is located.
#[derive(Debug, Clone)]
pub enum RuleMode {
    /// Text of the first element with the tag.
    WholeElement,
    /// Text of the first element with the tag whose own text matches.
    /// Only direct text children count: `<span><b>Posted ...</b></span>`
    /// does not match `Posted`.
    TextMatch(Regex),
    /// Text of the n-th child node of the first element with the tag.
    /// Negative indices count from the last child.
    ChildIndex(isize),
}

/// One step of the date fallback chain.
#[derive(Debug, Clone)]
pub struct DateRule {
    pub tag: String,
    selector: Selector,
    pub mode: RuleMode,
}

impl DateRule {
    fn new(tag: &str, mode: RuleMode) -> Result<Self, ConfigError> {
        let selector = Selector::parse(tag).map_err(|e| ConfigError::InvalidTag {
            tag: tag.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            tag: tag.to_string(),
            selector,
            mode,
        })
    }

    pub fn whole_element(tag: &str) -> Result<Self, ConfigError> {
        Self::new(tag, RuleMode::WholeElement)
    }

    pub fn text_match(tag: &str, pattern: &str) -> Result<Self, ConfigError> {
        Self::new(tag, RuleMode::TextMatch(compile_pattern(pattern)?))
    }

    pub fn child_index(tag: &str, index: isize) -> Result<Self, ConfigError> {
        Self::new(tag, RuleMode::ChildIndex(index))
    }

    /// The text this rule selects on `document`, if any.
    ///
    /// An absent tag is simply no match. An out-of-range child index is
    /// reported against `page` and is also no match.
    pub fn extract(
        &self,
        document: &Html,
        page: &str,
        diagnostics: &dyn Diagnostics,
    ) -> Option<String> {
        let text = match &self.mode {
            RuleMode::WholeElement => first(document, &self.selector).map(normalized_text),
            RuleMode::TextMatch(pattern) => document
                .select(&self.selector)
                .find(|el| pattern.is_match(&own_text(*el)))
                .map(normalized_text),
            RuleMode::ChildIndex(index) => {
                let element = first(document, &self.selector)?;
                match child_text(element, *index) {
                    Ok(text) => Some(text),
                    Err(len) => {
                        diagnostics.report(Diagnostic::ChildIndexOutOfRange {
                            page: page.to_string(),
                            tag: self.tag.clone(),
                            index: *index,
                            len,
                        });
                        None
                    }
                }
            }
        };
        text.filter(|t| !t.is_empty())
    }
}

/// A chrono strftime template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFormat {
    template: String,
    date_only: bool,
}

impl ParseFormat {
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        let malformed = template.trim().is_empty()
            || StrftimeItems::new(template).any(|item| matches!(item, Item::Error));
        if malformed {
            return Err(ConfigError::InvalidFormat {
                template: template.to_string(),
            });
        }
        Ok(Self {
            template: template.to_string(),
            date_only: !has_time_of_day(template),
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parse `text` as a date-time, or as a date at midnight when the
    /// template carries no time of day.
    ///
    /// A template with time fields never falls back to midnight: if the
    /// time it reads is incomplete (`%I` without `%p`), the parse fails.
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let text = normalize_meridiem(text);
        if !self.date_only {
            return NaiveDateTime::parse_from_str(&text, &self.template).ok();
        }
        NaiveDate::parse_from_str(&text, &self.template)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

/// Whether `template` reads any hour, minute, second or meridiem field.
fn has_time_of_day(template: &str) -> bool {
    StrftimeItems::new(template).any(|item| {
        matches!(
            item,
            Item::Numeric(
                Numeric::Hour
                    | Numeric::Hour12
                    | Numeric::Minute
                    | Numeric::Second
                    | Numeric::Nanosecond
                    | Numeric::Timestamp,
                _
            ) | Item::Fixed(
                Fixed::UpperAmPm
                    | Fixed::LowerAmPm
                    | Fixed::Nanosecond
                    | Fixed::RFC2822
                    | Fixed::RFC3339
            )
        )
    })
}

/// The outcome of the date fallback chain. Both fields are `None` when no
/// rule produced parseable text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDate {
    pub raw_text: Option<String>,
    pub parsed: Option<NaiveDateTime>,
}

/// Find the publish date of `document`.
///
/// # Arguments
///
/// * `document` - Parsed article page
/// * `page` - Name of the page used in diagnostics
/// * `rules` - Date rules, tried in order
/// * `formats` - Parse formats, tried in order against each rule's text
/// * `diagnostics` - Receives out-of-range child index reports
///
/// # Returns
///
/// The text of the first rule that parsed with the value it parsed to, or
/// an empty [`ResolvedDate`] when no combination succeeded.
pub fn resolve_date(
    document: &Html,
    page: &str,
    rules: &[DateRule],
    formats: &[ParseFormat],
    diagnostics: &dyn Diagnostics,
) -> ResolvedDate {
    match first_matching_rule(document, page, rules, formats, diagnostics) {
        Some((raw_text, parsed)) => ResolvedDate {
            raw_text: Some(raw_text),
            parsed: Some(parsed),
        },
        None => ResolvedDate::default(),
    }
}

/// The first rule whose extracted text parses with one of `formats`,
/// returned as that text plus its parsed value.
pub fn first_matching_rule(
    document: &Html,
    page: &str,
    rules: &[DateRule],
    formats: &[ParseFormat],
    diagnostics: &dyn Diagnostics,
) -> Option<(String, NaiveDateTime)> {
    rules.iter().find_map(|rule| {
        let text = rule.extract(document, page, diagnostics)?;
        match first_parsing_format(&text, formats) {
            Some(parsed) => Some((text, parsed)),
            None => {
                debug!(
                    %page,
                    tag = %rule.tag,
                    %text,
                    tried = %formats.iter().map(ParseFormat::template).join(" | "),
                    "Date text matched no format"
                );
                None
            }
        }
    })
}

/// The value produced by the first format that parses `text`.
pub fn first_parsing_format(text: &str, formats: &[ParseFormat]) -> Option<NaiveDateTime> {
    formats.iter().find_map(|format| format.parse(text))
}

/// Rewrite `a.m.`/`p.m.` after a digit as `AM`/`PM` so `%p` can read it.
fn normalize_meridiem(text: &str) -> String {
    DOTTED_MERIDIEM
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}M", &caps[1], &caps[2], caps[3].to_uppercase())
        })
        .into_owned()
}
