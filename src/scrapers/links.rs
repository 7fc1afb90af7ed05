//! Article link discovery on landing pages.
//!
//! Anchors are kept when their `href` contains a match for one of the site's
//! link patterns and none of its exclude patterns. Every kept href is made
//! absolute before it is returned:
//!
//! | href | result |
//! |------|--------|
//! | `https://site.com/2024/01/02/a` | unchanged |
//! | `//site.com/2024/01/02/a` | `https://site.com/2024/01/02/a` |
//! | `/2024/01/02/a` | joined onto the landing URL |

use crate::config::SiteConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::models::LinkSet;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Collect the absolute article URLs linked from a landing page.
///
/// # Arguments
///
/// * `page` - Parsed landing page
/// * `site` - Landing URL plus the link and exclude patterns to apply
/// * `diagnostics` - Receives [`Diagnostic::DiscoveryEmpty`] when nothing matches
///
/// # Returns
///
/// The set of absolute URLs whose href matched a link pattern and no
/// exclude pattern. Empty, never absent, when nothing matched.
#[instrument(level = "info", skip_all, fields(site = %site.landing_url))]
pub fn extract_links(page: &Html, site: &SiteConfig, diagnostics: &dyn Diagnostics) -> LinkSet {
    let mut links = LinkSet::new();

    for pattern in &site.link_patterns {
        for anchor in page.select(&ANCHOR_SELECTOR) {
            let Some(href) = anchor.value().attr("href").map(str::trim) else {
                continue;
            };
            if !pattern.is_match(href) || site.exclude_patterns.iter().any(|x| x.is_match(href)) {
                continue;
            }
            match absolutize(href, &site.landing_url) {
                Some(link) => {
                    links.insert(link);
                }
                None => debug!(%href, "Could not resolve href"),
            }
        }
    }

    if links.is_empty() {
        diagnostics.report(Diagnostic::DiscoveryEmpty {
            site: site.landing_url.to_string(),
        });
    } else {
        info!(count = links.len(), "Collected article links");
    }
    links
}

/// Make `href` absolute, leaving already-absolute hrefs untouched.
pub fn absolutize(href: &str, base: &Url) -> Option<String> {
    if href.starts_with("//") {
        return Some(format!("https:{href}"));
    }
    if Url::parse(href).is_ok() {
        return Some(href.to_string());
    }
    base.join(href).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;

    const LANDING: &str = r#"
        <html><head><title>Front page</title></head><body>
          <a href="https://news.example.com/2024/03/01/first-story">First</a>
          <a href="//news.example.com/2024/03/02/second-story">Second</a>
          <a href="/2024/03/03/third-story">Third</a>
          <a href="/about">About</a>
          <a href="https://ads.example.net/promo">Ad</a>
          <a>No href</a>
        </body></html>
    "#;

    fn site(patterns: &[&str], excludes: &[&str]) -> SiteConfig {
        SiteConfig::new("https://news.example.com/", patterns, excludes).unwrap()
    }

    #[test]
    fn test_three_matching_two_not() {
        let page = Html::parse_document(LANDING);
        let diagnostics = RecordingDiagnostics::default();
        let links = extract_links(&page, &site(&[r"/\d{4}/\d{2}/\d{2}/"], &[]), &diagnostics);

        assert_eq!(links.len(), 3);
        assert!(links.contains("https://news.example.com/2024/03/01/first-story"));
        assert!(links.contains("https://news.example.com/2024/03/02/second-story"));
        assert!(links.contains("https://news.example.com/2024/03/03/third-story"));
        assert!(diagnostics.events().is_empty());
    }

    #[test]
    fn test_union_across_patterns_is_deduplicated() {
        let page = Html::parse_document(LANDING);
        let links = extract_links(
            &page,
            &site(&["first-story", r"/2024/03/0[12]/"], &[]),
            &RecordingDiagnostics::default(),
        );
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_exclude_patterns_drop_matches() {
        let page = Html::parse_document(LANDING);
        let links = extract_links(
            &page,
            &site(&[r"/\d{4}/"], &["second-story"]),
            &RecordingDiagnostics::default(),
        );
        assert_eq!(links.len(), 2);
        assert!(!links.iter().any(|l| l.contains("second-story")));
    }

    #[test]
    fn test_no_matches_reports_site() {
        let page = Html::parse_document(LANDING);
        let diagnostics = RecordingDiagnostics::default();
        let links = extract_links(&page, &site(&["/video/"], &[]), &diagnostics);

        assert!(links.is_empty());
        assert_eq!(
            diagnostics.events(),
            vec![Diagnostic::DiscoveryEmpty {
                site: "https://news.example.com/".to_string()
            }]
        );
    }

    #[test]
    fn test_absolutize_scheme_relative() {
        let base = Url::parse("https://news.example.com/").unwrap();
        assert_eq!(
            absolutize("//cdn.example.com/a-b-c", &base).as_deref(),
            Some("https://cdn.example.com/a-b-c")
        );
    }

    #[test]
    fn test_absolutize_keeps_absolute_unchanged() {
        let base = Url::parse("https://news.example.com/").unwrap();
        for href in [
            "https://news.example.com/a?b=1",
            "http://other.example.org/x",
            "https://news.example.com/path/with%20space",
        ] {
            assert_eq!(absolutize(href, &base).as_deref(), Some(href));
        }
    }

    #[test]
    fn test_absolutize_relative_gets_scheme() {
        let base = Url::parse("https://globalnews.ca/montreal/").unwrap();
        for href in ["/news/123/story", "news/456/story", "../news/789"] {
            let link = absolutize(href, &base).unwrap();
            assert!(link.starts_with("https://globalnews.ca/"), "{link}");
        }
    }
}
