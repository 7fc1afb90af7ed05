//! Diagnostics sink for non-fatal pipeline conditions.
//!
//! Link discovery, the fetch pool, the date resolver and the article
//! extractor never log directly. They report a [`Diagnostic`] to whatever
//! [`Diagnostics`] implementation the driver hands them, which lets tests
//! assert on what was reported without scraping log output.

use crate::models::FetchErrorKind;
use std::fmt;
use tracing::warn;

/// A non-fatal condition observed while crawling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No anchor on the landing page matched the site's link patterns.
    DiscoveryEmpty { site: String },
    /// The landing page itself could not be fetched.
    DiscoveryFailed { site: String, reason: String },
    /// An article link failed to fetch and was dropped.
    FetchFailed {
        link: String,
        kind: FetchErrorKind,
        detail: String,
    },
    /// A `ChildIndex` date rule pointed past the element's children.
    ChildIndexOutOfRange {
        page: String,
        tag: String,
        index: isize,
        len: usize,
    },
    /// No date rule and format combination succeeded for the page.
    DateNotFound { url: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DiscoveryEmpty { site } => {
                write!(f, "no links matching the patterns were found for {site}")
            }
            Diagnostic::DiscoveryFailed { site, reason } => {
                write!(f, "landing page {site} could not be fetched: {reason}")
            }
            Diagnostic::FetchFailed { link, kind, detail } => {
                write!(f, "{link} failed ({kind}): {detail}")
            }
            Diagnostic::ChildIndexOutOfRange {
                page,
                tag,
                index,
                len,
            } => write!(
                f,
                "{page} used child index {index} on <{tag}> which has {len} children"
            ),
            Diagnostic::DateNotFound { url } => {
                write!(f, "date pattern or format was not successful for {url}")
            }
        }
    }
}

/// Receiver for [`Diagnostic`]s.
pub trait Diagnostics {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `tracing` log stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::DiscoveryEmpty { site } => warn!(%site, "{diagnostic}"),
            Diagnostic::DiscoveryFailed { site, reason } => {
                warn!(%site, %reason, "{diagnostic}; skipping site");
            }
            Diagnostic::FetchFailed { link, kind, detail } => {
                warn!(%link, %kind, %detail, "{diagnostic}; dropping link");
            }
            Diagnostic::ChildIndexOutOfRange {
                page,
                tag,
                index,
                len,
            } => {
                warn!(%page, %tag, index, len, "{diagnostic}; trying next date rule");
            }
            Diagnostic::DateNotFound { url } => warn!(%url, "{diagnostic}"),
        }
    }
}

/// Keeps every reported diagnostic in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: std::sync::Mutex<Vec<Diagnostic>>,
}

#[cfg(test)]
impl RecordingDiagnostics {
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|d| pred(d)).count()
    }
}

#[cfg(test)]
impl Diagnostics for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.events.lock().unwrap().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_recording_diagnostics_keeps_order() {
        let diagnostics = RecordingDiagnostics::default();
        diagnostics.report(Diagnostic::DiscoveryEmpty {
            site: "https://a.example".to_string(),
        });
        diagnostics.report(Diagnostic::DateNotFound {
            url: "https://a.example/1".to_string(),
        });

        let events = diagnostics.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Diagnostic::DiscoveryEmpty { .. }));
        assert_eq!(
            diagnostics.count(|d| matches!(d, Diagnostic::DateNotFound { .. })),
            1
        );
    }

    #[test]
    fn test_display_names_the_link() {
        let d = Diagnostic::FetchFailed {
            link: "https://a.example/x".to_string(),
            kind: FetchErrorKind::StatusError,
            detail: "HTTP 404".to_string(),
        };
        let text = d.to_string();
        assert!(text.contains("https://a.example/x"));
        assert!(text.contains("status error"));
    }

    /// Shared buffer standing in for stderr.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_diagnostics_logs_every_variant() {
        let every_variant = vec![
            Diagnostic::DiscoveryEmpty {
                site: "https://a.example".to_string(),
            },
            Diagnostic::DiscoveryFailed {
                site: "https://b.example".to_string(),
                reason: "connection refused".to_string(),
            },
            Diagnostic::FetchFailed {
                link: "https://a.example/x".to_string(),
                kind: FetchErrorKind::StatusError,
                detail: "HTTP 404".to_string(),
            },
            Diagnostic::ChildIndexOutOfRange {
                page: "Some page".to_string(),
                tag: "h5".to_string(),
                index: -1,
                len: 0,
            },
            Diagnostic::DateNotFound {
                url: "https://a.example/y".to_string(),
            },
        ];

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            for diagnostic in every_variant.clone() {
                TracingDiagnostics.report(diagnostic);
            }
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), every_variant.len());
        for (line, diagnostic) in lines.iter().zip(&every_variant) {
            assert!(line.contains("WARN"), "{line}");
            assert!(line.contains(&diagnostic.to_string()), "{line}");
        }
        assert!(lines[2].contains("kind=status error"));
        assert!(lines[3].contains("index=-1"));
    }
}
