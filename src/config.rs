//! Crawl configuration: sites, date rules, date formats and pool size.
//!
//! The YAML table is deserialized into raw records and then validated into
//! an immutable [`AppConfig`]. Every regex, selector and date template is
//! compiled here, so a malformed entry aborts the run before the first
//! request goes out.

use crate::scrapers::dates::{DateRule, ParseFormat};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

const BUILTIN_CONFIG: &str = include_str!("../config/default.yaml");

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("worker pool size must be at least 1")]
    NoWorkers,
    #[error("no sites configured")]
    NoSites,
    #[error("landing URL {url:?} is not an absolute http(s) URL")]
    InvalidLandingUrl { url: String },
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid date rule tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },
    #[error("date rule for <{tag}> sets both `search` and `child_index`")]
    AmbiguousRule { tag: String },
    #[error("invalid date format template {template:?}")]
    InvalidFormat { template: String },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    workers: usize,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    user_agent: Option<String>,
    sites: Vec<RawSite>,
    #[serde(default)]
    date_rules: Vec<RawDateRule>,
    #[serde(default)]
    date_formats: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    landing_url: String,
    link_patterns: Vec<String>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDateRule {
    tag: String,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    child_index: Option<isize>,
}

/// One news source: where to discover links and which hrefs count.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub landing_url: Url,
    pub link_patterns: Vec<Regex>,
    /// Hrefs matching any of these are skipped even if a link pattern matched.
    pub exclude_patterns: Vec<Regex>,
}

impl SiteConfig {
    pub fn new(
        landing_url: &str,
        link_patterns: &[&str],
        exclude_patterns: &[&str],
    ) -> Result<Self, ConfigError> {
        let url = Url::parse(landing_url).map_err(|_| ConfigError::InvalidLandingUrl {
            url: landing_url.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidLandingUrl {
                url: landing_url.to_string(),
            });
        }
        Ok(Self {
            landing_url: url,
            link_patterns: compile_all(link_patterns)?,
            exclude_patterns: compile_all(exclude_patterns)?,
        })
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub workers: usize,
    pub http: HttpSettings,
    pub sites: Vec<SiteConfig>,
    pub date_rules: Vec<DateRule>,
    pub date_formats: Vec<ParseFormat>,
}

impl AppConfig {
    /// The bundled crawl table.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if raw.sites.is_empty() {
            return Err(ConfigError::NoSites);
        }

        let sites = raw
            .sites
            .iter()
            .map(|s| {
                let links: Vec<&str> = s.link_patterns.iter().map(String::as_str).collect();
                let excludes: Vec<&str> = s.exclude_patterns.iter().map(String::as_str).collect();
                SiteConfig::new(&s.landing_url, &links, &excludes)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let date_rules = raw
            .date_rules
            .into_iter()
            .map(|r| match (r.search, r.child_index) {
                (Some(_), Some(_)) => Err(ConfigError::AmbiguousRule { tag: r.tag }),
                (Some(search), None) => DateRule::text_match(&r.tag, &search),
                (None, Some(index)) => DateRule::child_index(&r.tag, index),
                (None, None) => DateRule::whole_element(&r.tag),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let date_formats = raw
            .date_formats
            .iter()
            .map(|t| ParseFormat::new(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            workers: raw.workers,
            http: HttpSettings {
                timeout: raw.request_timeout_secs.map(Duration::from_secs),
                user_agent: raw.user_agent,
            },
            sites,
            date_rules,
            date_formats,
        })
    }
}

/// Read and validate a YAML configuration file.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = AppConfig::from_yaml(&yaml)?;
    info!(
        sites = config.sites.len(),
        date_rules = config.date_rules.len(),
        date_formats = config.date_formats.len(),
        workers = config.workers,
        "Loaded configuration"
    );
    Ok(config)
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}
