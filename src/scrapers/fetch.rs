//! HTTP fetch primitive.
//!
//! [`Fetcher`] is the seam between the pipeline and the network: discovery
//! and the worker pool only ever call `fetch`. [`HttpFetcher`] is the real
//! implementation and shares one `reqwest::Client` (and so one connection
//! pool) across every caller.

use crate::config::HttpSettings;
use crate::models::{FetchErrorKind, FetchedPage};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// A classified fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{link} is not a valid http(s) URL: {reason}")]
    InvalidUrl { link: String, reason: String },
    #[error("{link} returned HTTP {status}")]
    Status { link: String, status: u16 },
    #[error("{link} could not be reached: {reason}")]
    Connection { link: String, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => FetchErrorKind::InvalidUrl,
            FetchError::Status { .. } => FetchErrorKind::StatusError,
            FetchError::Connection { .. } => FetchErrorKind::ConnectionError,
        }
    }
}

/// Something that can GET a URL.
pub trait Fetcher {
    /// Fetch `link`, returning the body and the post-redirect URL.
    async fn fetch(&self, link: &str) -> Result<FetchedPage, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &settings.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, link: &str) -> Result<FetchedPage, FetchError> {
        let url = Url::parse(link).map_err(|e| FetchError::InvalidUrl {
            link: link.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                link: link.to_string(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(link, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                link: link.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify(link, e))?;
        debug!(%final_url, bytes = body.len(), "Fetched page");
        Ok(FetchedPage { final_url, body })
    }
}

fn classify(link: &str, err: reqwest::Error) -> FetchError {
    if err.is_builder() {
        FetchError::InvalidUrl {
            link: link.to_string(),
            reason: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        FetchError::Status {
            link: link.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Connection {
            link: link.to_string(),
            reason: err.to_string(),
        }
    }
}
