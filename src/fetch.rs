//! Document fetching
//!
//! The pipeline only needs raw markup for a URL. Retries, caching and
//! politeness belong to the `Fetcher` implementation, not the pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::config::ParserConfig;
use crate::error::{FetchError, FetchResult};

/// Retrieves raw markup for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Raw document bytes. Non-2xx responses, timeouts and transport
    /// failures are errors.
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        (**self).fetch(url).await
    }
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_url(url: &str) -> FetchResult<Url> {
    let invalid = || FetchError::InvalidUrl {
        url: url.to_string(),
    };
    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(invalid()),
    }
}

/// `Fetcher` over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Client with the configured timeout and user agent.
    pub fn new(config: &ParserConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(Box::new(e)))?;
        Ok(Self { client })
    }

    /// Use a caller-configured client (proxies, custom TLS, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        let parsed = validate_url(url)?;
        debug!(url = %url, "HTTP fetch starting");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // text() honours the charset in Content-Type, so the body is UTF-8 from here on
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, e))?;
        debug!(url = %url, bytes = body.len(), "HTTP fetch complete");
        Ok(body.into_bytes())
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: Box::new(e),
        }
    }
}

#[derive(Debug, Clone)]
enum CannedResponse {
    Body(Vec<u8>),
    Status(u16),
    Timeout,
}

/// In-memory fetcher with canned responses.
///
/// Unknown URLs answer 404. Useful for tests and for replaying pages that
/// were fetched elsewhere.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    responses: Arc<RwLock<HashMap<String, CannedResponse>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url.into(), CannedResponse::Body(body.into()));
        self
    }

    /// Answer `url` with an HTTP error status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.insert(url.into(), CannedResponse::Status(status));
        self
    }

    /// Answer `url` with a timeout.
    pub fn with_timeout(self, url: impl Into<String>) -> Self {
        self.insert(url.into(), CannedResponse::Timeout);
        self
    }

    /// Number of fetches served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn insert(&self, url: String, response: CannedResponse) {
        self.responses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url, response);
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned();

        match response {
            Some(CannedResponse::Body(body)) => Ok(body),
            Some(CannedResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(CannedResponse::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
