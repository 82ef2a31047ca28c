//! Parsing pipeline: fetch -> extract -> classify -> normalize
//!
//! `parse_one` surfaces errors to the caller. `parse_many` runs one task per
//! source and turns failures into omissions, so one bad source never aborts
//! its siblings. `parse_bulk` skips fetching and extraction and cannot fail.

use std::sync::Arc;

use chrono::Utc;
use scraper::Html;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::config::ParserConfig;
use crate::error::{ExtractionError, FetchResult, ParseResult};
use crate::extractors::extract_fields;
use crate::fetch::{Fetcher, HttpFetcher, StaticFetcher};
use crate::normalize::normalize_at;
use crate::record::{FieldMap, NormalizedJobRecord, RawSource};

/// Check that a fetched body is usable markup.
pub fn decode_document(body: &[u8]) -> Result<&str, ExtractionError> {
    let html = std::str::from_utf8(body).map_err(|_| ExtractionError::InvalidEncoding)?;
    if html.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(html)
}

/// Raw field map for a posting page.
pub fn extract_document(html: &str, structured_fallback: bool) -> FieldMap {
    let document = Html::parse_document(html);
    extract_fields(&document, structured_fallback)
}

/// Classify and normalize a field map into a record.
pub fn build_record(mut fields: FieldMap, config: &ParserConfig) -> NormalizedJobRecord {
    classify(&mut fields);
    normalize_at(fields, Utc::now(), config.deadline_days)
}

/// Full pipeline for an already-fetched document.
pub fn parse_document(
    body: &[u8],
    source_url: Option<&str>,
    config: &ParserConfig,
) -> Result<NormalizedJobRecord, ExtractionError> {
    let html = decode_document(body)?;
    let mut fields = extract_document(html, config.structured_data_fallback);
    fields.source_url = source_url.map(String::from);
    Ok(build_record(fields, config))
}

/// Outcome of `parse_many`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    /// Successfully parsed records, in input order
    pub records: Vec<NormalizedJobRecord>,
    /// Sources that failed and were left out
    pub failed: usize,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<NormalizedJobRecord> {
        self.records
    }
}

/// Entry point for turning postings into normalized records.
///
/// Cheap to clone; clones share the fetcher.
#[derive(Clone)]
pub struct JobParser {
    fetcher: Arc<dyn Fetcher>,
    config: Arc<ParserConfig>,
}

impl JobParser {
    pub fn new<F: Fetcher + 'static>(fetcher: F, config: ParserConfig) -> Self {
        Self::with_shared_fetcher(Arc::new(fetcher), config)
    }

    pub fn with_shared_fetcher(fetcher: Arc<dyn Fetcher>, config: ParserConfig) -> Self {
        Self {
            fetcher,
            config: Arc::new(config),
        }
    }

    /// Parser backed by an `HttpFetcher` built from `config`.
    pub fn http(config: ParserConfig) -> FetchResult<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(fetcher, config))
    }

    /// Parser for record sources only; no HTTP client is built and URL
    /// sources fail as not found.
    pub fn offline(config: ParserConfig) -> Self {
        Self::new(StaticFetcher::new(), config)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse an already-fetched document.
    pub fn parse_html(
        &self,
        body: &[u8],
        source_url: Option<&str>,
    ) -> Result<NormalizedJobRecord, ExtractionError> {
        parse_document(body, source_url, &self.config)
    }

    /// Classify and normalize one loosely-typed record. Never fails.
    pub fn parse_record(&self, record: &Map<String, Value>) -> NormalizedJobRecord {
        build_record(FieldMap::from_json(record), &self.config)
    }

    /// Fetch and parse one posting URL.
    pub async fn parse_one(&self, url: &str) -> ParseResult<NormalizedJobRecord> {
        let body = self.fetcher.fetch(url).await?;
        debug!(url = %url, bytes = body.len(), "extracting job posting");
        Ok(self.parse_html(&body, Some(url))?)
    }

    /// Parse any raw source: URLs are fetched, records are taken as-is.
    pub async fn parse_source(&self, source: &RawSource) -> ParseResult<NormalizedJobRecord> {
        match source {
            RawSource::Url(url) => self.parse_one(url).await,
            RawSource::Record(record) => Ok(self.parse_record(record)),
        }
    }

    /// Parse many sources concurrently with per-item failure isolation.
    ///
    /// Each source runs in its own task; at most `max_concurrent_fetches`
    /// URL sources are in flight at once. Failed sources (including
    /// panicked tasks) are logged and counted, never propagated. Must be
    /// called within a tokio runtime.
    pub async fn parse_many<I>(&self, sources: I) -> BatchResult
    where
        I: IntoIterator<Item = RawSource>,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));

        let handles: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let parser = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let label = source.describe();
                let handle = tokio::spawn(async move {
                    // Records never touch the network, so they skip the gate
                    let _permit = match source {
                        RawSource::Url(_) => semaphore.acquire_owned().await.ok(),
                        RawSource::Record(_) => None,
                    };
                    parser.parse_source(&source).await
                });
                (label, handle)
            })
            .collect();

        let total = handles.len();
        let mut result = BatchResult {
            records: Vec::with_capacity(total),
            failed: 0,
        };

        for (label, handle) in handles {
            match handle.await {
                Ok(Ok(record)) => result.records.push(record),
                Ok(Err(e)) => {
                    result.failed += 1;
                    warn!(source = %label, error = %e, "skipping job source");
                }
                Err(e) => {
                    result.failed += 1;
                    warn!(source = %label, error = %e, "job source task aborted");
                }
            }
        }

        info!(
            total,
            parsed = result.records.len(),
            failed = result.failed,
            "batch parse complete"
        );
        result
    }

    /// Classify and normalize pre-structured records. Total: one output per input.
    pub fn parse_bulk(&self, records: &[Map<String, Value>]) -> Vec<NormalizedJobRecord> {
        let parsed: Vec<_> = records.iter().map(|r| self.parse_record(r)).collect();
        info!(count = parsed.len(), "bulk records normalized");
        parsed
    }
}

impl std::fmt::Debug for JobParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobParser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
