//! Persistence collaborator for parsed records.
//!
//! The parser never owns storage. `ingest_many` hands each record to a
//! `JobStore` and reports store failures per record, alongside the sources
//! that failed to parse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::pipeline::JobParser;
use crate::record::{NormalizedJobRecord, RawSource};

/// A record as persisted, with its storage-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredJob {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: NormalizedJobRecord,
}

/// Destination for normalized records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn store(&self, record: NormalizedJobRecord) -> Result<StoredJob, StoreError>;
}

/// In-memory `JobStore` for tests and one-shot CLI runs.
///
/// Ids are assigned sequentially from 1. With `reject_duplicates`, a record
/// whose title and company match a stored one is refused.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<Vec<StoredJob>>,
    next_id: AtomicU64,
    reject_duplicates: bool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reject_duplicates(mut self, reject: bool) -> Self {
        self.reject_duplicates = reject;
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything stored, in insertion order.
    pub fn jobs(&self) -> Vec<StoredJob> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn store(&self, record: NormalizedJobRecord) -> Result<StoredJob, StoreError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);

        if self.reject_duplicates
            && jobs
                .iter()
                .any(|j| j.record.title == record.title && j.record.company == record.company)
        {
            return Err(StoreError::Constraint(format!(
                "duplicate posting {:?} at {:?}",
                record.title, record.company
            )));
        }

        let stored = StoredJob {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            created_at: Utc::now(),
            record,
        };
        jobs.push(stored.clone());
        Ok(stored)
    }
}

/// A record that parsed but could not be stored.
#[derive(Debug)]
pub struct StoreFailure {
    pub title: String,
    pub error: StoreError,
}

/// Outcome of `ingest_many` / `store_all`.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Persisted records, in input order
    pub stored: Vec<StoredJob>,
    /// Sources that failed to fetch or extract
    pub parse_failures: usize,
    pub store_failures: Vec<StoreFailure>,
}

impl IngestReport {
    pub fn failed(&self) -> usize {
        self.parse_failures + self.store_failures.len()
    }
}

/// Store every record concurrently. Failures are collected, never propagated.
pub async fn store_all<S>(store: &S, records: Vec<NormalizedJobRecord>) -> IngestReport
where
    S: JobStore + ?Sized,
{
    let titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
    let outcomes = join_all(records.into_iter().map(|record| store.store(record))).await;

    let mut report = IngestReport::default();
    for (title, outcome) in titles.into_iter().zip(outcomes) {
        match outcome {
            Ok(stored) => report.stored.push(stored),
            Err(error) => {
                warn!(title = %title, error = %error, "failed to store job");
                report.store_failures.push(StoreFailure { title, error });
            }
        }
    }
    report
}

impl JobParser {
    /// `parse_many` followed by storing each parsed record.
    pub async fn ingest_many<S, I>(&self, store: &S, sources: I) -> IngestReport
    where
        S: JobStore + ?Sized,
        I: IntoIterator<Item = RawSource>,
    {
        let batch = self.parse_many(sources).await;
        let parse_failures = batch.failed;
        let mut report = store_all(store, batch.records).await;
        report.parse_failures = parse_failures;

        info!(
            stored = report.stored.len(),
            parse_failures = report.parse_failures,
            store_failures = report.store_failures.len(),
            "ingest complete"
        );
        report
    }
}
