//! Job posting parser
//!
//! Turns job posting pages and loosely-typed posting objects into
//! normalized records:
//! - CSS locator chains per field, with JSON-LD and OpenGraph fallback
//! - Heuristic job type and experience classification
//! - Canonical defaults, markup stripping and deadline derivation
//! - Concurrent batch parsing with per-item failure isolation
//!
//! A C ABI over the synchronous parts lives in [`ffi`].

pub mod classify;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod ffi;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod salary;
pub mod store;

pub use classify::{classify, detect_experience, detect_job_type};
pub use config::ParserConfig;
pub use error::{ConfigError, ExtractionError, FetchError, ParseError, ParseResult, StoreError};
pub use fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use normalize::{clean_text, normalize, normalize_at};
pub use pipeline::{parse_document, BatchResult, JobParser};
pub use record::{FieldMap, JobType, NormalizedJobRecord, RawSource};
pub use salary::{SalaryFilter, SalaryRange};
pub use store::{IngestReport, JobStore, MemoryJobStore, StoredJob};
