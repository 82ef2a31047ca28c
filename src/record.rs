//! Job posting data model
//!
//! `FieldMap` is what extraction produces and what bulk callers hand us;
//! `NormalizedJobRecord` is the only thing that leaves the pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::salary::SalaryRange;

/// Employment type of a posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    Contract,
    #[serde(rename = "Internship")]
    Internship,
}

impl JobType {
    /// Canonical display label
    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string is not one of the four employment types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job type: {0:?}")]
pub struct UnknownJobType(pub String);

impl FromStr for JobType {
    type Err = UnknownJobType;

    /// Accepts the canonical labels plus schema.org spellings
    /// (`FULL_TIME`, `PART_TIME`, `CONTRACTOR`, `INTERN`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "fulltime" => Ok(JobType::FullTime),
            "parttime" => Ok(JobType::PartTime),
            "contract" | "contractor" => Ok(JobType::Contract),
            "internship" | "intern" => Ok(JobType::Internship),
            _ => Err(UnknownJobType(s.to_string())),
        }
    }
}

/// Intermediate field map, prior to classification and normalization.
///
/// Empty strings mean "not found". The optional slots hold values a caller
/// (or structured data on the page) supplied explicitly; they take
/// precedence over anything the classifier or normalizer would derive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub salary: String,
    pub job_type: Option<JobType>,
    pub experience: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field map from a loosely-typed JSON object.
    ///
    /// Never fails: unknown keys are ignored, wrong-typed values are
    /// stringified or dropped, and missing fields stay empty.
    pub fn from_json(obj: &Map<String, Value>) -> Self {
        Self {
            title: text_field(obj, &["title"]),
            company: text_field(obj, &["company", "companyName", "company_name"]),
            location: text_field(obj, &["location"]),
            description: text_field(obj, &["description"]),
            requirements: text_field(obj, &["requirements"]),
            salary: text_field(obj, &["salary"]),
            job_type: lookup(obj, &["type", "jobType", "job_type"])
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            experience: Some(text_field(obj, &["experience"])).filter(|s| !s.trim().is_empty()),
            posted_date: lookup(obj, &["postedDate", "posted_date"]).and_then(parse_date),
            deadline: lookup(obj, &["deadline"]).and_then(parse_date),
            source_url: lookup(obj, &["url", "sourceUrl", "source_url"])
                .and_then(Value::as_str)
                .map(String::from),
        }
    }
}

impl From<NormalizedJobRecord> for FieldMap {
    fn from(record: NormalizedJobRecord) -> Self {
        Self {
            title: record.title,
            company: record.company,
            location: record.location,
            description: record.description,
            requirements: record.requirements,
            salary: record.salary,
            job_type: Some(record.job_type),
            experience: Some(record.experience),
            posted_date: Some(record.posted_date),
            deadline: Some(record.deadline),
            source_url: record.source_url,
        }
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(obj, keys).map(value_to_text).unwrap_or_default()
}

/// Stringify a JSON value the way a form field would show it.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// RFC 3339, bare `YYYY-MM-DD`, or epoch milliseconds.
pub(crate) fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// One raw input to the bulk pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSource {
    /// Posting page to fetch and extract
    Url(String),
    /// Already-structured posting; skips fetch and extraction
    Record(Map<String, Value>),
}

impl RawSource {
    /// Short label for log lines
    pub fn describe(&self) -> String {
        match self {
            RawSource::Url(url) => url.clone(),
            RawSource::Record(obj) => match obj.get("title").and_then(Value::as_str) {
                Some(title) => format!("record {:?}", title),
                None => "record".to_string(),
            },
        }
    }
}

impl From<&str> for RawSource {
    fn from(url: &str) -> Self {
        RawSource::Url(url.to_string())
    }
}

impl From<String> for RawSource {
    fn from(url: String) -> Self {
        RawSource::Url(url)
    }
}

impl From<Map<String, Value>> for RawSource {
    fn from(obj: Map<String, Value>) -> Self {
        RawSource::Record(obj)
    }
}

/// Normalized job posting. Every field is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedJobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub requirements: String,
    pub salary: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub experience: String,
    pub posted_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl NormalizedJobRecord {
    /// Parsed salary range, when the salary text is a US-dollar amount or range.
    pub fn salary_range(&self) -> Option<SalaryRange> {
        SalaryRange::parse(&self.salary)
    }
}
