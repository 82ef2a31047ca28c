//! Parser configuration
//!
//! Defaults suit one-off parsing; `from_env` lets deployments tune the
//! fetcher and batch fan-out without code changes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "JobParser/0.1 (+https://github.com/job-parser)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;
pub const DEFAULT_DEADLINE_DAYS: i64 = 30;

/// Runtime settings shared by every pipeline call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// User-Agent header sent by the HTTP fetcher
    pub user_agent: String,
    /// Per-request timeout for the HTTP fetcher
    pub request_timeout_secs: u64,
    /// Upper bound on in-flight fetches during `parse_many`
    pub max_concurrent_fetches: usize,
    /// Days added to the posted date when no deadline is supplied
    pub deadline_days: i64,
    /// Fill fields the locator chains missed from JSON-LD / OpenGraph
    pub structured_data_fallback: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            deadline_days: DEFAULT_DEADLINE_DAYS,
            structured_data_fallback: true,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON document. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Defaults overridden by `JOB_PARSER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (environment in production).
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ua) = lookup("JOB_PARSER_USER_AGENT") {
            self.user_agent = ua;
        }
        if let Some(v) = lookup("JOB_PARSER_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_value("JOB_PARSER_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("JOB_PARSER_MAX_CONCURRENCY") {
            self.max_concurrent_fetches = parse_value("JOB_PARSER_MAX_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("JOB_PARSER_DEADLINE_DAYS") {
            self.deadline_days = parse_value("JOB_PARSER_DEADLINE_DAYS", &v)?;
        }
        if let Some(v) = lookup("JOB_PARSER_STRUCTURED_FALLBACK") {
            self.structured_data_fallback = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid("JOB_PARSER_STRUCTURED_FALLBACK", &v)),
            };
        }
        self.validate()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    pub fn with_deadline_days(mut self, days: i64) -> Self {
        self.deadline_days = days;
        self
    }

    pub fn with_structured_data_fallback(mut self, enabled: bool) -> Self {
        self.structured_data_fallback = enabled;
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_concurrent_fetches == 0 {
            return Err(invalid("max_concurrent_fetches", "0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "0"));
        }
        if self.deadline_days < 0 {
            return Err(invalid("deadline_days", &self.deadline_days.to_string()));
        }
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
