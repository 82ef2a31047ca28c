//! US-dollar salary parsing
//!
//! Deliberately narrow: amounts need a leading `$`, may use comma thousands
//! separators and a `K` suffix. Other currencies and locales are not
//! recognised and parse to `None`; the free-text salary field is kept as-is
//! on the record either way.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static SALARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\$\s*(?P<min>\d[\d,]*(?:\.\d+)?)\s*(?P<min_k>k)?(?:\s*(?:-|–|to)\s*\$?\s*(?P<max>\d[\d,]*(?:\.\d+)?)\s*(?P<max_k>k)?)?",
    )
    .expect("salary regex is valid")
});

/// Annual salary bounds in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
}

impl SalaryRange {
    /// Parse the first dollar amount or range found in `text`.
    ///
    /// `"$50,000 - $70,000"` gives 50000..70000, `"$80K"` gives 80000..80000.
    /// An inverted range is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = SALARY_RE.captures(text)?;
        let min = amount(&caps, "min", "min_k")?;
        let max = match caps.name("max") {
            Some(_) => {
                // "$80-100K" means both ends are thousands
                let max_k = caps.name("max_k").is_some();
                let min = if max_k && caps.name("min_k").is_none() && min < 1000 {
                    min * 1000
                } else {
                    min
                };
                let max = amount(&caps, "max", "max_k")?;
                return (min <= max).then_some(Self { min, max });
            }
            None => min,
        };
        Some(Self { min, max })
    }

    /// True when the two ranges overlap.
    pub fn overlaps(&self, other: &SalaryRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

fn amount(caps: &Captures<'_>, digits: &str, suffix: &str) -> Option<u64> {
    let raw: String = caps
        .name(digits)?
        .as_str()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value: f64 = raw.parse().ok()?;
    let value = if caps.name(suffix).is_some() {
        value * 1000.0
    } else {
        value
    };
    Some(value.round() as u64)
}

/// Search filter of the form `"50000-70000"` or `"50000"`.
///
/// Non-digits on each side of the dash are ignored, so `"$50k-$70k"` reads
/// as 50..70, not thousands. Matches the loose query-string convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryFilter {
    pub min: u64,
    pub max: Option<u64>,
}

impl SalaryFilter {
    pub fn parse(filter: &str) -> Option<Self> {
        let mut parts = filter.splitn(2, '-').map(|part| {
            part.chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
                .parse::<u64>()
                .ok()
        });
        let min = parts.next().flatten()?;
        let max = parts.next().flatten();
        Some(Self { min, max })
    }

    /// Whether a posting's salary range satisfies this filter.
    pub fn matches(&self, range: &SalaryRange) -> bool {
        match self.max {
            Some(max) => range.overlaps(&SalaryRange { min: self.min, max }),
            None => range.max >= self.min,
        }
    }
}
