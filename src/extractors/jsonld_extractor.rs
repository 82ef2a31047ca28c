//! schema.org JobPosting extraction from JSON-LD
//!
//! Reads <script type="application/ld+json"> blocks, including @graph
//! arrays, and maps the first JobPosting found onto a field map.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::record::{parse_date, value_to_text, FieldMap, JobType};

static JSONLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("JSON-LD selector is valid")
});

/// First JobPosting object in the document's JSON-LD, if any.
pub fn find_job_posting(document: &Html) -> Option<Value> {
    document.select(&JSONLD_SELECTOR).find_map(|element| {
        let content = element.inner_html();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let json = serde_json::from_str::<Value>(trimmed).ok()?;
        find_typed(&json, "JobPosting").cloned()
    })
}

/// Depth-first search for an object whose @type includes `wanted`.
fn find_typed<'a>(value: &'a Value, wanted: &str) -> Option<&'a Value> {
    match value {
        Value::Array(items) => items.iter().find_map(|item| find_typed(item, wanted)),
        Value::Object(obj) => {
            if has_type(value, wanted) {
                return Some(value);
            }
            obj.get("@graph").and_then(|graph| find_typed(graph, wanted))
        }
        _ => None,
    }
}

fn has_type(value: &Value, wanted: &str) -> bool {
    let strip = |t: &str| -> String {
        t.strip_prefix("https://schema.org/")
            .or_else(|| t.strip_prefix("http://schema.org/"))
            .unwrap_or(t)
            .to_string()
    };
    match value.get("@type") {
        Some(Value::String(s)) => strip(s) == wanted,
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| strip(t) == wanted),
        _ => false,
    }
}

/// Map a JobPosting object onto a field map.
///
/// `employmentType` and `validThrough` land in the explicit `job_type` and
/// `deadline` slots. `datePosted` is ignored.
pub fn job_posting_fields(posting: &Value) -> FieldMap {
    FieldMap {
        title: first_text(posting, &["title", "name"]),
        company: posting
            .get("hiringOrganization")
            .map(named_text)
            .unwrap_or_default(),
        location: job_location(posting),
        description: first_text(posting, &["description"]),
        requirements: first_text(
            posting,
            &["qualifications", "experienceRequirements", "skills", "educationRequirements"],
        ),
        salary: posting.get("baseSalary").map(salary_text).unwrap_or_default(),
        job_type: employment_type(posting.get("employmentType")),
        experience: None,
        posted_date: None,
        deadline: posting.get("validThrough").and_then(parse_date),
        source_url: None,
    }
}

fn first_text(obj: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .map(named_text)
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

/// Plain value, or the `name`/`description` of a nested object
fn named_text(value: &Value) -> String {
    match value {
        Value::Object(obj) => obj
            .get("name")
            .or_else(|| obj.get("description"))
            .map(value_to_text)
            .unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .map(named_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => value_to_text(other),
    }
}

fn job_location(posting: &Value) -> String {
    let remote = posting
        .get("jobLocationType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("TELECOMMUTE"));

    let places: Vec<String> = match posting.get("jobLocation") {
        Some(Value::Array(items)) => items.iter().map(place_text).collect(),
        Some(place) => vec![place_text(place)],
        None => vec![],
    };
    let mut places: Vec<String> = places.into_iter().filter(|p| !p.is_empty()).collect();

    if remote {
        places.insert(0, "Remote".to_string());
    }
    places.join("; ")
}

fn place_text(place: &Value) -> String {
    let address = match place.get("address") {
        Some(address) => address,
        None => return named_text(place),
    };
    match address {
        Value::Object(_) => {
            let parts: Vec<String> = ["streetAddress", "addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|k| address.get(*k))
                .map(named_text)
                .filter(|s| !s.trim().is_empty())
                .collect();
            parts.join(", ")
        }
        other => value_to_text(other),
    }
}

fn employment_type(value: Option<&Value>) -> Option<JobType> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find_map(|s| s.parse().ok()),
        _ => None,
    }
}

/// Render a MonetaryAmount as display text.
///
/// USD amounts are written as "$50,000 - $70,000 per year" so the salary
/// parser can read them back.
fn salary_text(base: &Value) -> String {
    let currency = base
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_uppercase();

    let (min, max, unit) = match base.get("value") {
        Some(Value::Object(q)) => {
            let exact = q.get("value").and_then(Value::as_f64);
            (
                q.get("minValue").and_then(Value::as_f64).or(exact),
                q.get("maxValue").and_then(Value::as_f64),
                q.get("unitText").and_then(Value::as_str),
            )
        }
        Some(v) => (v.as_f64().or_else(|| v.as_str()?.parse().ok()), None, None),
        None => (None, None, None),
    };

    let min = match min {
        Some(min) => min,
        None => return String::new(),
    };
    let fmt = |amount: f64| {
        if currency == "USD" {
            format!("${}", group_thousands(amount))
        } else if currency.is_empty() {
            group_thousands(amount)
        } else {
            format!("{} {}", currency, group_thousands(amount))
        }
    };

    let mut text = match max {
        Some(max) if max > min => format!("{} - {}", fmt(min), fmt(max)),
        _ => fmt(min),
    };
    if let Some(unit) = unit {
        text.push_str(" per ");
        text.push_str(&unit.to_lowercase());
    }
    text
}

fn group_thousands(amount: f64) -> String {
    let whole = amount.round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const POSTING_HTML: &str = r#"
    <html>
    <head>
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "Organization", "name": "Ignore Me"}
        </script>
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "WebPage", "name": "Careers"},
                {
                    "@type": "JobPosting",
                    "title": "Platform Engineer",
                    "description": "<p>Run the platform.</p>",
                    "hiringOrganization": {"@type": "Organization", "name": "Initech"},
                    "jobLocation": {
                        "@type": "Place",
                        "address": {
                            "@type": "PostalAddress",
                            "addressLocality": "Austin",
                            "addressRegion": "TX",
                            "addressCountry": "US"
                        }
                    },
                    "employmentType": ["PART_TIME", "CONTRACTOR"],
                    "validThrough": "2025-09-30T23:59:00Z",
                    "qualifications": "3+ years of Kubernetes",
                    "baseSalary": {
                        "@type": "MonetaryAmount",
                        "currency": "USD",
                        "value": {"@type": "QuantitativeValue", "minValue": 95000, "maxValue": 125000, "unitText": "YEAR"}
                    }
                }
            ]
        }
        </script>
    </head>
    </html>
    "#;

    #[test]
    fn test_find_posting_in_graph() {
        let document = Html::parse_document(POSTING_HTML);
        let posting = find_job_posting(&document).unwrap();
        assert_eq!(posting["title"], "Platform Engineer");
    }

    #[test]
    fn test_posting_fields() {
        let document = Html::parse_document(POSTING_HTML);
        let fields = job_posting_fields(&find_job_posting(&document).unwrap());
        assert_eq!(fields.title, "Platform Engineer");
        assert_eq!(fields.company, "Initech");
        assert_eq!(fields.location, "Austin, TX, US");
        assert_eq!(fields.requirements, "3+ years of Kubernetes");
        assert_eq!(fields.salary, "$95,000 - $125,000 per year");
        assert_eq!(fields.job_type, Some(JobType::PartTime));
        assert_eq!(
            fields.deadline,
            Some(Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 0).unwrap())
        );
        assert_eq!(fields.posted_date, None);
    }

    #[test]
    fn test_remote_and_plain_values() {
        let posting = serde_json::json!({
            "@type": "https://schema.org/JobPosting",
            "name": "Writer",
            "hiringOrganization": "Freelance Guild",
            "jobLocationType": "TELECOMMUTE",
            "baseSalary": {"currency": "EUR", "value": 40000}
        });
        let fields = job_posting_fields(&posting);
        assert_eq!(fields.title, "Writer");
        assert_eq!(fields.company, "Freelance Guild");
        assert_eq!(fields.location, "Remote");
        assert_eq!(fields.salary, "EUR 40,000");
        assert_eq!(fields.job_type, None);
    }

    #[test]
    fn test_no_posting() {
        let document = Html::parse_document(
            r#"<script type="application/ld+json">not json</script><p>hi</p>"#,
        );
        assert!(find_job_posting(&document).is_none());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
    }
}
