//! Heuristic classification of free text
//!
//! Both classifiers are total: they never fail and always return a value.
//! Rules live in static ordered tables evaluated top-down, first match wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::{FieldMap, JobType};

/// Band returned when no experience rule matches
pub const EXPERIENCE_NOT_SPECIFIED: &str = "Not specified";

/// Employment types in the order they are tested
pub const JOB_TYPE_ORDER: [JobType; 4] = [
    JobType::FullTime,
    JobType::PartTime,
    JobType::Contract,
    JobType::Internship,
];

/// One experience rule: if `pattern` matches, the band is `template`
/// expanded against the captures (`$n`/`${name}` syntax).
pub struct ExperienceRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub template: &'static str,
}

impl ExperienceRule {
    fn new(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("experience rule pattern is valid"),
            template,
        }
    }

    /// The band this rule assigns to `text`, if it applies.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let mut band = String::new();
        caps.expand(self.template, &mut band);
        Some(band)
    }
}

/// Ordered experience rules.
///
/// The single-number rule skips a number preceded by a dash (the upper end
/// of a range) so "2 - 4 years" falls through to the range rule. An
/// open-ended upper end ("10 - 15+ years") still counts as `N+ years`.
pub static EXPERIENCE_RULES: LazyLock<Vec<ExperienceRule>> = LazyLock::new(|| {
    vec![
        ExperienceRule::new(
            "years",
            r"(?i)(?:(?:^|[^\d\s\-–])\s*(?P<n>\d+)\+?|(?P<open>\d+)\+)\s*years?",
            "${n}${open}+ years",
        ),
        ExperienceRule::new(
            "year_range",
            r"(?i)(?P<n>\d+)\s*[\-–]\s*(?P<m>\d+)\s*years?",
            "${n}-${m} years",
        ),
        ExperienceRule::new("entry_level", r"(?i)entry\s*level", "Entry Level"),
        ExperienceRule::new("senior", r"(?i)senior", "5+ years"),
        ExperienceRule::new("lead", r"(?i)lead", "3+ years"),
    ]
});

/// Employment type mentioned in `text`.
///
/// Case-insensitive substring search over the canonical labels in
/// `JOB_TYPE_ORDER`; defaults to `Full-time`.
pub fn detect_job_type(text: &str) -> JobType {
    let lower = text.to_lowercase();
    JOB_TYPE_ORDER
        .into_iter()
        .find(|t| lower.contains(&t.label().to_lowercase()))
        .unwrap_or_default()
}

/// Experience band implied by `text`, or `"Not specified"`.
pub fn detect_experience(text: &str) -> String {
    EXPERIENCE_RULES
        .iter()
        .find_map(|rule| rule.apply(text))
        .unwrap_or_else(|| EXPERIENCE_NOT_SPECIFIED.to_string())
}

/// Fill the derived attributes of a field map.
///
/// Values already present (caller- or page-supplied) are kept.
pub fn classify(fields: &mut FieldMap) {
    if fields.job_type.is_none() {
        fields.job_type = Some(detect_job_type(&fields.description));
    }
    if fields.experience.as_deref().map_or(true, |e| e.trim().is_empty()) {
        fields.experience = Some(detect_experience(&fields.requirements));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_job_type_labels() {
        assert_eq!(detect_job_type("This is a PART-TIME role"), JobType::PartTime);
        assert_eq!(detect_job_type("6 month contract"), JobType::Contract);
        assert_eq!(detect_job_type("Summer internship program"), JobType::Internship);
        assert_eq!(detect_job_type("Nothing relevant"), JobType::FullTime);
        assert_eq!(detect_job_type(""), JobType::FullTime);
    }

    #[test]
    fn test_job_type_order_wins() {
        // Both labels present: Full-time is tested first
        assert_eq!(
            detect_job_type("Part-time now, full-time after probation"),
            JobType::FullTime
        );
        assert_eq!(
            detect_job_type("Contract internship"),
            JobType::Contract
        );
    }

    #[test]
    fn test_experience_examples() {
        assert_eq!(detect_experience("5+ years experience required"), "5+ years");
        assert_eq!(detect_experience("2 - 4 years"), "2-4 years");
        assert_eq!(detect_experience("entry level"), "Entry Level");
        assert_eq!(detect_experience(""), "Not specified");
    }

    #[test]
    fn test_experience_single_number() {
        assert_eq!(detect_experience("At least 3 years of Rust"), "3+ years");
        assert_eq!(detect_experience("1 year minimum"), "1+ years");
        assert_eq!(detect_experience("10+years"), "10+ years");
    }

    #[test]
    fn test_experience_range_forms() {
        assert_eq!(detect_experience("3-5 years in backend"), "3-5 years");
        assert_eq!(detect_experience("Requires 2 – 4 Years"), "2-4 years");
        assert_eq!(detect_experience("10 - 15+ years of experience"), "15+ years");
        assert_eq!(detect_experience("3-5+ yrs, or 7 years"), "7+ years");
    }

    #[test]
    fn test_experience_keywords() {
        assert_eq!(detect_experience("Entry-Level welcome"), "Not specified");
        assert_eq!(detect_experience("EntryLevel"), "Entry Level");
        assert_eq!(detect_experience("Senior engineer"), "5+ years");
        assert_eq!(detect_experience("Team lead"), "3+ years");
        // Numbers beat keywords
        assert_eq!(detect_experience("Senior, 8 years"), "8+ years");
        // Senior beats lead
        assert_eq!(detect_experience("Senior tech lead"), "5+ years");
    }

    #[test]
    fn test_classify_keeps_supplied_values() {
        let mut fields = FieldMap {
            description: "internship".into(),
            requirements: "senior".into(),
            job_type: Some(JobType::Contract),
            experience: Some("Any".into()),
            ..Default::default()
        };
        classify(&mut fields);
        assert_eq!(fields.job_type, Some(JobType::Contract));
        assert_eq!(fields.experience.as_deref(), Some("Any"));

        let mut fields = FieldMap {
            description: "internship".into(),
            requirements: "senior".into(),
            ..Default::default()
        };
        classify(&mut fields);
        assert_eq!(fields.job_type, Some(JobType::Internship));
        assert_eq!(fields.experience.as_deref(), Some("5+ years"));
    }

    proptest! {
        #[test]
        fn prop_job_type_is_canonical(text in ".{0,200}") {
            let t = detect_job_type(&text);
            prop_assert!(JOB_TYPE_ORDER.contains(&t));
        }

        #[test]
        fn prop_experience_is_a_known_band(text in "[a-zA-Z0-9 +\\-]{0,80}") {
            let band = detect_experience(&text);
            let ok = band == EXPERIENCE_NOT_SPECIFIED
                || band == "Entry Level"
                || band.ends_with(" years");
            prop_assert!(ok, "unexpected band {:?}", band);
        }
    }
}
