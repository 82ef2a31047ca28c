//! Field extraction from a parsed posting page
//!
//! CSS locator chains are authoritative. When enabled, JSON-LD JobPosting
//! data and then OpenGraph/meta tags fill only the fields the chains left
//! empty.

mod css_extractor;
mod jsonld_extractor;
mod opengraph_extractor;

pub use css_extractor::*;
pub use jsonld_extractor::*;
pub use opengraph_extractor::*;

use std::fmt;

use scraper::Html;
use tracing::debug;

use crate::record::FieldMap;

/// Fields located directly in markup. Job type and experience are inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Company,
    Location,
    Description,
    Requirements,
    Salary,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Company,
        Field::Location,
        Field::Description,
        Field::Requirements,
        Field::Salary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Company => "company",
            Field::Location => "location",
            Field::Description => "description",
            Field::Requirements => "requirements",
            Field::Salary => "salary",
        }
    }

    /// Static locator chain for this field
    pub fn locators(self) -> &'static LocatorChain {
        match self {
            Field::Title => &TITLE_LOCATORS,
            Field::Company => &COMPANY_LOCATORS,
            Field::Location => &LOCATION_LOCATORS,
            Field::Description => &DESCRIPTION_LOCATORS,
            Field::Requirements => &REQUIREMENTS_LOCATORS,
            Field::Salary => &SALARY_LOCATORS,
        }
    }

    fn slot(self, fields: &mut FieldMap) -> &mut String {
        match self {
            Field::Title => &mut fields.title,
            Field::Company => &mut fields.company,
            Field::Location => &mut fields.location,
            Field::Description => &mut fields.description,
            Field::Requirements => &mut fields.requirements,
            Field::Salary => &mut fields.salary,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run every field's locator chain over the document.
pub fn extract_fields(document: &Html, structured_fallback: bool) -> FieldMap {
    let mut fields = FieldMap::default();
    for field in Field::ALL {
        *field.slot(&mut fields) = extract_field(document, field.locators());
    }

    if structured_fallback {
        if let Some(posting) = find_job_posting(document) {
            debug!("JSON-LD JobPosting found");
            let structured = job_posting_fields(&posting);
            fill_empty(&mut fields, structured, "jsonld");
        }
        if Field::ALL.iter().any(|f| f.slot(&mut fields).is_empty()) {
            fill_empty(&mut fields, opengraph_fields(document), "opengraph");
        }
    }

    fields
}

/// Copy text fields from `fallback` into empty slots of `fields`, and take
/// its explicit type/deadline if none are set yet.
fn fill_empty(fields: &mut FieldMap, mut fallback: FieldMap, source: &str) {
    for field in Field::ALL {
        let value = std::mem::take(field.slot(&mut fallback));
        let slot = field.slot(fields);
        if slot.trim().is_empty() && !value.trim().is_empty() {
            debug!(field = %field, source, "field filled from structured data");
            *slot = value;
        }
    }
    fields.job_type = fields.job_type.or(fallback.job_type);
    fields.deadline = fields.deadline.or(fallback.deadline);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JobType;

    const PAGE: &str = r#"
    <html>
    <head>
        <meta property="og:site_name" content="OG Corp">
        <script type="application/ld+json">
        {"@type": "JobPosting", "title": "LD Title", "employmentType": "INTERN",
         "jobLocation": {"address": {"addressLocality": "Oslo"}}}
        </script>
    </head>
    <body>
        <h1 class="job-title">Markup Title</h1>
        <div class="job-description">Write code.</div>
    </body>
    </html>
    "#;

    #[test]
    fn test_markup_beats_structured_data() {
        let document = Html::parse_document(PAGE);
        let fields = extract_fields(&document, true);
        assert_eq!(fields.title, "Markup Title");
        assert_eq!(fields.description, "Write code.");
        assert_eq!(fields.location, "Oslo");
        assert_eq!(fields.company, "OG Corp");
        assert_eq!(fields.job_type, Some(JobType::Internship));
    }

    #[test]
    fn test_fallback_disabled() {
        let document = Html::parse_document(PAGE);
        let fields = extract_fields(&document, false);
        assert_eq!(fields.title, "Markup Title");
        assert_eq!(fields.location, "");
        assert_eq!(fields.company, "");
        assert_eq!(fields.job_type, None);
    }

    #[test]
    fn test_field_names() {
        let names: Vec<_> = Field::ALL.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            names,
            ["title", "company", "location", "description", "requirements", "salary"]
        );
    }
}
