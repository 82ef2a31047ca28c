//! CSS selector locator chains
//!
//! Each target field has an ordered list of selectors. They are tried in
//! order and the first one that selects anything wins, even if a later
//! selector would also match.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use crate::normalize::element_text;

/// Ordered, pre-parsed selectors for one field.
#[derive(Debug, Clone)]
pub struct LocatorChain {
    selectors: Vec<(String, Selector)>,
}

impl LocatorChain {
    /// Parse selector expressions in order. Invalid ones are skipped.
    pub fn new<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selectors = expressions
            .into_iter()
            .filter_map(|expr| {
                let expr = expr.as_ref();
                match Selector::parse(expr) {
                    Ok(sel) => Some((expr.to_string(), sel)),
                    Err(e) => {
                        debug!(selector = %expr, error = ?e, "skipping invalid selector");
                        None
                    }
                }
            })
            .collect();
        Self { selectors }
    }

    /// Selector expressions in evaluation order
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(|(expr, _)| expr.as_str())
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Text of the first node matched by the first matching selector.
    ///
    /// `None` only when no selector matches at all; a matching node with no
    /// text yields `Some("")`.
    pub fn first_match(&self, document: &Html) -> Option<String> {
        self.selectors.iter().find_map(|(expr, selector)| {
            let element = document.select(selector).next()?;
            debug!(selector = %expr, "locator matched");
            Some(element_text(element).trim().to_string())
        })
    }
}

/// Text for a field, or empty string when nothing matches. Never fails.
pub fn extract_field(document: &Html, locators: &LocatorChain) -> String {
    locators.first_match(document).unwrap_or_default()
}

/// `extract_field` for an ad-hoc list of selector strings.
pub fn extract_field_with(document: &Html, expressions: &[&str]) -> String {
    extract_field(document, &LocatorChain::new(expressions))
}

pub static TITLE_LOCATORS: LazyLock<LocatorChain> = LazyLock::new(|| {
    LocatorChain::new([
        r#"h1[class*="job-title"]"#,
        r#"h1[class*="title"]"#,
        ".job-title",
        ".title",
        "h1",
    ])
});

pub static COMPANY_LOCATORS: LazyLock<LocatorChain> = LazyLock::new(|| {
    LocatorChain::new([
        r#"[class*="company-name"]"#,
        r#"[class*="employer"]"#,
        ".company",
        ".employer",
    ])
});

pub static LOCATION_LOCATORS: LazyLock<LocatorChain> = LazyLock::new(|| {
    LocatorChain::new([
        r#"[class*="location"]"#,
        r#"[class*="address"]"#,
        ".location",
        ".address",
    ])
});

pub static DESCRIPTION_LOCATORS: LazyLock<LocatorChain> = LazyLock::new(|| {
    LocatorChain::new([
        r#"[class*="description"]"#,
        r#"[class*="details"]"#,
        ".description",
        ".details",
    ])
});

pub static REQUIREMENTS_LOCATORS: LazyLock<LocatorChain> = LazyLock::new(|| {
    LocatorChain::new([
        r#"[class*="requirements"]"#,
        r#"[class*="qualifications"]"#,
        ".requirements",
        ".qualifications",
    ])
});

pub static SALARY_LOCATORS: LazyLock<LocatorChain> = LazyLock::new(|| {
    LocatorChain::new([
        r#"[class*="salary"]"#,
        r#"[class*="compensation"]"#,
        ".salary",
        ".compensation",
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_locator_wins() {
        let html = r#"
        <html><body>
            <h1>Generic Heading</h1>
            <h1 class="job-title">Staff Engineer</h1>
            <div class="title">Other Title</div>
        </body></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_field(&document, &TITLE_LOCATORS), "Staff Engineer");
    }

    #[test]
    fn test_falls_through_to_later_locator() {
        let html = r#"<div><h1>Barista</h1><span class="employer">Bean Co</span></div>"#;
        let document = Html::parse_document(html);
        assert_eq!(extract_field(&document, &TITLE_LOCATORS), "Barista");
        assert_eq!(extract_field(&document, &COMPANY_LOCATORS), "Bean Co");
    }

    #[test]
    fn test_first_node_of_selector() {
        let html = r#"
            <span class="location">Berlin</span>
            <span class="location">Munich</span>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(extract_field(&document, &LOCATION_LOCATORS), "Berlin");
    }

    #[test]
    fn test_no_match_is_empty() {
        let document = Html::parse_document("<p>nothing here</p>");
        assert_eq!(extract_field(&document, &SALARY_LOCATORS), "");
        assert_eq!(SALARY_LOCATORS.first_match(&document), None);
    }

    #[test]
    fn test_empty_match_still_wins() {
        let html = r#"<div class="salary-box"></div><div class="compensation">$100k</div>"#;
        let document = Html::parse_document(html);
        assert_eq!(SALARY_LOCATORS.first_match(&document), Some(String::new()));
    }

    #[test]
    fn test_text_is_trimmed_and_keeps_paragraphs() {
        let html = r#"<div class="job-description">
            <p>  Ship features. </p>
            <p>Own <a href="/oncall">on-call</a>.</p>
        </div>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            extract_field(&document, &DESCRIPTION_LOCATORS),
            "Ship features.\n\nOwn on-call."
        );
    }

    #[test]
    fn test_invalid_selectors_skipped() {
        let chain = LocatorChain::new(["[[[", ".ok"]);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.expressions().collect::<Vec<_>>(), vec![".ok"]);

        let document = Html::parse_document(r#"<b class="ok">yes</b>"#);
        assert_eq!(extract_field_with(&document, &["[[[", ".ok"]), "yes");
    }

    #[test]
    fn test_static_tables_parse_fully() {
        assert_eq!(TITLE_LOCATORS.len(), 5);
        for chain in [
            &*COMPANY_LOCATORS,
            &*LOCATION_LOCATORS,
            &*DESCRIPTION_LOCATORS,
            &*REQUIREMENTS_LOCATORS,
            &*SALARY_LOCATORS,
        ] {
            assert_eq!(chain.len(), 4);
        }
    }
}
