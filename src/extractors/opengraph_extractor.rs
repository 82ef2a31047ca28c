//! OpenGraph and standard meta tag fallback
//!
//! Last resort for the title, company and description of pages that carry
//! neither recognisable markup classes nor JSON-LD.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::record::FieldMap;

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").expect("meta selector is valid"));

/// `og:*` properties (prefix stripped) and named meta tags, first wins.
pub fn extract_meta(document: &Html) -> HashMap<String, String> {
    let mut result = HashMap::new();

    for element in document.select(&META_SELECTOR) {
        let content = element.value().attr("content").unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let key = match (element.value().attr("property"), element.value().attr("name")) {
            (Some(prop), _) if prop.starts_with("og:") => prop.to_string(),
            (_, Some(name)) => name.to_lowercase(),
            _ => continue,
        };
        result.entry(key).or_insert_with(|| content.to_string());
    }

    result
}

/// Title, company and description from OpenGraph / meta tags.
pub fn opengraph_fields(document: &Html) -> FieldMap {
    let meta = extract_meta(document);
    let pick = |keys: &[&str]| -> String {
        keys.iter()
            .find_map(|k| meta.get(*k))
            .cloned()
            .unwrap_or_default()
    };

    FieldMap {
        title: pick(&["og:title", "twitter:title"]),
        company: pick(&["og:site_name", "author"]),
        description: pick(&["og:description", "description", "twitter:description"]),
        ..FieldMap::default()
    }
}
