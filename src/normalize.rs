//! Normalization of extracted fields into a `NormalizedJobRecord`
//!
//! Strips residual markup, substitutes canonical defaults for anything left
//! empty, and fills in the posted date and deadline. Applying it to an
//! already-normalized record yields the same record.

use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::classify::EXPERIENCE_NOT_SPECIFIED;
use crate::config::DEFAULT_DEADLINE_DAYS;
use crate::record::{FieldMap, NormalizedJobRecord};

pub const DEFAULT_TITLE: &str = "Untitled Position";
pub const DEFAULT_COMPANY: &str = "Company Not Specified";
pub const DEFAULT_LOCATION: &str = "Location Not Specified";
pub const DEFAULT_DESCRIPTION: &str = "No description provided";
pub const DEFAULT_REQUIREMENTS: &str = "No specific requirements listed";
pub const DEFAULT_SALARY: &str = "Salary not specified";

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>|<!--").expect("markup regex is valid"));

/// Upper bound on render passes over text whose entities decode to more tags
const MAX_RENDER_PASSES: usize = 4;

/// Elements whose content is never visible text
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "head", "noscript", "template", "iframe", "svg", "object",
];

/// Elements separated from their neighbours by a blank line
const PARAGRAPH_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "dl", "table", "blockquote", "pre",
    "section", "article", "hr",
];

/// Elements that start on a new line
const LINE_ELEMENTS: &[&str] = &[
    "div", "li", "tr", "dt", "dd", "header", "footer", "main", "nav", "aside", "form",
    "fieldset", "address", "figure", "figcaption",
];

/// Normalize with the current time as posted date and a 30-day deadline.
pub fn normalize(fields: impl Into<FieldMap>) -> NormalizedJobRecord {
    normalize_at(fields, Utc::now(), DEFAULT_DEADLINE_DAYS)
}

/// Normalize with an explicit clock and deadline window.
///
/// `now` is only used when the field map carries no posted date.
pub fn normalize_at(
    fields: impl Into<FieldMap>,
    now: DateTime<Utc>,
    deadline_days: i64,
) -> NormalizedJobRecord {
    let fields = fields.into();
    let posted_date = fields.posted_date.unwrap_or(now);
    let deadline = fields
        .deadline
        .unwrap_or_else(|| calculate_deadline(posted_date, deadline_days));

    NormalizedJobRecord {
        title: or_default(&fields.title, DEFAULT_TITLE),
        company: or_default(&fields.company, DEFAULT_COMPANY),
        location: or_default(&fields.location, DEFAULT_LOCATION),
        description: or_default(&fields.description, DEFAULT_DESCRIPTION),
        requirements: or_default(&fields.requirements, DEFAULT_REQUIREMENTS),
        salary: or_default(&fields.salary, DEFAULT_SALARY),
        job_type: fields.job_type.unwrap_or_default(),
        experience: or_default(
            fields.experience.as_deref().unwrap_or_default(),
            EXPERIENCE_NOT_SPECIFIED,
        ),
        posted_date,
        deadline,
        source_url: fields.source_url,
    }
}

/// Deadline `days` after `posted`. Saturates at `posted` on overflow.
pub fn calculate_deadline(posted: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| posted.checked_add_signed(delta))
        .unwrap_or(posted)
}

fn or_default(raw: &str, default: &str) -> String {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// Plain text with markup removed and whitespace tidied.
///
/// Links collapse to their visible text, scripts and styles are dropped,
/// block elements become line breaks. Text without tags only has its
/// whitespace tidied, so entity-looking text is left alone.
///
/// Rendering repeats while decoded entities still form tags, so the output
/// never contains markup and `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    if !MARKUP_RE.is_match(raw) {
        return tidy_whitespace(raw);
    }

    let mut text = render_fragment(raw);
    for _ in 1..MAX_RENDER_PASSES {
        if !MARKUP_RE.is_match(&text) {
            return text;
        }
        let next = render_fragment(&text);
        if next == text {
            break;
        }
        text = next;
    }

    if MARKUP_RE.is_match(&text) {
        // Still tag-shaped after the last pass: show it literally
        text.replace('<', "&lt;")
    } else {
        text
    }
}

fn render_fragment(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut renderer = TextRenderer::default();
    renderer.element(fragment.root_element());
    tidy_whitespace(&renderer.out)
}

/// Visible text of one element, rendered the same way as `clean_text`.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let mut renderer = TextRenderer::default();
    renderer.element(element);
    tidy_whitespace(&renderer.out)
}

/// Collapse whitespace runs within lines, trim lines, and keep at most one
/// blank line between non-empty lines.
fn tidy_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut gap = false;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            gap = !lines.is_empty();
            continue;
        }
        if gap {
            lines.push(String::new());
            gap = false;
        }
        lines.push(collapsed);
    }

    lines.join("\n")
}

#[derive(Default)]
struct TextRenderer {
    out: String,
    /// Newlines owed before the next visible text
    pending_breaks: usize,
}

impl TextRenderer {
    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }
        if name == "br" {
            self.line_break(1);
            return;
        }

        let breaks = if PARAGRAPH_ELEMENTS.contains(&name) {
            2
        } else if LINE_ELEMENTS.contains(&name) {
            1
        } else {
            0
        };

        self.line_break(breaks);
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.element(child_el);
                    }
                }
                _ => {}
            }
        }
        self.line_break(breaks);
    }

    fn text(&mut self, text: &str) {
        if text.trim().is_empty() {
            if self.pending_breaks == 0 && !self.out.is_empty() {
                self.out.push(' ');
            }
            return;
        }
        if self.pending_breaks > 0 {
            if !self.out.is_empty() {
                self.out.push_str(&"\n".repeat(self.pending_breaks));
            }
            self.pending_breaks = 0;
        }
        // Whitespace inside a text node is layout, not content
        let mut words = text.split_whitespace().peekable();
        if text.starts_with(char::is_whitespace) && !self.out.is_empty() {
            self.out.push(' ');
        }
        while let Some(word) = words.next() {
            self.out.push_str(word);
            if words.peek().is_some() {
                self.out.push(' ');
            }
        }
        if text.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    fn line_break(&mut self, count: usize) {
        self.pending_breaks = self.pending_breaks.max(count);
    }
}
