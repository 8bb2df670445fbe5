//! HTML structural validator.
//!
//! Grades the markup itself: document skeleton, semantics, accessibility
//! affordances and SEO basics. Skeleton presence is checked against the
//! source text (the HTML5 algorithm synthesizes `<html>`/`<head>`/`<body>`
//! nodes even when the author never wrote them); everything content-shaped
//! is checked against the parsed DOM.

use lazy_static::lazy_static;
use regex::Regex;

use w2s_engine::{parse_html, Document, EngineResult, ResourceLimits};

use crate::a11y;
use crate::outcome::{Finding, FindingKind, ValidationOutcome};

/// Points deducted per error finding.
pub const ERROR_PENALTY: u32 = 15;
/// Points deducted per warning finding.
pub const WARNING_PENALTY: u32 = 5;

/// Semantic sectioning elements the validator looks for.
pub const SEMANTIC_TAGS: [&str; 7] = [
    "header", "main", "section", "article", "nav", "aside", "footer",
];

/// Link texts that tell a screen-reader user nothing.
const GENERIC_LINK_TEXTS: [&str; 3] = ["click here", "read more", "link"];

lazy_static! {
    static ref DOCTYPE_RE: Regex = Regex::new(r"(?i)^\s*<!doctype\s+html\s*>").unwrap();
    static ref HTML_TAG_RE: Regex = Regex::new(r"(?i)<html(\s|>)").unwrap();
    static ref HEAD_TAG_RE: Regex = Regex::new(r"(?i)<head(\s|>)").unwrap();
    static ref BODY_TAG_RE: Regex = Regex::new(r"(?i)<body(\s|>)").unwrap();
    static ref TITLE_TAG_RE: Regex = Regex::new(r"(?i)<title(\s|>)").unwrap();
}

/// The HTML structural validator. Never throws: any internal failure is
/// converted into a single error finding.
#[derive(Debug, Default)]
pub struct HtmlValidator {
    limits: ResourceLimits,
}

impl HtmlValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self { limits }
    }

    /// Validate a submission, producing an outcome in every case.
    pub fn validate(&self, html: &str) -> ValidationOutcome {
        match self.run(html) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("html validator failed: {}", err);
                ValidationOutcome::from_failure(
                    FindingKind::Syntax,
                    format!("failed to parse submission: {}", err),
                    ERROR_PENALTY,
                )
            }
        }
    }

    fn run(&self, html: &str) -> EngineResult<ValidationOutcome> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_skeleton(html, &mut errors);

        let doc = parse_html(html, &self.limits)?;
        self.check_title(html, &doc, &mut warnings);
        self.check_meta(&doc, &mut warnings);
        self.check_semantics(&doc, &mut warnings);
        self.check_headings(&doc, &mut warnings);
        self.check_images(&doc, &mut warnings);
        self.check_form_labels(&doc, &mut warnings);
        self.check_links(&doc, &mut warnings);
        self.check_empty_elements(&doc, &mut warnings);

        Ok(ValidationOutcome::from_findings(
            errors,
            warnings,
            ERROR_PENALTY,
            WARNING_PENALTY,
        ))
    }

    fn check_skeleton(&self, html: &str, errors: &mut Vec<Finding>) {
        if !DOCTYPE_RE.is_match(html) {
            errors.push(Finding::new(
                FindingKind::Structure,
                "missing <!DOCTYPE html> declaration",
            ));
        }
        for (regex, tag) in [
            (&*HTML_TAG_RE, "html"),
            (&*HEAD_TAG_RE, "head"),
            (&*BODY_TAG_RE, "body"),
            (&*TITLE_TAG_RE, "title"),
        ] {
            if !regex.is_match(html) {
                errors.push(Finding::new(
                    FindingKind::Structure,
                    format!("missing <{}> tag", tag),
                ));
            }
        }
    }

    fn check_title(&self, html: &str, doc: &Document, warnings: &mut Vec<Finding>) {
        // Emptiness only applies when the tag was actually written
        if TITLE_TAG_RE.is_match(html)
            && doc.title().is_some_and(|title| title.is_empty())
        {
            warnings.push(Finding::new(FindingKind::Structure, "<title> is empty"));
        }
    }

    fn check_meta(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        let metas = doc.elements_by_tag("meta");
        let meta_has = |pred: &dyn Fn(&w2s_engine::Element) -> bool| {
            metas.iter().any(|handle| {
                handle
                    .read()
                    .ok()
                    .and_then(|node| node.element().map(pred))
                    .unwrap_or(false)
            })
        };

        let has_viewport = meta_has(&|element| {
            element
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("viewport"))
        });
        if !has_viewport {
            warnings.push(Finding::new(
                FindingKind::Responsive,
                "missing viewport meta tag",
            ));
        }

        let has_charset = meta_has(&|element| {
            element.has_attr("charset")
                || element
                    .attr("http-equiv")
                    .is_some_and(|equiv| equiv.eq_ignore_ascii_case("content-type"))
        });
        if !has_charset {
            warnings.push(Finding::new(
                FindingKind::Structure,
                "missing charset meta tag",
            ));
        }

        let has_description = meta_has(&|element| {
            element
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        });
        if !has_description {
            warnings.push(Finding::new(FindingKind::Seo, "missing meta description tag"));
        }
    }

    fn check_semantics(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        let count: usize = SEMANTIC_TAGS
            .iter()
            .map(|tag| doc.elements_by_tag(tag).len())
            .sum();
        if count == 0 {
            warnings.push(Finding::new(
                FindingKind::Semantics,
                "no semantic elements found (header, main, section, article, nav, aside, footer)",
            ));
        }
    }

    fn check_headings(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        if !a11y::has_headings(doc) {
            warnings.push(Finding::new(
                FindingKind::Semantics,
                "no heading elements found",
            ));
        }
        let h1_count = doc.elements_by_tag("h1").len();
        if h1_count == 0 {
            warnings.push(Finding::new(FindingKind::Semantics, "no <h1> element found"));
        } else if h1_count > 1 {
            warnings.push(Finding::new(
                FindingKind::Semantics,
                format!("multiple <h1> elements found ({})", h1_count),
            ));
        }
    }

    fn check_images(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        for src in a11y::images_missing_alt(doc) {
            warnings.push(Finding::new(
                FindingKind::Accessibility,
                format!("image missing alt attribute: {}", src),
            ));
        }
    }

    fn check_form_labels(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        for control in a11y::unlabelled_controls(doc) {
            warnings.push(Finding::new(
                FindingKind::Accessibility,
                format!("form control has no associated label: {}", control),
            ));
        }
    }

    fn check_links(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        for handle in doc.elements_by_tag("a") {
            let (has_href, aria_label) = {
                let Ok(node) = handle.read() else { continue };
                let Some(element) = node.element() else {
                    continue;
                };
                (
                    element.has_attr("href"),
                    element
                        .attr("aria-label")
                        .map(|label| label.trim().to_string()),
                )
            };
            if !has_href {
                continue;
            }
            let text = doc.text_content_of(&handle).trim().to_string();
            if text.is_empty() {
                if aria_label.as_deref().unwrap_or("").is_empty() {
                    warnings.push(Finding::new(
                        FindingKind::Accessibility,
                        "link has no accessible text",
                    ));
                }
            } else if GENERIC_LINK_TEXTS
                .iter()
                .any(|generic| text.eq_ignore_ascii_case(generic))
            {
                warnings.push(Finding::new(
                    FindingKind::Accessibility,
                    format!("non-descriptive link text: \"{}\"", text),
                ));
            }
        }
    }

    fn check_empty_elements(&self, doc: &Document, warnings: &mut Vec<Finding>) {
        for tag in ["title", "h1", "h2", "h3", "p"] {
            for handle in doc.elements_by_tag(tag) {
                if doc.text_content_of(&handle).trim().is_empty() {
                    warnings.push(Finding::new(
                        FindingKind::Semantics,
                        format!("empty <{}> element", tag),
                    ));
                }
            }
        }
    }
}
