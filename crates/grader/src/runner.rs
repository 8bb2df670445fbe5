//! Browser-driven functional test runner.
//!
//! Loads the submission into one in-process [`Page`] and runs four
//! sub-phases against the rendered document: structural, styling,
//! responsive, accessibility. The phases share the page (viewport changes
//! mutate it), so they run sequentially; each is fault-isolated, so an
//! engine error in one phase becomes a failed test case with the error
//! attached while the other phases still run.

use w2s_engine::css::compute_style;
use w2s_engine::{Document, EngineError, Page, ResourceLimits, Viewport};
use w2s_validators::a11y;

use crate::report::{ErrorEntry, ErrorKind, RunMetrics, TestCase};

/// The three graded viewports, in emission order.
pub const VIEWPORTS: [(&str, Viewport); 3] = [
    (
        "Mobile Layout",
        Viewport {
            width: 375.0,
            height: 667.0,
        },
    ),
    (
        "Tablet Layout",
        Viewport {
            width: 768.0,
            height: 1024.0,
        },
    ),
    (
        "Desktop Layout",
        Viewport {
            width: 1280.0,
            height: 720.0,
        },
    ),
];

/// Horizontal overflow tolerated before a viewport check fails.
pub const OVERFLOW_TOLERANCE_PX: f32 = 50.0;

/// Everything one runner invocation produces.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub tests: Vec<TestCase>,
    pub errors: Vec<ErrorEntry>,
    pub metrics: RunMetrics,
}

/// The functional runner. One instance grades one submission; the page it
/// opens never outlives [`FunctionalRunner::run`].
#[derive(Debug, Default)]
pub struct FunctionalRunner {
    limits: ResourceLimits,
}

impl FunctionalRunner {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }

    /// Run the full battery. Never throws; a page that cannot load fails
    /// every unconditional test case with the load error attached.
    pub fn run(&self, code: &str) -> RunOutput {
        let mut output = RunOutput::default();

        let mut page = match Page::load(code, &self.limits) {
            Ok(page) => page,
            Err(err) => {
                log::warn!("page load failed: {}", err);
                output
                    .errors
                    .push(ErrorEntry::new(ErrorKind::Runtime, format!("page failed to load: {}", err)));
                output.tests = self.failed_load_cases(&err);
                return output;
            }
        };

        output.tests.extend(self.structural_phase(&page));
        output.tests.extend(self.styling_phase(&page));
        output.tests.extend(self.responsive_phase(&mut page));
        output.tests.extend(self.accessibility_phase(page.document()));

        let metrics = page.metrics();
        output.metrics = RunMetrics {
            load_time: Some(metrics.load_time_ms),
            elements: Some(metrics.elements),
            scripts: Some(metrics.scripts),
            stylesheets: Some(metrics.stylesheets),
        };

        output
    }

    /// The unconditional cases, all failed with the load error. Conditional
    /// cases (alt text, form labels) need a document to be decidable, so
    /// they are not emitted.
    fn failed_load_cases(&self, err: &EngineError) -> Vec<TestCase> {
        let message = err.to_string();
        let mut cases = vec![
            TestCase::failed_with("HTML5 Doctype", DOCTYPE_DESC, 1, message.as_str()),
            TestCase::failed_with("Page Title", TITLE_DESC, 1, message.as_str()),
            TestCase::failed_with("Viewport Meta Tag", VIEWPORT_META_DESC, 1, message.as_str()),
            TestCase::failed_with("Semantic HTML", SEMANTIC_DESC, 2, message.as_str()),
            TestCase::failed_with("Custom Styling", STYLING_DESC, 1, message.as_str()),
        ];
        for (name, _) in VIEWPORTS {
            cases.push(TestCase::failed_with(name, RESPONSIVE_DESC, 1, message.as_str()));
        }
        cases.push(TestCase::failed_with(
            "Heading Structure",
            HEADING_DESC,
            1,
            message.as_str(),
        ));
        cases
    }

    fn structural_phase(&self, page: &Page) -> Vec<TestCase> {
        let doc = page.document();
        vec![
            TestCase::check("HTML5 Doctype", DOCTYPE_DESC, 1, doc.has_doctype()),
            TestCase::check("Page Title", TITLE_DESC, 1, doc.first_by_tag("title").is_some()),
            TestCase::check(
                "Viewport Meta Tag",
                VIEWPORT_META_DESC,
                1,
                has_viewport_meta(doc),
            ),
            TestCase::check("Semantic HTML", SEMANTIC_DESC, 2, semantic_count(doc) >= 1),
        ]
    }

    fn styling_phase(&self, page: &Page) -> Vec<TestCase> {
        let has_styles = page.has_author_styles();
        let mut cases = vec![TestCase::check("Custom Styling", STYLING_DESC, 1, has_styles)];
        if has_styles {
            cases.push(TestCase::check(
                "Custom Colors",
                COLORS_DESC,
                1,
                self.uses_custom_colors(page),
            ));
        }
        cases
    }

    /// Any element whose resolved text or background color left the
    /// defaults (black on transparent).
    fn uses_custom_colors(&self, page: &Page) -> bool {
        let viewport_width = page.viewport().width;
        page.document().all_elements().iter().any(|handle| {
            handle
                .read()
                .ok()
                .and_then(|node| {
                    node.element().map(|element| {
                        compute_style(element, page.stylesheet(), viewport_width)
                            .has_custom_colors()
                    })
                })
                .unwrap_or(false)
        })
    }

    fn responsive_phase(&self, page: &mut Page) -> Vec<TestCase> {
        let mut cases = Vec::new();
        for (name, viewport) in VIEWPORTS {
            match page.set_viewport(viewport) {
                Ok(()) => {
                    let width = page.scroll_width();
                    let passed = width <= viewport.width + OVERFLOW_TOLERANCE_PX;
                    if !passed {
                        log::debug!(
                            "{}: document width {:.0}px exceeds {:.0}px",
                            name,
                            width,
                            viewport.width + OVERFLOW_TOLERANCE_PX
                        );
                    }
                    cases.push(TestCase::check(name, RESPONSIVE_DESC, 1, passed));
                }
                Err(err) => {
                    cases.push(TestCase::failed_with(name, RESPONSIVE_DESC, 1, err.to_string()));
                }
            }
        }
        cases
    }

    fn accessibility_phase(&self, doc: &Document) -> Vec<TestCase> {
        let mut cases = Vec::new();
        if a11y::has_images(doc) {
            cases.push(TestCase::check(
                "Image Alt Text",
                ALT_DESC,
                1,
                a11y::images_missing_alt(doc).is_empty(),
            ));
        }
        cases.push(TestCase::check(
            "Heading Structure",
            HEADING_DESC,
            1,
            a11y::has_headings(doc),
        ));
        if a11y::has_form_controls(doc) {
            cases.push(TestCase::check(
                "Form Labels",
                LABELS_DESC,
                1,
                a11y::unlabelled_controls(doc).is_empty(),
            ));
        }
        cases
    }
}

const DOCTYPE_DESC: &str = "Document declares the HTML5 doctype";
const TITLE_DESC: &str = "Document has a <title>";
const VIEWPORT_META_DESC: &str = "Document declares a viewport meta tag";
const SEMANTIC_DESC: &str = "Page uses at least one semantic element";
const STYLING_DESC: &str = "Submission includes CSS styling";
const COLORS_DESC: &str = "Page uses non-default colors";
const RESPONSIVE_DESC: &str = "Content fits the viewport without horizontal overflow";
const ALT_DESC: &str = "Every image has an alt attribute";
const HEADING_DESC: &str = "Page has at least one heading";
const LABELS_DESC: &str = "Every form control has an accessible label";

fn has_viewport_meta(doc: &Document) -> bool {
    doc.elements_by_tag("meta").iter().any(|handle| {
        handle
            .read()
            .ok()
            .and_then(|node| {
                node.element().map(|element| {
                    element
                        .attr("name")
                        .is_some_and(|name| name.eq_ignore_ascii_case("viewport"))
                })
            })
            .unwrap_or(false)
    })
}

fn semantic_count(doc: &Document) -> usize {
    w2s_validators::html::SEMANTIC_TAGS
        .iter()
        .map(|tag| doc.elements_by_tag(tag).len())
        .sum()
}
