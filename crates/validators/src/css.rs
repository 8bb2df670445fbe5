//! CSS style validator.
//!
//! Operates on the CSS a submission actually embeds: `<style>` blocks and
//! `style=` attributes. Absence of CSS is tolerated (scored down, not
//! failed); broken syntax is an error; the rest are style-quality and
//! accessibility warnings.

use std::collections::HashSet;

use w2s_engine::{extract_css, parse_html, CssSources, EngineResult, ResourceLimits, Stylesheet};

use crate::outcome::{Finding, FindingKind, ValidationOutcome};

/// Points deducted per error finding.
pub const ERROR_PENALTY: u32 = 20;
/// Points deducted per warning finding.
pub const WARNING_PENALTY: u32 = 5;
/// Score handed to submissions with no CSS at all.
pub const NO_CSS_SCORE: u32 = 50;
/// Inline-style occurrences tolerated before the maintainability warning.
pub const INLINE_STYLE_BUDGET: usize = 5;

const VENDOR_PREFIXES: [&str; 3] = ["-webkit-", "-moz-", "-ms-"];

/// The CSS style validator. Never throws: any internal failure is
/// converted into a single error finding.
#[derive(Debug, Default)]
pub struct CssValidator {
    limits: ResourceLimits,
}

impl CssValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self { limits }
    }

    /// Validate the CSS of a submission, producing an outcome in every case.
    pub fn validate(&self, html: &str) -> ValidationOutcome {
        match self.run(html) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("css validator failed: {}", err);
                ValidationOutcome::from_failure(
                    FindingKind::Syntax,
                    format!("failed to inspect submission styles: {}", err),
                    ERROR_PENALTY,
                )
            }
        }
    }

    fn run(&self, html: &str) -> EngineResult<ValidationOutcome> {
        let doc = parse_html(html, &self.limits)?;
        let sources = extract_css(&doc, &self.limits);

        if !sources.has_embedded() {
            // CSS is optional, just discouraged to omit entirely
            let warnings = vec![Finding::new(
                FindingKind::Style,
                "no CSS found (no <style> blocks or style attributes)",
            )];
            return Ok(ValidationOutcome {
                valid: true,
                errors: Vec::new(),
                warnings,
                score: NO_CSS_SCORE,
            });
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let stylesheet = match Stylesheet::parse(&sources.combined_blocks()) {
            Ok(stylesheet) => Some(stylesheet),
            Err(err) => {
                errors.push(Finding::new(FindingKind::Syntax, err.to_string()));
                None
            }
        };

        if let Some(stylesheet) = &stylesheet {
            self.check_vendor_prefixes(stylesheet, &mut warnings);
            self.check_legacy_layout(stylesheet, &mut warnings);
            self.check_visual_basics(stylesheet, &sources, &mut warnings);
            self.check_selector_specificity(stylesheet, &mut warnings);
            self.check_important(stylesheet, &mut warnings);
            self.check_responsive_technique(stylesheet, &mut warnings);
            self.check_focus_styles(stylesheet, &mut warnings);
        }

        self.check_inline_styles(&sources, &mut errors, &mut warnings);

        Ok(ValidationOutcome::from_findings(
            errors,
            warnings,
            ERROR_PENALTY,
            WARNING_PENALTY,
        ))
    }

    /// A prefixed property without its unprefixed sibling in the same rule
    /// silently loses the browsers the prefix does not cover.
    fn check_vendor_prefixes(&self, stylesheet: &Stylesheet, warnings: &mut Vec<Finding>) {
        for rule in stylesheet.all_rules() {
            let mut reported: HashSet<String> = HashSet::new();
            for decl in &rule.declarations {
                let Some(base) = VENDOR_PREFIXES
                    .iter()
                    .find_map(|prefix| decl.property.strip_prefix(prefix))
                else {
                    continue;
                };
                let has_fallback = rule
                    .declarations
                    .iter()
                    .any(|other| other.property == base);
                if !has_fallback && reported.insert(base.to_string()) {
                    warnings.push(Finding::new(
                        FindingKind::Style,
                        format!(
                            "vendor-prefixed property `{}` has no unprefixed `{}` fallback",
                            decl.property, base
                        ),
                    ));
                }
            }
        }
    }

    fn check_legacy_layout(&self, stylesheet: &Stylesheet, warnings: &mut Vec<Finding>) {
        for legacy in ["float", "clear"] {
            let used = stylesheet
                .all_declarations()
                .any(|decl| decl.property == legacy);
            if used {
                warnings.push(Finding::new(
                    FindingKind::Style,
                    format!(
                        "`{}` used for layout; prefer flexbox or grid",
                        legacy
                    ),
                ));
            }
        }
    }

    /// No color or typography anywhere usually means the page was never
    /// styled on purpose.
    fn check_visual_basics(
        &self,
        stylesheet: &Stylesheet,
        sources: &CssSources,
        warnings: &mut Vec<Finding>,
    ) {
        let basics = ["color", "background-color", "font-size"];
        let in_sheet = stylesheet
            .all_declarations()
            .any(|decl| basics.contains(&decl.property.as_str()));
        let in_inline = sources.inline.iter().any(|inline| {
            w2s_engine::css::parse_declarations(&inline.css)
                .iter()
                .any(|decl| basics.contains(&decl.property.as_str()))
        });
        if !in_sheet && !in_inline {
            warnings.push(Finding::new(
                FindingKind::Style,
                "no color, background-color or font-size declarations found",
            ));
        }
    }

    fn check_selector_specificity(&self, stylesheet: &Stylesheet, warnings: &mut Vec<Finding>) {
        for rule in stylesheet.all_rules() {
            for selector in rule.selectors.split(',') {
                let selector = selector.trim();
                let id_count = selector.matches('#').count();
                if id_count > 2 {
                    warnings.push(Finding::new(
                        FindingKind::Maintainability,
                        format!(
                            "overly specific selector `{}` ({} id selectors)",
                            selector, id_count
                        ),
                    ));
                }
            }
        }
    }

    fn check_important(&self, stylesheet: &Stylesheet, warnings: &mut Vec<Finding>) {
        if stylesheet.all_declarations().any(|decl| decl.important) {
            warnings.push(Finding::new(
                FindingKind::Maintainability,
                "`!important` found; prefer more specific selectors",
            ));
        }
    }

    fn check_responsive_technique(&self, stylesheet: &Stylesheet, warnings: &mut Vec<Finding>) {
        let has_media = !stylesheet.media_rules.is_empty();
        let has_modern_display = stylesheet.all_declarations().any(|decl| {
            decl.property == "display"
                && matches!(
                    decl.value.to_ascii_lowercase().as_str(),
                    "flex" | "inline-flex" | "grid" | "inline-grid"
                )
        });
        if !has_media && !has_modern_display {
            warnings.push(Finding::new(
                FindingKind::Responsive,
                "no responsive technique detected (@media, flexbox or grid)",
            ));
        }
    }

    /// `:hover`-only affordances are invisible to keyboard users.
    fn check_focus_styles(&self, stylesheet: &Stylesheet, warnings: &mut Vec<Finding>) {
        let mentions = |needle: &str| {
            stylesheet
                .all_rules()
                .any(|rule| rule.selectors.to_ascii_lowercase().contains(needle))
        };
        if mentions(":hover") && !mentions(":focus") {
            warnings.push(Finding::new(
                FindingKind::Accessibility,
                ":hover styles without any :focus styles",
            ));
        }
    }

    fn check_inline_styles(
        &self,
        sources: &CssSources,
        errors: &mut Vec<Finding>,
        warnings: &mut Vec<Finding>,
    ) {
        for inline in &sources.inline {
            let css = inline.css.trim();
            if !css.is_empty() && !css.contains(':') {
                errors.push(Finding::new(
                    FindingKind::Syntax,
                    format!(
                        "malformed style attribute on <{}>: `{}`",
                        inline.tag, css
                    ),
                ));
            }
        }
        if sources.inline.len() > INLINE_STYLE_BUDGET {
            warnings.push(Finding::new(
                FindingKind::Maintainability,
                format!(
                    "{} inline style attributes; move shared styles into a stylesheet",
                    sources.inline.len()
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(html: &str) -> ValidationOutcome {
        CssValidator::new().validate(html)
    }

    fn with_style(css: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head><title>T</title><style>{}</style></head>\
             <body><p>x</p></body></html>",
            css
        )
    }

    fn warning_messages(outcome: &ValidationOutcome) -> Vec<&str> {
        outcome
            .warnings
            .iter()
            .map(|finding| finding.message.as_str())
            .collect()
    }

    #[test]
    fn test_no_css_scores_fifty_and_stays_valid() {
        let outcome =
            validate("<!DOCTYPE html><html><head><title>T</title></head><body><p>x</p></body></html>");
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.score, NO_CSS_SCORE);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("no CSS found"));
    }

    #[test]
    fn test_clean_modern_css_scores_100() {
        let outcome = validate(&with_style(
            "body { color: #333; background-color: #fff; font-size: 16px; display: flex; }\
             a:hover, a:focus { color: teal; }",
        ));
        assert!(outcome.valid);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.score, 100);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let outcome = validate(&with_style("p { content: \"broken\n }"));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("CSS parse error"));
    }

    #[test]
    fn test_vendor_prefix_without_fallback() {
        let outcome = validate(&with_style(
            ".a { -webkit-transform: scale(2); color: red; display: flex; font-size: 14px; }",
        ));
        assert!(warning_messages(&outcome)
            .iter()
            .any(|w| w.contains("-webkit-transform") && w.contains("fallback")));

        let with_fallback = validate(&with_style(
            ".a { -webkit-transform: scale(2); transform: scale(2); color: red; display: flex; }",
        ));
        assert!(!warning_messages(&with_fallback)
            .iter()
            .any(|w| w.contains("-webkit-transform")));
    }

    #[test]
    fn test_float_and_clear_warn() {
        let outcome = validate(&with_style(
            ".col { float: left; color: red; display: flex; } .row { clear: both; }",
        ));
        let warnings = warning_messages(&outcome);
        assert!(warnings.iter().any(|w| w.contains("`float`")));
        assert!(warnings.iter().any(|w| w.contains("`clear`")));
    }

    #[test]
    fn test_missing_visual_basics_warn() {
        let outcome = validate(&with_style(".a { display: flex; margin: 0; }"));
        assert!(warning_messages(&outcome)
            .iter()
            .any(|w| w.contains("no color, background-color or font-size")));
    }

    #[test]
    fn test_overly_specific_selector_warns() {
        let outcome = validate(&with_style(
            "#page #main #content .item { color: red; display: grid; }",
        ));
        assert!(warning_messages(&outcome)
            .iter()
            .any(|w| w.contains("overly specific selector")));
    }

    #[test]
    fn test_important_warns_once() {
        let outcome = validate(&with_style(
            "p { color: red !important; display: flex; } h1 { margin: 0 !important; }",
        ));
        assert_eq!(
            warning_messages(&outcome)
                .iter()
                .filter(|w| w.contains("!important"))
                .count(),
            1
        );
    }

    #[test]
    fn test_no_responsive_technique_warns() {
        let outcome = validate(&with_style("p { color: red; font-size: 14px; }"));
        assert!(warning_messages(&outcome)
            .iter()
            .any(|w| w.contains("no responsive technique")));

        let with_media = validate(&with_style(
            "p { color: red; } @media (max-width: 600px) { p { color: blue; } }",
        ));
        assert!(!warning_messages(&with_media)
            .iter()
            .any(|w| w.contains("no responsive technique")));
    }

    #[test]
    fn test_hover_without_focus_warns() {
        let outcome = validate(&with_style("a:hover { color: red; display: flex; }"));
        assert!(warning_messages(&outcome)
            .iter()
            .any(|w| w.contains(":hover styles without any :focus")));
    }

    #[test]
    fn test_malformed_inline_style_is_an_error() {
        let outcome = validate(
            "<!DOCTYPE html><html><head><title>T</title></head>\
             <body><p style=\"just-words\">x</p></body></html>",
        );
        assert!(!outcome.valid);
        assert!(outcome.errors[0].message.contains("malformed style attribute on <p>"));
    }

    #[test]
    fn test_inline_style_budget() {
        let paragraphs: String = (0..6)
            .map(|i| format!("<p style=\"color: red\">{}</p>", i))
            .collect();
        let outcome = validate(&format!(
            "<!DOCTYPE html><html><head><title>T</title></head><body>{}</body></html>",
            paragraphs
        ));
        assert!(warning_messages(&outcome)
            .iter()
            .any(|w| w.contains("6 inline style attributes")));
    }

    #[test]
    fn test_inline_only_css_counts_as_css() {
        let outcome = validate(
            "<!DOCTYPE html><html><head><title>T</title></head>\
             <body><p style=\"color: red\">x</p></body></html>",
        );
        assert!(!outcome.warnings.iter().any(|w| w.message.contains("no CSS found")));
    }

    #[test]
    fn test_garbage_never_panics() {
        for input in ["", "<style>", "<style>}{", "<p style=\"", "\u{0}\u{feff}"] {
            let _ = validate(input);
        }
    }
}
