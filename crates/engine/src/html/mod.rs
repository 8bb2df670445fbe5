//! HTML parsing for submissions.

mod tree_sink;

pub use tree_sink::{PageSink, SinkHandle};

use std::sync::Arc;

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};

use crate::dom::Document;
use crate::error::EngineResult;
use crate::limits::ResourceLimits;
use crate::metrics::DocumentMetrics;

/// Parse an HTML string into a submission [`Document`].
///
/// Untrusted input is tolerated: malformed markup is recovered by the HTML5
/// algorithm and over-budget content is clipped, so this only fails on
/// internal engine errors, never on submission content.
pub fn parse_html(html: &str, limits: &ResourceLimits) -> EngineResult<Document> {
    let metrics = Arc::new(DocumentMetrics::new());
    let sink = PageSink::new(limits.clone(), metrics);

    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let document = parse_document(sink, opts).one(html);
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Document {
        parse_html(html, &ResourceLimits::default()).expect("parse failed")
    }

    #[test]
    fn test_basic_parse() {
        let doc = parse(
            "<!DOCTYPE html><html><head><title>Test Page</title></head>\
             <body><h1>Hello World</h1><p>This is a test.</p></body></html>",
        );
        assert_eq!(doc.title().as_deref(), Some("Test Page"));
        assert_eq!(doc.elements_by_tag("h1").len(), 1);
    }

    #[test]
    fn test_malformed_html_recovers() {
        let doc = parse("<html><head><title>Test</title><body><p>Unclosed paragraph<div>Nested</html>");
        assert_eq!(doc.title().as_deref(), Some("Test"));
        assert!(!doc.elements_by_tag("p").is_empty());
    }

    #[test]
    fn test_empty_and_garbage_inputs() {
        for input in ["", "<", "<html", "&", "&#x", "\u{0}\u{1}binary\u{2}"] {
            // Must not panic, whatever comes in
            let _ = parse(input);
        }
    }

    #[test]
    fn test_synthesized_structure() {
        // The HTML5 algorithm synthesizes html/head/body even when absent
        let doc = parse("<p>bare</p>");
        assert_eq!(doc.elements_by_tag("html").len(), 1);
        assert_eq!(doc.elements_by_tag("body").len(), 1);
        assert!(!doc.has_doctype());
    }

    #[test]
    fn test_script_and_stylesheet_counting() {
        let doc = parse(
            "<!DOCTYPE html><head>\
             <style>p { color: red; }</style>\
             <link rel=\"stylesheet\" href=\"missing.css\">\
             <link rel=\"icon\" href=\"favicon.ico\">\
             <script>var x = 1;</script>\
             </head><body><script src=\"app.js\"></script></body>",
        );
        assert_eq!(doc.metrics().script_count(), 2);
        assert_eq!(doc.metrics().stylesheet_count(), 2);
    }

    #[test]
    fn test_node_budget_clips_instead_of_failing() {
        let limits = ResourceLimits {
            max_nodes: 16,
            ..Default::default()
        };
        let mut html = String::from("<!DOCTYPE html><body>");
        for i in 0..100 {
            html.push_str(&format!("<p>item {}</p>", i));
        }
        html.push_str("</body>");

        let doc = parse_html(&html, &limits).expect("clipped parse failed");
        assert!(doc.count_elements() <= 16);
        assert!(doc.metrics().clipped_count() > 0);
    }

    #[test]
    fn test_depth_budget_clips() {
        let limits = ResourceLimits {
            max_depth: 8,
            ..Default::default()
        };
        let mut html = String::from("<!DOCTYPE html><body>");
        for _ in 0..50 {
            html.push_str("<div>");
        }
        html.push_str("deep");
        let doc = parse_html(&html, &limits).expect("deep parse failed");
        assert!(doc.metrics().clipped_count() > 0);
    }
}
