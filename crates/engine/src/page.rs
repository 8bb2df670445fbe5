//! The page: one loaded submission, owned by one evaluation.
//!
//! A `Page` is the scoped stand-in for a browser tab. Loading parses the
//! document, gathers its CSS and computes an initial layout while timing
//! the whole thing; changing the viewport recomputes layout in place. The
//! page owns every derived structure, so dropping it releases the full
//! engine state on any exit path.

use crate::css::{extract_css, CssSources, Stylesheet};
use crate::dom::Document;
use crate::error::EngineResult;
use crate::layout::{LayoutEngine, LayoutResult, Viewport};
use crate::limits::ResourceLimits;
use crate::metrics::LoadTimer;

/// Load-time counters surfaced to the grader.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageMetrics {
    /// Wall-clock milliseconds for parse + style + first layout
    pub load_time_ms: u64,
    /// Element count of the parsed document
    pub elements: usize,
    /// `<script>` elements seen
    pub scripts: usize,
    /// `<style>` elements and stylesheet links seen
    pub stylesheets: usize,
}

/// A loaded submission.
pub struct Page {
    document: Document,
    stylesheet: Stylesheet,
    css_sources: CssSources,
    viewport: Viewport,
    layout: LayoutResult,
    engine: LayoutEngine,
    metrics: PageMetrics,
}

impl Page {
    /// Parse a submission and render it at the default viewport.
    pub fn load(html: &str, limits: &ResourceLimits) -> EngineResult<Page> {
        let timer = LoadTimer::new();

        let document = crate::html::parse_html(html, limits)?;
        let css_sources = extract_css(&document, limits);

        // A page still renders when its CSS is broken; the style validator
        // is the component that reports the breakage
        let stylesheet = match Stylesheet::parse(&css_sources.combined_blocks()) {
            Ok(stylesheet) => stylesheet,
            Err(err) => {
                tracing::debug!("stylesheet dropped: {}", err);
                Stylesheet::default()
            }
        };

        let viewport = Viewport::default();
        let mut engine = LayoutEngine::new();
        let layout = engine.compute(&document, &stylesheet, viewport)?;

        let metrics = PageMetrics {
            load_time_ms: timer.elapsed_ms(),
            elements: document.metrics().element_count(),
            scripts: document.metrics().script_count(),
            stylesheets: document.metrics().stylesheet_count(),
        };

        Ok(Page {
            document,
            stylesheet,
            css_sources,
            viewport,
            layout,
            engine,
            metrics,
        })
    }

    /// Re-render at a new viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) -> EngineResult<()> {
        if viewport == self.viewport {
            return Ok(());
        }
        self.layout = self
            .engine
            .compute(&self.document, &self.stylesheet, viewport)?;
        self.viewport = viewport;
        Ok(())
    }

    /// The scrollable width of the document at the current viewport.
    pub fn scroll_width(&self) -> f32 {
        self.layout.document_width
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn css_sources(&self) -> &CssSources {
        &self.css_sources
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn metrics(&self) -> PageMetrics {
        self.metrics
    }

    /// True when the submission references styling of any kind: a style
    /// block, an inline style attribute or an external stylesheet link.
    pub fn has_author_styles(&self) -> bool {
        self.css_sources.has_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(html: &str) -> Page {
        Page::load(html, &ResourceLimits::default()).expect("page load failed")
    }

    #[test]
    fn test_load_collects_metrics() {
        let page = load(
            "<!DOCTYPE html><html><head><title>T</title><style>p{color:red}</style></head>\
             <body><p>hi</p><script>var x=1;</script></body></html>",
        );
        let metrics = page.metrics();
        assert!(metrics.elements >= 6);
        assert_eq!(metrics.scripts, 1);
        assert_eq!(metrics.stylesheets, 1);
        assert!(page.has_author_styles());
    }

    #[test]
    fn test_viewport_change_recomputes_layout() {
        let mut page = load(
            "<!DOCTYPE html><head><style>body { width: 1000px; }</style></head>\
             <body><div>wide</div></body>",
        );
        assert_eq!(page.scroll_width(), 1280.0);

        page.set_viewport(Viewport {
            width: 375.0,
            height: 667.0,
        })
        .unwrap();
        assert!(page.scroll_width() >= 1000.0);
    }

    #[test]
    fn test_broken_css_still_loads() {
        let page = load(
            "<!DOCTYPE html><head><style>p { content: \"broken\n }</style></head><body><p>x</p></body>",
        );
        assert!(page.stylesheet().is_empty());
        assert!(page.has_author_styles());
    }

    #[test]
    fn test_pathological_input_loads() {
        let page = load("<<<>>><p style='color:red'>x</p><table><td>y");
        assert!(page.scroll_width() >= 0.0);
    }
}
