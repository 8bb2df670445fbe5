//! Viewport layout using Taffy.
//!
//! The grader does not paint anything; layout exists to answer one question
//! per viewport: how wide does this document actually render? Text metrics
//! are estimated (character-width table, wrap at the viewport), so explicit
//! CSS sizing is what drives overflow, which is exactly what the responsive
//! checks grade.

use std::collections::HashMap;
use std::time::Instant;

use taffy::{
    AvailableSpace, Dimension, Display, LengthPercentage, LengthPercentageAuto, NodeId, Rect,
    Size, Style, TaffyTree,
};

use crate::css::cascade::{compute_style, ComputedStyle, DisplayKind, Edges};
use crate::css::value::LengthValue;
use crate::css::Stylesheet;
use crate::dom::{Document, NodeData, NodeHandle};
use crate::error::{EngineError, EngineResult};

/// A rendering viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        // Desktop-sized unless the caller says otherwise
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Result of one layout pass.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    /// Width of the laid-out document, floored at the viewport width
    /// (the scrollable width a browser would report)
    pub document_width: f32,
    /// Height of the laid-out document, floored at the viewport height
    pub document_height: f32,
    /// Number of taffy nodes built
    pub nodes_processed: usize,
    pub layout_time_ms: u64,
}

/// Estimated text metrics for content sizing.
#[derive(Debug, Clone)]
pub struct TextMeasurement {
    pub base_font_size: f32,
    pub line_height_factor: f32,
    char_widths: HashMap<char, f32>,
    default_char_width: f32,
}

impl Default for TextMeasurement {
    fn default() -> Self {
        let mut char_widths = HashMap::new();
        // Approximate widths at 16px
        char_widths.insert(' ', 4.0);
        char_widths.insert('i', 4.0);
        char_widths.insert('l', 4.0);
        char_widths.insert('m', 12.0);
        char_widths.insert('w', 12.0);
        char_widths.insert('M', 14.0);
        char_widths.insert('W', 14.0);
        Self {
            base_font_size: 16.0,
            line_height_factor: 1.4,
            char_widths,
            default_char_width: 8.0,
        }
    }
}

impl TextMeasurement {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / 16.0;
        text.chars()
            .map(|ch| self.char_widths.get(&ch).copied().unwrap_or(self.default_char_width))
            .sum::<f32>()
            * scale
    }
}

/// Layout engine; one instance per page, reused across viewport changes.
pub struct LayoutEngine {
    taffy: TaffyTree,
    text: TextMeasurement,
    nodes_built: usize,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            text: TextMeasurement::default(),
            nodes_built: 0,
        }
    }

    /// Compute layout for a document at the given viewport.
    pub fn compute(
        &mut self,
        doc: &Document,
        stylesheet: &Stylesheet,
        viewport: Viewport,
    ) -> EngineResult<LayoutResult> {
        let start = Instant::now();

        // Fresh tree per pass; taffy caches per-node state otherwise
        self.taffy = TaffyTree::new();
        self.nodes_built = 0;

        let children = self.build_children(&doc.root(), stylesheet, viewport)?;
        let root_style = Style {
            display: Display::Block,
            size: Size {
                width: Dimension::Length(viewport.width),
                height: Dimension::Auto,
            },
            ..Style::default()
        };
        let root = self
            .taffy
            .new_with_children(root_style, &children)
            .map_err(|err| EngineError::Layout(format!("taffy root: {:?}", err)))?;

        let available = Size {
            width: AvailableSpace::Definite(viewport.width),
            height: AvailableSpace::Definite(viewport.height),
        };
        self.taffy
            .compute_layout(root, available)
            .map_err(|err| EngineError::Layout(format!("taffy compute: {:?}", err)))?;

        let mut extent = (0.0f32, 0.0f32);
        self.max_extent(root, 0.0, 0.0, &mut extent)?;

        Ok(LayoutResult {
            document_width: extent.0.max(viewport.width),
            document_height: extent.1.max(viewport.height),
            nodes_processed: self.nodes_built,
            layout_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn build_children(
        &mut self,
        handle: &NodeHandle,
        stylesheet: &Stylesheet,
        viewport: Viewport,
    ) -> EngineResult<Vec<NodeId>> {
        let children = match handle.read() {
            Ok(node) => node.children.clone(),
            Err(_) => Vec::new(),
        };
        let mut ids = Vec::new();
        for child in &children {
            if let Some(id) = self.build_node(child, stylesheet, viewport, 16.0)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn build_node(
        &mut self,
        handle: &NodeHandle,
        stylesheet: &Stylesheet,
        viewport: Viewport,
        inherited_font_size: f32,
    ) -> EngineResult<Option<NodeId>> {
        enum Kind {
            Text(String),
            Element(ComputedStyle),
            Skip,
        }

        let (kind, children) = {
            let Ok(node) = handle.read() else {
                return Ok(None);
            };
            let kind = match &node.data {
                NodeData::Text(text) => {
                    if text.trim().is_empty() {
                        Kind::Skip
                    } else {
                        Kind::Text(text.clone())
                    }
                }
                NodeData::Element(element) => {
                    let computed = compute_style(element, stylesheet, viewport.width);
                    if computed.display == DisplayKind::None {
                        Kind::Skip
                    } else {
                        Kind::Element(computed)
                    }
                }
                _ => Kind::Skip,
            };
            (kind, node.children.clone())
        };

        match kind {
            Kind::Skip => Ok(None),
            Kind::Text(text) => {
                let id = self.build_text_leaf(&text, viewport, inherited_font_size)?;
                Ok(Some(id))
            }
            Kind::Element(computed) => {
                let style = self.to_taffy_style(&computed, viewport);
                let font_size = computed.font_size;
                let mut child_ids = Vec::new();
                for child in &children {
                    if let Some(id) = self.build_node(child, stylesheet, viewport, font_size)? {
                        child_ids.push(id);
                    }
                }
                self.nodes_built += 1;
                let id = if child_ids.is_empty() {
                    self.taffy.new_leaf(style)
                } else {
                    self.taffy.new_with_children(style, &child_ids)
                }
                .map_err(|err| EngineError::Layout(format!("taffy node: {:?}", err)))?;
                Ok(Some(id))
            }
        }
    }

    fn build_text_leaf(
        &mut self,
        text: &str,
        viewport: Viewport,
        font_size: f32,
    ) -> EngineResult<NodeId> {
        let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let measured = self.text.text_width(&collapsed, font_size);
        let line_height = font_size * self.text.line_height_factor;
        // Text wraps at the viewport; this is an estimate, not a typesetter
        let lines = (measured / viewport.width.max(1.0)).ceil().max(1.0);
        let width = measured.min(viewport.width);

        let style = Style {
            display: Display::Block,
            size: Size {
                width: Dimension::Length(width),
                height: Dimension::Length(lines * line_height),
            },
            ..Style::default()
        };
        self.nodes_built += 1;
        self.taffy
            .new_leaf(style)
            .map_err(|err| EngineError::Layout(format!("taffy text leaf: {:?}", err)))
    }

    fn to_taffy_style(&self, computed: &ComputedStyle, viewport: Viewport) -> Style {
        let mut style = Style::default();

        style.display = match computed.display {
            DisplayKind::Flex => Display::Flex,
            DisplayKind::Grid => Display::Grid,
            DisplayKind::None => Display::None,
            // Taffy has no inline formatting; inline boxes become blocks
            DisplayKind::Block | DisplayKind::Inline | DisplayKind::InlineBlock => Display::Block,
        };

        let font_size = computed.font_size;
        style.size = Size {
            width: self.dimension(&computed.width, font_size, viewport),
            height: self.dimension(&computed.height, font_size, viewport),
        };
        style.min_size = Size {
            width: self.dimension(&computed.min_width, font_size, viewport),
            height: Dimension::Auto,
        };
        style.max_size = Size {
            width: self.dimension(&computed.max_width, font_size, viewport),
            height: Dimension::Auto,
        };
        style.margin = self.auto_rect(&computed.margin, font_size, viewport);
        style.padding = self.length_rect(&computed.padding, font_size, viewport);

        style
    }

    fn dimension(
        &self,
        length: &Option<LengthValue>,
        font_size: f32,
        viewport: Viewport,
    ) -> Dimension {
        match length {
            Some(LengthValue::Auto) | None => Dimension::Auto,
            Some(LengthValue::Percent(pct)) => Dimension::Percent(pct / 100.0),
            Some(other) => {
                Dimension::Length(other.to_px(font_size, viewport.width, viewport.height))
            }
        }
    }

    fn auto_rect(
        &self,
        edges: &Edges,
        font_size: f32,
        viewport: Viewport,
    ) -> Rect<LengthPercentageAuto> {
        let side = |length: &Option<LengthValue>| match length {
            Some(LengthValue::Auto) => LengthPercentageAuto::Auto,
            Some(LengthValue::Percent(pct)) => LengthPercentageAuto::Percent(pct / 100.0),
            Some(other) => {
                LengthPercentageAuto::Length(other.to_px(font_size, viewport.width, viewport.height))
            }
            None => LengthPercentageAuto::Length(0.0),
        };
        Rect {
            left: side(&edges.left),
            right: side(&edges.right),
            top: side(&edges.top),
            bottom: side(&edges.bottom),
        }
    }

    fn length_rect(
        &self,
        edges: &Edges,
        font_size: f32,
        viewport: Viewport,
    ) -> Rect<LengthPercentage> {
        let side = |length: &Option<LengthValue>| match length {
            Some(LengthValue::Percent(pct)) => LengthPercentage::Percent(pct / 100.0),
            Some(LengthValue::Auto) | None => LengthPercentage::Length(0.0),
            Some(other) => {
                LengthPercentage::Length(other.to_px(font_size, viewport.width, viewport.height))
            }
        };
        Rect {
            left: side(&edges.left),
            right: side(&edges.right),
            top: side(&edges.top),
            bottom: side(&edges.bottom),
        }
    }

    /// Walk the laid-out tree accumulating the absolute bottom-right extent.
    fn max_extent(
        &self,
        node: NodeId,
        origin_x: f32,
        origin_y: f32,
        extent: &mut (f32, f32),
    ) -> EngineResult<()> {
        let layout = self
            .taffy
            .layout(node)
            .map_err(|err| EngineError::Layout(format!("taffy layout: {:?}", err)))?;
        let x = origin_x + layout.location.x;
        let y = origin_y + layout.location.y;
        extent.0 = extent.0.max(x + layout.size.width);
        extent.1 = extent.1.max(y + layout.size.height);

        let children = self
            .taffy
            .children(node)
            .map_err(|err| EngineError::Layout(format!("taffy children: {:?}", err)))?;
        for child in children {
            self.max_extent(child, x, y, extent)?;
        }
        Ok(())
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::limits::ResourceLimits;

    fn layout(html: &str, css: &str, viewport: Viewport) -> LayoutResult {
        let doc = parse_html(html, &ResourceLimits::default()).unwrap();
        let sheet = Stylesheet::parse(css).unwrap();
        LayoutEngine::new().compute(&doc, &sheet, viewport).unwrap()
    }

    const MOBILE: Viewport = Viewport {
        width: 375.0,
        height: 667.0,
    };
    const DESKTOP: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    #[test]
    fn test_fitting_document_reports_viewport_width() {
        let result = layout(
            "<!DOCTYPE html><body><p>short text</p></body>",
            "",
            MOBILE,
        );
        assert_eq!(result.document_width, MOBILE.width);
        assert!(result.nodes_processed > 0);
    }

    #[test]
    fn test_fixed_width_body_overflows_small_viewports() {
        let html = "<!DOCTYPE html><body><div>content</div></body>";
        let css = "body { width: 2000px; }";

        let mobile = layout(html, css, MOBILE);
        assert!(mobile.document_width >= 2000.0);

        let desktop = layout(html, css, DESKTOP);
        assert!(desktop.document_width >= 2000.0);
    }

    #[test]
    fn test_media_query_rescues_mobile() {
        let html = "<!DOCTYPE html><body><div>content</div></body>";
        let css = "body { width: 2000px; } @media (max-width: 400px) { body { width: auto; } }";

        let mobile = layout(html, css, MOBILE);
        assert_eq!(mobile.document_width, MOBILE.width);

        let desktop = layout(html, css, DESKTOP);
        assert!(desktop.document_width >= 2000.0);
    }

    #[test]
    fn test_head_content_is_not_laid_out() {
        let result = layout(
            "<!DOCTYPE html><head><title>very long title text that should never count</title>\
             <style>p { color: red; }</style></head><body></body>",
            "",
            MOBILE,
        );
        assert_eq!(result.document_width, MOBILE.width);
    }

    #[test]
    fn test_long_text_wraps_instead_of_overflowing() {
        let text = "word ".repeat(400);
        let html = format!("<!DOCTYPE html><body><p>{}</p></body>", text);
        let result = layout(&html, "", MOBILE);
        assert_eq!(result.document_width, MOBILE.width);
        assert!(result.document_height > MOBILE.height);
    }
}
