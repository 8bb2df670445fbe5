//! A small style cascade: enough resolution to answer the grader's
//! questions (layout inputs, "did the author pick non-default colors"),
//! nowhere near a full selector engine.
//!
//! Matching covers `*`, `tag`, `.class`, `#id` and compounds of those; a
//! descendant selector is matched by its rightmost compound. Declarations
//! apply in source order, `!important` wins over normal, inline `style=`
//! wins last within its importance tier.

use std::collections::BTreeMap;

use crate::css::value::{ColorValue, LengthValue};
use crate::css::{parse_declarations, Declaration, Stylesheet};
use crate::dom::Element;

/// Resolved display, collapsed to what layout distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Block,
    Inline,
    InlineBlock,
    Flex,
    Grid,
    None,
}

/// The computed-style subset the layout engine and the styling checks read.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    pub display: DisplayKind,
    pub width: Option<LengthValue>,
    pub height: Option<LengthValue>,
    pub min_width: Option<LengthValue>,
    pub max_width: Option<LengthValue>,
    pub margin: Edges,
    pub padding: Edges,
    pub color: Option<ColorValue>,
    pub background_color: Option<ColorValue>,
    pub font_size: f32,
}

/// Per-side lengths for margin/padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Edges {
    pub top: Option<LengthValue>,
    pub right: Option<LengthValue>,
    pub bottom: Option<LengthValue>,
    pub left: Option<LengthValue>,
}

impl ComputedStyle {
    fn initial(tag: &str) -> Self {
        Self {
            display: default_display(tag),
            width: None,
            height: None,
            min_width: None,
            max_width: None,
            margin: Edges::default(),
            padding: Edges::default(),
            color: None,
            background_color: None,
            font_size: 16.0,
        }
    }

    /// True when the author moved either color channel off its default
    /// (black text on a transparent background).
    pub fn has_custom_colors(&self) -> bool {
        let custom_text = self
            .color
            .as_ref()
            .is_some_and(|color| !color.is_black());
        let custom_background = self
            .background_color
            .as_ref()
            .is_some_and(|color| !color.is_transparent());
        custom_text || custom_background
    }
}

/// Default display per element, following the UA stylesheet.
fn default_display(tag: &str) -> DisplayKind {
    match tag {
        "div" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "li" | "table"
        | "form" | "fieldset" | "blockquote" | "pre" | "address" | "header" | "footer"
        | "main" | "section" | "article" | "aside" | "nav" | "figure" | "figcaption" | "hr"
        | "body" | "html" => DisplayKind::Block,
        "img" | "input" | "button" | "select" | "textarea" => DisplayKind::InlineBlock,
        "head" | "meta" | "title" | "link" | "style" | "script" | "noscript" | "template" => {
            DisplayKind::None
        }
        _ => DisplayKind::Inline,
    }
}

/// Compute the style for one element at the given viewport width.
pub fn compute_style(
    element: &Element,
    stylesheet: &Stylesheet,
    viewport_width: f32,
) -> ComputedStyle {
    let mut computed = ComputedStyle::initial(element.local_name());

    // property -> (value, important); later same-tier writes win. Sorted
    // map so shorthands ("margin") apply before their longhands
    // ("margin-top") and property application stays deterministic.
    let mut applied: BTreeMap<String, (String, bool)> = BTreeMap::new();
    let mut apply = |declarations: &[Declaration]| {
        for decl in declarations {
            let replace = match applied.get(&decl.property) {
                Some((_, existing_important)) => decl.important || !*existing_important,
                None => true,
            };
            if replace {
                applied.insert(
                    decl.property.clone(),
                    (decl.value.clone(), decl.important),
                );
            }
        }
    };

    for rule in &stylesheet.rules {
        if selector_group_matches(&rule.selectors, element) {
            apply(&rule.declarations);
        }
    }
    for media in &stylesheet.media_rules {
        if !media.query.matches(viewport_width) {
            continue;
        }
        for rule in &media.rules {
            if selector_group_matches(&rule.selectors, element) {
                apply(&rule.declarations);
            }
        }
    }
    if let Some(inline) = element.attr("style") {
        apply(&parse_declarations(inline));
    }

    // Presentational width/height attributes (images mostly)
    if computed.width.is_none() && !applied.contains_key("width") {
        if let Some(width) = element.attr("width").and_then(LengthValue::parse) {
            computed.width = Some(width);
        }
    }
    if computed.height.is_none() && !applied.contains_key("height") {
        if let Some(height) = element.attr("height").and_then(LengthValue::parse) {
            computed.height = Some(height);
        }
    }

    for (property, (value, _)) in &applied {
        apply_property(&mut computed, property, value);
    }

    computed
}

fn apply_property(computed: &mut ComputedStyle, property: &str, value: &str) {
    match property {
        "display" => {
            computed.display = match value.to_ascii_lowercase().as_str() {
                "none" => DisplayKind::None,
                "flex" | "inline-flex" => DisplayKind::Flex,
                "grid" | "inline-grid" => DisplayKind::Grid,
                "inline" => DisplayKind::Inline,
                "inline-block" => DisplayKind::InlineBlock,
                _ => DisplayKind::Block,
            };
        }
        "width" => computed.width = LengthValue::parse(value),
        "height" => computed.height = LengthValue::parse(value),
        "min-width" => computed.min_width = LengthValue::parse(value),
        "max-width" => computed.max_width = LengthValue::parse(value),
        "margin" => computed.margin = parse_shorthand(value),
        "margin-top" => computed.margin.top = LengthValue::parse(value),
        "margin-right" => computed.margin.right = LengthValue::parse(value),
        "margin-bottom" => computed.margin.bottom = LengthValue::parse(value),
        "margin-left" => computed.margin.left = LengthValue::parse(value),
        "padding" => computed.padding = parse_shorthand(value),
        "padding-top" => computed.padding.top = LengthValue::parse(value),
        "padding-right" => computed.padding.right = LengthValue::parse(value),
        "padding-bottom" => computed.padding.bottom = LengthValue::parse(value),
        "padding-left" => computed.padding.left = LengthValue::parse(value),
        "color" => computed.color = ColorValue::parse(value),
        "background-color" => computed.background_color = ColorValue::parse(value),
        "background" => {
            // First color-shaped token of the shorthand, if any
            if let Some(color) = value
                .split_whitespace()
                .find_map(ColorValue::parse)
            {
                computed.background_color = Some(color);
            }
        }
        "font-size" => {
            if let Some(length) = LengthValue::parse(value) {
                computed.font_size = length.to_px(16.0, 0.0, 0.0).max(1.0);
            }
        }
        _ => {}
    }
}

/// Expand 1-4 value margin/padding shorthand.
fn parse_shorthand(value: &str) -> Edges {
    let parts: Vec<Option<LengthValue>> = value
        .split_whitespace()
        .map(LengthValue::parse)
        .collect();
    match parts.as_slice() {
        [all] => Edges {
            top: *all,
            right: *all,
            bottom: *all,
            left: *all,
        },
        [vertical, horizontal] => Edges {
            top: *vertical,
            right: *horizontal,
            bottom: *vertical,
            left: *horizontal,
        },
        [top, horizontal, bottom] => Edges {
            top: *top,
            right: *horizontal,
            bottom: *bottom,
            left: *horizontal,
        },
        [top, right, bottom, left] => Edges {
            top: *top,
            right: *right,
            bottom: *bottom,
            left: *left,
        },
        _ => Edges::default(),
    }
}

/// Match a comma-separated selector group.
fn selector_group_matches(group: &str, element: &Element) -> bool {
    group
        .split(',')
        .any(|selector| selector_matches(selector.trim(), element))
}

/// Match one selector by its rightmost compound part.
fn selector_matches(selector: &str, element: &Element) -> bool {
    if selector.is_empty() {
        return false;
    }
    // Reduce combinators to the subject compound
    let compound = selector
        .split([' ', '>', '+', '~'])
        .rev()
        .find(|part| !part.is_empty())
        .unwrap_or(selector);
    // Pseudo-classes/elements don't apply to a static document
    let compound = compound
        .split(':')
        .next()
        .unwrap_or(compound);
    if compound.is_empty() {
        return false;
    }
    compound_matches(compound, element)
}

fn compound_matches(compound: &str, element: &Element) -> bool {
    if compound == "*" {
        return true;
    }

    let mut rest = compound;
    // Leading tag name
    let tag_end = rest
        .find(['.', '#', '['])
        .unwrap_or(rest.len());
    let tag = &rest[..tag_end];
    if !tag.is_empty() && !tag.eq_ignore_ascii_case(element.local_name()) {
        return false;
    }
    rest = &rest[tag_end..];

    let classes = element.classes();
    while !rest.is_empty() {
        let (marker, tail) = rest.split_at(1);
        let token_end = tail.find(['.', '#', '[']).unwrap_or(tail.len());
        let token = &tail[..token_end];
        match marker {
            "." => {
                if !classes.iter().any(|class| class == token) {
                    return false;
                }
            }
            "#" => {
                if element.id() != Some(token) {
                    return false;
                }
            }
            // Attribute selectors are beyond this cascade
            "[" => return false,
            _ => return false,
        }
        rest = &tail[token_end..];
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attribute;
    use html5ever::{namespace_url, ns, QualName};

    fn element(tag: &str, attrs: &[(&str, &str)]) -> Element {
        let name = QualName::new(None, ns!(html), markup5ever::LocalName::from(tag));
        let attributes = attrs
            .iter()
            .map(|(key, value)| Attribute {
                name: QualName::new(None, ns!(), markup5ever::LocalName::from(*key)),
                value: value.to_string(),
            })
            .collect();
        Element::new(name, attributes)
    }

    fn sheet(css: &str) -> Stylesheet {
        Stylesheet::parse(css).unwrap()
    }

    #[test]
    fn test_tag_and_class_matching() {
        let div = element("div", &[("class", "card featured")]);
        assert!(selector_group_matches("div", &div));
        assert!(selector_group_matches(".card", &div));
        assert!(selector_group_matches("div.featured", &div));
        assert!(selector_group_matches("p, div", &div));
        assert!(!selector_group_matches("span", &div));
        assert!(!selector_group_matches(".missing", &div));
    }

    #[test]
    fn test_descendant_matches_subject() {
        let link = element("a", &[("class", "nav-link")]);
        assert!(selector_group_matches("nav ul li a", &link));
        assert!(selector_group_matches("nav > .nav-link", &link));
        assert!(!selector_group_matches("nav ul li span", &link));
    }

    #[test]
    fn test_pseudo_class_is_ignored() {
        let link = element("a", &[]);
        assert!(selector_group_matches("a:hover", &link));
    }

    #[test]
    fn test_id_matching() {
        let hero = element("section", &[("id", "hero")]);
        assert!(selector_group_matches("#hero", &hero));
        assert!(selector_group_matches("section#hero", &hero));
        assert!(!selector_group_matches("#other", &hero));
    }

    #[test]
    fn test_source_order_and_important() {
        let p = element("p", &[]);
        let styles = sheet("p { color: red; } p { color: blue; }");
        let computed = compute_style(&p, &styles, 1280.0);
        assert_eq!(computed.color, Some(ColorValue::Rgb(0, 0, 255)));

        let styles = sheet("p { color: red !important; } p { color: blue; }");
        let computed = compute_style(&p, &styles, 1280.0);
        assert_eq!(computed.color, Some(ColorValue::Rgb(255, 0, 0)));
    }

    #[test]
    fn test_inline_style_wins() {
        let p = element("p", &[("style", "color: lime")]);
        let styles = sheet("p { color: red; }");
        let computed = compute_style(&p, &styles, 1280.0);
        assert_eq!(computed.color, Some(ColorValue::Named("lime".to_string())));
    }

    #[test]
    fn test_media_rules_respect_viewport() {
        let body = element("body", &[]);
        let styles = sheet("body { width: 2000px; } @media (max-width: 400px) { body { width: auto; } }");

        let mobile = compute_style(&body, &styles, 375.0);
        assert_eq!(mobile.width, Some(LengthValue::Auto));

        let desktop = compute_style(&body, &styles, 1280.0);
        assert_eq!(desktop.width, Some(LengthValue::Px(2000.0)));
    }

    #[test]
    fn test_shorthand_expansion() {
        let div = element("div", &[]);
        let styles = sheet("div { margin: 10px 20px; padding: 5px; }");
        let computed = compute_style(&div, &styles, 1280.0);
        assert_eq!(computed.margin.top, Some(LengthValue::Px(10.0)));
        assert_eq!(computed.margin.left, Some(LengthValue::Px(20.0)));
        assert_eq!(computed.padding.right, Some(LengthValue::Px(5.0)));
    }

    #[test]
    fn test_custom_color_detection() {
        let p = element("p", &[]);
        let styles = sheet("p { color: #000; background-color: transparent; }");
        assert!(!compute_style(&p, &styles, 1280.0).has_custom_colors());

        let styles = sheet("p { color: #333; }");
        assert!(compute_style(&p, &styles, 1280.0).has_custom_colors());

        let styles = sheet("p { background-color: coral; }");
        assert!(compute_style(&p, &styles, 1280.0).has_custom_colors());
    }

    #[test]
    fn test_default_display() {
        let span = element("span", &[]);
        assert_eq!(
            compute_style(&span, &Stylesheet::default(), 1280.0).display,
            DisplayKind::Inline
        );
        let script = element("script", &[]);
        assert_eq!(
            compute_style(&script, &Stylesheet::default(), 1280.0).display,
            DisplayKind::None
        );
    }
}
