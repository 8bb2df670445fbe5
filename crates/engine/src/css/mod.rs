//! CSS extraction and parsing for submissions.
//!
//! Submissions carry CSS in `<style>` blocks and `style=` attributes (the
//! sandbox never fetches external stylesheets, it only records the
//! references). Syntax is validated with the cssparser tokenizer; rule
//! structure is recovered with a tolerant splitter so one broken rule does
//! not hide the rest of the sheet.

pub mod cascade;
pub mod value;

pub use cascade::{compute_style, ComputedStyle, DisplayKind};
pub use value::{ColorValue, LengthValue};

use cssparser::{BasicParseErrorKind, ParseError, Parser, ParserInput, Token};

use crate::dom::{Document, NodeData, NodeHandle};
use crate::error::{EngineError, EngineResult};
use crate::limits::ResourceLimits;

/// A single CSS declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name, lowercased
    pub property: String,
    /// Raw value text, trimmed, with any `!important` marker removed
    pub value: String,
    pub important: bool,
}

/// A selector group plus its declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// Raw selector text (may contain a comma-separated group)
    pub selectors: String,
    pub declarations: Vec<Declaration>,
}

/// Width constraints parsed from an `@media` prelude.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaQuery {
    pub min_width: Option<f32>,
    pub max_width: Option<f32>,
}

impl MediaQuery {
    pub fn matches(&self, viewport_width: f32) -> bool {
        self.min_width.map_or(true, |min| viewport_width >= min)
            && self.max_width.map_or(true, |max| viewport_width <= max)
    }
}

/// An `@media` block.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    pub query: MediaQuery,
    /// The raw prelude after `@media`, for reporting
    pub raw_query: String,
    pub rules: Vec<StyleRule>,
}

/// A parsed author stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<StyleRule>,
    pub media_rules: Vec<MediaRule>,
}

impl Stylesheet {
    /// Parse a stylesheet. The tokenizer pass rejects malformed syntax
    /// (unterminated strings/urls, stray closing braces); the structural
    /// pass then recovers rules tolerantly.
    pub fn parse(css: &str) -> EngineResult<Stylesheet> {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        if let Err(err) = scan_tokens(&mut parser) {
            return Err(EngineError::Css(describe_parse_error(&err)));
        }

        let source = strip_comments(css);
        let (rules, media_rules) = parse_block_list(&source);
        Ok(Stylesheet { rules, media_rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.media_rules.is_empty()
    }

    /// All style rules, top-level first, then media-scoped.
    pub fn all_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules
            .iter()
            .chain(self.media_rules.iter().flat_map(|media| media.rules.iter()))
    }

    /// All declarations in the sheet.
    pub fn all_declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.all_rules().flat_map(|rule| rule.declarations.iter())
    }
}

/// One `style=` attribute occurrence.
#[derive(Debug, Clone)]
pub struct InlineStyle {
    /// Tag carrying the attribute, for reporting
    pub tag: String,
    /// Raw attribute value
    pub css: String,
}

/// CSS gathered from one document.
#[derive(Debug, Clone, Default)]
pub struct CssSources {
    /// Contents of `<style>` blocks, in document order
    pub blocks: Vec<String>,
    /// `style=` attribute occurrences, in document order
    pub inline: Vec<InlineStyle>,
    /// `href` values of stylesheet `<link>`s (recorded, never fetched)
    pub external: Vec<String>,
}

impl CssSources {
    /// Embedded author CSS joined into one sheet.
    pub fn combined_blocks(&self) -> String {
        self.blocks.join("\n")
    }

    /// True when the submission references styling of any kind.
    pub fn has_any(&self) -> bool {
        self.has_embedded() || !self.external.is_empty()
    }

    /// True when there is CSS the sandbox can actually read.
    pub fn has_embedded(&self) -> bool {
        self.blocks.iter().any(|block| !block.trim().is_empty())
            || self.inline.iter().any(|style| !style.css.trim().is_empty())
    }
}

/// Gather every CSS source in the document.
pub fn extract_css(doc: &Document, limits: &ResourceLimits) -> CssSources {
    let mut sources = CssSources::default();

    for style in doc.elements_by_tag("style") {
        sources.blocks.push(limits.clamp_css(&raw_text(&style)));
    }

    for handle in doc.all_elements() {
        let Ok(node) = handle.read() else { continue };
        let Some(element) = node.element() else {
            continue;
        };
        if let Some(style) = element.attr("style") {
            sources.inline.push(InlineStyle {
                tag: element.local_name().to_string(),
                css: style.to_string(),
            });
        }
    }

    for link in doc.elements_by_tag("link") {
        let Ok(node) = link.read() else { continue };
        let Some(element) = node.element() else {
            continue;
        };
        let is_stylesheet = element
            .attr("rel")
            .is_some_and(|rel| rel.to_ascii_lowercase().contains("stylesheet"));
        if is_stylesheet {
            sources
                .external
                .push(element.attr("href").unwrap_or("unknown href").to_string());
        }
    }

    sources
}

/// Concatenate the direct text children of a node, verbatim.
fn raw_text(handle: &NodeHandle) -> String {
    let mut text = String::new();
    if let Ok(node) = handle.read() {
        for child in &node.children {
            if let Ok(child_node) = child.read() {
                if let NodeData::Text(chunk) = &child_node.data {
                    text.push_str(chunk);
                }
            }
        }
    }
    text
}

/// Recursive tokenizer walk. Surfaces the malformed constructs the
/// tokenizer can prove: unterminated strings and bad url() tokens.
fn scan_tokens<'i>(parser: &mut Parser<'i, '_>) -> Result<(), ParseError<'i, String>> {
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(err) => {
                return match err.kind {
                    BasicParseErrorKind::EndOfInput => Ok(()),
                    _ => Err(err.into()),
                };
            }
        };
        match token {
            Token::BadString(raw) => {
                return Err(parser.new_custom_error(format!("unterminated string near `{}`", &*raw)));
            }
            Token::BadUrl(raw) => {
                return Err(parser.new_custom_error(format!("malformed url() near `{}`", &*raw)));
            }
            Token::CurlyBracketBlock
            | Token::SquareBracketBlock
            | Token::ParenthesisBlock
            | Token::Function(_) => {
                parser.parse_nested_block(|nested| scan_tokens(nested))?;
            }
            _ => {}
        }
    }
}

fn describe_parse_error(err: &ParseError<'_, String>) -> String {
    format!("{:?} at {}:{}", err.kind, err.location.line + 1, err.location.column)
}

/// Strip `/* ... */` comments. An unterminated comment swallows the rest of
/// the sheet, matching browser behavior.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Split a comment-free source into rules and `@media` blocks.
fn parse_block_list(source: &str) -> (Vec<StyleRule>, Vec<MediaRule>) {
    let mut rules = Vec::new();
    let mut media_rules = Vec::new();
    let mut rest = source;

    loop {
        let Some(open) = rest.find('{') else { break };
        let prelude = rest[..open].trim();

        // Statement at-rules (@import, @charset) end at a ';' before any
        // block; drop them and rescan.
        if let Some(semi) = rest[..open].find(';') {
            if rest[..semi].trim_start().starts_with('@') {
                rest = &rest[semi + 1..];
                continue;
            }
        }

        let Some(len) = matching_block_len(&rest[open..]) else {
            // Unbalanced block: take what is there and stop
            let body = &rest[open + 1..];
            append_rule(prelude, body, &mut rules, &mut media_rules);
            break;
        };
        let body = &rest[open + 1..open + len - 1];
        append_rule(prelude, body, &mut rules, &mut media_rules);
        rest = &rest[open + len..];
    }

    (rules, media_rules)
}

fn append_rule(
    prelude: &str,
    body: &str,
    rules: &mut Vec<StyleRule>,
    media_rules: &mut Vec<MediaRule>,
) {
    if prelude.is_empty() {
        return;
    }
    if let Some(query) = prelude.strip_prefix("@media") {
        let (inner_rules, _nested) = parse_block_list(body);
        media_rules.push(MediaRule {
            query: parse_media_query(query),
            raw_query: query.trim().to_string(),
            rules: inner_rules,
        });
    } else if prelude.starts_with('@') {
        // @font-face, @keyframes and friends carry nothing the grader reads
    } else {
        rules.push(StyleRule {
            selectors: prelude.to_string(),
            declarations: parse_declarations(body),
        });
    }
}

/// Byte length of a balanced `{...}` block starting at the opening brace.
fn matching_block_len(block: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, ch) in block.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the body of a rule into declarations. Fragments without a colon
/// are skipped here; the style validator reports them where they matter.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    body.split(';')
        .filter_map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                return None;
            }
            let colon = segment.find(':')?;
            let property = segment[..colon].trim().to_ascii_lowercase();
            if property.is_empty() {
                return None;
            }
            let mut value = segment[colon + 1..].trim().to_string();
            let mut important = false;
            let lowered = value.to_ascii_lowercase();
            if let Some(stripped) = lowered.strip_suffix("!important") {
                important = true;
                value.truncate(stripped.trim_end().len());
                value = value.trim_end().to_string();
            } else if lowered.ends_with("! important") {
                important = true;
                let cut = lowered.rfind('!').unwrap_or(value.len());
                value.truncate(cut);
                value = value.trim_end().to_string();
            }
            Some(Declaration {
                property,
                value,
                important,
            })
        })
        .collect()
}

fn parse_media_query(raw: &str) -> MediaQuery {
    MediaQuery {
        min_width: extract_width_feature(raw, "min-width"),
        max_width: extract_width_feature(raw, "max-width"),
    }
}

fn extract_width_feature(raw: &str, feature: &str) -> Option<f32> {
    let lower = raw.to_ascii_lowercase();
    let start = lower.find(feature)?;
    let rest = &lower[start + feature.len()..];
    let colon = rest.find(':')?;
    let value = rest[colon + 1..].split(')').next()?.trim();
    LengthValue::parse(value).map(|length| length.to_px(16.0, 0.0, 0.0))
}
