//! Shared accessibility queries, used by the HTML validator and by the
//! functional runner's accessibility phase so both grade the same facts.

use w2s_engine::{Document, Element};

/// Form controls that need an accessible name: visible inputs, selects,
/// textareas.
const LABELLABLE_TAGS: [&str; 3] = ["input", "select", "textarea"];

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}

fn describe(element: &Element) -> String {
    if let Some(id) = element.id() {
        return format!("{}#{}", element.local_name(), id);
    }
    if let Some(name) = element.attr("name") {
        return format!("{}[name={}]", element.local_name(), name);
    }
    element.local_name().to_string()
}

/// True when the document contains at least one labellable form control.
pub fn has_form_controls(doc: &Document) -> bool {
    LABELLABLE_TAGS.iter().any(|tag| {
        doc.elements_by_tag(tag).iter().any(|handle| {
            handle
                .read()
                .ok()
                .and_then(|node| node.element().map(is_labellable))
                .unwrap_or(false)
        })
    })
}

fn is_labellable(element: &Element) -> bool {
    if element.local_name() != "input" {
        return true;
    }
    !element
        .attr("type")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("hidden"))
}

/// Descriptions of form controls lacking any accessible name: no matching
/// `<label for>`, no `aria-label`, no `aria-labelledby`.
pub fn unlabelled_controls(doc: &Document) -> Vec<String> {
    let labelled_ids: Vec<String> = doc
        .elements_by_tag("label")
        .iter()
        .filter_map(|handle| {
            let node = handle.read().ok()?;
            let target = node.element()?.attr("for")?.trim().to_string();
            (!target.is_empty()).then_some(target)
        })
        .collect();

    let mut unlabelled = Vec::new();
    for tag in LABELLABLE_TAGS {
        for handle in doc.elements_by_tag(tag) {
            let Ok(node) = handle.read() else { continue };
            let Some(element) = node.element() else {
                continue;
            };
            if !is_labellable(element) {
                continue;
            }
            let has_label = element
                .id()
                .is_some_and(|id| labelled_ids.iter().any(|target| target == id));
            if has_label
                || non_empty(element.attr("aria-label"))
                || non_empty(element.attr("aria-labelledby"))
            {
                continue;
            }
            unlabelled.push(describe(element));
        }
    }
    unlabelled
}

/// `src` values (or "unknown src") of images without an `alt` attribute.
pub fn images_missing_alt(doc: &Document) -> Vec<String> {
    doc.elements_by_tag("img")
        .iter()
        .filter_map(|handle| {
            let node = handle.read().ok()?;
            let element = node.element()?;
            if element.has_attr("alt") {
                return None;
            }
            Some(element.attr("src").unwrap_or("unknown src").to_string())
        })
        .collect()
}

/// True when the document contains at least one `<img>`.
pub fn has_images(doc: &Document) -> bool {
    !doc.elements_by_tag("img").is_empty()
}

/// True when any heading element h1..h6 exists.
pub fn has_headings(doc: &Document) -> bool {
    ["h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .any(|tag| !doc.elements_by_tag(tag).is_empty())
}
