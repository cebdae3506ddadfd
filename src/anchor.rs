//! Selectors that re-target a scanned element without touching it.
//!
//! An anchor is derived from the element itself, trying in order:
//! 1. its `id` (`#id`, or `tag[id='...']` when the id holds whitespace),
//! 2. its inline color declarations (`tag.class[style*="..."]`),
//! 3. its position in the tree (`html > body > div:nth-child(2)`).
//!
//! Ids, classes and quoted text are escaped with `cssparser`'s serializers so
//! every anchor parses back as a valid selector.

use std::fmt::{self, Write as _};

use cssparser::{CssStringWriter, serialize_identifier, serialize_string};
use scraper::ElementRef;

use crate::scanner::ScannedColor;

/// How an anchor was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AnchorKind {
    ById,
    ByAttributeSubstring,
    ByStructuralPath,
}

/// A selector string targeting one scanned element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssAnchor {
    selector: String,
    kind: AnchorKind,
}

impl CssAnchor {
    fn new(selector: String, kind: AnchorKind) -> Self {
        Self { selector, kind }
    }

    /// The selector text.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Whether the anchor only depends on the element's place in the tree.
    ///
    /// Such anchors break as soon as the markup is restructured.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.kind == AnchorKind::ByStructuralPath
    }
}

impl fmt::Display for CssAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}

/// Build the anchor for `element`, given the colors scanned on it.
///
/// Only the first applicable rule is used.
#[must_use]
pub fn build_anchor(element: ElementRef<'_>, colors: &[ScannedColor]) -> CssAnchor {
    by_id(element)
        .or_else(|| by_style(element, colors))
        .unwrap_or_else(|| by_structure(element))
}

fn by_id(element: ElementRef<'_>) -> Option<CssAnchor> {
    let id = element.value().attr("id").filter(|id| !id.is_empty())?;
    if id.chars().any(char::is_whitespace) {
        let tag = element.value().name();
        let id = single_quoted(id).ok()?;
        return Some(CssAnchor::new(
            format!("{tag}[id={id}]"),
            AnchorKind::ByAttributeSubstring,
        ));
    }
    let mut selector = String::from("#");
    serialize_identifier(id, &mut selector).ok()?;
    Some(CssAnchor::new(selector, AnchorKind::ById))
}

fn by_style(element: ElementRef<'_>, colors: &[ScannedColor]) -> Option<CssAnchor> {
    element.value().attr("style")?;

    let mut clauses = String::new();
    for color in colors.iter().filter(|color| color.source.is_inline_style()) {
        clauses.push_str("[style*=");
        serialize_string(&color.declaration.text, &mut clauses).ok()?;
        clauses.push(']');
    }
    if clauses.is_empty() {
        return None;
    }

    let mut selector = element.value().name().to_string();
    if let Some(class) = element.value().attr("class") {
        for name in class.split_whitespace() {
            selector.push('.');
            serialize_identifier(name, &mut selector).ok()?;
        }
    }
    selector.push_str(&clauses);
    Some(CssAnchor::new(selector, AnchorKind::ByAttributeSubstring))
}

/// Quote `value` as a single-quoted CSS string.
fn single_quoted(value: &str) -> Result<String, fmt::Error> {
    let mut quoted = String::from("'");
    for (i, part) in value.split('\'').enumerate() {
        if i > 0 {
            quoted.push_str("\\'");
        }
        CssStringWriter::new(&mut quoted).write_str(part)?;
    }
    quoted.push('\'');
    Ok(quoted)
}

fn by_structure(element: ElementRef<'_>) -> CssAnchor {
    let mut segments = Vec::new();
    let mut current = Some(element);
    while let Some(el) = current {
        let name = el.value().name();
        if name == "body" || name == "html" {
            break;
        }
        let position = 1 + el.prev_siblings().filter(|n| n.value().is_element()).count();
        segments.push(format!("{name}:nth-child({position})"));
        current = el.parent().and_then(ElementRef::wrap);
    }
    segments.push("body".to_string());
    segments.push("html".to_string());
    segments.reverse();
    CssAnchor::new(segments.join(" > "), AnchorKind::ByStructuralPath)
}
