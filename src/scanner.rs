//! Discovery of color-bearing elements in a document body.
//!
//! The scanner walks the body in document order and records, per element,
//! the colors it sets through inline styles or legacy presentational markup.

use log::debug;
use scraper::ElementRef;

use crate::anchor::{CssAnchor, build_anchor};
use crate::declaration::{ColorDeclaration, extract};
use crate::mapper::ColorRole;

/// Where a color on an element comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSource {
    /// `color` declaration in the `style` attribute
    InlineStyleColor,
    /// `background-color` declaration in the `style` attribute
    InlineStyleBackground,
    /// `color` attribute on an element other than `<font>`
    LegacyColorAttribute,
    /// `bgcolor` attribute
    LegacyBgcolorAttribute,
    /// `<font color="...">`
    FontColorElement,
}

impl ColorSource {
    /// Role of the color for remapping purposes.
    #[must_use]
    pub fn role(self) -> ColorRole {
        match self {
            ColorSource::InlineStyleBackground | ColorSource::LegacyBgcolorAttribute => {
                ColorRole::Background
            }
            ColorSource::InlineStyleColor
            | ColorSource::LegacyColorAttribute
            | ColorSource::FontColorElement => ColorRole::Foreground,
        }
    }

    /// Whether the color was declared in the `style` attribute.
    #[must_use]
    pub fn is_inline_style(self) -> bool {
        matches!(
            self,
            ColorSource::InlineStyleColor | ColorSource::InlineStyleBackground
        )
    }
}

/// A color found on a scanned element.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedColor {
    /// Origin of the color
    pub source: ColorSource,
    /// The declaration it was read from
    pub declaration: ColorDeclaration,
}

/// An element carrying at least one recognizable color.
#[derive(Debug, Clone)]
pub struct ScannedNode<'a> {
    element: ElementRef<'a>,
    colors: Vec<ScannedColor>,
    anchor: CssAnchor,
}

impl<'a> ScannedNode<'a> {
    fn new(element: ElementRef<'a>, colors: Vec<ScannedColor>) -> Self {
        let anchor = build_anchor(element, &colors);
        Self {
            element,
            colors,
            anchor,
        }
    }

    /// The element in the document tree.
    #[must_use]
    pub fn element(&self) -> ElementRef<'a> {
        self.element
    }

    /// Colors found on the element, background first.
    #[must_use]
    pub fn colors(&self) -> &[ScannedColor] {
        &self.colors
    }

    /// Selector re-targeting this element.
    #[must_use]
    pub fn anchor(&self) -> &CssAnchor {
        &self.anchor
    }
}

/// Collect every element of `body` (itself included) that sets a color.
///
/// Elements come out in document order, parents before their children.
/// Elements without any recognizable color are left out.
#[must_use]
pub fn scan(body: ElementRef<'_>) -> Vec<ScannedNode<'_>> {
    let nodes: Vec<ScannedNode<'_>> = body
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|element| {
            let colors = colors_of(element);
            (!colors.is_empty()).then(|| ScannedNode::new(element, colors))
        })
        .collect();
    debug!("scanned {} color nodes", nodes.len());
    nodes
}

/// Colors set on one element, background before foreground.
///
/// Inline style declarations take precedence over presentational attributes.
fn colors_of(element: ElementRef<'_>) -> Vec<ScannedColor> {
    let value = element.value();
    let inline = value.attr("style").map(extract).unwrap_or_default();

    let inline_color = |role: ColorRole, source: ColorSource| {
        inline
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, declaration)| ScannedColor {
                source,
                declaration: declaration.clone(),
            })
    };
    let attribute_color = |name: &str, source: ColorSource| {
        let raw = value.attr(name)?;
        ColorDeclaration::new(name, raw.trim(), raw.trim())
            .map(|declaration| ScannedColor { source, declaration })
    };

    let background = inline_color(ColorRole::Background, ColorSource::InlineStyleBackground)
        .or_else(|| attribute_color("bgcolor", ColorSource::LegacyBgcolorAttribute));

    let legacy_color_source = if value.name() == "font" {
        ColorSource::FontColorElement
    } else {
        ColorSource::LegacyColorAttribute
    };
    let foreground = inline_color(ColorRole::Foreground, ColorSource::InlineStyleColor)
        .or_else(|| attribute_color("color", legacy_color_source));

    background.into_iter().chain(foreground).collect()
}
