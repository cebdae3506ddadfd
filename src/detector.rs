//! Detection of messages that already handle dark mode themselves.

use log::debug;
use scraper::{ElementRef, Html};

use crate::style_block::{Rule, parse_style_sheet, style_blocks};

/// `<meta name>` values announcing native dark-mode support.
const COLOR_SCHEME_META: [&str; 2] = ["color-scheme", "supported-color-schemes"];

/// The user's dark-mode preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DarkModeSetting {
    /// Follow the system appearance
    #[default]
    FollowSystem,
    /// Never apply dark mode to messages
    ForceOff,
}

/// How dark mode should be handled for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkStyleSupport {
    /// The message declares its own dark-mode styles; leave it alone
    NativeSupport,
    /// The message needs the generated override stylesheet
    ProtonSupport,
    /// Dark mode must not be applied
    NotSupport,
}

/// Classify a parsed message.
///
/// `ForceOff` always yields [`DarkStyleSupport::NotSupport`]. Otherwise a
/// `color-scheme`/`supported-color-schemes` meta tag in `<head>`, or a
/// `color-scheme` declaration on `:root` in any `<style>` block, means the
/// sender opted in ([`DarkStyleSupport::NativeSupport`]). Everything else gets
/// [`DarkStyleSupport::ProtonSupport`].
///
/// `sender` does not influence the result.
#[must_use]
pub fn detect(document: &Html, sender: &str, setting: DarkModeSetting) -> DarkStyleSupport {
    let support = if setting == DarkModeSetting::ForceOff {
        DarkStyleSupport::NotSupport
    } else if has_color_scheme_meta(document) || has_root_color_scheme(document) {
        DarkStyleSupport::NativeSupport
    } else {
        DarkStyleSupport::ProtonSupport
    };
    debug!("sender={sender:?} setting={setting:?} support={support:?}");
    support
}

fn has_color_scheme_meta(document: &Html) -> bool {
    let Some(head) = document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "head")
    else {
        return false;
    };

    head.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "meta")
        .filter_map(|element| element.value().attr("name"))
        .any(|name| {
            COLOR_SCHEME_META
                .iter()
                .any(|meta| name.trim().eq_ignore_ascii_case(meta))
        })
}

fn has_root_color_scheme(document: &Html) -> bool {
    style_blocks(document).iter().any(|block| {
        parse_style_sheet(block).iter().any(|rule| {
            let Rule::Style {
                selectors,
                declarations,
            } = rule
            else {
                return false;
            };
            selectors
                .split(',')
                .any(|selector| selector.trim().eq_ignore_ascii_case(":root"))
                && declarations
                    .iter()
                    .any(|declaration| declaration.property == "color-scheme")
        })
    })
}
