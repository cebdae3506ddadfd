//! Dark-mode stylesheet generation for HTML email.
//!
//! Given an untrusted message body, the engine builds a CSS override
//! stylesheet that keeps the message legible on a dark background without
//! touching the original markup.

pub mod anchor;
pub mod color;
pub mod declaration;
pub mod detector;
pub mod error;
pub mod logs;
pub mod mapper;
pub mod scanner;
pub mod space;
pub mod style_block;
pub mod stylesheet;

use log::debug;
use scraper::{ElementRef, Html};

pub use detector::{DarkModeSetting, DarkStyleSupport};
pub use error::RewriteError;

use detector::detect;
use scanner::scan;
use style_block::{rewrite, style_blocks};
use stylesheet::{anchor_map, assemble};

/// Parse a message body, refusing input with nothing to parse.
fn parse_document(html: &str) -> Result<Html, RewriteError> {
    if html.trim().is_empty() {
        return Err(RewriteError::EmptyDocument);
    }
    Ok(Html::parse_document(html))
}

fn find_body(document: &Html) -> Option<ElementRef<'_>> {
    document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "body")
}

/// Decide how dark mode should be handled for a message body.
///
/// # Errors
///
/// Returns [`RewriteError::EmptyDocument`] if `html` is blank.
pub fn classify(
    html: &str,
    sender: &str,
    setting: DarkModeSetting,
) -> Result<DarkStyleSupport, RewriteError> {
    let document = parse_document(html)?;
    Ok(detect(&document, sender, setting))
}

/// Build the dark-mode override stylesheet for a message body.
///
/// This function runs the whole pipeline:
/// 1. Parse the body and classify its dark-mode support
/// 2. Scan the body for color-bearing elements and anchor each of them
/// 3. Remap every color found, inline or in `<style>` blocks
/// 4. Assemble everything into one `@media (prefers-color-scheme: dark)` block
///
/// # Errors
///
/// Returns an error if:
/// - `html` is empty or whitespace only
/// - the parsed document has no `<body>`
///
/// # Returns
///
/// - `Ok(None)` when no override should be injected (native dark-mode
///   support, or dark mode forced off)
/// - `Ok(Some(css))` with the stylesheet otherwise
///
/// # Examples
///
/// ```
/// # use darkmail::{dark_mode_stylesheet, DarkModeSetting};
/// let css = dark_mode_stylesheet(
///     r#"<div class="a" style="background-color: hsl(0, 0%, 100%);"></div>"#,
///     "news@example.com",
///     DarkModeSetting::FollowSystem,
/// )
/// .unwrap();
/// assert_eq!(
///     css.as_deref(),
///     Some(r#"@media (prefers-color-scheme: dark) { div.a[style*="background-color: hsl(0, 0%, 100%)"] { background-color: #1C1B24 !important } }"#),
/// );
/// ```
pub fn dark_mode_stylesheet(
    html: &str,
    sender: &str,
    setting: DarkModeSetting,
) -> Result<Option<String>, RewriteError> {
    if setting == DarkModeSetting::ForceOff {
        debug!("dark mode forced off");
        return Ok(None);
    }

    let document = parse_document(html)?;
    let support = detect(&document, sender, setting);
    if support != DarkStyleSupport::ProtonSupport {
        return Ok(None);
    }

    let body = find_body(&document).ok_or(RewriteError::MissingBody)?;
    let nodes = scan(body);
    let anchors = anchor_map(&nodes);

    let style_css = style_blocks(&document)
        .iter()
        .map(String::as_str)
        .map(rewrite)
        .filter(|css| !css.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(
        "anchors={} style_css_len={}",
        anchors.len(),
        style_css.len()
    );

    Ok(Some(assemble(&anchors, &style_css)))
}
