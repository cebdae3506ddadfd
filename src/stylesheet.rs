//! Assembly of the final override stylesheet.

use std::collections::HashMap;

use log::debug;

use crate::anchor::CssAnchor;
use crate::mapper::map;
use crate::scanner::ScannedNode;

/// Media query wrapping every override.
const DARK_MEDIA_QUERY: &str = "@media (prefers-color-scheme: dark)";

/// Remapped declarations (`property: value`) per anchor.
pub type AnchorMap = HashMap<CssAnchor, Vec<String>>;

/// Format one CSS rule, marking every declaration `!important`.
pub(crate) fn format_rule(selector: &str, declarations: &[String]) -> String {
    let body = declarations
        .iter()
        .map(|d| format!("{d} !important"))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{selector} {{ {body} }}")
}

/// Group the remapped colors of scanned nodes by anchor.
///
/// Nodes sharing an anchor share one entry; identical declarations are kept
/// once.
#[must_use]
pub fn anchor_map(nodes: &[ScannedNode<'_>]) -> AnchorMap {
    let mut anchors = AnchorMap::new();
    for node in nodes {
        if node.anchor().is_structural() {
            debug!("structural anchor {}", node.anchor());
        }
        let declarations = anchors.entry(node.anchor().clone()).or_default();
        for color in node.colors() {
            let role = color.source.role();
            let declaration = format!("{}: {}", role.property(), map(color.declaration.color, role));
            if !declarations.contains(&declaration) {
                declarations.push(declaration);
            }
        }
    }
    anchors
}

/// Build the override stylesheet.
///
/// Emits one rule per anchor with declarations, followed by the rewritten
/// `<style>` CSS, all wrapped once in `@media (prefers-color-scheme: dark)`.
/// With nothing to emit the result is the bare wrapper,
/// `"@media (prefers-color-scheme: dark) {  }"`.
///
/// The order of the per-anchor rules follows the iteration order of the map
/// and is not stable across calls. Compare outputs as sets of rules.
#[must_use]
pub fn assemble(anchor_map: &AnchorMap, style_block_css: &str) -> String {
    let mut parts: Vec<String> = anchor_map
        .iter()
        .filter(|(_, declarations)| !declarations.is_empty())
        .map(|(anchor, declarations)| format_rule(anchor.selector(), declarations))
        .collect();
    debug!("{} anchored rules", parts.len());

    let style_block_css = style_block_css.trim();
    if !style_block_css.is_empty() {
        parts.push(style_block_css.to_string());
    }
    format!("{DARK_MEDIA_QUERY} {{ {} }}", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};
    use std::collections::HashSet;

    fn nodes_map(html: &str) -> AnchorMap {
        let document = Html::parse_document(html);
        let selector = Selector::parse("body").expect("valid selector");
        let body = document.select(&selector).next().expect("body");
        anchor_map(&scan(body))
    }

    /// Split the inside of the media query into its rules.
    fn rules(stylesheet: &str) -> HashSet<String> {
        let inner = stylesheet
            .strip_prefix("@media (prefers-color-scheme: dark) { ")
            .and_then(|s| s.strip_suffix(" }"))
            .expect("wrapped stylesheet");
        inner
            .split(" } ")
            .map(|r| r.trim_end_matches(" }").to_string() + " }")
            .collect()
    }

    #[test]
    fn test_assemble_empty() {
        assert_eq!(
            assemble(&AnchorMap::new(), ""),
            "@media (prefers-color-scheme: dark) {  }"
        );
        assert_eq!(
            assemble(&AnchorMap::new(), "   "),
            "@media (prefers-color-scheme: dark) {  }"
        );
    }

    #[test]
    fn test_assemble_single_anchor() {
        let map = nodes_map(r#"<div class="a" style="background-color: hsl(0, 0%, 100%);"></div>"#);
        assert_eq!(
            assemble(&map, ""),
            r#"@media (prefers-color-scheme: dark) { div.a[style*="background-color: hsl(0, 0%, 100%)"] { background-color: #1C1B24 !important } }"#
        );
    }

    #[test]
    fn test_assemble_appends_style_css() {
        let map = nodes_map(r#"<p id="x" style="color: #000; background-color: #eee"></p>"#);
        assert_eq!(
            assemble(&map, "a { color: hsla(0, 0%, 100%, 1.0) !important }"),
            "@media (prefers-color-scheme: dark) { #x { background-color: hsla(230, 12%, 10%, 1.0) !important; color: hsla(0, 0%, 100%, 1.0) !important } a { color: hsla(0, 0%, 100%, 1.0) !important } }"
        );
    }

    #[test]
    fn test_anchor_map_merges_shared_anchors() {
        let map = nodes_map(
            r#"<span style="color: red">a</span><span style="color: red">b</span><b id="k" style="color: blue"></b>"#,
        );
        assert_eq!(map.len(), 2);
        let shared = map
            .iter()
            .find(|(anchor, _)| anchor.selector() == r#"span[style*="color: red"]"#)
            .map(|(_, d)| d.clone())
            .expect("shared anchor");
        assert_eq!(shared, vec!["color: hsla(0, 100%, 90%, 1.0)".to_string()]);
    }

    #[test]
    fn test_assemble_is_set_stable() {
        let map = nodes_map(
            r#"<div id="a" style="color: red"></div><div id="b" style="color: green"></div><div id="c" bgcolor="navy"></div>"#,
        );
        let first = rules(&assemble(&map, ""));
        let second = rules(&assemble(&map, ""));
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first.contains("#c { background-color: hsla(240, 100%, 25%, 1.0) !important }"));
    }

    #[test]
    fn test_format_rule() {
        assert_eq!(
            format_rule("p", &["color: red".to_string(), "background-color: blue".to_string()]),
            "p { color: red !important; background-color: blue !important }"
        );
    }
}
