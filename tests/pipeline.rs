//! End-to-end tests of the dark-mode stylesheet pipeline.

use std::collections::HashSet;

use anyhow::Result;
use pretty_assertions::assert_eq;

use darkmail::{DarkModeSetting, DarkStyleSupport, RewriteError, classify, dark_mode_stylesheet};

const PREFIX: &str = "@media (prefers-color-scheme: dark) { ";
const SUFFIX: &str = " }";

fn stylesheet(html: &str) -> Result<String> {
    dark_mode_stylesheet(html, "sender@example.com", DarkModeSetting::FollowSystem)?
        .ok_or_else(|| anyhow::anyhow!("expected a stylesheet"))
}

/// The rules inside the media query, as a set.
fn rules(css: &str) -> HashSet<String> {
    let inner = css
        .strip_prefix(PREFIX)
        .and_then(|s| s.strip_suffix(SUFFIX))
        .unwrap_or_default();
    inner
        .split(" } ")
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!("{} }}", r.trim_end_matches(" }")))
        .collect()
}

#[test]
fn test_single_white_background() -> Result<()> {
    let css = stylesheet(
        r#"<html><body><div class="a" style="background-color: hsl(0, 0%, 100%);"></div></body></html>"#,
    )?;
    assert_eq!(
        css,
        r#"@media (prefers-color-scheme: dark) { div.a[style*="background-color: hsl(0, 0%, 100%)"] { background-color: #1C1B24 !important } }"#
    );
    Ok(())
}

#[test]
fn test_native_support_skips_override() -> Result<()> {
    let html = r#"<html><head><meta name="color-scheme" content="light dark"></head><body><div style="color: #000">x</div></body></html>"#;
    assert_eq!(
        dark_mode_stylesheet(html, "a@b.c", DarkModeSetting::FollowSystem)?,
        None
    );
    assert_eq!(
        classify(html, "a@b.c", DarkModeSetting::FollowSystem)?,
        DarkStyleSupport::NativeSupport
    );
    Ok(())
}

#[test]
fn test_force_off() -> Result<()> {
    let html = r#"<body><div style="color: #000">x</div></body>"#;
    assert_eq!(dark_mode_stylesheet(html, "", DarkModeSetting::ForceOff)?, None);
    assert_eq!(
        classify(html, "", DarkModeSetting::ForceOff)?,
        DarkStyleSupport::NotSupport
    );
    Ok(())
}

#[test]
fn test_newsletter() -> Result<()> {
    let html = r##"<!DOCTYPE html>
<html>
<head>
  <style>
    /* brand */
    .title,
    .subtitle { color: #336699; font-weight: bold }
    p { margin: 0 }
  </style>
</head>
<body bgcolor="#ffffff">
  <table id="main" style="background-color: #f0f0f0">
    <tr><td><font color="black">Hello</font></td></tr>
  </table>
  <p style="color: rgba(255, 0, 0, 0.5); padding: 4px">Sale</p>
  <div id="foo bar" style="background-color: navy">x</div>
  <span style="color: inherit">skip</span>
</body>
</html>"##;
    let css = stylesheet(html)?;
    assert!(css.starts_with(PREFIX));

    let expected: HashSet<String> = [
        "html > body { background-color: #1C1B24 !important }",
        "#main { background-color: hsla(230, 12%, 10%, 1.0) !important }",
        "html > body > table:nth-child(1) > tbody:nth-child(1) > tr:nth-child(1) > td:nth-child(1) > font:nth-child(1) { color: hsla(0, 0%, 100%, 1.0) !important }",
        r#"p[style*="color: rgba(255, 0, 0, 0.5)"] { color: hsla(0, 100%, 90%, 0.5) !important }"#,
        "div[id='foo bar'] { background-color: hsla(240, 100%, 25%, 1.0) !important }",
        ".title, .subtitle { color: hsla(210, 50%, 90%, 1.0) !important }",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    assert_eq!(rules(&css), expected);

    // The style block output comes after the anchored rules.
    assert!(css.ends_with(".title, .subtitle { color: hsla(210, 50%, 90%, 1.0) !important } }"));
    Ok(())
}

#[test]
fn test_multiple_style_blocks_in_order() -> Result<()> {
    let css = stylesheet(
        "<html><head><style>a { color: white }</style><style>b { background-color: #000 }</style></head><body></body></html>",
    )?;
    assert_eq!(
        css,
        "@media (prefers-color-scheme: dark) { a { color: hsla(0, 0%, 100%, 1.0) !important } b { background-color: hsla(230, 12%, 10%, 1.0) !important } }"
    );
    Ok(())
}

#[test]
fn test_repeated_runs_are_set_equal() -> Result<()> {
    let html = r#"<body><p id="a" style="color: red"></p><p id="b" style="color: lime"></p><p id="c" style="color: blue"></p><p id="d" style="color: gold"></p></body>"#;
    let first = rules(&stylesheet(html)?);
    let second = rules(&stylesheet(html)?);
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_no_colors() -> Result<()> {
    assert_eq!(
        stylesheet("<p>just text</p>")?,
        "@media (prefers-color-scheme: dark) {  }"
    );
    Ok(())
}

#[test]
fn test_broken_markup_is_tolerated() -> Result<()> {
    let css = stylesheet(r#"<div style="color: #zzz; background-color: rgb(0, 0"><p style="color: teal">x"#)?;
    assert_eq!(
        css,
        r#"@media (prefers-color-scheme: dark) { p[style*="color: teal"] { color: hsla(180, 100%, 90%, 1.0) !important } }"#
    );
    Ok(())
}

#[test]
fn test_empty_input_is_an_error() {
    assert_eq!(
        dark_mode_stylesheet("", "", DarkModeSetting::FollowSystem),
        Err(RewriteError::EmptyDocument)
    );
}
