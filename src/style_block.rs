//! Rewriting of `<style>` blocks into dark-mode overrides.
//!
//! Only the color declarations of each rule survive; everything else is
//! dropped since the output is layered over the original styles.
//!
//! Style sheets are tokenized with `cssparser`, so comments, strings and
//! escapes never confuse rule boundaries. Parsing a block stops at the first
//! `}` closing nothing, and a rule left open at the end of the block is
//! dropped; rules read before either point are kept.

use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, ParseError, ParseErrorKind, Parser, ParserInput,
    ParserState, QualifiedRuleParser, SourcePosition, Token,
};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html};

use crate::declaration::{Declaration, extract_from, parse_declarations};
use crate::mapper::map;
use crate::stylesheet::format_rule;

/// Commas of a selector list with the whitespace around them.
static SELECTOR_COMMA: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s*,\s*").ok());

/// A rule of a style sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rule<'i> {
    /// A style rule: selector list and declarations
    Style {
        selectors: String,
        declarations: Vec<Declaration<'i>>,
    },
    /// `@media` or `@supports`, with the rules it holds
    Conditional { prelude: String, rules: Vec<Rule<'i>> },
}

/// Structural errors that end the parsing of a style block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Malformed {
    /// A `}` with no open block
    UnbalancedBrace,
}

/// Text of every `<style>` element of the document, in document order.
#[must_use]
pub fn style_blocks(document: &Html) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "style")
        .map(|element| element.text().collect())
        .collect()
}

/// Parse style sheet text into its rules.
///
/// Statement at-rules such as `@import ...;` and at-rules other than `@media`
/// and `@supports` are skipped.
pub(crate) fn parse_style_sheet(text: &str) -> Vec<Rule<'_>> {
    let closed = {
        let mut input = ParserInput::new(text);
        blocks_closed(&mut Parser::new(&mut input))
    };
    let mut input = ParserInput::new(text);
    parse_rule_list(&mut Parser::new(&mut input), closed)
}

/// Parse a list of rules.
///
/// When `closed` is false the input ends inside a block, which can only be
/// the last rule read; that rule is dropped.
fn parse_rule_list<'i>(input: &mut Parser<'i, '_>, closed: bool) -> Vec<Rule<'i>> {
    let mut rules = Vec::new();
    let mut rule_parser = RuleListParser;
    let mut items = cssparser::StyleSheetParser::new(input, &mut rule_parser);

    while let Some(item) = items.next() {
        if !closed && items.input.is_exhausted() {
            debug!("unclosed rule at end of style block, dropping it");
            break;
        }
        match item {
            Ok(rule) => rules.push(rule),
            Err((error, source)) => {
                if matches!(error.kind, ParseErrorKind::Custom(Malformed::UnbalancedBrace)) {
                    debug!("unbalanced '}}' before {source:?}, truncating style block");
                    break;
                }
                trace!("skipping {source:?}: {:?}", error.kind);
            }
        }
    }
    rules
}

/// Whether every block opened in `input` is closed before the input ends.
fn blocks_closed(input: &mut Parser<'_, '_>) -> bool {
    loop {
        match input.next_including_whitespace_and_comments() {
            Err(_) => return true,
            Ok(
                Token::CurlyBracketBlock
                | Token::ParenthesisBlock
                | Token::SquareBracketBlock
                | Token::Function(_),
            ) => {}
            Ok(_) => continue,
        }
        let nested: Result<(bool, SourcePosition), ParseError<'_, ()>> = input
            .parse_nested_block(|nested| Ok((blocks_closed(nested), nested.position())));
        // A closed block ends one byte past its content, on the closing token.
        match nested {
            Ok((true, content_end)) if input.position() > content_end => {}
            _ => return false,
        }
    }
}

/// Source text of a rule prelude with comments removed.
fn prelude_text<'i>(input: &mut Parser<'i, '_>) -> Result<String, ParseError<'i, Malformed>> {
    let mut text = String::new();
    let mut chunk_start = input.position();
    loop {
        let before = input.position();
        match input.next_including_whitespace_and_comments() {
            Err(_) => break,
            Ok(Token::CloseCurlyBracket) => {
                return Err(input.new_custom_error(Malformed::UnbalancedBrace));
            }
            Ok(Token::Comment(_)) => {
                text.push_str(input.slice(chunk_start..before));
                chunk_start = input.position();
            }
            Ok(_) => {}
        }
    }
    text.push_str(input.slice_from(chunk_start));
    Ok(text)
}

struct RuleListParser;

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = String;
    type QualifiedRule = Rule<'i>;
    type Error = Malformed;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let selectors = normalize_selector(&prelude_text(input)?);
        if selectors.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid));
        }
        Ok(selectors)
    }

    fn parse_block<'t>(
        &mut self,
        selectors: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Ok(Rule::Style {
            selectors,
            declarations: parse_declarations(input),
        })
    }
}

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = String;
    type AtRule = Rule<'i>;
    type Error = Malformed;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let condition = prelude_text(input)?;
        if !name.eq_ignore_ascii_case("media") && !name.eq_ignore_ascii_case("supports") {
            return Err(input.new_error(BasicParseErrorKind::AtRuleInvalid(name)));
        }
        Ok(format!("@{name} {}", condition.trim()))
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Ok(Rule::Conditional {
            prelude,
            rules: parse_rule_list(input, true),
        })
    }
}

/// Rewrite the text of one `<style>` block.
///
/// Every rule setting `color` or `background-color` is re-emitted with its
/// selector and only the remapped color declarations. `@media` and
/// `@supports` blocks are rewritten recursively; other at-rules are dropped.
/// Returns an empty string when nothing needs overriding.
///
/// # Examples
///
/// ```
/// # use darkmail::style_block::rewrite;
/// let css = rewrite("/* x */ p, h1 { margin: 0; color: #000 }");
/// assert_eq!(css, "p, h1 { color: hsla(0, 0%, 100%, 1.0) !important }");
/// ```
#[must_use]
pub fn rewrite(style_text: &str) -> String {
    rewrite_rules(&parse_style_sheet(style_text)).join(" ")
}

fn rewrite_rules(rules: &[Rule<'_>]) -> Vec<String> {
    rules.iter().filter_map(rewrite_rule).collect()
}

fn rewrite_rule(rule: &Rule<'_>) -> Option<String> {
    match rule {
        Rule::Style {
            selectors,
            declarations,
        } => {
            let declarations: Vec<String> = extract_from(declarations)
                .into_iter()
                .map(|(role, d)| format!("{}: {}", role.property(), map(d.color, role)))
                .collect();
            if declarations.is_empty() {
                trace!("no color declarations for {selectors:?}");
                return None;
            }
            Some(format_rule(selectors, &declarations))
        }
        Rule::Conditional { prelude, rules } => {
            let inner = rewrite_rules(rules);
            if inner.is_empty() {
                return None;
            }
            Some(format!("{prelude} {{ {} }}", inner.join(" ")))
        }
    }
}

/// Trim a selector list and fold line breaks around its commas.
///
/// Whitespace inside each selector is kept as written.
fn normalize_selector(prelude: &str) -> String {
    let prelude = prelude.trim();
    match SELECTOR_COMMA.as_ref() {
        Some(re) => re
            .replace_all(prelude, |caps: &Captures| {
                if caps[0].contains('\n') {
                    ", ".to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned(),
        None => prelude.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn selectors(text: &str) -> Vec<String> {
        parse_style_sheet(text)
            .into_iter()
            .map(|rule| match rule {
                Rule::Style { selectors, .. } => selectors,
                Rule::Conditional { prelude, .. } => prelude,
            })
            .collect()
    }

    #[test]
    fn test_parse_style_sheet() {
        let rules = parse_style_sheet("@import url(a.css); a { color: red } b{}");
        assert_eq!(rules.len(), 2);
        let Rule::Style {
            selectors,
            declarations,
        } = &rules[0]
        else {
            panic!("expected a style rule, got {:?}", rules[0]);
        };
        assert_eq!(selectors, "a");
        assert_eq!(declarations[0].text, "color: red");
        assert_eq!(
            rules[1],
            Rule::Style {
                selectors: "b".to_string(),
                declarations: Vec::new()
            }
        );
    }

    #[test]
    fn test_parse_drops_comments() {
        assert_eq!(
            selectors("/* a { color: red } */ h1 /* x */ > a { color: red } /* open"),
            vec!["h1  > a".to_string()]
        );
    }

    #[test]
    fn test_parse_truncates_on_unbalanced_braces() {
        assert_eq!(
            selectors("a { color: red } } b { color: blue }"),
            vec!["a".to_string()]
        );
        assert_eq!(
            selectors("a { color: red } b { color: blue"),
            vec!["a".to_string()]
        );
        assert_eq!(
            selectors("a { color: red } @media print { b { color: blue }"),
            vec!["a".to_string()]
        );
        assert_eq!(
            selectors("a { color: red } b { background: url(x.png"),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn test_blocks_closed() {
        let closed = |text: &str| {
            let mut input = ParserInput::new(text);
            blocks_closed(&mut Parser::new(&mut input))
        };
        assert!(closed("a { b { } } c { d: rgb(1, 2, 3) }"));
        assert!(closed(r#"a { content: "{" }"#));
        assert!(closed(""));
        assert!(!closed("a { b { }"));
        assert!(!closed("a { d: rgb(1, 2"));
    }

    #[test]
    fn test_rewrite_keeps_only_colors() {
        let css = rewrite(
            ".header { font-size: 12px; background-color: #ffffff; color: rgb(51, 102, 153) }",
        );
        assert_eq!(
            css,
            ".header { background-color: #1C1B24 !important; color: hsla(210, 50%, 90%, 1.0) !important }"
        );
    }

    #[test]
    fn test_rewrite_omits_rules_without_colors() {
        assert_eq!(rewrite("p { margin: 0 } :root { color-scheme: light }"), "");
        assert_eq!(rewrite("p { color: var(--x) }"), "");
        assert_eq!(rewrite(""), "");
    }

    #[test]
    fn test_rewrite_selector_lists() {
        let css = rewrite("h1,\n  h2 ,h3 > a:hover\n{ color: red }");
        assert_eq!(css, "h1, h2 ,h3 > a:hover { color: hsla(0, 100%, 90%, 1.0) !important }");
    }

    #[test]
    fn test_rewrite_braces_inside_strings() {
        let css = rewrite(r#".q::before { content: "}"; color: red } .y { color: blue }"#);
        assert_eq!(
            css,
            ".q::before { color: hsla(0, 100%, 90%, 1.0) !important } .y { color: hsla(240, 100%, 90%, 1.0) !important }"
        );

        let css = rewrite(r#"a[title="{"] { color: black } .z { color: white }"#);
        assert_eq!(
            css,
            r#"a[title="{"] { color: hsla(0, 0%, 100%, 1.0) !important } .z { color: hsla(0, 0%, 100%, 1.0) !important }"#
        );
    }

    #[test]
    fn test_rewrite_html_comment_markers() {
        let css = rewrite("<!-- a { color: black } -->");
        assert_eq!(css, "a { color: hsla(0, 0%, 100%, 1.0) !important }");
    }

    #[test]
    fn test_rewrite_nested_media() {
        let css = rewrite(
            "@media screen and (max-width: 600px) { .a { color: black } .b { margin: 0 } } \
             @font-face { font-family: x; color: red } \
             @keyframes k { from { color: red } }",
        );
        assert_eq!(
            css,
            "@media screen and (max-width: 600px) { .a { color: hsla(0, 0%, 100%, 1.0) !important } }"
        );
    }

    #[test]
    fn test_rewrite_partial_block() {
        let css = rewrite("a { color: white } b { color: white");
        assert_eq!(css, "a { color: hsla(0, 0%, 100%, 1.0) !important }");
    }

    #[test]
    fn test_style_blocks_in_document_order() {
        let document = Html::parse_document(
            "<html><head><style>a { color: red }</style></head><body><style>b { color: blue }</style></body></html>",
        );
        assert_eq!(
            style_blocks(&document),
            vec!["a { color: red }".to_string(), "b { color: blue }".to_string()]
        );
    }
}
