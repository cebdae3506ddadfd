//! Color declarations found in CSS declaration text.

use cssparser::{Delimiter, ParseError, Parser, ParserInput, SourcePosition, Token};
use log::trace;

use crate::color::{Hsla, parse_hsla, strip_important};
use crate::mapper::ColorRole;

/// One `color` or `background-color` declaration with a recognizable value.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDeclaration {
    /// Property name as written (attribute name for legacy markup)
    pub property: String,
    /// Raw value text, including any trailing `!important`
    pub value: String,
    /// The declaration as it appears in the source, without `!important`
    pub text: String,
    /// Parsed value
    pub color: Hsla,
}

impl ColorDeclaration {
    /// Build a declaration from a property/value pair, parsing the value.
    ///
    /// Returns `None` when the value is not a color.
    #[must_use]
    pub fn new(property: &str, value: &str, text: &str) -> Option<Self> {
        let Some(color) = parse_hsla(value) else {
            trace!("dropping {property}: unrecognized color {value:?}");
            return None;
        };
        Some(Self {
            property: property.to_string(),
            value: value.to_string(),
            text: text.to_string(),
            color,
        })
    }
}

/// A declaration of a declaration list, sliced from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration<'i> {
    /// Lowercased property name
    pub property: String,
    /// Value text, `!important` included
    pub value: &'i str,
    /// Whole declaration from the property name to the end of the value
    pub text: &'i str,
}

/// Read every `property: value` declaration left in `input`.
///
/// Strings, comments and nested blocks are tokenized, so a `;` or `}` inside
/// them does not end a declaration. Anything that is not a declaration is
/// skipped up to the next `;`.
pub(crate) fn parse_declarations<'i>(input: &mut Parser<'i, '_>) -> Vec<Declaration<'i>> {
    let mut declarations = Vec::new();
    while !input.is_exhausted() {
        input.skip_whitespace();
        let start = input.position();
        match input.parse_until_after(Delimiter::Semicolon, |input| {
            parse_declaration(input, start)
        }) {
            Ok(declaration) => declarations.push(declaration),
            Err(error) => trace!("skipping declaration: {:?}", error.kind),
        }
    }
    declarations
}

fn parse_declaration<'i>(
    input: &mut Parser<'i, '_>,
    start: SourcePosition,
) -> Result<Declaration<'i>, ParseError<'i, ()>> {
    let property = input.expect_ident()?.to_ascii_lowercase();
    input.expect_colon()?;
    input.skip_whitespace();

    let value_start = input.position();
    let mut end = value_start;
    while let Ok(token) = input.next() {
        let opens_block = matches!(
            token,
            Token::Function(_)
                | Token::ParenthesisBlock
                | Token::SquareBracketBlock
                | Token::CurlyBracketBlock
        );
        if opens_block {
            input.parse_nested_block(|nested| {
                while nested.next().is_ok() {}
                Ok::<_, ParseError<'i, ()>>(())
            })?;
        }
        end = input.position();
    }

    Ok(Declaration {
        property,
        value: input.slice(value_start..end),
        text: input.slice(start..end),
    })
}

/// Map a CSS property name to the role of the color it sets.
fn role_of(property: &str) -> Option<ColorRole> {
    match property {
        "color" => Some(ColorRole::Foreground),
        "background-color" => Some(ColorRole::Background),
        _ => None,
    }
}

/// Extract color declarations from a declaration list such as a `style`
/// attribute or the body of a CSS rule.
///
/// The background declaration, if any, comes first and the text color second,
/// whatever their order in `text`. When a property is set more than once the
/// last recognizable value wins. Declarations whose value is not a color are
/// skipped.
///
/// # Examples
///
/// ```
/// # use darkmail::declaration::extract;
/// # use darkmail::mapper::ColorRole;
/// let found = extract("color: red; margin: 0; background-color: #fff !important");
/// assert_eq!(found[0].0, ColorRole::Background);
/// assert_eq!(found[0].1.text, "background-color: #fff");
/// assert_eq!(found[1].0, ColorRole::Foreground);
/// ```
#[must_use]
pub fn extract(text: &str) -> Vec<(ColorRole, ColorDeclaration)> {
    let mut input = ParserInput::new(text);
    extract_from(&parse_declarations(&mut Parser::new(&mut input)))
}

/// [`extract`] over declarations that are already parsed.
pub(crate) fn extract_from(declarations: &[Declaration<'_>]) -> Vec<(ColorRole, ColorDeclaration)> {
    let mut background = None;
    let mut foreground = None;

    for declaration in declarations {
        let Some(role) = role_of(&declaration.property) else {
            continue;
        };
        let Some(found) = ColorDeclaration::new(
            &declaration.property,
            declaration.value,
            strip_important(declaration.text),
        ) else {
            continue;
        };
        match role {
            ColorRole::Background => background = Some(found),
            ColorRole::Foreground => foreground = Some(found),
        }
    }

    background
        .map(|d| (ColorRole::Background, d))
        .into_iter()
        .chain(foreground.map(|d| (ColorRole::Foreground, d)))
        .collect()
}
