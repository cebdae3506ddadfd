//! Color value parsing.
//!
//! This module provides:
//! - The [`Rgba`] and [`Hsla`] color representations
//! - Parsing of CSS color tokens (hex, `rgb()`/`rgba()`, `hsl()`/`hsla()`, named colors)
//! - Formatting of HSLA values the way the override stylesheet expects them
//!
//! Parsing never fails loudly: anything that is not a recognizable color
//! yields `None` and callers skip the declaration.

use std::fmt;
use std::str::FromStr;

use csscolorparser::Color as CssColor;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::space::{hsla_to_rgba, rgba_to_hsla};

/// Marker that may trail a CSS value.
const IMPORTANT: &str = "!important";

/// `name(args)` functional notation.
static FUNCTION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^([a-z]+)\s*\((.*)\)$").ok());

/// RGBA color with every channel normalized to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red channel
    pub r: f64,
    /// Green channel
    pub g: f64,
    /// Blue channel
    pub b: f64,
    /// Alpha channel, `1.0` is fully opaque
    pub a: f64,
}

impl Rgba {
    /// Create a new color from normalized channels.
    #[must_use]
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// HSLA color, the representation dark-mode remapping works on.
///
/// Values are kept unrounded; [`fmt::Display`] rounds hue, saturation and
/// lightness to integers and prints alpha with at least one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    /// Hue in degrees, `[0, 360)`
    pub h: f64,
    /// Saturation percentage, `[0, 100]`
    pub s: f64,
    /// Lightness percentage, `[0, 100]`
    pub l: f64,
    /// Alpha, `[0.0, 1.0]`
    pub a: f64,
}

impl Hsla {
    /// Create a new HSLA color.
    #[must_use]
    pub fn new(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self { h, s, l, a }
    }

    /// Hue as printed, in `[0, 360)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn hue(&self) -> i64 {
        (self.h.round() as i64).rem_euclid(360)
    }

    /// Saturation as printed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn saturation(&self) -> i64 {
        self.s.round() as i64
    }

    /// Lightness as printed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn lightness(&self) -> i64 {
        self.l.round() as i64
    }

    /// Whether the color has no visible saturation.
    #[must_use]
    pub fn is_achromatic(&self) -> bool {
        self.saturation() == 0
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue(),
            self.saturation(),
            self.lightness(),
            format_alpha(self.a)
        )
    }
}

/// Format an alpha value with at least one decimal place.
///
/// `1.0` prints as `"1.0"` rather than `"1"`, fractional values keep their
/// shortest exact representation (`0.7`, `0.25`).
#[must_use]
pub fn format_alpha(a: f64) -> String {
    if a.fract() == 0.0 {
        format!("{a:.1}")
    } else {
        format!("{a}")
    }
}

/// Remove a trailing `!important` marker and surrounding whitespace.
///
/// The marker is matched case-insensitively.
///
/// # Examples
///
/// ```
/// # use darkmail::color::strip_important;
/// assert_eq!(strip_important(" red !IMPORTANT "), "red");
/// assert_eq!(strip_important("#fff"), "#fff");
/// ```
#[must_use]
pub fn strip_important(value: &str) -> &str {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if lower.ends_with(IMPORTANT) {
        value[..value.len() - IMPORTANT.len()].trim_end()
    } else {
        value
    }
}

/// A parsed token, kept in the color space it was written in.
enum Parsed {
    Rgb(Rgba),
    Hsl(Hsla),
}

/// Parse a CSS color token into RGBA.
///
/// Accepted syntaxes, case-insensitively and with an optional trailing
/// `!important`:
/// - `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` (the `#` is optional)
/// - `rgb(...)` / `rgba(...)` with integer or percentage channels
/// - `hsl(...)` / `hsla(...)`
/// - CSS named colors and `transparent`
///
/// # Returns
///
/// - `Some(Rgba)` for a recognized color
/// - `None` for anything else
///
/// # Examples
///
/// ```
/// # use darkmail::color::parse;
/// let c = parse("#369").unwrap();
/// assert!((c.r - 0.2).abs() < 1e-9);
/// assert!(parse("not-a-color").is_none());
/// ```
#[must_use]
pub fn parse(token: &str) -> Option<Rgba> {
    match parse_token(token)? {
        Parsed::Rgb(rgba) => Some(rgba),
        Parsed::Hsl(hsla) => Some(hsla_to_rgba(hsla)),
    }
}

/// Parse a CSS color token into HSLA.
///
/// Accepts the same syntaxes as [`parse`]. Tokens written as `hsl()` keep
/// their values exactly; everything else goes through [`rgba_to_hsla`].
#[must_use]
pub fn parse_hsla(token: &str) -> Option<Hsla> {
    match parse_token(token)? {
        Parsed::Rgb(rgba) => Some(rgba_to_hsla(rgba)),
        Parsed::Hsl(hsla) => Some(hsla),
    }
}

fn parse_token(token: &str) -> Option<Parsed> {
    let value = strip_important(token).to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }

    if let Some((function, args)) = split_function(&value) {
        return match function.as_str() {
            "rgb" | "rgba" => parse_rgb_function(&args).map(Parsed::Rgb),
            "hsl" | "hsla" => parse_hsl_function(&args).map(Parsed::Hsl),
            _ => None,
        };
    }

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex).map(Parsed::Rgb);
    }

    if value == "transparent" {
        return Some(Parsed::Rgb(Rgba::new(0.0, 0.0, 0.0, 0.0)));
    }

    named(&value).or_else(|| parse_hex(&value)).map(Parsed::Rgb)
}

/// Look up a CSS color keyword such as `tan` or `rebeccapurple`.
fn named(value: &str) -> Option<Rgba> {
    if !value.bytes().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let color = CssColor::from_str(value).ok()?;
    Some(Rgba::new(color.r, color.g, color.b, color.a))
}

/// Split `name(args)` into its function name and argument list.
fn split_function(value: &str) -> Option<(String, Vec<String>)> {
    let caps = FUNCTION.as_ref()?.captures(value)?;
    let args = split_arguments(&caps[2])?;
    Some((caps[1].to_string(), args))
}

/// Split functional notation arguments.
///
/// Supports both the legacy comma form `r, g, b, a` and the space form
/// `r g b / a`.
fn split_arguments(args: &str) -> Option<Vec<String>> {
    if args.contains(',') {
        let parts: Vec<String> = args.split(',').map(|p| p.trim().to_string()).collect();
        if parts.iter().any(String::is_empty) {
            return None;
        }
        return Some(parts);
    }

    let (main, alpha) = match args.split_once('/') {
        Some((main, alpha)) => (main, Some(alpha.trim())),
        None => (args, None),
    };
    let mut parts: Vec<String> = main.split_whitespace().map(str::to_string).collect();
    if let Some(alpha) = alpha {
        if alpha.is_empty() {
            return None;
        }
        parts.push(alpha.to_string());
    }
    Some(parts)
}

fn parse_rgb_function(args: &[String]) -> Option<Rgba> {
    let (channels, alpha) = split_alpha(args)?;
    let r = parse_channel(&channels[0])?;
    let g = parse_channel(&channels[1])?;
    let b = parse_channel(&channels[2])?;
    let a = alpha.map_or(Some(1.0), parse_alpha)?;
    Some(Rgba::new(r, g, b, a))
}

fn parse_hsl_function(args: &[String]) -> Option<Hsla> {
    let (channels, alpha) = split_alpha(args)?;
    let h = parse_hue(&channels[0])?;
    let s = parse_percentage(&channels[1])?;
    let l = parse_percentage(&channels[2])?;
    let a = alpha.map_or(Some(1.0), parse_alpha)?;
    Some(Hsla::new(h, s, l, a))
}

/// Separate three color channels from the optional alpha argument.
fn split_alpha(args: &[String]) -> Option<(&[String], Option<&str>)> {
    match args.len() {
        3 => Some((args, None)),
        4 => Some((&args[..3], Some(args[3].as_str()))),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let n = s.trim().parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

/// Parse an `rgb()` channel: `0-255` or `0-100%`, clamped to `[0, 1]`.
fn parse_channel(s: &str) -> Option<f64> {
    let v = match s.strip_suffix('%') {
        Some(pct) => parse_number(pct)? / 100.0,
        None => parse_number(s)? / 255.0,
    };
    Some(v.clamp(0.0, 1.0))
}

/// Parse an alpha value.
///
/// Percentages are divided by 100. Plain numbers inside `[0, 1]` are taken as
/// is; bare integers above 1 (up to 255) are read as a fraction of 255.
/// Anything else is clamped to `[0, 1]`.
fn parse_alpha(s: &str) -> Option<f64> {
    if let Some(pct) = s.strip_suffix('%') {
        return Some((parse_number(pct)? / 100.0).clamp(0.0, 1.0));
    }
    let v = parse_number(s)?;
    if (0.0..=1.0).contains(&v) {
        return Some(v);
    }
    let bare_integer = s.bytes().all(|c| c.is_ascii_digit());
    if bare_integer && v <= 255.0 {
        return Some(v / 255.0);
    }
    Some(v.clamp(0.0, 1.0))
}

/// Parse a hue, optionally suffixed with `deg`, wrapped into `[0, 360)`.
fn parse_hue(s: &str) -> Option<f64> {
    let s = s.strip_suffix("deg").unwrap_or(s);
    Some(parse_number(s)?.rem_euclid(360.0))
}

fn parse_percentage(s: &str) -> Option<f64> {
    let s = s.strip_suffix('%').unwrap_or(s);
    Some(parse_number(s)?.clamp(0.0, 100.0))
}

/// Parse hex digits (without `#`) of length 3, 4, 6 or 8.
///
/// Short forms expand each nibble by duplication, so `369` is `336699`.
fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let byte = |s: &str| u8::from_str_radix(s, 16).ok().map(f64::from);
    let nibble = |i: usize| byte(&hex[i..=i]).map(|n| n * 17.0);

    let (r, g, b, a) = match hex.len() {
        3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255.0),
        4 => (nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?),
        6 => (byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255.0),
        8 => (
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        ),
        _ => return None,
    };

    Some(Rgba::new(r / 255.0, g / 255.0, b / 255.0, a / 255.0))
}
