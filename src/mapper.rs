//! Dark-mode color remapping.
//!
//! Text colors are pushed towards a light tone and fills towards a dark one,
//! keeping the original hue and saturation so the message keeps its palette.

use crate::color::{Hsla, format_alpha};

/// Dark background used for opaque white fills.
pub const DARK_BACKGROUND_HEX: &str = "#1C1B24";

/// [`DARK_BACKGROUND_HEX`] expressed as HSL, used when alpha must be kept.
const DARK_BACKGROUND_HSL: (i64, i64, i64) = (230, 12, 10);

/// Lightness forced onto chromatic text.
const FOREGROUND_LIGHTNESS: f64 = 90.0;

/// Brightest lightness a chromatic fill may keep.
const BACKGROUND_MAX_LIGHTNESS: f64 = 30.0;

/// Which part of an element a color paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    /// Text color (`color`, `<font color>`, legacy `color` attribute)
    Foreground,
    /// Fill color (`background-color`, `bgcolor`)
    Background,
}

impl ColorRole {
    /// CSS property the remapped color is written to.
    #[must_use]
    pub fn property(self) -> &'static str {
        match self {
            ColorRole::Foreground => "color",
            ColorRole::Background => "background-color",
        }
    }
}

/// Remap a color for display on a dark background.
///
/// Rules, in order:
/// 1. Achromatic fill: opaque white becomes [`DARK_BACKGROUND_HEX`], every
///    other gray becomes `hsla(230, 12%, 10%, A)`.
/// 2. Achromatic text becomes white, alpha kept.
/// 3. Chromatic text keeps hue and saturation with lightness forced to 90%.
/// 4. Chromatic fill keeps hue and saturation; lightness is capped at 30%.
///
/// Decisions are taken on the values as they would be printed (rounded).
///
/// # Examples
///
/// ```
/// # use darkmail::color::Hsla;
/// # use darkmail::mapper::{map, ColorRole};
/// let text = map(Hsla::new(20.0, 50.0, 70.0, 1.0), ColorRole::Foreground);
/// assert_eq!(text, "hsla(20, 50%, 90%, 1.0)");
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn map(hsla: Hsla, role: ColorRole) -> String {
    match (hsla.is_achromatic(), role) {
        (true, ColorRole::Background) => {
            if hsla.lightness() == 100 && hsla.a == 1.0 {
                DARK_BACKGROUND_HEX.to_string()
            } else {
                let (h, s, l) = DARK_BACKGROUND_HSL;
                format!("hsla({h}, {s}%, {l}%, {})", format_alpha(hsla.a))
            }
        }
        (true, ColorRole::Foreground) => format!("hsla(0, 0%, 100%, {})", format_alpha(hsla.a)),
        (false, ColorRole::Foreground) => Hsla {
            l: FOREGROUND_LIGHTNESS,
            ..hsla
        }
        .to_string(),
        (false, ColorRole::Background) => {
            if hsla.lightness() <= 30 {
                hsla.to_string()
            } else {
                Hsla {
                    l: BACKGROUND_MAX_LIGHTNESS,
                    ..hsla
                }
                .to_string()
            }
        }
    }
}
