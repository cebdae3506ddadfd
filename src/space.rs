//! RGB to HSL conversion and back.
//!
//! Both directions work on unrounded floating-point values. Rounding only
//! happens when an [`Hsla`] is formatted, so chained conversions keep their
//! precision.

use crate::color::{Hsla, Rgba};

/// Convert normalized RGBA channels into HSLA.
///
/// Uses the usual max/min channel algorithm. Hue is returned in degrees in
/// `[0, 360)`, saturation and lightness as percentages in `[0, 100]`. Alpha is
/// carried over untouched.
///
/// # Examples
///
/// ```
/// # use darkmail::color::Rgba;
/// # use darkmail::space::rgba_to_hsla;
/// let hsla = rgba_to_hsla(Rgba::new(1.0, 0.0, 0.0, 1.0));
/// assert_eq!((hsla.h, hsla.s, hsla.l), (0.0, 100.0, 50.0));
/// ```
#[must_use]
pub fn rgba_to_hsla(rgba: Rgba) -> Hsla {
    let Rgba { r, g, b, a } = rgba;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return Hsla::new(0.0, 0.0, l * 100.0, a);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    #[allow(clippy::float_cmp)]
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsla::new((h * 60.0).rem_euclid(360.0), s * 100.0, l * 100.0, a)
}

/// Convert HSLA back into normalized RGBA channels.
///
/// This is the inverse of [`rgba_to_hsla`]; a round trip reproduces the
/// input within floating-point error.
#[must_use]
pub fn hsla_to_rgba(hsla: Hsla) -> Rgba {
    let h = hsla.h.rem_euclid(360.0) / 360.0;
    let s = (hsla.s / 100.0).clamp(0.0, 1.0);
    let l = (hsla.l / 100.0).clamp(0.0, 1.0);

    if s == 0.0 {
        return Rgba::new(l, l, l, hsla.a);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Rgba::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
        hsla.a,
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
