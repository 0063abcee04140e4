//! Color model
//!
//! Fixtures are smoothed in HSV and emitted as 8-bit RGB. The conversion uses
//! the standard six-sector algorithm from `palette`, quantized by rounding.
//! Every value leaving this module is clamped to its domain: hue wraps into
//! `[0, 360)`, saturation and value clamp to `[0, 1]`, channels to `0..=255`.

use palette::{FromColor, Hsv as PaletteHsv, Srgb};
use serde::{Deserialize, Serialize};

/// A color in hue (degrees), saturation and value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`
    pub h: f32,
    /// Saturation, `[0, 1]`
    pub s: f32,
    /// Value (brightness), `[0, 1]`
    pub v: f32,
}

/// An 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Hsv {
    pub const BLACK: Hsv = Hsv {
        h: 0.0,
        s: 0.0,
        v: 0.0,
    };

    /// Create a normalized HSV color
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }.normalized()
    }

    /// Wrap the hue and clamp saturation/value into their domains
    pub fn normalized(self) -> Self {
        Self {
            h: wrap_hue(self.h),
            s: clamp_unit(self.s),
            v: clamp_unit(self.v),
        }
    }

    /// Quantize to 8-bit RGB
    pub fn to_rgb(self) -> Rgb {
        let (r, g, b) = hsv_to_rgb(self.h, self.s, self.v);
        Rgb { r, g, b }
    }

    /// Interpolate towards `other`, taking the short way around the hue wheel
    pub fn lerp(self, other: Hsv, t: f32) -> Hsv {
        let t = clamp_unit(t);
        Hsv::new(
            self.h + hue_delta(self.h, other.h) * t,
            self.s + (other.s - self.s) * t,
            self.v + (other.v - self.v) * t,
        )
    }
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hsv(self) -> Hsv {
        let (h, s, v) = rgb_to_hsv(self.r, self.g, self.b);
        Hsv { h, s, v }
    }
}

impl From<Hsv> for Rgb {
    fn from(hsv: Hsv) -> Self {
        hsv.to_rgb()
    }
}

/// Convert HSV (`h` in degrees, `s`/`v` in `[0, 1]`) to 8-bit RGB
///
/// Out-of-domain inputs are normalized first, so any float is accepted.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let hsv: PaletteHsv = PaletteHsv::new(wrap_hue(h), clamp_unit(s), clamp_unit(v));
    let rgb: Srgb = Srgb::from_color(hsv);
    (
        clamp_channel(rgb.red * 255.0),
        clamp_channel(rgb.green * 255.0),
        clamp_channel(rgb.blue * 255.0),
    )
}

/// Convert 8-bit RGB to HSV (`h` in `[0, 360)`, `s`/`v` in `[0, 1]`)
///
/// Achromatic colors report a hue of 0.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let hsv: PaletteHsv = PaletteHsv::from_color(rgb);
    (
        wrap_hue(hsv.hue.into_positive_degrees()),
        clamp_unit(hsv.saturation),
        clamp_unit(hsv.value),
    )
}

/// Round and clamp an arithmetic result to a DMX channel value
pub fn clamp_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Clamp to `[0, 1]`, mapping NaN to 0
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Wrap a hue into `[0, 360)`
pub fn wrap_hue(h: f32) -> f32 {
    if !h.is_finite() {
        return 0.0;
    }
    let wrapped = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest angular distance from `from` to `to`, in `(-180, 180]`
pub fn hue_delta(from: f32, to: f32) -> f32 {
    let d = wrap_hue(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}
