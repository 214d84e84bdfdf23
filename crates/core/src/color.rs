//! Color value types exchanged between the color space and its consumers.
//!
//! Provides four types: [`Rgb`] (device RGB in [0, 1]), [`Lab`] (CIE
//! L\*a\*b\* relative to D50), [`Lch`] (its cylindrical form) and [`Lcha`]
//! (LCh with opacity). Uses `f64` throughout.
//!
//! `Rgb` and `Lab` are `#[repr(C)]` and [`Pod`]: a slice of either is the
//! interleaved `f64` buffer consumed by [`Transform`](crate::cms::Transform),
//! so batch conversion never copies. Field order and type are part of that
//! contract and are pinned by compile-time assertions below.
//!
//! The polar types deliberately implement neither `PartialEq` nor `Default`.
//! The same point has many polar representations (any hue is valid at
//! chroma 0), so callers compare with `has_same_coordinates` when they need
//! exact field equality.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ColorError;

/// Lightness, chroma and hue of a neutral mid gray.
pub const NEUTRAL_GRAY: Lch = Lch {
    l: 50.0,
    c: 0.0,
    h: 0.0,
};

/// A chroma that stays inside sRGB for every hue at lightness 50.
pub const SRGB_VERSATILE_CHROMA: f64 = 32.0;

/// Upper bound for chroma values fed into the gamut search.
pub const MAXIMUM_CHROMA: f64 = 255.0;

/// Device RGB color with components in [0, 1].
///
/// Serializes as a hex string `"#rrggbb"`; the hex round trip has 8-bit
/// quantization.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// CIE L\*a\*b\* color relative to the D50 white point.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Cylindrical form of [`Lab`]: lightness, chroma, hue in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Lch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

/// [`Lch`] with an opacity `a` in [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct Lcha {
    pub l: f64,
    pub c: f64,
    pub h: f64,
    pub a: f64,
}

const _: () = assert!(size_of::<Rgb>() == 3 * size_of::<f64>());
const _: () = assert!(size_of::<Lab>() == 3 * size_of::<f64>());

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Returns the color with every channel clamped to [0, 1].
    pub fn clamped(self) -> Rgb {
        Rgb {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// Quantizes to 8 bits per channel with rounding, clamping first.
    pub fn to_rgb8(self) -> [u8; 3] {
        let c = self.clamped();
        [
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
        ]
    }

    pub fn from_rgb8(rgb: [u8; 3]) -> Rgb {
        Rgb {
            r: rgb[0] as f64 / 255.0,
            g: rgb[1] as f64 / 255.0,
            b: rgb[2] as f64 / 255.0,
        }
    }

    /// Parses a hex color string like "#ff00aa" or "ff00aa" (case insensitive).
    ///
    /// Returns `ColorError::InvalidColor` if the input is not a valid 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Rgb, ColorError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorError::InvalidColor(format!(
                "expected 6 hex digits, got {:?}",
                hex
            )));
        }
        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| ColorError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Rgb::from_rgb8([
            channel(0..2, "red")?,
            channel(2..4, "green")?,
            channel(4..6, "blue")?,
        ]))
    }

    /// Formats the color as `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Lch {
    /// Exact comparison of all three fields.
    ///
    /// This is not color equality: `(50, 0, 10)` and `(50, 0, 20)` are the
    /// same gray but do not have the same coordinates.
    pub fn has_same_coordinates(&self, other: &Lch) -> bool {
        self.l == other.l && self.c == other.c && self.h == other.h
    }
}

impl From<Lab> for Lch {
    /// Hue is set to 0.0 when chroma is below 1e-10 so that `atan2(0, 0)`
    /// never leaks an arbitrary angle.
    fn from(lab: Lab) -> Lch {
        let c = lab.a.hypot(lab.b);
        let h = if c < 1e-10 {
            0.0
        } else {
            lab.b.atan2(lab.a).to_degrees().rem_euclid(360.0)
        };
        Lch { l: lab.l, c, h }
    }
}

impl From<Lch> for Lab {
    fn from(lch: Lch) -> Lab {
        let h = lch.h.to_radians();
        Lab {
            l: lch.l,
            a: lch.c * h.cos(),
            b: lch.c * h.sin(),
        }
    }
}

impl Lcha {
    pub fn new(l: f64, c: f64, h: f64, a: f64) -> Lcha {
        Lcha { l, c, h, a }
    }

    pub fn from_lch(lch: Lch, alpha: f64) -> Lcha {
        Lcha {
            l: lch.l,
            c: lch.c,
            h: lch.h,
            a: alpha,
        }
    }

    /// The color without its opacity.
    pub fn lch(&self) -> Lch {
        Lch {
            l: self.l,
            c: self.c,
            h: self.h,
        }
    }

    /// Exact comparison of all four fields. Used for change detection.
    pub fn has_same_coordinates(&self, other: &Lcha) -> bool {
        self.lch().has_same_coordinates(&other.lch()) && self.a == other.a
    }

    /// Brings the color into its canonical ranges.
    ///
    /// Negative chroma is made positive by turning the hue half a circle,
    /// hue is wrapped into [0, 360), lightness is clamped to [0, 100] and
    /// alpha to [0, 1].
    pub fn normalized(self) -> Lcha {
        let (c, h) = if self.c < 0.0 {
            (-self.c, self.h + 180.0)
        } else {
            (self.c, self.h)
        };
        Lcha {
            l: self.l.clamp(0.0, 100.0),
            c,
            h: normalize_hue(h),
            a: self.a.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for Lcha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.l, self.c, self.h, self.a)
    }
}

impl FromStr for Lcha {
    type Err = ColorError;

    /// Parses `"L,C,h"` or `"L,C,h,a"`. A missing alpha means opaque.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| ColorError::InvalidColor(format!("{part:?}: {e}")))
            })
            .collect::<Result<Vec<f64>, ColorError>>()?;
        match values[..] {
            [l, c, h] => Ok(Lcha::new(l, c, h, 1.0)),
            [l, c, h, a] => Ok(Lcha::new(l, c, h, a)),
            _ => Err(ColorError::InvalidColor(format!(
                "expected 3 or 4 comma-separated numbers, got {:?}",
                s
            ))),
        }
    }
}

/// Wraps a hue angle into [0, 360).
pub fn normalize_hue(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}
