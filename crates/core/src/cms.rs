//! Color management for ICC matrix/TRC display profiles, on top of `moxcms`.
//!
//! An [`RgbProfile`] wraps a parsed [`moxcms::ColorProfile`]: one of the
//! built-ins, or any RGB matrix/TRC `.icc` file. Its colorants are already
//! adapted to the D50 connection space, so RGB white lands on the profile
//! white and Lab is taken relative to that white (relative colorimetric).
//!
//! A [`Transform`] is built once per direction and then converts buffers of
//! interleaved `f64` triples. [`Precision::Full`] evaluates the profile's
//! parsed tone curves in `f64`; [`Precision::Reduced`] runs the RGB side
//! through a 16-bit `moxcms` transform. [`Rgb`] and [`Lab`] slices are handed
//! over without copying through `bytemuck`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use glam::{DMat3, DVec3};
use moxcms::{
    curve_from_gamma, ColorProfile, DataColorSpace, Layout, ProfileText, ToneReprCurve,
    Transform16BitExecutor, TransformExecutor, TransformOptions,
};

use crate::color::{Lab, Rgb};
use crate::error::ColorError;

const LAB_EPSILON: f64 = 216.0 / 24389.0;
const LAB_KAPPA: f64 = 24389.0 / 27.0;

/// Largest 16-bit code value.
const U16_MAX: f64 = 65535.0;

/// Names accepted by [`RgbProfile::from_name`].
const PROFILE_NAMES: &[&str] = &["srgb", "display-p3", "adobe-rgb"];

/// An RGB display profile with its descriptive strings.
#[derive(Debug, Clone)]
pub struct RgbProfile {
    icc: ColorProfile,
    description: String,
    copyright: String,
    manufacturer: String,
    model: String,
}

impl RgbProfile {
    /// IEC 61966-2-1 sRGB.
    pub fn srgb() -> Self {
        Self::builtin(ColorProfile::new_srgb(), "sRGB (built-in)")
    }

    pub fn display_p3() -> Self {
        Self::builtin(ColorProfile::new_display_p3(), "Display P3 (built-in)")
    }

    pub fn adobe_rgb() -> Self {
        Self::builtin(
            ColorProfile::new_adobe_rgb(),
            "Adobe RGB (1998) compatible (built-in)",
        )
    }

    fn builtin(icc: ColorProfile, description: &str) -> Self {
        let copyright = profile_text(icc.copyright.as_ref())
            .unwrap_or_else(|| "No copyright, use freely".to_string());
        Self {
            icc,
            description: description.to_string(),
            copyright,
            manufacturer: String::new(),
            model: String::new(),
        }
    }

    /// Looks up a built-in profile by name.
    ///
    /// Returns `ColorError::UnknownProfile` for anything not in [`Self::list_names`].
    pub fn from_name(name: &str) -> Result<Self, ColorError> {
        match name {
            "srgb" => Ok(Self::srgb()),
            "display-p3" => Ok(Self::display_p3()),
            "adobe-rgb" => Ok(Self::adobe_rgb()),
            _ => Err(ColorError::UnknownProfile(name.to_string())),
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        PROFILE_NAMES
    }

    /// Parses ICC profile bytes.
    pub fn from_icc(bytes: &[u8]) -> Result<Self, ColorError> {
        let icc = ColorProfile::new_from_slice(bytes)
            .map_err(|e| ColorError::ProfileParse(e.to_string()))?;
        Self::from_icc_profile(icc)
    }

    /// Reads an `.icc`/`.icm` file.
    pub fn load(path: &Path) -> Result<Self, ColorError> {
        let bytes =
            std::fs::read(path).map_err(|e| ColorError::Io(format!("{}: {e}", path.display())))?;
        Self::from_icc(&bytes)
    }

    /// Wraps an already parsed profile.
    ///
    /// Only RGB profiles with three colorants and three tone curves are
    /// accepted; the strings come from the `desc`, `cprt`, `dmnd` and `dmdd`
    /// tags and are empty when a tag is missing.
    pub fn from_icc_profile(icc: ColorProfile) -> Result<Self, ColorError> {
        if icc.color_space != DataColorSpace::Rgb {
            return Err(ColorError::InvalidProfile(format!(
                "expected an RGB profile, got {:?}",
                icc.color_space
            )));
        }
        let profile = Self {
            description: profile_text(icc.description.as_ref()).unwrap_or_default(),
            copyright: profile_text(icc.copyright.as_ref()).unwrap_or_default(),
            manufacturer: profile_text(icc.device_manufacturer.as_ref()).unwrap_or_default(),
            model: profile_text(icc.device_model.as_ref()).unwrap_or_default(),
            icc,
        };
        profile.to_xyz_matrix()?;
        profile.curves()?;
        Ok(profile)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The underlying `moxcms` profile.
    pub fn icc(&self) -> &ColorProfile {
        &self.icc
    }

    /// Matrix from linear device RGB to connection-space XYZ (D50, Y = 1).
    pub fn to_xyz_matrix(&self) -> Result<DMat3, ColorError> {
        let colorants = self.icc.colorant_matrix();
        // moxcms stores rows; glam wants columns.
        let matrix = DMat3::from_cols_array_2d(&colorants.v).transpose();
        if !matrix.is_finite() || matrix.determinant().abs() < 1e-12 {
            return Err(ColorError::InvalidProfile(
                "colorants are degenerate".to_string(),
            ));
        }
        if (matrix * DVec3::ONE).min_element() <= 0.0 {
            return Err(ColorError::InvalidProfile(
                "colorants do not add up to a white".to_string(),
            ));
        }
        Ok(matrix)
    }

    fn curves(&self) -> Result<[Curve; 3], ColorError> {
        let curve = |trc: Option<&ToneReprCurve>, channel: &str| {
            trc.ok_or_else(|| ColorError::InvalidProfile(format!("missing {channel} tone curve")))
                .and_then(Curve::from_trc)
        };
        Ok([
            curve(self.icc.red_trc.as_ref(), "red")?,
            curve(self.icc.green_trc.as_ref(), "green")?,
            curve(self.icc.blue_trc.as_ref(), "blue")?,
        ])
    }

    /// A 16-bit engine transform between the device encoding and linear
    /// light with the same colorants.
    fn encoding_transform(
        &self,
        direction: Direction,
    ) -> Result<Arc<Transform16BitExecutor>, ColorError> {
        let mut linear = self.icc.clone();
        linear.red_trc = Some(curve_from_gamma(1.0));
        linear.green_trc = Some(curve_from_gamma(1.0));
        linear.blue_trc = Some(curve_from_gamma(1.0));
        linear.cicp = None;
        let (src, dst) = match direction {
            Direction::RgbToLab => (&self.icc, &linear),
            Direction::LabToRgb => (&linear, &self.icc),
        };
        src.create_transform_16bit(Layout::Rgb, dst, Layout::Rgb, TransformOptions::default())
            .map_err(|e| ColorError::InvalidProfile(e.to_string()))
    }
}

/// First non-empty string of a text tag.
fn profile_text(text: Option<&ProfileText>) -> Option<String> {
    let text = match text? {
        ProfileText::PlainString(s) => s.clone(),
        ProfileText::Localizable(records) => records.first()?.value.clone(),
        ProfileText::Description(desc) => {
            if desc.unicode_string.is_empty() {
                desc.ascii_string.clone()
            } else {
                desc.unicode_string.clone()
            }
        }
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    let text = text.trim_end_matches('\0').trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// A tone response curve as parsed from the profile, evaluated in `f64`.
#[derive(Debug, Clone, PartialEq)]
enum Curve {
    /// ICC parametric function in its general form, parameters
    /// `[g, a, b, c, d, e, f]`:
    /// `(a·x + b)^g + e` for `x ≥ d`, otherwise `c·x + f`.
    Parametric([f64; 7]),
    /// Samples evenly spaced over [0, 1], nondecreasing.
    Table(Vec<f64>),
}

impl Curve {
    fn from_trc(trc: &ToneReprCurve) -> Result<Self, ColorError> {
        let curve = match trc {
            ToneReprCurve::Lut(table) => match table.as_slice() {
                [] => Curve::Parametric([1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                // A single entry is a u8Fixed8 gamma.
                [gamma] => Curve::Parametric([*gamma as f64 / 256.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                samples => {
                    let samples: Vec<f64> = samples.iter().map(|&v| v as f64 / U16_MAX).collect();
                    let monotonic = samples.windows(2).all(|w| w[0] <= w[1]);
                    if !monotonic || samples[0] >= samples[samples.len() - 1] {
                        return Err(ColorError::InvalidProfile(
                            "sampled tone curve is not increasing".to_string(),
                        ));
                    }
                    Curve::Table(samples)
                }
            },
            ToneReprCurve::Parametric(params) => {
                let p: Vec<f64> = params.iter().map(|&v| v as f64).collect();
                let general = match p[..] {
                    [g] => [g, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    [g, a, b] => [g, a, b, 0.0, -b / a, 0.0, 0.0],
                    [g, a, b, c] => [g, a, b, 0.0, -b / a, c, c],
                    [g, a, b, c, d] => [g, a, b, c, d, 0.0, 0.0],
                    [g, a, b, c, d, e, f] => [g, a, b, c, d, e, f],
                    _ => {
                        return Err(ColorError::InvalidProfile(format!(
                            "parametric curve with {} parameters",
                            p.len()
                        )))
                    }
                };
                let [g, a, ..] = general;
                if !general.iter().all(|v| v.is_finite()) || g <= 0.0 || a <= 0.0 {
                    return Err(ColorError::InvalidProfile(format!(
                        "unusable parametric curve {p:?}"
                    )));
                }
                Curve::Parametric(general)
            }
            #[allow(unreachable_patterns)]
            _ => {
                return Err(ColorError::InvalidProfile(
                    "unsupported tone curve".to_string(),
                ))
            }
        };
        Ok(curve)
    }

    /// Encoded device value to linear light. Negative input mirrors the curve.
    fn decode(&self, v: f64) -> f64 {
        let x = v.abs();
        let y = match self {
            Curve::Parametric([g, a, b, c, d, e, f]) => {
                if x >= *d {
                    (a * x + b).max(0.0).powf(*g) + e
                } else {
                    c * x + f
                }
            }
            Curve::Table(samples) => {
                let last = samples.len() - 1;
                let pos = x.min(1.0) * last as f64;
                let i = (pos.floor() as usize).min(last - 1);
                let t = pos - i as f64;
                samples[i] + (samples[i + 1] - samples[i]) * t
            }
        };
        y.copysign(v)
    }

    /// Linear light to encoded device value. Negative input mirrors the curve.
    fn encode(&self, v: f64) -> f64 {
        let y = v.abs();
        let x = match self {
            Curve::Parametric([g, a, b, c, d, e, f]) => {
                let knee = (a * d + b).max(0.0).powf(*g) + e;
                if y >= knee {
                    ((y - e).max(0.0).powf(1.0 / g) - b) / a
                } else if *c != 0.0 {
                    (y - f) / c
                } else {
                    *d
                }
            }
            Curve::Table(samples) => {
                let last = samples.len() - 1;
                let y = y.clamp(samples[0], samples[last]);
                let upper = samples.partition_point(|&s| s < y).clamp(1, last);
                let (lo, hi) = (samples[upper - 1], samples[upper]);
                let t = if hi > lo { (y - lo) / (hi - lo) } else { 0.0 };
                (upper - 1) as f64 / last as f64 + t / last as f64
            }
        };
        x.copysign(v)
    }
}

/// XYZ to CIE L\*a\*b\* relative to `white`.
fn xyz_to_lab(xyz: DVec3, white: DVec3) -> Lab {
    let f = |t: f64| {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            (LAB_KAPPA * t + 16.0) / 116.0
        }
    };
    let n = xyz / white;
    let (fx, fy, fz) = (f(n.x), f(n.y), f(n.z));
    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// CIE L\*a\*b\* relative to `white` to XYZ.
fn lab_to_xyz(lab: Lab, white: DVec3) -> DVec3 {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;
    let f_inv = |t: f64| {
        let cube = t * t * t;
        if cube > LAB_EPSILON {
            cube
        } else {
            (116.0 * t - 16.0) / LAB_KAPPA
        }
    };
    DVec3::new(f_inv(fx), f_inv(fy), f_inv(fz)) * white
}

/// Which way a [`Transform`] converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    RgbToLab,
    LabToRgb,
}

/// Numeric precision of a [`Transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// `f64` throughout. RGB output is not clamped.
    Full,
    /// The RGB side goes through a 16-bit `moxcms` transform, which also
    /// clamps it. Enough for 8-bit display output.
    Reduced,
}

/// A one-way conversion between a device RGB profile and CIE Lab.
#[derive(Clone)]
pub struct Transform {
    direction: Direction,
    precision: Precision,
    /// Linear RGB → XYZ for `RgbToLab`, the inverse otherwise.
    matrix: DMat3,
    white: DVec3,
    curves: [Curve; 3],
    encoding: Option<Arc<Transform16BitExecutor>>,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("direction", &self.direction)
            .field("precision", &self.precision)
            .field("white", &self.white)
            .finish_non_exhaustive()
    }
}

impl Transform {
    /// Builds the transform. Fails if the profile has no usable colorants
    /// or curves, or the engine rejects it.
    pub fn new(
        direction: Direction,
        profile: &RgbProfile,
        precision: Precision,
    ) -> Result<Self, ColorError> {
        let to_xyz = profile.to_xyz_matrix()?;
        let matrix = match direction {
            Direction::RgbToLab => to_xyz,
            Direction::LabToRgb => to_xyz.inverse(),
        };
        let encoding = match precision {
            Precision::Full => None,
            Precision::Reduced => Some(profile.encoding_transform(direction)?),
        };
        tracing::debug!(
            ?direction,
            ?precision,
            profile = %profile.description,
            "created color transform"
        );
        Ok(Self {
            direction,
            precision,
            matrix,
            white: to_xyz * DVec3::ONE,
            curves: profile.curves()?,
            encoding,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Converts interleaved triples from `src` into `dst`.
    ///
    /// Both buffers must have the same length, a multiple of 3.
    pub fn apply(&self, src: &[f64], dst: &mut [f64]) -> Result<(), ColorError> {
        if src.len() != dst.len() || src.len() % 3 != 0 {
            return Err(ColorError::BufferLength { len: src.len() });
        }
        let Some(encoding) = &self.encoding else {
            for (input, output) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
                let converted = match self.direction {
                    Direction::RgbToLab => self.linear_to_lab(self.decode(input)),
                    Direction::LabToRgb => self.encode(self.lab_to_linear(input)),
                };
                output.copy_from_slice(&converted);
            }
            return Ok(());
        };

        let engine_error = |e: moxcms::CmsError| ColorError::Engine(e.to_string());
        let mut codes = vec![0u16; src.len()];
        match self.direction {
            Direction::RgbToLab => {
                let device: Vec<u16> = src.iter().map(|&v| to_u16(v)).collect();
                encoding.transform(&device, &mut codes).map_err(engine_error)?;
                for (linear, output) in codes.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
                    let linear = DVec3::new(
                        linear[0] as f64 / U16_MAX,
                        linear[1] as f64 / U16_MAX,
                        linear[2] as f64 / U16_MAX,
                    );
                    output.copy_from_slice(&self.linear_to_lab(linear));
                }
            }
            Direction::LabToRgb => {
                let linear: Vec<u16> = src
                    .chunks_exact(3)
                    .flat_map(|lab| self.lab_to_linear(lab).to_array().map(to_u16))
                    .collect();
                encoding.transform(&linear, &mut codes).map_err(engine_error)?;
                for (out, code) in dst.iter_mut().zip(codes) {
                    *out = code as f64 / U16_MAX;
                }
            }
        }
        Ok(())
    }

    /// Zero-copy wrapper around [`Self::apply`] for an RGB→Lab transform.
    pub fn apply_rgb_to_lab(&self, src: &[Rgb], dst: &mut [Lab]) -> Result<(), ColorError> {
        self.expect_direction(Direction::RgbToLab)?;
        self.apply(bytemuck::cast_slice(src), bytemuck::cast_slice_mut(dst))
    }

    /// Zero-copy wrapper around [`Self::apply`] for a Lab→RGB transform.
    pub fn apply_lab_to_rgb(&self, src: &[Lab], dst: &mut [Rgb]) -> Result<(), ColorError> {
        self.expect_direction(Direction::LabToRgb)?;
        self.apply(bytemuck::cast_slice(src), bytemuck::cast_slice_mut(dst))
    }

    /// Converts a single triple.
    pub fn convert_triple(&self, input: [f64; 3]) -> [f64; 3] {
        let mut output = [0.0; 3];
        if let Err(e) = self.apply(&input, &mut output) {
            tracing::warn!(error = %e, "color transform failed");
        }
        output
    }

    fn expect_direction(&self, expected: Direction) -> Result<(), ColorError> {
        if self.direction == expected {
            Ok(())
        } else {
            Err(ColorError::DirectionMismatch {
                expected,
                actual: self.direction,
            })
        }
    }

    fn decode(&self, rgb: &[f64]) -> DVec3 {
        DVec3::new(
            self.curves[0].decode(rgb[0]),
            self.curves[1].decode(rgb[1]),
            self.curves[2].decode(rgb[2]),
        )
    }

    fn encode(&self, linear: DVec3) -> [f64; 3] {
        [
            self.curves[0].encode(linear.x),
            self.curves[1].encode(linear.y),
            self.curves[2].encode(linear.z),
        ]
    }

    fn linear_to_lab(&self, linear: DVec3) -> [f64; 3] {
        let lab = xyz_to_lab(self.matrix * linear, self.white);
        [lab.l, lab.a, lab.b]
    }

    fn lab_to_linear(&self, lab: &[f64]) -> DVec3 {
        let lab = Lab {
            l: lab[0],
            a: lab[1],
            b: lab[2],
        };
        self.matrix * lab_to_xyz(lab, self.white)
    }
}

fn to_u16(v: f64) -> u16 {
    (v.clamp(0.0, 1.0) * U16_MAX).round() as u16
}
