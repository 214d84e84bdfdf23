//! RGB color space: conversions between a device RGB profile and CIE
//! Lab/LCh, gamut membership and chroma reduction into the gamut.
//!
//! Gamut membership is decided empirically: a color is in gamut when the
//! round trip Lab → RGB (clamped) → Lab lands within [`GAMUT_PRECISION`]
//! of where it started. This is an approximation of the true gamut
//! boundary; the tolerance trades accuracy for speed in the interactive
//! chroma search.

use bytemuck::Zeroable;

use crate::cms::{Direction, Precision, RgbProfile, Transform};
use crate::color::{normalize_hue, Lab, Lch, Rgb, MAXIMUM_CHROMA};
use crate::error::ColorError;

/// Round-trip tolerance (Lab units) for gamut membership, and the
/// resolution of the chroma search.
pub const GAMUT_PRECISION: f64 = 0.001;

/// An RGB color space built from one [`RgbProfile`].
///
/// Construction builds every transform up front; after that the value is
/// immutable. Consumers share one instance through `Rc<RgbColorSpace>`.
#[derive(Debug, Clone)]
pub struct RgbColorSpace {
    profile: RgbProfile,
    rgb_to_lab: Transform,
    lab_to_rgb: Transform,
    lab_to_rgb_reduced: Transform,
    black_point_lightness: f64,
    white_point_lightness: f64,
}

impl RgbColorSpace {
    /// Builds the color space.
    ///
    /// Returns `ColorError::InvalidProfile` if the profile cannot produce
    /// transforms.
    pub fn new(profile: RgbProfile) -> Result<Self, ColorError> {
        let rgb_to_lab = Transform::new(Direction::RgbToLab, &profile, Precision::Full)?;
        let lab_to_rgb = Transform::new(Direction::LabToRgb, &profile, Precision::Full)?;
        let lab_to_rgb_reduced =
            Transform::new(Direction::LabToRgb, &profile, Precision::Reduced)?;
        let black_point_lightness = lab_from(&rgb_to_lab, Rgb::BLACK).l;
        let white_point_lightness = lab_from(&rgb_to_lab, Rgb::WHITE).l;
        tracing::debug!(
            profile = %profile.description(),
            black_point_lightness,
            white_point_lightness,
            "created RGB color space"
        );
        Ok(Self {
            profile,
            rgb_to_lab,
            lab_to_rgb,
            lab_to_rgb_reduced,
            black_point_lightness,
            white_point_lightness,
        })
    }

    /// The built-in sRGB color space.
    pub fn srgb() -> Self {
        Self::new(RgbProfile::srgb()).expect("built-in sRGB profile is valid")
    }

    pub fn profile(&self) -> &RgbProfile {
        &self.profile
    }

    pub fn profile_description(&self) -> &str {
        self.profile.description()
    }

    pub fn profile_copyright(&self) -> &str {
        self.profile.copyright()
    }

    pub fn profile_manufacturer(&self) -> &str {
        self.profile.manufacturer()
    }

    pub fn profile_model(&self) -> &str {
        self.profile.model()
    }

    /// Lightness of RGB black.
    pub fn black_point_lightness(&self) -> f64 {
        self.black_point_lightness
    }

    /// Lightness of RGB white.
    pub fn white_point_lightness(&self) -> f64 {
        self.white_point_lightness
    }

    /// Lab to RGB, each channel clamped to [0, 1].
    ///
    /// Out-of-gamut colors are not rejected; they come back clipped.
    pub fn to_rgb(&self, lab: Lab) -> Rgb {
        let [r, g, b] = self.lab_to_rgb.convert_triple([lab.l, lab.a, lab.b]);
        Rgb { r, g, b }.clamped()
    }

    /// LCh to RGB, see [`Self::to_rgb`].
    pub fn to_rgb_lch(&self, lch: Lch) -> Rgb {
        self.to_rgb(Lab::from(lch))
    }

    /// Lab to RGB only if the color is in gamut.
    pub fn to_rgb_checked(&self, lab: Lab) -> Option<Rgb> {
        let (rgb, in_gamut) = self.round_trip(lab);
        in_gamut.then_some(rgb)
    }

    /// LCh to an RGB color that is always displayable.
    ///
    /// Out-of-gamut colors are first moved into the gamut with
    /// [`Self::reduce_chroma_to_fit`]. Uses the reduced-precision transform,
    /// which is plenty for 8-bit output.
    pub fn to_rgb_bound(&self, lch: Lch) -> Rgb {
        let lab = Lab::from(lch);
        let displayable = if self.in_gamut(lab) {
            lab
        } else {
            Lab::from(self.reduce_chroma_to_fit(lch))
        };
        let [r, g, b] = self
            .lab_to_rgb_reduced
            .convert_triple([displayable.l, displayable.a, displayable.b]);
        Rgb { r, g, b }
    }

    pub fn to_lab(&self, rgb: Rgb) -> Lab {
        lab_from(&self.rgb_to_lab, rgb)
    }

    pub fn to_lch(&self, rgb: Rgb) -> Lch {
        Lch::from(self.to_lab(rgb))
    }

    /// Converts many RGB colors at once without copying them.
    pub fn to_lab_batch(&self, colors: &[Rgb]) -> Result<Vec<Lab>, ColorError> {
        let mut labs = vec![Lab::zeroed(); colors.len()];
        self.rgb_to_lab.apply_rgb_to_lab(colors, &mut labs)?;
        Ok(labs)
    }

    /// Converts many Lab colors at once; channels are clamped like [`Self::to_rgb`].
    pub fn to_rgb_batch(&self, colors: &[Lab]) -> Result<Vec<Rgb>, ColorError> {
        let mut rgbs = vec![Rgb::zeroed(); colors.len()];
        self.lab_to_rgb.apply_lab_to_rgb(colors, &mut rgbs)?;
        Ok(rgbs.into_iter().map(Rgb::clamped).collect())
    }

    /// Whether the color survives the RGB round trip within [`GAMUT_PRECISION`].
    pub fn in_gamut(&self, lab: Lab) -> bool {
        self.round_trip(lab).1
    }

    pub fn in_gamut_lch(&self, lch: Lch) -> bool {
        self.in_gamut(Lab::from(lch))
    }

    /// The in-gamut color with the same lightness and hue and the largest
    /// chroma not above the input's.
    ///
    /// Negative chroma is read as the opposite hue. Lightness is clamped
    /// between the black and white points, chroma capped at
    /// [`MAXIMUM_CHROMA`]. The search bisects chroma between the gray axis
    /// and the input until the interval is [`GAMUT_PRECISION`] wide and
    /// returns the in-gamut end.
    pub fn reduce_chroma_to_fit(&self, lch: Lch) -> Lch {
        let (c, h) = if lch.c < 0.0 {
            (-lch.c, lch.h + 180.0)
        } else {
            (lch.c, lch.h)
        };
        let mut upper = Lch {
            l: lch
                .l
                .clamp(self.black_point_lightness, self.white_point_lightness),
            c: c.min(MAXIMUM_CHROMA),
            h: if h.is_finite() { normalize_hue(h) } else { 0.0 },
        };
        if self.in_gamut_lch(upper) {
            return upper;
        }

        let mut lower = Lch { c: 0.0, ..upper };
        if !self.in_gamut_lch(lower) {
            // Gray axis outside the gamut: only black is guaranteed to fit.
            upper.l = self.black_point_lightness;
            lower.l = self.black_point_lightness;
        }
        while upper.c - lower.c > GAMUT_PRECISION {
            let candidate = Lch {
                c: (lower.c + upper.c) / 2.0,
                ..upper
            };
            if self.in_gamut_lch(candidate) {
                lower = candidate;
            } else {
                upper = candidate;
            }
        }
        lower
    }

    fn round_trip(&self, lab: Lab) -> (Rgb, bool) {
        let rgb = self.to_rgb(lab);
        let back = self.to_lab(rgb);
        let in_gamut = (back.l - lab.l).abs() <= GAMUT_PRECISION
            && (back.a - lab.a).abs() <= GAMUT_PRECISION
            && (back.b - lab.b).abs() <= GAMUT_PRECISION;
        (rgb, in_gamut)
    }
}

fn lab_from(transform: &Transform, rgb: Rgb) -> Lab {
    let [l, a, b] = transform.convert_triple([rgb.r, rgb.g, rgb.b]);
    Lab { l, a, b }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range(rgb: Rgb) -> bool {
        [rgb.r, rgb.g, rgb.b]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn srgb_black_and_white_points() {
        let space = RgbColorSpace::srgb();
        assert!(space.black_point_lightness().abs() < 1e-9);
        assert!((space.white_point_lightness() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn profile_strings_are_exposed() {
        let space = RgbColorSpace::srgb();
        assert_eq!(space.profile_description(), "sRGB (built-in)");
        assert!(!space.profile_copyright().is_empty());
        assert_eq!(space.profile_manufacturer(), "");
        assert_eq!(space.profile_model(), "");
    }

    #[test]
    fn every_builtin_profile_builds_a_color_space() {
        for name in RgbProfile::list_names() {
            let space = RgbColorSpace::new(RgbProfile::from_name(name).unwrap()).unwrap();
            assert!((space.white_point_lightness() - 100.0).abs() < 1e-6, "{name}");
            assert!(space.in_gamut(Lab::from(crate::color::NEUTRAL_GRAY)), "{name}");
        }
    }

    #[test]
    fn primaries_are_in_gamut() {
        let space = RgbColorSpace::srgb();
        for rgb in [
            Rgb::BLACK,
            Rgb::WHITE,
            Rgb {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            },
            Rgb {
                r: 0.0,
                g: 1.0,
                b: 0.0,
            },
            Rgb {
                r: 0.0,
                g: 0.0,
                b: 1.0,
            },
        ] {
            let lab = space.to_lab(rgb);
            assert!(space.in_gamut(lab), "{rgb:?} -> {lab:?} should be in gamut");
            assert!(space.to_rgb_checked(lab).is_some());
        }
    }

    #[test]
    fn very_saturated_color_is_out_of_gamut() {
        let space = RgbColorSpace::srgb();
        let lch = Lch {
            l: 50.0,
            c: 150.0,
            h: 200.0,
        };
        assert!(!space.in_gamut_lch(lch));
        assert!(space.to_rgb_checked(Lab::from(lch)).is_none());
    }

    #[test]
    fn lightness_outside_black_and_white_is_out_of_gamut() {
        let space = RgbColorSpace::srgb();
        let too_light = Lab {
            l: 101.0,
            a: 0.0,
            b: 0.0,
        };
        let too_dark = Lab {
            l: -1.0,
            a: 0.0,
            b: 0.0,
        };
        assert!(!space.in_gamut(too_light));
        assert!(!space.in_gamut(too_dark));
    }

    #[test]
    fn to_rgb_clamps_out_of_gamut() {
        let space = RgbColorSpace::srgb();
        let rgb = space.to_rgb(Lab {
            l: 50.0,
            a: 120.0,
            b: -120.0,
        });
        assert!(in_range(rgb), "{rgb:?}");
    }

    #[test]
    fn to_rgb_lch_matches_to_rgb_lab() {
        let space = RgbColorSpace::srgb();
        let lch = Lch {
            l: 60.0,
            c: 20.0,
            h: 40.0,
        };
        assert_eq!(space.to_rgb_lch(lch), space.to_rgb(Lab::from(lch)));
    }

    #[test]
    fn to_lch_of_gray_has_zero_chroma() {
        let space = RgbColorSpace::srgb();
        let lch = space.to_lch(Rgb {
            r: 0.5,
            g: 0.5,
            b: 0.5,
        });
        assert!(lch.c < 1e-3, "gray chroma {}", lch.c);
    }

    #[test]
    fn reduce_chroma_keeps_in_gamut_color() {
        let space = RgbColorSpace::srgb();
        let lch = Lch {
            l: 50.0,
            c: 10.0,
            h: 120.0,
        };
        assert!(space.reduce_chroma_to_fit(lch).has_same_coordinates(&lch));
    }

    #[test]
    fn reduce_chroma_stops_at_boundary() {
        let space = RgbColorSpace::srgb();
        let reduced = space.reduce_chroma_to_fit(Lch {
            l: 50.0,
            c: 200.0,
            h: 200.0,
        });
        assert!(space.in_gamut_lch(reduced));
        assert_eq!(reduced.l, 50.0);
        assert_eq!(reduced.h, 200.0);
        let slightly_more = Lch {
            c: reduced.c + 4.0 * GAMUT_PRECISION,
            ..reduced
        };
        assert!(
            !space.in_gamut_lch(slightly_more),
            "chroma {} is not the boundary",
            reduced.c
        );
    }

    #[test]
    fn reduce_chroma_reads_negative_chroma_as_opposite_hue() {
        let space = RgbColorSpace::srgb();
        let reduced = space.reduce_chroma_to_fit(Lch {
            l: 50.0,
            c: -10.0,
            h: 30.0,
        });
        assert_eq!(reduced.c, 10.0);
        assert_eq!(reduced.h, 210.0);
    }

    #[test]
    fn reduce_chroma_clamps_lightness() {
        let space = RgbColorSpace::srgb();
        let reduced = space.reduce_chroma_to_fit(Lch {
            l: 150.0,
            c: 50.0,
            h: 10.0,
        });
        assert!(reduced.l <= space.white_point_lightness());
        assert!(space.in_gamut_lch(reduced));
    }

    #[test]
    fn to_rgb_bound_is_always_displayable() {
        let space = RgbColorSpace::srgb();
        for lch in [
            Lch {
                l: 50.0,
                c: 250.0,
                h: 10.0,
            },
            Lch {
                l: -20.0,
                c: 30.0,
                h: 100.0,
            },
            Lch {
                l: 120.0,
                c: -30.0,
                h: 400.0,
            },
        ] {
            assert!(in_range(space.to_rgb_bound(lch)), "{lch:?}");
        }
    }

    #[test]
    fn to_rgb_bound_matches_exact_conversion_in_gamut() {
        let space = RgbColorSpace::srgb();
        let lch = Lch {
            l: 40.0,
            c: 20.0,
            h: 300.0,
        };
        let bound = space.to_rgb_bound(lch);
        let exact = space.to_rgb_lch(lch);
        assert!((bound.r - exact.r).abs() < 1e-3, "{bound:?} vs {exact:?}");
        assert!((bound.g - exact.g).abs() < 1e-3, "{bound:?} vs {exact:?}");
        assert!((bound.b - exact.b).abs() < 1e-3, "{bound:?} vs {exact:?}");
    }

    #[test]
    fn wide_gamut_green_is_outside_srgb() {
        let p3 = RgbColorSpace::new(RgbProfile::display_p3()).unwrap();
        let srgb = RgbColorSpace::srgb();
        let green = p3.to_lab(Rgb {
            r: 0.0,
            g: 1.0,
            b: 0.0,
        });
        assert!(p3.in_gamut(green));
        assert!(!srgb.in_gamut(green));
    }

    #[test]
    fn batch_conversions_match_single_conversions() {
        let space = RgbColorSpace::srgb();
        let colors = [
            Rgb {
                r: 0.1,
                g: 0.7,
                b: 0.3,
            },
            Rgb::WHITE,
        ];
        let labs = space.to_lab_batch(&colors).unwrap();
        assert_eq!(labs[0], space.to_lab(colors[0]));
        assert_eq!(labs[1], space.to_lab(colors[1]));
        let rgbs = space.to_rgb_batch(&labs).unwrap();
        assert_eq!(rgbs[0], space.to_rgb(labs[0]));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lab_round_trip_is_stable(
                r in 0.0_f64..=1.0,
                g in 0.0_f64..=1.0,
                b in 0.0_f64..=1.0,
            ) {
                let space = RgbColorSpace::srgb();
                let lab = space.to_lab(Rgb { r, g, b });
                let again = space.to_lab(space.to_rgb(lab));
                prop_assert!((again.l - lab.l).abs() <= GAMUT_PRECISION, "{lab:?} vs {again:?}");
                prop_assert!((again.a - lab.a).abs() <= GAMUT_PRECISION, "{lab:?} vs {again:?}");
                prop_assert!((again.b - lab.b).abs() <= GAMUT_PRECISION, "{lab:?} vs {again:?}");
                prop_assert!(space.in_gamut(lab));
            }

            #[test]
            fn reduced_chroma_is_in_gamut_and_keeps_lightness_and_hue(
                l in 1.0_f64..99.0,
                c in 0.0_f64..200.0,
                h in 0.0_f64..360.0,
            ) {
                let space = RgbColorSpace::srgb();
                let reduced = space.reduce_chroma_to_fit(Lch { l, c, h });
                prop_assert!(space.in_gamut_lch(reduced), "{reduced:?}");
                prop_assert!((reduced.l - l).abs() <= GAMUT_PRECISION);
                prop_assert!((reduced.h - h).abs() <= GAMUT_PRECISION);
                prop_assert!(reduced.c <= c);
            }
        }
    }
}
