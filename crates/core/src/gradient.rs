//! Linear gradient between two LCh colors with opacity.
//!
//! Interpolation runs in LCh along the shorter way around the hue circle.
//! The gradient is horizontal: one strip of samples is computed and then
//! replicated over the thickness. Translucent gradients are drawn over a
//! checkerboard.

use std::rc::Rc;

use crate::color::{Lcha, NEUTRAL_GRAY};
use crate::color_space::RgbColorSpace;
use crate::raster::{sanitize_ratio, update_parameter, Checkerboard, Raster};

/// Second hue moved by a full turn, when needed, so that a plain linear
/// interpolation from `first` takes the shorter arc.
///
/// The result may fall outside [0, 360).
pub fn altered_second_hue(first: f64, second: f64) -> f64 {
    if (first - second).abs() <= 180.0 {
        second
    } else if first > second {
        second + 360.0
    } else {
        second - 360.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GradientGeometry {
    length: usize,
    thickness: usize,
    device_pixel_ratio: f64,
    checkerboard: Checkerboard,
}

/// Cached gradient raster between two colors.
#[derive(Debug)]
pub struct GradientImage {
    color_space: Rc<RgbColorSpace>,
    first_color: Lcha,
    second_color: Lcha,
    second_hue_altered: f64,
    geometry: GradientGeometry,
    cache: Option<Raster>,
}

impl GradientImage {
    /// Both endpoints start as opaque neutral gray; length and thickness
    /// start at zero.
    pub fn new(color_space: Rc<RgbColorSpace>) -> Self {
        let gray = Lcha::from_lch(NEUTRAL_GRAY, 1.0);
        Self {
            color_space,
            first_color: gray,
            second_color: gray,
            second_hue_altered: gray.h,
            geometry: GradientGeometry {
                length: 0,
                thickness: 0,
                device_pixel_ratio: 1.0,
                checkerboard: Checkerboard::default(),
            },
            cache: None,
        }
    }

    /// Color at position 0, normalized.
    pub fn first_color(&self) -> Lcha {
        self.first_color
    }

    /// Color at position 1, normalized.
    pub fn second_color(&self) -> Lcha {
        self.second_color
    }

    /// Sets the color at position 0.
    ///
    /// The color is normalized first; if it then has the same coordinates
    /// as the current one, nothing happens.
    pub fn set_first_color(&mut self, color: Lcha) {
        let color = color.normalized();
        if color.has_same_coordinates(&self.first_color) {
            return;
        }
        self.first_color = color;
        self.refresh_altered_hue();
    }

    /// Sets the color at position 1. See [`Self::set_first_color`].
    pub fn set_second_color(&mut self, color: Lcha) {
        let color = color.normalized();
        if color.has_same_coordinates(&self.second_color) {
            return;
        }
        self.second_color = color;
        self.refresh_altered_hue();
    }

    fn refresh_altered_hue(&mut self) {
        self.second_hue_altered = altered_second_hue(self.first_color.h, self.second_color.h);
        if self.cache.take().is_some() {
            tracing::trace!("dropped cached gradient");
        }
    }

    /// Interpolated color at `value`, clamped to [0, 1].
    ///
    /// The hue is not normalized and may lie outside [0, 360).
    pub fn color_from_value(&self, value: f64) -> Lcha {
        let t = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        let (a, b) = (&self.first_color, &self.second_color);
        let lerp = |from: f64, to: f64| from + t * (to - from);
        Lcha {
            l: lerp(a.l, b.l),
            c: lerp(a.c, b.c),
            h: lerp(a.h, self.second_hue_altered),
            a: lerp(a.a, b.a),
        }
    }

    /// Length along the gradient in physical pixels.
    pub fn gradient_length(&self) -> usize {
        self.geometry.length
    }

    pub fn set_gradient_length(&mut self, length: usize) {
        update_parameter(&mut self.geometry.length, length, &mut self.cache);
    }

    /// Extent across the gradient in physical pixels.
    pub fn gradient_thickness(&self) -> usize {
        self.geometry.thickness
    }

    pub fn set_gradient_thickness(&mut self, thickness: usize) {
        update_parameter(&mut self.geometry.thickness, thickness, &mut self.cache);
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.geometry.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        let ratio = sanitize_ratio(ratio);
        update_parameter(&mut self.geometry.device_pixel_ratio, ratio, &mut self.cache);
    }

    pub fn checkerboard(&self) -> Checkerboard {
        self.geometry.checkerboard
    }

    /// Replaces the transparency background.
    pub fn set_checkerboard(&mut self, checkerboard: Checkerboard) {
        update_parameter(&mut self.geometry.checkerboard, checkerboard, &mut self.cache);
    }

    pub fn cached(&self) -> Option<&Raster> {
        self.cache.as_ref()
    }

    /// The gradient raster, `length` wide and `thickness` high.
    pub fn image(&mut self) -> &Raster {
        let raster = match self.cache.take() {
            Some(raster) => raster,
            None => self.render(),
        };
        self.cache.insert(raster)
    }

    fn render(&self) -> Raster {
        let geometry = &self.geometry;
        let Ok(mut raster) = Raster::new(
            geometry.length,
            geometry.thickness,
            geometry.device_pixel_ratio,
        ) else {
            return Raster::empty(geometry.device_pixel_ratio);
        };

        let strip: Vec<_> = (0..geometry.length)
            .map(|i| {
                let color = self.color_from_value((i as f64 + 0.5) / geometry.length as f64);
                (self.color_space.to_rgb_bound(color.lch()), color.a)
            })
            .collect();

        let translucent = self.first_color.a < 1.0 || self.second_color.a < 1.0;
        if translucent {
            raster.fill_checkerboard(&geometry.checkerboard);
            for y in 0..geometry.thickness {
                for (x, &(rgb, alpha)) in strip.iter().enumerate() {
                    raster.blend_over(x, y, rgb, alpha);
                }
            }
        } else {
            for (x, &(rgb, _)) in strip.iter().enumerate() {
                raster.set_rgb(x, 0, rgb);
            }
            for y in 1..geometry.thickness {
                raster.copy_row(0, y);
            }
        }
        tracing::debug!(
            length = geometry.length,
            thickness = geometry.thickness,
            translucent,
            "rendered gradient image"
        );
        raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::normalize_hue as normalize;
    use proptest::prelude::*;

    fn gradient() -> GradientImage {
        GradientImage::new(Rc::new(RgbColorSpace::srgb()))
    }

    #[test]
    fn altered_hue_takes_shorter_arc() {
        assert_eq!(altered_second_hue(169.0, 359.0), -1.0);
        assert_eq!(altered_second_hue(182.0, 1.0), 361.0);
        assert_eq!(altered_second_hue(10.0, 100.0), 100.0);
        assert_eq!(altered_second_hue(0.0, 180.0), 180.0);
    }

    #[test]
    fn setters_normalize_colors() {
        let mut g = gradient();
        g.set_first_color(Lcha::new(500.0, -20.0, 0.0, 5.0));
        let first = g.first_color();
        assert_eq!(first.l, 100.0);
        assert_eq!(first.c, 20.0);
        assert_eq!(first.h, 180.0);
        assert_eq!(first.a, 1.0);
    }

    #[test]
    fn midpoint_interpolates_linearly() {
        let mut g = gradient();
        g.set_first_color(Lcha::new(50.0, 0.0, 30.0, 0.5));
        g.set_second_color(Lcha::new(60.0, 10.0, 20.0, 0.4));
        let mid = g.color_from_value(0.5);
        assert!((mid.l - 55.0).abs() < 1e-12);
        assert!((mid.c - 5.0).abs() < 1e-12);
        assert!((mid.h - 25.0).abs() < 1e-12);
        assert!((mid.a - 0.45).abs() < 1e-12);
    }

    #[test]
    fn interpolation_crosses_zero_hue() {
        let mut g = gradient();
        g.set_first_color(Lcha::new(50.0, 20.0, 350.0, 1.0));
        g.set_second_color(Lcha::new(50.0, 20.0, 10.0, 1.0));
        let mid = g.color_from_value(0.5);
        assert!((mid.h - 360.0).abs() < 1e-12, "hue {}", mid.h);
    }

    #[test]
    fn value_is_clamped() {
        let mut g = gradient();
        g.set_first_color(Lcha::new(10.0, 0.0, 0.0, 1.0));
        g.set_second_color(Lcha::new(90.0, 0.0, 0.0, 1.0));
        assert_eq!(g.color_from_value(-1.0).l, 10.0);
        assert_eq!(g.color_from_value(2.0).l, 90.0);
    }

    #[test]
    fn zero_geometry_gives_empty_raster() {
        let mut g = gradient();
        g.set_gradient_length(10);
        assert!(g.image().is_empty());
        g.set_gradient_thickness(3);
        g.set_gradient_length(0);
        assert!(g.image().is_empty());
    }

    #[test]
    fn opaque_gradient_rows_are_identical() {
        let mut g = gradient();
        g.set_first_color(Lcha::new(20.0, 30.0, 40.0, 1.0));
        g.set_second_color(Lcha::new(80.0, 30.0, 250.0, 1.0));
        g.set_gradient_length(16);
        g.set_gradient_thickness(4);
        let raster = g.image();
        assert_eq!((raster.width(), raster.height()), (16, 4));
        for y in 1..4 {
            for x in 0..16 {
                assert_eq!(raster.pixel(x, y), raster.pixel(x, 0));
                assert_eq!(raster.pixel(x, y)[3], 255);
            }
        }
        // Dark on the left, light on the right.
        assert!(raster.pixel(0, 0)[1] < raster.pixel(15, 0)[1]);
    }

    #[test]
    fn translucent_gradient_shows_checkerboard() {
        let mut g = gradient();
        g.set_first_color(Lcha::new(50.0, 0.0, 0.0, 0.0));
        g.set_second_color(Lcha::new(50.0, 0.0, 0.0, 0.0));
        g.set_checkerboard(Checkerboard {
            square_size: 2,
            light: crate::color::Rgb::WHITE,
            dark: crate::color::Rgb::BLACK,
        });
        g.set_gradient_length(4);
        g.set_gradient_thickness(4);
        let raster = g.image();
        assert_eq!(raster.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(raster.pixel(2, 0), [0, 0, 0, 255]);
        assert_eq!(raster.pixel(2, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn same_color_keeps_cache() {
        let mut g = gradient();
        g.set_gradient_length(4);
        g.set_gradient_thickness(2);
        g.image();
        g.set_first_color(Lcha::from_lch(NEUTRAL_GRAY, 1.0));
        g.set_second_color(Lcha::new(50.0, 0.0, 360.0, 1.0));
        g.set_gradient_length(4);
        g.set_device_pixel_ratio(1.0);
        g.set_device_pixel_ratio(-2.0);
        assert!(g.cached().is_some());

        g.set_second_color(Lcha::new(60.0, 0.0, 0.0, 1.0));
        assert!(g.cached().is_none());
        g.image();
        g.set_gradient_thickness(3);
        assert!(g.cached().is_none());
        g.image();
        g.set_device_pixel_ratio(2.0);
        assert!(g.cached().is_none());
        assert_eq!(g.image().device_pixel_ratio(), 2.0);
    }

    #[test]
    fn fractional_device_pixel_ratio_reaches_the_raster() {
        let mut g = gradient();
        g.set_gradient_length(4);
        g.set_gradient_thickness(2);
        g.set_device_pixel_ratio(0.75);
        assert_eq!(g.device_pixel_ratio(), 0.75);
        assert_eq!(g.image().device_pixel_ratio(), 0.75);
        g.set_device_pixel_ratio(f64::INFINITY);
        assert_eq!(g.device_pixel_ratio(), 1.0);
    }

    proptest! {
        #[test]
        fn altered_hue_is_never_more_than_half_a_turn_away(
            h1 in 0.0f64..360.0, h2 in 0.0f64..360.0,
        ) {
            prop_assert!((h1 - altered_second_hue(h1, h2)).abs() <= 180.0);
        }

        #[test]
        fn endpoints_are_reproduced(
            l1 in 0.0f64..100.0, c1 in 0.0f64..100.0, h1 in 0.0f64..360.0,
            l2 in 0.0f64..100.0, c2 in 0.0f64..100.0, h2 in 0.0f64..360.0,
        ) {
            let mut g = gradient();
            g.set_first_color(Lcha::new(l1, c1, h1, 1.0));
            g.set_second_color(Lcha::new(l2, c2, h2, 1.0));
            let start = g.color_from_value(0.0);
            prop_assert!(start.has_same_coordinates(&g.first_color()));
            let end = g.color_from_value(1.0);
            prop_assert!((end.l - l2).abs() < 1e-9);
            let drift = normalize(end.h - h2);
            prop_assert!(drift < 1e-9 || drift > 360.0 - 1e-9, "drift {}", drift);
            prop_assert!((g.color_from_value(0.5).h - h1).abs() <= 90.0 + 1e-9);
        }
    }
}
