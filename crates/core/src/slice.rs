//! Cached rasters of cross-sections through the gamut solid.
//!
//! Each image owns a shared [`RgbColorSpace`], a set of parameters and an
//! optional cached [`Raster`]. Setters drop the cache as soon as a value
//! actually changes; the next call to `image()` renders synchronously, one
//! color conversion per pixel.
//!
//! - [`ChromaHueImage`]: the a/b plane at a fixed lightness, masked to a
//!   circle. Only pixels that are exactly in gamut are painted; the rest
//!   stay transparent so the gamut outline is visible.
//! - [`ChromaLightnessImage`]: the chroma/lightness plane at a fixed hue.
//!   Every pixel is painted with the nearest in-gamut color, so the
//!   diagram has no gaps.
//! - [`HueWheelImage`]: a ring of hues at fixed lightness and chroma.

use std::rc::Rc;

use crate::color::{normalize_hue, Lab, Lch, MAXIMUM_CHROMA, NEUTRAL_GRAY, SRGB_VERSATILE_CHROMA};
use crate::color_space::RgbColorSpace;
use crate::raster::{sanitize_ratio, update_parameter, Raster};

fn sanitize_length(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Anti-aliased coverage of a pixel whose centre lies `inside` units inside
/// an edge (negative when outside).
fn edge_coverage(inside: f64) -> f64 {
    (inside + 0.5).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChromaHueParams {
    image_size_physical: usize,
    border_physical: f64,
    device_pixel_ratio: f64,
    lightness: f64,
    chroma_range: f64,
}

/// Circular diagram of the a/b plane at one lightness.
#[derive(Debug)]
pub struct ChromaHueImage {
    color_space: Rc<RgbColorSpace>,
    params: ChromaHueParams,
    cache: Option<Raster>,
}

impl ChromaHueImage {
    /// Starts with an empty size, no border, ratio 1, lightness 50 and the
    /// full chroma range.
    pub fn new(color_space: Rc<RgbColorSpace>) -> Self {
        Self {
            color_space,
            params: ChromaHueParams {
                image_size_physical: 0,
                border_physical: 0.0,
                device_pixel_ratio: 1.0,
                lightness: NEUTRAL_GRAY.l,
                chroma_range: MAXIMUM_CHROMA,
            },
            cache: None,
        }
    }

    /// Diameter of the square image in physical pixels.
    pub fn image_size_physical(&self) -> usize {
        self.params.image_size_physical
    }

    pub fn set_image_size_physical(&mut self, size: usize) {
        update_parameter(&mut self.params.image_size_physical, size, &mut self.cache);
    }

    /// Space reserved around the circle, in physical pixels.
    pub fn border_physical(&self) -> f64 {
        self.params.border_physical
    }

    pub fn set_border_physical(&mut self, border: f64) {
        let border = sanitize_length(border);
        update_parameter(&mut self.params.border_physical, border, &mut self.cache);
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.params.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        let ratio = sanitize_ratio(ratio);
        update_parameter(&mut self.params.device_pixel_ratio, ratio, &mut self.cache);
    }

    pub fn lightness(&self) -> f64 {
        self.params.lightness
    }

    /// Sets the lightness of the slice, clamped to [0, 100].
    pub fn set_lightness(&mut self, lightness: f64) {
        let lightness = lightness.clamp(0.0, 100.0);
        update_parameter(&mut self.params.lightness, lightness, &mut self.cache);
    }

    /// Chroma at the edge of the circle.
    pub fn chroma_range(&self) -> f64 {
        self.params.chroma_range
    }

    /// Sets the chroma shown at the circle's edge, clamped to [0, `MAXIMUM_CHROMA`].
    pub fn set_chroma_range(&mut self, chroma_range: f64) {
        let chroma_range = chroma_range.clamp(0.0, MAXIMUM_CHROMA);
        update_parameter(&mut self.params.chroma_range, chroma_range, &mut self.cache);
    }

    /// The cached raster, if it is current.
    pub fn cached(&self) -> Option<&Raster> {
        self.cache.as_ref()
    }

    /// The raster, rendered first if any parameter changed since last time.
    pub fn image(&mut self) -> &Raster {
        self.cache
            .get_or_insert_with(|| render_chroma_hue(&self.color_space, &self.params))
    }
}

fn render_chroma_hue(color_space: &RgbColorSpace, params: &ChromaHueParams) -> Raster {
    let size = params.image_size_physical;
    let diameter = size as f64 - 2.0 * params.border_physical;
    if size == 0 || diameter <= 0.0 {
        return Raster::empty(params.device_pixel_ratio);
    }
    let Ok(mut raster) = Raster::new(size, size, params.device_pixel_ratio) else {
        return Raster::empty(params.device_pixel_ratio);
    };

    let scale = 2.0 * params.chroma_range / diameter;
    let center = size as f64 / 2.0;
    let radius = diameter / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 + 0.5 - center;
            let dy = center - (y as f64 + 0.5);
            let distance = dx.hypot(dy);
            // Pixels straddling the rim still get painted, then faded.
            if distance > radius + 0.5 {
                continue;
            }
            let lab = Lab {
                l: params.lightness,
                a: dx * scale,
                b: dy * scale,
            };
            if let Some(rgb) = color_space.to_rgb_checked(lab) {
                raster.set_rgb(x, y, rgb);
            }
            let coverage = edge_coverage(radius - distance);
            if coverage < 1.0 {
                raster.scale_alpha(x, y, coverage);
            }
        }
    }
    tracing::debug!(
        size,
        lightness = params.lightness,
        chroma_range = params.chroma_range,
        "rendered chroma-hue image"
    );
    raster
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChromaLightnessParams {
    width: usize,
    height: usize,
    device_pixel_ratio: f64,
    hue: f64,
}

/// Rectangular diagram of chroma (x) against lightness (y) at one hue.
#[derive(Debug)]
pub struct ChromaLightnessImage {
    color_space: Rc<RgbColorSpace>,
    params: ChromaLightnessParams,
    cache: Option<Raster>,
}

impl ChromaLightnessImage {
    pub fn new(color_space: Rc<RgbColorSpace>) -> Self {
        Self {
            color_space,
            params: ChromaLightnessParams {
                width: 0,
                height: 0,
                device_pixel_ratio: 1.0,
                hue: NEUTRAL_GRAY.h,
            },
            cache: None,
        }
    }

    /// `(width, height)` in physical pixels.
    pub fn image_size_physical(&self) -> (usize, usize) {
        (self.params.width, self.params.height)
    }

    pub fn set_image_size_physical(&mut self, width: usize, height: usize) {
        update_parameter(&mut self.params.width, width, &mut self.cache);
        update_parameter(&mut self.params.height, height, &mut self.cache);
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.params.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        let ratio = sanitize_ratio(ratio);
        update_parameter(&mut self.params.device_pixel_ratio, ratio, &mut self.cache);
    }

    pub fn hue(&self) -> f64 {
        self.params.hue
    }

    /// Sets the hue of the slice, wrapped into [0, 360).
    pub fn set_hue(&mut self, hue: f64) {
        let hue = normalize_hue(hue);
        update_parameter(&mut self.params.hue, hue, &mut self.cache);
    }

    pub fn cached(&self) -> Option<&Raster> {
        self.cache.as_ref()
    }

    pub fn image(&mut self) -> &Raster {
        self.cache
            .get_or_insert_with(|| render_chroma_lightness(&self.color_space, &self.params))
    }
}

/// Lightness 100 on the top edge, 0 on the bottom edge; chroma uses the
/// same scale and grows to the right.
fn render_chroma_lightness(color_space: &RgbColorSpace, params: &ChromaLightnessParams) -> Raster {
    let Ok(mut raster) = Raster::new(params.width, params.height, params.device_pixel_ratio)
    else {
        return Raster::empty(params.device_pixel_ratio);
    };
    let scale = 100.0 / params.height as f64;
    for y in 0..params.height {
        let l = 100.0 - (y as f64 + 0.5) * scale;
        for x in 0..params.width {
            let lch = Lch {
                l,
                c: (x as f64 + 0.5) * scale,
                h: params.hue,
            };
            raster.set_rgb(x, y, color_space.to_rgb_bound(lch));
        }
    }
    tracing::debug!(
        width = params.width,
        height = params.height,
        hue = params.hue,
        "rendered chroma-lightness image"
    );
    raster
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HueWheelParams {
    image_size_physical: usize,
    border_physical: f64,
    wheel_thickness_physical: f64,
    device_pixel_ratio: f64,
    lightness: f64,
    chroma: f64,
}

/// Ring of all hues at one lightness and chroma, for a color wheel.
///
/// Hue 0 points right and hue grows counter-clockwise.
#[derive(Debug)]
pub struct HueWheelImage {
    color_space: Rc<RgbColorSpace>,
    params: HueWheelParams,
    cache: Option<Raster>,
}

impl HueWheelImage {
    pub fn new(color_space: Rc<RgbColorSpace>) -> Self {
        Self {
            color_space,
            params: HueWheelParams {
                image_size_physical: 0,
                border_physical: 0.0,
                wheel_thickness_physical: 0.0,
                device_pixel_ratio: 1.0,
                lightness: NEUTRAL_GRAY.l,
                chroma: SRGB_VERSATILE_CHROMA,
            },
            cache: None,
        }
    }

    pub fn image_size_physical(&self) -> usize {
        self.params.image_size_physical
    }

    pub fn set_image_size_physical(&mut self, size: usize) {
        update_parameter(&mut self.params.image_size_physical, size, &mut self.cache);
    }

    pub fn border_physical(&self) -> f64 {
        self.params.border_physical
    }

    pub fn set_border_physical(&mut self, border: f64) {
        let border = sanitize_length(border);
        update_parameter(&mut self.params.border_physical, border, &mut self.cache);
    }

    pub fn wheel_thickness_physical(&self) -> f64 {
        self.params.wheel_thickness_physical
    }

    pub fn set_wheel_thickness_physical(&mut self, thickness: f64) {
        let thickness = sanitize_length(thickness);
        update_parameter(
            &mut self.params.wheel_thickness_physical,
            thickness,
            &mut self.cache,
        );
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.params.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        let ratio = sanitize_ratio(ratio);
        update_parameter(&mut self.params.device_pixel_ratio, ratio, &mut self.cache);
    }

    pub fn lightness(&self) -> f64 {
        self.params.lightness
    }

    pub fn set_lightness(&mut self, lightness: f64) {
        let lightness = lightness.clamp(0.0, 100.0);
        update_parameter(&mut self.params.lightness, lightness, &mut self.cache);
    }

    pub fn chroma(&self) -> f64 {
        self.params.chroma
    }

    pub fn set_chroma(&mut self, chroma: f64) {
        let chroma = chroma.clamp(0.0, MAXIMUM_CHROMA);
        update_parameter(&mut self.params.chroma, chroma, &mut self.cache);
    }

    pub fn cached(&self) -> Option<&Raster> {
        self.cache.as_ref()
    }

    pub fn image(&mut self) -> &Raster {
        self.cache
            .get_or_insert_with(|| render_hue_wheel(&self.color_space, &self.params))
    }
}

fn render_hue_wheel(color_space: &RgbColorSpace, params: &HueWheelParams) -> Raster {
    let size = params.image_size_physical;
    let outer = size as f64 / 2.0 - params.border_physical;
    let inner = outer - params.wheel_thickness_physical;
    if outer <= 0.0 || params.wheel_thickness_physical <= 0.0 {
        return Raster::empty(params.device_pixel_ratio);
    }
    let Ok(mut raster) = Raster::new(size, size, params.device_pixel_ratio) else {
        return Raster::empty(params.device_pixel_ratio);
    };

    let center = size as f64 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 + 0.5 - center;
            let dy = center - (y as f64 + 0.5);
            let distance = dx.hypot(dy);
            let coverage =
                edge_coverage(outer - distance).min(edge_coverage(distance - inner));
            if coverage <= 0.0 {
                continue;
            }
            let hue = normalize_hue(dy.atan2(dx).to_degrees());
            let lch = Lch {
                l: params.lightness,
                c: params.chroma,
                h: hue,
            };
            raster.set_rgb(x, y, color_space.to_rgb_bound(lch));
            if coverage < 1.0 {
                raster.scale_alpha(x, y, coverage);
            }
        }
    }
    tracing::debug!(
        size,
        thickness = params.wheel_thickness_physical,
        "rendered hue wheel image"
    );
    raster
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> Rc<RgbColorSpace> {
        Rc::new(RgbColorSpace::srgb())
    }

    // -- ChromaHueImage --

    #[test]
    fn chroma_hue_zero_size_is_empty() {
        let mut image = ChromaHueImage::new(space());
        assert!(image.image().is_empty());
    }

    #[test]
    fn chroma_hue_border_eating_everything_is_empty() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(10);
        image.set_border_physical(5.0);
        assert!(image.image().is_empty());
    }

    #[test]
    fn chroma_hue_corners_are_transparent_and_center_is_gray() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(21);
        image.set_chroma_range(100.0);
        let raster = image.image();
        assert_eq!(raster.width(), 21);
        assert_eq!(raster.pixel(0, 0)[3], 0);
        assert_eq!(raster.pixel(20, 20)[3], 0);
        let [r, g, b, a] = raster.pixel(10, 10);
        assert_eq!(a, 255);
        assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1, "{r} {g} {b}");
        // Lightness 50 is about sRGB 119.
        assert!(r.abs_diff(119) <= 2, "center {r}");
    }

    #[test]
    fn chroma_hue_out_of_gamut_pixels_stay_transparent() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(41);
        image.set_chroma_range(MAXIMUM_CHROMA);
        let raster = image.image();
        // Right edge of the circle, on the a axis: chroma ~250 at lightness 50.
        assert_eq!(raster.pixel(39, 20)[3], 0);
    }

    #[test]
    fn chroma_hue_lightness_is_clamped() {
        let mut image = ChromaHueImage::new(space());
        image.set_lightness(150.0);
        assert_eq!(image.lightness(), 100.0);
        image.set_chroma_range(-3.0);
        assert_eq!(image.chroma_range(), 0.0);
    }

    #[test]
    fn chroma_hue_cache_discipline() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(8);
        assert!(image.cached().is_none());
        image.image();
        assert!(image.cached().is_some());

        image.set_image_size_physical(8);
        image.set_lightness(50.0);
        image.set_border_physical(0.0);
        image.set_device_pixel_ratio(1.0);
        image.set_chroma_range(MAXIMUM_CHROMA);
        assert!(image.cached().is_some(), "same values must keep the cache");

        image.set_lightness(60.0);
        assert!(image.cached().is_none());
        image.image();
        image.set_device_pixel_ratio(2.0);
        assert!(image.cached().is_none());
        image.image();
        image.set_border_physical(1.0);
        assert!(image.cached().is_none());
        image.image();
        image.set_chroma_range(50.0);
        assert!(image.cached().is_none());
        image.image();
        image.set_image_size_physical(9);
        assert!(image.cached().is_none());
    }

    #[test]
    fn chroma_hue_raster_carries_device_pixel_ratio() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(4);
        image.set_device_pixel_ratio(2.0);
        assert_eq!(image.image().device_pixel_ratio(), 2.0);
    }

    #[test]
    fn chroma_hue_rim_pixels_are_partially_covered() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(21);
        image.set_chroma_range(10.0);
        let raster = image.image();
        // Centre at distance ~10.63 from the middle, the rim is at 10.5.
        let alpha = raster.pixel(18, 3)[3];
        assert!(alpha > 0 && alpha < 255, "rim alpha {alpha}");
        assert!(alpha.abs_diff(94) <= 3, "rim alpha {alpha}");
        assert_eq!(raster.pixel(10, 10)[3], 255);
    }

    #[test]
    fn chroma_hue_border_ring_stays_transparent() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(21);
        image.set_border_physical(4.0);
        image.set_chroma_range(20.0);
        let raster = image.image();
        assert_eq!(raster.width(), 21);
        assert_eq!(raster.pixel(10, 2)[3], 0);
        assert_eq!(raster.pixel(2, 10)[3], 0);
        assert_eq!(raster.pixel(18, 10)[3], 0);
        assert_eq!(raster.pixel(10, 10)[3], 255);
    }

    #[test]
    fn chroma_hue_positive_b_is_up() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(21);
        image.set_chroma_range(40.0);
        let raster = image.image();
        // b ~ +34 near the top, ~ -34 near the bottom.
        let [r, g, b, a] = raster.pixel(10, 1);
        assert_eq!(a, 255);
        assert!(r > b && g > b, "top should be yellowish: {r} {g} {b}");
        let [r, g, b, a] = raster.pixel(10, 19);
        assert_eq!(a, 255);
        assert!(b > r && b > g, "bottom should be bluish: {r} {g} {b}");
    }

    #[test]
    fn fractional_device_pixel_ratio_is_kept() {
        let mut image = ChromaHueImage::new(space());
        image.set_image_size_physical(4);
        image.set_device_pixel_ratio(0.75);
        assert_eq!(image.device_pixel_ratio(), 0.75);
        assert_eq!(image.image().device_pixel_ratio(), 0.75);
        image.set_device_pixel_ratio(0.0);
        assert_eq!(image.device_pixel_ratio(), 1.0);
        image.set_device_pixel_ratio(f64::NAN);
        assert_eq!(image.device_pixel_ratio(), 1.0);
    }

    // -- ChromaLightnessImage --

    #[test]
    fn chroma_lightness_every_pixel_is_opaque() {
        let mut image = ChromaLightnessImage::new(space());
        image.set_image_size_physical(12, 10);
        image.set_hue(140.0);
        let raster = image.image();
        assert_eq!((raster.width(), raster.height()), (12, 10));
        for y in 0..10 {
            for x in 0..12 {
                assert_eq!(raster.pixel(x, y)[3], 255, "({x}, {y})");
            }
        }
    }

    #[test]
    fn chroma_lightness_top_is_light_bottom_is_dark() {
        let mut image = ChromaLightnessImage::new(space());
        image.set_image_size_physical(4, 20);
        let raster = image.image();
        let top = raster.pixel(0, 0);
        let bottom = raster.pixel(0, 19);
        assert!(top[1] > 240, "top {top:?}");
        assert!(bottom[1] < 20, "bottom {bottom:?}");
    }

    #[test]
    fn chroma_lightness_degenerate_size_is_empty() {
        let mut image = ChromaLightnessImage::new(space());
        image.set_image_size_physical(10, 0);
        assert!(image.image().is_empty());
    }

    #[test]
    fn chroma_lightness_hue_wraps_and_caches() {
        let mut image = ChromaLightnessImage::new(space());
        image.set_image_size_physical(3, 3);
        image.set_hue(370.0);
        assert_eq!(image.hue(), 10.0);
        image.image();
        image.set_hue(10.0);
        assert!(image.cached().is_some());
        image.set_hue(20.0);
        assert!(image.cached().is_none());
        image.image();
        image.set_image_size_physical(3, 4);
        assert!(image.cached().is_none());
    }

    // -- HueWheelImage --

    #[test]
    fn hue_wheel_center_and_corners_are_transparent() {
        let mut image = HueWheelImage::new(space());
        image.set_image_size_physical(40);
        image.set_wheel_thickness_physical(6.0);
        let raster = image.image();
        assert_eq!(raster.pixel(20, 20)[3], 0);
        assert_eq!(raster.pixel(0, 0)[3], 0);
        // Inside the ring on the right: hue 0, reddish.
        let [r, g, _, a] = raster.pixel(37, 20);
        assert_eq!(a, 255);
        assert!(r > g, "expected reddish pixel, got r={r} g={g}");
    }

    #[test]
    fn hue_wheel_without_thickness_is_empty() {
        let mut image = HueWheelImage::new(space());
        image.set_image_size_physical(40);
        assert!(image.image().is_empty());
    }

    #[test]
    fn hue_wheel_setters_invalidate() {
        let mut image = HueWheelImage::new(space());
        image.set_image_size_physical(16);
        image.set_wheel_thickness_physical(3.0);
        image.image();
        image.set_chroma(SRGB_VERSATILE_CHROMA);
        assert!(image.cached().is_some());
        image.set_chroma(20.0);
        assert!(image.cached().is_none());
        image.image();
        image.set_lightness(70.0);
        assert!(image.cached().is_none());
    }
}
