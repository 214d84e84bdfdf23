//! RGBA8 pixel buffer handed to the rendering surface.
//!
//! A `Raster` stores `width * height` pixels as premultiplied RGBA bytes in
//! row-major layout, together with the device pixel ratio the consumer
//! needs to draw it at the right logical size.

use crate::color::Rgb;
use crate::error::ColorError;

/// Transparency background drawn under translucent colors.
///
/// Injected by the consumer so that style-dependent colors and sizes stay
/// outside the core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkerboard {
    /// Edge length of one square in physical pixels.
    pub square_size: usize,
    pub light: Rgb,
    pub dark: Rgb,
}

impl Default for Checkerboard {
    fn default() -> Self {
        Self {
            square_size: 8,
            light: Rgb::from_rgb8([0xcc, 0xcc, 0xcc]),
            dark: Rgb::from_rgb8([0x88, 0x88, 0x88]),
        }
    }
}

impl Checkerboard {
    /// Color of the square covering physical pixel `(x, y)`.
    pub fn color_at(&self, x: usize, y: usize) -> Rgb {
        let size = self.square_size.max(1);
        if (x / size + y / size) % 2 == 0 {
            self.light
        } else {
            self.dark
        }
    }
}

/// Premultiplied RGBA8 image with a device pixel ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    device_pixel_ratio: f64,
    data: Vec<u8>,
}

impl Raster {
    /// Creates a fully transparent raster.
    ///
    /// Returns `ColorError::InvalidDimensions` if either dimension is zero
    /// or if the byte count overflows `usize`.
    pub fn new(width: usize, height: usize, device_pixel_ratio: f64) -> Result<Self, ColorError> {
        if width == 0 || height == 0 {
            return Err(ColorError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(ColorError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            device_pixel_ratio,
            data: vec![0; len],
        })
    }

    /// A raster without pixels, returned for degenerate geometry.
    pub fn empty(device_pixel_ratio: f64) -> Self {
        Self {
            width: 0,
            height: 0,
            device_pixel_ratio,
            data: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Width in physical pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in physical pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Row-major premultiplied RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        (y * self.width + x) * 4
    }

    /// Premultiplied RGBA at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Writes an opaque color.
    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: Rgb) {
        let [r, g, b] = rgb.to_rgb8();
        self.set_pixel(x, y, [r, g, b, 255]);
    }

    /// Multiplies the pixel by `coverage` in [0, 1]. Used for anti-aliased masks.
    pub fn scale_alpha(&mut self, x: usize, y: usize, coverage: f64) {
        let coverage = coverage.clamp(0.0, 1.0);
        let i = self.index(x, y);
        for channel in &mut self.data[i..i + 4] {
            *channel = (*channel as f64 * coverage).round() as u8;
        }
    }

    /// Composites `rgb` with opacity `alpha` over the pixel (source-over).
    pub fn blend_over(&mut self, x: usize, y: usize, rgb: Rgb, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        let source = rgb.clamped();
        let i = self.index(x, y);
        let source = [source.r * alpha, source.g * alpha, source.b * alpha, alpha];
        for (channel, src) in self.data[i..i + 4].iter_mut().zip(source) {
            let dst = *channel as f64 / 255.0;
            *channel = ((src + dst * (1.0 - alpha)) * 255.0).round() as u8;
        }
    }

    /// Paints the whole raster with an opaque checkerboard.
    pub fn fill_checkerboard(&mut self, checkerboard: &Checkerboard) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_rgb(x, y, checkerboard.color_at(x, y));
            }
        }
    }

    /// Copies row `from` over row `to`.
    pub fn copy_row(&mut self, from: usize, to: usize) {
        let stride = self.width * 4;
        self.data
            .copy_within(from * stride..(from + 1) * stride, to * stride);
    }
}

/// Device pixel ratio as stored by the images: any finite positive value is
/// kept, anything else falls back to 1.
pub(crate) fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Stores `value` in `slot` and drops the cached raster, unless nothing changed.
///
/// Returns whether the parameter changed.
pub(crate) fn update_parameter<T: PartialEq>(
    slot: &mut T,
    value: T,
    cache: &mut Option<Raster>,
) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    if cache.take().is_some() {
        tracing::trace!("dropped cached raster");
    }
    true
}
