//! Pure-computation conversion from premultiplied to straight RGBA8.
//!
//! Always available (no feature gate) so that consumers that hand pixels to
//! their own encoder share the same conversion as the `png` path.

use perceptual_color_core::Raster;

/// Un-premultiplies one pixel. Fully transparent pixels become all zeros.
pub fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let alpha = a as f64;
    let channel = |c: u8| ((c as f64 * 255.0 / alpha).round()).min(255.0) as u8;
    [channel(r), channel(g), channel(b), a]
}

/// Straight-alpha RGBA8 bytes of a raster, row-major.
///
/// The buffer length is `width * height * 4`; an empty raster gives an
/// empty buffer.
pub fn raster_to_rgba(raster: &Raster) -> Vec<u8> {
    raster
        .data()
        .chunks_exact(4)
        .flat_map(|px| unpremultiply([px[0], px[1], px[2], px[3]]))
        .collect()
}
