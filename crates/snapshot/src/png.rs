//! PNG snapshots of a [`Raster`].
//!
//! Feature-gated behind `png` (default on) so that consumers that only need
//! [`crate::pixel`] do not pull in the `image` crate.

use perceptual_color_core::{ColorError, Raster};
use std::path::Path;

use crate::pixel::raster_to_rgba;

/// Writes a raster as a straight-alpha RGBA PNG.
///
/// Returns `ColorError::InvalidDimensions` for an empty raster or one whose
/// dimensions overflow `u32`, and `ColorError::Io` on write failure.
pub fn write_png(raster: &Raster, path: &Path) -> Result<(), ColorError> {
    if raster.is_empty() {
        return Err(ColorError::InvalidDimensions);
    }
    let w = u32::try_from(raster.width()).map_err(|_| ColorError::InvalidDimensions)?;
    let h = u32::try_from(raster.height()).map_err(|_| ColorError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, raster_to_rgba(raster))
        .ok_or_else(|| ColorError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| ColorError::Io(e.to_string()))?;
    tracing::debug!(width = w, height = h, path = %path.display(), "wrote png snapshot");
    Ok(())
}
