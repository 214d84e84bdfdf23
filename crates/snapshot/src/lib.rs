#![deny(unsafe_code)]
//! Export of perceptual color rasters.
//!
//! `perceptual-color-core` keeps its rasters premultiplied, the way a
//! compositor wants them. This crate turns them into the straight-alpha
//! bytes that image files expect and writes PNG snapshots. Both the CLI and
//! tests depend on it so the conversion lives in one place.

pub mod pixel;

#[cfg(feature = "png")]
pub mod png;

pub use pixel::raster_to_rgba;

#[cfg(feature = "png")]
pub use png::write_png;
