#![deny(unsafe_code)]
//! Core of the perceptual color pickers.
//!
//! Provides the `Lab`/`Lch`/`Lcha`/`Rgb` color types, ICC profile handling
//! and transforms over `moxcms` (`cms`), the `RgbColorSpace` with gamut checks and chroma
//! reduction, and cached rasters for the widgets: gamut slices
//! (`ChromaHueImage`, `ChromaLightnessImage`, `HueWheelImage`) and
//! `GradientImage`.

pub mod cms;
pub mod color;
pub mod color_space;
pub mod error;
pub mod gradient;
pub mod raster;
pub mod slice;

pub use cms::{Direction, Precision, RgbProfile, Transform};
pub use color::{Lab, Lch, Lcha, Rgb, MAXIMUM_CHROMA, NEUTRAL_GRAY, SRGB_VERSATILE_CHROMA};
pub use color_space::{RgbColorSpace, GAMUT_PRECISION};
pub use error::ColorError;
pub use gradient::GradientImage;
pub use raster::{Checkerboard, Raster};
pub use slice::{ChromaHueImage, ChromaLightnessImage, HueWheelImage};
