//! Error types for the perceptual color core.

use thiserror::Error;

use crate::cms::Direction;

/// Errors produced while building color spaces or handling color buffers.
///
/// Out-of-gamut colors are never reported through this type; they are
/// resolved by the bound conversions of [`RgbColorSpace`](crate::RgbColorSpace).
#[derive(Debug, Error)]
pub enum ColorError {
    /// A profile could not be turned into a usable transform.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// A built-in profile name was not recognized.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// ICC profile bytes could not be parsed.
    #[error("profile parse error: {0}")]
    ProfileParse(String),

    /// Reading a profile from disk failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Source and destination buffers of a transform do not match, or are
    /// not made of whole color triples.
    #[error("buffer length {len} is not a matching multiple of 3")]
    BufferLength { len: usize },

    /// A typed buffer was handed to a transform going the other way.
    #[error("transform converts {actual:?}, called as {expected:?}")]
    DirectionMismatch {
        expected: Direction,
        actual: Direction,
    },

    /// The color engine failed while converting a buffer.
    #[error("color engine error: {0}")]
    Engine(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Width or height was zero or overflowed when building a raster.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,
}
