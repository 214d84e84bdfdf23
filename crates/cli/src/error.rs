//! Failures of the `perceptual-color` binary and their exit codes.
//!
//! A run fails at one of four stages, each with its own code so scripts can
//! tell a bad `--profile` from a bad argument without parsing stderr:
//!
//! | code | stage |
//! |------|-------|
//! | 2    | argument parsing (clap exits on its own) |
//! | 10   | building the color space from `--profile` |
//! | 11   | reading a profile file or writing a PNG |
//! | 12   | a color string or image geometry that cannot be used |
//! | 13   | encoding the `--json` report |

use perceptual_color_core::ColorError;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// The profile was found but is unusable, or the name is unknown.
    Color(ColorError),
    Io(String),
    /// Arguments that parsed but describe nothing drawable or convertible.
    Input(String),
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Color(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Color(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) => f.write_str(msg),
            CliError::Serialization(msg) => write!(f, "cannot encode report: {msg}"),
        }
    }
}

/// Core errors are sorted by who has to act: file problems go to the I/O
/// code, color strings and empty geometry are the caller's input, and the
/// rest concern the profile.
impl From<ColorError> for CliError {
    fn from(e: ColorError) -> Self {
        match e {
            ColorError::Io(msg) => CliError::Io(msg),
            ColorError::InvalidColor(msg) => CliError::Input(format!("invalid color: {msg}")),
            ColorError::InvalidDimensions => CliError::Input(e.to_string()),
            other => CliError::Color(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
