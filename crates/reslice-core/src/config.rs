// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-slice configuration and its string-attribute encoding.
//!
//! Internally a slice's configuration is a typed [`SliceConfig`]. The scene
//! persists it as string attributes on the slice node; parsing and
//! formatting happen only here.

use thiserror::Error;
use tracing::warn;

use crate::mode::SliceMode;

/// Attribute holding the driver node id.
pub const DRIVER_ATTRIBUTE: &str = "VolumeResliceDriver.Driver";
/// Attribute holding the integer mode code.
pub const MODE_ATTRIBUTE: &str = "VolumeResliceDriver.Mode";
/// Attribute holding the in-plane rotation in degrees.
pub const ROTATION_ATTRIBUTE: &str = "VolumeResliceDriver.Rotation";
/// Attribute holding the flip flag.
pub const FLIP_ATTRIBUTE: &str = "VolumeResliceDriver.Flip";

/// Display configuration of one slice.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SliceConfig {
    /// Orientation convention relative to the driver.
    pub mode: SliceMode,
    /// Extra in-plane rotation, degrees.
    pub rotation_deg: f64,
    /// Mirror the slice (adds 180° about the flip axis).
    pub flip: bool,
}

/// Failure to parse a persisted attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// Mode attribute is not an integer.
    #[error("invalid mode attribute: {0:?}")]
    InvalidMode(String),
    /// Mode attribute is an integer that names no mode.
    #[error("unknown mode code: {0}")]
    UnknownMode(i64),
    /// Rotation attribute is not a finite number.
    #[error("invalid rotation attribute: {0:?}")]
    InvalidRotation(String),
    /// Flip attribute is neither boolean nor integer.
    #[error("invalid flip attribute: {0:?}")]
    InvalidFlip(String),
}

/// Parses a mode attribute (`"0"`..`"6"`).
pub fn parse_mode(value: &str) -> Result<SliceMode, AttributeError> {
    let code: i64 = value
        .trim()
        .parse()
        .map_err(|_| AttributeError::InvalidMode(value.to_string()))?;
    SliceMode::from_code(code).ok_or(AttributeError::UnknownMode(code))
}

/// Parses a rotation attribute (decimal degrees).
pub fn parse_rotation(value: &str) -> Result<f64, AttributeError> {
    match value.trim().parse::<f64>() {
        Ok(deg) if deg.is_finite() => Ok(deg),
        _ => Err(AttributeError::InvalidRotation(value.to_string())),
    }
}

/// Parses a flip attribute: `1`/`0`, any integer (non-zero is set), or
/// `true`/`false`.
pub fn parse_flip(value: &str) -> Result<bool, AttributeError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    trimmed
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| AttributeError::InvalidFlip(value.to_string()))
}

/// Formats a mode attribute.
pub fn format_mode(mode: SliceMode) -> String {
    mode.code().to_string()
}

/// Formats a rotation attribute.
pub fn format_rotation(deg: f64) -> String {
    deg.to_string()
}

/// Formats a flip attribute.
pub fn format_flip(flip: bool) -> String {
    if flip { "1" } else { "0" }.to_string()
}

impl SliceConfig {
    /// Reads a configuration from raw attribute values.
    ///
    /// Absent attributes take their defaults. Malformed ones are logged and
    /// also take their defaults; an unknown mode code reads as
    /// [`SliceMode::None`].
    pub fn from_attributes(
        mode: Option<&str>,
        rotation: Option<&str>,
        flip: Option<&str>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            mode: mode.map_or(defaults.mode, |raw| {
                lenient(parse_mode(raw), defaults.mode, MODE_ATTRIBUTE)
            }),
            rotation_deg: rotation.map_or(defaults.rotation_deg, |raw| {
                lenient(parse_rotation(raw), defaults.rotation_deg, ROTATION_ATTRIBUTE)
            }),
            flip: flip.map_or(defaults.flip, |raw| {
                lenient(parse_flip(raw), defaults.flip, FLIP_ATTRIBUTE)
            }),
        }
    }

    /// Attribute key/value pairs for this configuration.
    pub fn to_attributes(&self) -> [(&'static str, String); 3] {
        [
            (MODE_ATTRIBUTE, format_mode(self.mode)),
            (ROTATION_ATTRIBUTE, format_rotation(self.rotation_deg)),
            (FLIP_ATTRIBUTE, format_flip(self.flip)),
        ]
    }
}

fn lenient<T>(parsed: Result<T, AttributeError>, default: T, key: &str) -> T {
    match parsed {
        Ok(value) => value,
        Err(err) => {
            warn!(attribute = key, %err, "ignoring malformed slice attribute");
            default
        }
    }
}
