//! Checked conversions between image, `OpenCV` and telemetry number types

use crate::{Error, Result};

/// Convert an image dimension to the signed form `OpenCV` expects
///
/// # Errors
///
/// Returns an error if the value exceeds i32::MAX
pub fn dim_to_i32(value: u32) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Dimension {value} too large to fit in i32")))
}

/// Convert a signed matrix dimension back to an image dimension
///
/// # Errors
///
/// Returns an error if the value is negative
pub fn dim_from_i32(value: i32) -> Result<u32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Negative dimension {value}")))
}

/// Convert a frame index to the 64-bit signed integer OSC carries
#[must_use]
pub fn frame_index_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Clamp and convert f64 to i32 for pixel coordinates and labels
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

/// Map a [0, 1] intensity onto a colour channel value
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to [0, 255]
pub fn unit_to_u8(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
