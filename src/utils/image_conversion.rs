//! Image conversion utilities between OpenCV Mat and `image` buffers.
//!
//! OpenCV stores colour frames as BGR; `image` buffers are RGB. Conversions
//! that cross that boundary swap the channel order.

use crate::depth::DepthImage;
use crate::frame::CapturedImage;
use crate::utils::safe_cast::{dim_from_i32, dim_to_i32};
use crate::{Error, Result};
use image::{GrayImage, RgbImage};
use opencv::core::{Mat, MatTraitConst, Scalar, CV_32FC1, CV_8UC1, CV_8UC3};
use opencv::prelude::MatTrait;

/// Convert a captured 8-bit Mat (BGR or single channel) into a frame
///
/// # Errors
/// * Returns error if the Mat is empty or not 8-bit with 1, 3 or 4 channels
pub fn mat_to_captured(mat: &Mat) -> Result<CapturedImage> {
    let width = dim_from_i32(mat.cols())?;
    let height = dim_from_i32(mat.rows())?;
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput("Empty Mat".to_string()));
    }

    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };
    let bytes = mat.data_bytes()?;

    let image = match mat.typ() {
        t if t == CV_8UC1 => GrayImage::from_raw(width, height, bytes.to_vec()).map(CapturedImage::Gray),
        t if t == CV_8UC3 => {
            let rgb: Vec<u8> = bytes.chunks_exact(3).flat_map(|bgr| [bgr[2], bgr[1], bgr[0]]).collect();
            RgbImage::from_raw(width, height, rgb).map(CapturedImage::Color)
        }
        t if t == opencv::core::CV_8UC4 => {
            let rgb: Vec<u8> = bytes.chunks_exact(4).flat_map(|bgra| [bgra[2], bgra[1], bgra[0]]).collect();
            RgbImage::from_raw(width, height, rgb).map(CapturedImage::Color)
        }
        other => {
            return Err(Error::InvalidInput(format!("Unsupported Mat type: {}", other)));
        }
    };

    image.ok_or_else(|| Error::InvalidInput(format!("Mat data does not fit {}x{}", width, height)))
}

/// Copy an RGB image into a Mat, optionally swapping to BGR order
///
/// # Errors
/// * Returns error if the image is too large or the Mat cannot be allocated
pub fn rgb_to_mat(image: &RgbImage, to_bgr: bool) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        dim_to_i32(image.height())?,
        dim_to_i32(image.width())?,
        CV_8UC3,
        Scalar::default(),
    )?;

    let dst = mat.data_bytes_mut()?;
    if to_bgr {
        for (out, rgb) in dst.chunks_exact_mut(3).zip(image.as_raw().chunks_exact(3)) {
            out.copy_from_slice(&[rgb[2], rgb[1], rgb[0]]);
        }
    } else {
        dst.copy_from_slice(image.as_raw());
    }

    Ok(mat)
}

/// Copy the bytes of an RGB-ordered 8-bit Mat back into an image of the same size
///
/// # Errors
/// * Returns error if the Mat does not match the image
pub fn copy_mat_into(mat: &Mat, image: &mut RgbImage) -> Result<()> {
    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };
    let bytes = mat.data_bytes()?;
    if mat.typ() != CV_8UC3 || bytes.len() != image.as_raw().len() {
        return Err(Error::InvalidInput(format!(
            "Mat of type {} and {} bytes does not match a {}x{} RGB image",
            mat.typ(),
            bytes.len(),
            image.width(),
            image.height()
        )));
    }
    image.copy_from_slice(bytes);
    Ok(())
}

/// Copy a floating point depth map into a single channel Mat
///
/// # Errors
/// * Returns error if the depth map is too large or the Mat cannot be allocated
pub fn depth_to_mat(depth: &DepthImage) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        dim_to_i32(depth.height())?,
        dim_to_i32(depth.width())?,
        CV_32FC1,
        Scalar::default(),
    )?;

    let dst = mat.data_typed_mut::<f32>()?;
    dst.copy_from_slice(depth.as_raw());

    Ok(mat)
}
