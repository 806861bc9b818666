//! Tensor conversion for ONNX model preprocessing.
//!
//! All three models in this crate consume an 8-bit RGB image as a batched
//! float tensor; callers resize and color-convert first, then pick the
//! layout their model expects. Each pixel is mapped as
//! `(value + offset) * scale`.

use crate::utils::safe_cast::usize_to_i32;
use crate::{Error, Result};
use ndarray::Array4;
use opencv::core::{Mat, Vec3b};
use opencv::prelude::*;

/// Convert an 8-bit 3-channel Mat to a `[1, H, W, 3]` float tensor
///
/// # Errors
///
/// Returns an error if the Mat is not 3-channel or pixel access fails
pub fn mat_to_nhwc_f32(mat: &Mat, scale: f32, offset: f32) -> Result<Array4<f32>> {
    let (height, width) = checked_dims(mat)?;

    let mut data = vec![0.0f32; height * width * 3];
    for row in 0..height {
        for col in 0..width {
            let pixel = mat.at_2d::<Vec3b>(usize_to_i32(row)?, usize_to_i32(col)?)?;
            let base = (row * width + col) * 3;
            for ch in 0..3 {
                data[base + ch] = (f32::from(pixel[ch]) + offset) * scale;
            }
        }
    }

    Array4::from_shape_vec((1, height, width, 3), data)
        .map_err(|e| Error::ModelDataFormatError(format!("Failed to create NHWC array: {e}")))
}

/// Convert an 8-bit 3-channel Mat to a `[1, 3, H, W]` float tensor
///
/// # Errors
///
/// Returns an error if the Mat is not 3-channel or pixel access fails
pub fn mat_to_nchw_f32(mat: &Mat, scale: f32, offset: f32) -> Result<Array4<f32>> {
    let (height, width) = checked_dims(mat)?;

    let plane = height * width;
    let mut data = vec![0.0f32; plane * 3];
    for row in 0..height {
        for col in 0..width {
            let pixel = mat.at_2d::<Vec3b>(usize_to_i32(row)?, usize_to_i32(col)?)?;
            for ch in 0..3 {
                data[ch * plane + row * width + col] = (f32::from(pixel[ch]) + offset) * scale;
            }
        }
    }

    Array4::from_shape_vec((1, 3, height, width), data)
        .map_err(|e| Error::ModelDataFormatError(format!("Failed to create NCHW array: {e}")))
}

#[allow(clippy::cast_sign_loss)] // OpenCV dimensions are non-negative once checked
fn checked_dims(mat: &Mat) -> Result<(usize, usize)> {
    let rows = mat.rows();
    let cols = mat.cols();
    if rows <= 0 || cols <= 0 || mat.channels() != 3 {
        return Err(Error::InvalidInput(format!(
            "expected a non-empty 3-channel image, got {}x{}x{}",
            rows,
            cols,
            mat.channels()
        )));
    }
    Ok((rows as usize, cols as usize))
}
