//! Frame quality metrics: brightness, contrast and sharpness.
//!
//! All three metrics are side-effect free and tolerate malformed frames: a
//! frame with the wrong channel count, an empty buffer or a decode failure
//! yields `None` instead of an error, so a scan can skip the frame and keep
//! going.

use crate::constants::{BRIGHTNESS_WEIGHT, CONTRAST_WEIGHT, SHARPNESS_WEIGHT};
use crate::Result;
use opencv::core::{self, Mat, CV_64F};
use opencv::imgproc;
use opencv::prelude::*;

/// Mean of the value channel in HSV color space.
///
/// Returns `None` if the frame is malformed or the conversion fails.
#[must_use]
pub fn brightness(frame: &Mat) -> Option<f64> {
    if !is_well_formed(frame) {
        return None;
    }
    brightness_of(frame).ok()
}

/// Population standard deviation of the single-channel luminance image.
///
/// Returns `None` if the frame is malformed or the conversion fails.
#[must_use]
pub fn contrast(frame: &Mat) -> Option<f64> {
    if !is_well_formed(frame) {
        return None;
    }
    contrast_of(frame).ok()
}

/// Variance of the Laplacian-filtered luminance image.
///
/// Higher values mean more high-frequency detail, i.e. less blur. Returns
/// `None` if the frame is malformed or filtering fails.
#[must_use]
pub fn sharpness(frame: &Mat) -> Option<f64> {
    if !is_well_formed(frame) {
        return None;
    }
    sharpness_of(frame).ok()
}

/// A frame is scoreable only as a 3-channel BGR buffer with pixels in it.
fn is_well_formed(frame: &Mat) -> bool {
    !frame.empty() && frame.channels() == 3
}

fn brightness_of(frame: &Mat) -> Result<f64> {
    let mut hsv = Mat::default();
    imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

    let mut value = Mat::default();
    core::extract_channel(&hsv, &mut value, 2)?;

    let mean = core::mean(&value, &core::no_array())?;
    Ok(mean[0])
}

fn contrast_of(frame: &Mat) -> Result<f64> {
    let gray = luminance(frame)?;
    let (_, stddev) = mean_stddev(&gray)?;
    Ok(stddev)
}

fn sharpness_of(frame: &Mat) -> Result<f64> {
    let gray = luminance(frame)?;

    let mut response = Mat::default();
    imgproc::laplacian(&gray, &mut response, CV_64F, 1, 1.0, 0.0, core::BORDER_DEFAULT)?;

    let (_, stddev) = mean_stddev(&response)?;
    Ok(stddev * stddev)
}

fn luminance(frame: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
    Ok(gray)
}

fn mean_stddev(mat: &Mat) -> Result<(f64, f64)> {
    let mut mean = Mat::default();
    let mut stddev = Mat::default();
    core::mean_std_dev(mat, &mut mean, &mut stddev, &core::no_array())?;
    Ok((*mean.at::<f64>(0)?, *stddev.at::<f64>(0)?))
}

/// Weights combining the three metrics into a single frame score.
///
/// The units are deliberately heterogeneous (sharpness is an unbounded
/// Laplacian variance, contrast and brightness live in 0-255); the weighted
/// sum is a ranking heuristic, not a calibrated model, and no cross-frame
/// normalization is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Weight applied to [`sharpness`]
    pub sharpness: f64,
    /// Weight applied to [`contrast`]
    pub contrast: f64,
    /// Weight applied to [`brightness`]
    pub brightness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            sharpness: SHARPNESS_WEIGHT,
            contrast: CONTRAST_WEIGHT,
            brightness: BRIGHTNESS_WEIGHT,
        }
    }
}

impl ScoreWeights {
    /// Weighted score of a frame, or `None` if any metric is unavailable.
    #[must_use]
    pub fn score(&self, frame: &Mat) -> Option<f64> {
        let sharpness = sharpness(frame)?;
        let contrast = contrast(frame)?;
        let brightness = brightness(frame)?;
        Some(self.sharpness * sharpness + self.contrast * contrast + self.brightness * brightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1, CV_8UC3};

    fn uniform(value: f64) -> Mat {
        Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::new(value, value, value, 0.0))
            .expect("failed to create test frame")
    }

    #[test]
    fn uniform_frame_has_zero_contrast() {
        let frame = uniform(127.0);
        let contrast = contrast(&frame).expect("contrast unavailable");
        assert!(contrast.abs() < 1e-9, "expected 0 contrast, got {contrast}");
    }

    #[test]
    fn flat_frames_have_zero_sharpness() {
        for value in [0.0, 255.0] {
            let frame = uniform(value);
            let sharpness = sharpness(&frame).expect("sharpness unavailable");
            assert!(sharpness.abs() < 1e-9, "expected 0 sharpness, got {sharpness}");
        }
    }

    #[test]
    fn brightness_is_value_channel_mean() {
        // For a gray pixel HSV value == the gray level.
        let frame = uniform(100.0);
        let brightness = brightness(&frame).expect("brightness unavailable");
        assert!((brightness - 100.0).abs() < 1e-6);
    }

    #[test]
    fn brightness_increases_with_value_channel() {
        let dim = brightness(&uniform(60.0)).expect("brightness unavailable");
        let bright = brightness(&uniform(180.0)).expect("brightness unavailable");
        assert!(bright > dim);
    }

    #[test]
    fn malformed_frames_are_unavailable() {
        let empty = Mat::default();
        assert_eq!(brightness(&empty), None);
        assert_eq!(contrast(&empty), None);
        assert_eq!(sharpness(&empty), None);

        let gray = Mat::new_rows_cols_with_default(8, 8, CV_8UC1, Scalar::all(0.0))
            .expect("failed to create test frame");
        assert_eq!(brightness(&gray), None);
        assert_eq!(contrast(&gray), None);
        assert_eq!(sharpness(&gray), None);
    }

    #[test]
    fn score_combines_weighted_metrics() {
        // A flat frame contributes only through the brightness term.
        let frame = uniform(100.0);
        let score = ScoreWeights::default().score(&frame).expect("score unavailable");
        assert!((score - 0.2 * 100.0).abs() < 1e-6);
    }

    #[test]
    fn score_of_malformed_frame_is_unavailable() {
        assert_eq!(ScoreWeights::default().score(&Mat::default()), None);
    }
}
