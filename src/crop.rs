//! Face localization and padded cropping of the winning frame.

use crate::constants::DEFAULT_CROP_PADDING;
use crate::face_location::FaceLocator;
use crate::utils::safe_cast::f64_to_i32_clamp;
use crate::Result;
use opencv::core::{Mat, Rect};
use opencv::prelude::*;

/// Crops a padded region around the primary detected face
pub struct FaceCropper {
    locator: Box<dyn FaceLocator>,
    padding: f64,
}

impl FaceCropper {
    /// Cropper with the default padding fraction
    #[must_use]
    pub fn new(locator: Box<dyn FaceLocator>) -> Self {
        Self::with_padding(locator, DEFAULT_CROP_PADDING)
    }

    /// Cropper with an explicit padding fraction (of the face box dimensions)
    #[must_use]
    pub fn with_padding(locator: Box<dyn FaceLocator>, padding: f64) -> Self {
        Self { locator, padding }
    }

    /// Locate the primary face and return the padded crop around it.
    ///
    /// `Ok(None)` means no face was found or the padded region degenerated;
    /// the caller falls back to the uncropped frame rather than failing the
    /// pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if face localization or the region extraction fails.
    pub fn locate_and_crop(&mut self, frame: &Mat) -> Result<Option<Mat>> {
        let Some(face) = self.locator.primary(frame)? else {
            return Ok(None);
        };

        let Some(region) = padded_region(face, frame.cols(), frame.rows(), self.padding) else {
            log::debug!("padded face region degenerated, keeping the full frame");
            return Ok(None);
        };

        Ok(Some(Mat::roi(frame, region)?.try_clone()?))
    }
}

/// Expand a face box by `padding` times its dimensions and clamp the result
/// to the frame bounds.
///
/// The returned rectangle is always fully contained in
/// `[0, frame_width] x [0, frame_height]` for any padding >= 0; `None` when
/// the clamped region has no area.
#[must_use]
pub fn padded_region(face: Rect, frame_width: i32, frame_height: i32, padding: f64) -> Option<Rect> {
    let pad_x = f64_to_i32_clamp(padding * f64::from(face.width), 0, frame_width);
    let pad_y = f64_to_i32_clamp(padding * f64::from(face.height), 0, frame_height);

    let x1 = (face.x - pad_x).max(0);
    let y1 = (face.y - pad_y).max(0);
    let x2 = (face.x + face.width + pad_x).min(frame_width);
    let y2 = (face.y + face.height + pad_y).min(frame_height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    #[test]
    fn padded_region_stays_inside_the_frame() {
        let boxes = [
            Rect::new(10, 10, 50, 50),
            Rect::new(0, 0, 30, 30),
            Rect::new(150, 100, 60, 40),
            Rect::new(-10, -10, 40, 40),
        ];
        for padding in [0.0, 0.3, 0.7, 2.0, 10.0] {
            for face in boxes {
                let Some(region) = padded_region(face, 200, 150, padding) else {
                    continue;
                };
                assert!(region.x >= 0 && region.y >= 0);
                assert!(region.x + region.width <= 200);
                assert!(region.y + region.height <= 150);
                assert!(region.width > 0 && region.height > 0);
            }
        }
    }

    #[test]
    fn zero_padding_clamps_to_the_face_box() {
        let region = padded_region(Rect::new(10, 20, 30, 40), 200, 150, 0.0).unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (10, 20, 30, 40));
    }

    #[test]
    fn face_outside_the_frame_yields_no_region() {
        assert!(padded_region(Rect::new(300, 300, 20, 20), 200, 150, 0.7).is_none());
    }

    #[test]
    fn cropper_returns_none_without_a_face() {
        struct NoFaces;
        impl FaceLocator for NoFaces {
            fn locate(&mut self, _frame: &Mat) -> Result<Vec<Rect>> {
                Ok(Vec::new())
            }
        }

        let frame = Mat::new_rows_cols_with_default(60, 80, CV_8UC3, Scalar::all(90.0)).unwrap();
        let mut cropper = FaceCropper::new(Box::new(NoFaces));
        assert!(cropper.locate_and_crop(&frame).unwrap().is_none());
    }

    #[test]
    fn cropper_extracts_the_padded_face_region() {
        struct OneFace;
        impl FaceLocator for OneFace {
            fn locate(&mut self, _frame: &Mat) -> Result<Vec<Rect>> {
                Ok(vec![Rect::new(30, 20, 10, 10)])
            }
        }

        let frame = Mat::new_rows_cols_with_default(60, 80, CV_8UC3, Scalar::all(90.0)).unwrap();
        let mut cropper = FaceCropper::with_padding(Box::new(OneFace), 0.5);
        let crop = cropper.locate_and_crop(&frame).unwrap().unwrap();
        // 10x10 box padded by 5 on each side.
        assert_eq!((crop.cols(), crop.rows()), (20, 20));
    }
}
