//! Sparse landmark strategy: face box detection plus a fixed 68-point
//! landmark template fitted to the primary face.

use crate::constants::NUM_SPARSE_LANDMARKS;
use crate::detector::{FaceScan, LandmarkDetector, LandmarkSchema, LandmarkSet};
use crate::face_location::{FaceLocator, OnnxFaceLocator};
use crate::utils::image_conversion::mat_to_nhwc_f32;
use crate::{detector, Error, Result};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Point2f, Rect, Size};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Landmark regressor input size (square)
const REGRESSOR_INPUT_SIZE: i32 = 128;

/// 68-point facial landmark regressor over a face crop, using ONNX Runtime
pub struct LandmarkRegressor {
    session: Session,
    input_size: i32,
}

impl LandmarkRegressor {
    /// Create a landmark regressor from an ONNX model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model file cannot be loaded or the ONNX
    /// runtime environment cannot be created.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        log::info!(
            "Initializing LandmarkRegressor with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("landmark_regressor")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.outputs.is_empty() {
            return Err(Error::ModelOutputError("Model has no outputs".to_string()));
        }

        Ok(Self {
            session,
            input_size: REGRESSOR_INPUT_SIZE,
        })
    }

    /// Fit the 68-point template to a face crop, in crop pixel coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails, or the output
    /// does not hold 68 points.
    pub fn fit(&self, face_crop: &Mat) -> Result<Vec<Point2f>> {
        let inputs = self.preprocess(face_crop)?;
        let raw = self.forward(inputs)?;

        if raw.len() < NUM_SPARSE_LANDMARKS * 2 {
            return Err(Error::ModelDataFormatError(format!(
                "Landmark output holds {} values, expected {}",
                raw.len(),
                NUM_SPARSE_LANDMARKS * 2
            )));
        }

        // Marks are in model input pixels; scale to the crop size.
        let scale_x = face_crop.cols() as f32 / self.input_size as f32;
        let scale_y = face_crop.rows() as f32 / self.input_size as f32;
        Ok(raw
            .chunks_exact(2)
            .take(NUM_SPARSE_LANDMARKS)
            .map(|pair| Point2f::new(pair[0] * scale_x, pair[1] * scale_y))
            .collect())
    }

    fn preprocess(&self, face_crop: &Mat) -> Result<Array4<f32>> {
        let mut resized = Mat::default();
        imgproc::resize(
            face_crop,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        mat_to_nhwc_f32(&rgb, 1.0 / 255.0, 0.0)
    }

    fn forward(&self, inputs: Array4<f32>) -> Result<Vec<f32>> {
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let marks_tensor = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?
            .try_extract::<f32>()?;
        let marks_view = marks_tensor.view();
        let marks = marks_view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get output data".to_string()))?;

        Ok(marks.to_vec())
    }
}

/// Sparse strategy: a general frontal-face locator feeding the 68-point
/// regressor. Landmarks are reported in frame pixel coordinates.
pub struct SparseLandmarkDetector {
    locator: Box<dyn FaceLocator>,
    regressor: LandmarkRegressor,
    schema: LandmarkSchema,
}

impl SparseLandmarkDetector {
    /// Create the sparse detector from its two ONNX model files
    ///
    /// # Errors
    ///
    /// Returns an error if either model fails to load.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        detector_model: P,
        landmarks_model: Q,
    ) -> Result<Self> {
        let locator = OnnxFaceLocator::new(detector_model)?;
        let regressor = LandmarkRegressor::new(landmarks_model)?;
        Ok(Self::from_parts(Box::new(locator), regressor, detector::sparse_schema()))
    }

    /// Assemble the sparse detector from an existing locator and regressor
    #[must_use]
    pub fn from_parts(
        locator: Box<dyn FaceLocator>,
        regressor: LandmarkRegressor,
        schema: LandmarkSchema,
    ) -> Self {
        Self {
            locator,
            regressor,
            schema,
        }
    }
}

impl LandmarkDetector for SparseLandmarkDetector {
    fn detect(&mut self, frame: &Mat) -> Result<FaceScan> {
        if frame.empty() || frame.channels() != 3 {
            return Err(Error::InvalidInput("expected a non-empty BGR frame".to_string()));
        }

        let Some(face) = self.locator.primary(frame)? else {
            return Ok(FaceScan::NoFace);
        };

        let x1 = face.x.max(0);
        let y1 = face.y.max(0);
        let x2 = (face.x + face.width).min(frame.cols());
        let y2 = (face.y + face.height).min(frame.rows());
        if x2 <= x1 || y2 <= y1 {
            return Ok(FaceScan::NoFace);
        }
        let bounded = Rect::new(x1, y1, x2 - x1, y2 - y1);

        let crop = Mat::roi(frame, bounded)?.try_clone()?;
        let mut points = self.regressor.fit(&crop)?;
        for point in &mut points {
            point.x += bounded.x as f32;
            point.y += bounded.y as f32;
        }

        Ok(FaceScan::Landmarks(LandmarkSet::pixel(points)))
    }

    fn schema(&self) -> LandmarkSchema {
        self.schema
    }
}
