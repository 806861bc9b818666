//! Dense landmark strategy: a single-face face-mesh model.
//!
//! The mesh model consumes the whole frame (resized to its input size) and
//! regresses a dense landmark grid plus a face-presence score; there is no
//! separate box-detection pass. Landmarks come back in normalized `[0, 1]`
//! coordinates.

use crate::constants::NUM_MESH_LANDMARKS;
use crate::detector::{FaceScan, LandmarkDetector, LandmarkSchema, LandmarkSet};
use crate::utils::image_conversion::mat_to_nhwc_f32;
use crate::{detector, Error, Result};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Point2f, Size};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Mesh model input size (square)
const MESH_INPUT_SIZE: i32 = 192;

/// Values per landmark in the model output (x, y, z)
const MESH_VALUES_PER_LANDMARK: usize = 3;

/// Presence scores below this are treated as "no face"
const DEFAULT_PRESENCE_THRESHOLD: f32 = 0.5;

/// Dense face-mesh landmark detector using ONNX Runtime
pub struct MeshLandmarkDetector {
    session: Session,
    input_size: i32,
    presence_threshold: f32,
    schema: LandmarkSchema,
}

impl MeshLandmarkDetector {
    /// Create a mesh detector from an ONNX model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model file cannot be loaded or the ONNX
    /// runtime environment cannot be created.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_schema(model_path, detector::mesh_schema())
    }

    /// Create a mesh detector with custom acceptance thresholds
    ///
    /// # Errors
    ///
    /// Returns an error if the model file cannot be loaded or the ONNX
    /// runtime environment cannot be created.
    pub fn with_schema<P: AsRef<Path>>(model_path: P, schema: LandmarkSchema) -> Result<Self> {
        log::info!(
            "Initializing MeshLandmarkDetector with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("mesh_landmarks")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.outputs.len() < 2 {
            return Err(Error::ModelOutputError(
                "Mesh model must expose landmark and presence outputs".to_string(),
            ));
        }

        Ok(Self {
            session,
            input_size: MESH_INPUT_SIZE,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
            schema,
        })
    }

    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        // Mesh models take [0, 1] floats in NHWC layout
        mat_to_nhwc_f32(&rgb, 1.0 / 255.0, 0.0)
    }

    /// Run the model, returning raw landmark values and the presence score
    fn forward(&self, inputs: Array4<f32>) -> Result<(Vec<f32>, f32)> {
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let landmarks_tensor = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No landmark output from model".to_string()))?
            .try_extract::<f32>()?;
        let landmarks_view = landmarks_tensor.view();
        let landmarks = landmarks_view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get landmark data".to_string()))?
            .to_vec();

        let presence_tensor = outputs
            .get(1)
            .ok_or_else(|| Error::ModelOutputError("No presence output from model".to_string()))?
            .try_extract::<f32>()?;
        let presence_view = presence_tensor.view();
        let presence = presence_view
            .as_slice()
            .and_then(<[f32]>::first)
            .copied()
            .ok_or_else(|| Error::ModelOutputError("Failed to get presence score".to_string()))?;

        Ok((landmarks, sigmoid(presence)))
    }
}

impl LandmarkDetector for MeshLandmarkDetector {
    fn detect(&mut self, frame: &Mat) -> Result<FaceScan> {
        if frame.empty() || frame.channels() != 3 {
            return Err(Error::InvalidInput("expected a non-empty BGR frame".to_string()));
        }

        let inputs = self.preprocess(frame)?;
        let (raw, presence) = self.forward(inputs)?;

        if presence < self.presence_threshold {
            return Ok(FaceScan::NoFace);
        }

        if raw.len() < NUM_MESH_LANDMARKS * MESH_VALUES_PER_LANDMARK {
            return Err(Error::ModelDataFormatError(format!(
                "Mesh output holds {} values, expected at least {}",
                raw.len(),
                NUM_MESH_LANDMARKS * MESH_VALUES_PER_LANDMARK
            )));
        }

        // Model coordinates are in input pixels; normalize to [0, 1].
        let scale = self.input_size as f32;
        let points = raw
            .chunks_exact(MESH_VALUES_PER_LANDMARK)
            .take(NUM_MESH_LANDMARKS)
            .map(|chunk| Point2f::new(chunk[0] / scale, chunk[1] / scale))
            .collect();

        Ok(FaceScan::Landmarks(LandmarkSet::normalized(points)))
    }

    fn schema(&self) -> LandmarkSchema {
        self.schema
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
