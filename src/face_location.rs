//! Face localization: finding face bounding boxes in a frame.
//!
//! [`OnnxFaceLocator`] runs a general frontal-face detection model (SCRFD
//! family) through ONNX Runtime: letterbox the frame to the model input,
//! decode the per-stride distance predictions against anchor centers, filter
//! by confidence and apply non-maximum suppression. The [`FaceLocator`]
//! trait is the seam the cropper and the sparse landmark strategy plug into,
//! so tests can substitute a stub.

use crate::constants::{DEFAULT_DETECTION_CONFIDENCE, DEFAULT_NMS_THRESHOLD};
use crate::utils::image_conversion::mat_to_nchw_f32;
use crate::utils::safe_cast::f32_to_i32_clamp;
use crate::{Error, Result};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Scalar, Size, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Pixel normalization used by the detection model
const NORMALIZATION_OFFSET: f32 = -127.5;
const NORMALIZATION_SCALE: f32 = 1.0 / 128.0;

/// Capability of locating face bounding boxes in a frame.
///
/// Boxes are returned in frame pixel coordinates, ordered by detection
/// confidence. The primary face is the first reported one; no
/// largest/most-central selection is applied.
pub trait FaceLocator {
    /// All detected face boxes, best first
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the frame is malformed.
    fn locate(&mut self, frame: &Mat) -> Result<Vec<Rect>>;

    /// The first detected face, if any
    ///
    /// # Errors
    ///
    /// Propagates errors from [`FaceLocator::locate`].
    fn primary(&mut self, frame: &Mat) -> Result<Option<Rect>> {
        Ok(self.locate(frame)?.into_iter().next())
    }
}

/// A score-ranked box candidate in model input coordinates
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    bbox: [f32; 4],
}

/// SCRFD-style face detector using ONNX Runtime
pub struct OnnxFaceLocator {
    session: Session,
    input_size: (i32, i32),
    conf_threshold: f32,
    nms_threshold: f32,
    strides: Vec<i32>,
    num_anchors: usize,
    offset: usize,
    center_cache: HashMap<(i32, i32, i32), Arc<Vec<(f32, f32)>>>,
}

impl OnnxFaceLocator {
    /// Create a face locator from an ONNX model file with default thresholds
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has an unexpected
    /// structure.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::with_thresholds(model_path, DEFAULT_DETECTION_CONFIDENCE, DEFAULT_NMS_THRESHOLD)
    }

    /// Create a face locator with explicit confidence and NMS thresholds
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has an unexpected
    /// structure.
    pub fn with_thresholds<P: AsRef<Path>>(
        model_path: P,
        conf_threshold: f32,
        nms_threshold: f32,
    ) -> Result<Self> {
        log::info!(
            "Initializing OnnxFaceLocator with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_locator")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

        // Input shape is [batch, channels, height, width]
        let input_shape = &input_meta.dimensions;
        let input_size = if input_shape.len() >= 4 {
            let height = input_shape[2].unwrap_or(640) as i32;
            let width = input_shape[3].unwrap_or(640) as i32;
            (width, height)
        } else {
            (640, 640)
        };

        // The output count tells the anchor layout apart
        let num_outputs = session.outputs.len();
        let (offset, strides, num_anchors) = match num_outputs {
            6 | 9 => (3, vec![8, 16, 32], 2),
            10 | 15 => (5, vec![8, 16, 32, 64, 128], 1),
            _ => {
                log::warn!("Unknown model configuration with {num_outputs} outputs, using defaults");
                (3, vec![8, 16, 32], 2)
            }
        };

        Ok(Self {
            session,
            input_size,
            conf_threshold,
            nms_threshold,
            strides,
            num_anchors,
            offset,
            center_cache: HashMap::new(),
        })
    }

    /// Letterbox the frame into the model input size, returning the scale
    /// that maps detection coordinates back to frame coordinates
    fn letterbox(&self, frame: &Mat) -> Result<(Mat, f32)> {
        let img_height = frame.rows();
        let img_width = frame.cols();
        if img_height <= 0 || img_width <= 0 {
            return Err(Error::InvalidInput("empty frame".to_string()));
        }

        let (input_width, input_height) = self.input_size;
        let ratio_img = img_height as f32 / img_width as f32;
        let ratio_model = input_height as f32 / input_width as f32;

        let (new_width, new_height) = if ratio_img > ratio_model {
            ((input_height as f32 / ratio_img) as i32, input_height)
        } else {
            (input_width, (input_width as f32 * ratio_img) as i32)
        };

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(new_width, new_height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut det_img =
            Mat::new_rows_cols_with_default(input_height, input_width, CV_8UC3, Scalar::all(0.0))?;
        let mut roi = det_img.roi_mut(Rect::new(0, 0, new_width, new_height))?;
        resized.copy_to(&mut roi)?;
        drop(roi);

        Ok((det_img, new_height as f32 / img_height as f32))
    }

    fn preprocess(&self, det_img: &Mat) -> Result<Array4<f32>> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(det_img, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
        mat_to_nchw_f32(&rgb, NORMALIZATION_SCALE, NORMALIZATION_OFFSET)
    }

    /// Run inference and decode all candidates above the confidence threshold
    fn forward(&mut self, inputs: Array4<f32>) -> Result<Vec<Candidate>> {
        let input_height = self.input_size.1;
        let input_width = self.input_size.0;

        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let mut candidates = Vec::new();
        for (idx, &stride) in self.strides.iter().enumerate() {
            let scores = extract_output(&outputs, idx)?;
            let distances = extract_output(&outputs, idx + self.offset)?;

            let centers = self.anchor_centers(input_height / stride, input_width / stride, stride);
            for (anchor, &score) in scores.iter().enumerate() {
                if score < self.conf_threshold {
                    continue;
                }
                let base = anchor * 4;
                if base + 3 >= distances.len() || anchor >= centers.len() {
                    break;
                }
                let (cx, cy) = centers[anchor];
                let stride = stride as f32;
                candidates.push(Candidate {
                    score,
                    bbox: [
                        cx - distances[base] * stride,
                        cy - distances[base + 1] * stride,
                        cx + distances[base + 2] * stride,
                        cy + distances[base + 3] * stride,
                    ],
                });
            }
        }

        Ok(candidates)
    }

    /// Anchor centers for one stride level, cached by feature-map shape
    fn anchor_centers(&mut self, height: i32, width: i32, stride: i32) -> Arc<Vec<(f32, f32)>> {
        let key = (height, width, stride);
        if let Some(centers) = self.center_cache.get(&key) {
            return Arc::clone(centers);
        }

        let mut centers = Vec::with_capacity((height * width) as usize * self.num_anchors);
        for y in 0..height {
            for x in 0..width {
                for _ in 0..self.num_anchors {
                    centers.push(((x * stride) as f32, (y * stride) as f32));
                }
            }
        }

        let centers = Arc::new(centers);
        if self.center_cache.len() < 100 {
            self.center_cache.insert(key, Arc::clone(&centers));
        }
        centers
    }

    /// Greedy non-maximum suppression over score-sorted candidates
    fn nms(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let mut keep: Vec<Candidate> = Vec::new();
        'next: for candidate in candidates {
            for kept in &keep {
                if iou(candidate.bbox, kept.bbox) > self.nms_threshold {
                    continue 'next;
                }
            }
            keep.push(candidate);
        }
        keep
    }
}

impl FaceLocator for OnnxFaceLocator {
    fn locate(&mut self, frame: &Mat) -> Result<Vec<Rect>> {
        let (det_img, det_scale) = self.letterbox(frame)?;
        let inputs = self.preprocess(&det_img)?;
        let candidates = self.forward(inputs)?;
        let kept = self.nms(candidates);

        let frame_width = frame.cols();
        let frame_height = frame.rows();
        let mut boxes = Vec::with_capacity(kept.len());
        for candidate in kept {
            let x1 = f32_to_i32_clamp(candidate.bbox[0] / det_scale, 0, frame_width);
            let y1 = f32_to_i32_clamp(candidate.bbox[1] / det_scale, 0, frame_height);
            let x2 = f32_to_i32_clamp(candidate.bbox[2] / det_scale, 0, frame_width);
            let y2 = f32_to_i32_clamp(candidate.bbox[3] / det_scale, 0, frame_height);
            if x2 > x1 && y2 > y1 {
                boxes.push(Rect::new(x1, y1, x2 - x1, y2 - y1));
            }
        }
        Ok(boxes)
    }
}

fn extract_output(outputs: &[Value], index: usize) -> Result<Vec<f32>> {
    let output = outputs
        .get(index)
        .ok_or_else(|| Error::ModelOutputError(format!("Model output {index} missing")))?;
    let tensor = output.try_extract::<f32>()?;
    let view = tensor.view();
    let data = view
        .as_slice()
        .ok_or_else(|| Error::ModelOutputError(format!("Model output {index} is not contiguous")))?;
    Ok(data.to_vec())
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes
fn iou(a: [f32; 4], b: [f32; 4]) -> f32 {
    let area_a = (a[2] - a[0] + 1.0) * (a[3] - a[1] + 1.0);
    let area_b = (b[2] - b[0] + 1.0) * (b[3] - b[1] + 1.0);

    let w = (a[2].min(b[2]) - a[0].max(b[0]) + 1.0).max(0.0);
    let h = (a[3].min(b[3]) - a[1].max(b[1]) + 1.0).max(0.0);
    let inter = w * h;

    inter / (area_a + area_b - inter)
}
