//! Configuration management for the best-frame pipeline

use crate::constants::{
    BRIGHTNESS_WEIGHT, CONTRAST_WEIGHT, DEFAULT_CROP_PADDING, DEFAULT_DETECTION_CONFIDENCE,
    DEFAULT_NMS_THRESHOLD, DEFAULT_SAMPLES_PER_SECOND, MESH_EYE_OPEN_MIN, MESH_MOUTH_GAP_MIN,
    SHARPNESS_WEIGHT, SPARSE_EYE_OPEN_MIN, SPARSE_MOUTH_RATIO_MIN,
};
use crate::detector::{self, LandmarkSchema, MouthRule};
use crate::quality::ScoreWeights;
use crate::selector::BestFrameSelector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Frame sampling configuration
    pub sampling: SamplingConfig,

    /// Quality score weights
    pub scoring: ScoringConfig,

    /// Acceptance thresholds per landmark strategy
    pub acceptance: AcceptanceConfig,

    /// Face crop configuration
    pub crop: CropConfig,
}

/// Model file paths and detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the dense face-mesh ONNX model
    pub face_mesh: PathBuf,

    /// Path to the face box detection ONNX model
    pub face_detector: PathBuf,

    /// Path to the 68-point facial landmarks ONNX model
    pub face_landmarks: PathBuf,

    /// Confidence threshold for face box detection (0.0-1.0)
    pub confidence_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub nms_threshold: f32,
}

/// Frame sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Target number of evaluated frames per second of source video
    pub samples_per_second: f64,
}

/// Quality score weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the Laplacian-variance sharpness metric
    pub sharpness_weight: f64,

    /// Weight of the luminance standard-deviation contrast metric
    pub contrast_weight: f64,

    /// Weight of the mean value-channel brightness metric
    pub brightness_weight: f64,
}

/// Acceptance thresholds per landmark strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceConfig {
    /// Minimum eye-openness ratio for the mesh strategy
    pub mesh_eye_open_min: f32,

    /// Minimum central lip gap for the mesh strategy
    pub mesh_mouth_gap_min: f32,

    /// Minimum eye-openness ratio for the sparse strategy
    pub sparse_eye_open_min: f32,

    /// Minimum composite mouth ratio for the sparse strategy
    pub sparse_mouth_ratio_min: f32,
}

/// Face crop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    /// Padding as a fraction of the detected face box dimensions
    pub padding: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelConfig::default(),
            sampling: SamplingConfig::default(),
            scoring: ScoringConfig::default(),
            acceptance: AcceptanceConfig::default(),
            crop: CropConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_mesh: PathBuf::from("assets/face_mesh.onnx"),
            face_detector: PathBuf::from("assets/face_detector.onnx"),
            face_landmarks: PathBuf::from("assets/face_landmarks.onnx"),
            confidence_threshold: DEFAULT_DETECTION_CONFIDENCE,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            sharpness_weight: SHARPNESS_WEIGHT,
            contrast_weight: CONTRAST_WEIGHT,
            brightness_weight: BRIGHTNESS_WEIGHT,
        }
    }
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            mesh_eye_open_min: MESH_EYE_OPEN_MIN,
            mesh_mouth_gap_min: MESH_MOUTH_GAP_MIN,
            sparse_eye_open_min: SPARSE_EYE_OPEN_MIN,
            sparse_mouth_ratio_min: SPARSE_MOUTH_RATIO_MIN,
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_CROP_PADDING,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Score weights from the scoring section
    #[must_use]
    pub fn score_weights(&self) -> ScoreWeights {
        ScoreWeights {
            sharpness: self.scoring.sharpness_weight,
            contrast: self.scoring.contrast_weight,
            brightness: self.scoring.brightness_weight,
        }
    }

    /// Selector configured from the sampling and scoring sections
    #[must_use]
    pub fn selector(&self) -> BestFrameSelector {
        BestFrameSelector::new(self.sampling.samples_per_second, self.score_weights())
    }

    /// Mesh-strategy schema with this configuration's thresholds applied
    #[must_use]
    pub fn mesh_schema(&self) -> LandmarkSchema {
        let mut schema = detector::mesh_schema();
        schema.eye_open_min = self.acceptance.mesh_eye_open_min;
        if let MouthRule::LipGapPositive { ref mut min, .. } = schema.mouth {
            *min = self.acceptance.mesh_mouth_gap_min;
        }
        schema
    }

    /// Sparse-strategy schema with this configuration's thresholds applied
    #[must_use]
    pub fn sparse_schema(&self) -> LandmarkSchema {
        let mut schema = detector::sparse_schema();
        schema.eye_open_min = self.acceptance.sparse_eye_open_min;
        if let MouthRule::InnerLipComposite { ref mut min, .. } = schema.mouth {
            *min = self.acceptance.sparse_mouth_ratio_min;
        }
        schema
    }

    /// Validate numeric parameter ranges
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.models.confidence_threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.models.nms_threshold) {
            return Err(Error::ConfigError(
                "NMS threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !self.sampling.samples_per_second.is_finite() || self.sampling.samples_per_second <= 0.0 {
            return Err(Error::ConfigError(
                "Samples per second must be a positive number".to_string(),
            ));
        }

        for (name, weight) in [
            ("Sharpness", self.scoring.sharpness_weight),
            ("Contrast", self.scoring.contrast_weight),
            ("Brightness", self.scoring.brightness_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::ConfigError(format!(
                    "{name} weight must be a non-negative number"
                )));
            }
        }

        if !self.crop.padding.is_finite() || self.crop.padding < 0.0 {
            return Err(Error::ConfigError(
                "Crop padding must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate that the model files a strategy needs are present.
    ///
    /// Missing models are a startup error, surfaced before any frame is
    /// processed rather than swallowed per frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] naming the first missing model file.
    pub fn validate_models(&self, needs_mesh: bool, needs_sparse: bool) -> Result<()> {
        if needs_mesh && !self.models.face_mesh.exists() {
            return Err(Error::ConfigError(format!(
                "Face mesh model not found: {}",
                self.models.face_mesh.display()
            )));
        }
        if needs_sparse && !self.models.face_landmarks.exists() {
            return Err(Error::ConfigError(format!(
                "Face landmarks model not found: {}",
                self.models.face_landmarks.display()
            )));
        }
        if !self.models.face_detector.exists() {
            return Err(Error::ConfigError(format!(
                "Face detector model not found: {}",
                self.models.face_detector.display()
            )));
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Best-frame extraction configuration

# Model paths and detection thresholds
models:
  face_mesh: "assets/face_mesh.onnx"
  face_detector: "assets/face_detector.onnx"
  face_landmarks: "assets/face_landmarks.onnx"
  confidence_threshold: 0.5
  nms_threshold: 0.4

# Frame sampling
sampling:
  samples_per_second: 4.0

# Quality score weights
scoring:
  sharpness_weight: 0.6
  contrast_weight: 0.3
  brightness_weight: 0.2

# Acceptance thresholds per landmark strategy
acceptance:
  mesh_eye_open_min: 0.09
  mesh_mouth_gap_min: 0.0
  sparse_eye_open_min: 0.06
  sparse_mouth_ratio_min: 2.2

# Face crop
crop:
  padding: 0.7
"#;
