//! Constants used throughout the library

/// Number of landmarks in the sparse 68-point set
pub const NUM_SPARSE_LANDMARKS: usize = 68;

/// Number of landmarks in the dense face-mesh set
pub const NUM_MESH_LANDMARKS: usize = 468;

/// Target sampling rate over the source stream, in frames per second
pub const DEFAULT_SAMPLES_PER_SECOND: f64 = 4.0;

/// Crop padding as a fraction of the detected face box dimensions
pub const DEFAULT_CROP_PADDING: f64 = 0.7;

/// Minimum eye-openness ratio for the dense (mesh) landmark strategy
pub const MESH_EYE_OPEN_MIN: f32 = 0.09;

/// Minimum eye-openness ratio for the sparse (68-point) landmark strategy
pub const SPARSE_EYE_OPEN_MIN: f32 = 0.06;

/// Minimum central lip gap for the dense strategy (mouth not visibly open)
pub const MESH_MOUTH_GAP_MIN: f32 = 0.0;

/// Minimum composite mouth ratio for the sparse strategy
pub const SPARSE_MOUTH_RATIO_MIN: f32 = 2.2;

/// Score weight for the Laplacian-variance sharpness metric
pub const SHARPNESS_WEIGHT: f64 = 0.6;

/// Score weight for the luminance standard-deviation contrast metric
pub const CONTRAST_WEIGHT: f64 = 0.3;

/// Score weight for the mean value-channel brightness metric
pub const BRIGHTNESS_WEIGHT: f64 = 0.2;

/// Default confidence threshold for the face box detector
pub const DEFAULT_DETECTION_CONFIDENCE: f32 = 0.5;

/// Default IOU threshold for non-maximum suppression
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;

/// Denominators smaller than this are treated as degenerate geometry
pub const DEGENERATE_SPAN_EPSILON: f32 = 1e-6;
