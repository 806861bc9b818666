//! Face geometry capability: landmark sets, anatomical schemas and the
//! detector trait the selector is parameterized over.
//!
//! Two interchangeable strategies satisfy the [`LandmarkDetector`] contract:
//! the dense face-mesh model ([`crate::mesh::MeshLandmarkDetector`]) and the
//! sparse 68-point pipeline ([`crate::sparse::SparseLandmarkDetector`]). The
//! two produce geometrically different landmark placements, so each carries
//! its own [`LandmarkSchema`] with strategy-specific indices and thresholds.

use crate::constants::{
    MESH_EYE_OPEN_MIN, MESH_MOUTH_GAP_MIN, SPARSE_EYE_OPEN_MIN, SPARSE_MOUTH_RATIO_MIN,
};
use crate::{Error, Result};
use opencv::core::{Mat, Point2f};

/// Coordinate space of a landmark set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSpace {
    /// Coordinates normalized to `[0, 1]` in both axes
    Normalized,
    /// Coordinates in frame pixels
    Pixel,
}

/// Ordered facial landmark positions produced for a single frame.
///
/// Indexed by anatomical position per the owning strategy's
/// [`LandmarkSchema`]; consumed only within the same frame's processing.
#[derive(Debug, Clone)]
pub struct LandmarkSet {
    points: Vec<Point2f>,
    space: CoordSpace,
}

impl LandmarkSet {
    /// Landmark set in normalized `[0, 1]` coordinates
    #[must_use]
    pub fn normalized(points: Vec<Point2f>) -> Self {
        Self {
            points,
            space: CoordSpace::Normalized,
        }
    }

    /// Landmark set in pixel coordinates
    #[must_use]
    pub fn pixel(points: Vec<Point2f>) -> Self {
        Self {
            points,
            space: CoordSpace::Pixel,
        }
    }

    /// Coordinate space the points live in
    #[must_use]
    pub fn space(&self) -> CoordSpace {
        self.space
    }

    /// Number of landmarks
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no landmarks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark at a schema index
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the index is outside the set.
    pub fn point(&self, index: usize) -> Result<Point2f> {
        self.points.get(index).copied().ok_or_else(|| {
            Error::InvalidInput(format!(
                "landmark index {index} out of range for a set of {}",
                self.points.len()
            ))
        })
    }
}

/// Outcome of a single-frame detection pass
#[derive(Debug, Clone)]
pub enum FaceScan {
    /// No face was found in the frame
    NoFace,
    /// Landmarks of the primary detected face
    Landmarks(LandmarkSet),
}

/// Eye landmark indices used by the acceptance ratio
///
/// Openness is computed as
/// `(upper_lid.y - lower_lid.y) / (inner_corner.x - outer_corner.x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyePoints {
    /// Upper eyelid center
    pub upper_lid: usize,
    /// Lower eyelid center
    pub lower_lid: usize,
    /// Corner nearer the nose in the formula's index order
    pub inner_corner: usize,
    /// Corner nearer the temple in the formula's index order
    pub outer_corner: usize,
}

/// Per-strategy mouth-closedness rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouthRule {
    /// Vertical gap between two central lip landmarks must exceed `min`
    /// (dense strategy; `min` defaults to 0)
    LipGapPositive {
        /// Upper central lip landmark
        upper: usize,
        /// Lower central lip landmark
        lower: usize,
        /// Minimum gap
        min: f32,
    },
    /// Composite of three inner-lip vertical gaps over the mouth width must
    /// exceed `min` (sparse strategy).
    ///
    /// The composite is
    /// `(a.y + b.y) - (c.y - d.y) + (e.y - f.y) / (left.x - right.x)`
    /// with `pairs = [(a, b), (c, d), (e, f)]`. Only the last gap term is
    /// divided by the mouth width; that shape is reproduced from the source
    /// heuristic on purpose and must not be "corrected".
    InnerLipComposite {
        /// Inner-lip landmark pairs feeding the three gap terms
        pairs: [(usize, usize); 3],
        /// Mouth corner landmarks spanning the width denominator
        corners: (usize, usize),
        /// Minimum composite value
        min: f32,
    },
}

/// Anatomical index map plus thresholds for one detector strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSchema {
    /// Left eye indices
    pub left_eye: EyePoints,
    /// Right eye indices
    pub right_eye: EyePoints,
    /// Minimum per-eye openness ratio; both eyes must exceed it
    pub eye_open_min: f32,
    /// Mouth-closedness rule
    pub mouth: MouthRule,
}

/// Schema of the dense face-mesh strategy (refined mesh indices, normalized
/// coordinates)
#[must_use]
pub fn mesh_schema() -> LandmarkSchema {
    LandmarkSchema {
        left_eye: EyePoints {
            upper_lid: 159,
            lower_lid: 145,
            inner_corner: 33,
            outer_corner: 133,
        },
        right_eye: EyePoints {
            upper_lid: 386,
            lower_lid: 374,
            inner_corner: 362,
            outer_corner: 263,
        },
        eye_open_min: MESH_EYE_OPEN_MIN,
        mouth: MouthRule::LipGapPositive {
            upper: 13,
            lower: 14,
            min: MESH_MOUTH_GAP_MIN,
        },
    }
}

/// Schema of the sparse 68-point strategy (iBUG numbering, pixel coordinates)
#[must_use]
pub fn sparse_schema() -> LandmarkSchema {
    LandmarkSchema {
        left_eye: EyePoints {
            upper_lid: 43,
            lower_lid: 47,
            inner_corner: 42,
            outer_corner: 45,
        },
        right_eye: EyePoints {
            upper_lid: 38,
            lower_lid: 40,
            inner_corner: 36,
            outer_corner: 39,
        },
        eye_open_min: SPARSE_EYE_OPEN_MIN,
        mouth: MouthRule::InnerLipComposite {
            pairs: [(61, 67), (62, 66), (63, 65)],
            corners: (60, 64),
            min: SPARSE_MOUTH_RATIO_MIN,
        },
    }
}

/// Face geometry capability.
///
/// Implementations hold the expensive model state and are reused across
/// frames; each `detect` call is logically independent and must not leak
/// per-frame state into the next call. Only the first detected face is
/// reported; multiple simultaneous faces are not disambiguated.
pub trait LandmarkDetector {
    /// Locate the primary face in a frame and return its landmarks.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is malformed or model inference fails.
    /// A frame without a face is `Ok(FaceScan::NoFace)`, not an error.
    fn detect(&mut self, frame: &Mat) -> Result<FaceScan>;

    /// Index map and thresholds the acceptance policy evaluates against
    fn schema(&self) -> LandmarkSchema;
}
