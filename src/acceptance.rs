//! Frame acceptance policy: eyes open, mouth closed/neutral.
//!
//! The policy is pure geometry over a [`LandmarkSet`]; the strategy-specific
//! indices and thresholds come from the detector's [`LandmarkSchema`], so a
//! single implementation serves both landmark strategies.

use crate::constants::DEGENERATE_SPAN_EPSILON;
use crate::detector::{EyePoints, LandmarkSchema, LandmarkSet, MouthRule};
use crate::{Error, Result};

/// Geometric gate deciding whether a frame is eligible for scoring
#[derive(Debug, Clone, Copy)]
pub struct AcceptancePolicy {
    schema: LandmarkSchema,
}

impl AcceptancePolicy {
    /// Policy over a strategy's landmark schema
    #[must_use]
    pub fn new(schema: LandmarkSchema) -> Self {
        Self { schema }
    }

    /// Whether both eyes are open and the mouth is closed/neutral.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateGeometry`] when a ratio denominator is
    /// near zero or a ratio is non-finite (e.g. a face rotated precisely
    /// profile-on), and [`Error::InvalidInput`] when a schema index is
    /// outside the landmark set. Neither condition panics; callers treat
    /// both as "skip this frame".
    pub fn accepts(&self, landmarks: &LandmarkSet) -> Result<bool> {
        let left = eye_openness(landmarks, self.schema.left_eye)?;
        let right = eye_openness(landmarks, self.schema.right_eye)?;
        if left <= self.schema.eye_open_min || right <= self.schema.eye_open_min {
            return Ok(false);
        }
        mouth_is_closed(landmarks, self.schema.mouth)
    }
}

/// Eyelid gap over eye-corner span
fn eye_openness(landmarks: &LandmarkSet, eye: EyePoints) -> Result<f32> {
    let upper = landmarks.point(eye.upper_lid)?;
    let lower = landmarks.point(eye.lower_lid)?;
    let inner = landmarks.point(eye.inner_corner)?;
    let outer = landmarks.point(eye.outer_corner)?;

    let span = inner.x - outer.x;
    finite_ratio(upper.y - lower.y, span, "eye corner span")
}

fn mouth_is_closed(landmarks: &LandmarkSet, rule: MouthRule) -> Result<bool> {
    match rule {
        MouthRule::LipGapPositive { upper, lower, min } => {
            let gap = landmarks.point(upper)?.y - landmarks.point(lower)?.y;
            if !gap.is_finite() {
                return Err(Error::DegenerateGeometry("non-finite lip gap".to_string()));
            }
            Ok(gap > min)
        }
        MouthRule::InnerLipComposite { pairs, corners, min } => {
            let [(a, b), (c, d), (e, f)] = pairs;
            let width = landmarks.point(corners.0)?.x - landmarks.point(corners.1)?.x;
            let scaled = finite_ratio(
                landmarks.point(e)?.y - landmarks.point(f)?.y,
                width,
                "mouth width",
            )?;
            // Only the last gap term is divided by the mouth width; the
            // composite's shape follows the source heuristic verbatim.
            let ratio = (landmarks.point(a)?.y + landmarks.point(b)?.y)
                - (landmarks.point(c)?.y - landmarks.point(d)?.y)
                + scaled;
            if !ratio.is_finite() {
                return Err(Error::DegenerateGeometry("non-finite mouth ratio".to_string()));
            }
            Ok(ratio > min)
        }
    }
}

fn finite_ratio(numerator: f32, denominator: f32, what: &str) -> Result<f32> {
    if denominator.abs() < DEGENERATE_SPAN_EPSILON {
        return Err(Error::DegenerateGeometry(format!("near-zero {what}")));
    }
    let ratio = numerator / denominator;
    if !ratio.is_finite() {
        return Err(Error::DegenerateGeometry(format!("non-finite ratio over {what}")));
    }
    Ok(ratio)
}
