//! Best-frame selection: a single sampled pass over the video stream.
//!
//! The selector pulls frames at a fixed cadence, gates each sampled frame
//! through the landmark detector and acceptance policy, scores the survivors
//! and keeps the running best. After the stream is exhausted the winner is
//! cropped to the padded face region, falling back to the uncropped frame
//! when cropping finds nothing.

use crate::acceptance::AcceptancePolicy;
use crate::constants::DEFAULT_SAMPLES_PER_SECOND;
use crate::crop::FaceCropper;
use crate::detector::{FaceScan, LandmarkDetector};
use crate::quality::ScoreWeights;
use crate::source::{FrameSource, VideoFileSource};
use crate::{utils, Error, Result};
use opencv::core::Mat;

/// Drives frame sampling, acceptance and scoring over a frame source
#[derive(Debug, Clone, Copy)]
pub struct BestFrameSelector {
    samples_per_second: f64,
    weights: ScoreWeights,
}

impl Default for BestFrameSelector {
    fn default() -> Self {
        Self {
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
            weights: ScoreWeights::default(),
        }
    }
}

impl BestFrameSelector {
    /// Selector with an explicit sampling rate and score weights
    #[must_use]
    pub fn new(samples_per_second: f64, weights: ScoreWeights) -> Self {
        Self {
            samples_per_second,
            weights,
        }
    }

    /// Frame-index interval at which frames are evaluated.
    ///
    /// Always at least 1: a source reporting an unknown, zero or tiny frame
    /// rate degrades to evaluating every frame instead of dividing by zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // floor of a small positive value
    pub fn sampling_stride(&self, frame_rate: f64) -> u64 {
        if !frame_rate.is_finite() || frame_rate <= 0.0 || self.samples_per_second <= 0.0 {
            return 1;
        }
        ((frame_rate / self.samples_per_second).floor() as u64).max(1)
    }

    /// Scan the stream once and return the highest-scoring accepted frame.
    ///
    /// The source is released on every exit path. `Ok(None)` means no frame
    /// qualified, a normal outcome for a video without a well-posed face.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamOpen`] if the source is not open. Per-frame
    /// detection, acceptance and scoring failures are logged and skipped,
    /// never propagated.
    pub fn select_best(
        &self,
        source: &mut dyn FrameSource,
        detector: &mut dyn LandmarkDetector,
    ) -> Result<Option<Mat>> {
        if !source.is_open() {
            let _ = source.release();
            return Err(Error::StreamOpen("video stream is not open".to_string()));
        }

        let stride = self.sampling_stride(source.frame_rate());
        let policy = AcceptancePolicy::new(detector.schema());
        log::debug!("scanning with stride {stride}");

        let mut best: Option<Mat> = None;
        let mut best_score = 0.0_f64;
        let mut index: u64 = 0;

        loop {
            let frame = match source.read_next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("stopping scan after read failure at frame {index}: {e}");
                    break;
                }
            };

            if index % stride == 0 && self.is_well_posed(&frame, detector, &policy, index) {
                match self.weights.score(&frame) {
                    Some(score) if score > best_score => {
                        log::debug!("frame {index} becomes best with score {score:.2}");
                        best_score = score;
                        best = Some(frame);
                    }
                    Some(_) => {}
                    None => log::debug!("frame {index} skipped: quality metrics unavailable"),
                }
            }

            index += 1;
        }

        source.release()?;
        Ok(best)
    }

    /// Detector + acceptance gate with per-frame error recovery
    fn is_well_posed(
        &self,
        frame: &Mat,
        detector: &mut dyn LandmarkDetector,
        policy: &AcceptancePolicy,
        index: u64,
    ) -> bool {
        match detector.detect(frame) {
            Ok(FaceScan::Landmarks(landmarks)) => match policy.accepts(&landmarks) {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::debug!("frame {index} skipped: {e}");
                    false
                }
            },
            Ok(FaceScan::NoFace) => false,
            Err(e) => {
                log::debug!("frame {index} skipped: detection failed: {e}");
                false
            }
        }
    }
}

/// Run the full pipeline over an already-opened source.
///
/// Returns `(base_name, frame)`: the winning frame cropped to the padded
/// face region (uncropped when cropping finds no face or fails), or
/// `(base_name, None)` when no frame qualified. `base_name` is passed
/// through unchanged.
///
/// # Errors
///
/// Propagates [`Error::StreamOpen`] from the selector; per-frame failures
/// never surface here.
pub fn best_frame_from_source(
    source: &mut dyn FrameSource,
    base_name: Option<String>,
    detector: &mut dyn LandmarkDetector,
    cropper: &mut FaceCropper,
    selector: &BestFrameSelector,
) -> Result<(Option<String>, Option<Mat>)> {
    let Some(winner) = selector.select_best(source, detector)? else {
        return Ok((base_name, None));
    };

    let result = match cropper.locate_and_crop(&winner) {
        Ok(Some(crop)) => crop,
        Ok(None) => {
            log::warn!("no face found while cropping, returning the uncropped frame");
            winner
        }
        Err(e) => {
            log::warn!("cropping failed ({e}), returning the uncropped frame");
            winner
        }
    };

    Ok((base_name, Some(result)))
}

/// Run the full pipeline over a local path or URL.
///
/// The base name is the input's filename stem. A source that fails to open
/// yields `Ok((None, None))` without reading any frames; it is not an error.
///
/// # Errors
///
/// Propagates selector errors other than failure to open.
pub fn best_frame(
    video_input: &str,
    detector: &mut dyn LandmarkDetector,
    cropper: &mut FaceCropper,
    selector: &BestFrameSelector,
) -> Result<(Option<String>, Option<Mat>)> {
    let mut source = match VideoFileSource::open(video_input) {
        Ok(source) => source,
        Err(e) => {
            log::warn!("{e}");
            return Ok((None, None));
        }
    };

    best_frame_from_source(
        &mut source,
        utils::stem_from_input(video_input),
        detector,
        cropper,
        selector,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_at_least_one_for_any_frame_rate() {
        let selector = BestFrameSelector::default();
        for fps in 0..=240 {
            assert!(selector.sampling_stride(f64::from(fps)) >= 1);
        }
        assert_eq!(selector.sampling_stride(f64::NAN), 1);
        assert_eq!(selector.sampling_stride(-30.0), 1);
    }

    #[test]
    fn stride_samples_about_four_frames_per_second() {
        let selector = BestFrameSelector::default();
        assert_eq!(selector.sampling_stride(8.0), 2);
        assert_eq!(selector.sampling_stride(30.0), 7);
        assert_eq!(selector.sampling_stride(3.0), 1);
    }

    #[test]
    fn custom_sampling_rate_changes_the_stride() {
        let selector = BestFrameSelector::new(2.0, ScoreWeights::default());
        assert_eq!(selector.sampling_stride(30.0), 15);
    }
}
