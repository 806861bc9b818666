//! End-to-end selection pipeline tests over synthetic sources and stub
//! detectors; no model files or video fixtures are required.


use bestframe::crop::FaceCropper;
use bestframe::detector::FaceScan;
use bestframe::selector::{best_frame, best_frame_from_source, BestFrameSelector};
use bestframe::Error;
use opencv::core::{Rect, Vec3b};
use opencv::prelude::*;
use test_helpers::{
    closed_eyes_landmarks, open_face_landmarks, uniform_frame, FixedLocator, ScriptedDetector,
    ScriptedSource,
};

/// A 2-second 8 fps clip: frame 0 is rejected (eyes closed), frame 4 is the
/// first accepted frame. The pipeline returns frame 4 cropped to the padded
/// face region with the base name passed through unchanged.
#[test]
fn accepted_frame_wins_and_is_cropped() {
    let frames = (0..16).map(|i| uniform_frame(48, 64, 100.0 + f64::from(i))).collect();
    let mut source = ScriptedSource::new(frames, 8.0);

    // Sampled frames are 0, 2, 4, ...: reject, no face, accept, then nothing.
    let mut detector = ScriptedDetector::new(vec![
        FaceScan::Landmarks(closed_eyes_landmarks()),
        FaceScan::NoFace,
        FaceScan::Landmarks(open_face_landmarks()),
    ]);

    let mut cropper = FaceCropper::new(Box::new(FixedLocator {
        face: Some(Rect::new(8, 8, 16, 16)),
    }));
    let selector = BestFrameSelector::default();

    let (base_name, frame) = best_frame_from_source(
        &mut source,
        Some("clip".to_string()),
        &mut detector,
        &mut cropper,
        &selector,
    )
    .expect("pipeline failed");

    assert_eq!(base_name.as_deref(), Some("clip"));
    let frame = frame.expect("expected a winning frame");

    // 16x16 face box padded by floor(0.7 * 16) = 11 on each side, clamped.
    assert_eq!((frame.cols(), frame.rows()), (35, 35));
    // Frame 4 carries pixel value 104.
    assert_eq!(frame.at_2d::<Vec3b>(0, 0).unwrap()[0], 104);

    assert_eq!(source.reads, 17); // 16 frames + the end-of-stream read
    assert!(source.released);
    assert_eq!(detector.calls, 8); // every second frame was sampled
}

/// Equal scores never replace the incumbent: with two frames of identical
/// crafted score, the first one stays the best.
#[test]
fn equal_score_keeps_the_first_frame() {
    let first = uniform_frame(32, 64, 100.0);
    let second = uniform_frame(64, 32, 100.0);
    let mut source = ScriptedSource::new(vec![first, second], 0.0);

    let mut detector = ScriptedDetector::new(vec![
        FaceScan::Landmarks(open_face_landmarks()),
        FaceScan::Landmarks(open_face_landmarks()),
    ]);

    let selector = BestFrameSelector::default();
    let winner = selector
        .select_best(&mut source, &mut detector)
        .expect("selection failed")
        .expect("expected a winner");

    assert_eq!((winner.rows(), winner.cols()), (32, 64));
}

/// An unknown frame rate samples every frame instead of dividing by zero.
#[test]
fn zero_fps_samples_every_frame() {
    let frames = (0..3).map(|_| uniform_frame(16, 16, 50.0)).collect();
    let mut source = ScriptedSource::new(frames, 0.0);
    let mut detector = ScriptedDetector::new(Vec::new());

    let selector = BestFrameSelector::default();
    let winner = selector
        .select_best(&mut source, &mut detector)
        .expect("selection failed");

    assert!(winner.is_none());
    assert_eq!(detector.calls, 3);
    assert!(source.released);
}

/// A clip where no frame passes acceptance yields `(base_name, None)`
/// without an error.
#[test]
fn no_qualifying_frame_is_a_normal_outcome() {
    let frames = (0..4).map(|_| uniform_frame(48, 64, 120.0)).collect();
    let mut source = ScriptedSource::new(frames, 0.0);
    let mut detector = ScriptedDetector::new(vec![FaceScan::Landmarks(closed_eyes_landmarks()); 4]);
    let mut cropper = FaceCropper::new(Box::new(FixedLocator { face: None }));
    let selector = BestFrameSelector::default();

    let (base_name, frame) = best_frame_from_source(
        &mut source,
        Some("empty".to_string()),
        &mut detector,
        &mut cropper,
        &selector,
    )
    .expect("pipeline failed");

    assert_eq!(base_name.as_deref(), Some("empty"));
    assert!(frame.is_none());
    assert!(source.released);
}

/// When cropping finds no face the uncropped winner is returned.
#[test]
fn crop_failure_falls_back_to_the_uncropped_frame() {
    let mut source = ScriptedSource::new(vec![uniform_frame(48, 64, 90.0)], 0.0);
    let mut detector = ScriptedDetector::new(vec![FaceScan::Landmarks(open_face_landmarks())]);
    let mut cropper = FaceCropper::new(Box::new(FixedLocator { face: None }));
    let selector = BestFrameSelector::default();

    let (_, frame) = best_frame_from_source(
        &mut source,
        Some("clip".to_string()),
        &mut detector,
        &mut cropper,
        &selector,
    )
    .expect("pipeline failed");

    let frame = frame.expect("expected the uncropped winner");
    assert_eq!((frame.cols(), frame.rows()), (64, 48));
}

/// A source that is not open aborts the scan without reading frames and
/// still releases the resource.
#[test]
fn closed_source_is_released_without_reads() {
    let mut source = ScriptedSource::closed();
    let mut detector = ScriptedDetector::new(Vec::new());
    let selector = BestFrameSelector::default();

    let result = selector.select_best(&mut source, &mut detector);
    assert!(matches!(result, Err(Error::StreamOpen(_))));
    assert_eq!(source.reads, 0);
    assert!(source.released);
}

/// A video input that fails to open yields `(None, None)` without touching
/// the detector.
#[test]
fn unopenable_input_yields_no_result() {
    let mut detector = ScriptedDetector::new(Vec::new());
    let mut cropper = FaceCropper::new(Box::new(FixedLocator { face: None }));
    let selector = BestFrameSelector::default();

    let (base_name, frame) = best_frame(
        "definitely/not/a/real/video.mp4",
        &mut detector,
        &mut cropper,
        &selector,
    )
    .expect("open failure must not be an error");

    assert!(base_name.is_none());
    assert!(frame.is_none());
    assert_eq!(detector.calls, 0);
}
