//! Best still-frame extraction from video.
//!
//! This library scans a video stream, rejects frames without a well-posed
//! frontal face and returns the highest-quality survivor, cropped to a
//! padded face bounding box. It is built on:
//! - `OpenCV` for decoding, color conversion and the Laplacian filter
//! - ONNX Runtime for the face-detection and landmark models
//!
//! The selection pipeline:
//! 1. Frames are sampled at a fixed cadence (about 4 per source second)
//! 2. A landmark detector locates the primary face and its geometry
//! 3. The acceptance policy keeps frames with open eyes and a closed mouth
//! 4. Accepted frames are scored on sharpness, contrast and brightness
//! 5. The best-scoring frame is cropped around the detected face
//!
//! Two interchangeable landmark strategies plug into the selector: the dense
//! face-mesh model and the sparse 68-point pipeline. Both report only the
//! first detected face.
//!
//! # Examples
//!
//! ```no_run
//! use bestframe::crop::FaceCropper;
//! use bestframe::face_location::OnnxFaceLocator;
//! use bestframe::mesh::MeshLandmarkDetector;
//! use bestframe::selector::{best_frame, BestFrameSelector};
//! use opencv::prelude::*;
//!
//! # fn main() -> bestframe::Result<()> {
//! let mut detector = MeshLandmarkDetector::new("assets/face_mesh.onnx")?;
//! let locator = OnnxFaceLocator::new("assets/face_detector.onnx")?;
//! let mut cropper = FaceCropper::new(Box::new(locator));
//! let selector = BestFrameSelector::default();
//!
//! let (base_name, frame) = best_frame("clip.mp4", &mut detector, &mut cropper, &selector)?;
//! match frame {
//!     Some(frame) => println!("selected a {}x{} frame from {base_name:?}", frame.cols(), frame.rows()),
//!     None => println!("no suitable frame found"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Detector models are expensive to construct; build them once and reuse
//! them across videos. Each `detect` call is independent, so a shared
//! detector needs no per-call reset between frames.

#![allow(clippy::cast_precision_loss)] // pixel dimensions fit f32/f64 comfortably

/// Frame quality metrics and score weights
pub mod quality;

/// Landmark types, schemas and the detector capability trait
pub mod detector;

/// Face box localization trait and ONNX implementation
pub mod face_location;

/// Dense face-mesh landmark strategy
pub mod mesh;

/// Sparse 68-point landmark strategy
pub mod sparse;

/// Eyes-open/mouth-closed acceptance policy
pub mod acceptance;

/// Padded face cropping of the winning frame
pub mod crop;

/// Video frame source abstraction
pub mod source;

/// Best-frame selection pipeline
pub mod selector;

/// Utility functions for names, casts and tensor conversion
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
