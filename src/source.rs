//! Video frame sources.
//!
//! The selector pulls frames through the [`FrameSource`] abstraction so that
//! the surrounding system (or a test) decides where frames come from.
//! [`VideoFileSource`] is the production implementation over
//! `opencv::videoio::VideoCapture`, which handles both local paths and
//! remote URLs.

use crate::{Error, Result};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

/// A decoded, sequential video frame source.
///
/// The resource is scoped to one selection pass: the selector releases it on
/// every exit path, and implementations must tolerate repeated `release`
/// calls.
pub trait FrameSource {
    /// Whether the source is open and can deliver frames
    fn is_open(&self) -> bool;

    /// Read the next frame; `Ok(None)` signals end of stream.
    ///
    /// Each call returns a freshly owned frame buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    fn read_next_frame(&mut self) -> Result<Option<Mat>>;

    /// Nominal frame rate reported by the container, or 0 when unknown
    fn frame_rate(&self) -> f64;

    /// Release the underlying decoder resource
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be released cleanly.
    fn release(&mut self) -> Result<()>;
}

/// Frame source over a video file or URL, backed by `VideoCapture`
pub struct VideoFileSource {
    capture: VideoCapture,
    released: bool,
}

impl VideoFileSource {
    /// Open a video from a local path or a URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamOpen`] if the container cannot be opened.
    pub fn open(input: &str) -> Result<Self> {
        let capture = VideoCapture::from_file(input, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::StreamOpen(format!("failed to open video source: {input}")));
        }
        log::info!("Opened video source: {input}");
        Ok(Self {
            capture,
            released: false,
        })
    }
}

impl FrameSource for VideoFileSource {
    fn is_open(&self) -> bool {
        !self.released && self.capture.is_opened().unwrap_or(false)
    }

    fn read_next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let has_frame = self.capture.read(&mut frame)?;
        if !has_frame || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> f64 {
        self.capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0)
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.capture.release()?;
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release video capture: {e}");
        }
    }
}
