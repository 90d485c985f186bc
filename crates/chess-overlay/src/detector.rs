//! Seam to the external marker detector.

use chess_overlay_core::DetectedMarker;

/// A failed detection call. The session logs it and keeps running.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("marker detector failed: {message}")]
pub struct DetectorError {
    message: String,
}

impl DetectorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Anything that produces the markers visible in the current camera frame.
///
/// Only the id and the outline centroid are used downstream.
pub trait MarkerDetector {
    fn detect(&mut self) -> Result<Vec<DetectedMarker>, DetectorError>;
}

impl<F> MarkerDetector for F
where
    F: FnMut() -> Result<Vec<DetectedMarker>, DetectorError>,
{
    fn detect(&mut self) -> Result<Vec<DetectedMarker>, DetectorError> {
        self()
    }
}
