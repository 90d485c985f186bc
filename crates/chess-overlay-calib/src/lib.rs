//! Board calibration from fiducial corner markers.
//!
//! Four markers designate the corners `a1`, `h1`, `a8` and `h8`. Any two of
//! them are enough to recover the board as a square, three close it as a
//! parallelogram, and with all four nothing is inferred. The recovered
//! quadrilateral is then inset toward its centroid, because the corner
//! markers sit outside the playing surface.
//!
//! When the corner markers are unusable, an optional king/queen pair can
//! stand in: their distance is one square along the first rank.

mod calibrator;
mod corners;
mod error;
mod manual;
mod params;

pub use calibrator::{
    calibrate, BoardCalibrator, Calibration, CalibrationSource, CalibrationStatus, StatusChange,
};
pub use corners::{resolve_corners, CornerSet};
pub use error::CalibrationError;
pub use manual::manual_frame;
pub use params::{CalibrationParams, CornerMarkerIds, ManualCalibrationIds};
