//! High-level facade crate for the `chess-overlay-*` workspace.
//!
//! This crate provides:
//! - re-exports of the calibration, tracking and core crates
//! - [`OverlaySession`], the explicit per-capture context that turns a stream
//!   of marker detections into a calibrated board frame and a stable piece
//!   layout
//! - JSON configuration and offline replay of recorded detector output
//!
//! ## Quickstart
//!
//! ```
//! use chess_overlay::{DetectedMarker, OverlaySession, SessionConfig};
//! use nalgebra::Point2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = OverlaySession::new(SessionConfig::default())?;
//! session.start();
//!
//! let marker = |id, x: f32, y: f32| {
//!     let h = 5.0;
//!     DetectedMarker::new(
//!         id,
//!         [
//!             Point2::new(x - h, y - h),
//!             Point2::new(x + h, y - h),
//!             Point2::new(x + h, y + h),
//!             Point2::new(x - h, y + h),
//!         ],
//!     )
//! };
//! // Corner markers 0..=3 at a1, h1, a8, h8 and one piece marker.
//! let frame = [
//!     marker(0, 0.0, 500.0),
//!     marker(1, 500.0, 500.0),
//!     marker(2, 0.0, 0.0),
//!     marker(3, 500.0, 0.0),
//!     marker(12, 275.0, 425.0),
//! ];
//! let report = session.tick(&frame, 0);
//! let occupancy = report.occupancy.expect("first tick updates the tracker");
//! println!("{occupancy}");
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chess_overlay::core`: markers, board frame, squares and projection.
//! - `chess_overlay::calib`: corner inference and sticky calibration.
//! - `chess_overlay::tracking`: marker registry and occupancy tracker.

pub use chess_overlay_calib as calib;
pub use chess_overlay_core as core;
pub use chess_overlay_tracking as tracking;

pub use chess_overlay_calib::{CalibrationError, CalibrationSource, CalibrationStatus, StatusChange};
pub use chess_overlay_core::{
    init_with_level, project, square_center, BoardFrame, DetectedMarker, MarkerId, PieceId,
    Square, Timestamp,
};
pub use chess_overlay_tracking::{StableOccupancy, TrackingParams};

#[cfg(feature = "tracing")]
pub use chess_overlay_core::init_tracing;

mod config;
mod detector;
mod replay;
mod session;

pub use config::{OverlayIoError, SessionConfig, SessionConfigError};
pub use detector::{DetectorError, MarkerDetector};
pub use replay::{
    run_replay, OccupancySnapshot, ReplayFrame, ReplayLog, ReplayReport, TimedDetectorError,
    TimedStatusChange,
};
pub use session::{OverlaySession, TickOutcome, TickReport, UpdateThrottle};
