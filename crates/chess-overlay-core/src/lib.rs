//! Core types for marker-based chessboard overlays.
//!
//! This crate is small and purely geometric: marker observations, the
//! calibrated board frame, squares, and the pixel -> square projection. It
//! does not know how markers are detected or how the board is calibrated.

mod board;
mod logger;
mod marker;
mod projection;

pub use board::{file_dir, rank_dir, BoardCorner, BoardFrame, Square, BOARD_SIZE};
pub use marker::{
    DetectedMarker, MarkerId, MarkerObservation, MarkerSummary, PieceId, Timestamp,
};
pub use projection::{
    board_coords, project, project_with_margin, square_center, BoardCoords, ProjectionParams,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
