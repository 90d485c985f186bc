//! King/queen fallback calibration.
//!
//! One edge sample is enough for a square board: the king-queen distance is
//! one square along the first rank, and the rest of the board is extrapolated
//! from it. There is no inset because the markers sit on the playing surface.

use chess_overlay_core::{rank_dir, BoardFrame, BOARD_SIZE};
use nalgebra::Point2;

use crate::error::CalibrationError;

/// Files between the king's file and the a-file corner.
const ORIGIN_FILE_OFFSET: f32 = 4.0;

/// Build a board frame from the king (`origin`, e1) and queen (`reference`,
/// d1) marker centroids.
pub fn manual_frame(
    origin: Point2<f32>,
    reference: Point2<f32>,
) -> Result<BoardFrame, CalibrationError> {
    // One square towards the h-file.
    let unit = origin - reference;
    if unit.norm() < 1e-3 {
        return Err(CalibrationError::DegenerateManualPair);
    }
    let n = BOARD_SIZE as f32;
    let file = unit * n;
    let rank = rank_dir(unit) * n;

    let a1 = origin - unit * ORIGIN_FILE_OFFSET;
    let h1 = a1 + file;
    Ok(BoardFrame::new(a1, h1, a1 + rank, h1 + rank))
}
