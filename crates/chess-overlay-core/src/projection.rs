//! Pixel -> square projection in the oblique board frame.
//!
//! The frame is not orthonormalized: each coordinate is the scalar projection
//! onto its own axis, so mildly sheared quadrilaterals still map sensibly.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::board::{BoardFrame, Square, BOARD_SIZE};

/// Projection tolerances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    /// Accepted overshoot past the board edge, as a fraction of the board.
    pub margin: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self { margin: 0.1 }
    }
}

/// Normalized board coordinates of a pixel: `file` is 0 at the a-file edge
/// and 1 at the h-file edge, `rank` is 0 at rank 1 and 1 at rank 8.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardCoords {
    pub file: f32,
    pub rank: f32,
}

/// Express `point` in the frame's oblique basis. `None` for degenerate axes.
pub fn board_coords(point: Point2<f32>, frame: &BoardFrame) -> Option<BoardCoords> {
    let rel = point - frame.a1;
    let file = scalar_projection(rel, frame.file_axis())?;
    let rank = scalar_projection(rel, frame.rank_axis())?;
    Some(BoardCoords { file, rank })
}

fn scalar_projection(v: Vector2<f32>, axis: Vector2<f32>) -> Option<f32> {
    let len2 = axis.norm_squared();
    if !len2.is_finite() || len2 <= f32::EPSILON {
        return None;
    }
    Some(v.dot(&axis) / len2)
}

/// Map a pixel onto a square using the default 10% margin.
pub fn project(point: Point2<f32>, frame: &BoardFrame) -> Option<Square> {
    project_with_margin(point, frame, ProjectionParams::default().margin)
}

/// Map a pixel onto a square.
///
/// Points whose normalized coordinates fall outside `[-margin, 1 + margin]`
/// are rejected, and so are points inside the margin band that do not land
/// on one of the 64 squares.
pub fn project_with_margin(point: Point2<f32>, frame: &BoardFrame, margin: f32) -> Option<Square> {
    let coords = board_coords(point, frame)?;
    let lo = -margin;
    let hi = 1.0 + margin;
    if !(lo..=hi).contains(&coords.file) || !(lo..=hi).contains(&coords.rank) {
        return None;
    }

    let col = (coords.file * BOARD_SIZE as f32).floor();
    let row_from_rank1 = (coords.rank * BOARD_SIZE as f32).floor();
    let max = (BOARD_SIZE - 1) as f32;
    if !(0.0..=max).contains(&col) || !(0.0..=max).contains(&row_from_rank1) {
        return None;
    }

    Square::new(max as u8 - row_from_rank1 as u8, col as u8)
}

/// Pixel position of the center of `square`.
pub fn square_center(square: Square, frame: &BoardFrame) -> Point2<f32> {
    let n = BOARD_SIZE as f32;
    let file = (square.col as f32 + 0.5) / n;
    let rank = ((BOARD_SIZE - 1 - square.row as usize) as f32 + 0.5) / n;
    frame.a1 + frame.file_axis() * file + frame.rank_axis() * rank
}
