//! Board frame and square types.
//!
//! Pixel space is the camera image: x to the right, y down. The board is
//! viewed from white's side, so rank 1 is nearer the bottom of the image and
//! the rank axis is the file axis turned by -90° on screen.

use std::fmt;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Number of files and ranks on the board.
pub const BOARD_SIZE: usize = 8;

/// Rotate a file-direction vector into the matching rank direction.
///
/// `(x, y) -> (y, -x)`: in a y-down image this turns "towards h" into
/// "towards rank 8".
#[inline]
pub fn rank_dir(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(v.y, -v.x)
}

/// Inverse of [`rank_dir`]: rotate a rank-direction vector back into the file
/// direction.
#[inline]
pub fn file_dir(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(-v.y, v.x)
}

/// Logical board corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardCorner {
    A1,
    H1,
    A8,
    H8,
}

impl BoardCorner {
    pub const ALL: [BoardCorner; 4] = [
        BoardCorner::A1,
        BoardCorner::H1,
        BoardCorner::A8,
        BoardCorner::H8,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            BoardCorner::A1 => 0,
            BoardCorner::H1 => 1,
            BoardCorner::A8 => 2,
            BoardCorner::H8 => 3,
        }
    }

    /// Corner on the other end of the board diagonal.
    pub fn opposite(self) -> BoardCorner {
        match self {
            BoardCorner::A1 => BoardCorner::H8,
            BoardCorner::H1 => BoardCorner::A8,
            BoardCorner::A8 => BoardCorner::H1,
            BoardCorner::H8 => BoardCorner::A1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BoardCorner::A1 => "a1",
            BoardCorner::H1 => "h1",
            BoardCorner::A8 => "a8",
            BoardCorner::H8 => "h8",
        }
    }
}

impl fmt::Display for BoardCorner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Calibrated board corners in image pixels.
///
/// The four points form an oblique frame with origin `a1`, file axis
/// `h1 - a1` and rank axis `a8 - a1`. `h8` is kept for rendering and for the
/// inset step; projection only uses the other three.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardFrame {
    pub a1: Point2<f32>,
    pub h1: Point2<f32>,
    pub a8: Point2<f32>,
    pub h8: Point2<f32>,
}

impl BoardFrame {
    pub fn new(a1: Point2<f32>, h1: Point2<f32>, a8: Point2<f32>, h8: Point2<f32>) -> Self {
        Self { a1, h1, a8, h8 }
    }

    /// Build from corners ordered as [`BoardCorner::ALL`].
    pub fn from_corners(corners: [Point2<f32>; 4]) -> Self {
        let [a1, h1, a8, h8] = corners;
        Self { a1, h1, a8, h8 }
    }

    /// Corners ordered as [`BoardCorner::ALL`].
    pub fn corners(&self) -> [Point2<f32>; 4] {
        [self.a1, self.h1, self.a8, self.h8]
    }

    #[inline]
    pub fn corner(&self, corner: BoardCorner) -> Point2<f32> {
        self.corners()[corner.index()]
    }

    /// `h1 - a1`.
    #[inline]
    pub fn file_axis(&self) -> Vector2<f32> {
        self.h1 - self.a1
    }

    /// `a8 - a1`.
    #[inline]
    pub fn rank_axis(&self) -> Vector2<f32> {
        self.a8 - self.a1
    }

    pub fn centroid(&self) -> Point2<f32> {
        let sum = self.a1.coords + self.h1.coords + self.a8.coords + self.h8.coords;
        Point2::from(sum / 4.0)
    }

    /// Scale every corner about the centroid: `c + (p - c) * scale`.
    pub fn scaled_about_centroid(&self, scale: f32) -> Self {
        let c = self.centroid();
        let s = |p: Point2<f32>| c + (p - c) * scale;
        Self {
            a1: s(self.a1),
            h1: s(self.h1),
            a8: s(self.a8),
            h8: s(self.h8),
        }
    }

    /// Largest distance between `h8` and the parallelogram closure
    /// `h1 + a8 - a1`. Zero for an exact parallelogram.
    pub fn parallelogram_residual(&self) -> f32 {
        let closure = self.h1 + (self.a8 - self.a1);
        (self.h8 - closure).norm()
    }
}

/// One board square. Row 0 is rank 8, row 7 is rank 1; column 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    /// Returns `None` when either index is outside `0..8`.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Rank number, 1..=8.
    #[inline]
    pub fn rank(self) -> u8 {
        BOARD_SIZE as u8 - self.row
    }

    /// File letter, `'a'..='h'`.
    #[inline]
    pub fn file(self) -> char {
        (b'a' + self.col) as char
    }

    /// Row-major index in `0..64`.
    #[inline]
    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= BOARD_SIZE * BOARD_SIZE {
            return None;
        }
        Some(Self {
            row: (index / BOARD_SIZE) as u8,
            col: (index % BOARD_SIZE) as u8,
        })
    }

    /// All 64 squares in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE * BOARD_SIZE).filter_map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}
