//! Completing the four board corners from a partial set.
//!
//! Two corners are completed as a square: a diagonal pair is rotated about
//! its midpoint, an edge pair is translated along its perpendicular. Three
//! corners are completed as a parallelogram.

use chess_overlay_core::{file_dir, rank_dir, BoardCorner, MarkerId};
use nalgebra::Point2;

use crate::error::CalibrationError;
use crate::params::CornerMarkerIds;

/// Points coincide below this distance, in pixels.
const MIN_CORNER_SEPARATION: f32 = 1e-3;

/// Corner positions known for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerSet {
    points: [Option<Point2<f32>>; 4],
}

impl CornerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up every corner marker through `lookup`.
    pub fn collect<F>(ids: &CornerMarkerIds, lookup: F) -> Self
    where
        F: Fn(MarkerId) -> Option<Point2<f32>>,
    {
        let mut set = Self::new();
        for corner in BoardCorner::ALL {
            if let Some(p) = lookup(ids.id(corner)) {
                set.set(corner, p);
            }
        }
        set
    }

    pub fn with(mut self, corner: BoardCorner, p: Point2<f32>) -> Self {
        self.set(corner, p);
        self
    }

    pub fn set(&mut self, corner: BoardCorner, p: Point2<f32>) {
        self.points[corner.index()] = Some(p);
    }

    #[inline]
    pub fn get(&self, corner: BoardCorner) -> Option<Point2<f32>> {
        self.points[corner.index()]
    }

    /// Known corners in `a1, h1, a8, h8` order.
    pub fn present(&self) -> Vec<BoardCorner> {
        BoardCorner::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// Bit `i` set when corner `BoardCorner::ALL[i]` is known.
    pub fn mask(&self) -> u8 {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_some())
            .fold(0u8, |m, (i, _)| m | (1 << i))
    }
}

/// Complete all four corners, ordered `a1, h1, a8, h8`.
pub fn resolve_corners(known: &CornerSet) -> Result<[Point2<f32>; 4], CalibrationError> {
    let present = known.present();
    match present.as_slice() {
        [a, b] => complete_from_pair(known, *a, *b),
        [_, _, _] => Ok(complete_parallelogram(known)),
        [_, _, _, _] => {
            Ok(BoardCorner::ALL.map(|c| known.get(c).unwrap_or_else(Point2::origin)))
        }
        _ => Err(CalibrationError::InsufficientCorners {
            visible: present.len(),
        }),
    }
}

fn complete_from_pair(
    known: &CornerSet,
    first: BoardCorner,
    second: BoardCorner,
) -> Result<[Point2<f32>; 4], CalibrationError> {
    use BoardCorner::{A1, A8, H1, H8};

    let (Some(p), Some(q)) = (known.get(first), known.get(second)) else {
        return Err(CalibrationError::InsufficientCorners {
            visible: known.count(),
        });
    };
    if (q - p).norm() < MIN_CORNER_SEPARATION {
        return Err(CalibrationError::UnresolvableTopology { first, second });
    }

    // [a1, h1, a8, h8]
    let corners = match (first, second) {
        (A1, H8) => {
            let mid = nalgebra::center(&p, &q);
            let turn = rank_dir((q - p) * 0.5);
            [p, mid - turn, mid + turn, q]
        }
        (H1, A8) => {
            let mid = nalgebra::center(&p, &q);
            let turn = rank_dir((q - p) * 0.5);
            [mid + turn, p, q, mid - turn]
        }
        (A1, H1) => {
            let up = rank_dir(q - p);
            [p, q, p + up, q + up]
        }
        (A8, H8) => {
            let up = rank_dir(q - p);
            [p - up, q - up, p, q]
        }
        (A1, A8) => {
            let right = file_dir(q - p);
            [p, p + right, q, q + right]
        }
        (H1, H8) => {
            let right = file_dir(q - p);
            [p - right, p, q - right, q]
        }
        _ => return Err(CalibrationError::UnresolvableTopology { first, second }),
    };
    Ok(corners)
}

fn complete_parallelogram(known: &CornerSet) -> [Point2<f32>; 4] {
    let mut out = [Point2::origin(); 4];
    for corner in BoardCorner::ALL {
        out[corner.index()] = match known.get(corner) {
            Some(p) => p,
            None => {
                // The missing corner closes the parallelogram spanned by its
                // two neighbours around the opposite corner.
                let opposite = corner.opposite();
                let o = known.get(opposite).unwrap_or_else(Point2::origin);
                let sum = BoardCorner::ALL
                    .into_iter()
                    .filter(|c| *c != corner && *c != opposite)
                    .filter_map(|c| known.get(c))
                    .fold(nalgebra::Vector2::zeros(), |acc, n| acc + n.coords);
                Point2::from(sum - o.coords)
            }
        };
    }
    out
}
