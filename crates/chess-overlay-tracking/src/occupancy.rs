//! Confidence-smoothed square occupancy.
//!
//! Every square carries the piece last seen on it and an integer confidence.
//! Sightings raise the confidence, misses decay it, and the stable view only
//! shows pieces at or above the display threshold. A piece id claimed by
//! several confident squares is kept on the most confident one.

use std::collections::BTreeMap;
use std::fmt;

use chess_overlay_core::{PieceId, Square, BOARD_SIZE};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::TrackingParams;

const SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

/// Tracking state of one square.
///
/// `piece == None` always comes with `confidence == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareState {
    pub piece: Option<PieceId>,
    pub confidence: u32,
}

impl SquareState {
    fn clear(&mut self) {
        self.piece = None;
        self.confidence = 0;
    }

    /// Lower the confidence, forgetting the piece when it runs out.
    fn weaken(&mut self, step: u32) {
        self.confidence = self.confidence.saturating_sub(step);
        if self.confidence == 0 {
            self.clear();
        }
    }
}

/// Threshold-gated view of the tracking grid, indexed `[row][col]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableOccupancy {
    rows: [[Option<PieceId>; BOARD_SIZE]; BOARD_SIZE],
}

impl StableOccupancy {
    #[inline]
    pub fn get(&self, square: Square) -> Option<PieceId> {
        self.rows[square.row as usize][square.col as usize]
    }

    #[inline]
    pub fn rows(&self) -> &[[Option<PieceId>; BOARD_SIZE]; BOARD_SIZE] {
        &self.rows
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, PieceId)> + '_ {
        Square::all().filter_map(|sq| self.get(sq).map(|id| (sq, id)))
    }

    /// Square showing `piece`, if any.
    pub fn find(&self, piece: PieceId) -> Option<Square> {
        self.pieces().find(|(_, id)| *id == piece).map(|(sq, _)| sq)
    }

    pub fn is_empty(&self) -> bool {
        self.pieces().next().is_none()
    }
}

impl fmt::Display for StableOccupancy {
    /// Rank 8 first; `.` for empty squares, the piece id otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.rows.iter().enumerate() {
            write!(f, "{} ", BOARD_SIZE - row)?;
            for cell in cells {
                match cell {
                    Some(id) => write!(f, "{id:>3}")?,
                    None => write!(f, "  .")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for col in 0..BOARD_SIZE as u8 {
            write!(f, "  {}", (b'a' + col) as char)?;
        }
        Ok(())
    }
}

/// Bookkeeping from the most recent update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStats {
    /// Detections handed to the update.
    pub detections: usize,
    /// Detections that landed on a square already claimed in the same update.
    pub square_collisions: usize,
    /// Squares weakened because another square held the same piece.
    pub duplicates_resolved: usize,
}

#[derive(Clone, Debug)]
pub struct OccupancyTracker {
    params: TrackingParams,
    cells: [SquareState; SQUARES],
    stable: StableOccupancy,
    stats: UpdateStats,
}

impl OccupancyTracker {
    pub fn new(params: TrackingParams) -> Self {
        Self {
            params,
            cells: [SquareState::default(); SQUARES],
            stable: StableOccupancy::default(),
            stats: UpdateStats::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> &TrackingParams {
        &self.params
    }

    #[inline]
    pub fn cell(&self, square: Square) -> SquareState {
        self.cells[square.index()]
    }

    /// Stable view as of the last update.
    #[inline]
    pub fn stable(&self) -> &StableOccupancy {
        &self.stable
    }

    #[inline]
    pub fn last_stats(&self) -> UpdateStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.cells = [SquareState::default(); SQUARES];
        self.stable = StableOccupancy::default();
        self.stats = UpdateStats::default();
    }

    /// Run one confidence update from this cycle's `(square, piece)` sightings.
    ///
    /// When two sightings land on the same square the later one wins.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, detections), fields(n = detections.len()))
    )]
    pub fn update(&mut self, detections: &[(Square, PieceId)]) -> &StableOccupancy {
        let mut stats = UpdateStats {
            detections: detections.len(),
            ..UpdateStats::default()
        };

        let mut seen: [Option<PieceId>; SQUARES] = [None; SQUARES];
        for &(square, piece) in detections {
            if let Some(previous) = seen[square.index()].replace(piece) {
                if previous != piece {
                    debug!("square {square}: piece {piece} replaces {previous} in one update");
                    stats.square_collisions += 1;
                }
            }
        }

        let p = self.params;
        for (cell, sighting) in self.cells.iter_mut().zip(seen) {
            match sighting {
                Some(piece) if cell.piece == Some(piece) => {
                    cell.confidence = cell
                        .confidence
                        .saturating_add(p.increase_step)
                        .min(p.max_confidence);
                }
                Some(piece) => {
                    cell.piece = Some(piece);
                    cell.confidence = p.initial_confidence.min(p.max_confidence);
                }
                None if cell.piece.is_some() => cell.weaken(p.decay_step),
                None => {}
            }
        }

        stats.duplicates_resolved = self.resolve_duplicates();
        self.stats = stats;
        self.refresh_stable();
        &self.stable
    }

    /// Keep each confidently tracked piece on its most confident square only.
    ///
    /// Returns the number of squares weakened.
    fn resolve_duplicates(&mut self) -> usize {
        let threshold = self.params.display_threshold;
        let mut claims: BTreeMap<PieceId, Vec<usize>> = BTreeMap::new();
        for (idx, cell) in self.cells.iter().enumerate() {
            if let Some(piece) = cell.piece {
                if cell.confidence >= threshold {
                    claims.entry(piece).or_default().push(idx);
                }
            }
        }

        let mut weakened = 0;
        for (piece, mut squares) in claims {
            if squares.len() < 2 {
                continue;
            }
            // Stable: equal confidence keeps row-major order.
            squares.sort_by(|&a, &b| self.cells[b].confidence.cmp(&self.cells[a].confidence));
            for &idx in &squares[1..] {
                debug!(
                    "piece {piece} also claimed by square {}, confidence {}",
                    Square::from_index(idx).map(|s| s.to_string()).unwrap_or_default(),
                    self.cells[idx].confidence
                );
                self.cells[idx].weaken(self.params.increase_step);
                weakened += 1;
            }
        }
        weakened
    }

    fn refresh_stable(&mut self) {
        let threshold = self.params.display_threshold;
        for sq in Square::all() {
            let cell = self.cells[sq.index()];
            self.stable.rows[sq.row as usize][sq.col as usize] =
                cell.piece.filter(|_| cell.confidence >= threshold);
        }
    }
}

impl Default for OccupancyTracker {
    fn default() -> Self {
        Self::new(TrackingParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).expect("square")
    }

    fn params() -> TrackingParams {
        TrackingParams {
            display_threshold: 2,
            decay_step: 1,
            increase_step: 2,
            initial_confidence: 3,
            max_confidence: 10,
        }
    }

    #[test]
    fn fresh_sighting_displays_immediately() {
        let mut t = OccupancyTracker::new(params());
        let stable = t.update(&[(sq(6, 4), 12)]);
        assert_eq!(stable.get(sq(6, 4)), Some(12));
        assert_eq!(
            t.cell(sq(6, 4)),
            SquareState {
                piece: Some(12),
                confidence: 3
            }
        );
    }

    #[test]
    fn confidence_saturates_both_ways() {
        let mut t = OccupancyTracker::new(params());
        for _ in 0..50 {
            t.update(&[(sq(0, 0), 7)]);
            assert!(t.cell(sq(0, 0)).confidence <= 10);
        }
        assert_eq!(t.cell(sq(0, 0)).confidence, 10);

        for _ in 0..50 {
            t.update(&[]);
        }
        assert_eq!(t.cell(sq(0, 0)), SquareState::default());
        assert!(t.stable().is_empty());
    }

    #[test]
    fn confidence_at_u32_max_does_not_overflow() {
        let p = TrackingParams {
            display_threshold: 1,
            decay_step: 1,
            increase_step: u32::MAX,
            initial_confidence: u32::MAX,
            max_confidence: u32::MAX,
        };
        assert_eq!(p.validate(), Ok(()));
        let mut t = OccupancyTracker::new(p);
        for _ in 0..3 {
            t.update(&[(sq(4, 4), 9)]);
        }
        assert_eq!(t.cell(sq(4, 4)).confidence, u32::MAX);
        assert_eq!(t.stable().get(sq(4, 4)), Some(9));
    }

    #[test]
    fn single_miss_keeps_a_settled_piece() {
        let p = params();
        let mut t = OccupancyTracker::new(p);
        t.update(&[(sq(3, 3), 5)]);
        t.update(&[(sq(3, 3), 5)]);
        // initial 3 + one increase of 2 = threshold + 3
        assert_eq!(t.cell(sq(3, 3)).confidence, 5);
        assert!(p.decay_step < t.cell(sq(3, 3)).confidence - p.display_threshold + 1);

        let stable = t.update(&[]);
        assert_eq!(stable.get(sq(3, 3)), Some(5));
    }

    #[test]
    fn different_piece_replaces_and_restarts() {
        let mut t = OccupancyTracker::new(params());
        for _ in 0..4 {
            t.update(&[(sq(1, 1), 20)]);
        }
        t.update(&[(sq(1, 1), 21)]);
        assert_eq!(
            t.cell(sq(1, 1)),
            SquareState {
                piece: Some(21),
                confidence: 3
            }
        );
    }

    #[test]
    fn duplicate_piece_keeps_most_confident_square() {
        let mut t = OccupancyTracker::new(params());
        t.cells[sq(2, 2).index()] = SquareState {
            piece: Some(8),
            confidence: 6,
        };
        t.cells[sq(5, 5).index()] = SquareState {
            piece: Some(8),
            confidence: 9,
        };
        assert_eq!(t.resolve_duplicates(), 1);
        assert_eq!(t.cell(sq(5, 5)).confidence, 9);
        assert_eq!(t.cell(sq(2, 2)).confidence, 4);
        assert_eq!(t.cell(sq(2, 2)).piece, Some(8));
    }

    #[test]
    fn duplicate_below_step_is_cleared() {
        let mut t = OccupancyTracker::new(params());
        t.cells[sq(0, 1).index()] = SquareState {
            piece: Some(8),
            confidence: 2,
        };
        t.cells[sq(0, 2).index()] = SquareState {
            piece: Some(8),
            confidence: 9,
        };
        t.resolve_duplicates();
        assert_eq!(t.cell(sq(0, 1)), SquareState::default());
    }

    #[test]
    fn moved_piece_shows_once_old_square_fades() {
        let mut t = OccupancyTracker::new(TrackingParams::default());
        for _ in 0..10 {
            t.update(&[(sq(6, 4), 1)]);
        }
        assert_eq!(t.stable().find(1), Some(sq(6, 4)));

        // The old square wins every duplicate check until it decays to the
        // new square's confidence; ties keep the square that comes first in
        // row-major order, here the new one.
        let mut settled_after = None;
        for step in 1..=20 {
            let stable = t.update(&[(sq(4, 4), 1)]);
            if stable.get(sq(6, 4)).is_none() {
                assert_eq!(stable.find(1), Some(sq(4, 4)));
                settled_after = Some(step);
                break;
            }
            assert_eq!(t.last_stats().duplicates_resolved, 1);
        }
        assert_eq!(settled_after, Some(7));
    }

    #[test]
    fn same_square_collision_last_wins() {
        let mut t = OccupancyTracker::new(params());
        t.update(&[(sq(4, 4), 30), (sq(4, 4), 31)]);
        assert_eq!(t.cell(sq(4, 4)).piece, Some(31));
        assert_eq!(t.last_stats().square_collisions, 1);
    }

    #[test]
    fn display_renders_ranks_top_down() {
        let mut t = OccupancyTracker::new(params());
        t.update(&[(sq(0, 0), 42)]);
        let text = t.stable().to_string();
        let first = text.lines().next().expect("line");
        assert!(first.starts_with("8  42"), "{first}");
        assert!(text.ends_with("  a  b  c  d  e  f  g  h"));
    }
}
