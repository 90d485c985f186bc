use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Fiducial marker identifier as reported by the detector.
pub type MarkerId = u32;

/// Piece identifier. Pieces are tracked through the marker glued onto them,
/// so a piece id is the marker id of that marker.
pub type PieceId = MarkerId;

/// Milliseconds on a caller-supplied monotonic clock.
pub type Timestamp = u64;

/// One marker as reported by the external detector for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    pub id: MarkerId,
    /// Marker outline in image pixels, in detector order.
    pub corners: [Point2<f32>; 4],
}

impl DetectedMarker {
    pub fn new(id: MarkerId, corners: [Point2<f32>; 4]) -> Self {
        Self { id, corners }
    }

    /// Mean of the four outline corners.
    pub fn centroid(&self) -> Point2<f32> {
        let sum = self
            .corners
            .iter()
            .fold(nalgebra::Vector2::zeros(), |acc, c| acc + c.coords);
        Point2::from(sum / 4.0)
    }

    /// Convert into a registry observation stamped with `now`.
    pub fn observe(&self, now: Timestamp) -> MarkerObservation {
        MarkerObservation {
            id: self.id,
            position: self.centroid(),
            last_seen: now,
        }
    }
}

/// Latest known position of a tracked marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub id: MarkerId,
    /// Marker centroid in image pixels.
    pub position: Point2<f32>,
    pub last_seen: Timestamp,
}

impl MarkerObservation {
    pub fn new(id: MarkerId, x: f32, y: f32, last_seen: Timestamp) -> Self {
        Self {
            id,
            position: Point2::new(x, y),
            last_seen,
        }
    }

    /// Milliseconds since the marker was last seen, saturating at zero for
    /// observations stamped in the future.
    #[inline]
    pub fn age(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.last_seen)
    }
}

/// Listing entry for operator-facing marker lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSummary {
    pub id: MarkerId,
    /// Centroid rounded to whole pixels.
    pub x: i32,
    pub y: i32,
    /// Seen recently enough to count as live rather than remembered.
    pub active: bool,
}
