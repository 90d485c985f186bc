use chess_overlay_core::{BoardCorner, MarkerId};
use serde::{Deserialize, Serialize};

/// Marker ids glued to the four board corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerMarkerIds {
    pub a1: MarkerId,
    pub h1: MarkerId,
    pub a8: MarkerId,
    pub h8: MarkerId,
}

impl Default for CornerMarkerIds {
    fn default() -> Self {
        Self {
            a1: 0,
            h1: 1,
            a8: 2,
            h8: 3,
        }
    }
}

impl CornerMarkerIds {
    #[inline]
    pub fn id(&self, corner: BoardCorner) -> MarkerId {
        match corner {
            BoardCorner::A1 => self.a1,
            BoardCorner::H1 => self.h1,
            BoardCorner::A8 => self.a8,
            BoardCorner::H8 => self.h8,
        }
    }

    /// Which corner `id` marks, if any.
    pub fn corner_of(&self, id: MarkerId) -> Option<BoardCorner> {
        BoardCorner::ALL.into_iter().find(|&c| self.id(c) == id)
    }

    #[inline]
    pub fn contains(&self, id: MarkerId) -> bool {
        self.corner_of(id).is_some()
    }
}

/// Marker pair used by the manual fallback.
///
/// `origin` sits on e1 (the white king) and `reference` on d1 (the white
/// queen), so their distance is one square along the first rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCalibrationIds {
    pub origin: MarkerId,
    pub reference: MarkerId,
}

impl ManualCalibrationIds {
    #[inline]
    pub fn contains(&self, id: MarkerId) -> bool {
        id == self.origin || id == self.reference
    }
}

/// Board calibration settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    pub corner_ids: CornerMarkerIds,
    /// Scale applied toward the centroid after the corner markers are
    /// resolved. Corner markers sit outside the playing surface; this is the
    /// ratio of the playing surface to the marker quadrilateral.
    pub inset_scale: f32,
    /// Optional king/queen fallback when corner markers are not usable.
    pub manual: Option<ManualCalibrationIds>,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            corner_ids: CornerMarkerIds::default(),
            inset_scale: 0.8,
            manual: None,
        }
    }
}

impl CalibrationParams {
    /// True for ids consumed by calibration rather than tracked as pieces.
    ///
    /// Manual calibration markers are real pieces, so they are not reserved.
    pub fn is_calibration_marker(&self, id: MarkerId) -> bool {
        self.corner_ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_lookup_by_id() {
        let ids = CornerMarkerIds {
            a1: 10,
            h1: 11,
            a8: 12,
            h8: 13,
        };
        assert_eq!(ids.corner_of(12), Some(BoardCorner::A8));
        assert_eq!(ids.corner_of(4), None);
        assert!(ids.contains(13));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: CalibrationParams =
            serde_json::from_str(r#"{"inset_scale": 0.9}"#).expect("parse");
        assert_eq!(params.corner_ids, CornerMarkerIds::default());
        assert!((params.inset_scale - 0.9).abs() < 1e-6);
        assert!(params.manual.is_none());
    }
}
