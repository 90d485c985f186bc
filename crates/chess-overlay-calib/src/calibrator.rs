//! Sticky board calibration.
//!
//! Once a frame exists it is kept as long as the same corner markers remain
//! visible, so live jitter in their centroids does not move the board. The
//! frame is re-derived whenever the visible corner set changes, and on every
//! call while uncalibrated.

use std::fmt;

use chess_overlay_core::{BoardFrame, MarkerId};
use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::corners::{resolve_corners, CornerSet};
use crate::error::CalibrationError;
use crate::manual::manual_frame;
use crate::params::CalibrationParams;

/// Where the current frame came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationSource {
    /// Corner markers, `visible` of them observed and the rest inferred.
    Corners { visible: usize },
    /// King/queen fallback.
    Manual,
}

/// Operator-facing calibration state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// No frame. `reason` is set after a failed attempt.
    Uncalibrated { reason: Option<String> },
    /// Frame inferred from two or three corner markers.
    Partial { visible: usize },
    /// Frame from all four corner markers, or from the manual fallback.
    Calibrated { source: CalibrationSource },
}

impl CalibrationStatus {
    #[inline]
    pub fn has_frame(&self) -> bool {
        !matches!(self, CalibrationStatus::Uncalibrated { .. })
    }

    fn from_source(source: CalibrationSource) -> Self {
        match source {
            CalibrationSource::Corners { visible } if visible < 4 => {
                CalibrationStatus::Partial { visible }
            }
            _ => CalibrationStatus::Calibrated { source },
        }
    }
}

impl Default for CalibrationStatus {
    fn default() -> Self {
        CalibrationStatus::Uncalibrated { reason: None }
    }
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationStatus::Uncalibrated { reason: None } => f.write_str("uncalibrated"),
            CalibrationStatus::Uncalibrated {
                reason: Some(reason),
            } => write!(f, "uncalibrated: {reason}"),
            CalibrationStatus::Partial { visible } => {
                write!(f, "calibrating ({visible} of 4 corner markers visible)")
            }
            CalibrationStatus::Calibrated {
                source: CalibrationSource::Manual,
            } => f.write_str("calibrated from king/queen markers"),
            CalibrationStatus::Calibrated { .. } => f.write_str("calibrated"),
        }
    }
}

/// A status transition, reported once when it happens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: CalibrationStatus,
    pub to: CalibrationStatus,
}

/// A successful calibration attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    pub frame: BoardFrame,
    pub source: CalibrationSource,
}

/// Derive a board frame from whatever markers `lookup` currently knows.
///
/// Corner markers are tried first; the manual pair is used only when they
/// fail. On a double failure the corner error is returned unless the manual
/// pair was present and itself unusable.
pub fn calibrate<F>(
    params: &CalibrationParams,
    lookup: F,
) -> Result<Calibration, CalibrationError>
where
    F: Fn(MarkerId) -> Option<Point2<f32>>,
{
    let corners = CornerSet::collect(&params.corner_ids, &lookup);
    let corner_err = match resolve_corners(&corners) {
        Ok(points) => {
            let frame = BoardFrame::from_corners(points).scaled_about_centroid(params.inset_scale);
            return Ok(Calibration {
                frame,
                source: CalibrationSource::Corners {
                    visible: corners.count(),
                },
            });
        }
        Err(err) => err,
    };

    let Some(manual) = params.manual else {
        return Err(corner_err);
    };
    match (lookup(manual.origin), lookup(manual.reference)) {
        (Some(origin), Some(reference)) => Ok(Calibration {
            frame: manual_frame(origin, reference)?,
            source: CalibrationSource::Manual,
        }),
        _ => Err(corner_err),
    }
}

/// Board calibration state for one capture session.
#[derive(Clone, Debug)]
pub struct BoardCalibrator {
    params: CalibrationParams,
    frame: Option<BoardFrame>,
    status: CalibrationStatus,
    last_error: Option<CalibrationError>,
    /// Marker visibility the current frame was derived from, see `sticky_key`.
    frame_key: Option<u8>,
    /// The current frame came from the king/queen pair.
    manual_frame: bool,
}

impl BoardCalibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params,
            frame: None,
            status: CalibrationStatus::default(),
            last_error: None,
            frame_key: None,
            manual_frame: false,
        }
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// Current board frame, `None` while uncalibrated.
    #[inline]
    pub fn frame(&self) -> Option<&BoardFrame> {
        self.frame.as_ref()
    }

    #[inline]
    pub fn status(&self) -> &CalibrationStatus {
        &self.status
    }

    /// Error from the most recent failed attempt, cleared on success.
    #[inline]
    pub fn last_error(&self) -> Option<&CalibrationError> {
        self.last_error.as_ref()
    }

    /// Refresh calibration from the markers `lookup` knows about.
    ///
    /// Returns the status transition, if any.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, lookup)))]
    pub fn update<F>(&mut self, lookup: F) -> Option<StatusChange>
    where
        F: Fn(MarkerId) -> Option<Point2<f32>>,
    {
        let mask = CornerSet::collect(&self.params.corner_ids, &lookup).mask();
        if self.frame.is_some() && self.frame_key == Some(self.sticky_key(mask, &lookup)) {
            return None;
        }

        match calibrate(&self.params, &lookup) {
            Ok(calibration) => {
                debug!(
                    "board frame from {:?}: a1={:?} h1={:?} a8={:?} h8={:?}",
                    calibration.source,
                    calibration.frame.a1,
                    calibration.frame.h1,
                    calibration.frame.a8,
                    calibration.frame.h8
                );
                self.frame = Some(calibration.frame);
                self.manual_frame = calibration.source == CalibrationSource::Manual;
                self.frame_key = Some(self.sticky_key(mask, &lookup));
                self.last_error = None;
                self.set_status(CalibrationStatus::from_source(calibration.source))
            }
            Err(err) => {
                debug!("calibration failed: {err}");
                self.frame = None;
                self.frame_key = None;
                self.manual_frame = false;
                let status = CalibrationStatus::Uncalibrated {
                    reason: Some(err.to_string()),
                };
                self.last_error = Some(err);
                self.set_status(status)
            }
        }
    }

    /// Drop the frame and return to the initial state.
    pub fn reset(&mut self) {
        self.frame = None;
        self.frame_key = None;
        self.manual_frame = false;
        self.last_error = None;
        self.status = CalibrationStatus::default();
    }

    /// Corner mask, extended with the king (bit 4) and queen (bit 5) while the
    /// frame comes from the manual pair.
    fn sticky_key<F>(&self, corner_mask: u8, lookup: &F) -> u8
    where
        F: Fn(MarkerId) -> Option<Point2<f32>>,
    {
        match self.params.manual {
            Some(manual) if self.manual_frame => {
                corner_mask
                    | u8::from(lookup(manual.origin).is_some()) << 4
                    | u8::from(lookup(manual.reference).is_some()) << 5
            }
            _ => corner_mask,
        }
    }

    fn set_status(&mut self, status: CalibrationStatus) -> Option<StatusChange> {
        if status == self.status {
            return None;
        }
        info!("calibration: {} -> {}", self.status, status);
        let from = std::mem::replace(&mut self.status, status.clone());
        Some(StatusChange { from, to: status })
    }
}

impl Default for BoardCalibrator {
    fn default() -> Self {
        Self::new(CalibrationParams::default())
    }
}
