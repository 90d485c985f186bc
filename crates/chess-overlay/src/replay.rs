//! Offline replay of recorded detector output.

use std::fs;
use std::path::Path;

use chess_overlay_calib::{CalibrationStatus, StatusChange};
use chess_overlay_core::{BoardFrame, DetectedMarker, MarkerSummary, Timestamp};
use chess_overlay_tracking::StableOccupancy;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{OverlayIoError, SessionConfig, SessionConfigError};
use crate::detector::{DetectorError, MarkerDetector};
use crate::session::{OverlaySession, TickOutcome};

/// One recorded detector call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub timestamp_ms: Timestamp,
    #[serde(default)]
    pub markers: Vec<DetectedMarker>,
    /// Recorded detector failure; `markers` is ignored when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarkerDetector for ReplayFrame {
    fn detect(&mut self) -> Result<Vec<DetectedMarker>, DetectorError> {
        match &self.error {
            Some(message) => Err(DetectorError::new(message.clone())),
            None => Ok(self.markers.clone()),
        }
    }
}

/// A recorded capture, frames in time order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub frames: Vec<ReplayFrame>,
}

impl ReplayLog {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OverlayIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedStatusChange {
    pub timestamp_ms: Timestamp,
    #[serde(flatten)]
    pub change: StatusChange,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub timestamp_ms: Timestamp,
    pub occupancy: StableOccupancy,
    pub unmapped: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedDetectorError {
    pub timestamp_ms: Timestamp,
    pub message: String,
}

/// Everything a replay produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub frames: usize,
    pub status_changes: Vec<TimedStatusChange>,
    /// One entry per tracker update.
    pub updates: Vec<OccupancySnapshot>,
    pub detector_errors: Vec<TimedDetectorError>,
    pub final_status: CalibrationStatus,
    pub final_frame: Option<BoardFrame>,
    pub final_occupancy: StableOccupancy,
    /// Marker listing as of the last frame.
    pub markers: Vec<MarkerSummary>,
}

impl ReplayReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Feed every frame of `log` through a fresh session.
pub fn run_replay(
    config: &SessionConfig,
    log: &ReplayLog,
) -> Result<ReplayReport, SessionConfigError> {
    let mut session = OverlaySession::new(config.clone())?;
    session.start();

    let mut status_changes = Vec::new();
    let mut updates = Vec::new();
    let mut detector_errors = Vec::new();
    for frame in &log.frames {
        let mut source = frame.clone();
        let report = session.tick_with(&mut source, frame.timestamp_ms);
        if let Some(change) = report.status_change {
            status_changes.push(TimedStatusChange {
                timestamp_ms: report.timestamp_ms,
                change,
            });
        }
        match report.outcome {
            TickOutcome::Updated => {
                if let Some(occupancy) = report.occupancy {
                    updates.push(OccupancySnapshot {
                        timestamp_ms: report.timestamp_ms,
                        occupancy,
                        unmapped: report.unmapped,
                    });
                }
            }
            TickOutcome::DetectorFailed => detector_errors.push(TimedDetectorError {
                timestamp_ms: report.timestamp_ms,
                message: report.detector_error.unwrap_or_default(),
            }),
            _ => {}
        }
    }

    let last = log.frames.last().map_or(0, |f| f.timestamp_ms);
    info!(
        "replayed {} frames: {} tracker updates, {} detector errors, {}",
        log.frames.len(),
        updates.len(),
        detector_errors.len(),
        session.status()
    );
    Ok(ReplayReport {
        frames: log.frames.len(),
        status_changes,
        updates,
        detector_errors,
        final_status: session.status().clone(),
        final_frame: session.frame().copied(),
        final_occupancy: session.stable().clone(),
        markers: session.summaries(last),
    })
}
