//! One capture session: registry, calibration and tracking driven tick by tick.
//!
//! Each tick folds the current detections into the marker registry, refreshes
//! the board calibration, and (at most once per `min_update_interval_ms`)
//! projects the freshly seen piece markers onto squares and runs one
//! occupancy update. The session never reads a clock; every call is stamped
//! by the caller.

use chess_overlay_calib::{BoardCalibrator, CalibrationStatus, StatusChange};
use chess_overlay_core::{
    project_with_margin, BoardFrame, DetectedMarker, MarkerObservation, MarkerSummary, PieceId,
    Square, Timestamp,
};
use chess_overlay_tracking::{MarkerRegistry, OccupancyTracker, StableOccupancy};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::{SessionConfig, SessionConfigError};
use crate::detector::{DetectorError, MarkerDetector};

/// Rate limit between occupancy updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateThrottle {
    min_interval_ms: u64,
    last: Option<Timestamp>,
}

impl UpdateThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last: None,
        }
    }

    #[inline]
    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Time of the last granted update.
    #[inline]
    pub fn last(&self) -> Option<Timestamp> {
        self.last
    }

    pub fn ready(&self, now: Timestamp) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.min_interval_ms,
        }
    }

    /// Grant an update at `now` if the interval has elapsed.
    pub fn try_acquire(&mut self, now: Timestamp) -> bool {
        if !self.ready(now) {
            return false;
        }
        self.last = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// What a tick ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// The session is not running; nothing was touched.
    Stopped,
    /// The detector failed; the frame was skipped.
    DetectorFailed,
    /// Markers were recorded but there is no board frame to project onto.
    Uncalibrated,
    /// Markers were recorded; the tracker is not due yet.
    Throttled,
    /// The tracker ran and `occupancy` holds the new stable view.
    Updated,
}

/// Result of one [`OverlaySession::tick`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub timestamp_ms: Timestamp,
    pub outcome: TickOutcome,
    pub status: CalibrationStatus,
    /// Set on the tick where the calibration status changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change: Option<StatusChange>,
    /// Set when the tracker ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<StableOccupancy>,
    /// Piece sightings that did not land on any square.
    #[serde(default)]
    pub unmapped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_error: Option<String>,
}

impl TickReport {
    fn new(timestamp_ms: Timestamp, outcome: TickOutcome, status: CalibrationStatus) -> Self {
        Self {
            timestamp_ms,
            outcome,
            status,
            status_change: None,
            occupancy: None,
            unmapped: 0,
            detector_error: None,
        }
    }

    #[inline]
    pub fn updated(&self) -> bool {
        self.outcome == TickOutcome::Updated
    }
}

/// Explicit owner of all per-capture state.
#[derive(Clone, Debug)]
pub struct OverlaySession {
    config: SessionConfig,
    registry: MarkerRegistry,
    calibrator: BoardCalibrator,
    tracker: OccupancyTracker,
    throttle: UpdateThrottle,
    running: bool,
}

impl OverlaySession {
    /// Build a stopped session from a validated config.
    pub fn new(config: SessionConfig) -> Result<Self, SessionConfigError> {
        config.validate()?;
        Ok(Self {
            registry: MarkerRegistry::new(config.registry),
            calibrator: BoardCalibrator::new(config.calibration.clone()),
            tracker: OccupancyTracker::new(config.tracking),
            throttle: UpdateThrottle::new(config.min_update_interval_ms),
            config,
            running: false,
        })
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin a capture from a clean slate.
    pub fn start(&mut self) {
        self.clear();
        self.running = true;
        debug!("session started");
    }

    /// Halt ticking and drop every marker, the board frame and the tracking grid.
    pub fn stop(&mut self) {
        self.running = false;
        self.clear();
        debug!("session stopped");
    }

    fn clear(&mut self) {
        self.registry.clear();
        self.calibrator.reset();
        self.tracker.reset();
        self.throttle.reset();
    }

    #[inline]
    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    #[inline]
    pub fn calibrator(&self) -> &BoardCalibrator {
        &self.calibrator
    }

    #[inline]
    pub fn tracker(&self) -> &OccupancyTracker {
        &self.tracker
    }

    #[inline]
    pub fn frame(&self) -> Option<&BoardFrame> {
        self.calibrator.frame()
    }

    #[inline]
    pub fn status(&self) -> &CalibrationStatus {
        self.calibrator.status()
    }

    /// Stable occupancy as of the last tracker update.
    #[inline]
    pub fn stable(&self) -> &StableOccupancy {
        self.tracker.stable()
    }

    /// Marker listing for display, with activity relative to `now`.
    pub fn summaries(&self, now: Timestamp) -> Vec<MarkerSummary> {
        self.registry.summaries(now)
    }

    /// Run one detection through `detector` and process it.
    ///
    /// A detector failure skips the frame and is reported, it does not stop
    /// the session.
    pub fn tick_with<D>(&mut self, detector: &mut D, now: Timestamp) -> TickReport
    where
        D: MarkerDetector + ?Sized,
    {
        if !self.running {
            return TickReport::new(now, TickOutcome::Stopped, self.status().clone());
        }
        match detector.detect() {
            Ok(markers) => self.tick(&markers, now),
            Err(err) => self.detector_failed(err, now),
        }
    }

    fn detector_failed(&mut self, err: DetectorError, now: Timestamp) -> TickReport {
        warn!("tick at {now} ms skipped: {err}");
        let mut report = TickReport::new(now, TickOutcome::DetectorFailed, self.status().clone());
        report.detector_error = Some(err.message().to_owned());
        report
    }

    /// Process one frame of detections.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, markers), fields(n = markers.len()))
    )]
    pub fn tick(&mut self, markers: &[DetectedMarker], now: Timestamp) -> TickReport {
        if !self.running {
            return TickReport::new(now, TickOutcome::Stopped, self.status().clone());
        }

        self.registry.observe_detections(markers, now);
        let registry = &self.registry;
        let status_change = self.calibrator.update(|id| registry.position(id));

        let Some(frame) = self.calibrator.frame().copied() else {
            let mut report = TickReport::new(now, TickOutcome::Uncalibrated, self.status().clone());
            report.status_change = status_change;
            return report;
        };

        let previous_update = self.throttle.last();
        if !self.throttle.try_acquire(now) {
            let mut report = TickReport::new(now, TickOutcome::Throttled, self.status().clone());
            report.status_change = status_change;
            return report;
        }

        let (sightings, unmapped) = self.sightings(&frame, previous_update);
        trace!(
            "tracker update at {now} ms: {} sightings, {unmapped} unmapped",
            sightings.len()
        );
        let occupancy = self.tracker.update(&sightings).clone();

        let mut report = TickReport::new(now, TickOutcome::Updated, self.status().clone());
        report.status_change = status_change;
        report.occupancy = Some(occupancy);
        report.unmapped = unmapped;
        report
    }

    /// Piece markers seen since the previous tracker update, projected onto
    /// squares.
    ///
    /// Ordered by `(last_seen, id)` so that when two markers share a square
    /// the freshest one is applied last.
    fn sightings(
        &self,
        frame: &BoardFrame,
        since: Option<Timestamp>,
    ) -> (Vec<(Square, PieceId)>, usize) {
        let calibration = self.calibrator.params();
        let mut fresh: Vec<&MarkerObservation> = self
            .registry
            .all()
            .filter(|o| !calibration.is_calibration_marker(o.id))
            .filter(|o| since.is_none_or(|t| o.last_seen > t))
            .collect();
        fresh.sort_by_key(|o| (o.last_seen, o.id));

        let margin = self.config.projection.margin;
        let mut unmapped = 0;
        let mut sightings = Vec::with_capacity(fresh.len());
        for obs in fresh {
            match project_with_margin(obs.position, frame, margin) {
                Some(square) => sightings.push((square, obs.id)),
                None => {
                    trace!("marker {} at {:?} is off the board", obs.id, obs.position);
                    unmapped += 1;
                }
            }
        }
        (sightings, unmapped)
    }
}
