//! Latest position of every marker seen recently.
//!
//! Markers that drop out of a frame are remembered for a grace period
//! (`stale_after_ms`) so a single missed detection does not lose them.

use std::collections::HashMap;

use chess_overlay_core::{DetectedMarker, MarkerId, MarkerObservation, MarkerSummary, Timestamp};
use log::trace;
use nalgebra::Point2;

use crate::params::RegistryParams;

#[derive(Clone, Debug, Default)]
pub struct MarkerRegistry {
    params: RegistryParams,
    entries: HashMap<MarkerId, MarkerObservation>,
}

impl MarkerRegistry {
    pub fn new(params: RegistryParams) -> Self {
        Self {
            params,
            entries: HashMap::new(),
        }
    }

    #[inline]
    pub fn params(&self) -> &RegistryParams {
        &self.params
    }

    /// Fold one frame of observations into the registry.
    ///
    /// Ids present in `frame` are overwritten (the last entry wins when an id
    /// repeats). Absent ids are evicted once `now - last_seen` reaches
    /// `stale_after_ms`, and kept untouched otherwise.
    pub fn observe(&mut self, frame: &[MarkerObservation], now: Timestamp) {
        let mut fresh: HashMap<MarkerId, MarkerObservation> = HashMap::with_capacity(frame.len());
        for obs in frame {
            fresh.insert(obs.id, *obs);
        }

        let stale_after = self.params.stale_after_ms;
        self.entries.retain(|id, obs| {
            let keep = fresh.contains_key(id) || obs.age(now) < stale_after;
            if !keep {
                trace!("marker {id} evicted after {} ms", obs.age(now));
            }
            keep
        });
        self.entries.extend(fresh);
    }

    /// [`observe`](Self::observe) for raw detector output, stamped with `now`.
    pub fn observe_detections(&mut self, markers: &[DetectedMarker], now: Timestamp) {
        let frame: Vec<MarkerObservation> = markers.iter().map(|m| m.observe(now)).collect();
        self.observe(&frame, now);
    }

    #[inline]
    pub fn get(&self, id: MarkerId) -> Option<&MarkerObservation> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn position(&self, id: MarkerId) -> Option<Point2<f32>> {
        self.entries.get(&id).map(|o| o.position)
    }

    /// Every tracked marker, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &MarkerObservation> + '_ {
        self.entries.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Listing sorted by id, with rounded positions and an activity flag.
    pub fn summaries(&self, now: Timestamp) -> Vec<MarkerSummary> {
        let mut out: Vec<MarkerSummary> = self
            .entries
            .values()
            .map(|o| MarkerSummary {
                id: o.id,
                x: o.position.x.round() as i32,
                y: o.position.y.round() as i32,
                active: o.age(now) < self.params.active_window_ms,
            })
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }
}
