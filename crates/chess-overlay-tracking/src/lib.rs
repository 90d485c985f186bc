//! Temporal smoothing for marker-based board overlays.
//!
//! - [`MarkerRegistry`] remembers the latest centroid of every marker and
//!   forgets markers that have been gone for a while.
//! - [`OccupancyTracker`] turns per-update `(square, piece)` sightings into a
//!   stable occupancy grid using bounded integer confidences.

mod occupancy;
mod params;
mod registry;

pub use occupancy::{OccupancyTracker, SquareState, StableOccupancy, UpdateStats};
pub use params::{RegistryParams, TrackingParams, TrackingParamsError};
pub use registry::MarkerRegistry;
