use serde::{Deserialize, Serialize};

/// Marker registry timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryParams {
    /// Absent markers are forgotten once unseen for this long.
    pub stale_after_ms: u64,
    /// Markers seen within this window are listed as active.
    pub active_window_ms: u64,
}

impl Default for RegistryParams {
    fn default() -> Self {
        Self {
            stale_after_ms: 3000,
            active_window_ms: 1000,
        }
    }
}

/// Occupancy confidence tunables.
///
/// The defaults let one fresh sighting show a piece immediately
/// (`initial_confidence >= display_threshold`) and keep a settled piece on
/// screen through a single missed update (`decay_step < display_threshold`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingParams {
    /// Minimum confidence for a piece to appear in the stable view.
    pub display_threshold: u32,
    /// Confidence lost per update without a sighting.
    pub decay_step: u32,
    /// Confidence gained per update with a matching sighting.
    pub increase_step: u32,
    /// Confidence given to a piece seen on a square for the first time.
    pub initial_confidence: u32,
    /// Confidence ceiling.
    pub max_confidence: u32,
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            display_threshold: 3,
            decay_step: 1,
            increase_step: 1,
            initial_confidence: 4,
            max_confidence: 10,
        }
    }
}

/// Rejected tracking tunables.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum TrackingParamsError {
    #[error("max_confidence must be > 0")]
    ZeroMaxConfidence,
    #[error("display_threshold {threshold} exceeds max_confidence {max}")]
    ThresholdAboveMax { threshold: u32, max: u32 },
    #[error("initial_confidence {initial} exceeds max_confidence {max}")]
    InitialAboveMax { initial: u32, max: u32 },
    #[error("initial_confidence must be > 0")]
    ZeroInitialConfidence,
    #[error("decay_step and increase_step must be > 0")]
    ZeroStep,
}

impl TrackingParams {
    pub fn validate(&self) -> Result<(), TrackingParamsError> {
        if self.max_confidence == 0 {
            return Err(TrackingParamsError::ZeroMaxConfidence);
        }
        if self.display_threshold > self.max_confidence {
            return Err(TrackingParamsError::ThresholdAboveMax {
                threshold: self.display_threshold,
                max: self.max_confidence,
            });
        }
        if self.initial_confidence > self.max_confidence {
            return Err(TrackingParamsError::InitialAboveMax {
                initial: self.initial_confidence,
                max: self.max_confidence,
            });
        }
        if self.initial_confidence == 0 {
            return Err(TrackingParamsError::ZeroInitialConfidence);
        }
        if self.decay_step == 0 || self.increase_step == 0 {
            return Err(TrackingParamsError::ZeroStep);
        }
        Ok(())
    }
}
