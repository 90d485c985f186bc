//! JSON session configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chess_overlay_calib::CalibrationParams;
use chess_overlay_core::{BoardCorner, ProjectionParams};
use chess_overlay_tracking::{RegistryParams, TrackingParams, TrackingParamsError};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum OverlayIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SessionConfigError {
    #[error(transparent)]
    Tracking(#[from] TrackingParamsError),
    #[error("inset_scale must be finite and in (0, 1], got {0}")]
    InvalidInsetScale(f32),
    #[error("projection margin must be finite and >= 0, got {0}")]
    InvalidMargin(f32),
    #[error("corner marker ids must be distinct")]
    DuplicateCornerIds,
    #[error("manual calibration marker {0} is also a corner marker")]
    ManualIdIsCorner(u32),
}

fn default_min_update_interval_ms() -> u64 {
    200
}

/// Everything an [`OverlaySession`](crate::OverlaySession) needs.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub calibration: CalibrationParams,
    #[serde(default)]
    pub registry: RegistryParams,
    #[serde(default)]
    pub tracking: TrackingParams,
    #[serde(default)]
    pub projection: ProjectionParams,
    /// The occupancy tracker runs at most once per this interval, however
    /// often markers are detected.
    #[serde(default = "default_min_update_interval_ms")]
    pub min_update_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationParams::default(),
            registry: RegistryParams::default(),
            tracking: TrackingParams::default(),
            projection: ProjectionParams::default(),
            min_update_interval_ms: default_min_update_interval_ms(),
        }
    }
}

impl SessionConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OverlayIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SessionConfigError> {
        self.tracking.validate()?;

        let scale = self.calibration.inset_scale;
        if !scale.is_finite() || scale <= 0.0 || scale > 1.0 {
            return Err(SessionConfigError::InvalidInsetScale(scale));
        }
        let margin = self.projection.margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(SessionConfigError::InvalidMargin(margin));
        }

        let ids = &self.calibration.corner_ids;
        let distinct: BTreeSet<_> = BoardCorner::ALL.iter().map(|&c| ids.id(c)).collect();
        if distinct.len() != BoardCorner::ALL.len() {
            return Err(SessionConfigError::DuplicateCornerIds);
        }
        if let Some(manual) = self.calibration.manual {
            for id in [manual.origin, manual.reference] {
                if ids.contains(id) {
                    return Err(SessionConfigError::ManualIdIsCorner(id));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_overlay_calib::ManualCalibrationIds;

    #[test]
    fn empty_json_is_the_default_config() {
        let cfg: SessionConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!(cfg.min_update_interval_ms, 200);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn nested_sections_merge_with_defaults() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"tracking": {"display_threshold": 5}, "min_update_interval_ms": 0}"#,
        )
        .expect("parse");
        assert_eq!(cfg.tracking.display_threshold, 5);
        assert_eq!(cfg.tracking.max_confidence, 10);
        assert_eq!(cfg.min_update_interval_ms, 0);
        assert_eq!(cfg.registry, RegistryParams::default());
    }

    #[test]
    fn validate_rejects_bad_geometry_and_ids() {
        let mut cfg = SessionConfig::default();
        cfg.calibration.inset_scale = 0.0;
        assert_eq!(cfg.validate(), Err(SessionConfigError::InvalidInsetScale(0.0)));

        let mut cfg = SessionConfig::default();
        cfg.projection.margin = -0.5;
        assert_eq!(cfg.validate(), Err(SessionConfigError::InvalidMargin(-0.5)));

        let mut cfg = SessionConfig::default();
        cfg.calibration.corner_ids.h8 = 0;
        assert_eq!(cfg.validate(), Err(SessionConfigError::DuplicateCornerIds));

        let mut cfg = SessionConfig::default();
        cfg.calibration.manual = Some(ManualCalibrationIds {
            origin: 2,
            reference: 40,
        });
        assert_eq!(cfg.validate(), Err(SessionConfigError::ManualIdIsCorner(2)));

        let mut cfg = SessionConfig::default();
        cfg.tracking.increase_step = 0;
        assert_eq!(
            cfg.validate(),
            Err(SessionConfigError::Tracking(TrackingParamsError::ZeroStep))
        );
    }
}
