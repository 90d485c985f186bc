use chess_overlay_core::BoardCorner;

/// Reasons a board frame could not be derived.
///
/// Every variant is transient: the calibrator retries on the next frame.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum CalibrationError {
    #[error("insufficient corner markers: {visible} visible, need at least 2")]
    InsufficientCorners { visible: usize },
    #[error("unresolvable corner topology: {first} and {second} do not span the board")]
    UnresolvableTopology {
        first: BoardCorner,
        second: BoardCorner,
    },
    #[error("manual calibration markers coincide")]
    DegenerateManualPair,
}
