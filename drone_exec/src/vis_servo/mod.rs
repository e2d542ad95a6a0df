//! # Visual servoing module
//!
//! Visual servoing drives the vehicle towards the tracked marker using only what can be seen of
//! it in the current frame. Three error signals are derived from each observation:
//!
//! - The lateral error is the horizontal pixel offset of the marker centroid from the centre of
//!   the frame. It is corrected by moving sideways, and while the marker is still far away, by
//!   turning towards it.
//! - The skew is the relative difference in length between the right and left edges of the
//!   marker's outline. A non-zero skew means the vehicle is not looking at the marker face on,
//!   and it is corrected by turning.
//! - The size error is the difference between the target and the apparent size of the marker.
//!   It is corrected by moving forwards or backwards, more gently while the vehicle is not
//!   aligned with the marker.
//!
//! Each axis demand is then passed through an exponential smoother. Vertical motion is never
//! commanded.
//!
//! If the marker disappears the last command is held for a short time, after which the vehicle is
//! stopped and the smoothers zeroed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod approach_state;
pub mod controllers;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use serde::Serialize;

// Internal
use comms_if::eqpt::{FrameGeometry, MarkerObservation};

pub use approach_state::ApproachState;
pub use controllers::VisServo;
pub use params::VisServoParams;
pub use state::ControllerState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Input data to visual servoing.
#[derive(Debug, Clone)]
pub struct InputData {
    /// Capture time of the frame.
    pub timestamp: Instant,

    /// Geometry of the frame.
    pub geometry: FrameGeometry,

    /// The marker seen in the frame, if any.
    pub marker: Option<MarkerObservation>,
}

/// The status report containing error signals and intermediate demands.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Label of this cycle.
    pub label: ApproachState,

    /// Horizontal offset of the marker from the frame centre, positive right.
    pub lat_error_px: Option<f64>,

    /// Skew of the marker outline, `None` if it could not be computed.
    pub skew: Option<f64>,

    /// Target size minus apparent size, positive if too far away.
    pub size_error_px: Option<f64>,

    /// True if the lateral error is outside its dead-zone.
    pub lateral_active: bool,

    /// True if the skew is outside its dead-zone.
    pub facing_active: bool,

    /// Scale applied to the lateral yaw contribution.
    pub yaw_suppression: f64,

    /// Demands before smoothing.
    pub raw_lr: f64,
    pub raw_fb: f64,
    pub raw_yaw: f64,

    /// True if the marker is absent but the last command is still being held.
    pub coasting: bool,

    /// True if the marker has been absent for longer than the loss timeout.
    pub marker_lost: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum VisServoError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid parameter: {0}")]
    InvalidParams(String),

    #[error("Invalid frame geometry {0:?}, both dimensions must be non-zero")]
    InvalidFrameGeometry(FrameGeometry),

    #[error("Marker observation contains non-finite values: {0:?}")]
    InvalidObservation(MarkerObservation),
}
