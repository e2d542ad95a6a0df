//! Visual servoing parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::VisServoError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the visual servoing controller
#[derive(Deserialize, Debug, Clone)]
pub struct VisServoParams {

    // ---- LATERAL ----

    /// Lateral demand per pixel of horizontal marker offset
    pub lat_k_p: f64,

    /// Horizontal offset under which no lateral correction is made
    ///
    /// Units: pixels
    pub lat_dead_zone_px: f64,

    /// Maximum magnitude of the lateral demand
    pub max_lr: f64,

    /// Yaw demand per pixel of horizontal marker offset
    pub lat_yaw_k_p: f64,

    /// Fraction of the target size above which the lateral error no longer
    /// contributes to yaw.
    pub near_size_fraction: f64,

    // ---- FACING ----

    /// Yaw demand per unit of skew
    pub skew_k_p: f64,

    /// Skew magnitude under which no facing correction is made
    pub skew_dead_zone: f64,

    /// Maximum magnitude of the yaw demand
    pub max_yaw: f64,

    // ---- DISTANCE ----

    /// Apparent marker size the controller regulates towards
    ///
    /// Units: pixels
    pub target_size_px: f64,

    /// Forward demand per pixel of size error
    pub size_k_p: f64,

    /// Size error under which no forward correction is made
    ///
    /// Units: pixels
    pub size_dead_zone_px: f64,

    /// Maximum magnitude of the forward demand
    pub max_fb: f64,

    /// Minimum forward demand when approaching
    pub min_fb: f64,

    /// Scale applied to the forward demand while the vehicle is not centred
    /// or not facing the marker
    pub misaligned_fb_scale: f64,

    // ---- SMOOTHING AND SAFETY ----

    /// Weight of the previous filtered value in the exponential smoothing,
    /// in `[0, 1)`
    pub smoothing_alpha: f64,

    /// Time without a marker after which the vehicle is stopped
    ///
    /// Units: seconds
    pub marker_loss_timeout_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisServoParams {
    /// Check the parameters describe a usable controller.
    pub fn validate(&self) -> Result<(), VisServoError> {
        let non_negative = [
            ("lat_dead_zone_px", self.lat_dead_zone_px),
            ("max_lr", self.max_lr),
            ("near_size_fraction", self.near_size_fraction),
            ("skew_dead_zone", self.skew_dead_zone),
            ("max_yaw", self.max_yaw),
            ("size_dead_zone_px", self.size_dead_zone_px),
            ("max_fb", self.max_fb),
            ("min_fb", self.min_fb),
            ("misaligned_fb_scale", self.misaligned_fb_scale),
        ];

        for (name, value) in non_negative.iter() {
            if !(*value >= 0.0) {
                return Err(VisServoError::InvalidParams(format!(
                    "{} must be non-negative, found {}", name, value
                )));
            }
        }

        if !(self.target_size_px > 0.0) {
            return Err(VisServoError::InvalidParams(format!(
                "target_size_px must be positive, found {}", self.target_size_px
            )));
        }
        if !(self.marker_loss_timeout_s > 0.0) {
            return Err(VisServoError::InvalidParams(format!(
                "marker_loss_timeout_s must be positive, found {}", self.marker_loss_timeout_s
            )));
        }
        if !(self.smoothing_alpha >= 0.0 && self.smoothing_alpha < 1.0) {
            return Err(VisServoError::InvalidParams(format!(
                "smoothing_alpha must be in [0, 1), found {}", self.smoothing_alpha
            )));
        }
        if self.min_fb > self.max_fb {
            return Err(VisServoError::InvalidParams(format!(
                "min_fb ({}) is greater than max_fb ({})", self.min_fb, self.max_fb
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
