//! # Manual control module
//!
//! Manual control converts the keys currently held by the operator into a velocity command. It
//! holds no state between cycles, the output depends only on the keyboard snapshot passed in.
//!
//! Each movement key is bound to one direction of one axis by the binding table in the
//! parameters. Opposing keys held together cancel out. Holding the precision key divides the
//! speed, and holding the stop key zeros every axis regardless of anything else held.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    eqpt::{VelocityCommand, VEL_CMD_LIMIT},
    input::KeyState,
};
use util::params::{self as util_params, LoadError};

pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Manual control module.
#[derive(Debug, Clone)]
pub struct ManualCtrl {
    params: ManualCtrlParams,
}

/// Output of manual control for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualOutput {
    /// The demanded command.
    pub cmd: VelocityCommand,

    /// True if the operator is holding any key manual control responds to, even if the
    /// resulting command is zero.
    pub intent: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up ManualCtrl.
#[derive(Debug, thiserror::Error)]
pub enum ManualCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] LoadError),

    #[error("Invalid parameter: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManualCtrl {
    /// Load the module from the given parameter file.
    pub fn init(param_file_path: &str) -> Result<Self, ManualCtrlError> {
        let params: ManualCtrlParams = util_params::load(param_file_path)?;
        Self::new(params)
    }

    /// Create the module from parameters, checking they are valid.
    pub fn new(params: ManualCtrlParams) -> Result<Self, ManualCtrlError> {
        if params.speed <= 0 || params.speed > VEL_CMD_LIMIT {
            return Err(ManualCtrlError::InvalidParams(format!(
                "speed must be in (0, {}], found {}",
                VEL_CMD_LIMIT, params.speed
            )));
        }
        if !(params.precision_divisor >= 1.0) {
            return Err(ManualCtrlError::InvalidParams(format!(
                "precision_divisor must be at least 1, found {}",
                params.precision_divisor
            )));
        }
        if params.min_precision_speed < 1 {
            return Err(ManualCtrlError::InvalidParams(format!(
                "min_precision_speed must be at least 1, found {}",
                params.min_precision_speed
            )));
        }

        Ok(Self { params })
    }

    /// Compute the manual output for the given keyboard snapshot.
    pub fn proc<K: KeyState + ?Sized>(&self, keys: &K) -> ManualOutput {
        ManualOutput {
            cmd: self.command(keys),
            intent: self.has_intent(keys),
        }
    }

    /// The velocity command demanded by the held keys.
    pub fn command<K: KeyState + ?Sized>(&self, keys: &K) -> VelocityCommand {
        if keys.is_held(&self.params.stop_key) {
            return VelocityCommand::ZERO;
        }

        let speed = self.speed(keys.is_held(&self.params.precision_key));

        let mut cmd = VelocityCommand::ZERO;
        for binding in self.params.bindings.iter().filter(|b| keys.is_held(&b.key)) {
            let axis = match binding.axis {
                Axis::Lr => &mut cmd.lr,
                Axis::Fb => &mut cmd.fb,
                Axis::Ud => &mut cmd.ud,
                Axis::Yaw => &mut cmd.yaw,
            };
            *axis += binding.direction.sign() * speed;
        }

        cmd.clamped(VEL_CMD_LIMIT)
    }

    /// True if any movement, stop or precision key is held.
    pub fn has_intent<K: KeyState + ?Sized>(&self, keys: &K) -> bool {
        keys.is_held(&self.params.stop_key)
            || keys.is_held(&self.params.precision_key)
            || self.params.bindings.iter().any(|b| keys.is_held(&b.key))
    }

    /// Axis magnitude, reduced in precision mode but never below the floor.
    fn speed(&self, precision: bool) -> i32 {
        if precision {
            let reduced = (self.params.speed as f64 / self.params.precision_divisor).round() as i32;
            reduced.max(self.params.min_precision_speed).min(self.params.speed)
        } else {
            self.params.speed
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
