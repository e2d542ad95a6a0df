//! Parameters structure for ManualCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::input::KeyId;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for manual control.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualCtrlParams {
    /// Magnitude of an axis demand while its key is held.
    pub speed: i32,

    /// Factor the speed is divided by while the precision key is held.
    pub precision_divisor: f64,

    /// Minimum magnitude of an axis demand in precision mode.
    pub min_precision_speed: i32,

    /// Key which zeros all axes while held.
    pub stop_key: KeyId,

    /// Key which reduces the speed while held.
    pub precision_key: KeyId,

    /// The movement key table.
    pub bindings: Vec<KeyBinding>,
}

/// Binds a key to a direction on one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyBinding {
    pub key: KeyId,
    pub axis: Axis,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An axis of a velocity command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Lr,
    Fb,
    Ud,
    Yaw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Direction {
    pub fn sign(&self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}
