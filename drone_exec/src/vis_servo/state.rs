//! Visual servoing controller state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::debug;

// Internal
use super::ApproachState;
use crate::smoother::ExpSmoother;
use comms_if::eqpt::VelocityCommand;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of the visual servoing controller which persists between cycles.
///
/// Owned by the frame loop and passed into the controller on each cycle. Created once at the
/// start of the mission, and reset whenever autonomous mode is toggled or the vehicle lands, so
/// that no filter state from a previous engagement leaks into the next one.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    /// True if autonomous approach is enabled. Set by operator command, never modified by the
    /// controller itself.
    pub approach_enabled: bool,

    /// Label of the last processed cycle.
    pub label: ApproachState,

    pub(crate) yaw_smoother: ExpSmoother,
    pub(crate) fb_smoother: ExpSmoother,
    pub(crate) lr_smoother: ExpSmoother,

    /// Time of the last cycle in which a marker was observed.
    pub(crate) last_marker_time: Option<Instant>,

    /// The last command emitted by the controller, held through short marker dropouts.
    pub(crate) last_cmd: VelocityCommand,

    /// Set once the marker loss timeout has expired, cleared when the marker is reacquired.
    pub(crate) marker_lost: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the state for a new engagement.
    ///
    /// Zeros the smoothing accumulators and the held command and forgets the last marker
    /// sighting. `approach_enabled` is left as is.
    pub fn reset(&mut self) {
        debug!("Resetting visual servoing state");
        self.reset_smoothing();
        self.last_marker_time = None;
        self.last_cmd = VelocityCommand::ZERO;
        self.marker_lost = false;
    }

    /// Zero the three smoothing accumulators.
    pub fn reset_smoothing(&mut self) {
        self.yaw_smoother.reset();
        self.fb_smoother.reset();
        self.lr_smoother.reset();
    }

    /// Values of the smoothing accumulators, in `(yaw, fb, lr)` order.
    pub fn accumulators(&self) -> (f64, f64, f64) {
        (
            self.yaw_smoother.value(),
            self.fb_smoother.value(),
            self.lr_smoother.value(),
        )
    }

    /// The last command emitted by the controller.
    pub fn last_cmd(&self) -> VelocityCommand {
        self.last_cmd
    }

    /// Time the marker was last seen, if it has been seen since the last reset.
    pub fn last_marker_time(&self) -> Option<Instant> {
        self.last_marker_time
    }
}
