//! # Command arbiter
//!
//! The arbiter decides, once per frame, which command is sent to the vehicle. In order of
//! precedence:
//!
//! 1. While grounded the zero command is emitted and no controller is run.
//! 2. On the frame autonomous approach is toggled (either way) the zero command is emitted and
//!    the visual servoing state is reset.
//! 3. If the operator holds any manual control key, manual control wins and the visual servoing
//!    state is left untouched.
//! 4. Otherwise visual servoing governs, with the zero command if it is disabled or fails.
//!
//! Landing also resets the visual servoing state, so nothing from one flight carries into the
//! next.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Serialize;

use comms_if::{
    eqpt::{FrameObservation, VelocityCommand},
    input::KeyState,
};
use util::module::Module;

use crate::{
    manual_ctrl::ManualCtrl,
    vis_servo::{self, ApproachState, ControllerState, StatusReport, VisServo},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tracks the transitions the arbiter reacts to.
#[derive(Debug, Default)]
pub struct Arbiter {
    prev_enabled: bool,
    prev_airborne: bool,
    prev_label: ApproachState,
}

/// Inputs of one arbitration.
pub struct ArbiterInput<'a> {
    /// True if the vehicle is airborne.
    pub airborne: bool,

    /// The keys held by the operator.
    pub keys: &'a dyn KeyState,

    /// The current frame.
    pub frame: &'a FrameObservation,
}

/// Outcome of one arbitration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Decision {
    /// The command to send.
    pub cmd: VelocityCommand,

    /// Label of the cycle.
    pub label: ApproachState,

    /// What produced the command.
    pub source: CmdSource,

    /// Visual servoing report, if visual servoing ran this cycle.
    pub report: Option<StatusReport>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CmdSource {
    /// Vehicle on the ground.
    Grounded,

    /// Forced stop on an approach toggle.
    Toggle,

    /// Operator keys.
    Manual,

    /// Visual servoing.
    VisServo,

    /// Nothing demanding motion.
    Idle,

    /// Visual servoing failed.
    Fault,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Arbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the command for this frame.
    pub fn arbitrate(
        &mut self,
        manual_ctrl: &ManualCtrl,
        vis_servo: &VisServo,
        state: &mut ControllerState,
        input: &ArbiterInput
    ) -> Decision {
        let toggled = state.approach_enabled != self.prev_enabled;
        let landed = self.prev_airborne && !input.airborne;

        self.prev_enabled = state.approach_enabled;
        self.prev_airborne = input.airborne;

        if toggled {
            info!(
                "Autonomous approach {}",
                if state.approach_enabled { "enabled" } else { "disabled" }
            );
        }
        if toggled || landed {
            state.reset();
        }

        let decision = if !input.airborne {
            Decision::stop(ApproachState::Off, CmdSource::Grounded)
        }
        else if toggled {
            let label = match state.approach_enabled {
                true => ApproachState::Hold,
                false => ApproachState::Off
            };
            Decision::stop(label, CmdSource::Toggle)
        }
        else {
            let manual = manual_ctrl.proc(input.keys);

            if manual.intent {
                Decision {
                    cmd: manual.cmd,
                    label: ApproachState::Manual,
                    source: CmdSource::Manual,
                    report: None,
                }
            }
            else {
                Self::run_vis_servo(vis_servo, state, input.frame)
            }
        };

        state.label = decision.label;

        if decision.label != self.prev_label {
            debug!("Label {} -> {}", self.prev_label, decision.label);
            self.prev_label = decision.label;
        }

        decision
    }

    fn run_vis_servo(
        vis_servo: &VisServo,
        state: &mut ControllerState,
        frame: &FrameObservation
    ) -> Decision {
        let input_data = vis_servo::InputData {
            timestamp: frame.timestamp,
            geometry: frame.geometry,
            marker: frame.marker.clone(),
        };

        match vis_servo.proc(state, &input_data) {
            Ok((Some(cmd), report)) => Decision {
                cmd,
                label: report.label,
                source: CmdSource::VisServo,
                report: Some(report),
            },
            Ok((None, report)) => Decision {
                report: Some(report),
                ..Decision::stop(ApproachState::Off, CmdSource::Idle)
            },
            Err(e) => {
                warn!("Error during VisServo processing: {}", e);
                Decision::stop(state.label, CmdSource::Fault)
            }
        }
    }
}

impl Decision {
    /// A zero command decision.
    fn stop(label: ApproachState, source: CmdSource) -> Self {
        Self {
            cmd: VelocityCommand::ZERO,
            label,
            source,
            report: None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
