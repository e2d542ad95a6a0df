//! # Output stage
//!
//! Last step of every cycle. Clamps the arbitrated command into the legal range and forwards it
//! to the vehicle through the flight manager. Send failures are never retried, the next cycle's
//! command supersedes the failed one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};

use comms_if::eqpt::{FlightLink, VelocityCommand, VEL_CMD_LIMIT};

use crate::flight_mgr::FlightMgr;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct OutputStage {
    /// Consecutive failures after which an error is logged.
    error_limit: u64,

    /// Number of consecutive failed sends.
    pub num_consec_failures: u64,

    /// Total number of failed sends.
    pub num_failures: u64,

    /// Total number of commands handed to the link.
    pub num_sent: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OutputStage {
    pub fn new(error_limit: u64) -> Self {
        Self {
            error_limit,
            ..Default::default()
        }
    }

    /// Forward a command to the vehicle.
    ///
    /// Returns the clamped command if it was sent, or `None` if the vehicle is grounded or the
    /// send failed.
    pub fn forward<L: FlightLink>(
        &mut self,
        flight_mgr: &mut FlightMgr<L>,
        cmd: &VelocityCommand
    ) -> Option<VelocityCommand> {
        if !flight_mgr.is_airborne() {
            return None;
        }

        let cmd = cmd.clamped(VEL_CMD_LIMIT);

        match flight_mgr.send_velocity(&cmd) {
            Ok(()) => {
                if self.num_consec_failures > self.error_limit {
                    info!(
                        "Velocity sends recovered after {} failures",
                        self.num_consec_failures
                    );
                }
                self.num_consec_failures = 0;
                self.num_sent += 1;
                Some(cmd)
            },
            Err(e) => {
                warn!("Could not send velocity command: {}", e);

                self.num_failures += 1;
                self.num_consec_failures += 1;

                // Only report once per run of failures
                if self.num_consec_failures == self.error_limit + 1 {
                    error!(
                        "More than {} consecutive velocity sends have failed",
                        self.error_limit
                    );
                }

                None
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
