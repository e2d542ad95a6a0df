//! # Flight link interface
//!
//! The flight link carries commands to the vehicle. Velocity commands are the only continuous
//! command, everything else (takeoff, land, battery queries) is a one-shot request.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum magnitude of any velocity command axis accepted by the link.
pub const VEL_CMD_LIMIT: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A velocity command for the vehicle.
///
/// Each axis is a unitless demand, legal values are in the range `[-VEL_CMD_LIMIT,
/// VEL_CMD_LIMIT]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Lateral demand, positive is right.
    pub lr: i32,

    /// Forward demand, positive is forwards.
    pub fb: i32,

    /// Vertical demand, positive is up.
    pub ud: i32,

    /// Yaw rate demand, positive is clockwise.
    pub yaw: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a flight link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("The link is not connected to the vehicle")]
    NotConnected,

    #[error("The vehicle did not respond in time")]
    Timeout,

    #[error("The vehicle rejected the command: {0}")]
    Rejected(String),

    #[error("Link I/O error: {0}")]
    Io(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A connection to the vehicle.
pub trait FlightLink {
    /// Send a velocity command. Blocks until the command has been handed to the transport.
    fn send_velocity(&mut self, cmd: &VelocityCommand) -> Result<(), LinkError>;

    /// Request the vehicle takes off.
    fn takeoff(&mut self) -> Result<(), LinkError>;

    /// Request the vehicle lands.
    fn land(&mut self) -> Result<(), LinkError>;

    /// Query the battery charge in percent.
    fn battery_pct(&mut self) -> Result<u8, LinkError>;

    /// End the connection, releasing any resources held by the link.
    fn release(&mut self);
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelocityCommand {
    /// The all-zero (hover in place) command.
    pub const ZERO: VelocityCommand = VelocityCommand {
        lr: 0,
        fb: 0,
        ud: 0,
        yaw: 0,
    };

    pub fn new(lr: i32, fb: i32, ud: i32, yaw: i32) -> Self {
        Self { lr, fb, ud, yaw }
    }

    /// True if all axes are zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Return a copy of this command with every axis clamped into `[-limit, limit]`.
    pub fn clamped(&self, limit: i32) -> Self {
        let limit = limit.abs();
        Self {
            lr: self.lr.clamp(-limit, limit),
            fb: self.fb.clamp(-limit, limit),
            ud: self.ud.clamp(-limit, limit),
            yaw: self.yaw.clamp(-limit, limit),
        }
    }

    /// True if every axis is within the legal range of the link.
    pub fn is_legal(&self) -> bool {
        self.clamped(VEL_CMD_LIMIT) == *self
    }
}

impl std::fmt::Display for VelocityCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lr: {:4}, fb: {:4}, ud: {:4}, yaw: {:4}",
            self.lr, self.fb, self.ud, self.yaw
        )
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamped() {
        let cmd = VelocityCommand::new(150, -230, 40, -100);
        let c = cmd.clamped(VEL_CMD_LIMIT);
        assert_eq!(c, VelocityCommand::new(100, -100, 40, -100));
        assert!(!cmd.is_legal());
        assert!(c.is_legal());
        assert!(VelocityCommand::ZERO.is_zero());
        assert!(VelocityCommand::default().is_zero());
    }
}
