//! # Drone Executable Parameters
//!
//! This module provide parameters for the drone executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use comms_if::eqpt::FrameGeometry;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneExecParams {

    /// Target period of one cycle of the frame loop
    pub cycle_period_s: f64,

    /// Takeoff is refused below this battery charge
    pub min_takeoff_battery_pct: u8,

    /// Number of consecutive failed velocity sends after which an error is logged
    pub send_failure_error_limit: u64,

    /// Geometry of the camera frames, used when the frame source does not give one
    pub default_frame_geometry: FrameGeometry,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bundled_params() {
        let p: DroneExecParams = util::params::from_str(
            include_str!("../../params/drone_exec.toml")
        ).unwrap();

        assert_eq!(p.cycle_period_s, 0.05);
        assert_eq!(p.min_takeoff_battery_pct, 20);
        assert!(p.default_frame_geometry.is_valid());
    }
}
