//! # Drone library.
//!
//! This library allows other crates in the workspace, and the drone executable itself, to access
//! items defined inside the drone crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command arbiter - decides which command is sent to the vehicle each frame
pub mod arbiter;

/// Data store - per-cycle data and counters of the executable
pub mod data_store;

/// Flight manager - guards takeoff and landing and owns the flight link
pub mod flight_mgr;

/// Manual control - converts held keys into velocity commands
pub mod manual_ctrl;

/// Output stage - clamps and forwards the arbitrated command
pub mod output_stage;

/// Executable parameters
pub mod params;

/// Simulation client - simulated flight link and scenario playback
pub mod sim_client;

/// Exponential smoothing filter
pub mod smoother;

/// Visual servoing - drives the vehicle towards the marker
pub mod vis_servo;
