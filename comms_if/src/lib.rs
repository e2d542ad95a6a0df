//! # Communications interface crate.
//!
//! Provides all common interfaces between the control core and the equipment
//! around it: the marker detector, the flight link, the keyboard and the
//! operator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Observation and command definitions for equipment (the camera pipeline and the flight link)
pub mod eqpt;

/// Key state interface
pub mod input;

/// Operator commands
pub mod tc;
