//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with equipment: marker observations
//! coming from the detection pipeline, and velocity commands going to the flight link.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod link;
pub mod marker;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use link::*;
pub use marker::*;
