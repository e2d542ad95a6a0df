//! Module interfaces
//!
//! Each control module in `drone_exec` shall implement the `Module` trait. A
//! module only holds its parameters, any state which must persist between
//! cycles is owned by the caller (the frame loop) and passed in by mutable
//! reference on every call.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use serde::de::DeserializeOwned;

// Internal imports
use crate::params;

// ---------------------------------------------------------------------------
// MODULE TRAIT
// ---------------------------------------------------------------------------

/// A cyclically processed module.
pub trait Module: Sized {
    /// Parameters of the module, loaded from a parameter file.
    type Params: DeserializeOwned;
    /// An error which can occur during initialisation.
    type InitError: From<params::LoadError>;

    /// State persisting between cycles, owned by the caller.
    type State;
    /// Data required for cyclic processing.
    type InputData;
    /// Data produced by cyclic processing.
    type OutputData;
    /// A report on the status of the cyclic processing.
    type StatusReport;
    /// An error which can occur during cyclic processing.
    type ProcError;

    /// Build the module from already loaded parameters.
    fn from_params(params: Self::Params) -> Result<Self, Self::InitError>;

    /// Initialise the module from a parameter file.
    ///
    /// # Inputs
    /// - `param_file_path`: Path to the parameter file, relative to the
    ///   `params` directory.
    ///
    /// # Outputs
    /// - On success the initialised module.
    /// - On error an `InitError` instance.
    fn init(param_file_path: &str) -> Result<Self, Self::InitError> {
        let params: Self::Params = params::load(param_file_path)?;
        Self::from_params(params)
    }

    /// Main module processing function.
    ///
    /// # Inputs
    /// - `state`: The persistent state of the module.
    /// - `input_data`: The data required for processing by the module.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error a `ProcError` instance.
    fn proc(&self, state: &mut Self::State, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
