//! # Operator command processor module
//!
//! The operator command processor handles the discrete commands issued by the operator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use comms_if::{eqpt::FlightLink, tc::OperatorCmd};
use drone_lib::{
    data_store::DataStore,
    flight_mgr::{FlightMgr, FlightMgrError},
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute an operator command.
///
/// Mutates the datastore and commands the flight manager. Commands which cannot be executed in
/// the current state are rejected with a warning and counted.
pub(crate) fn exec<L: FlightLink>(
    ds: &mut DataStore,
    flight_mgr: &mut FlightMgr<L>,
    cmd: &OperatorCmd
) {
    debug!("Received {:?} command", cmd);

    match cmd {
        OperatorCmd::Takeoff => {
            if let Err(e) = flight_mgr.takeoff() {
                warn!("Takeoff rejected: {}", e);
                ds.num_rejected_cmds += 1;
            }
        },
        OperatorCmd::Land => {
            // Landing always ends the approach
            ds.ctrl_state.approach_enabled = false;

            match flight_mgr.land() {
                Ok(()) => (),
                Err(e @ FlightMgrError::NotAirborne) => {
                    warn!("Land rejected: {}", e);
                    ds.num_rejected_cmds += 1;
                },
                Err(e) => warn!("Error while landing, vehicle assumed grounded: {}", e)
            }
        },
        OperatorCmd::ToggleApproach => {
            if flight_mgr.is_airborne() {
                ds.ctrl_state.approach_enabled = !ds.ctrl_state.approach_enabled;
            }
            else {
                warn!("Cannot toggle autonomous approach while grounded");
                ds.num_rejected_cmds += 1;
            }
        },
        OperatorCmd::Quit => {
            info!("Quit requested");
            ds.quit = true;
        }
    }

    ds.airborne = flight_mgr.is_airborne();
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use drone_lib::sim_client::SimLink;

    #[test]
    fn test_toggle_requires_airborne() {
        let mut ds = DataStore::default();
        let mut mgr = FlightMgr::new(SimLink::new(80), 20);

        exec(&mut ds, &mut mgr, &OperatorCmd::ToggleApproach);
        assert!(!ds.ctrl_state.approach_enabled);
        assert_eq!(ds.num_rejected_cmds, 1);

        exec(&mut ds, &mut mgr, &OperatorCmd::Takeoff);
        assert!(ds.airborne);
        exec(&mut ds, &mut mgr, &OperatorCmd::ToggleApproach);
        assert!(ds.ctrl_state.approach_enabled);
        exec(&mut ds, &mut mgr, &OperatorCmd::ToggleApproach);
        assert!(!ds.ctrl_state.approach_enabled);
        assert_eq!(ds.num_rejected_cmds, 1);
    }

    #[test]
    fn test_land_disables_approach() {
        let mut ds = DataStore::default();
        let mut mgr = FlightMgr::new(SimLink::new(80), 20);

        exec(&mut ds, &mut mgr, &OperatorCmd::Takeoff);
        exec(&mut ds, &mut mgr, &OperatorCmd::ToggleApproach);
        exec(&mut ds, &mut mgr, &OperatorCmd::Land);

        assert!(!ds.airborne);
        assert!(!ds.ctrl_state.approach_enabled);
        assert_eq!(ds.num_rejected_cmds, 0);

        exec(&mut ds, &mut mgr, &OperatorCmd::Land);
        assert_eq!(ds.num_rejected_cmds, 1);
    }

    #[test]
    fn test_low_battery_takeoff() {
        let mut ds = DataStore::default();
        let mut mgr = FlightMgr::new(SimLink::new(10), 20);

        exec(&mut ds, &mut mgr, &OperatorCmd::Takeoff);
        assert!(!ds.airborne);
        assert_eq!(ds.num_rejected_cmds, 1);
    }

    #[test]
    fn test_quit() {
        let mut ds = DataStore::default();
        let mut mgr = FlightMgr::new(SimLink::new(80), 20);

        exec(&mut ds, &mut mgr, &OperatorCmd::Quit);
        assert!(ds.quit);
    }
}
