//! # Flight Manager
//!
//! The flight manager owns the flight link and tracks whether the vehicle is airborne. It guards
//! takeoff on the battery level, drops velocity commands while grounded, and makes sure that a
//! vehicle left airborne is landed and the link released when the manager goes out of scope,
//! whichever way the executable exits.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, trace, warn};

use comms_if::eqpt::{FlightLink, LinkError, VelocityCommand};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct FlightMgr<L: FlightLink> {
    link: L,

    /// True between a successful takeoff and the next land request.
    airborne: bool,

    /// Takeoff is refused below this charge.
    min_battery_pct: u8,

    /// Set once the link has been released, after which nothing more is sent.
    released: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FlightMgrError {
    #[error("Battery at {battery_pct}%, takeoff requires at least {min_pct}%")]
    BatteryTooLow { battery_pct: u8, min_pct: u8 },

    #[error("The vehicle is already airborne")]
    AlreadyAirborne,

    #[error("The vehicle is not airborne")]
    NotAirborne,

    #[error("The flight link has been released")]
    Released,

    #[error("Flight link error: {0}")]
    Link(#[from] LinkError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<L: FlightLink> FlightMgr<L> {
    /// Create a new manager around an acquired link. The vehicle is assumed to be on the ground.
    pub fn new(link: L, min_battery_pct: u8) -> Self {
        Self {
            link,
            airborne: false,
            min_battery_pct,
            released: false,
        }
    }

    /// Take off, if the battery allows it.
    pub fn takeoff(&mut self) -> Result<(), FlightMgrError> {
        if self.released {
            return Err(FlightMgrError::Released);
        }
        if self.airborne {
            return Err(FlightMgrError::AlreadyAirborne);
        }

        let battery_pct = self.link.battery_pct()?;
        if battery_pct < self.min_battery_pct {
            return Err(FlightMgrError::BatteryTooLow {
                battery_pct,
                min_pct: self.min_battery_pct,
            });
        }

        self.link.takeoff()?;
        self.airborne = true;

        info!("Takeoff complete, battery at {}%", battery_pct);

        Ok(())
    }

    /// Land the vehicle.
    ///
    /// The vehicle is considered grounded afterwards even if the link reported an error, the
    /// error is returned so it can be logged.
    pub fn land(&mut self) -> Result<(), FlightMgrError> {
        if self.released {
            return Err(FlightMgrError::Released);
        }
        if !self.airborne {
            return Err(FlightMgrError::NotAirborne);
        }

        self.airborne = false;
        self.link.land()?;

        info!("Landed");

        Ok(())
    }

    /// Send a velocity command to the vehicle.
    ///
    /// Does nothing while grounded.
    pub fn send_velocity(&mut self, cmd: &VelocityCommand) -> Result<(), FlightMgrError> {
        if !self.airborne || self.released {
            trace!("Grounded, dropping velocity command {}", cmd);
            return Ok(());
        }

        self.link.send_velocity(cmd)?;

        Ok(())
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    /// Query the battery charge of the vehicle.
    pub fn battery_pct(&mut self) -> Result<u8, FlightMgrError> {
        if self.released {
            return Err(FlightMgrError::Released);
        }
        Ok(self.link.battery_pct()?)
    }

    /// Access the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Land if airborne, then release the link.
    ///
    /// Only the first call has any effect.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }

        if self.airborne {
            warn!("Shutting down while airborne, landing");
            if let Err(e) = self.land() {
                error!("Could not land during shutdown: {}", e);
            }
        }

        self.link.release();
        self.released = true;

        info!("Flight link released");
    }
}

impl<L: FlightLink> Drop for FlightMgr<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_client::SimLink;

    #[test]
    fn test_battery_guard() {
        let link = SimLink::new(15);
        let history = link.history();
        let mut mgr = FlightMgr::new(link, 20);

        assert!(matches!(
            mgr.takeoff(),
            Err(FlightMgrError::BatteryTooLow { battery_pct: 15, min_pct: 20 })
        ));
        assert!(!mgr.is_airborne());
        assert_eq!(history.borrow().num_takeoffs, 0);
    }

    #[test]
    fn test_takeoff_and_land() {
        let link = SimLink::new(80);
        let history = link.history();
        let mut mgr = FlightMgr::new(link, 20);

        mgr.takeoff().unwrap();
        assert!(mgr.is_airborne());
        assert!(matches!(mgr.takeoff(), Err(FlightMgrError::AlreadyAirborne)));
        assert_eq!(history.borrow().num_takeoffs, 1);

        mgr.land().unwrap();
        assert!(!mgr.is_airborne());
        assert!(matches!(mgr.land(), Err(FlightMgrError::NotAirborne)));
        assert_eq!(history.borrow().num_lands, 1);
    }

    #[test]
    fn test_land_error_still_grounds() {
        let link = SimLink::new(80);
        let mut mgr = FlightMgr::new(link, 20);

        mgr.takeoff().unwrap();
        mgr.link_mut().disconnect();

        assert!(matches!(mgr.land(), Err(FlightMgrError::Link(LinkError::NotConnected))));
        assert!(!mgr.is_airborne());
    }

    #[test]
    fn test_grounded_send_dropped() {
        let link = SimLink::new(80);
        let history = link.history();
        let mut mgr = FlightMgr::new(link, 20);

        mgr.send_velocity(&VelocityCommand::new(10, 0, 0, 0)).unwrap();
        assert!(history.borrow().sent.is_empty());

        mgr.takeoff().unwrap();
        mgr.send_velocity(&VelocityCommand::new(10, 0, 0, 0)).unwrap();
        assert_eq!(history.borrow().sent, vec![VelocityCommand::new(10, 0, 0, 0)]);
    }

    #[test]
    fn test_drop_lands_once() {
        let link = SimLink::new(80);
        let history = link.history();

        {
            let mut mgr = FlightMgr::new(link, 20);
            mgr.takeoff().unwrap();
            mgr.shutdown();
            assert!(!mgr.is_airborne());
        }

        let h = history.borrow();
        assert_eq!(h.num_lands, 1);
        assert!(h.released);
    }

    #[test]
    fn test_drop_grounded_no_land() {
        let link = SimLink::new(80);
        let history = link.history();

        drop(FlightMgr::new(link, 20));

        let h = history.borrow();
        assert_eq!(h.num_lands, 0);
        assert!(h.released);
    }
}
