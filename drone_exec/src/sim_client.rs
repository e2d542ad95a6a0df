//! # Simulation Client
//!
//! The simulation client lets the flight software run without a vehicle or a camera. It provides:
//!
//! - `SimLink`, a flight link which records every command it is given and can be made to fail.
//! - `ScenarioPlayer`, which replays a scenario file as a sequence of frames, each carrying the
//!   marker observation, the keys held by the operator and any operator commands issued.
//!
//! A scenario file is JSON of the form:
//!
//! ```json
//! {
//!     "geometry": { "width_px": 960, "height_px": 720 },
//!     "battery_pct": 80,
//!     "frames": [
//!         { "cmds": ["takeoff", "toggle_approach"] },
//!         { "marker": { "center_px": [560.0, 360.0], "size_px": 40.0 }, "repeat": 40 },
//!         { "held": ["w"], "repeat": 10 },
//!         { "link_fault": true },
//!         { "cmds": ["land", "quit"] }
//!     ]
//! }
//! ```
//!
//! Frame timestamps are synthetic, spaced by the cycle period from the start of playback, so a
//! scenario always replays identically.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    cell::RefCell,
    collections::HashSet,
    path::{Path, PathBuf},
    rc::Rc,
    time::{Duration, Instant},
};
use log::{debug, info, trace, warn};
use serde::Deserialize;

use comms_if::{
    eqpt::{
        FlightLink, FrameGeometry, FrameObservation, LinkError, MarkerObservation, MarkerSource,
        VelocityCommand,
    },
    input::{KeyId, KeyState},
    tc::OperatorCmd,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated flight link.
pub struct SimLink {
    battery_pct: u8,
    connected: bool,

    /// If set the next velocity send fails.
    pending_fault: bool,

    history: Rc<RefCell<LinkHistory>>,
}

/// Everything a `SimLink` has been asked to do.
#[derive(Debug, Default, Clone)]
pub struct LinkHistory {
    /// Velocity commands successfully sent, in order.
    pub sent: Vec<VelocityCommand>,

    pub num_takeoffs: u32,
    pub num_lands: u32,
    pub num_failed_sends: u32,

    /// True once the link has been released.
    pub released: bool,
}

/// A scenario to replay.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Geometry of every frame, if not given the default geometry is used.
    #[serde(default)]
    pub geometry: Option<FrameGeometry>,

    /// Battery charge reported by the simulated vehicle.
    #[serde(default = "default_battery_pct")]
    pub battery_pct: u8,

    pub frames: Vec<ScenarioFrame>,
}

/// One entry of a scenario.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioFrame {
    /// The marker seen in this frame.
    #[serde(default)]
    pub marker: Option<MarkerObservation>,

    /// Keys held by the operator.
    #[serde(default)]
    pub held: HashSet<KeyId>,

    /// Operator commands issued in this frame.
    #[serde(default)]
    pub cmds: Vec<OperatorCmd>,

    /// If true the link fails the next velocity send.
    #[serde(default)]
    pub link_fault: bool,

    /// Number of consecutive frames this entry lasts for. Commands and faults only apply to the
    /// first of them.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

/// Replays a scenario one frame at a time.
pub struct ScenarioPlayer {
    geometry: FrameGeometry,
    frames: Vec<ScenarioFrame>,

    /// Index of the current entry in `frames`.
    frame_idx: usize,

    /// Repetition of the current entry.
    rep: u32,

    started: bool,

    /// Number of frames produced so far.
    num_frames: u32,

    start: Instant,
    frame_period: Duration,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Cannot read the scenario file {0:?}: {1}")]
    FileLoad(PathBuf, std::io::Error),

    #[error("Cannot parse the scenario: {0}")]
    Parse(serde_json::Error),

    #[error("The scenario contains no frames")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimLink {
    /// Create a connected link to a vehicle with the given battery charge.
    pub fn new(battery_pct: u8) -> Self {
        Self {
            battery_pct,
            connected: true,
            pending_fault: false,
            history: Rc::new(RefCell::new(LinkHistory::default())),
        }
    }

    /// Get a handle to the history of this link, which remains valid after the link is dropped.
    pub fn history(&self) -> Rc<RefCell<LinkHistory>> {
        self.history.clone()
    }

    /// Make the next velocity send fail.
    pub fn inject_fault(&mut self) {
        debug!("SimLink: fault injected");
        self.pending_fault = true;
    }

    /// Drop the connection, all further requests fail.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    fn check_connected(&self) -> Result<(), LinkError> {
        match self.connected {
            true => Ok(()),
            false => Err(LinkError::NotConnected),
        }
    }
}

impl FlightLink for SimLink {
    fn send_velocity(&mut self, cmd: &VelocityCommand) -> Result<(), LinkError> {
        self.check_connected()?;

        if self.pending_fault {
            self.pending_fault = false;
            self.history.borrow_mut().num_failed_sends += 1;
            return Err(LinkError::Timeout);
        }

        trace!("SimLink: {}", cmd);
        self.history.borrow_mut().sent.push(*cmd);

        Ok(())
    }

    fn takeoff(&mut self) -> Result<(), LinkError> {
        self.check_connected()?;

        if self.battery_pct < 1 {
            return Err(LinkError::Rejected(String::from("battery empty")));
        }

        info!("SimLink: takeoff");
        self.history.borrow_mut().num_takeoffs += 1;

        Ok(())
    }

    fn land(&mut self) -> Result<(), LinkError> {
        self.check_connected()?;

        info!("SimLink: land");
        self.history.borrow_mut().num_lands += 1;

        Ok(())
    }

    fn battery_pct(&mut self) -> Result<u8, LinkError> {
        self.check_connected()?;
        Ok(self.battery_pct)
    }

    fn release(&mut self) {
        self.connected = false;
        self.history.borrow_mut().released = true;
    }
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        let scenario_str = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::FileLoad(path.to_path_buf(), e))?;

        Self::from_str(&scenario_str)
    }

    /// Parse a scenario from a JSON string.
    pub fn from_str(scenario_str: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(scenario_str)
            .map_err(ScenarioError::Parse)?;

        if scenario.num_frames() == 0 {
            return Err(ScenarioError::Empty);
        }

        Ok(scenario)
    }

    /// Total number of frames in the scenario, counting repeats.
    pub fn num_frames(&self) -> u64 {
        self.frames.iter().map(|f| f.repeat as u64).sum()
    }
}

impl ScenarioPlayer {
    /// Create a new player.
    ///
    /// # Inputs
    /// - `scenario`: The scenario to replay.
    /// - `default_geometry`: Frame geometry used if the scenario does not give one.
    /// - `frame_period`: Time between consecutive frame timestamps.
    pub fn new(
        scenario: Scenario,
        default_geometry: FrameGeometry,
        frame_period: Duration
    ) -> Self {
        Self {
            geometry: scenario.geometry.unwrap_or(default_geometry),
            frames: scenario.frames,
            frame_idx: 0,
            rep: 0,
            started: false,
            num_frames: 0,
            start: Instant::now(),
            frame_period,
        }
    }

    /// Operator commands issued in the current frame.
    pub fn pending_cmds(&self) -> Vec<OperatorCmd> {
        match self.current() {
            Some(f) if self.rep == 0 => f.cmds.clone(),
            _ => Vec::new()
        }
    }

    /// True if a link fault is injected in the current frame.
    pub fn link_fault(&self) -> bool {
        match self.current() {
            Some(f) => self.rep == 0 && f.link_fault,
            None => false
        }
    }

    fn current(&self) -> Option<&ScenarioFrame> {
        if !self.started {
            return None;
        }
        self.frames.get(self.frame_idx)
    }
}

impl MarkerSource for ScenarioPlayer {
    fn next_frame(&mut self) -> Option<FrameObservation> {
        if !self.started {
            self.started = true;
        }
        else if let Some(f) = self.frames.get(self.frame_idx) {
            self.rep += 1;
            if self.rep >= f.repeat {
                self.frame_idx += 1;
                self.rep = 0;
            }
        }

        // Skip any entries with no repeats
        while let Some(f) = self.frames.get(self.frame_idx) {
            if f.repeat > 0 {
                break;
            }
            warn!("Scenario entry {} has zero repeats, skipping", self.frame_idx);
            self.frame_idx += 1;
        }

        let frame = self.frames.get(self.frame_idx)?;

        let timestamp = self.start + self.frame_period * self.num_frames;
        self.num_frames += 1;

        Some(FrameObservation {
            timestamp,
            geometry: self.geometry,
            marker: frame.marker.clone(),
        })
    }
}

impl KeyState for ScenarioPlayer {
    fn is_held(&self, key: &KeyId) -> bool {
        self.current()
            .map(|f| f.held.contains(key))
            .unwrap_or(false)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_battery_pct() -> u8 {
    100
}

fn default_repeat() -> u32 {
    1
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const SCENARIO: &str = r#"{
        "battery_pct": 50,
        "frames": [
            { "cmds": ["takeoff", "toggle_approach"], "held": ["W"] },
            { "marker": { "center_px": [500.0, 240.0], "size_px": 40.0 }, "repeat": 3 },
            { "link_fault": true, "repeat": 0 },
            { "link_fault": true, "cmds": ["quit"], "repeat": 2 }
        ]
    }"#;

    fn player() -> ScenarioPlayer {
        ScenarioPlayer::new(
            Scenario::from_str(SCENARIO).unwrap(),
            FrameGeometry::new(640, 480),
            Duration::from_millis(50)
        )
    }

    #[test]
    fn test_parse() {
        let s = Scenario::from_str(SCENARIO).unwrap();
        assert_eq!(s.battery_pct, 50);
        assert_eq!(s.geometry, None);
        assert_eq!(s.num_frames(), 6);
        assert!(s.frames[0].held.contains(&KeyId::new("w")));
        assert_eq!(s.frames[1].marker.as_ref().unwrap().size_px, 40.0);

        assert!(matches!(
            Scenario::from_str(r#"{ "frames": [] }"#),
            Err(ScenarioError::Empty)
        ));
        assert!(matches!(Scenario::from_str("{"), Err(ScenarioError::Parse(_))));
    }

    #[test]
    fn test_playback() {
        let mut p = player();

        // Nothing is current before the first frame
        assert!(p.pending_cmds().is_empty());
        assert!(!p.is_held(&KeyId::new("w")));

        let f0 = p.next_frame().unwrap();
        assert_eq!(f0.geometry, FrameGeometry::new(640, 480));
        assert!(f0.marker.is_none());
        assert_eq!(p.pending_cmds(), vec![OperatorCmd::Takeoff, OperatorCmd::ToggleApproach]);
        assert!(p.is_held(&KeyId::new("w")));

        // Repeated marker frames
        for i in 1..4u32 {
            let f = p.next_frame().unwrap();
            assert!(f.marker.is_some());
            assert_eq!(f.timestamp - f0.timestamp, Duration::from_millis(50) * i);
            assert!(p.pending_cmds().is_empty());
            assert!(!p.is_held(&KeyId::new("w")));
        }

        // Zero repeat entry skipped, commands and faults only on the first repetition
        p.next_frame().unwrap();
        assert!(p.link_fault());
        assert_eq!(p.pending_cmds(), vec![OperatorCmd::Quit]);
        p.next_frame().unwrap();
        assert!(!p.link_fault());
        assert!(p.pending_cmds().is_empty());

        assert!(p.next_frame().is_none());
        assert!(p.next_frame().is_none());
    }

    #[test]
    fn test_sim_link() {
        let mut link = SimLink::new(0);
        let history = link.history();

        assert_eq!(link.battery_pct().unwrap(), 0);
        assert!(matches!(link.takeoff(), Err(LinkError::Rejected(_))));

        link.send_velocity(&VelocityCommand::new(1, 2, 0, 3)).unwrap();
        link.inject_fault();
        assert!(matches!(
            link.send_velocity(&VelocityCommand::ZERO),
            Err(LinkError::Timeout)
        ));
        link.send_velocity(&VelocityCommand::ZERO).unwrap();

        link.release();
        assert!(matches!(link.land(), Err(LinkError::NotConnected)));

        let h = history.borrow();
        assert_eq!(h.sent, vec![VelocityCommand::new(1, 2, 0, 3), VelocityCommand::ZERO]);
        assert_eq!(h.num_failed_sends, 1);
        assert!(h.released);
    }
}
