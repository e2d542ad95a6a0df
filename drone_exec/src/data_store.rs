//! # Data Store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::trace;
use serde::Serialize;

use comms_if::eqpt::VelocityCommand;
use util::archive::{Archived, ArchiveError, Archiver};

use crate::{
    arbiter::{CmdSource, Decision},
    output_stage::OutputStage,
    vis_servo::{ApproachState, ControllerState},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Session elapsed time at the start of the cycle
    pub sim_time_s: f64,

    /// Set by a quit command, the loop ends after the current cycle
    pub quit: bool,

    // Visual servoing
    pub ctrl_state: ControllerState,

    // Arbitration
    pub decision: Option<Decision>,

    /// The command handed to the link this cycle, if any
    pub sent_cmd: Option<VelocityCommand>,

    pub airborne: bool,

    // Monitoring counters
    /// Number of operator commands rejected
    pub num_rejected_cmds: u64,

    /// Number of cycles spent with each label
    pub label_counts: BTreeMap<ApproachState, u64>,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Per-frame archive
    pub archiver: Archiver,
}

/// A flat per-frame archive record.
#[derive(Serialize)]
struct FrameRecord {
    time_s: f64,
    cycle: u64,
    airborne: bool,
    label: ApproachState,
    source: Option<CmdSource>,
    lr: i32,
    fb: i32,
    ud: i32,
    yaw: i32,
    sent: bool,
    lat_error_px: Option<f64>,
    skew: Option<f64>,
    size_error_px: Option<f64>,
}

/// Summary of a flight, saved into the session directory at shutdown.
#[derive(Debug, Serialize)]
pub struct FlightSummary {
    pub end_time: DateTime<Utc>,
    pub num_cycles: u64,
    pub num_sent: u64,
    pub num_send_failures: u64,
    pub num_rejected_cmds: u64,
    pub label_counts: BTreeMap<ApproachState, u64>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    pub fn cycle_start(&mut self) {
        self.decision = None;
        self.sent_cmd = None;
        self.sim_time_s = util::session::get_elapsed_seconds();
    }

    /// Record the outcome of the cycle.
    pub fn record(&mut self, decision: Decision, sent_cmd: Option<VelocityCommand>) {
        trace!("Cycle {}: {:?}", self.num_cycles, decision);

        *self.label_counts.entry(decision.label).or_insert(0) += 1;
        self.decision = Some(decision);
        self.sent_cmd = sent_cmd;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }

    /// Build the summary of the flight so far.
    pub fn summary(&self, output_stage: &OutputStage) -> FlightSummary {
        FlightSummary {
            end_time: Utc::now(),
            num_cycles: self.num_cycles,
            num_sent: output_stage.num_sent,
            num_send_failures: output_stage.num_failures,
            num_rejected_cmds: self.num_rejected_cmds,
            label_counts: self.label_counts.clone(),
        }
    }

    fn frame_record(&self) -> FrameRecord {
        let report = self.decision.as_ref().and_then(|d| d.report);
        let cmd = self.decision.map(|d| d.cmd).unwrap_or_default();

        FrameRecord {
            time_s: self.sim_time_s,
            cycle: self.num_cycles,
            airborne: self.airborne,
            label: self.ctrl_state.label,
            source: self.decision.map(|d| d.source),
            lr: cmd.lr,
            fb: cmd.fb,
            ud: cmd.ud,
            yaw: cmd.yaw,
            sent: self.sent_cmd.is_some(),
            lat_error_px: report.and_then(|r| r.lat_error_px),
            skew: report.and_then(|r| r.skew),
            size_error_px: report.and_then(|r| r.size_error_px),
        }
    }
}

impl Archived for DataStore {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let record = self.frame_record();
        self.archiver.serialise(record)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
