//! Main drone-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop, once per camera frame:
//!         - Frame acquisition (marker observation and held keys)
//!         - Operator command processing and handling
//!         - Command arbitration:
//!             - Manual control
//!             - Visual servoing
//!         - Output stage
//!         - Archiving
//!     - Shutdown, landing the vehicle if it is still airborne
//!
//! # Modules
//!
//! All cyclic control modules (e.g. `vis_servo`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::Module` trait.
//!     2. Keep any state persisting between cycles out of that struct, in a state struct owned
//!        by the main loop.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drone_lib::{
    arbiter::{Arbiter, ArbiterInput},
    data_store::DataStore,
    flight_mgr::FlightMgr,
    manual_ctrl::ManualCtrl,
    output_stage::OutputStage,
    params::DroneExecParams,
    sim_client::{Scenario, ScenarioPlayer, SimLink},
    vis_servo::VisServo,
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use structopt::StructOpt;

// Internal
use comms_if::eqpt::MarkerSource;
use util::{
    archive::{Archived, Archiver},
    host,
    logger::{logger_init, LevelFilter},
    module::Module,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "drone_exec", about = "Marker approach flight software")]
struct Opts {
    /// Path to the scenario file to replay.
    #[structopt(parse(from_os_str))]
    scenario: PathBuf,

    /// Minimum level of messages to log, one of info, debug or trace.
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "drone_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Marker Approach Drone Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: DroneExecParams = util::params::load(
        "drone_exec.toml"
    ).wrap_err("Could not load exec params")?;

    if !(exec_params.cycle_period_s > 0.0 && exec_params.cycle_period_s < 1.0) {
        return Err(eyre!(
            "Expected a cycle period in (0, 1) s, found {}", exec_params.cycle_period_s
        ));
    }

    info!("Exec parameters loaded");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    // ---- LOAD SCENARIO ----

    info!("Loading scenario from {:?}", opts.scenario);

    let scenario = Scenario::load(&opts.scenario)
        .wrap_err("Failed to load scenario")?;

    info!(
        "Loaded scenario lasts {:.02} s over {} frames\n",
        scenario.num_frames() as f64 * exec_params.cycle_period_s,
        scenario.num_frames()
    );

    let battery_pct = scenario.battery_pct;
    let mut player = ScenarioPlayer::new(
        scenario,
        exec_params.default_frame_geometry,
        cycle_period
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    ds.archiver = Archiver::from_path(&session, "frames.csv")
        .wrap_err("Failed to initialise the frame archive")?;

    // ---- INITIALISE MODULES ----

    let manual_ctrl = ManualCtrl::init("manual_ctrl.toml")
        .wrap_err("Failed to initialise ManualCtrl")?;
    info!("ManualCtrl init complete");

    let vis_servo = VisServo::init("vis_servo.toml")
        .wrap_err("Failed to initialise VisServo")?;
    info!("VisServo init complete");

    let mut arbiter = Arbiter::new();
    let mut output_stage = OutputStage::new(exec_params.send_failure_error_limit);

    info!("Module initialisation complete\n");

    // ---- ACQUIRE FLIGHT LINK ----

    let mut flight_mgr = FlightMgr::new(
        SimLink::new(battery_pct),
        exec_params.min_takeoff_battery_pct
    );

    info!(
        "Flight link acquired, battery at {}%",
        flight_mgr.battery_pct().wrap_err("Failed to query the vehicle battery")?
    );

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        // ---- DATA INPUT ----

        let frame = match player.next_frame() {
            Some(f) => f,
            None => {
                info!("End of scenario reached, stopping");
                break
            }
        };

        if player.link_fault() {
            flight_mgr.link_mut().inject_fault();
        }

        // ---- OPERATOR COMMAND PROCESSING ----

        for cmd in player.pending_cmds().iter() {
            tc_processor::exec(&mut ds, &mut flight_mgr, cmd);
        }

        ds.airborne = flight_mgr.is_airborne();

        // ---- COMMAND ARBITRATION ----

        let decision = arbiter.arbitrate(
            &manual_ctrl,
            &vis_servo,
            &mut ds.ctrl_state,
            &ArbiterInput {
                airborne: ds.airborne,
                keys: &player,
                frame: &frame,
            }
        );

        // ---- OUTPUT ----

        let sent_cmd = output_stage.forward(&mut flight_mgr, &decision.cmd);
        ds.record(decision, sent_cmd);

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.write() {
            warn!("Could not write the frame archive: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        ds.cycle_end();

        if ds.quit {
            info!("Quit command processed, stopping");
            break;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    flight_mgr.shutdown();

    let summary = ds.summary(&output_stage);

    info!(
        "{} cycles run, {} commands sent, {} send failures, {} rejected operator commands",
        summary.num_cycles,
        summary.num_sent,
        summary.num_send_failures,
        summary.num_rejected_cmds
    );

    session.save_json("flight_summary.json", &summary)
        .wrap_err("Failed to save the flight summary")?;

    info!("End of execution");

    Ok(())
}
