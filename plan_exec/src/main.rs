//! # Highway Planner Executable
//!
//! This executable plans the path of a vehicle driving around a highway in the driving simulator.
//! Each cycle the simulator sends telemetry for the vehicle and the traffic around it, and the
//! planner answers with the next stretch of path for the vehicle to follow.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use comms_if::sim::{SimEvent, SimResponse};
use log::{debug, info, warn};

// Internal
use plan_lib::{
    params::PlanExecParams,
    plan_server::PlanServer,
    planner::{self, InitData, InputData, Params, Planner},
    road::Road,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "plan_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Highway Planner Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let exec_params: PlanExecParams = util::params::load("plan_exec.toml")
        .wrap_err("Could not load the executable parameters")?;
    let planner_params: Params = util::params::load(&exec_params.planner_params_file)
        .wrap_err("Could not load the planner parameters")?;

    info!("Parameters loaded");

    // ---- LOAD ROAD ----

    let map_path = host::resolve_sw_path(&exec_params.map_file)
        .wrap_err("Could not resolve the road map path")?;
    let road = Road::load(&map_path, planner_params.d_sign_ref())
        .wrap_err_with(|| format!("Could not load the road map from {:?}", map_path))?;

    info!(
        "Road loaded: {} waypoints, {:.1} m loop",
        road.waypoints().len(),
        road.track_length_m()
    );

    // ---- MODULE INITIALISATION ----

    let mut planner = Planner::init(
        InitData { params: planner_params, road },
        &session
    ).wrap_err("Failed to initialise the planner")?;

    info!("Planner initialised");

    // ---- SERVER INITIALISATION ----

    let mut server = PlanServer::new(&exec_params)
        .wrap_err("Failed to initialise server")?;

    info!("Server initialised on {}", exec_params.net.plan_endpoint);

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    let mut was_connected = false;

    loop {
        if server.connected() != was_connected {
            was_connected = !was_connected;
            if was_connected {
                info!("Simulator connected");
            }
            else {
                warn!("Simulator disconnected");
            }
        }

        let event = match server.recv_event() {
            Some(e) => e,
            None => continue
        };

        let response = match event {
            SimEvent::Manual => SimResponse::Manual,
            SimEvent::Telemetry(tm) => {
                let input = InputData::from_telemetry(&tm);

                let path = match planner.proc(&input) {
                    Ok((path, _report)) => path,
                    Err(e) => raise_error!("Planning cycle failed: {}", e)
                };

                if let Err(e) = planner.write() {
                    warn!("Could not archive the planner status: {}", e);
                }

                SimResponse::Control(planner::to_path_dems(&path))
            }
        };

        debug!("Responding with {}", match &response {
            SimResponse::Control(dems) => format!("a {} point path", dems.len()),
            SimResponse::Manual => String::from("a manual acknowledgement")
        });

        if let Err(e) = server.send(&response) {
            warn!("Could not send the response to the simulator: {}", e);
        }
    }
}
