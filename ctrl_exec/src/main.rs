//! Main drone control server entry point.
//!
//! # Architecture
//!
//! The server is request driven:
//!
//!     - Initialise the session, logging and parameters
//!     - Connect to the flight controller (or start the simulated one)
//!     - Main loop:
//!         - Recieve a TC from a ground client
//!         - Execute it against the flight control state, blocking until done
//!         - Send the response
//!
//! Velocity streaming and IMU collection run on their own threads, started and stopped by TCs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::sync::Arc;

// Internal
use comms_if::net::NetParams;
use ctrl_lib::{
    fc::FlightController,
    flight_ctrl::{FlightCtrl, Params},
    tc_processor,
    tc_server::{TcServer, TcServerError},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

#[cfg(feature = "fc")]
use ctrl_lib::fc::client::FcClient;
#[cfg(not(feature = "fc"))]
use ctrl_lib::fc::sim::{SimFc, SimParams};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drone Control Server\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let params: Params =
        util::params::load("flight_ctrl.toml").wrap_err("Could not load flight control params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    #[cfg(feature = "fc")]
    let fc_client = {
        let c = FcClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise the FcClient")?;
        info!("FcClient initialised");
        Arc::new(c)
    };
    #[cfg(feature = "fc")]
    let fc: Arc<dyn FlightController> = fc_client.clone();

    #[cfg(not(feature = "fc"))]
    let fc: Arc<dyn FlightController> = {
        info!("Flying the simulated vehicle");
        Arc::new(SimFc::new(SimParams::default()))
    };

    let tc_server = TcServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the TcServer")?;
    info!("TcServer initialised");

    info!("Network initialisation complete");

    // ---- INITIALISE MODULES ----

    let flight_ctrl = FlightCtrl::new(fc, params).wrap_err("Failed to initialise FlightCtrl")?;
    info!("FlightCtrl init complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    #[cfg(feature = "fc")]
    let mut fc_connected = false;

    loop {
        // Report changes in the flight controller link
        #[cfg(feature = "fc")]
        {
            let connected = fc_client.is_connected();
            if connected != fc_connected {
                if connected {
                    info!("Connected to the flight controller");
                } else {
                    warn!("Flight controller not connected");
                }
                fc_connected = connected;
            }
        }

        match tc_server.receive_tc() {
            Ok(Some(tc)) => {
                let response = tc_processor::exec(&flight_ctrl, tc);

                if let Err(e) = tc_server.send_response(&response) {
                    warn!("Could not respond to TC: {}", e);
                }
            }
            Ok(None) => (),
            Err(TcServerError::TcParseError(e)) => warn!("Could not parse recieved TC: {}", e),
            Err(TcServerError::NonUtf8Request) => warn!("Recieved a non UTF-8 TC"),
            Err(e) => {
                error!("TC server error: {}", e);
                break;
            }
        }
    }

    // Stop any background activity before closing the session
    drop(flight_ctrl);
    session.exit();

    Err(Report::msg("The TC server stopped unexpectedly"))
}
