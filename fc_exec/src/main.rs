//! # Flight Controller Executable
//!
//! Serves a simulated vehicle to the control server over the network, so the whole ground to
//! vehicle chain can be exercised without any hardware.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Flight controller server abstraction.
mod fc_server;

/// Parameters for the flight controller executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, trace, warn};

// Internal
use comms_if::net::NetParams;
use ctrl_lib::fc::{handle_request, sim::SimFc};
use fc_server::FcServer;
use params::FcExecParams;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("fc_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Simulated Flight Controller Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let params: FcExecParams =
        util::params::load("fc_exec.toml").wrap_err("Could not load fc_exec params")?;

    info!("Parameters loaded: {:?}", params);

    // ---- SERVER INITIALISATION ----

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let server = FcServer::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise server")?;

    info!("Server initialised");

    let sim = SimFc::new(params.sim);

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    let mut client_connected = false;

    loop {
        let request = match server.get_request() {
            Ok(Some(r)) => r,
            Ok(None) => continue,
            Err(e) => {
                warn!("Could not answer an invalid request: {}", e);
                continue;
            }
        };

        if !client_connected {
            info!("Recieved first request from the control server");
            client_connected = true;
        }

        let response = handle_request(&sim, request.clone());
        trace!("{:?} -> {:?}", request, response);

        if let Err(e) = server.send_response(&response) {
            warn!("Couldn't send response to client: {}", e);
        }
    }
}
