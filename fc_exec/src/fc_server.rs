//! # Flight Controller Server Module
//!
//! This module abstracts over the networking side of the flight controller executable. The server
//! accepts connections from the client in the control server, recieving requests and sending back
//! one response for each.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::fc::{FcRequest, FcResponse},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the flight controller executable.
pub struct FcServer {
    /// REP socket which accepts requests from the client
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`FcServer`]
#[derive(thiserror::Error, Debug)]
pub enum FcServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not send data to the client: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FcServer {
    /// Create a new instance of the flight controller server.
    ///
    /// This function will not wait for a connection from the client before returning.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, FcServerError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: 200,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.fc_server_endpoint,
        )?;

        Ok(Self { socket })
    }

    /// Retrieve a request from the client.
    ///
    /// `None` is returned if nothing arrived within the receive timeout. A request which cannot be
    /// parsed is answered with a rejection here and `None` is returned.
    ///
    /// The user MUST call [`FcServer::send_response`] after every request returned.
    pub fn get_request(&self) -> Result<Option<FcRequest>, FcServerError> {
        let msg = match self.socket.recv_msg(0) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };

        match serde_json::from_str(msg.as_str().unwrap_or("")) {
            Ok(r) => Ok(Some(r)),
            Err(e) => {
                warn!("Could not deserialize request: {}", e);
                self.send_response(&FcResponse::Rejected(format!("Invalid request: {}", e)))?;
                Ok(None)
            }
        }
    }

    /// Send the response to the last request.
    pub fn send_response(&self, response: &FcResponse) -> Result<(), FcServerError> {
        let resp_str =
            serde_json::to_string(response).map_err(FcServerError::SerializationError)?;

        self.socket
            .send(&resp_str, 0)
            .map_err(FcServerError::SendError)
    }
}

impl From<MonitoredSocketError> for FcServerError {
    fn from(e: MonitoredSocketError) -> Self {
        FcServerError::SocketError(e)
    }
}
