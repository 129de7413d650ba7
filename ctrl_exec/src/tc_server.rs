//! # Telecommand Server
//!
//! Accepts telecommands from ground clients over a REP socket. Every received request is
//! answered with exactly one [`TcResponse`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    tc::{Tc, TcParseError, TcResponse},
};
use log::trace;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telecommand server
pub struct TcServer {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the response to the client: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the client: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the recieved telecommand: {0}")]
    TcParseError(TcParseError),

    #[error("The client sent a message which was not valid UTF-8")]
    NonUtf8Request,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcServer {
    /// Bind a new TC server.
    ///
    /// This function will not wait for a client to connect.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TcServerError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            linger: 1,
            recv_timeout: 100,
            send_timeout: 100,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.tc_server_endpoint,
        )
        .map_err(TcServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Check if a client is connected to the server
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Recieve a single TC from a client.
    ///
    /// `Ok(None)` is returned if no TC arrived within the receive timeout.
    ///
    /// After recieving a valid TC the server must send a response using `.send_response()` before
    /// attempting to recieve another TC. If the request cannot be parsed an error response is sent
    /// automatically by this function.
    pub fn receive_tc(&self) -> Result<Option<Tc>, TcServerError> {
        let tc_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                self.send_response(&TcResponse::error(TcServerError::NonUtf8Request))?;

                return Err(TcServerError::NonUtf8Request);
            }
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(TcServerError::RecvError(e)),
        };

        trace!("TC received: {}", tc_str);

        match Tc::from_json(&tc_str) {
            Ok(tc) => Ok(Some(tc)),
            Err(e) => {
                self.send_response(&TcResponse::error(&e))?;

                Err(TcServerError::TcParseError(e))
            }
        }
    }

    /// Send the response to the last recieved TC.
    pub fn send_response(&self, response: &TcResponse) -> Result<(), TcServerError> {
        let response_str =
            serde_json::to_string(response).map_err(TcServerError::SerializationError)?;

        self.socket
            .send(&response_str, 0)
            .map_err(TcServerError::SendError)
    }
}
