//! # Flight Controller Client
//!
//! This module provides networking abstractions to connect to the flight controller server.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions};
use log::trace;
use std::sync::Mutex;

use super::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the flight controller executable.
///
/// Requests are serialised through a single REQ socket, so concurrent callers are answered one
/// after the other.
pub struct FcClient {
    socket: Mutex<MonitoredSocket>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum FcClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the request to the server: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the server: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The server sent a message which was not valid UTF-8")]
    NonUtf8Response,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FcClient {
    /// Create a new instance of the flight controller client.
    ///
    /// This function will not block until the server connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, FcClientError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 1000,
            send_timeout: 100,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            socket_options,
            &params.fc_client_endpoint,
        )
        .map_err(FcClientError::SocketError)?;

        Ok(Self {
            socket: Mutex::new(socket),
        })
    }

    /// Check if the client is connected to the server
    pub fn is_connected(&self) -> bool {
        self.socket.lock().map(|s| s.connected()).unwrap_or(false)
    }

    /// Send a request and wait for the server's response.
    fn request(&self, request: &FcRequest) -> Result<FcResponse, FcError> {
        let socket = self
            .socket
            .lock()
            .map_err(|_| FcError::Comms("client socket poisoned".into()))?;

        if !socket.connected() {
            return Err(FcError::NotConnected);
        }

        let response = exchange(&socket, request).map_err(|e| FcError::Comms(e.to_string()))?;

        trace!("FC {:?} -> {:?}", request, response);

        check_response(response)
    }

    fn request_ack(&self, request: FcRequest) -> Result<(), FcError> {
        match self.request(&request)? {
            FcResponse::Ack => Ok(()),
            r => Err(FcError::UnexpectedResponse(r)),
        }
    }

    fn request_bool(&self, request: FcRequest) -> Result<bool, FcError> {
        match self.request(&request)? {
            FcResponse::Bool(b) => Ok(b),
            r => Err(FcError::UnexpectedResponse(r)),
        }
    }
}

impl FlightController for FcClient {
    fn send_command(&self, cmd: &FlightCommand) -> Result<(), FcError> {
        self.request_ack(FcRequest::SendCommand(*cmd))
    }

    fn set_virtual_stick(&self, enabled: bool) -> Result<(), FcError> {
        self.request_ack(FcRequest::SetVirtualStick(enabled))
    }

    fn virtual_stick_available(&self) -> Result<bool, FcError> {
        self.request_bool(FcRequest::GetVirtualStickAvailable)
    }

    fn axis_config(&self) -> Result<AxisControlConfig, FcError> {
        match self.request(&FcRequest::GetAxisConfig)? {
            FcResponse::AxisConfig(c) => Ok(c),
            r => Err(FcError::UnexpectedResponse(r)),
        }
    }

    fn set_axis_config(&self, config: AxisControlConfig) -> Result<(), FcError> {
        self.request_ack(FcRequest::SetAxisConfig(config))
    }

    fn take_off(&self) -> Result<(), FcError> {
        self.request_ack(FcRequest::TakeOff)
    }

    fn land(&self) -> Result<(), FcError> {
        self.request_ack(FcRequest::Land)
    }

    fn confirm_landing(&self) -> Result<(), FcError> {
        self.request_ack(FcRequest::ConfirmLanding)
    }

    fn reboot(&self) -> Result<(), FcError> {
        self.request_ack(FcRequest::Reboot)
    }

    fn landing_protection(&self) -> Result<bool, FcError> {
        self.request_bool(FcRequest::GetLandingProtection)
    }

    fn set_landing_protection(&self, enabled: bool) -> Result<(), FcError> {
        self.request_ack(FcRequest::SetLandingProtection(enabled))
    }

    fn state(&self) -> Result<FcState, FcError> {
        match self.request(&FcRequest::GetState)? {
            FcResponse::State(s) => Ok(s),
            r => Err(FcError::UnexpectedResponse(r)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// One request/response round trip on the socket.
fn exchange(socket: &MonitoredSocket, request: &FcRequest) -> Result<FcResponse, FcClientError> {
    let req_str = serde_json::to_string(request).map_err(FcClientError::SerializationError)?;

    socket
        .send(&req_str, 0)
        .map_err(FcClientError::SendError)?;

    let msg = socket.recv_msg(0).map_err(FcClientError::RecvError)?;
    let msg_str = msg.as_str().ok_or(FcClientError::NonUtf8Response)?;

    serde_json::from_str(msg_str).map_err(FcClientError::DeserializeError)
}
