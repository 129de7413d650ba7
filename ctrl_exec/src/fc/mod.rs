//! # Flight Controller
//!
//! The flight controller is the vehicle's own actuation and sensing stack. The control server
//! only ever talks to it through the [`FlightController`] trait, every method of which is a
//! blocking round trip that returns once the vehicle has acknowledged the request.
//!
//! Two implementations are provided:
//! - [`sim::SimFc`], an in-process simulated vehicle,
//! - [`client::FcClient`], a network client for the flight controller executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

#[cfg(feature = "fc")]
pub mod client;
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use comms_if::eqpt::fc::{
    AxisControlConfig, FcRequest, FcResponse, FcState, FlightCommand, ImuState,
    RollPitchControlMode, VerticalControlMode, YawControlMode,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Actuation and state channel to the vehicle.
pub trait FlightController: Send + Sync {
    /// Send a single velocity command. Only accepted while the virtual stick is enabled.
    fn send_command(&self, cmd: &FlightCommand) -> Result<(), FcError>;

    /// Enable or disable virtual stick mode, which hands actuation to this server.
    fn set_virtual_stick(&self, enabled: bool) -> Result<(), FcError>;

    /// Whether the vehicle currently allows virtual stick control.
    fn virtual_stick_available(&self) -> Result<bool, FcError>;

    fn axis_config(&self) -> Result<AxisControlConfig, FcError>;

    fn set_axis_config(&self, config: AxisControlConfig) -> Result<(), FcError>;

    fn take_off(&self) -> Result<(), FcError>;

    fn land(&self) -> Result<(), FcError>;

    /// Continue a landing paused by landing protection.
    fn confirm_landing(&self) -> Result<(), FcError>;

    fn reboot(&self) -> Result<(), FcError>;

    fn landing_protection(&self) -> Result<bool, FcError>;

    fn set_landing_protection(&self, enabled: bool) -> Result<(), FcError>;

    fn state(&self) -> Result<FcState, FcError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a flight controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FcError {
    #[error("No vehicle is connected")]
    NotConnected,

    #[error("{0}")]
    Rejected(String),

    #[error("Flight controller link error: {0}")]
    Comms(String),

    #[error("Unexpected response from the flight controller: {0:?}")]
    UnexpectedResponse(FcResponse),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute a request on the given flight controller and build the response to send back.
pub fn handle_request(fc: &dyn FlightController, request: FcRequest) -> FcResponse {
    let result = match request {
        FcRequest::SendCommand(cmd) => fc.send_command(&cmd).map(|_| FcResponse::Ack),
        FcRequest::SetVirtualStick(en) => fc.set_virtual_stick(en).map(|_| FcResponse::Ack),
        FcRequest::GetVirtualStickAvailable => fc.virtual_stick_available().map(FcResponse::Bool),
        FcRequest::GetAxisConfig => fc.axis_config().map(FcResponse::AxisConfig),
        FcRequest::SetAxisConfig(c) => fc.set_axis_config(c).map(|_| FcResponse::Ack),
        FcRequest::TakeOff => fc.take_off().map(|_| FcResponse::Ack),
        FcRequest::Land => fc.land().map(|_| FcResponse::Ack),
        FcRequest::ConfirmLanding => fc.confirm_landing().map(|_| FcResponse::Ack),
        FcRequest::Reboot => fc.reboot().map(|_| FcResponse::Ack),
        FcRequest::GetLandingProtection => fc.landing_protection().map(FcResponse::Bool),
        FcRequest::SetLandingProtection(en) => {
            fc.set_landing_protection(en).map(|_| FcResponse::Ack)
        }
        FcRequest::GetState => fc.state().map(FcResponse::State),
    };

    match result {
        Ok(r) => r,
        Err(FcError::NotConnected) => FcResponse::NotConnected,
        Err(e) => FcResponse::Rejected(e.to_string()),
    }
}

/// Convert the failure responses into errors.
pub fn check_response(response: FcResponse) -> Result<FcResponse, FcError> {
    match response {
        FcResponse::Rejected(reason) => Err(FcError::Rejected(reason)),
        FcResponse::NotConnected => Err(FcError::NotConnected),
        r => Ok(r),
    }
}
