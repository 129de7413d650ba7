//! # Flight control module
//!
//! Owns the control mode, the motion configuration and the velocity stream, and exposes every
//! operation a ground client can request. [`FlightCtrl`] is shared between the TC server and any
//! other caller, all of its methods take `&self`.
//!
//! Concurrency rules:
//! - operations which change actuation (moves, starting and stopping the velocity stream, mode
//!   changes) are serialised, so a directional move and a velocity stream never overlap,
//! - queries and live velocity updates never wait for a move to finish.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod imu;
mod mode;
mod params;
mod state;
mod velocity;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::ControlMode;
use std::sync::PoisonError;

use crate::{fc::FcError, motion::MotionError, vstick::VstickError};

pub use imu::*;
pub use mode::*;
pub use params::*;
pub use state::*;
pub use velocity::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during FlightCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum FlightCtrlError {
    #[error("{0}")]
    Validation(String),

    #[error("Cannot execute a {attempted} command while in {current} mode")]
    ModeMismatch {
        attempted: ControlMode,
        current: ControlMode,
    },

    #[error("Cannot change the control mode while velocity control is active")]
    ModeTransition,

    #[error("{0}")]
    ActuationMode(VstickError),

    #[error("The vehicle refused the command: {0}")]
    ActuationCommand(FcError),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0} is already active")]
    AlreadyActive(&'static str),

    #[error("{0} is not active")]
    NotActive(&'static str),

    #[error("Cannot spawn the {0} thread: {1}")]
    ThreadSpawn(&'static str, std::io::Error),

    #[error("Internal state lock was poisoned")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<G> From<PoisonError<G>> for FlightCtrlError {
    fn from(_: PoisonError<G>) -> Self {
        FlightCtrlError::Poisoned
    }
}

impl From<MotionError> for FlightCtrlError {
    fn from(e: MotionError) -> Self {
        FlightCtrlError::Validation(e.to_string())
    }
}

impl From<VstickError> for FlightCtrlError {
    fn from(e: VstickError) -> Self {
        match e {
            VstickError::Snapshot(FcError::NotConnected) => FlightCtrlError::unavailable(),
            e => FlightCtrlError::ActuationMode(e),
        }
    }
}

impl From<FcError> for FlightCtrlError {
    fn from(e: FcError) -> Self {
        match e {
            FcError::NotConnected => FlightCtrlError::unavailable(),
            e => FlightCtrlError::ActuationCommand(e),
        }
    }
}

impl FlightCtrlError {
    fn unavailable() -> Self {
        FlightCtrlError::Unavailable(FcError::NotConnected.to_string())
    }
}
