//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. A telecommand (TC) is an instruction sent by a ground client to
//! the control server, which always answers with a single [`TcResponse`].
//!
//! On the wire a TC is a JSON object with a `type` and, for TCs which carry
//! data, a `payload`:
//!
//! ```json
//! {"type": "MOVE", "payload": {"direction": "FORWARD", "magnitude": 2.0}}
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod motion;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::Value;
use structopt::StructOpt;
use thiserror::Error;

// Internal
pub use motion::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the drone by the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[structopt(name = "tc", about = "Drone control telecommands")]
pub enum Tc {
    // ---- FLIGHT ----

    /// Take off and hover.
    #[structopt(name = "takeoff")]
    Takeoff,

    /// Start auto landing.
    #[structopt(name = "land")]
    Land,

    /// Confirm a landing which was paused by landing protection.
    #[structopt(name = "confirm-landing")]
    ConfirmLanding,

    /// Reboot the flight controller.
    #[structopt(name = "reboot")]
    Reboot,

    // ---- LANDING PROTECTION ----

    /// Query whether landing protection is enabled.
    #[structopt(name = "landing-protection")]
    GetLandingProtection,

    #[structopt(name = "enable-landing-protection")]
    EnableLandingProtection,

    #[structopt(name = "disable-landing-protection")]
    DisableLandingProtection,

    // ---- CONFIGURATION ----

    /// Set one of the motion limits, the value must be positive.
    #[structopt(name = "set-limit")]
    SetLimit {
        limit: LimitKind,
        value: f64
    },

    /// Get the current value of one of the motion limits.
    #[structopt(name = "limit")]
    GetLimit {
        limit: LimitKind
    },

    /// Select the velocity profile used by directional moves.
    #[structopt(name = "set-profile")]
    SetProfile {
        profile: VelocityProfileKind
    },

    #[structopt(name = "profile")]
    GetProfile,

    /// Switch between POSITION and VELOCITY control.
    #[structopt(name = "set-mode")]
    SetMode {
        mode: ControlMode
    },

    #[structopt(name = "mode")]
    GetMode,

    // ---- POSITION MODE ----

    /// Move a distance (meters) or rotate an angle (degrees) in the given direction.
    ///
    /// The request returns once the move has been executed.
    #[structopt(name = "move")]
    Move {
        direction: Direction,
        magnitude: f64
    },

    // ---- VELOCITY MODE ----

    /// Start streaming the velocity command to the drone.
    #[structopt(name = "start-velocity")]
    StartVelocity,

    /// Replace the streamed velocity command.
    #[structopt(
        name = "velocity",
        setting = structopt::clap::AppSettings::AllowNegativeNumbers
    )]
    SetVelocity {
        /// Forwards speed in meters/second
        x: f64,
        /// Rightwards speed in meters/second
        y: f64,
        /// Upwards speed in meters/second
        z: f64,
        /// Clockwise yaw rate in degrees/second
        yaw_rate: f64
    },

    /// Get the streamed velocity command.
    #[structopt(name = "get-velocity")]
    GetVelocity,

    /// Stop streaming and release the virtual stick.
    #[structopt(name = "stop-velocity")]
    StopVelocity,

    // ---- STATE ----

    #[structopt(name = "vstick-available")]
    IsVirtualStickAvailable,

    /// Compass heading in degrees.
    #[structopt(name = "heading")]
    GetHeading,

    /// Height above ground from the ultrasonic sensor, in meters.
    #[structopt(name = "altitude")]
    GetAltitude,

    // ---- IMU COLLECTION ----

    /// Start sampling the IMU state, by default once a second.
    #[structopt(name = "start-imu")]
    StartImuCollection {
        interval_ms: Option<u64>
    },

    #[structopt(name = "stop-imu")]
    StopImuCollection,

    #[structopt(name = "imu")]
    GetCurrentImuState,

    #[structopt(name = "collected-imu")]
    GetCollectedImuStates,

    #[structopt(name = "clear-imu")]
    ClearCollectedImuStates,
}

/// The response to a telecommand.
///
/// Serialised without a tag, so the ground sees either
/// `{"completed": true, "errorDescription": null}` or `{"state": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TcResponse {
    Completed(CommandCompleted),
    State(DroneState<Value>),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC is invalid: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Outcome of a telecommand which does not return any data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandCompleted {
    pub completed: bool,

    /// Human readable reason for the failure, `None` on success.
    pub error_description: Option<String>,
}

/// Data returned by a query telecommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneState<T> {
    pub state: T,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl TcResponse {
    /// A successful completion.
    pub fn ok() -> Self {
        TcResponse::Completed(CommandCompleted {
            completed: true,
            error_description: None,
        })
    }

    /// A failed completion carrying the description of the error.
    pub fn error<E: std::fmt::Display>(e: E) -> Self {
        TcResponse::Completed(CommandCompleted {
            completed: false,
            error_description: Some(e.to_string()),
        })
    }

    /// A state response, or an error response if the state cannot be serialised.
    pub fn state<T: Serialize>(state: T) -> Self {
        match serde_json::to_value(state) {
            Ok(v) => TcResponse::State(DroneState { state: v }),
            Err(e) => Self::error(format!("Cannot serialise the state: {}", e)),
        }
    }

    /// True unless this is a failed completion.
    pub fn is_ok(&self) -> bool {
        match self {
            TcResponse::Completed(c) => c.completed,
            TcResponse::State(_) => true,
        }
    }

    /// The error description of a failed completion.
    pub fn error_description(&self) -> Option<&str> {
        match self {
            TcResponse::Completed(c) => c.error_description.as_deref(),
            TcResponse::State(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let tc = Tc::from_json(
            r#"{"type": "MOVE", "payload": {"direction": "forward", "magnitude": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(
            tc,
            Tc::Move {
                direction: Direction::Forward,
                magnitude: 2.0
            }
        );

        assert_eq!(Tc::from_json(r#"{"type": "TAKEOFF"}"#).unwrap(), Tc::Takeoff);
        assert_eq!(
            Tc::from_json(r#"{"type": "START_IMU_COLLECTION", "payload": {"interval_ms": null}}"#)
                .unwrap(),
            Tc::StartImuCollection { interval_ms: None }
        );
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(Tc::from_json("not json").is_err());
        assert!(Tc::from_json(r#"{"type": "HOVER"}"#).is_err());
        assert!(Tc::from_json(r#"{"type": "SET_PROFILE", "payload": {"profile": "SINE"}}"#)
            .is_err());
        assert!(Tc::from_json(
            r#"{"type": "MOVE", "payload": {"direction": "UP", "magnitude": "far"}}"#
        )
        .is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let tc = Tc::SetVelocity {
            x: 1.0,
            y: -0.5,
            z: 0.0,
            yaw_rate: 15.0,
        };
        assert_eq!(Tc::from_json(&tc.to_json().unwrap()).unwrap(), tc);
    }

    #[test]
    fn test_from_cli_args() {
        let tc = Tc::from_iter_safe(&["tc", "move", "counter_clockwise", "90"]).unwrap();
        assert_eq!(
            tc,
            Tc::Move {
                direction: Direction::CounterClockwise,
                magnitude: 90.0
            }
        );

        let tc = Tc::from_iter_safe(&["tc", "velocity", "0.5", "-0.2", "0", "-10"]).unwrap();
        assert_eq!(
            tc,
            Tc::SetVelocity {
                x: 0.5,
                y: -0.2,
                z: 0.0,
                yaw_rate: -10.0
            }
        );

        assert!(Tc::from_iter_safe(&["tc", "set-profile", "sine"]).is_err());
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(
            serde_json::to_value(TcResponse::ok()).unwrap(),
            json!({"completed": true, "errorDescription": null})
        );
        assert_eq!(
            serde_json::to_value(TcResponse::error("Non-Positive Float not allowed")).unwrap(),
            json!({"completed": false, "errorDescription": "Non-Positive Float not allowed"})
        );
        assert_eq!(
            serde_json::to_value(TcResponse::state(ControlMode::Velocity)).unwrap(),
            json!({"state": "VELOCITY"})
        );

        let resp: TcResponse = serde_json::from_str(r#"{"state": 0.5}"#).unwrap();
        assert!(resp.is_ok());
        let resp: TcResponse =
            serde_json::from_str(r#"{"completed": false, "errorDescription": "nope"}"#).unwrap();
        assert_eq!(resp.error_description(), Some("nope"));
    }
}
