//! # Flight Controller Equipment Messages
//!
//! Requests sent by the control server to the flight controller, and the responses the flight
//! controller answers with. Each request is acknowledged by exactly one response.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::tc::{Axis, VelocityCommand};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single low-level command sent to the flight controller every dispatch tick.
///
/// Velocities are in meters/second in the body frame, `yaw_rate` in degrees/second.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightCommand {
    /// Rightwards velocity
    pub lateral: f64,

    /// Forwards velocity
    pub longitudinal: f64,

    /// Clockwise yaw rate
    pub yaw_rate: f64,

    /// Upwards velocity
    pub vertical: f64,
}

/// Control law selected on each of the flight controller's axes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisControlConfig {
    pub vertical: VerticalControlMode,
    pub yaw: YawControlMode,
    pub roll_pitch: RollPitchControlMode,
}

/// Inertial state of the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImuState {
    /// Units: meters/second
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,

    /// Units: degrees
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Full state reported by the flight controller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct FcState {
    pub imu: ImuState,

    /// Compass heading in degrees, `None` if the vehicle has no compass.
    pub heading_deg: Option<f64>,

    /// Height measured by the ultrasonic sensor, `None` if the sensor is not in use.
    pub ultrasonic_height_m: Option<f64>,

    pub flying: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerticalControlMode {
    Velocity,
    Position,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YawControlMode {
    Angle,
    AngularVelocity,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollPitchControlMode {
    Angle,
    Velocity,
}

/// Requests sent to the flight controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum FcRequest {
    SendCommand(FlightCommand),
    SetVirtualStick(bool),
    GetVirtualStickAvailable,
    GetAxisConfig,
    SetAxisConfig(AxisControlConfig),
    TakeOff,
    Land,
    ConfirmLanding,
    Reboot,
    GetLandingProtection,
    SetLandingProtection(bool),
    GetState,
}

/// Responses from the flight controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum FcResponse {
    /// The request was executed.
    Ack,

    /// Answer to a boolean query.
    Bool(bool),

    AxisConfig(AxisControlConfig),

    State(FcState),

    /// The vehicle refused the request, with the vehicle's description of why.
    Rejected(String),

    /// No vehicle is connected to the flight controller link.
    NotConnected,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FlightCommand {
    /// A command with a single non-zero axis.
    pub fn along(axis: Axis, value: f64) -> Self {
        let mut cmd = Self::default();
        *cmd.axis_mut(axis) = value;
        cmd
    }

    /// The value commanded on the given axis.
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Lateral => self.lateral,
            Axis::Longitudinal => self.longitudinal,
            Axis::Vertical => self.vertical,
            Axis::Yaw => self.yaw_rate,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::Lateral => &mut self.lateral,
            Axis::Longitudinal => &mut self.longitudinal,
            Axis::Vertical => &mut self.vertical,
            Axis::Yaw => &mut self.yaw_rate,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl From<VelocityCommand> for FlightCommand {
    fn from(cmd: VelocityCommand) -> Self {
        Self {
            lateral: cmd.y,
            longitudinal: cmd.x,
            yaw_rate: cmd.yaw_rate,
            vertical: cmd.z,
        }
    }
}

impl From<FlightCommand> for VelocityCommand {
    fn from(cmd: FlightCommand) -> Self {
        Self {
            x: cmd.longitudinal,
            y: cmd.lateral,
            z: cmd.vertical,
            yaw_rate: cmd.yaw_rate,
        }
    }
}

impl AxisControlConfig {
    /// The configuration required while the virtual stick is flying velocity commands.
    pub fn velocity() -> Self {
        Self {
            vertical: VerticalControlMode::Velocity,
            yaw: YawControlMode::AngularVelocity,
            roll_pitch: RollPitchControlMode::Velocity,
        }
    }
}

impl Default for AxisControlConfig {
    /// The configuration of a freshly booted flight controller.
    fn default() -> Self {
        Self {
            vertical: VerticalControlMode::Velocity,
            yaw: YawControlMode::Angle,
            roll_pitch: RollPitchControlMode::Angle,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_velocity_command_mapping() {
        let vel = VelocityCommand {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw_rate: 4.0,
        };
        let cmd = FlightCommand::from(vel);

        assert_eq!(cmd.longitudinal, 1.0);
        assert_eq!(cmd.lateral, 2.0);
        assert_eq!(cmd.vertical, 3.0);
        assert_eq!(cmd.yaw_rate, 4.0);
        assert_eq!(VelocityCommand::from(cmd), vel);
    }

    #[test]
    fn test_along() {
        let cmd = FlightCommand::along(Axis::Vertical, -0.3);
        assert_eq!(cmd.axis(Axis::Vertical), -0.3);
        assert_eq!(cmd.axis(Axis::Lateral), 0.0);
        assert!(!cmd.is_zero());
        assert!(FlightCommand::default().is_zero());
    }

    #[test]
    fn test_request_json() {
        let req = FcRequest::SetAxisConfig(AxisControlConfig::velocity());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(serde_json::from_str::<FcRequest>(&json).unwrap(), req);
        assert!(json.contains("ANGULAR_VELOCITY"));
    }
}
