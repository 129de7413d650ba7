//! # Telecommand processor module
//!
//! Executes telecommands against the flight control state and builds the response to send back to
//! the client.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;

// Internal
use crate::flight_ctrl::{FlightCtrl, FlightCtrlError};
use comms_if::tc::{Tc, TcResponse, VelocityCommand};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Blocks until the operation has completed, so a `MOVE` is only answered once the move has been
/// flown.
pub fn exec(ctrl: &FlightCtrl, tc: Tc) -> TcResponse {
    debug!("Executing {:?}", tc);

    let response = match tc {
        Tc::Takeoff => completed(ctrl.take_off()),
        Tc::Land => completed(ctrl.land()),
        Tc::ConfirmLanding => completed(ctrl.confirm_landing()),
        Tc::Reboot => completed(ctrl.reboot()),

        Tc::GetLandingProtection => state(ctrl.landing_protection()),
        Tc::EnableLandingProtection => completed(ctrl.set_landing_protection(true)),
        Tc::DisableLandingProtection => completed(ctrl.set_landing_protection(false)),

        Tc::SetLimit { limit, value } => completed(ctrl.set_limit(limit, value)),
        Tc::GetLimit { limit } => state(ctrl.limit(limit)),
        Tc::SetProfile { profile } => completed(ctrl.set_profile(profile)),
        Tc::GetProfile => state(ctrl.profile()),
        Tc::SetMode { mode } => completed(ctrl.set_mode(mode)),
        Tc::GetMode => state(ctrl.mode()),

        Tc::Move {
            direction,
            magnitude,
        } => completed(ctrl.directional_move(direction, magnitude)),

        Tc::StartVelocity => completed(ctrl.start_velocity_control()),
        Tc::SetVelocity { x, y, z, yaw_rate } => {
            completed(ctrl.set_velocity_command(VelocityCommand { x, y, z, yaw_rate }))
        }
        Tc::GetVelocity => state(ctrl.velocity_command()),
        Tc::StopVelocity => completed(ctrl.stop_velocity_control()),

        Tc::IsVirtualStickAvailable => state(ctrl.virtual_stick_available()),
        Tc::GetHeading => state(ctrl.heading()),
        Tc::GetAltitude => state(ctrl.altitude()),

        Tc::StartImuCollection { interval_ms } => completed(ctrl.start_imu_collection(interval_ms)),
        Tc::StopImuCollection => completed(ctrl.stop_imu_collection()),
        Tc::GetCurrentImuState => state(ctrl.current_imu_state()),
        Tc::GetCollectedImuStates => state(ctrl.collected_imu_states()),
        Tc::ClearCollectedImuStates => completed(ctrl.clear_collected_imu_states()),
    };

    if let Some(e) = response.error_description() {
        warn!("TC failed: {}", e);
    }

    response
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn completed<T>(result: Result<T, FlightCtrlError>) -> TcResponse {
    match result {
        Ok(_) => TcResponse::ok(),
        Err(e) => TcResponse::error(e),
    }
}

fn state<T: Serialize>(result: Result<T, FlightCtrlError>) -> TcResponse {
    match result {
        Ok(s) => TcResponse::state(s),
        Err(e) => TcResponse::error(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        fc::sim::{SimFc, SimParams},
        flight_ctrl::Params,
    };
    use comms_if::tc::{ControlMode, LimitKind};
    use serde_json::json;
    use std::sync::Arc;

    fn ctrl() -> FlightCtrl {
        let fc = Arc::new(SimFc::new(SimParams::default()));
        let params = Params {
            dispatch_interval_ms: 1,
            ..Default::default()
        };
        FlightCtrl::new(fc, params).unwrap()
    }

    fn to_json(r: &TcResponse) -> serde_json::Value {
        serde_json::to_value(r).unwrap()
    }

    #[test]
    fn test_completed_and_state() {
        let ctrl = ctrl();

        let r = exec(
            &ctrl,
            Tc::SetLimit {
                limit: LimitKind::Speed,
                value: 0.5,
            },
        );
        assert_eq!(
            to_json(&r),
            json!({"completed": true, "errorDescription": null})
        );

        let r = exec(
            &ctrl,
            Tc::GetLimit {
                limit: LimitKind::Speed,
            },
        );
        assert_eq!(to_json(&r), json!({"state": 0.5}));

        let r = exec(&ctrl, Tc::GetMode);
        assert_eq!(to_json(&r), json!({"state": "POSITION"}));
    }

    #[test]
    fn test_errors_become_descriptions() {
        let ctrl = ctrl();

        let r = exec(
            &ctrl,
            Tc::SetLimit {
                limit: LimitKind::Speed,
                value: -1.0,
            },
        );
        assert!(!r.is_ok());
        assert!(r
            .error_description()
            .unwrap()
            .contains("Non-Positive Float not allowed"));

        let r = exec(&ctrl, Tc::StartVelocity);
        assert_eq!(
            r.error_description(),
            Some("Cannot execute a VELOCITY command while in POSITION mode")
        );
    }

    #[test]
    fn test_velocity_session() {
        let ctrl = ctrl();

        assert!(exec(&ctrl, Tc::SetMode { mode: ControlMode::Velocity }).is_ok());
        assert!(exec(&ctrl, Tc::StartVelocity).is_ok());
        assert!(exec(
            &ctrl,
            Tc::SetVelocity {
                x: 0.1,
                y: 0.0,
                z: 0.0,
                yaw_rate: -10.0
            }
        )
        .is_ok());

        let r = exec(&ctrl, Tc::GetVelocity);
        assert_eq!(
            to_json(&r),
            json!({"state": {"x": 0.1, "y": 0.0, "z": 0.0, "yawRate": -10.0}})
        );

        assert!(exec(&ctrl, Tc::StopVelocity).is_ok());
        assert!(!exec(&ctrl, Tc::StopVelocity).is_ok());
    }

    #[test]
    fn test_move() {
        let ctrl = ctrl();

        let r = exec(
            &ctrl,
            Tc::from_json(r#"{"type": "MOVE", "payload": {"direction": "UP", "magnitude": 0.1}}"#)
                .unwrap(),
        );
        assert!(r.is_ok());
    }
}
