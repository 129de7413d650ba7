//! Parameters structure for FlightCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::VelocityProfileKind;
use serde::Deserialize;
use std::time::Duration;

use super::FlightCtrlError;
use crate::motion::MotionLimits;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for flight control, loaded from `flight_ctrl.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Period between two commands sent to the vehicle, both for directional moves and for the
    /// velocity stream.
    ///
    /// Units: milliseconds
    pub dispatch_interval_ms: u64,

    /// Profile used until a client selects another one.
    pub default_profile: VelocityProfileKind,

    /// Limits used until a client changes them.
    pub limits: MotionLimits,

    /// IMU sampling period used when a client does not give one.
    ///
    /// Units: milliseconds
    pub imu_interval_ms: u64,

    /// Most commands a single directional move may be planned into. Longer moves are rejected.
    pub max_plan_samples: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            dispatch_interval_ms: 40,
            default_profile: VelocityProfileKind::Constant,
            limits: MotionLimits::default(),
            imu_interval_ms: 1000,
            max_plan_samples: 15_000,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), FlightCtrlError> {
        if self.dispatch_interval_ms == 0 {
            return Err(FlightCtrlError::Validation(
                "The dispatch interval must be a positive integer".into(),
            ));
        }
        if self.imu_interval_ms == 0 {
            return Err(FlightCtrlError::Validation(
                "The IMU interval must be a positive integer".into(),
            ));
        }
        if self.max_plan_samples == 0 {
            return Err(FlightCtrlError::Validation(
                "The plan sample limit must be a positive integer".into(),
            ));
        }
        self.limits.validate()?;

        Ok(())
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    /// The dispatch interval in seconds, the sampling step of every profile.
    pub fn dispatch_interval_s(&self) -> f64 {
        self.dispatch_interval_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::params::from_toml_str;

    #[test]
    fn test_load() {
        let params: Params = from_toml_str(
            r#"
            dispatch_interval_ms = 20
            default_profile = "S_CURVE"

            [limits]
            speed = 0.5
            angular_speed = 45.0
            acceleration = 0.2
            angular_acceleration = 20.0
            jerk = 0.4
            angular_jerk = 40.0
            "#,
        )
        .unwrap();

        assert_eq!(params.dispatch_interval_ms, 20);
        assert_eq!(params.default_profile, VelocityProfileKind::SCurve);
        assert_eq!(params.limits.speed, 0.5);
        assert_eq!(params.imu_interval_ms, 1000);
        assert_eq!(params.max_plan_samples, 15_000);
        assert!(params.validate().is_ok());
        assert!((params.dispatch_interval_s() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(Params::default().validate().is_ok());

        let mut params = Params::default();
        params.dispatch_interval_ms = 0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.limits.angular_speed = -1.0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.max_plan_samples = 0;
        assert!(params.validate().is_err());
    }
}
