//! Motion limits

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::{Direction, LimitKind};
use serde::{Deserialize, Serialize};

use super::MotionError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic limits applied to every directional move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionLimits {
    /// Units: meters/second
    pub speed: f64,

    /// Units: degrees/second
    pub angular_speed: f64,

    /// Units: meters/second^2
    pub acceleration: f64,

    /// Units: degrees/second^2
    pub angular_acceleration: f64,

    /// Units: meters/second^3
    pub jerk: f64,

    /// Units: degrees/second^3
    pub angular_jerk: f64,
}

/// The limits which apply along a single axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub speed: f64,
    pub acceleration: f64,
    pub jerk: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionLimits {
    fn default() -> Self {
        Self {
            speed: 0.2,
            angular_speed: 30.0,
            acceleration: 0.1,
            angular_acceleration: 15.0,
            jerk: 0.2,
            angular_jerk: 30.0,
        }
    }
}

impl MotionLimits {
    pub fn get(&self, kind: LimitKind) -> f64 {
        match kind {
            LimitKind::Speed => self.speed,
            LimitKind::AngularSpeed => self.angular_speed,
            LimitKind::Acceleration => self.acceleration,
            LimitKind::AngularAcceleration => self.angular_acceleration,
            LimitKind::Jerk => self.jerk,
            LimitKind::AngularJerk => self.angular_jerk,
        }
    }

    /// Set one limit. The value must be a finite positive number, otherwise the limits are left
    /// unchanged.
    pub fn set(&mut self, kind: LimitKind, value: f64) -> Result<(), MotionError> {
        check_positive(kind.as_str(), value)?;

        let limit = match kind {
            LimitKind::Speed => &mut self.speed,
            LimitKind::AngularSpeed => &mut self.angular_speed,
            LimitKind::Acceleration => &mut self.acceleration,
            LimitKind::AngularAcceleration => &mut self.angular_acceleration,
            LimitKind::Jerk => &mut self.jerk,
            LimitKind::AngularJerk => &mut self.angular_jerk,
        };
        *limit = value;

        Ok(())
    }

    /// Check every limit is a finite positive number.
    pub fn validate(&self) -> Result<(), MotionError> {
        for kind in LimitKind::ALL {
            check_positive(kind.as_str(), self.get(*kind))?;
        }
        Ok(())
    }

    /// Limits for a move in the given direction.
    ///
    /// Rotations use the angular limits, every other direction (vertical included) uses the
    /// linear limits.
    pub fn for_direction(&self, direction: Direction) -> AxisLimits {
        if direction.is_angular() {
            AxisLimits {
                speed: self.angular_speed,
                acceleration: self.angular_acceleration,
                jerk: self.angular_jerk,
            }
        } else {
            AxisLimits {
                speed: self.speed,
                acceleration: self.acceleration,
                jerk: self.jerk,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Ensure `value` is finite and strictly positive.
pub fn check_positive(name: &'static str, value: f64) -> Result<f64, MotionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MotionError::NonPositive(name, value))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_limit() {
        let mut limits = MotionLimits::default();

        limits.set(LimitKind::Speed, 0.5).unwrap();
        assert_eq!(limits.get(LimitKind::Speed), 0.5);

        limits.set(LimitKind::AngularJerk, 45.0).unwrap();
        assert_eq!(limits.angular_jerk, 45.0);

        for bad in &[0.0, -1.0, std::f64::NAN, std::f64::INFINITY] {
            assert!(limits.set(LimitKind::Acceleration, *bad).is_err());
        }
        assert_eq!(limits.acceleration, MotionLimits::default().acceleration);
    }

    #[test]
    fn test_validate() {
        assert!(MotionLimits::default().validate().is_ok());
        assert!(MotionLimits {
            jerk: 0.0,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_for_direction() {
        let limits = MotionLimits::default();

        assert_eq!(limits.for_direction(Direction::Clockwise).speed, 30.0);
        assert_eq!(limits.for_direction(Direction::CounterClockwise).jerk, 30.0);
        assert_eq!(limits.for_direction(Direction::Up).speed, 0.2);
        assert_eq!(limits.for_direction(Direction::Left).acceleration, 0.1);
    }
}
