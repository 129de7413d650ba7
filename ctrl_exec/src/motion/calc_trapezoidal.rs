//! Trapezoidal velocity profile calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{AxisLimits, VelocityProfile};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Constant acceleration to the peak speed, cruise, then constant deceleration.
///
/// The peak speed is `min(magnitude / 2, speed limit)`. If the move is too short to reach it
/// the peak is lowered to `sqrt(acceleration * magnitude)` and the cruise phase is dropped,
/// leaving a triangular profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidalProfile {
    accel: f64,
    peak: f64,

    /// Duration of the acceleration phase, equal to the deceleration phase.
    t_ramp: f64,

    t_cruise: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrapezoidalProfile {
    pub fn new(magnitude: f64, limits: &AxisLimits) -> Self {
        let accel = limits.acceleration;
        let nominal_peak = (magnitude / 2.0).min(limits.speed);

        // Ramps alone would overshoot
        let (peak, t_cruise) = if nominal_peak * nominal_peak > accel * magnitude {
            ((accel * magnitude).sqrt(), 0.0)
        } else {
            (
                nominal_peak,
                (accel * magnitude - nominal_peak * nominal_peak) / (accel * nominal_peak),
            )
        };

        let t_ramp = peak / accel;

        Self {
            accel,
            peak,
            t_ramp,
            t_cruise,
        }
    }

    /// Durations of the acceleration, cruise and deceleration phases.
    pub fn phase_durations(&self) -> [f64; 3] {
        [self.t_ramp, self.t_cruise, self.t_ramp]
    }
}

impl VelocityProfile for TrapezoidalProfile {
    fn duration(&self) -> f64 {
        2.0 * self.t_ramp + self.t_cruise
    }

    fn velocity(&self, t: f64) -> f64 {
        if t < 0.0 {
            0.0
        } else if t <= self.t_ramp {
            self.accel * t
        } else if t <= self.t_ramp + self.t_cruise {
            self.peak
        } else {
            (self.peak - self.accel * (t - self.t_ramp - self.t_cruise)).max(0.0)
        }
    }

    fn peak_velocity(&self) -> f64 {
        self.peak
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limits(speed: f64, acceleration: f64) -> AxisLimits {
        AxisLimits {
            speed,
            acceleration,
            jerk: 1.0,
        }
    }

    #[test]
    fn test_phases() {
        let p = TrapezoidalProfile::new(2.0, &limits(0.2, 0.1));

        assert_eq!(p.peak_velocity(), 0.2);
        let [t1, t2, t3] = p.phase_durations();
        assert!((t1 - 2.0).abs() < 1e-12);
        assert!((t2 - 8.0).abs() < 1e-12);
        assert!((t3 - 2.0).abs() < 1e-12);
        assert!((p.duration() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_continuous_and_bounded() {
        for &(mag, speed, accel) in &[(2.0, 0.2, 0.1), (0.3, 0.2, 0.1), (90.0, 30.0, 15.0)] {
            let p = TrapezoidalProfile::new(mag, &limits(speed, accel));
            let bound = (mag / 2.0).min(speed);
            let steps = 10_000;
            let h = p.duration() / steps as f64;

            let mut prev = p.velocity(0.0);
            assert_eq!(prev, 0.0);
            for i in 1..=steps {
                let v = p.velocity(i as f64 * h);
                assert!(v >= 0.0);
                assert!(v <= bound + 1e-12);
                // A jump would show as a step larger than the acceleration allows
                assert!((v - prev).abs() <= accel * h + 1e-9);
                prev = v;
            }
            assert!(prev.abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_move_is_triangular() {
        // Peak would be min(0.25, 1.0), which needs 0.625 m of ramps
        let p = TrapezoidalProfile::new(0.5, &limits(1.0, 0.1));

        assert!((p.peak_velocity() - 0.05f64.sqrt()).abs() < 1e-12);
        assert_eq!(p.phase_durations()[1], 0.0);

        // Area of the triangle is the magnitude
        let area = p.peak_velocity() * p.duration() / 2.0;
        assert!((area - 0.5).abs() < 1e-12);
    }
}
