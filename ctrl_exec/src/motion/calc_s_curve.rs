//! S-curve velocity profile calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{AxisLimits, VelocityProfile};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Seven phase jerk limited profile.
///
/// 1. jerk up to the peak acceleration,
/// 2. constant acceleration,
/// 3. jerk down to zero acceleration at the peak speed,
/// 4. cruise,
///
/// and phases 5 to 7 mirror 1 to 3 to come back to rest.
///
/// The peak speed is `min(magnitude / 2, speed limit)` and the peak acceleration
/// `min(0.75 * peak speed, acceleration limit)`. Moves which cannot reach these are reshaped so
/// that no phase has a negative duration:
/// - if the peak acceleration cannot be reached before the peak speed it is lowered to
///   `sqrt(peak speed * jerk)`, dropping phases 2 and 6,
/// - if the ramps alone would overshoot the magnitude the peak speed is lowered until they fit,
///   dropping phase 4, and if that speed is too low to reach the peak acceleration the profile
///   becomes pure jerk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SCurveProfile {
    jerk: f64,
    accel: f64,
    peak: f64,

    /// Duration of each of the jerk phases (1, 3, 5, 7).
    t_jerk: f64,

    /// Duration of each of the constant acceleration phases (2, 6).
    t_accel: f64,

    t_cruise: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SCurveProfile {
    pub fn new(magnitude: f64, limits: &AxisLimits) -> Self {
        let jerk = limits.jerk;
        let mut peak = (magnitude / 2.0).min(limits.speed);
        let mut accel = (0.75 * peak).min(limits.acceleration);
        let mut has_accel_phase = true;
        let mut has_cruise_phase = true;

        if accel * accel > peak * jerk {
            accel = (peak * jerk).sqrt();
            has_accel_phase = false;
        }

        // Distance covered by the acceleration and deceleration ramps together
        if peak * (accel / jerk + peak / accel) > magnitude {
            has_cruise_phase = false;

            // Root of peak^2 + (accel^2 / jerk) * peak - magnitude * accel = 0
            let k = accel * accel / jerk;
            peak = (-k + (k * k + 4.0 * magnitude * accel).sqrt()) / 2.0;

            if accel * accel > peak * jerk {
                peak = (magnitude * magnitude * jerk / 4.0).cbrt();
                accel = (peak * jerk).sqrt();
                has_accel_phase = false;
            }
        }

        let t_jerk = accel / jerk;
        let t_accel = if has_accel_phase {
            (peak / accel - accel / jerk).max(0.0)
        } else {
            0.0
        };
        let t_cruise = if has_cruise_phase {
            (magnitude / peak - accel / jerk - peak / accel).max(0.0)
        } else {
            0.0
        };

        Self {
            jerk,
            accel,
            peak,
            t_jerk,
            t_accel,
            t_cruise,
        }
    }

    /// Durations of the seven phases.
    pub fn phase_durations(&self) -> [f64; 7] {
        [
            self.t_jerk,
            self.t_accel,
            self.t_jerk,
            self.t_cruise,
            self.t_jerk,
            self.t_accel,
            self.t_jerk,
        ]
    }

    /// Time at which each phase ends.
    pub fn phase_ends(&self) -> [f64; 7] {
        let mut ends = self.phase_durations();
        for i in 1..ends.len() {
            ends[i] += ends[i - 1];
        }
        ends
    }

    /// The acceleration reached in phase 2.
    pub fn peak_acceleration(&self) -> f64 {
        self.accel
    }
}

impl VelocityProfile for SCurveProfile {
    fn duration(&self) -> f64 {
        4.0 * self.t_jerk + 2.0 * self.t_accel + self.t_cruise
    }

    fn velocity(&self, t: f64) -> f64 {
        let (j, a) = (self.jerk, self.accel);

        // Speed gained over a single jerk phase
        let v_jerk = a * a / (2.0 * j);

        let ends = self.phase_ends();

        let v = if t < 0.0 {
            0.0
        } else if t <= ends[0] {
            j * t * t / 2.0
        } else if t <= ends[1] {
            v_jerk + a * (t - ends[0])
        } else if t <= ends[2] {
            let tc = t - ends[1];
            self.peak - v_jerk + a * tc - j * tc * tc / 2.0
        } else if t <= ends[3] {
            self.peak
        } else if t <= ends[4] {
            let tc = t - ends[3];
            self.peak - j * tc * tc / 2.0
        } else if t <= ends[5] {
            self.peak - v_jerk - a * (t - ends[4])
        } else if t <= ends[6] {
            let tc = t - ends[5];
            v_jerk - a * tc + j * tc * tc / 2.0
        } else {
            0.0
        };

        v.max(0.0)
    }

    fn peak_velocity(&self) -> f64 {
        self.peak
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limits(speed: f64, acceleration: f64, jerk: f64) -> AxisLimits {
        AxisLimits {
            speed,
            acceleration,
            jerk,
        }
    }

    /// Area under the profile by the trapezoid rule.
    fn area(p: &SCurveProfile) -> f64 {
        let steps = 200_000;
        let h = p.duration() / steps as f64;
        (0..steps)
            .map(|i| {
                let t = i as f64 * h;
                (p.velocity(t) + p.velocity(t + h)) * h / 2.0
            })
            .sum()
    }

    /// Check the profile is continuous, starts and ends at rest and respects the acceleration
    /// bound.
    fn check_shape(p: &SCurveProfile, bound: f64) {
        let steps = 100_000;
        let h = p.duration() / steps as f64;

        assert_eq!(p.velocity(0.0), 0.0);
        assert!(p.velocity(p.duration()).abs() < 1e-9);

        let mut prev = 0.0;
        for i in 1..=steps {
            let v = p.velocity(i as f64 * h);
            assert!(v >= 0.0 && v <= bound + 1e-12);
            assert!(
                (v - prev).abs() <= p.peak_acceleration() * h + 1e-9,
                "step at {} s",
                i as f64 * h
            );
            prev = v;
        }
    }

    #[test]
    fn test_phases() {
        let p = SCurveProfile::new(2.0, &limits(0.2, 0.1, 0.2));
        let durations = p.phase_durations();
        let expected = [0.5, 1.5, 0.5, 7.5, 0.5, 1.5, 0.5];

        for (d, e) in durations.iter().zip(expected.iter()) {
            assert!((d - e).abs() < 1e-9, "{:?}", durations);
        }
        assert!((p.duration() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_continuous_at_boundaries() {
        let p = SCurveProfile::new(2.0, &limits(0.2, 0.1, 0.2));
        let eps = 1e-9;

        for end in p.phase_ends().iter() {
            let before = p.velocity(end - eps);
            let after = p.velocity(end + eps);
            assert!((before - after).abs() < 1e-6, "jump at {} s", end);
        }

        check_shape(&p, 0.2);
        assert!((area(&p) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_acceleration_limited_by_jerk() {
        // 0.1 m/s^2 would take longer to reach than the peak speed allows
        let p = SCurveProfile::new(2.0, &limits(0.2, 0.15, 0.05));

        assert!((p.peak_acceleration() - 0.1).abs() < 1e-12);
        assert_eq!(p.phase_durations()[1], 0.0);
        check_shape(&p, 0.2);
        assert!((area(&p) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_move_drops_cruise() {
        let p = SCurveProfile::new(1.0, &limits(0.5, 0.2, 1.0));

        assert_eq!(p.phase_durations()[3], 0.0);
        assert!(p.peak_velocity() < 0.5);
        assert!((p.peak_acceleration() - 0.2).abs() < 1e-12);
        check_shape(&p, 0.5);
        assert!((area(&p) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_move_pure_jerk() {
        let p = SCurveProfile::new(2.0, &limits(1.0, 1.0, 0.5));

        assert_eq!(p.phase_durations()[1], 0.0);
        assert_eq!(p.phase_durations()[3], 0.0);
        assert!((p.peak_velocity() - 0.5f64.cbrt()).abs() < 1e-12);
        check_shape(&p, 1.0);
        assert!((area(&p) - 2.0).abs() < 1e-6);
    }
}
