//! Constant velocity profile

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{AxisLimits, VelocityProfile};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Full speed from the first to the last sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantProfile {
    speed: f64,
    duration: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ConstantProfile {
    pub fn new(magnitude: f64, limits: &AxisLimits) -> Self {
        Self {
            speed: limits.speed,
            duration: magnitude / limits.speed,
        }
    }
}

impl VelocityProfile for ConstantProfile {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn velocity(&self, t: f64) -> f64 {
        if t >= 0.0 && t < self.duration {
            self.speed
        } else {
            0.0
        }
    }

    fn peak_velocity(&self) -> f64 {
        self.speed
    }
}
