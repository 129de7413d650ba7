//! # Motion planning module
//!
//! Turns a directional move (a distance or an angle in a given direction) into the sequence of
//! velocity commands which executes it. The scalar speed along the move follows one of three
//! profiles:
//!
//! - `CONSTANT`: full speed for the whole move,
//! - `TRAPEZOIDAL`: constant acceleration up to the peak speed, cruise, constant deceleration,
//! - `S_CURVE`: as trapezoidal but with the acceleration itself ramped at the jerk limit.
//!
//! The profile is sampled every dispatch interval starting at zero, and the plan is always
//! terminated by a zero command so the vehicle is left stationary.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_constant;
mod calc_s_curve;
mod calc_trapezoidal;
mod limits;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    eqpt::fc::FlightCommand,
    tc::{Direction, VelocityProfileKind},
};
use log::debug;
use util::maths::num_samples;

pub use calc_constant::ConstantProfile;
pub use calc_s_curve::SCurveProfile;
pub use calc_trapezoidal::TrapezoidalProfile;
pub use limits::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A scalar speed profile along a single axis, starting at `t = 0`.
pub trait VelocityProfile {
    /// Total duration of the move.
    fn duration(&self) -> f64;

    /// Speed at time `t`. Zero outside of `[0, duration]`.
    fn velocity(&self, t: f64) -> f64;

    /// Highest speed reached during the move.
    fn peak_velocity(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sampled directional move.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlan {
    /// The commands to send, one per dispatch interval, ending with a zero command.
    pub commands: Vec<FlightCommand>,

    /// Duration of the underlying profile.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Highest speed commanded during the move.
    pub peak_velocity: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors produced while planning a move.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    #[error("Non-Positive Float not allowed ({0} = {1})")]
    NonPositive(&'static str, f64),

    #[error("A {duration_s:.1} s move needs more than the {max_samples} commands a plan may hold")]
    TooLong { duration_s: f64, max_samples: usize },
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the profile of the given kind for a move of `magnitude` under `limits`.
pub fn build_profile(
    kind: VelocityProfileKind,
    magnitude: f64,
    limits: &AxisLimits,
) -> Box<dyn VelocityProfile> {
    match kind {
        VelocityProfileKind::Constant => Box::new(ConstantProfile::new(magnitude, limits)),
        VelocityProfileKind::Trapezoidal => Box::new(TrapezoidalProfile::new(magnitude, limits)),
        VelocityProfileKind::SCurve => Box::new(SCurveProfile::new(magnitude, limits)),
    }
}

/// Plan a directional move.
///
/// `magnitude` is a distance in meters, or an angle in degrees for rotations, and `dt_s` is the
/// dispatch interval. A move needing more than `max_samples` commands is rejected before any of
/// them are built.
pub fn plan(
    kind: VelocityProfileKind,
    direction: Direction,
    magnitude: f64,
    limits: &MotionLimits,
    dt_s: f64,
    max_samples: usize,
) -> Result<MotionPlan, MotionError> {
    check_positive("magnitude", magnitude)?;
    check_positive("dispatch interval", dt_s)?;
    limits.validate()?;

    let profile = build_profile(kind, magnitude, &limits.for_direction(direction));

    let axis = direction.axis();
    let sign = direction.sign();

    let n = match num_samples(0.0, profile.duration(), dt_s) {
        Some(n) if n <= max_samples => n,
        _ => {
            return Err(MotionError::TooLong {
                duration_s: profile.duration(),
                max_samples,
            })
        }
    };

    let mut commands: Vec<FlightCommand> = (0..n)
        .map(|i| FlightCommand::along(axis, sign * profile.velocity(i as f64 * dt_s)))
        .collect();
    commands.push(FlightCommand::default());

    debug!(
        "Planned {} {} {} move: {} commands over {:.3} s, peak {:.3}",
        kind,
        direction,
        magnitude,
        commands.len(),
        profile.duration(),
        profile.peak_velocity()
    );

    Ok(MotionPlan {
        commands,
        duration_s: profile.duration(),
        peak_velocity: profile.peak_velocity(),
    })
}
