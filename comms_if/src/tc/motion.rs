//! # Motion vocabulary
//!
//! Enumerations shared by the motion telecommands. All of them travel as upper case text (for
//! example `"COUNTER_CLOCKWISE"`) and are parsed case-insensitively, with `-` accepted in place
//! of `_`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

/// Declare a fieldless enum which is represented on the wire by a fixed text name.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All values in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire name of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let norm = s.trim().to_ascii_uppercase().replace('-', "_");
                $(
                    if norm == $text {
                        return Ok($name::$variant)
                    }
                )+
                Err(ParseEnumError {
                    kind: stringify!($name),
                    value: s.to_string(),
                    expected: &[$($text),+]
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

text_enum! {
    /// The mutually exclusive ways the vehicle can be commanded.
    pub enum ControlMode {
        /// Discrete directional moves executed as precomputed velocity plans.
        Position => "POSITION",

        /// A continuously updated velocity vector streamed to the vehicle.
        Velocity => "VELOCITY",
    }
}

text_enum! {
    /// Shape of the velocity profile used to execute a directional move.
    pub enum VelocityProfileKind {
        Constant => "CONSTANT",
        Trapezoidal => "TRAPEZOIDAL",
        SCurve => "S_CURVE",
    }
}

text_enum! {
    /// Direction of a discrete move, relative to the vehicle body.
    pub enum Direction {
        Forward => "FORWARD",
        Backward => "BACKWARD",
        Left => "LEFT",
        Right => "RIGHT",
        Up => "UP",
        Down => "DOWN",
        Clockwise => "CLOCKWISE",
        CounterClockwise => "COUNTER_CLOCKWISE",
    }
}

text_enum! {
    /// Names one of the configurable motion limits.
    pub enum LimitKind {
        /// Units: meters/second
        Speed => "SPEED",
        /// Units: degrees/second
        AngularSpeed => "ANGULAR_SPEED",
        /// Units: meters/second^2
        Acceleration => "ACCELERATION",
        /// Units: degrees/second^2
        AngularAcceleration => "ANGULAR_ACCELERATION",
        /// Units: meters/second^3
        Jerk => "JERK",
        /// Units: degrees/second^3
        AngularJerk => "ANGULAR_JERK",
    }
}

/// One of the four control axes of a flight command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lateral,
    Longitudinal,
    Vertical,
    Yaw
}

/// Error returned when a text value does not name a variant.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} must be one of {}, found '{value}'", list_options(.expected))]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static [&'static str]
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The velocity vector a client streams while in velocity mode.
///
/// `x` is forwards, `y` is to the right and `z` is upwards, all in meters/second in the body
/// frame. `yaw_rate` is in degrees/second, positive clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityCommand {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw_rate: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::Position
    }
}

impl Default for VelocityProfileKind {
    fn default() -> Self {
        VelocityProfileKind::Constant
    }
}

impl Direction {
    /// The control axis this direction moves along.
    pub fn axis(&self) -> Axis {
        match self {
            Direction::Forward | Direction::Backward => Axis::Longitudinal,
            Direction::Left | Direction::Right => Axis::Lateral,
            Direction::Up | Direction::Down => Axis::Vertical,
            Direction::Clockwise | Direction::CounterClockwise => Axis::Yaw
        }
    }

    /// Sign applied to speeds along the axis.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Forward
            | Direction::Right
            | Direction::Up
            | Direction::Clockwise => 1.0,
            Direction::Backward
            | Direction::Left
            | Direction::Down
            | Direction::CounterClockwise => -1.0
        }
    }

    /// True if the move is a rotation, which uses the angular limits.
    pub fn is_angular(&self) -> bool {
        self.axis() == Axis::Yaw
    }
}

impl VelocityCommand {
    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.yaw_rate.is_finite()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Formats `["A", "B", "C"]` as `'A', 'B' or 'C'`.
fn list_options(options: &[&str]) -> String {
    let quoted: Vec<String> = options.iter().map(|o| format!("'{}'", o)).collect();

    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new()
    }
}
