//! # Control library.
//!
//! This library allows other crates in the workspace to access items defined inside the control
//! server crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command dispatch - sends velocity commands to the vehicle at a fixed cadence
pub mod dispatch;

/// Flight controller - the vehicle's actuation and state channel, real or simulated
pub mod fc;

/// Flight control module - control mode, motion configuration and every ground operation
pub mod flight_ctrl;

/// Motion planning - turns directional moves into sampled velocity plans
pub mod motion;

/// Telecommand processor - executes TCs against the flight control state
pub mod tc_processor;

/// Telecommand server - recieves telecommands from ground clients
pub mod tc_server;

/// Virtual stick session - hands actuation to the server and back
pub mod vstick;
