//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands sent by the ground to the control server, and their responses
pub mod tc;

/// Command and response definitions for equipment (the flight controller)
pub mod eqpt;

/// Network module
pub mod net;
