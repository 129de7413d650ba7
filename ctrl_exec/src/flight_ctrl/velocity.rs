//! Velocity control session

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use std::sync::Arc;
use std::time::Duration;

use super::FlightCtrlError;
use crate::{
    dispatch::{CommandStream, DispatchReport},
    fc::{FlightCommand, FlightController},
    vstick::VirtualStick,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An active velocity stream, with the virtual stick held for its whole lifetime.
///
/// The stream starts from a zero command.
pub struct VelocitySession {
    stream: CommandStream,
    vstick: VirtualStick,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VelocitySession {
    pub fn start(
        fc: Arc<dyn FlightController>,
        interval: Duration,
    ) -> Result<Self, FlightCtrlError> {
        let vstick = VirtualStick::acquire(fc.clone())?;

        // The virtual stick is released by its drop if the stream can't start
        let stream = CommandStream::start(fc, FlightCommand::default(), interval)
            .map_err(|e| FlightCtrlError::ThreadSpawn("velocity stream", e))?;

        info!("Velocity control started");

        Ok(Self { stream, vstick })
    }

    pub fn set_command(&self, cmd: FlightCommand) {
        self.stream.set_command(cmd);
    }

    pub fn command(&self) -> FlightCommand {
        self.stream.command()
    }

    /// Stop streaming, then release the virtual stick.
    pub fn stop(self) -> Result<DispatchReport, FlightCtrlError> {
        let report = self.stream.stop();
        self.vstick.release()?;

        info!(
            "Velocity control stopped, {} commands sent ({} refused)",
            report.sent + report.failed,
            report.failed
        );

        Ok(report)
    }
}
