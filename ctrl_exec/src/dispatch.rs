//! # Command dispatch
//!
//! Delivers velocity commands to the flight controller at a fixed cadence, either by playing a
//! precomputed plan ([`dispatch_plan`]) or by repeatedly sending a live, mutable command from a
//! background thread ([`CommandStream`]).
//!
//! Neither path retries or aborts on a failed send: each tick is independent and failures are
//! only counted and logged.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::fc::{FlightCommand, FlightController};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Number of commands sent, and refused, by a dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// A live command resent to the flight controller every interval from a dedicated thread.
///
/// The first send happens one interval after the stream starts. The stream stops when
/// [`CommandStream::stop`] is called or it is dropped, after which at most one more command may
/// still be in flight.
pub struct CommandStream {
    active: Arc<AtomicBool>,
    command: Arc<Mutex<FlightCommand>>,
    join_handle: Option<JoinHandle<DispatchReport>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DispatchReport {
    fn record<E: std::fmt::Display>(&mut self, result: Result<(), E>, cmd: &FlightCommand) {
        match result {
            Ok(()) => self.sent += 1,
            Err(e) => {
                self.failed += 1;
                debug!("Flight command {:?} failed: {}", cmd, e);
            }
        }
    }
}

impl CommandStream {
    /// Start streaming `initial` every `interval`.
    pub fn start(
        fc: Arc<dyn FlightController>,
        initial: FlightCommand,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let command = Arc::new(Mutex::new(initial));

        let active_clone = active.clone();
        let command_clone = command.clone();
        let join_handle = thread::Builder::new()
            .name("command_stream".into())
            .spawn(move || stream_loop(fc, active_clone, command_clone, interval))?;

        Ok(Self {
            active,
            command,
            join_handle: Some(join_handle),
        })
    }

    /// Replace the streamed command, it will be sent from the next tick on.
    pub fn set_command(&self, cmd: FlightCommand) {
        *self.command.lock().unwrap_or_else(PoisonError::into_inner) = cmd;
    }

    /// The command currently being streamed.
    pub fn command(&self) -> FlightCommand {
        *self.command.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop the stream and wait for the dispatch thread to exit.
    pub fn stop(mut self) -> DispatchReport {
        self.halt()
    }

    fn halt(&mut self) -> DispatchReport {
        self.active.store(false, Ordering::SeqCst);

        match self.join_handle.take().map(|jh| jh.join()) {
            Some(Ok(report)) => report,
            Some(Err(_)) => {
                warn!("Command stream thread panicked");
                DispatchReport::default()
            }
            None => DispatchReport::default(),
        }
    }
}

impl Drop for CommandStream {
    fn drop(&mut self) {
        self.halt();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Send every command of a plan in order, waiting `interval` after each one.
///
/// Blocks for the whole plan. The wait is not shortened by the time a send takes.
pub fn dispatch_plan(
    fc: &dyn FlightController,
    commands: &[FlightCommand],
    interval: Duration,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for cmd in commands {
        report.record(fc.send_command(cmd), cmd);
        thread::sleep(interval);
    }

    if report.failed > 0 {
        warn!(
            "{} of {} flight commands were refused",
            report.failed,
            commands.len()
        );
    }

    report
}

fn stream_loop(
    fc: Arc<dyn FlightController>,
    active: Arc<AtomicBool>,
    command: Arc<Mutex<FlightCommand>>,
    interval: Duration,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    loop {
        thread::sleep(interval);

        if !active.load(Ordering::SeqCst) {
            break;
        }

        let cmd = *command.lock().unwrap_or_else(PoisonError::into_inner);
        trace!("Streaming {:?}", cmd);

        report.record(fc.send_command(&cmd), &cmd);
    }

    debug!(
        "Command stream stopped after {} commands ({} refused)",
        report.sent + report.failed,
        report.failed
    );

    report
}
