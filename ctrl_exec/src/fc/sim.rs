//! # Simulated flight controller
//!
//! A simple in-process vehicle. Velocity commands are reflected straight into the reported IMU
//! state and the yaw rate is integrated into the heading. When enabled, every actuation related
//! call is also appended to an event log so that the order of operations can be inspected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use super::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated vehicle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Whether the vehicle reports a compass heading.
    pub has_compass: bool,

    /// Whether the ultrasonic height sensor is in use.
    pub ultrasonic_in_use: bool,

    /// Height reported by the ultrasonic sensor while flying.
    ///
    /// Units: meters
    pub hover_height_m: f64,

    /// Time taken to acknowledge a command.
    ///
    /// Units: milliseconds
    pub command_latency_ms: u64,

    /// Keep a log of every accepted actuation call. The log is never trimmed, so this is only for
    /// short lived vehicles such as those in tests.
    pub record_events: bool,
}

/// An in-process simulated flight controller.
pub struct SimFc {
    params: SimParams,
    state: Mutex<SimState>,
}

struct SimState {
    connected: bool,
    vstick_enabled: bool,
    axis_config: AxisControlConfig,
    landing_protection: bool,
    flying: bool,
    awaiting_landing_confirmation: bool,
    last_command: FlightCommand,
    last_command_time: Option<Instant>,
    heading_deg: f64,
    faults: SimFaults,
    events: Option<Vec<SimEvent>>,
}

/// Faults which can be injected into the simulated vehicle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimFaults {
    /// Refuse to enable the virtual stick.
    pub reject_virtual_stick: bool,

    /// Refuse every velocity command.
    pub reject_commands: bool,

    /// Refuse to change the axis control configuration.
    pub reject_axis_config: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An actuation related call accepted by the simulated vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    AxisConfig(AxisControlConfig),
    VirtualStick(bool),
    Command(FlightCommand),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            has_compass: true,
            ultrasonic_in_use: true,
            hover_height_m: 1.2,
            command_latency_ms: 0,
            record_events: false,
        }
    }
}

impl SimFc {
    pub fn new(params: SimParams) -> Self {
        let events = if params.record_events {
            Some(Vec::new())
        } else {
            None
        };

        Self {
            params,
            state: Mutex::new(SimState {
                connected: true,
                vstick_enabled: false,
                axis_config: AxisControlConfig::default(),
                landing_protection: true,
                flying: false,
                awaiting_landing_confirmation: false,
                last_command: FlightCommand::default(),
                last_command_time: None,
                heading_deg: 0.0,
                faults: SimFaults::default(),
                events,
            }),
        }
    }

    /// Connect or disconnect the vehicle.
    pub fn set_connected(&self, connected: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.connected = connected;
        }
    }

    pub fn set_faults(&self, faults: SimFaults) {
        if let Ok(mut s) = self.state.lock() {
            s.faults = faults;
        }
    }

    /// All events recorded so far, always empty unless `record_events` is set.
    pub fn events(&self) -> Vec<SimEvent> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.events.clone())
            .unwrap_or_default()
    }

    /// All velocity commands accepted so far, in order.
    pub fn commands(&self) -> Vec<FlightCommand> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::Command(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        if let Ok(mut s) = self.state.lock() {
            if let Some(events) = s.events.as_mut() {
                events.clear();
            }
        }
    }

    pub fn virtual_stick_enabled(&self) -> bool {
        self.state.lock().map(|s| s.vstick_enabled).unwrap_or(false)
    }

    /// Lock the state of a connected vehicle.
    fn connected_state(&self) -> Result<MutexGuard<SimState>, FcError> {
        let state = self
            .state
            .lock()
            .map_err(|_| FcError::Comms("simulator state poisoned".into()))?;

        if state.connected {
            Ok(state)
        } else {
            Err(FcError::NotConnected)
        }
    }
}

impl SimState {
    fn record(&mut self, event: SimEvent) {
        if let Some(events) = self.events.as_mut() {
            events.push(event);
        }
    }

    /// Integrate the yaw rate of the previous command up to now.
    fn integrate_heading(&mut self, now: Instant) {
        if let Some(t) = self.last_command_time {
            let dt = now.duration_since(t).as_secs_f64();
            self.heading_deg = (self.heading_deg + self.last_command.yaw_rate * dt).rem_euclid(360.0);
        }
    }

    fn reset_motion(&mut self) {
        self.integrate_heading(Instant::now());
        self.last_command = FlightCommand::default();
        self.last_command_time = None;
    }
}

impl FlightController for SimFc {
    fn send_command(&self, cmd: &FlightCommand) -> Result<(), FcError> {
        if self.params.command_latency_ms > 0 {
            thread::sleep(Duration::from_millis(self.params.command_latency_ms));
        }

        let mut state = self.connected_state()?;

        if !state.vstick_enabled {
            return Err(FcError::Rejected("Virtual stick is not enabled".into()));
        }
        if state.faults.reject_commands {
            return Err(FcError::Rejected("Command rejected by the vehicle".into()));
        }

        let now = Instant::now();
        state.integrate_heading(now);
        state.last_command = *cmd;
        state.last_command_time = Some(now);
        state.record(SimEvent::Command(*cmd));

        trace!("Sim command: {:?}", cmd);

        Ok(())
    }

    fn set_virtual_stick(&self, enabled: bool) -> Result<(), FcError> {
        let mut state = self.connected_state()?;

        if enabled && state.faults.reject_virtual_stick {
            return Err(FcError::Rejected("Virtual stick is not available".into()));
        }

        if !enabled {
            state.reset_motion();
        }
        state.vstick_enabled = enabled;
        state.record(SimEvent::VirtualStick(enabled));

        debug!("Sim virtual stick enabled: {}", enabled);

        Ok(())
    }

    fn virtual_stick_available(&self) -> Result<bool, FcError> {
        let state = self.connected_state()?;
        Ok(!state.faults.reject_virtual_stick)
    }

    fn axis_config(&self) -> Result<AxisControlConfig, FcError> {
        Ok(self.connected_state()?.axis_config)
    }

    fn set_axis_config(&self, config: AxisControlConfig) -> Result<(), FcError> {
        let mut state = self.connected_state()?;

        if state.faults.reject_axis_config {
            return Err(FcError::Rejected("Axis control mode rejected".into()));
        }

        state.axis_config = config;
        state.record(SimEvent::AxisConfig(config));

        Ok(())
    }

    fn take_off(&self) -> Result<(), FcError> {
        let mut state = self.connected_state()?;

        if state.flying {
            return Err(FcError::Rejected("The vehicle is already flying".into()));
        }
        state.flying = true;

        debug!("Sim took off");

        Ok(())
    }

    fn land(&self) -> Result<(), FcError> {
        let mut state = self.connected_state()?;

        if !state.flying {
            return Err(FcError::Rejected("The vehicle is not flying".into()));
        }

        // Landing protection pauses the descent just above the ground
        if state.landing_protection {
            state.awaiting_landing_confirmation = true;
        } else {
            state.flying = false;
        }

        Ok(())
    }

    fn confirm_landing(&self) -> Result<(), FcError> {
        let mut state = self.connected_state()?;

        if !state.awaiting_landing_confirmation {
            return Err(FcError::Rejected("No landing is awaiting confirmation".into()));
        }
        state.awaiting_landing_confirmation = false;
        state.flying = false;

        Ok(())
    }

    fn reboot(&self) -> Result<(), FcError> {
        let mut state = self.connected_state()?;

        if state.flying {
            return Err(FcError::Rejected("Cannot reboot while flying".into()));
        }

        state.reset_motion();
        state.vstick_enabled = false;
        state.axis_config = AxisControlConfig::default();

        debug!("Sim rebooted");

        Ok(())
    }

    fn landing_protection(&self) -> Result<bool, FcError> {
        Ok(self.connected_state()?.landing_protection)
    }

    fn set_landing_protection(&self, enabled: bool) -> Result<(), FcError> {
        self.connected_state()?.landing_protection = enabled;
        Ok(())
    }

    fn state(&self) -> Result<FcState, FcError> {
        let mut state = self.connected_state()?;

        let now = Instant::now();
        state.integrate_heading(now);
        if state.last_command_time.is_some() {
            state.last_command_time = Some(now);
        }

        let cmd = state.last_command;
        let heading = state.heading_deg;

        Ok(FcState {
            imu: ImuState {
                velocity_x: cmd.longitudinal,
                velocity_y: cmd.lateral,
                velocity_z: cmd.vertical,
                roll: 0.0,
                pitch: 0.0,
                yaw: if heading > 180.0 { heading - 360.0 } else { heading },
            },
            heading_deg: if self.params.has_compass {
                Some(heading)
            } else {
                None
            },
            ultrasonic_height_m: match (self.params.ultrasonic_in_use, state.flying) {
                (true, true) => Some(self.params.hover_height_m),
                (true, false) => Some(0.0),
                (false, _) => None,
            },
            flying: state.flying,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn recording() -> SimParams {
        SimParams {
            record_events: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_commands_need_virtual_stick() {
        let fc = SimFc::new(recording());
        let cmd = FlightCommand {
            longitudinal: 0.5,
            ..Default::default()
        };

        assert!(fc.send_command(&cmd).is_err());
        fc.set_virtual_stick(true).unwrap();
        fc.send_command(&cmd).unwrap();

        assert_eq!(fc.commands(), vec![cmd]);
        assert_eq!(fc.state().unwrap().imu.velocity_x, 0.5);

        // Disabling the stick stops the vehicle
        fc.set_virtual_stick(false).unwrap();
        assert_eq!(fc.state().unwrap().imu.velocity_x, 0.0);
    }

    #[test]
    fn test_faults() {
        let fc = SimFc::new(recording());
        fc.set_faults(SimFaults {
            reject_virtual_stick: true,
            ..Default::default()
        });

        assert!(matches!(fc.set_virtual_stick(true), Err(FcError::Rejected(_))));
        assert_eq!(fc.virtual_stick_available(), Ok(false));
        assert!(fc.events().is_empty());

        fc.set_connected(false);
        assert_eq!(fc.axis_config(), Err(FcError::NotConnected));
    }

    #[test]
    fn test_landing_protection() {
        let fc = SimFc::new(recording());

        assert!(fc.land().is_err());
        fc.take_off().unwrap();
        assert!(fc.take_off().is_err());
        assert!(fc.reboot().is_err());

        // Protected landing waits for confirmation
        assert_eq!(fc.landing_protection(), Ok(true));
        fc.land().unwrap();
        assert!(fc.state().unwrap().flying);
        fc.confirm_landing().unwrap();
        assert!(!fc.state().unwrap().flying);

        fc.set_landing_protection(false).unwrap();
        fc.take_off().unwrap();
        fc.land().unwrap();
        assert!(!fc.state().unwrap().flying);
        assert!(fc.confirm_landing().is_err());
    }

    #[test]
    fn test_sensors() {
        let fc = SimFc::new(SimParams {
            has_compass: false,
            ultrasonic_in_use: false,
            ..Default::default()
        });
        let state = fc.state().unwrap();

        assert_eq!(state.heading_deg, None);
        assert_eq!(state.ultrasonic_height_m, None);
    }

    #[test]
    fn test_events_off_by_default() {
        let fc = SimFc::new(SimParams::default());

        fc.set_virtual_stick(true).unwrap();
        for _ in 0..100 {
            fc.send_command(&FlightCommand::default()).unwrap();
        }

        assert!(fc.events().is_empty());
        assert!(fc.state.lock().unwrap().events.is_none());
    }
}
