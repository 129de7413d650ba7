//! # Virtual stick session
//!
//! Before this server can actuate the vehicle the axis control configuration must be switched to
//! velocity control and the virtual stick enabled. [`VirtualStick`] does both on acquisition, and
//! undoes them on release, putting the configuration back exactly as it was found. Dropping an
//! unreleased session (including on unwind) still disables the stick and restores the
//! configuration.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::sync::Arc;

use crate::fc::{AxisControlConfig, FcError, FlightController};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An active virtual stick session.
pub struct VirtualStick {
    fc: Arc<dyn FlightController>,

    /// Configuration found on acquisition
    snapshot: AxisControlConfig,

    enabled: bool,
    released: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VstickError {
    #[error("Cannot read the axis control configuration: {0}")]
    Snapshot(FcError),

    #[error("Cannot switch to velocity control: {0}")]
    Configure(FcError),

    #[error("Cannot enable the virtual stick: {0}")]
    Enable(FcError),

    #[error("Cannot disable the virtual stick: {0}")]
    Disable(FcError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VirtualStick {
    /// Snapshot the axis configuration, switch every axis to velocity control and enable the
    /// virtual stick.
    ///
    /// If any step fails the configuration is restored before the error is returned.
    pub fn acquire(fc: Arc<dyn FlightController>) -> Result<Self, VstickError> {
        let snapshot = fc.axis_config().map_err(VstickError::Snapshot)?;

        // From here on dropping the guard restores the snapshot
        let mut guard = Self {
            fc,
            snapshot,
            enabled: false,
            released: false,
        };

        guard
            .fc
            .set_axis_config(AxisControlConfig::velocity())
            .map_err(VstickError::Configure)?;

        guard
            .fc
            .set_virtual_stick(true)
            .map_err(VstickError::Enable)?;
        guard.enabled = true;

        debug!("Virtual stick acquired, previous config {:?}", snapshot);

        Ok(guard)
    }

    /// The flight controller this session actuates.
    pub fn fc(&self) -> &dyn FlightController {
        &*self.fc
    }

    pub fn snapshot(&self) -> AxisControlConfig {
        self.snapshot
    }

    /// Disable the virtual stick and restore the configuration.
    ///
    /// A failure to disable the stick is returned. The configuration is restored regardless, and
    /// a failure to do so is only logged.
    pub fn release(mut self) -> Result<(), VstickError> {
        self.released = true;

        let disabled = self
            .fc
            .set_virtual_stick(false)
            .map_err(VstickError::Disable);
        self.restore();

        debug!("Virtual stick released");

        disabled
    }

    fn restore(&self) {
        if let Err(e) = self.fc.set_axis_config(self.snapshot) {
            warn!("Could not restore the axis control configuration: {}", e);
        }
    }
}

impl Drop for VirtualStick {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if self.enabled {
            if let Err(e) = self.fc.set_virtual_stick(false) {
                warn!("Could not disable the virtual stick: {}", e);
            }
        }
        self.restore();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run `f` inside a virtual stick session.
pub fn with_virtual_stick<T, F>(fc: Arc<dyn FlightController>, f: F) -> Result<T, VstickError>
where
    F: FnOnce(&dyn FlightController) -> T,
{
    let session = VirtualStick::acquire(fc)?;
    let out = f(session.fc());
    session.release()?;

    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fc::{
        sim::{SimEvent, SimFaults, SimFc, SimParams},
        FlightCommand, YawControlMode,
    };

    fn sim_with_config() -> (Arc<SimFc>, AxisControlConfig) {
        let fc = Arc::new(SimFc::new(SimParams {
            record_events: true,
            ..Default::default()
        }));
        let config = AxisControlConfig {
            yaw: YawControlMode::AngularVelocity,
            ..Default::default()
        };
        fc.set_axis_config(config).unwrap();
        fc.clear_events();
        (fc, config)
    }

    #[test]
    fn test_session_order() {
        let (fc, config) = sim_with_config();
        let cmd = FlightCommand {
            yaw_rate: 10.0,
            ..Default::default()
        };

        let sent = with_virtual_stick(fc.clone(), |fc| fc.send_command(&cmd)).unwrap();
        assert!(sent.is_ok());

        assert_eq!(
            fc.events(),
            vec![
                SimEvent::AxisConfig(AxisControlConfig::velocity()),
                SimEvent::VirtualStick(true),
                SimEvent::Command(cmd),
                SimEvent::VirtualStick(false),
                SimEvent::AxisConfig(config),
            ]
        );
        assert_eq!(fc.axis_config(), Ok(config));
        assert!(!fc.virtual_stick_enabled());
    }

    #[test]
    fn test_enable_failure_restores() {
        let (fc, config) = sim_with_config();
        fc.set_faults(SimFaults {
            reject_virtual_stick: true,
            ..Default::default()
        });

        let result = VirtualStick::acquire(fc.clone());

        assert!(matches!(result, Err(VstickError::Enable(_))));
        assert_eq!(
            fc.events(),
            vec![
                SimEvent::AxisConfig(AxisControlConfig::velocity()),
                SimEvent::AxisConfig(config),
            ]
        );
    }

    #[test]
    fn test_not_connected() {
        let (fc, _) = sim_with_config();
        fc.set_connected(false);

        assert!(matches!(
            VirtualStick::acquire(fc.clone()),
            Err(VstickError::Snapshot(FcError::NotConnected))
        ));
    }

    #[test]
    fn test_drop_restores() {
        let (fc, config) = sim_with_config();

        {
            let session = VirtualStick::acquire(fc.clone()).unwrap();
            assert_eq!(session.snapshot(), config);
            assert!(fc.virtual_stick_enabled());
        }

        assert!(!fc.virtual_stick_enabled());
        assert_eq!(fc.axis_config(), Ok(config));
    }

    #[test]
    fn test_configure_failure() {
        let (fc, config) = sim_with_config();
        fc.set_faults(SimFaults {
            reject_axis_config: true,
            ..Default::default()
        });

        assert!(matches!(
            VirtualStick::acquire(fc.clone()),
            Err(VstickError::Configure(FcError::Rejected(_)))
        ));

        // The stick was never enabled and the configuration never left the snapshot
        assert!(fc.events().is_empty());
        assert!(!fc.virtual_stick_enabled());
        assert_eq!(fc.axis_config(), Ok(config));
    }

    #[test]
    fn test_restore_failure_not_escalated() {
        let (fc, _) = sim_with_config();

        let session = VirtualStick::acquire(fc.clone()).unwrap();
        fc.set_faults(SimFaults {
            reject_axis_config: true,
            ..Default::default()
        });

        assert!(session.release().is_ok());
        assert!(!fc.virtual_stick_enabled());
        assert_eq!(fc.axis_config(), Ok(AxisControlConfig::velocity()));
        assert_eq!(fc.events().last(), Some(&SimEvent::VirtualStick(false)));
    }
}
