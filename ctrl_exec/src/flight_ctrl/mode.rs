//! Control mode state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::ControlMode;
use log::info;

use super::FlightCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks the active control mode, which starts as `POSITION`.
///
/// Directional moves are only allowed in `POSITION` mode and the velocity stream only in
/// `VELOCITY` mode. The mode cannot change while a velocity stream is running.
#[derive(Debug, Default)]
pub struct ModeMachine {
    mode: ControlMode,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModeMachine {
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Check that an operation of the `attempted` mode may run.
    pub fn require(&self, attempted: ControlMode) -> Result<(), FlightCtrlError> {
        if self.mode == attempted {
            Ok(())
        } else {
            Err(FlightCtrlError::ModeMismatch {
                attempted,
                current: self.mode,
            })
        }
    }

    /// Switch to `target`. Refused while a velocity stream is active, whatever the target.
    pub fn transition(
        &mut self,
        target: ControlMode,
        stream_active: bool,
    ) -> Result<(), FlightCtrlError> {
        if stream_active {
            return Err(FlightCtrlError::ModeTransition);
        }

        if target != self.mode {
            info!("Control mode {} -> {}", self.mode, target);
            self.mode = target;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initial_mode() {
        let m = ModeMachine::default();
        assert_eq!(m.mode(), ControlMode::Position);
        assert!(m.require(ControlMode::Position).is_ok());
        assert!(matches!(
            m.require(ControlMode::Velocity),
            Err(FlightCtrlError::ModeMismatch {
                attempted: ControlMode::Velocity,
                current: ControlMode::Position
            })
        ));
    }

    #[test]
    fn test_transition() {
        let mut m = ModeMachine::default();

        m.transition(ControlMode::Velocity, false).unwrap();
        assert_eq!(m.mode(), ControlMode::Velocity);

        // Blocked while streaming, even towards the current mode
        assert!(matches!(
            m.transition(ControlMode::Position, true),
            Err(FlightCtrlError::ModeTransition)
        ));
        assert!(matches!(
            m.transition(ControlMode::Velocity, true),
            Err(FlightCtrlError::ModeTransition)
        ));
        assert_eq!(m.mode(), ControlMode::Velocity);

        m.transition(ControlMode::Velocity, false).unwrap();
        assert_eq!(m.mode(), ControlMode::Velocity);

        m.transition(ControlMode::Position, false).unwrap();
        assert_eq!(m.mode(), ControlMode::Position);
    }
}
