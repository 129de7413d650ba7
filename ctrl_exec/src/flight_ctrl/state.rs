//! Implementations for the FlightCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::tc::{
    ControlMode, Direction, LimitKind, VelocityCommand, VelocityProfileKind,
};
use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Internal
use super::{FlightCtrlError, ImuCollector, ModeMachine, Params, VelocitySession};
use crate::{
    dispatch::{dispatch_plan, DispatchReport},
    fc::{FlightController, ImuState},
    motion::{self, MotionLimits},
    vstick::with_virtual_stick,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Flight control state.
pub struct FlightCtrl {
    fc: Arc<dyn FlightController>,

    params: Params,

    /// Held for the whole of any operation which changes actuation.
    motion_lock: Mutex<()>,

    state: Mutex<CtrlState>,

    config: Mutex<MotionConfig>,

    imu: ImuCollector,
}

struct CtrlState {
    mode: ModeMachine,
    velocity: Option<VelocitySession>,
}

/// The motion configuration applied to the next move.
#[derive(Debug, Clone, Copy)]
struct MotionConfig {
    limits: MotionLimits,
    profile: VelocityProfileKind,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FlightCtrl {
    pub fn new(fc: Arc<dyn FlightController>, params: Params) -> Result<Self, FlightCtrlError> {
        params.validate()?;

        let config = MotionConfig {
            limits: params.limits,
            profile: params.default_profile,
        };

        Ok(Self {
            fc,
            params,
            motion_lock: Mutex::new(()),
            state: Mutex::new(CtrlState {
                mode: ModeMachine::default(),
                velocity: None,
            }),
            config: Mutex::new(config),
            imu: ImuCollector::default(),
        })
    }

    // ---- CONFIGURATION ----

    /// Set a motion limit, which applies from the next move on.
    pub fn set_limit(&self, kind: LimitKind, value: f64) -> Result<(), FlightCtrlError> {
        self.config.lock()?.limits.set(kind, value)?;
        info!("{} limit set to {}", kind, value);
        Ok(())
    }

    pub fn limit(&self, kind: LimitKind) -> Result<f64, FlightCtrlError> {
        Ok(self.config.lock()?.limits.get(kind))
    }

    pub fn limits(&self) -> Result<MotionLimits, FlightCtrlError> {
        Ok(self.config.lock()?.limits)
    }

    /// Select the profile used by the next move.
    pub fn set_profile(&self, profile: VelocityProfileKind) -> Result<(), FlightCtrlError> {
        self.config.lock()?.profile = profile;
        info!("Velocity profile set to {}", profile);
        Ok(())
    }

    pub fn profile(&self) -> Result<VelocityProfileKind, FlightCtrlError> {
        Ok(self.config.lock()?.profile)
    }

    // ---- MODE ----

    /// Change the control mode. Refused while the velocity stream is active.
    pub fn set_mode(&self, mode: ControlMode) -> Result<(), FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;
        let mut state = self.state.lock()?;

        let stream_active = state.velocity.is_some();
        state.mode.transition(mode, stream_active)
    }

    pub fn mode(&self) -> Result<ControlMode, FlightCtrlError> {
        Ok(self.state.lock()?.mode.mode())
    }

    // ---- POSITION MODE ----

    /// Execute a directional move, blocking until the whole plan has been sent.
    ///
    /// Mode and argument errors are raised before anything is sent to the vehicle. Commands the
    /// vehicle refuses during the move are counted in the report but do not fail the move.
    pub fn directional_move(
        &self,
        direction: Direction,
        magnitude: f64,
    ) -> Result<DispatchReport, FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;

        self.state.lock()?.mode.require(ControlMode::Position)?;

        let config = *self.config.lock()?;
        let plan = motion::plan(
            config.profile,
            direction,
            magnitude,
            &config.limits,
            self.params.dispatch_interval_s(),
            self.params.max_plan_samples,
        )?;

        info!(
            "Moving {} {} with a {} profile ({} commands)",
            direction,
            magnitude,
            config.profile,
            plan.commands.len()
        );

        let interval = self.params.dispatch_interval();
        let report = with_virtual_stick(self.fc.clone(), |fc| {
            dispatch_plan(fc, &plan.commands, interval)
        })?;

        info!(
            "Move complete, {} of {} commands accepted",
            report.sent,
            plan.commands.len()
        );

        Ok(report)
    }

    // ---- VELOCITY MODE ----

    /// Enable the virtual stick and start streaming a zero velocity.
    pub fn start_velocity_control(&self) -> Result<(), FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;

        {
            let state = self.state.lock()?;
            state.mode.require(ControlMode::Velocity)?;
            if state.velocity.is_some() {
                return Err(FlightCtrlError::AlreadyActive("Velocity control"));
            }
        }

        // Only motion locked operations touch the session, so it can be started unlocked
        let session = VelocitySession::start(self.fc.clone(), self.params.dispatch_interval())?;
        self.state.lock()?.velocity = Some(session);

        Ok(())
    }

    /// Replace the streamed velocity.
    pub fn set_velocity_command(&self, cmd: VelocityCommand) -> Result<(), FlightCtrlError> {
        let state = self.state.lock()?;
        state.mode.require(ControlMode::Velocity)?;

        if !cmd.is_finite() {
            return Err(FlightCtrlError::Validation(
                "Velocity components must be finite numbers".into(),
            ));
        }

        match &state.velocity {
            Some(session) => {
                session.set_command(cmd.into());
                Ok(())
            }
            None => Err(FlightCtrlError::NotActive("Velocity control")),
        }
    }

    /// The streamed velocity, zero when no stream is active.
    pub fn velocity_command(&self) -> Result<VelocityCommand, FlightCtrlError> {
        let state = self.state.lock()?;
        state.mode.require(ControlMode::Velocity)?;

        Ok(state
            .velocity
            .as_ref()
            .map(|s| s.command().into())
            .unwrap_or_default())
    }

    pub fn is_velocity_control_active(&self) -> Result<bool, FlightCtrlError> {
        Ok(self.state.lock()?.velocity.is_some())
    }

    /// Stop streaming and release the virtual stick.
    pub fn stop_velocity_control(&self) -> Result<DispatchReport, FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;

        let session = {
            let mut state = self.state.lock()?;
            state.mode.require(ControlMode::Velocity)?;
            state
                .velocity
                .take()
                .ok_or(FlightCtrlError::NotActive("Velocity control"))?
        };

        session.stop()
    }

    // ---- FLIGHT ----

    pub fn take_off(&self) -> Result<(), FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;
        self.fc.take_off()?;
        info!("Took off");
        Ok(())
    }

    pub fn land(&self) -> Result<(), FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;
        self.fc.land()?;
        info!("Landing");
        Ok(())
    }

    pub fn confirm_landing(&self) -> Result<(), FlightCtrlError> {
        self.fc.confirm_landing()?;
        info!("Landing confirmed");
        Ok(())
    }

    /// Reboot the flight controller. Refused while the velocity stream is active.
    pub fn reboot(&self) -> Result<(), FlightCtrlError> {
        let _motion = self.motion_lock.lock()?;
        if self.state.lock()?.velocity.is_some() {
            return Err(FlightCtrlError::Validation(
                "Cannot reboot while velocity control is active".into(),
            ));
        }

        warn!("Rebooting the flight controller");
        self.fc.reboot()?;
        Ok(())
    }

    pub fn landing_protection(&self) -> Result<bool, FlightCtrlError> {
        Ok(self.fc.landing_protection()?)
    }

    pub fn set_landing_protection(&self, enabled: bool) -> Result<(), FlightCtrlError> {
        self.fc.set_landing_protection(enabled)?;
        info!("Landing protection enabled: {}", enabled);
        Ok(())
    }

    // ---- STATE ----

    pub fn virtual_stick_available(&self) -> Result<bool, FlightCtrlError> {
        Ok(self.fc.virtual_stick_available()?)
    }

    /// Compass heading.
    ///
    /// Units: degrees
    pub fn heading(&self) -> Result<f64, FlightCtrlError> {
        self.fc
            .state()?
            .heading_deg
            .ok_or_else(|| FlightCtrlError::Unavailable("Cannot find compass component".into()))
    }

    /// Height above the ground measured by the ultrasonic sensor.
    ///
    /// Units: meters
    pub fn altitude(&self) -> Result<f64, FlightCtrlError> {
        self.fc
            .state()?
            .ultrasonic_height_m
            .ok_or_else(|| FlightCtrlError::Unavailable("Ultrasonic sensor not being used".into()))
    }

    // ---- IMU COLLECTION ----

    pub fn current_imu_state(&self) -> Result<ImuState, FlightCtrlError> {
        Ok(self.fc.state()?.imu)
    }

    /// Start collecting IMU states, every `interval_ms` or the configured default.
    pub fn start_imu_collection(&self, interval_ms: Option<u64>) -> Result<(), FlightCtrlError> {
        let interval = Duration::from_millis(interval_ms.unwrap_or(self.params.imu_interval_ms));
        self.imu.start(self.fc.clone(), interval)
    }

    pub fn stop_imu_collection(&self) -> Result<usize, FlightCtrlError> {
        self.imu.stop()
    }

    pub fn collected_imu_states(&self) -> Result<Vec<Option<ImuState>>, FlightCtrlError> {
        self.imu.collected()
    }

    pub fn clear_collected_imu_states(&self) -> Result<(), FlightCtrlError> {
        self.imu.clear()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fc::{
        sim::{SimEvent, SimFaults, SimFc, SimParams},
        AxisControlConfig, FcError, FlightCommand,
    };
    use crate::vstick::VstickError;
    use std::thread;

    fn test_params() -> Params {
        Params {
            dispatch_interval_ms: 2,
            ..Default::default()
        }
    }

    fn setup() -> (Arc<SimFc>, FlightCtrl) {
        let fc = Arc::new(SimFc::new(SimParams {
            record_events: true,
            ..Default::default()
        }));
        let ctrl = FlightCtrl::new(fc.clone(), test_params()).unwrap();
        (fc, ctrl)
    }

    #[test]
    fn test_defaults() {
        let (_, ctrl) = setup();

        assert_eq!(ctrl.mode().unwrap(), ControlMode::Position);
        assert_eq!(ctrl.profile().unwrap(), VelocityProfileKind::Constant);
        assert_eq!(ctrl.limits().unwrap(), MotionLimits::default());
    }

    #[test]
    fn test_configuration() {
        let (_, ctrl) = setup();

        ctrl.set_limit(LimitKind::Speed, 0.5).unwrap();
        assert_eq!(ctrl.limit(LimitKind::Speed).unwrap(), 0.5);

        let e = ctrl.set_limit(LimitKind::Jerk, 0.0).unwrap_err();
        assert!(matches!(e, FlightCtrlError::Validation(_)));
        assert!(e.to_string().contains("Non-Positive Float not allowed"));
        assert_eq!(ctrl.limit(LimitKind::Jerk).unwrap(), 0.2);

        ctrl.set_profile(VelocityProfileKind::SCurve).unwrap();
        assert_eq!(ctrl.profile().unwrap(), VelocityProfileKind::SCurve);
    }

    #[test]
    fn test_directional_move() {
        let (fc, ctrl) = setup();
        ctrl.set_limit(LimitKind::Speed, 0.5).unwrap();

        let report = ctrl.directional_move(Direction::Forward, 2.0).unwrap();
        assert_eq!(report, DispatchReport { sent: 101, failed: 0 });

        let events = fc.events();
        assert_eq!(events.len(), 2 + 101 + 2);
        assert_eq!(events[0], SimEvent::AxisConfig(AxisControlConfig::velocity()));
        assert_eq!(events[1], SimEvent::VirtualStick(true));
        assert_eq!(
            events[2],
            SimEvent::Command(FlightCommand {
                longitudinal: 0.5,
                ..Default::default()
            })
        );
        assert_eq!(events[102], SimEvent::Command(FlightCommand::default()));
        assert_eq!(events[103], SimEvent::VirtualStick(false));
        assert_eq!(
            events[104],
            SimEvent::AxisConfig(AxisControlConfig::default())
        );
    }

    #[test]
    fn test_move_errors_before_actuation() {
        let (fc, ctrl) = setup();

        assert!(matches!(
            ctrl.directional_move(Direction::Up, -1.0),
            Err(FlightCtrlError::Validation(_))
        ));
        for &huge in &[1e9, 1e300] {
            assert!(matches!(
                ctrl.directional_move(Direction::Forward, huge),
                Err(FlightCtrlError::Validation(_))
            ));
        }

        ctrl.set_mode(ControlMode::Velocity).unwrap();
        assert!(matches!(
            ctrl.directional_move(Direction::Forward, 1.0),
            Err(FlightCtrlError::ModeMismatch {
                attempted: ControlMode::Position,
                current: ControlMode::Velocity
            })
        ));

        assert!(fc.events().is_empty());
    }

    #[test]
    fn test_move_actuation_failures() {
        let (fc, ctrl) = setup();

        fc.set_faults(SimFaults {
            reject_virtual_stick: true,
            ..Default::default()
        });
        assert!(matches!(
            ctrl.directional_move(Direction::Left, 0.1),
            Err(FlightCtrlError::ActuationMode(_))
        ));
        assert!(fc.commands().is_empty());
        assert_eq!(fc.axis_config(), Ok(AxisControlConfig::default()));

        fc.set_faults(SimFaults {
            reject_axis_config: true,
            ..Default::default()
        });
        assert!(matches!(
            ctrl.directional_move(Direction::Left, 0.1),
            Err(FlightCtrlError::ActuationMode(VstickError::Configure(_)))
        ));
        assert!(fc.commands().is_empty());
        assert!(!fc.virtual_stick_enabled());
        assert_eq!(fc.axis_config(), Ok(AxisControlConfig::default()));

        // Refused commands do not fail the move
        fc.set_faults(SimFaults {
            reject_commands: true,
            ..Default::default()
        });
        let report = ctrl.directional_move(Direction::Left, 0.1).unwrap();
        assert_eq!(report.sent, 0);
        assert!(report.failed > 0);

        fc.set_faults(SimFaults::default());
        fc.set_connected(false);
        assert!(matches!(
            ctrl.directional_move(Direction::Left, 0.1),
            Err(FlightCtrlError::Unavailable(_))
        ));
    }

    #[test]
    fn test_velocity_control() {
        let (fc, ctrl) = setup();

        assert!(matches!(
            ctrl.start_velocity_control(),
            Err(FlightCtrlError::ModeMismatch { .. })
        ));

        ctrl.set_mode(ControlMode::Velocity).unwrap();
        assert_eq!(
            ctrl.velocity_command().unwrap(),
            VelocityCommand::default()
        );
        assert!(matches!(
            ctrl.set_velocity_command(VelocityCommand::default()),
            Err(FlightCtrlError::NotActive(_))
        ));

        ctrl.start_velocity_control().unwrap();
        assert!(ctrl.is_velocity_control_active().unwrap());
        assert!(fc.virtual_stick_enabled());
        assert!(matches!(
            ctrl.start_velocity_control(),
            Err(FlightCtrlError::AlreadyActive(_))
        ));
        assert!(matches!(
            ctrl.set_mode(ControlMode::Position),
            Err(FlightCtrlError::ModeTransition)
        ));

        let cmd = VelocityCommand {
            x: 0.1,
            y: -0.2,
            z: 0.3,
            yaw_rate: 5.0,
        };
        ctrl.set_velocity_command(cmd).unwrap();
        assert_eq!(ctrl.velocity_command().unwrap(), cmd);
        assert!(ctrl
            .set_velocity_command(VelocityCommand {
                x: std::f64::NAN,
                ..cmd
            })
            .is_err());

        thread::sleep(Duration::from_millis(20));
        let report = ctrl.stop_velocity_control().unwrap();

        assert!(report.sent > 0);
        assert_eq!(fc.commands().last(), Some(&FlightCommand::from(cmd)));
        assert!(!fc.virtual_stick_enabled());
        assert_eq!(fc.axis_config(), Ok(AxisControlConfig::default()));

        // Stopping zeroes the command
        assert_eq!(
            ctrl.velocity_command().unwrap(),
            VelocityCommand::default()
        );
        assert!(matches!(
            ctrl.stop_velocity_control(),
            Err(FlightCtrlError::NotActive(_))
        ));

        ctrl.set_mode(ControlMode::Position).unwrap();
    }

    #[test]
    fn test_velocity_queries_need_velocity_mode() {
        let (_, ctrl) = setup();

        assert!(matches!(
            ctrl.velocity_command(),
            Err(FlightCtrlError::ModeMismatch { .. })
        ));
        assert!(matches!(
            ctrl.set_velocity_command(VelocityCommand::default()),
            Err(FlightCtrlError::ModeMismatch { .. })
        ));
        assert!(matches!(
            ctrl.stop_velocity_control(),
            Err(FlightCtrlError::ModeMismatch { .. })
        ));
    }

    #[test]
    fn test_flight_operations() {
        let (fc, ctrl) = setup();

        ctrl.take_off().unwrap();
        assert!(matches!(
            ctrl.take_off(),
            Err(FlightCtrlError::ActuationCommand(FcError::Rejected(_)))
        ));
        assert!(ctrl.landing_protection().unwrap());

        ctrl.land().unwrap();
        ctrl.confirm_landing().unwrap();
        assert!(!fc.state().unwrap().flying);

        ctrl.set_landing_protection(false).unwrap();
        assert!(!ctrl.landing_protection().unwrap());

        ctrl.reboot().unwrap();
        assert!(ctrl.virtual_stick_available().unwrap());
    }

    #[test]
    fn test_sensors() {
        let (_, ctrl) = setup();
        assert!(ctrl.heading().is_ok());
        assert_eq!(ctrl.altitude().unwrap(), 0.0);

        let fc = Arc::new(SimFc::new(SimParams {
            has_compass: false,
            ultrasonic_in_use: false,
            ..Default::default()
        }));
        let ctrl = FlightCtrl::new(fc, test_params()).unwrap();

        assert_eq!(
            ctrl.heading().unwrap_err().to_string(),
            "Cannot find compass component"
        );
        assert_eq!(
            ctrl.altitude().unwrap_err().to_string(),
            "Ultrasonic sensor not being used"
        );
    }

    #[test]
    fn test_imu_collection() {
        let (_, ctrl) = setup();

        ctrl.start_imu_collection(Some(5)).unwrap();
        thread::sleep(Duration::from_millis(20));
        let num = ctrl.stop_imu_collection().unwrap();

        assert_eq!(ctrl.collected_imu_states().unwrap().len(), num);
        assert_eq!(
            ctrl.current_imu_state().unwrap(),
            ImuState::default()
        );

        ctrl.clear_collected_imu_states().unwrap();
        assert!(ctrl.collected_imu_states().unwrap().is_empty());
    }
}
