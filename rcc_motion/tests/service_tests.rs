//! Motor controller service tests against a scripted drive link.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rcc_common::motor::{MotorControllerState, MotorService};
use rcc_common::status::ControllerStatus;
use rcc_common::telemetry::Direction;
use rcc_common::timing::ShutdownSignal;
use rcc_motion::link::DriveLink;
use rcc_motion::service::{
    HALT_DECELERATION, JOG_ACCELERATION, JOG_SPEED, STOP_DECELERATION, SerialMotorService,
};
use rcc_roboclaw::error::RoboClawError;
use rcc_roboclaw::types::{EncoderFlags, EncoderPosition, EncoderSpeed};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared knobs for the scripted drive.
struct MockState {
    status: Mutex<ControllerStatus>,
    speed_qpps: Mutex<u32>,
    /// When set, `read_status` blocks until the gate fires (max 5 s).
    status_gate: Mutex<Option<ShutdownSignal>>,
    /// Every `set_speed_with_acceleration` call: (motor, speed, accel).
    speed_commands: Mutex<Vec<(u8, i32, u32)>>,
}

impl MockState {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(ControllerStatus::Normal),
            speed_qpps: Mutex::new(100),
            status_gate: Mutex::new(None),
            speed_commands: Mutex::new(Vec::new()),
        })
    }

    fn set_status(&self, status: ControllerStatus) {
        *lock(&self.status) = status;
    }

    fn set_speed(&self, qpps: u32) {
        *lock(&self.speed_qpps) = qpps;
    }

    fn block_status_reads(&self) -> ShutdownSignal {
        let gate = ShutdownSignal::new();
        *lock(&self.status_gate) = Some(gate.clone());
        gate
    }

    fn speed_commands(&self) -> Vec<(u8, i32, u32)> {
        lock(&self.speed_commands).clone()
    }
}

struct MockDrive(Arc<MockState>);

impl DriveLink for MockDrive {
    fn read_version(&mut self) -> Result<String, RoboClawError> {
        Ok("MockClaw v1.0".to_string())
    }

    fn read_status(&mut self) -> Result<ControllerStatus, RoboClawError> {
        let gate = lock(&self.0.status_gate).clone();
        if let Some(gate) = gate {
            gate.wait_timeout(Duration::from_secs(5));
        }
        Ok(*lock(&self.0.status))
    }

    fn read_main_voltage(&mut self) -> Result<f64, RoboClawError> {
        Ok(12.0)
    }

    fn read_currents(&mut self) -> Result<(f64, f64), RoboClawError> {
        Ok((0.5, 0.6))
    }

    fn read_temp(&mut self, _sensor: u8) -> Result<f64, RoboClawError> {
        Ok(25.0)
    }

    fn read_encoder_pos(&mut self, _motor: u8) -> Result<EncoderPosition, RoboClawError> {
        Ok(EncoderPosition {
            count: 1000,
            flags: EncoderFlags::empty(),
        })
    }

    fn read_encoder_speed(&mut self, _motor: u8) -> Result<EncoderSpeed, RoboClawError> {
        Ok(EncoderSpeed {
            qpps: *lock(&self.0.speed_qpps),
            direction: Direction::Forward,
        })
    }

    fn set_speed_with_acceleration(
        &mut self,
        motor: u8,
        speed: i32,
        acceleration: u32,
    ) -> Result<(), RoboClawError> {
        lock(&self.0.speed_commands).push((motor, speed, acceleration));
        Ok(())
    }
}

fn started_service(state: &Arc<MockState>) -> SerialMotorService<MockDrive> {
    let service = SerialMotorService::new(MockDrive(Arc::clone(state)));
    service.start().expect("service start");
    service
}

/// Poll until `predicate` holds or `timeout` elapses.
fn wait_for(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

#[test]
fn startup_happy_path_reaches_idle() {
    let mock = MockState::new();
    let service = started_service(&mock);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(service.state(), MotorControllerState::Idle);

    let telemetry = service.telemetry();
    assert_eq!(telemetry.voltage, 12.0);
    assert_eq!(telemetry.status, ControllerStatus::Normal);
    assert_eq!(telemetry.temp1, 25.0);
    assert_eq!(service.motor_positions(), (1000, 1000));
    assert_eq!(service.motor_currents(), (0.5, 0.6));
    assert_eq!(service.motor_speeds(), (100.0, 100.0));
    assert!(!service.is_telemetry_stale());
    assert!(!service.is_telemetry_stale_within(10.0));
    assert!(service.loop_timer().avg() > 0.0);

    service.shutdown();
    assert_eq!(service.state(), MotorControllerState::Disabled);
}

#[test]
fn startup_with_hardware_estop_stays_disabled() {
    let mock = MockState::new();
    mock.set_status(ControllerStatus::EStop);
    let service = started_service(&mock);

    assert_eq!(service.state(), MotorControllerState::Disabled);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(service.state(), MotorControllerState::Disabled);
    thread::sleep(Duration::from_secs(1));
    assert_eq!(service.state(), MotorControllerState::Disabled);

    // Telemetry still flows while disabled.
    assert!(service.is_estop_active());
    assert!(!service.is_telemetry_stale());

    service.shutdown();
}

#[test]
fn stale_telemetry_read_is_fast() {
    let mock = MockState::new();
    let service = started_service(&mock);

    thread::sleep(Duration::from_millis(50));
    assert!(!service.is_telemetry_stale());

    // Wedge the poll thread inside read_status.
    let gate = mock.block_status_reads();
    thread::sleep(Duration::from_secs(1));

    let start = Instant::now();
    let voltage = service.voltage();
    let elapsed = start.elapsed();

    assert_eq!(voltage, 12.0);
    assert!(elapsed < Duration::from_millis(10), "getter took {elapsed:?}");
    assert!(service.is_telemetry_stale());

    // Release the wedged poll so shutdown does not have to wait it out.
    gate.signal();
    service.shutdown();
}

#[test]
fn ride_sequence_stop_then_idle() {
    let mock = MockState::new();
    let service = started_service(&mock);

    assert!(wait_for(Duration::from_millis(500), || {
        service.state() == MotorControllerState::Idle
    }));

    service.start_ride_sequence();
    assert_eq!(service.state(), MotorControllerState::Sequencing);

    service.stop_motion();
    assert_eq!(service.state(), MotorControllerState::Stopping);

    // Mocked speed stays at 100 QPPS: the service keeps decelerating.
    thread::sleep(Duration::from_millis(500));
    assert_eq!(service.state(), MotorControllerState::Stopping);

    // Stopping ticks command zero speed at the gentle deceleration.
    assert!(
        mock.speed_commands()
            .iter()
            .any(|&(_, speed, decel)| speed == 0 && decel == STOP_DECELERATION)
    );

    // Once both motors drop below the stopped threshold, the state settles.
    mock.set_speed(0);
    assert!(wait_for(Duration::from_millis(500), || {
        service.state() == MotorControllerState::Idle
    }));

    service.shutdown();
}

#[test]
fn sequence_rejected_outside_idle() {
    let mock = MockState::new();
    mock.set_status(ControllerStatus::EStop);
    let service = started_service(&mock);

    service.start_ride_sequence();
    assert_eq!(service.state(), MotorControllerState::Disabled);

    service.shutdown();
}

#[test]
fn home_accepted_once_enabled() {
    let mock = MockState::new();
    let service = started_service(&mock);
    assert!(wait_for(Duration::from_millis(500), || {
        service.state() == MotorControllerState::Idle
    }));

    service.home();
    assert_eq!(service.state(), MotorControllerState::Homing);

    service.shutdown();
}

#[test]
fn home_rejected_while_disabled() {
    let mock = MockState::new();
    mock.set_status(ControllerStatus::EStop);
    let service = started_service(&mock);

    service.home();
    assert_eq!(service.state(), MotorControllerState::Disabled);

    service.shutdown();
}

#[test]
fn jog_rejects_invalid_motor() {
    let mock = MockState::new();
    let service = started_service(&mock);
    assert!(wait_for(Duration::from_millis(500), || {
        service.state() == MotorControllerState::Idle
    }));

    assert!(!service.jog_motor(0, 1));
    assert!(!service.jog_motor(3, 1));
    assert_eq!(service.state(), MotorControllerState::Idle);

    service.shutdown();
}

#[test]
fn jog_drives_motor_on_following_ticks() {
    let mock = MockState::new();
    let service = started_service(&mock);
    assert!(wait_for(Duration::from_millis(500), || {
        service.state() == MotorControllerState::Idle
    }));

    assert!(service.jog_motor(1, 1));
    assert_eq!(service.state(), MotorControllerState::Jogging);

    assert!(wait_for(Duration::from_millis(500), || {
        mock.speed_commands()
            .contains(&(1, JOG_SPEED, JOG_ACCELERATION))
    }));

    // Reversing while jogging is accepted.
    assert!(service.jog_motor(2, -1));
    assert!(wait_for(Duration::from_millis(500), || {
        mock.speed_commands()
            .contains(&(2, -JOG_SPEED, JOG_ACCELERATION))
    }));

    service.shutdown();
}

#[test]
fn jog_rejected_while_disabled() {
    let mock = MockState::new();
    mock.set_status(ControllerStatus::EStop);
    let service = started_service(&mock);

    thread::sleep(Duration::from_millis(50));
    assert!(!service.jog_motor(1, 1));
    assert_eq!(service.state(), MotorControllerState::Disabled);

    service.shutdown();
}

#[test]
fn last_update_is_monotonic() {
    let mock = MockState::new();
    let service = started_service(&mock);

    assert!(wait_for(Duration::from_millis(500), || {
        service.telemetry().has_data()
    }));

    let first = service.telemetry().last_update_us;
    thread::sleep(Duration::from_millis(100));
    let second = service.telemetry().last_update_us;
    assert!(second >= first);
    assert!(second > 0);

    service.shutdown();
}

#[test]
fn shutdown_halts_both_motors() {
    let mock = MockState::new();
    let service = started_service(&mock);
    thread::sleep(Duration::from_millis(50));

    service.shutdown();
    assert_eq!(service.state(), MotorControllerState::Disabled);

    let commands = mock.speed_commands();
    assert!(commands.contains(&(1, 0, HALT_DECELERATION)));
    assert!(commands.contains(&(2, 0, HALT_DECELERATION)));
}

#[test]
fn telemetry_age_is_infinite_before_first_poll() {
    let mock = MockState::new();
    let service = SerialMotorService::new(MockDrive(Arc::clone(&mock)));
    assert_eq!(service.telemetry_age(), f64::INFINITY);
    assert!(service.is_telemetry_stale());
}
