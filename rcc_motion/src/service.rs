//! The serial motor controller service.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use static_assertions::const_assert;
use tracing::{debug, error, info, warn};

use rcc_common::motor::{MotorControllerState, MotorService, ServiceError};
use rcc_common::status::ControllerStatus;
use rcc_common::telemetry::{ControllerTelemetry, MotorTelemetry};
use rcc_common::timing::{LoopTimer, ShutdownSignal, wall_clock_us};
use rcc_roboclaw::error::RoboClawError;

use crate::link::DriveLink;

// ─── Configuration ──────────────────────────────────────────────────

/// Telemetry poll and control loop rate.
pub const POLL_RATE_HZ: u32 = 50;
/// Jog speed magnitude [QPPS].
pub const JOG_SPEED: i32 = 500;
/// Jog acceleration [QPPS/s].
pub const JOG_ACCELERATION: u32 = 200;
/// Gentle stop deceleration [QPPS/s].
pub const STOP_DECELERATION: u32 = 300;
/// Emergency halt deceleration [QPPS/s].
pub const HALT_DECELERATION: u32 = 10_000;
/// Speed magnitude below which a motor counts as stopped [QPPS].
pub const STOPPED_THRESHOLD: f64 = 5.0;
/// Polls that may be missed before the snapshot counts as stale.
pub const STALE_THRESHOLD_MULTIPLIER: u32 = 3;

const_assert!(STOP_DECELERATION < HALT_DECELERATION);
const_assert!(JOG_SPEED > STOPPED_THRESHOLD as i32);

/// Control loop period.
pub fn poll_interval() -> Duration {
    Duration::from_secs_f64(1.0 / POLL_RATE_HZ as f64)
}

/// Default snapshot staleness threshold [s].
pub fn stale_threshold() -> f64 {
    STALE_THRESHOLD_MULTIPLIER as f64 / POLL_RATE_HZ as f64
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── Shared State ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct JogCommand {
    motor: u8,
    direction: i8,
}

struct Shared {
    state: Mutex<MotorControllerState>,
    telemetry: Mutex<ControllerTelemetry>,
    jog: Mutex<Option<JogCommand>>,
    /// Deceleration applied while Stopping.
    stop_decel: AtomicU32,
    shutdown: ShutdownSignal,
    timer: LoopTimer,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(MotorControllerState::Disabled),
            telemetry: Mutex::new(ControllerTelemetry::default()),
            jog: Mutex::new(None),
            stop_decel: AtomicU32::new(STOP_DECELERATION),
            shutdown: ShutdownSignal::new(),
            timer: LoopTimer::new(),
        }
    }

    fn set_state(&self, new_state: MotorControllerState) {
        let mut state = lock(&self.state);
        if *state != new_state {
            info!("State: {} -> {}", *state, new_state);
            *state = new_state;
        }
    }
}

struct Worker {
    handle: JoinHandle<()>,
    exited: mpsc::Receiver<()>,
}

// ─── Service ────────────────────────────────────────────────────────

/// [`MotorService`] implementation backed by a serial drive link.
///
/// `start()` verifies the link and spawns the control loop worker; the
/// worker is the only code that touches the drive afterwards. Everything
/// else operates on the shared state and the cached snapshot.
pub struct SerialMotorService<D: DriveLink + 'static> {
    shared: Arc<Shared>,
    drive: Mutex<Option<D>>,
    worker: Mutex<Option<Worker>>,
}

impl<D: DriveLink + 'static> SerialMotorService<D> {
    /// Create a service around an unstarted drive link.
    pub fn new(drive: D) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            drive: Mutex::new(Some(drive)),
            worker: Mutex::new(None),
        }
    }

    /// Control loop timing statistics.
    pub fn loop_timer(&self) -> &LoopTimer {
        &self.shared.timer
    }

    /// Staleness check against a caller-chosen threshold [s].
    pub fn is_telemetry_stale_within(&self, max_age_s: f64) -> bool {
        self.telemetry_age() > max_age_s
    }
}

impl<D: DriveLink + 'static> MotorService for SerialMotorService<D> {
    fn start(&self) -> Result<(), ServiceError> {
        let Some(mut drive) = lock(&self.drive).take() else {
            warn!("motor service already started");
            return Ok(());
        };

        info!("Starting serial motor controller service");
        let version = drive
            .read_version()
            .map_err(|e| ServiceError::Startup(e.to_string()))?;
        info!("Connected to RoboClaw: {version}");

        let shared = Arc::clone(&self.shared);
        let (exit_tx, exit_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("motor-control-loop".to_string())
            .spawn(move || control_loop(drive, shared, exit_tx))
            .map_err(|e| ServiceError::Startup(e.to_string()))?;

        *lock(&self.worker) = Some(Worker {
            handle,
            exited: exit_rx,
        });
        Ok(())
    }

    fn shutdown(&self) {
        info!("Shutting down serial motor controller service");
        self.shared.shutdown.signal();

        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            match worker.exited.recv_timeout(Duration::from_secs(1)) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = worker.handle.join();
                }
                Err(RecvTimeoutError::Timeout) => {
                    error!("Control loop failed to shut down.");
                }
            }
        }

        self.shared.set_state(MotorControllerState::Disabled);
    }

    fn start_ride_sequence(&self) {
        let mut state = lock(&self.shared.state);
        if *state != MotorControllerState::Idle {
            warn!("Cannot start sequence from state {}", *state);
            return;
        }
        info!("State: {} -> {}", *state, MotorControllerState::Sequencing);
        *state = MotorControllerState::Sequencing;
        // TODO: drive the ride profile once the motion sequence is defined.
    }

    fn home(&self) {
        let mut state = lock(&self.shared.state);
        if *state == MotorControllerState::Disabled {
            warn!("Cannot home from state {}", *state);
            return;
        }
        if *state != MotorControllerState::Homing {
            info!("State: {} -> {}", *state, MotorControllerState::Homing);
            *state = MotorControllerState::Homing;
        }
        // TODO: implement the homing routine.
    }

    fn jog_motor(&self, motor: u8, direction: i8) -> bool {
        if !matches!(motor, 1 | 2) {
            error!("Invalid motor number: {motor}");
            return false;
        }

        {
            let mut state = lock(&self.shared.state);
            if !matches!(
                *state,
                MotorControllerState::Idle | MotorControllerState::Jogging
            ) {
                debug!("Cannot jog from state {}", *state);
                return false;
            }
            if *state != MotorControllerState::Jogging {
                info!("State: {} -> {}", *state, MotorControllerState::Jogging);
                *state = MotorControllerState::Jogging;
            }
        }

        *lock(&self.shared.jog) = Some(JogCommand {
            motor,
            direction: if direction > 0 { 1 } else { -1 },
        });
        true
    }

    fn stop_motion(&self) {
        self.begin_stop(STOP_DECELERATION);
    }

    fn halt_motion(&self) {
        self.begin_stop(HALT_DECELERATION);
    }

    fn state(&self) -> MotorControllerState {
        *lock(&self.shared.state)
    }

    fn motor_speeds(&self) -> (f64, f64) {
        let t = lock(&self.shared.telemetry);
        (t.motors[0].speed, t.motors[1].speed)
    }

    fn motor_positions(&self) -> (i32, i32) {
        let t = lock(&self.shared.telemetry);
        (t.motors[0].encoder, t.motors[1].encoder)
    }

    fn motor_currents(&self) -> (f64, f64) {
        let t = lock(&self.shared.telemetry);
        (t.motors[0].current, t.motors[1].current)
    }

    fn voltage(&self) -> f64 {
        lock(&self.shared.telemetry).voltage
    }

    fn temperature(&self, sensor: u8) -> f64 {
        let t = lock(&self.shared.telemetry);
        if sensor == 1 { t.temp1 } else { t.temp2 }
    }

    fn controller_status(&self) -> ControllerStatus {
        lock(&self.shared.telemetry).status
    }

    fn telemetry(&self) -> ControllerTelemetry {
        *lock(&self.shared.telemetry)
    }

    fn telemetry_age(&self) -> f64 {
        let last_update_us = lock(&self.shared.telemetry).last_update_us;
        if last_update_us == 0 {
            return f64::INFINITY;
        }
        wall_clock_us().saturating_sub(last_update_us) as f64 / 1_000_000.0
    }

    fn is_telemetry_stale(&self) -> bool {
        self.telemetry_age() > stale_threshold()
    }

    fn is_estop_active(&self) -> bool {
        lock(&self.shared.telemetry).status.is_estop()
    }
}

impl<D: DriveLink + 'static> SerialMotorService<D> {
    fn begin_stop(&self, deceleration: u32) {
        let mut state = lock(&self.shared.state);
        if *state == MotorControllerState::Disabled {
            warn!("Cannot stop motion from state {}", *state);
            return;
        }
        self.shared.stop_decel.store(deceleration, Ordering::Relaxed);
        if *state != MotorControllerState::Stopping {
            info!("State: {} -> {}", *state, MotorControllerState::Stopping);
            *state = MotorControllerState::Stopping;
        }
        drop(state);
        *lock(&self.shared.jog) = None;
    }
}

// ─── Control Loop ───────────────────────────────────────────────────

fn control_loop<D: DriveLink>(mut drive: D, shared: Arc<Shared>, exit_tx: mpsc::Sender<()>) {
    let interval = poll_interval();

    loop {
        shared.timer.tick();
        if let Err(err) = run_tick(&mut drive, &shared) {
            error!("Telemetry poll failed: {err}");
        }
        if shared.shutdown.wait_timeout(interval) {
            break;
        }
    }

    // Bring both motors to an immediate stop before the port goes away with
    // this thread.
    for motor in [1, 2] {
        if let Err(err) = drive.set_speed_with_acceleration(motor, 0, HALT_DECELERATION) {
            warn!("final halt for motor {motor} failed: {err}");
        }
    }

    let _ = exit_tx.send(());
}

/// One control loop tick: state action, telemetry poll, transitions.
fn run_tick<D: DriveLink>(drive: &mut D, shared: &Shared) -> Result<(), RoboClawError> {
    let state = *lock(&shared.state);
    match state {
        MotorControllerState::Jogging => {
            let jog = *lock(&shared.jog);
            if let Some(jog) = jog {
                let speed = if jog.direction > 0 {
                    JOG_SPEED
                } else {
                    -JOG_SPEED
                };
                drive.set_speed_with_acceleration(jog.motor, speed, JOG_ACCELERATION)?;
            }
        }
        MotorControllerState::Stopping => {
            let deceleration = shared.stop_decel.load(Ordering::Relaxed);
            for motor in [1, 2] {
                drive.set_speed_with_acceleration(motor, 0, deceleration)?;
            }
        }
        _ => {}
    }

    let snapshot = poll_telemetry(drive, shared)?;
    evaluate_transitions(shared, &snapshot);
    Ok(())
}

/// Read the full telemetry set and swap it into the snapshot.
fn poll_telemetry<D: DriveLink>(
    drive: &mut D,
    shared: &Shared,
) -> Result<ControllerTelemetry, RoboClawError> {
    let poll_start_us = wall_clock_us();

    let status = drive.read_status()?;
    let voltage = drive.read_main_voltage()?;
    let currents = drive.read_currents()?;
    let temp1 = drive.read_temp(1)?;
    let temp2 = drive.read_temp(2)?;

    let mut motors = [MotorTelemetry::default(); 2];
    for motor in [1u8, 2u8] {
        let encoder = drive.read_encoder_pos(motor)?;
        let speed = drive.read_encoder_speed(motor)?;
        motors[(motor - 1) as usize] = MotorTelemetry {
            speed: speed.signed_qpps() as f64,
            encoder: encoder.count,
            current: if motor == 1 { currents.0 } else { currents.1 },
            direction: speed.direction,
            timestamp_us: poll_start_us,
        };
    }

    let mut telemetry = lock(&shared.telemetry);
    // last_update never decreases, even if the wall clock steps backward.
    let last_update_us = poll_start_us.max(telemetry.last_update_us);
    *telemetry = ControllerTelemetry {
        motors,
        voltage,
        status,
        temp1,
        temp2,
        last_update_us,
    };
    Ok(*telemetry)
}

/// State transitions driven by the freshly polled snapshot.
fn evaluate_transitions(shared: &Shared, snapshot: &ControllerTelemetry) {
    let state = *lock(&shared.state);
    match state {
        MotorControllerState::Disabled => {
            if snapshot.has_data() && snapshot.status.is_normal() {
                shared.set_state(MotorControllerState::Idle);
            }
        }
        MotorControllerState::Stopping => {
            let stopped = snapshot.motors[0].speed.abs() < STOPPED_THRESHOLD
                && snapshot.motors[1].speed.abs() < STOPPED_THRESHOLD;
            if stopped {
                shared.set_state(MotorControllerState::Idle);
            }
        }
        _ => {}
    }
}
