//! Motor controller state machine enum and service contract.

use std::fmt;

use thiserror::Error;

use crate::status::ControllerStatus;
use crate::telemetry::ControllerTelemetry;

/// Operational state of the motor controller service.
///
/// `Disabled` is the initial state; the service leaves it only after the
/// first telemetry poll succeeds with a `Normal` status, and re-enters it on
/// shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MotorControllerState {
    /// Not started, or shut down. No motion commands accepted.
    #[default]
    Disabled = 0,
    /// Healthy and holding still.
    Idle = 1,
    /// Driving one motor at jog speed.
    Jogging = 2,
    /// Running the homing routine.
    Homing = 3,
    /// Running the ride sequence.
    Sequencing = 4,
    /// Decelerating both motors to a stop.
    Stopping = 5,
}

impl MotorControllerState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Idle),
            2 => Some(Self::Jogging),
            3 => Some(Self::Homing),
            4 => Some(Self::Sequencing),
            5 => Some(Self::Stopping),
            _ => None,
        }
    }
}

impl fmt::Display for MotorControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disabled => "DISABLED",
            Self::Idle => "IDLE",
            Self::Jogging => "JOGGING",
            Self::Homing => "HOMING",
            Self::Sequencing => "SEQUENCING",
            Self::Stopping => "STOPPING",
        };
        f.write_str(text)
    }
}

/// Errors surfaced through the [`MotorService`] contract.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The service could not bring up the drive link.
    #[error("motor service startup failed: {0}")]
    Startup(String),
}

/// Capability contract for the motor controller service.
///
/// Commands mutate the service state machine; queries read the cached
/// telemetry snapshot under a short lock and return immediately, regardless
/// of what the serial link is doing.
pub trait MotorService: Send + Sync {
    /// Bring up the drive link and start the control loop worker.
    fn start(&self) -> Result<(), ServiceError>;

    /// Stop motion, stop the worker, and release the serial port.
    fn shutdown(&self);

    /// Begin the ride sequence. Accepted only from `Idle`.
    fn start_ride_sequence(&self);

    /// Drive the motors to the home position.
    fn home(&self);

    /// Jog one motor in the given direction (positive = forward).
    ///
    /// Accepted only from `Idle` or `Jogging` with a valid motor number;
    /// returns whether the motor is being jogged.
    fn jog_motor(&self, motor: u8, direction: i8) -> bool;

    /// Decelerate gently to a stop.
    fn stop_motion(&self);

    /// Decelerate as hard as the drive allows.
    fn halt_motion(&self);

    /// Current state machine state.
    fn state(&self) -> MotorControllerState;

    /// Signed speeds [QPPS] for motors 1 and 2.
    fn motor_speeds(&self) -> (f64, f64);

    /// Encoder counts for motors 1 and 2.
    fn motor_positions(&self) -> (i32, i32);

    /// Currents [A] for motors 1 and 2.
    fn motor_currents(&self) -> (f64, f64);

    /// Main battery voltage [V].
    fn voltage(&self) -> f64;

    /// Temperature [°C] for sensor 1 or 2.
    fn temperature(&self, sensor: u8) -> f64;

    /// Last decoded controller status.
    fn controller_status(&self) -> ControllerStatus;

    /// Copy of the full telemetry snapshot.
    fn telemetry(&self) -> ControllerTelemetry;

    /// Seconds since the last successful poll; `INFINITY` if never polled.
    fn telemetry_age(&self) -> f64;

    /// Whether the snapshot is older than the default staleness threshold.
    fn is_telemetry_stale(&self) -> bool;

    /// Whether the controller reports an active hardware E-Stop.
    fn is_estop_active(&self) -> bool;
}
