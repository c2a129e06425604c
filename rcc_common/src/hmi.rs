//! Read-only telemetry contract for the external HMI.
//!
//! The webserver HMI is an external collaborator; it observes the ride
//! through this surface and may relay operator show commands, nothing more.

use crate::motor::MotorControllerState;

/// Capability contract for HMI telemetry readers.
pub trait TelemetryReader: Send + Sync {
    /// Signed speeds [QPPS] for motors 1 and 2.
    fn motor_speeds(&self) -> (f64, f64);

    /// Encoder counts for motors 1 and 2.
    fn motor_positions(&self) -> (i32, i32);

    /// Current motor controller state.
    fn controller_state(&self) -> MotorControllerState;

    /// Current show status.
    fn show_status(&self) -> String;

    /// Relay a show start command.
    fn start_show(&self);

    /// Relay a show stop command.
    fn stop_show(&self);
}
