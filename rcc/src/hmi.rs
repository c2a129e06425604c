//! Telemetry adapter for the external HMI.

use std::sync::Arc;

use rcc_common::hmi::TelemetryReader;
use rcc_common::motor::{MotorControllerState, MotorService};
use rcc_common::show::ShowController;

/// [`TelemetryReader`] over the live motor service and show controller.
///
/// Handed to the webserver HMI; every call reads the current snapshot, so the
/// reader can be polled from any thread without touching the serial link.
pub struct RideTelemetry {
    motor: Arc<dyn MotorService>,
    show: Arc<dyn ShowController>,
}

impl RideTelemetry {
    /// Compose a reader over the running service and show handles.
    pub fn new(motor: Arc<dyn MotorService>, show: Arc<dyn ShowController>) -> Self {
        Self { motor, show }
    }
}

impl TelemetryReader for RideTelemetry {
    fn motor_speeds(&self) -> (f64, f64) {
        self.motor.motor_speeds()
    }

    fn motor_positions(&self) -> (i32, i32) {
        self.motor.motor_positions()
    }

    fn controller_state(&self) -> MotorControllerState {
        self.motor.state()
    }

    fn show_status(&self) -> String {
        self.show.status()
    }

    fn start_show(&self) {
        self.show.start_show();
    }

    fn stop_show(&self) {
        self.show.stop_show();
    }
}
