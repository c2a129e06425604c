//! Safety constraint evaluation.
//!
//! Constraints are checked in a fixed order; the first violation wins and its
//! reason becomes the latch message. Nothing is evaluated while the motor
//! controller service is still disabled — before the first healthy poll there
//! is no motion to protect and the snapshot is legitimately empty.

use rcc_common::motor::{MotorControllerState, MotorService};

/// Evaluate the ordered safety constraints against the motor service.
///
/// Returns the reason string of the first violated constraint, or `None`
/// when dispatch-safe.
pub fn check_constraints(motor: &dyn MotorService) -> Option<String> {
    if motor.state() == MotorControllerState::Disabled {
        return None;
    }

    if motor.is_estop_active() {
        return Some("MC E-Stop Active.".to_string());
    }

    if motor.is_telemetry_stale() {
        return Some(format!(
            "MC Telemetry stale -> {}s since last fetch.",
            motor.telemetry_age()
        ));
    }

    let status = motor.controller_status();
    if !status.is_normal() {
        return Some(format!("MC Abnormal Status: {status}"));
    }

    None
}
