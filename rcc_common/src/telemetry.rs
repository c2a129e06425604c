//! Cached motion telemetry snapshot types.
//!
//! The motor controller service overwrites the whole snapshot once per poll;
//! readers copy it out under a short lock and never observe fields from two
//! different poll cycles.

use crate::status::ControllerStatus;

/// Direction of motor rotation as reported by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Positive count direction.
    #[default]
    Forward,
    /// Negative count direction.
    Backward,
}

impl Direction {
    /// Sign multiplier for converting an unsigned magnitude to a signed value.
    #[inline]
    pub const fn sign(&self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Per-motor telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorTelemetry {
    /// Signed speed [QPPS]. Negative when running backward.
    pub speed: f64,
    /// Encoder count.
    pub encoder: i32,
    /// Motor current [A].
    pub current: f64,
    /// Direction reported with the speed reading.
    pub direction: Direction,
    /// Wall-clock time of the sample [µs since epoch].
    pub timestamp_us: u64,
}

/// Full controller telemetry snapshot.
///
/// Created zeroed with `last_update_us == 0` (never polled) and overwritten
/// wholesale on every successful poll. `last_update_us` never decreases, even
/// if the wall clock steps backward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerTelemetry {
    /// Per-motor samples; index 0 is motor 1, index 1 is motor 2.
    pub motors: [MotorTelemetry; 2],
    /// Main battery voltage [V].
    pub voltage: f64,
    /// Decoded controller status.
    pub status: ControllerStatus,
    /// Temperature sensor 1 [°C].
    pub temp1: f64,
    /// Temperature sensor 2 [°C].
    pub temp2: f64,
    /// Wall-clock time of the last successful poll [µs since epoch]; 0 = never.
    pub last_update_us: u64,
}

impl ControllerTelemetry {
    /// Per-motor sample for motor `1` or `2`.
    ///
    /// # Panics
    /// Panics on any other motor number; callers validate first.
    #[inline]
    pub fn motor(&self, motor: u8) -> &MotorTelemetry {
        &self.motors[(motor - 1) as usize]
    }

    /// True once at least one poll has landed.
    #[inline]
    pub const fn has_data(&self) -> bool {
        self.last_update_us != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_empty() {
        let t = ControllerTelemetry::default();
        assert!(!t.has_data());
        assert_eq!(t.status, ControllerStatus::Offline);
        assert_eq!(t.motors[0].speed, 0.0);
        assert_eq!(t.motors[1].encoder, 0);
    }

    #[test]
    fn motor_lookup_is_one_based() {
        let mut t = ControllerTelemetry::default();
        t.motors[0].encoder = 11;
        t.motors[1].encoder = 22;
        assert_eq!(t.motor(1).encoder, 11);
        assert_eq!(t.motor(2).encoder, 22);
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
    }
}
