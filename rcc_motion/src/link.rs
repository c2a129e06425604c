//! The drive seam between the control loop and the protocol adapter.
//!
//! The control loop is written against this trait so desk tests can swap in
//! a scripted drive; production uses [`RoboClaw`].

use rcc_common::status::ControllerStatus;
use rcc_roboclaw::RoboClaw;
use rcc_roboclaw::error::RoboClawError;
use rcc_roboclaw::types::{BatteryKind, EncoderPosition, EncoderSpeed};

/// Drive operations the control loop needs.
pub trait DriveLink: Send {
    /// Firmware version string.
    fn read_version(&mut self) -> Result<String, RoboClawError>;

    /// Decoded controller status.
    fn read_status(&mut self) -> Result<ControllerStatus, RoboClawError>;

    /// Main battery voltage [V].
    fn read_main_voltage(&mut self) -> Result<f64, RoboClawError>;

    /// Both motor currents [A].
    fn read_currents(&mut self) -> Result<(f64, f64), RoboClawError>;

    /// Temperature sensor reading [°C].
    fn read_temp(&mut self, sensor: u8) -> Result<f64, RoboClawError>;

    /// Encoder count and status flags.
    fn read_encoder_pos(&mut self, motor: u8) -> Result<EncoderPosition, RoboClawError>;

    /// Encoder speed magnitude and direction.
    fn read_encoder_speed(&mut self, motor: u8) -> Result<EncoderSpeed, RoboClawError>;

    /// Drive a motor at a signed speed with the given acceleration.
    fn set_speed_with_acceleration(
        &mut self,
        motor: u8,
        speed: i32,
        acceleration: u32,
    ) -> Result<(), RoboClawError>;
}

impl DriveLink for RoboClaw {
    fn read_version(&mut self) -> Result<String, RoboClawError> {
        RoboClaw::read_version(self)
    }

    fn read_status(&mut self) -> Result<ControllerStatus, RoboClawError> {
        RoboClaw::read_status(self)
    }

    fn read_main_voltage(&mut self) -> Result<f64, RoboClawError> {
        self.read_batt_voltage(BatteryKind::Main)
    }

    fn read_currents(&mut self) -> Result<(f64, f64), RoboClawError> {
        RoboClaw::read_currents(self)
    }

    fn read_temp(&mut self, sensor: u8) -> Result<f64, RoboClawError> {
        self.read_temp_sensor(sensor)
    }

    fn read_encoder_pos(&mut self, motor: u8) -> Result<EncoderPosition, RoboClawError> {
        RoboClaw::read_encoder_pos(self, motor)
    }

    fn read_encoder_speed(&mut self, motor: u8) -> Result<EncoderSpeed, RoboClawError> {
        RoboClaw::read_encoder_speed(self, motor)
    }

    fn set_speed_with_acceleration(
        &mut self,
        motor: u8,
        speed: i32,
        acceleration: u32,
    ) -> Result<(), RoboClawError> {
        RoboClaw::set_speed_with_acceleration(self, motor, speed, acceleration)
    }
}
