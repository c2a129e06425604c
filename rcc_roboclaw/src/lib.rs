//! # RoboClaw Serial Protocol Adapter
//!
//! Stateless interface for low-level communication with a RoboClaw motor
//! controller over packet serial. Frames, transmits, receives, and
//! CRC-verifies the byte-level command set; callers get typed operations and
//! typed errors.
//!
//! The adapter owns one serial port. All operations take an internal mutex on
//! the port, so a shared reference can be used from several threads, though
//! the motor controller service is expected to be the only caller.

pub mod cmd;
pub mod error;
pub mod frame;
pub mod types;

use std::io::{self, Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, SerialPort};
use tracing::{info, warn};

use rcc_common::config::SerialConfig;
use rcc_common::status::ControllerStatus;

use crate::error::RoboClawError;
use crate::frame::PayloadReader;
use crate::types::{
    BatteryKind, EncoderFlags, EncoderPosition, EncoderSpeed, PinMode, PinModes, StandardConfig,
};

/// Packet-serial baud rate.
pub const BAUD_RATE: u32 = 115_200;
/// Overall deadline for one response.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Per-byte wait between characters of a response.
pub const INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(10);
/// Default packet-serial device address.
pub const DEFAULT_ADDRESS: u8 = 0x80;

const ACK: u8 = 0xFF;
const RECOVER_BACKOFF: Duration = Duration::from_millis(200);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RoboClaw packet-serial adapter.
pub struct RoboClaw {
    port: Mutex<Option<Box<dyn SerialPort>>>,
    address: u8,
    /// Device path to reopen after an I/O fault; `None` disables recovery.
    reopen: Option<String>,
}

impl RoboClaw {
    /// Open the configured serial device.
    ///
    /// With `auto_recover` enabled, a failed open is retried with backoff
    /// until it succeeds; otherwise the open error is returned and startup
    /// fails.
    pub fn open(config: &SerialConfig) -> Result<Self, RoboClawError> {
        let port = match Self::open_port(&config.port) {
            Ok(port) => port,
            Err(err) if config.auto_recover => {
                warn!("initial open of {} failed ({err}), retrying", config.port);
                Self::reopen_blocking(&config.port)
            }
            Err(err) => return Err(err),
        };
        Ok(Self {
            port: Mutex::new(Some(port)),
            address: config.address,
            reopen: config.auto_recover.then(|| config.port.clone()),
        })
    }

    /// Wrap an already-open port. Recovery is disabled.
    pub fn new(mut port: Box<dyn SerialPort>, address: u8) -> Result<Self, RoboClawError> {
        port.set_timeout(INTER_BYTE_TIMEOUT)
            .map_err(|e| RoboClawError::SerialIo(e.into()))?;
        Ok(Self {
            port: Mutex::new(Some(port)),
            address,
            reopen: None,
        })
    }

    fn open_port(path: &str) -> Result<Box<dyn SerialPort>, RoboClawError> {
        serialport::new(path, BAUD_RATE)
            .timeout(INTER_BYTE_TIMEOUT)
            .open()
            .map_err(|source| RoboClawError::SerialOpen {
                port: path.to_string(),
                source,
            })
    }

    fn reopen_blocking(path: &str) -> Box<dyn SerialPort> {
        loop {
            match Self::open_port(path) {
                Ok(port) => {
                    info!("serial link to {path} recovered");
                    return port;
                }
                Err(_) => {
                    warn!("failed to recover serial. Retrying.");
                    thread::sleep(RECOVER_BACKOFF);
                }
            }
        }
    }

    /// Run `op` with the port locked; on an I/O fault, reopen the port with
    /// backoff (when recovery is enabled) before propagating the fault.
    fn with_port<T>(
        &self,
        op: impl FnOnce(&mut dyn SerialPort) -> Result<T, RoboClawError>,
    ) -> Result<T, RoboClawError> {
        let mut slot = lock(&self.port);
        let port = slot.as_mut().ok_or_else(|| {
            RoboClawError::SerialIo(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial port closed",
            ))
        })?;
        let result = op(port.as_mut());
        if let (Err(RoboClawError::SerialIo(_)), Some(path)) = (&result, &self.reopen) {
            // The old handle must be dropped first: the device is opened
            // exclusively, so it cannot be reopened while still held.
            slot.take();
            *slot = Some(Self::reopen_blocking(path));
        }
        result
    }

    // ─── Write Commands ─────────────────────────────────────────────

    /// Drive a motor with signed speed and unsigned acceleration.
    ///
    /// The motor ramps at `acceleration` [QPPS/s] until `speed` [QPPS] is
    /// reached; the sign of `speed` selects the direction.
    pub fn set_speed_with_acceleration(
        &self,
        motor: u8,
        speed: i32,
        acceleration: u32,
    ) -> Result<(), RoboClawError> {
        let command = motor_cmd(motor, cmd::M1_SPEED_ACCEL, cmd::M2_SPEED_ACCEL)?;
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&acceleration.to_be_bytes());
        payload.extend_from_slice(&speed.to_be_bytes());
        self.transact_write(command, &payload)
    }

    /// Move a motor to an absolute position with speed, acceleration, and
    /// deceleration control, then hold.
    ///
    /// `buffer` 0 executes immediately; nonzero queues behind the running
    /// command.
    pub fn drive_to_position(
        &self,
        motor: u8,
        position: i32,
        speed: i32,
        acceleration: u32,
        deceleration: u32,
        buffer: u8,
    ) -> Result<(), RoboClawError> {
        let command = motor_cmd(
            motor,
            cmd::M1_SPEED_ACCEL_DECCEL_POS,
            cmd::M2_SPEED_ACCEL_DECCEL_POS,
        )?;
        if speed > 2000 {
            return Err(RoboClawError::ValueOutOfRange {
                what: "speed",
                value: speed as i64,
                max: 2000,
            });
        }
        if acceleration > 500 {
            return Err(RoboClawError::ValueOutOfRange {
                what: "acceleration",
                value: acceleration as i64,
                max: 500,
            });
        }
        if deceleration > 500 {
            return Err(RoboClawError::ValueOutOfRange {
                what: "deceleration",
                value: deceleration as i64,
                max: 500,
            });
        }
        let mut payload = Vec::with_capacity(17);
        payload.extend_from_slice(&acceleration.to_be_bytes());
        payload.extend_from_slice(&speed.to_be_bytes());
        payload.extend_from_slice(&deceleration.to_be_bytes());
        payload.extend_from_slice(&position.to_be_bytes());
        payload.push(buffer);
        self.transact_write(command, &payload)
    }

    /// Reset the given encoders to zero.
    pub fn reset_encoders(&self, motors: &[u8]) -> Result<(), RoboClawError> {
        for &motor in motors {
            let command = motor_cmd(motor, cmd::SET_M1_ENC_COUNT, cmd::SET_M2_ENC_COUNT)?;
            self.transact_write(command, &0u32.to_be_bytes())?;
        }
        Ok(())
    }

    /// Set the S3/S4/S5 pin functions.
    pub fn set_s_pin_modes(&self, s3: u8, s4: u8, s5: u8) -> Result<(), RoboClawError> {
        self.transact_write(cmd::SET_PIN_FUNCTIONS, &[s3, s4, s5])
    }

    // ─── Read Commands ──────────────────────────────────────────────

    /// Read an encoder count with its status flags.
    pub fn read_encoder_pos(&self, motor: u8) -> Result<EncoderPosition, RoboClawError> {
        let command = motor_cmd(motor, cmd::GET_M1_ENC, cmd::GET_M2_ENC)?;
        let payload = self.transact_read(command, 5)?;
        let mut reader = PayloadReader::new(&payload);
        let count = reader.i32()?;
        let flags = EncoderFlags::from_bits_truncate(reader.u8()?);
        Ok(EncoderPosition { count, flags })
    }

    /// Read an encoder speed: unsigned magnitude plus direction byte.
    pub fn read_encoder_speed(&self, motor: u8) -> Result<EncoderSpeed, RoboClawError> {
        let command = motor_cmd(motor, cmd::GET_M1_SPEED, cmd::GET_M2_SPEED)?;
        let payload = self.transact_read(command, 5)?;
        let mut reader = PayloadReader::new(&payload);
        let qpps = reader.u32()?;
        let direction = if reader.u8()? != 0 {
            rcc_common::telemetry::Direction::Backward
        } else {
            rcc_common::telemetry::Direction::Forward
        };
        Ok(EncoderSpeed { qpps, direction })
    }

    /// Read and decode the controller status value.
    pub fn read_status(&self) -> Result<ControllerStatus, RoboClawError> {
        let payload = self.transact_read(cmd::GET_ERROR, 4)?;
        let mut reader = PayloadReader::new(&payload);
        Ok(ControllerStatus::from_raw(reader.u32()?))
    }

    /// Read a battery voltage [V].
    pub fn read_batt_voltage(&self, battery: BatteryKind) -> Result<f64, RoboClawError> {
        let command = match battery {
            BatteryKind::Main => cmd::GET_MAIN_BATT,
            BatteryKind::Logic => cmd::GET_LOGIC_BATT,
        };
        let payload = self.transact_read(command, 2)?;
        Ok(PayloadReader::new(&payload).u16()? as f64 / 10.0)
    }

    /// Read both motor currents [A].
    pub fn read_currents(&self) -> Result<(f64, f64), RoboClawError> {
        let payload = self.transact_read(cmd::GET_CURRENTS, 4)?;
        let mut reader = PayloadReader::new(&payload);
        let m1 = reader.i16()? as f64 / 100.0;
        let m2 = reader.i16()? as f64 / 100.0;
        Ok((m1, m2))
    }

    /// Read the current [A] of one motor.
    pub fn read_motor_current(&self, motor: u8) -> Result<f64, RoboClawError> {
        let (m1, m2) = self.read_currents()?;
        match motor {
            1 => Ok(m1),
            2 => Ok(m2),
            other => Err(RoboClawError::InvalidMotor(other)),
        }
    }

    /// Read a temperature sensor [°C].
    pub fn read_temp_sensor(&self, sensor: u8) -> Result<f64, RoboClawError> {
        let command = match sensor {
            1 => cmd::GET_TEMP,
            2 => cmd::GET_TEMP2,
            other => {
                return Err(RoboClawError::ValueOutOfRange {
                    what: "temperature sensor",
                    value: other as i64,
                    max: 2,
                });
            }
        };
        let payload = self.transact_read(command, 2)?;
        Ok(PayloadReader::new(&payload).u16()? as f64 / 10.0)
    }

    /// Read the configured maximum speed [QPPS] of a motor.
    pub fn read_max_speed(&self, motor: u8) -> Result<u32, RoboClawError> {
        let command = motor_cmd(motor, cmd::READ_M1_PID, cmd::READ_M2_PID)?;
        let payload = self.transact_read(command, 16)?;
        let mut reader = PayloadReader::new(&payload);
        reader.u32()?;
        reader.u32()?;
        reader.u32()?;
        reader.u32()
    }

    /// Read the configured position range of a motor.
    pub fn read_range(&self, motor: u8) -> Result<(i32, i32), RoboClawError> {
        let command = motor_cmd(motor, cmd::READ_M1_POS_PID, cmd::READ_M2_POS_PID)?;
        let payload = self.transact_read(command, 28)?;
        let mut reader = PayloadReader::new(&payload);
        for _ in 0..5 {
            reader.u32()?;
        }
        let min = reader.i32()?;
        let max = reader.i32()?;
        Ok((min, max))
    }

    /// Read a motor position as a percentage across its configured range.
    ///
    /// Assumes a configured, non-empty range.
    pub fn read_position(&self, motor: u8) -> Result<f64, RoboClawError> {
        let encoder = self.read_encoder_pos(motor)?.count;
        let (min, max) = self.read_range(motor)?;
        Ok((encoder - min) as f64 / (max - min) as f64 * 100.0)
    }

    /// Read the firmware version string.
    ///
    /// The response is variable-length, terminated by `0x0A 0x00`, followed by
    /// the 2-byte CRC.
    pub fn read_version(&self) -> Result<String, RoboClawError> {
        let header = frame::command_header(self.address, cmd::GET_VERSION);
        self.with_port(|port| {
            port.clear(ClearBuffer::Input)
                .map_err(|e| RoboClawError::SerialIo(e.into()))?;
            port.write_all(&header)?;

            let mut response: Vec<u8> = Vec::new();
            let deadline = Instant::now() + READ_TIMEOUT;
            loop {
                let mut byte = [0u8; 1];
                match port.read(&mut byte) {
                    Ok(1) => {
                        response.push(byte[0]);
                        if response.ends_with(&[0x0A, 0x00]) {
                            break;
                        }
                    }
                    Ok(_) => {
                        if Instant::now() >= deadline {
                            return Err(RoboClawError::IncompleteRead {
                                expected: response.len() + 2,
                                got: response.len(),
                            });
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                        if Instant::now() >= deadline {
                            return Err(RoboClawError::IncompleteRead {
                                expected: response.len() + 2,
                                got: response.len(),
                            });
                        }
                    }
                    Err(e) => return Err(RoboClawError::SerialIo(e)),
                }
            }

            let mut crc_bytes = [0u8; 2];
            read_exact_deadline(port, &mut crc_bytes)?;

            let computed = frame::checksum_parts(&[header.as_slice(), response.as_slice()]);
            let received = u16::from_be_bytes(crc_bytes);
            if computed != received {
                return Err(RoboClawError::Crc { computed, received });
            }

            let text = String::from_utf8_lossy(&response);
            Ok(text.trim_end_matches(['\n', '\0']).to_string())
        })
    }

    /// Read the S3/S4/S5 pin functions.
    pub fn read_s_pin_modes(&self) -> Result<PinModes, RoboClawError> {
        let payload = self.transact_read(cmd::GET_PIN_FUNCTIONS, 5)?;
        Ok(PinModes {
            s3: PinMode::decode_s3(payload[0]),
            s4: PinMode::decode_s4(payload[1]),
            s5: PinMode::decode_s5(payload[2]),
        })
    }

    /// Read and decode the standard configuration mask.
    pub fn read_standard_config(&self) -> Result<StandardConfig, RoboClawError> {
        let payload = self.transact_read(cmd::GET_CONFIG, 2)?;
        Ok(StandardConfig::decode(PayloadReader::new(&payload).u16()?))
    }

    // ─── Transactions ───────────────────────────────────────────────

    /// Send a write frame and wait for the single acknowledgement byte.
    fn transact_write(&self, command: u8, payload: &[u8]) -> Result<(), RoboClawError> {
        let message = frame::write_frame(self.address, command, payload);
        self.with_port(|port| {
            port.write_all(&message)?;
            port.flush()?;

            let mut ack = [0u8; 1];
            read_exact_deadline(port, &mut ack)?;
            if ack[0] != ACK {
                return Err(RoboClawError::Ack(ack[0]));
            }
            Ok(())
        })
    }

    /// Send a read header and collect a fixed-length payload plus CRC.
    fn transact_read(&self, command: u8, len: usize) -> Result<Vec<u8>, RoboClawError> {
        let header = frame::command_header(self.address, command);
        self.with_port(|port| {
            port.clear(ClearBuffer::Input)
                .map_err(|e| RoboClawError::SerialIo(e.into()))?;
            port.write_all(&header)?;

            let mut response = vec![0u8; len + 2];
            read_exact_deadline(port, &mut response)?;

            let computed = frame::checksum_parts(&[header.as_slice(), &response[..len]]);
            let received = u16::from_be_bytes([response[len], response[len + 1]]);
            if computed != received {
                return Err(RoboClawError::Crc { computed, received });
            }

            response.truncate(len);
            Ok(response)
        })
    }
}

fn motor_cmd(motor: u8, m1: u8, m2: u8) -> Result<u8, RoboClawError> {
    match motor {
        1 => Ok(m1),
        2 => Ok(m2),
        other => Err(RoboClawError::InvalidMotor(other)),
    }
}

/// Fill `buf` from the port, tolerating inter-byte gaps up to the overall
/// read deadline. Short reads surface as `IncompleteRead`.
fn read_exact_deadline(port: &mut dyn SerialPort, buf: &mut [u8]) -> Result<(), RoboClawError> {
    let deadline = Instant::now() + READ_TIMEOUT;
    let mut filled = 0;
    while filled < buf.len() {
        match port.read(&mut buf[filled..]) {
            Ok(0) => {
                if Instant::now() >= deadline {
                    break;
                }
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                if Instant::now() >= deadline {
                    break;
                }
            }
            Err(e) => return Err(RoboClawError::SerialIo(e)),
        }
    }
    if filled < buf.len() {
        return Err(RoboClawError::IncompleteRead {
            expected: buf.len(),
            got: filled,
        });
    }
    Ok(())
}
