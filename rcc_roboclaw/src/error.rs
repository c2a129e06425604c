//! Error types for the serial protocol adapter.

use thiserror::Error;

/// Errors raised by [`crate::RoboClaw`] operations.
#[derive(Debug, Error)]
pub enum RoboClawError {
    /// The serial port could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    SerialOpen {
        /// Device path.
        port: String,
        /// Underlying open failure.
        source: serialport::Error,
    },

    /// Mid-operation serial failure (port disconnected, write error).
    #[error("serial i/o error: {0}")]
    SerialIo(#[from] std::io::Error),

    /// Fewer bytes than expected arrived within the read deadline.
    #[error("incomplete read: expected {expected} bytes, got {got}")]
    IncompleteRead {
        /// Bytes required.
        expected: usize,
        /// Bytes actually received.
        got: usize,
    },

    /// Computed CRC does not match the CRC received with a response.
    #[error("crc mismatch: computed {computed:#06x}, received {received:#06x}")]
    Crc {
        /// CRC computed over the request header and response payload.
        computed: u16,
        /// CRC received on the wire.
        received: u16,
    },

    /// A write command was not acknowledged with 0xFF.
    #[error("write not acknowledged: expected 0xff, received {0:#04x}")]
    Ack(u8),

    /// Caller passed a motor number outside {1, 2}.
    #[error("invalid motor number: {0}")]
    InvalidMotor(u8),

    /// Caller passed a value outside the command's accepted range.
    #[error("{what} out of range: {value} (max {max})")]
    ValueOutOfRange {
        /// Which parameter.
        what: &'static str,
        /// Offending value.
        value: i64,
        /// Maximum accepted value.
        max: i64,
    },
}
