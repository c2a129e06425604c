//! Pure frame codec: CRC computation, frame assembly, big-endian payload
//! reading.
//!
//! Wire format: writes are `[address, cmd, payload…, crc_hi, crc_lo]`
//! acknowledged with a single 0xFF byte; reads are `[address, cmd]` answered
//! with `[payload…, crc_hi, crc_lo]` where the CRC covers the outgoing header
//! plus the payload. The CRC is CRC-CCITT (XMODEM): polynomial 0x1021,
//! initial 0x0000, no reflection, no final XOR.

use crc16::{State, XMODEM};

use crate::error::RoboClawError;

/// CRC over a single byte run.
pub fn checksum(bytes: &[u8]) -> u16 {
    State::<XMODEM>::calculate(bytes)
}

/// CRC over several byte runs, without concatenating them.
pub fn checksum_parts(parts: &[&[u8]]) -> u16 {
    let mut state = State::<XMODEM>::new();
    for part in parts {
        state.update(part);
    }
    state.get()
}

/// Two-byte request header for a read or write command.
#[inline]
pub fn command_header(address: u8, cmd: u8) -> [u8; 2] {
    [address, cmd]
}

/// Assemble a complete write frame: header, payload, trailing CRC.
pub fn write_frame(address: u8, cmd: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(address);
    frame.push(cmd);
    frame.extend_from_slice(payload);
    let crc = checksum(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Sequential big-endian reader over a response payload.
pub struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    /// Wrap a payload slice.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], RoboClawError> {
        let end = self.pos + N;
        let bytes: [u8; N] = self
            .buf
            .get(self.pos..end)
            .and_then(|s| s.try_into().ok())
            .ok_or(RoboClawError::IncompleteRead {
                expected: end,
                got: self.buf.len(),
            })?;
        self.pos = end;
        Ok(bytes)
    }

    /// Next unsigned byte.
    pub fn u8(&mut self) -> Result<u8, RoboClawError> {
        Ok(self.take::<1>()?[0])
    }

    /// Next big-endian u16.
    pub fn u16(&mut self) -> Result<u16, RoboClawError> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    /// Next big-endian i16.
    pub fn i16(&mut self) -> Result<i16, RoboClawError> {
        Ok(i16::from_be_bytes(self.take()?))
    }

    /// Next big-endian u32.
    pub fn u32(&mut self) -> Result<u32, RoboClawError> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    /// Next big-endian i32.
    pub fn i32(&mut self) -> Result<i32, RoboClawError> {
        Ok(i32::from_be_bytes(self.take()?))
    }
}
