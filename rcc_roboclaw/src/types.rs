//! Typed decodings of RoboClaw response payloads.

use std::fmt;

use bitflags::bitflags;
use rcc_common::telemetry::Direction;

bitflags! {
    /// Status byte attached to an encoder count reading.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EncoderFlags: u8 {
        /// Counter underflow occurred (cleared by the read).
        const UNDERFLOW = 0x01;
        /// Counting backward.
        const BACKWARD  = 0x02;
        /// Counter overflow occurred (cleared by the read).
        const OVERFLOW  = 0x04;
    }
}

/// Encoder count reading with status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderPosition {
    /// Signed encoder count.
    pub count: i32,
    /// Decoded status bits.
    pub flags: EncoderFlags,
}

impl EncoderPosition {
    /// Whether the counter underflowed since the last read.
    #[inline]
    pub const fn underflow(&self) -> bool {
        self.flags.contains(EncoderFlags::UNDERFLOW)
    }

    /// Whether the counter overflowed since the last read.
    #[inline]
    pub const fn overflow(&self) -> bool {
        self.flags.contains(EncoderFlags::OVERFLOW)
    }

    /// Count direction at the time of the read.
    #[inline]
    pub const fn direction(&self) -> Direction {
        if self.flags.contains(EncoderFlags::BACKWARD) {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// Encoder speed reading: unsigned magnitude plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSpeed {
    /// Speed magnitude [QPPS].
    pub qpps: u32,
    /// Direction of rotation.
    pub direction: Direction,
}

impl EncoderSpeed {
    /// Signed speed [QPPS]: negative when running backward.
    #[inline]
    pub const fn signed_qpps(&self) -> i64 {
        self.qpps as i64 * self.direction.sign()
    }
}

/// Which battery input to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryKind {
    /// Main (motor) battery.
    Main,
    /// Logic battery.
    Logic,
}

// ─── S3/S4/S5 Pin Modes ─────────────────────────────────────────────

/// Configured function of an S3/S4/S5 pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// S3 factory default.
    Default,
    /// Pin disabled.
    Disabled,
    /// E-Stop input.
    EStop,
    /// Latching E-Stop input.
    EStopLatching,
    /// Voltage clamp output.
    VoltageClamp,
    /// RS485 direction output.
    Rs485Direction,
    /// Encoder toggle input.
    EncoderToggle,
    /// Brake output.
    Brake,
    /// Automatic homing input.
    HomeAuto,
    /// User homing input.
    HomeUser,
    /// Automatic homing + forward limit.
    HomeAutoLimitFwd,
    /// User homing + forward limit.
    HomeUserLimitFwd,
    /// Forward limit input.
    LimitFwd,
    /// Reverse limit input.
    LimitRev,
    /// Dual-direction limit input.
    LimitBoth,
    /// Mode byte not in this pin's table.
    Unknown(u8),
}

impl PinMode {
    /// Decode an S3 mode byte.
    pub const fn decode_s3(raw: u8) -> Self {
        match raw {
            0x00 => Self::Default,
            0x01 => Self::EStop,
            0x81 => Self::EStopLatching,
            0x14 => Self::VoltageClamp,
            0x24 => Self::Rs485Direction,
            0x84 => Self::EncoderToggle,
            0x04 => Self::Brake,
            0xE2 => Self::HomeAuto,
            0x62 => Self::HomeUser,
            0xF2 => Self::HomeAutoLimitFwd,
            0x72 => Self::HomeUserLimitFwd,
            0x12 => Self::LimitFwd,
            0x22 => Self::LimitRev,
            0x32 => Self::LimitBoth,
            other => Self::Unknown(other),
        }
    }

    /// Decode an S4 mode byte.
    pub const fn decode_s4(raw: u8) -> Self {
        match raw {
            0x00 => Self::Disabled,
            0x01 => Self::EStop,
            0x81 => Self::EStopLatching,
            0x14 => Self::VoltageClamp,
            0x04 => Self::Brake,
            0x62 => Self::HomeUser,
            0xF2 => Self::HomeAutoLimitFwd,
            0x72 => Self::HomeUserLimitFwd,
            0x12 => Self::LimitFwd,
            0x22 => Self::LimitRev,
            0x32 => Self::LimitBoth,
            other => Self::Unknown(other),
        }
    }

    /// Decode an S5 mode byte.
    pub const fn decode_s5(raw: u8) -> Self {
        match raw {
            0x00 => Self::Disabled,
            0x01 => Self::EStop,
            0x81 => Self::EStopLatching,
            0x14 => Self::VoltageClamp,
            0x62 => Self::HomeUser,
            0xF2 => Self::HomeAutoLimitFwd,
            0x72 => Self::HomeUserLimitFwd,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Default => "Default",
            Self::Disabled => "Disabled",
            Self::EStop => "E-Stop",
            Self::EStopLatching => "E-Stop(Latching)",
            Self::VoltageClamp => "Voltage Clamp",
            Self::Rs485Direction => "RS485 Direction",
            Self::EncoderToggle => "Encoder toggle",
            Self::Brake => "Brake",
            Self::HomeAuto => "Home(Auto)",
            Self::HomeUser => "Home(User)",
            Self::HomeAutoLimitFwd => "Home(Auto)/Limit(Fwd)",
            Self::HomeUserLimitFwd => "Home(User)/Limit(Fwd)",
            Self::LimitFwd => "Limit(Fwd)",
            Self::LimitRev => "Limit(Rev)",
            Self::LimitBoth => "Limit(Both)",
            Self::Unknown(raw) => return write!(f, "Unknown (0x{raw:02X})"),
        };
        f.write_str(text)
    }
}

/// Decoded S3/S4/S5 pin functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinModes {
    /// S3 function.
    pub s3: PinMode,
    /// S4 function.
    pub s4: PinMode,
    /// S5 function.
    pub s5: PinMode,
}

// ─── Standard Configuration ─────────────────────────────────────────

/// Serial mode group (bits 0-1 of the configuration mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialMode {
    /// RC pulse input.
    Rc,
    /// Analog input.
    Analog,
    /// Simple serial.
    SimpleSerial,
    /// Packet serial.
    PacketSerial,
}

/// Battery cutoff group (bits 2-4 of the configuration mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryMode {
    /// Cutoff disabled.
    Off,
    /// Automatic detection.
    Auto,
    /// Fixed 2-cell cutoff.
    Cells2,
    /// Fixed 3-cell cutoff.
    Cells3,
    /// Fixed 4-cell cutoff.
    Cells4,
    /// Fixed 5-cell cutoff.
    Cells5,
    /// Fixed 6-cell cutoff.
    Cells6,
    /// Fixed 7-cell cutoff.
    Cells7,
}

/// Configured baud rate group (bits 5-7 of the configuration mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    /// 2400 baud.
    B2400,
    /// 9600 baud.
    B9600,
    /// 19200 baud.
    B19200,
    /// 38400 baud.
    B38400,
    /// 57600 baud.
    B57600,
    /// 115200 baud.
    B115200,
    /// 230400 baud.
    B230400,
    /// 460800 baud.
    B460800,
}

impl BaudRate {
    /// Baud rate in bits per second.
    pub const fn bps(&self) -> u32 {
        match self {
            Self::B2400 => 2_400,
            Self::B9600 => 9_600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
            Self::B460800 => 460_800,
        }
    }
}

bitflags! {
    /// Single-bit options in the standard configuration mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConfigFlags: u16 {
        /// Flip switch behavior enabled.
        const FLIP_SWITCH   = 0x0100;
        /// Slave mode.
        const SLAVE_MODE    = 0x0800;
        /// Relay mode.
        const RELAY_MODE    = 0x1000;
        /// Encoders swapped.
        const SWAP_ENCODERS = 0x2000;
        /// Buttons swapped.
        const SWAP_BUTTONS  = 0x4000;
        /// Multi-unit mode.
        const MULTI_UNIT    = 0x8000;
    }
}

/// Decoded standard configuration.
///
/// Each mutually-exclusive group decodes to exactly one enum value; the
/// single-bit options land in `flags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardConfig {
    /// Serial mode group.
    pub serial_mode: SerialMode,
    /// Battery cutoff group.
    pub battery_mode: BatteryMode,
    /// Baud rate group.
    pub baud_rate: BaudRate,
    /// Packet-serial address (0x80..=0x87).
    pub packet_address: u8,
    /// Single-bit options.
    pub flags: ConfigFlags,
}

impl StandardConfig {
    /// Decode the 16-bit standard configuration mask.
    pub fn decode(mask: u16) -> Self {
        let serial_mode = match mask & 0x0003 {
            0x0000 => SerialMode::Rc,
            0x0001 => SerialMode::Analog,
            0x0002 => SerialMode::SimpleSerial,
            _ => SerialMode::PacketSerial,
        };
        let battery_mode = match mask & 0x001C {
            0x0000 => BatteryMode::Off,
            0x0004 => BatteryMode::Auto,
            0x0008 => BatteryMode::Cells2,
            0x000C => BatteryMode::Cells3,
            0x0010 => BatteryMode::Cells4,
            0x0014 => BatteryMode::Cells5,
            0x0018 => BatteryMode::Cells6,
            _ => BatteryMode::Cells7,
        };
        let baud_rate = match mask & 0x00E0 {
            0x0000 => BaudRate::B2400,
            0x0020 => BaudRate::B9600,
            0x0040 => BaudRate::B19200,
            0x0060 => BaudRate::B38400,
            0x0080 => BaudRate::B57600,
            0x00A0 => BaudRate::B115200,
            0x00C0 => BaudRate::B230400,
            _ => BaudRate::B460800,
        };
        Self {
            serial_mode,
            battery_mode,
            baud_rate,
            packet_address: 0x80 + ((mask & 0x0700) >> 8) as u8,
            flags: ConfigFlags::from_bits_truncate(mask),
        }
    }
}
