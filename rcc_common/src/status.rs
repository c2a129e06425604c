//! Motor controller status decoding.
//!
//! The controller reports its health as a 32-bit value. Each known value maps
//! to one [`ControllerStatus`] variant; anything else decodes to
//! [`ControllerStatus::Unknown`]. The supervisor compares by variant, never
//! by string.

use std::fmt;

/// Decoded motor controller status.
///
/// `Offline` is the cache-initial value before the first successful telemetry
/// poll; it is never produced by [`ControllerStatus::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerStatus {
    /// No telemetry received yet.
    #[default]
    Offline,
    /// All clear.
    Normal,
    /// Hardware E-Stop input active.
    EStop,
    /// Temperature sensor 1 over limit.
    TemperatureError,
    /// Temperature sensor 2 over limit.
    Temperature2Error,
    /// Main battery voltage over limit.
    MainVoltageHighError,
    /// Logic battery voltage over limit.
    LogicVoltageHighError,
    /// Logic battery voltage under limit.
    LogicVoltageLowError,
    /// Motor 1 driver fault.
    M1DriverFault,
    /// Motor 2 driver fault.
    M2DriverFault,
    /// Motor 1 speed error.
    M1SpeedError,
    /// Motor 2 speed error.
    M2SpeedError,
    /// Motor 1 position error.
    M1PositionError,
    /// Motor 2 position error.
    M2PositionError,
    /// Motor 1 current error.
    M1CurrentError,
    /// Motor 2 current error.
    M2CurrentError,
    /// Motor 1 over-current warning.
    M1OverCurrentWarning,
    /// Motor 2 over-current warning.
    M2OverCurrentWarning,
    /// Main battery voltage high warning.
    MainVoltageHighWarning,
    /// Main battery voltage low warning.
    MainVoltageLowWarning,
    /// Temperature sensor 1 warning.
    TemperatureWarning,
    /// Temperature sensor 2 warning.
    Temperature2Warning,
    /// S4 input signal triggered.
    S4SignalTriggered,
    /// S5 input signal triggered.
    S5SignalTriggered,
    /// Speed error limit warning.
    SpeedErrorLimitWarning,
    /// Position error limit warning.
    PositionErrorLimitWarning,
    /// Unrecognized status value, carried raw.
    Unknown(u32),
}

impl ControllerStatus {
    /// Decode the raw 32-bit status value reported by the controller.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0x0000_0000 => Self::Normal,
            0x0000_0001 => Self::EStop,
            0x0000_0002 => Self::TemperatureError,
            0x0000_0004 => Self::Temperature2Error,
            0x0000_0008 => Self::MainVoltageHighError,
            0x0000_0010 => Self::LogicVoltageHighError,
            0x0000_0020 => Self::LogicVoltageLowError,
            0x0000_0040 => Self::M1DriverFault,
            0x0000_0080 => Self::M2DriverFault,
            0x0000_0100 => Self::M1SpeedError,
            0x0000_0200 => Self::M2SpeedError,
            0x0000_0400 => Self::M1PositionError,
            0x0000_0800 => Self::M2PositionError,
            0x0000_1000 => Self::M1CurrentError,
            0x0000_2000 => Self::M2CurrentError,
            0x0001_0000 => Self::M1OverCurrentWarning,
            0x0002_0000 => Self::M2OverCurrentWarning,
            0x0004_0000 => Self::MainVoltageHighWarning,
            0x0008_0000 => Self::MainVoltageLowWarning,
            0x0010_0000 => Self::TemperatureWarning,
            0x0020_0000 => Self::Temperature2Warning,
            0x0040_0000 => Self::S4SignalTriggered,
            0x0080_0000 => Self::S5SignalTriggered,
            0x0100_0000 => Self::SpeedErrorLimitWarning,
            0x0200_0000 => Self::PositionErrorLimitWarning,
            other => Self::Unknown(other),
        }
    }

    /// True when the controller reports no fault or warning.
    #[inline]
    pub const fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// True when the hardware E-Stop input is active.
    #[inline]
    pub const fn is_estop(&self) -> bool {
        matches!(self, Self::EStop)
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Offline => "Offline",
            Self::Normal => "Normal",
            Self::EStop => "E-Stop",
            Self::TemperatureError => "Temperature Error",
            Self::Temperature2Error => "Temperature 2 Error",
            Self::MainVoltageHighError => "Main Voltage High Error",
            Self::LogicVoltageHighError => "Logic Voltage High Error",
            Self::LogicVoltageLowError => "Logic Voltage Low Error",
            Self::M1DriverFault => "M1 Driver Fault Error",
            Self::M2DriverFault => "M2 Driver Fault Error",
            Self::M1SpeedError => "M1 Speed Error",
            Self::M2SpeedError => "M2 Speed Error",
            Self::M1PositionError => "M1 Position Error",
            Self::M2PositionError => "M2 Position Error",
            Self::M1CurrentError => "M1 Current Error",
            Self::M2CurrentError => "M2 Current Error",
            Self::M1OverCurrentWarning => "M1 Over Current Warning",
            Self::M2OverCurrentWarning => "M2 Over Current Warning",
            Self::MainVoltageHighWarning => "Main Voltage High Warning",
            Self::MainVoltageLowWarning => "Main Voltage Low Warning",
            Self::TemperatureWarning => "Temperature Warning",
            Self::Temperature2Warning => "Temperature 2 Warning",
            Self::S4SignalTriggered => "S4 Signal Triggered",
            Self::S5SignalTriggered => "S5 Signal Triggered",
            Self::SpeedErrorLimitWarning => "Speed Error Limit Warning",
            Self::PositionErrorLimitWarning => "Position Error Limit Warning",
            Self::Unknown(raw) => return write!(f, "Unknown Error: {raw}"),
        };
        f.write_str(text)
    }
}
