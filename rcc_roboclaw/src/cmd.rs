//! RoboClaw packet-serial command numbers.
//!
//! Only the subset of the command set used by this adapter.

/// Read motor 1 encoder count and status.
pub const GET_M1_ENC: u8 = 16;
/// Read motor 2 encoder count and status.
pub const GET_M2_ENC: u8 = 17;
/// Read motor 1 encoder speed.
pub const GET_M1_SPEED: u8 = 18;
/// Read motor 2 encoder speed.
pub const GET_M2_SPEED: u8 = 19;
/// Read firmware version string.
pub const GET_VERSION: u8 = 21;
/// Set motor 1 encoder count.
pub const SET_M1_ENC_COUNT: u8 = 22;
/// Set motor 2 encoder count.
pub const SET_M2_ENC_COUNT: u8 = 23;
/// Read main battery voltage.
pub const GET_MAIN_BATT: u8 = 24;
/// Read logic battery voltage.
pub const GET_LOGIC_BATT: u8 = 25;
/// Drive motor 1 with signed speed and acceleration.
pub const M1_SPEED_ACCEL: u8 = 38;
/// Drive motor 2 with signed speed and acceleration.
pub const M2_SPEED_ACCEL: u8 = 39;
/// Read both motor currents.
pub const GET_CURRENTS: u8 = 49;
/// Read motor 1 velocity PID and max speed.
pub const READ_M1_PID: u8 = 55;
/// Read motor 2 velocity PID and max speed.
pub const READ_M2_PID: u8 = 56;
/// Read motor 1 position PID and range.
pub const READ_M1_POS_PID: u8 = 63;
/// Read motor 2 position PID and range.
pub const READ_M2_POS_PID: u8 = 64;
/// Drive motor 1 to a position with speed/accel/decel.
pub const M1_SPEED_ACCEL_DECCEL_POS: u8 = 65;
/// Drive motor 2 to a position with speed/accel/decel.
pub const M2_SPEED_ACCEL_DECCEL_POS: u8 = 66;
/// Set S3/S4/S5 pin functions.
pub const SET_PIN_FUNCTIONS: u8 = 74;
/// Read S3/S4/S5 pin functions.
pub const GET_PIN_FUNCTIONS: u8 = 75;
/// Read temperature sensor 1.
pub const GET_TEMP: u8 = 82;
/// Read temperature sensor 2.
pub const GET_TEMP2: u8 = 83;
/// Read the controller status value.
pub const GET_ERROR: u8 = 90;
/// Read the standard configuration bitmask.
pub const GET_CONFIG: u8 = 99;
