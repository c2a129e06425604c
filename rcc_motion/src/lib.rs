//! # Motor Controller Service
//!
//! Exclusive owner of the serial drive link. Runs a 50 Hz control loop on a
//! dedicated worker: executes the action of the current state (jog speed,
//! stop deceleration), polls the full telemetry set, publishes an atomic
//! snapshot, and evaluates state transitions from what it observed. Commands
//! and queries arrive from other threads through shared state and return
//! immediately.

pub mod link;
pub mod service;

pub use link::DriveLink;
pub use service::SerialMotorService;
