//! # Ride Control Computer
//!
//! The supervisory core of the ride: arbitrates between the operator panel,
//! the safety interlock logic, and the motor controller service, and keeps
//! the show controller in step. The supervisor runs a soft real-time loop on
//! the main thread; the motor controller service and the panel producer run
//! on their own workers.

pub mod hmi;
pub mod panel;
pub mod safety;
pub mod show;
pub mod supervisor;

pub use supervisor::RideSupervisor;
