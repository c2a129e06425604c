//! # RCC Common Library
//!
//! This crate provides the shared types and definitions for all ride control
//! workspace crates.
//!
//! # Module Structure
//!
//! - [`panel`] - Operator panel events and the event source contract
//! - [`status`] - Motor controller status decoding
//! - [`telemetry`] - Cached motion telemetry snapshot types
//! - [`motor`] - Motor controller state machine and service contract
//! - [`show`] - Show controller contract
//! - [`hmi`] - Read-only telemetry contract for the external HMI
//! - [`config`] - TOML configuration loading
//! - [`timing`] - Loop timer and shutdown signaling

pub mod config;
pub mod hmi;
pub mod motor;
pub mod panel;
pub mod show;
pub mod status;
pub mod telemetry;
pub mod timing;
