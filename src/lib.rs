//! EMG logger firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod fsm;
pub mod sample_buffer;
pub mod scheduler;
pub mod status;

pub mod pins;

// Adapters and drivers compile on both targets; the hardware paths are
// gated inside each module.
pub mod adapters;
pub mod drivers;
pub mod sensors;
