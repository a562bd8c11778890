//! Application core: pure domain logic, zero I/O.
//!
//! Session orchestration, flush policy, maintenance gating and status
//! throttling for the EMG logger.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
