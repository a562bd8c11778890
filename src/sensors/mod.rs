//! Sensor subsystem.
//!
//! Only one analog channel: the EMG front end.  Reads happen once per loop
//! iteration while a session is active, so the effective sample rate is
//! whatever the loop achieves.

pub mod emg;
