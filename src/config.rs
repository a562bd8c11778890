//! System configuration parameters
//!
//! All tunable parameters for the EMG logger.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Inputs ---
    /// Minimum stable-level time before a button edge is trusted (ms)
    pub debounce_ms: u32,

    // --- Acquisition ---
    /// Force a durable sync of the session log every N samples
    pub flush_every_samples: u32,
    /// Highest raw value the EMG ADC can report (12-bit = 4095)
    pub adc_max: u16,

    // --- Maintenance ---
    /// Link check-and-recover interval (seconds)
    pub link_check_interval_secs: u32,
    /// Network clock resync interval (seconds)
    pub clock_resync_interval_secs: u32,
    /// Upper bound on one blocking clock resync (seconds)
    pub clock_sync_timeout_secs: u32,

    // --- Status display ---
    /// Character rows on the status display
    pub display_rows: u8,
    /// Character columns on the status display
    pub display_cols: u8,

    // --- Session logs ---
    /// Log file name prefix; the session start timestamp follows it
    pub log_file_prefix: heapless::String<16>,
    /// Log file extension, including the dot
    pub log_file_ext: heapless::String<8>,

    // --- Upload (optional) ---
    /// Submit sample batches to the backend in addition to local logging
    pub upload_enabled: bool,
    /// Samples per upload batch
    pub upload_batch_size: u16,
    /// Batch endpoint URL
    pub upload_endpoint: heapless::String<96>,
    /// Upper bound on one upload request (milliseconds)
    pub upload_timeout_ms: u32,
}

fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Inputs
            debounce_ms: 20,

            // Acquisition
            flush_every_samples: 1500,
            adc_max: 4095,

            // Maintenance
            link_check_interval_secs: 10,    // 0.1 Hz
            clock_resync_interval_secs: 3600, // hourly
            clock_sync_timeout_secs: 30,

            // Status display (16x2 character LCD)
            display_rows: 2,
            display_cols: 16,

            // Session logs
            log_file_prefix: bounded("emg_log_"),
            log_file_ext: bounded(".txt"),

            // Upload
            upload_enabled: false,
            upload_batch_size: 100,
            upload_endpoint: bounded("http://emg-backend.local:8000/emg/records"),
            upload_timeout_ms: 5000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=500).contains(&self.debounce_ms) {
            return Err(ConfigError::ValidationFailed("debounce_ms must be 1–500"));
        }
        if !(1..=100_000).contains(&self.flush_every_samples) {
            return Err(ConfigError::ValidationFailed(
                "flush_every_samples must be 1–100000",
            ));
        }
        if self.adc_max == 0 || self.adc_max > i16::MAX as u16 {
            return Err(ConfigError::ValidationFailed("adc_max must be 1–32767"));
        }
        if !(1..=3600).contains(&self.link_check_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "link_check_interval_secs must be 1–3600",
            ));
        }
        if !(60..=86_400).contains(&self.clock_resync_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "clock_resync_interval_secs must be 60–86400",
            ));
        }
        if !(1..=120).contains(&self.clock_sync_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "clock_sync_timeout_secs must be 1–120",
            ));
        }
        if !(1..=4).contains(&self.display_rows) || !(8..=40).contains(&self.display_cols) {
            return Err(ConfigError::ValidationFailed(
                "display grid must be 1–4 rows by 8–40 columns",
            ));
        }
        if self.log_file_prefix.is_empty() {
            return Err(ConfigError::ValidationFailed("log_file_prefix must not be empty"));
        }
        if self
            .log_file_prefix
            .chars()
            .chain(self.log_file_ext.chars())
            .any(|c| matches!(c, '/' | '\\' | ',' | '\n'))
        {
            return Err(ConfigError::ValidationFailed(
                "log file name parts must not contain separators",
            ));
        }
        if self.upload_batch_size == 0 || self.upload_batch_size > 1000 {
            return Err(ConfigError::ValidationFailed("upload_batch_size must be 1–1000"));
        }
        if self.upload_enabled && !self.upload_endpoint.starts_with("http") {
            return Err(ConfigError::ValidationFailed(
                "upload_endpoint must be an http(s) URL",
            ));
        }
        if !(100..=60_000).contains(&self.upload_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "upload_timeout_ms must be 100–60000",
            ));
        }
        Ok(())
    }

    /// Link check interval in milliseconds.
    pub fn link_check_interval_ms(&self) -> u64 {
        u64::from(self.link_check_interval_secs) * 1000
    }

    /// Clock resync interval in milliseconds.
    pub fn clock_resync_interval_ms(&self) -> u64 {
        u64::from(self.clock_resync_interval_secs) * 1000
    }

    /// Clock resync timeout in milliseconds.
    pub fn clock_sync_timeout_ms(&self) -> u32 {
        self.clock_sync_timeout_secs * 1000
    }
}
