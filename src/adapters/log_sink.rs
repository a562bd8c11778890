//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the `log` facade (UART / USB-CDC in production):
//!
//! ```text
//!   SESSION | started ts=5000 file=emg_log_5000.txt
//!   CLOCK   | sync timeout, timestamps unsynchronised
//! ```

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
    errors: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events rendered since boot.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Events that reported an [`Error`](crate::error::Error).
    pub fn errors(&self) -> u32 {
        self.errors
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        if let Some(err) = event.error() {
            self.errors = self.errors.wrapping_add(1);
            debug!("ERROR   | #{} {}", self.errors, err);
        }
        match event {
            AppEvent::Started { synchronized } => {
                info!("START   | clock_synchronised={}", synchronized);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE   | {:?} -> {:?}", from, to);
            }
            AppEvent::SessionStarted {
                start_timestamp,
                file_name,
            } => {
                if file_name.is_empty() {
                    warn!("SESSION | started ts={} without storage", start_timestamp);
                } else {
                    info!("SESSION | started ts={} file={}", start_timestamp, file_name);
                }
            }
            AppEvent::SessionStopped {
                start_timestamp,
                stats,
            } => {
                info!(
                    "SESSION | stopped ts={} samples={} syncs={} write_failures={}",
                    start_timestamp, stats.samples, stats.syncs, stats.write_failures
                );
            }
            AppEvent::StorageOpenFailed => {
                warn!("STORAGE | open failed, sampling without persistence");
            }
            AppEvent::StorageWriteFailed { timestamp } => {
                warn!("STORAGE | write failed at ts={}", timestamp);
            }
            AppEvent::Flushed { samples_in_session } => {
                info!("STORAGE | synced after {} samples", samples_in_session);
            }
            AppEvent::ClockSynced { epoch_ms } => {
                info!("CLOCK   | synchronised, now={}ms", epoch_ms);
            }
            AppEvent::ClockSyncTimeout => {
                warn!("CLOCK   | sync timeout, timestamps unsynchronised");
            }
            AppEvent::LinkUnavailable(state) => {
                warn!("LINK    | down ({:?}), reconnecting", state);
            }
            AppEvent::LinkRecovered => {
                info!("LINK    | recovered");
            }
            AppEvent::UploadSubmitted { count } => {
                info!("UPLOAD  | {} records accepted", count);
            }
            AppEvent::UploadFailed(e) => {
                warn!("UPLOAD  | batch dropped: {}", e);
            }
        }
    }
}
