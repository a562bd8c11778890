//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::app::ports::LinkState;
use crate::error::{Error, UploadError};
use crate::fsm::StateId;

/// Per-session counters reported when the session closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Samples captured, persisted or not.
    pub samples: u64,
    /// Forced durable syncs, including the final one at close.
    pub syncs: u32,
    /// Appends or syncs the storage collaborator rejected.
    pub write_failures: u32,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started; carries the outcome of the boot resync.
    Started { synchronized: bool },

    /// The session machine moved between states.
    StateChanged { from: StateId, to: StateId },

    /// A session opened.  `file_name` is empty when storage failed.
    SessionStarted {
        start_timestamp: u64,
        file_name: heapless::String<48>,
    },

    /// A session closed.
    SessionStopped {
        start_timestamp: u64,
        stats: SessionStats,
    },

    /// The session log could not be opened; sampling continues without
    /// persistence.
    StorageOpenFailed,

    /// An append or sync failed; the next sample tries again.
    StorageWriteFailed { timestamp: u64 },

    /// The periodic durable sync ran.
    Flushed { samples_in_session: u64 },

    /// Network time applied.
    ClockSynced { epoch_ms: u64 },

    /// Network time did not answer plausibly within the timeout.
    ClockSyncTimeout,

    /// The link was found down at a gated check.
    LinkUnavailable(LinkState),

    /// A reconnect attempt brought the link back.
    LinkRecovered,

    /// An upload batch was accepted.
    UploadSubmitted { count: usize },

    /// An upload batch was rejected or never arrived.  Not retried.
    UploadFailed(UploadError),
}

impl AppEvent {
    /// The firmware error this event reports, if it reports one.
    pub fn error(&self) -> Option<Error> {
        match self {
            Self::StorageOpenFailed => Some(Error::StorageOpenFailed),
            Self::StorageWriteFailed { .. } => Some(Error::StorageWriteFailed),
            Self::ClockSyncTimeout => Some(Error::ClockSyncTimeout),
            Self::LinkUnavailable(_) => Some(Error::LinkUnavailable),
            Self::UploadFailed(e) => Some(Error::from(*e)),
            _ => None,
        }
    }
}
