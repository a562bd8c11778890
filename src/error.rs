//! Unified error types for the EMG logger firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! main loop's error handling uniform.  None of these are fatal: the
//! acquisition loop logs them, surfaces them, and keeps running.
//! All variants are `Copy` so they can be passed through events and the
//! status surface without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The session log target could not be opened; the session samples
    /// without persistence.
    StorageOpenFailed,
    /// An append, sync or close on the open log target failed.
    StorageWriteFailed,
    /// The network time reference never answered plausibly.
    ClockSyncTimeout,
    /// The network link is down or could not be recovered.
    LinkUnavailable,
    /// The status display rejected a write.
    Display(DisplayError),
    /// A batch upload failed.
    Upload(UploadError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageOpenFailed => write!(f, "storage open failed"),
            Self::StorageWriteFailed => write!(f, "storage write failed"),
            Self::ClockSyncTimeout => write!(f, "clock sync timed out"),
            Self::LinkUnavailable => write!(f, "network link unavailable"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Upload(e) => write!(f, "upload: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from the session log storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage medium missing or not mounted.
    NotMounted,
    /// The target could not be created.
    OpenFailed,
    /// A target is already open (one session at a time).
    AlreadyOpen,
    /// The handle does not name the open target.
    InvalidHandle,
    /// Appending a record failed.
    WriteFailed,
    /// Forcing buffered data to the medium failed.
    SyncFailed,
    /// Closing the target failed.
    CloseFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMounted => write!(f, "storage medium not mounted"),
            Self::OpenFailed => write!(f, "open failed"),
            Self::AlreadyOpen => write!(f, "a log target is already open"),
            Self::InvalidHandle => write!(f, "invalid log handle"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::SyncFailed => write!(f, "sync failed"),
            Self::CloseFailed => write!(f, "close failed"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotMounted | StorageError::OpenFailed | StorageError::AlreadyOpen => {
                Self::StorageOpenFailed
            }
            _ => Self::StorageWriteFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The reference did not report a plausible time within the timeout.
    Timeout,
    /// The time service could not be started (no link, init failure).
    Unavailable,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "time reference timed out"),
            Self::Unavailable => write!(f, "time service unavailable"),
        }
    }
}

impl From<ClockError> for Error {
    fn from(_: ClockError) -> Self {
        Self::ClockSyncTimeout
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    AuthFailed,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::AuthFailed => write!(f, "WiFi authentication failed"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(_: LinkError) -> Self {
        Self::LinkUnavailable
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// The panel did not acknowledge (bus error, not attached).
    Unavailable,
    /// The write starts outside the character grid.
    OutOfBounds,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "display unavailable"),
            Self::OutOfBounds => write!(f, "write outside character grid"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Upload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    /// Batch could not be serialised.
    Encode,
    /// Transport failed before a status was received (timeout, refused).
    Transport,
    /// The backend answered with a non-success status code.
    Rejected(u16),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "payload encoding failed"),
            Self::Transport => write!(f, "transport error"),
            Self::Rejected(status) => write!(f, "rejected with HTTP {status}"),
        }
    }
}

impl From<UploadError> for Error {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
