//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (buttons, ADC, clock, storage, network, display) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes them
//! via generics, so the domain core never touches hardware directly.
//!
//! ## Ownership notes
//!
//! - **LogStoragePort** has exactly one caller: the session state machine
//!   inside `AppService`.  At most one target is open at a time.
//! - **DisplayPort** writes are fire-and-forget; the caller logs errors and
//!   carries on.
//! - All port errors are typed; callers must handle every variant explicitly.

use crate::config::SystemConfig;
use crate::error::{ClockError, DisplayError, LinkError, StorageError, UploadError};
use crate::sample_buffer::Sample;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: buttons → domain)
// ───────────────────────────────────────────────────────────────

/// The two momentary control inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputId {
    Start,
    Stop,
}

/// Read-side port for the raw (bouncy) button levels.
pub trait InputPort {
    /// Instantaneous level of `input`: `true` = pressed.
    fn is_pressed(&mut self, input: InputId) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Sample port (driven adapter: EMG front end → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the analog biosignal.
pub trait SamplePort {
    /// Take one raw ADC reading (0 ..= ADC full scale).
    fn read_sample(&mut self) -> i16;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: timers / RTC → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock reading with sub-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallTime {
    /// Seconds since the Unix epoch.
    pub secs: u64,
    /// Milliseconds within the current second (0–999).
    pub sub_ms: u16,
}

/// Monotonic counter plus wall clock.
pub trait ClockPort {
    /// Free-running milliseconds since boot.  Never goes backwards.
    fn uptime_ms(&self) -> u64;

    /// Current wall-clock time.  Implausibly small until network time
    /// has been applied at least once.
    fn wall_time(&self) -> WallTime;
}

/// Network-time collaborator.
pub trait TimeSyncPort {
    /// Contact the time reference and set the wall clock.
    ///
    /// Blocks for at most `timeout_ms`.  Succeeds only once the source
    /// reports a plausible absolute time.
    fn sync_clock(&mut self, timeout_ms: u32) -> Result<(), ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: WiFi → domain)
// ───────────────────────────────────────────────────────────────

/// Network link state as reported by the radio driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Associated and has an IP.
    Connected,
    /// Association in progress.
    Connecting,
    /// Was connected, lost the AP.
    Disconnected,
    /// Last connection attempt failed.
    Failed,
    /// Radio idle, never started.
    Idle,
}

/// Best-effort network link.
pub trait LinkPort {
    fn status(&self) -> LinkState;

    /// Drop and re-establish the link.  May block for the radio's own
    /// association delay.
    fn reconnect(&mut self) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Log storage port (driven adapter: domain → SD card)
// ───────────────────────────────────────────────────────────────

/// Opaque handle to the open session log target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHandle(pub u32);

/// Append-only session log storage.
///
/// Records are appended immediately; `sync` forces everything appended so
/// far onto the medium.  Opening a name that exists appends to it.
pub trait LogStoragePort {
    fn open(&mut self, name: &str) -> Result<LogHandle, StorageError>;

    fn append(&mut self, handle: LogHandle, record: &str) -> Result<(), StorageError>;

    fn sync(&mut self, handle: LogHandle) -> Result<(), StorageError>;

    /// Close the target.  Data appended before the close is durable
    /// afterwards.
    fn close(&mut self, handle: LogHandle) -> Result<(), StorageError>;

    /// Re-initialise the storage link (bus + filesystem) after a
    /// disturbance.  An open target stays valid.
    fn reinit(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → character display)
// ───────────────────────────────────────────────────────────────

/// Fixed-size character grid.
pub trait DisplayPort {
    /// Write `text` starting at (`column`, `row`).  Text past the right edge
    /// is dropped.
    fn write(&mut self, text: &str, column: u8, row: u8) -> Result<(), DisplayError>;

    /// Blank the whole grid.
    fn clear(&mut self) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Upload port (driven adapter: domain → backend)
// ───────────────────────────────────────────────────────────────

/// Optional batch upload of captured samples.
pub trait UploadPort {
    /// Submit one batch.  Returns the number of records the backend
    /// accepted.  Must not block longer than its own configured timeout.
    fn submit(&mut self, batch: &[Sample]) -> Result<usize, UploadError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting (see
/// [`SystemConfig::validate`]).
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// NVS port (driven adapter: domain ↔ key/value flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage (WiFi credentials, config blob).
///
/// Write operations MUST be atomic; no partial writes on power loss.
pub trait NvsPort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, NvsError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), NvsError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), NvsError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Maintenance delegate (decouples scheduler from the collaborators)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`Scheduler`](crate::scheduler::Scheduler)
/// invokes when a gated maintenance task comes due.
///
/// The scheduler only owns the gates; whoever implements this owns the
/// link, the clock and the storage collaborators.
pub trait MaintenanceDelegate {
    /// Called at most once per task interval.  The gate has already been
    /// advanced to `now_ms`, whatever the task's outcome.
    fn on_task_due(&mut self, task: MaintenanceTask, now_ms: u64);
}

/// Discriminant passed to [`MaintenanceDelegate::on_task_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    /// Check the link, reconnect and re-initialise storage if it is down.
    LinkCheck,
    /// Resync the wall clock against network time.
    ClockResync,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`NvsPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvsError {
    /// Requested key does not exist.
    NotFound,
    /// Partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for NvsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "NVS full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
