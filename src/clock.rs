//! Clock model: custom-epoch timestamps and resync bookkeeping.
//!
//! Persisted timestamps are milliseconds since a fixed project epoch
//! (2025-06-22T00:00:00Z) rather than the Unix epoch, which keeps them
//! small.  This is the only place the epoch subtraction happens:
//!
//! ```text
//!   ts = (wall_secs - EPOCH_SECS) * 1000 + wall_sub_ms
//! ```
//!
//! Before network time has been applied the wall clock counts from boot and
//! sits before the epoch.  Such readings are passed through as raw wall
//! milliseconds instead, so unsynchronised timestamps still advance with
//! real time and stay distinct.  They are implausible as absolute times;
//! that is surfaced through [`ClockModel::is_synchronized`], not treated as
//! an error.

use log::{info, warn};

use crate::app::ports::{ClockPort, TimeSyncPort, WallTime};
use crate::error::ClockError;

/// 2025-06-22T00:00:00Z in Unix seconds.
pub const CUSTOM_EPOCH_SECS: u64 = 1_750_550_400;

/// Wall-clock seconds at or below this are "not yet set" (16 h after
/// 1970-01-01).
pub const PLAUSIBLE_TIME_FLOOR_SECS: u64 = 16 * 3600;

/// Milliseconds since [`CUSTOM_EPOCH_SECS`] for a wall-clock reading.
/// Readings before the epoch come back as raw wall milliseconds.
pub fn epoch_ms(wall: WallTime) -> u64 {
    let secs = wall.secs.checked_sub(CUSTOM_EPOCH_SECS).unwrap_or(wall.secs);
    secs.saturating_mul(1000)
        .saturating_add(u64::from(wall.sub_ms.min(999)))
}

/// Whether a wall-clock reading looks like real absolute time.
pub fn is_plausible(wall: WallTime) -> bool {
    wall.secs > PLAUSIBLE_TIME_FLOOR_SECS
}

/// Tracks synchronisation state of the wall clock.
#[derive(Debug, Clone, Default)]
pub struct ClockModel {
    synchronized: bool,
    last_resync_uptime_ms: Option<u64>,
    last_resync_epoch_ms: Option<u64>,
    resync_attempts: u32,
}

impl ClockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds since the custom epoch.
    pub fn now_ms_since_epoch(&self, clock: &impl ClockPort) -> u64 {
        epoch_ms(clock.wall_time())
    }

    /// `true` once a resync has succeeded.  A later failed attempt does not
    /// clear it.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Contact the network time reference.  Blocks the caller for at most
    /// `timeout_ms`.
    pub fn resync(
        &mut self,
        clock: &impl ClockPort,
        sync: &mut impl TimeSyncPort,
        timeout_ms: u32,
    ) -> Result<(), ClockError> {
        self.resync_attempts = self.resync_attempts.saturating_add(1);
        info!("Clock: resync attempt {} (timeout {}ms)", self.resync_attempts, timeout_ms);

        // Every failure reads as a timeout to callers; the cause is logged.
        if let Err(e) = sync.sync_clock(timeout_ms) {
            warn!("Clock: resync failed: {}", e);
            return Err(ClockError::Timeout);
        }

        // Trust the wall clock, not the collaborator's word for it.
        let wall = clock.wall_time();
        if !is_plausible(wall) {
            warn!("Clock: reference answered but wall clock still at {}s", wall.secs);
            return Err(ClockError::Timeout);
        }

        self.synchronized = true;
        self.last_resync_uptime_ms = Some(clock.uptime_ms());
        self.last_resync_epoch_ms = Some(epoch_ms(wall));
        info!("Clock: synchronised, epoch_ms={}", epoch_ms(wall));
        Ok(())
    }

    /// Uptime of the last successful resync.
    pub fn last_resync_uptime_ms(&self) -> Option<u64> {
        self.last_resync_uptime_ms
    }

    /// Epoch-relative time of the last successful resync.
    pub fn last_resync_epoch_ms(&self) -> Option<u64> {
        self.last_resync_epoch_ms
    }

    pub fn resync_attempts(&self) -> u32 {
        self.resync_attempts
    }
}
