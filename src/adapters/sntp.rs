//! SNTP network-time adapter.
//!
//! Implements [`TimeSyncPort`].  `sync_clock` blocks, polling the SNTP
//! service until it reports a completed sync and the wall clock has left
//! the neighbourhood of zero, or the timeout runs out.
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::sntp::EspSntp` (default
//!   pool servers).  The service is created lazily on the first sync so
//!   boot does not depend on the link.
//! - **all other targets**: the host clock is already right; a hook makes
//!   the next syncs time out.

use log::{debug, info, warn};

use crate::app::ports::TimeSyncPort;
use crate::error::ClockError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sntp::{EspSntp, SyncStatus};

/// How often the sync status is re-checked while waiting.
pub const SYNC_POLL_MS: u32 = 100;

pub struct SntpAdapter {
    #[cfg(target_os = "espidf")]
    sntp: Option<EspSntp<'static>>,
    syncs: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_timeouts_pending: u32,
}

impl Default for SntpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SntpAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            sntp: None,
            syncs: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_timeouts_pending: 0,
        }
    }

    /// Completed syncs since boot.
    pub fn syncs(&self) -> u32 {
        self.syncs
    }

    /// Make the next `n` syncs time out.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_timeout_next(&mut self, n: u32) {
        self.sim_timeouts_pending = n;
    }

    #[cfg(target_os = "espidf")]
    fn platform_sync(&mut self, timeout_ms: u32) -> Result<(), ClockError> {
        use crate::app::ports::ClockPort;

        if self.sntp.is_none() {
            let sntp = EspSntp::new_default().map_err(|e| {
                warn!("SNTP: service start failed: {}", e);
                ClockError::Unavailable
            })?;
            self.sntp = Some(sntp);
        }
        let Some(sntp) = self.sntp.as_ref() else {
            return Err(ClockError::Unavailable);
        };

        let clock = super::time::Esp32TimeAdapter::new();
        let mut waited = 0;
        while waited < timeout_ms {
            if sntp.get_sync_status() == SyncStatus::Completed
                && crate::clock::is_plausible(clock.wall_time())
            {
                return Ok(());
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(SYNC_POLL_MS);
            waited += SYNC_POLL_MS;
        }
        Err(ClockError::Timeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_sync(&mut self, timeout_ms: u32) -> Result<(), ClockError> {
        if self.sim_timeouts_pending > 0 {
            self.sim_timeouts_pending -= 1;
            debug!("SNTP(sim): no answer within {}ms", timeout_ms);
            return Err(ClockError::Timeout);
        }
        Ok(())
    }
}

impl TimeSyncPort for SntpAdapter {
    fn sync_clock(&mut self, timeout_ms: u32) -> Result<(), ClockError> {
        debug!("SNTP: waiting up to {}ms", timeout_ms);
        match self.platform_sync(timeout_ms) {
            Ok(()) => {
                self.syncs = self.syncs.saturating_add(1);
                info!("SNTP: time applied (sync #{})", self.syncs);
                Ok(())
            }
            Err(e) => {
                warn!("SNTP: {}", e);
                Err(e)
            }
        }
    }
}
