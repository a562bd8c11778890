//! Network adapter: the WiFi link and SNTP behind one value.
//!
//! The service takes a single `impl LinkPort + TimeSyncPort`, since both
//! concerns share the radio.  A sync is refused outright while the link
//! is down instead of waiting out the whole timeout.

use crate::app::ports::{LinkPort, LinkState, TimeSyncPort};
use crate::error::{ClockError, LinkError};

use super::sntp::SntpAdapter;
use super::wifi::WifiAdapter;

pub struct NetworkAdapter {
    wifi: WifiAdapter,
    sntp: SntpAdapter,
}

impl NetworkAdapter {
    pub fn new(wifi: WifiAdapter, sntp: SntpAdapter) -> Self {
        Self { wifi, sntp }
    }

    pub fn wifi(&self) -> &WifiAdapter {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiAdapter {
        &mut self.wifi
    }

    pub fn sntp(&self) -> &SntpAdapter {
        &self.sntp
    }

    pub fn sntp_mut(&mut self) -> &mut SntpAdapter {
        &mut self.sntp
    }
}

impl LinkPort for NetworkAdapter {
    fn status(&self) -> LinkState {
        self.wifi.status()
    }

    fn reconnect(&mut self) -> Result<(), LinkError> {
        self.wifi.reconnect()
    }
}

impl TimeSyncPort for NetworkAdapter {
    fn sync_clock(&mut self, timeout_ms: u32) -> Result<(), ClockError> {
        if self.wifi.status() != LinkState::Connected {
            return Err(ClockError::Unavailable);
        }
        self.sntp.sync_clock(timeout_ms)
    }
}
