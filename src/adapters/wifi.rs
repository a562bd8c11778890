//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`]: the best-effort network link used for clock
//! sync and the optional upload.  Acquisition never depends on it.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` handed in from
//!   `main` via [`WifiAdapter::attach`].
//! - **all other targets**: simulated link with hooks to drop it and to
//!   make reconnects fail, for host tests.
//!
//! ## Reconnection policy
//!
//! None of its own.  The maintenance scheduler calls
//! [`LinkPort::reconnect`] at most once per link-check interval.

use log::{error, info, warn};

use super::utils::is_printable_ascii;
use crate::app::ports::{LinkPort, LinkState};
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(LinkError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: LinkState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    connect_attempts: u32,
    #[cfg(target_os = "espidf")]
    wifi: Option<BlockingWifi<EspWifi<'static>>>,
    /// Simulation: reconnect attempts that will still fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures_pending: u32,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            connect_attempts: 0,
            #[cfg(target_os = "espidf")]
            wifi: None,
            #[cfg(not(target_os = "espidf"))]
            sim_failures_pending: 0,
        }
    }

    /// Hand over the started driver.
    #[cfg(target_os = "espidf")]
    pub fn attach(&mut self, wifi: BlockingWifi<EspWifi<'static>>) {
        self.wifi = Some(wifi);
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| LinkError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| LinkError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Boot-time association.
    pub fn connect(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        if self.state == LinkState::Connected {
            return Err(LinkError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = LinkState::Connecting;
        self.connect_attempts = self.connect_attempts.saturating_add(1);

        match self.platform_connect() {
            Ok(()) => {
                self.state = LinkState::Connected;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = LinkState::Failed;
                Err(e)
            }
        }
    }

    /// Association attempts since boot (boot connect plus reconnects).
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulate losing the access point.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        if self.state == LinkState::Connected {
            self.state = LinkState::Disconnected;
        }
    }

    /// Make the next `n` association attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_failures_pending = n;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        let wifi = self.wifi.as_mut().ok_or(LinkError::ConnectionFailed)?;

        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| LinkError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidPassword)?,
            auth_method: if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| LinkError::ConnectionFailed)?;
        if !wifi.is_started().unwrap_or(false) {
            wifi.start().map_err(|_| LinkError::ConnectionFailed)?;
        }
        wifi.connect().map_err(|_| LinkError::AuthFailed)?;
        wifi.wait_netif_up().map_err(|_| LinkError::ConnectionFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        if self.sim_failures_pending > 0 {
            self.sim_failures_pending -= 1;
            warn!("WiFi(sim): simulated association failure");
            return Err(LinkError::ConnectionFailed);
        }
        info!("WiFi(sim): connected to '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.wifi.as_mut() {
            if let Err(e) = wifi.disconnect() {
                warn!("WiFi: disconnect failed: {}", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi
            .as_ref()
            .and_then(|w| w.is_connected().ok())
            .unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn status(&self) -> LinkState {
        match self.state {
            LinkState::Connected if !self.platform_is_connected() => LinkState::Disconnected,
            other => other,
        }
    }

    fn reconnect(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        info!("WiFi: reconnecting to '{}'", self.ssid);
        self.platform_disconnect();
        self.state = LinkState::Disconnected;
        self.connect()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
