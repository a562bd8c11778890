//! ESP32 time adapter.
//!
//! Implements [`ClockPort`]: a monotonic uptime plus the sub-second wall
//! clock that SNTP sets.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (microsecond,
//!   monotonic) and `gettimeofday()`.  The wall clock starts near the
//!   Unix epoch after every reset until SNTP applies real time.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `std::time::SystemTime` for host-side simulation.

use crate::app::ports::{ClockPort, WallTime};

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    #[cfg(target_os = "espidf")]
    fn wall_time(&self) -> WallTime {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: gettimeofday only writes the provided struct.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return WallTime::default();
        }
        WallTime {
            secs: tv.tv_sec.max(0) as u64,
            sub_ms: (tv.tv_usec.max(0) / 1000) as u16,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_time(&self) -> WallTime {
        match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(d) => WallTime {
                secs: d.as_secs(),
                sub_ms: d.subsec_millis() as u16,
            },
            Err(_) => WallTime::default(),
        }
    }
}
