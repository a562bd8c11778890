//! EMG muscle-sensor front end.
//!
//! Reads the rectified/enveloped EMG voltage through an ESP32-S3 ADC
//! channel.  No filtering: the raw conversion is what gets logged.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::{AtomicU16, Ordering};

static SIM_EMG_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_emg_adc(raw: u16) {
    SIM_EMG_ADC.store(raw, Ordering::Relaxed);
}

pub struct EmgSensor {
    adc_channel: u32,
    full_scale: u16,
    total_reads: u32,
    last_raw: u16,
}

impl EmgSensor {
    pub fn new(adc_channel: u32, full_scale: u16) -> Self {
        Self {
            adc_channel,
            full_scale,
            total_reads: 0,
            last_raw: 0,
        }
    }

    /// One conversion, clamped to the ADC full scale.
    pub fn read(&mut self) -> i16 {
        self.total_reads = self.total_reads.saturating_add(1);
        let raw = self.read_adc().min(self.full_scale);
        self.last_raw = raw;
        raw.min(i16::MAX as u16) as i16
    }

    pub fn total_reads(&self) -> u32 {
        self.total_reads
    }

    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        crate::drivers::hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        let _ = self.adc_channel;
        SIM_EMG_ADC.load(Ordering::Relaxed)
    }
}
