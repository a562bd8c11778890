//! Hardware adapter: bridges the board's inputs to domain port traits.
//!
//! Owns the two button pins and the EMG sensor, exposing them through
//! [`InputPort`] and [`SamplePort`].  Pins are any
//! [`embedded_hal::digital::InputPin`]: `esp_idf_hal::gpio::PinDriver` on
//! the board, plain fakes in tests.  The EMG sensor uses its cfg-gated
//! simulation path off-target.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::{InputId, InputPort, SamplePort};
use crate::sensors::emg::EmgSensor;

/// Buttons are wired to ground with pull-ups: low = pressed.
pub struct HardwareAdapter<S, P> {
    start: S,
    stop: P,
    emg: EmgSensor,
    pin_errors: u32,
}

impl<S: InputPin, P: InputPin> HardwareAdapter<S, P> {
    pub fn new(start: S, stop: P, emg: EmgSensor) -> Self {
        Self {
            start,
            stop,
            emg,
            pin_errors: 0,
        }
    }

    pub fn emg(&self) -> &EmgSensor {
        &self.emg
    }

    /// GPIO reads that failed (treated as "not pressed").
    pub fn pin_errors(&self) -> u32 {
        self.pin_errors
    }

    fn read_active_low(pin: &mut impl InputPin, errors: &mut u32) -> bool {
        match pin.is_low() {
            Ok(level) => level,
            Err(_) => {
                *errors = errors.saturating_add(1);
                if *errors == 1 {
                    warn!("Hardware: button GPIO read failed");
                }
                false
            }
        }
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<S: InputPin, P: InputPin> InputPort for HardwareAdapter<S, P> {
    fn is_pressed(&mut self, input: InputId) -> bool {
        match input {
            InputId::Start => Self::read_active_low(&mut self.start, &mut self.pin_errors),
            InputId::Stop => Self::read_active_low(&mut self.stop, &mut self.pin_errors),
        }
    }
}

// ── SamplePort implementation ─────────────────────────────────

impl<S: InputPin, P: InputPin> SamplePort for HardwareAdapter<S, P> {
    fn read_sample(&mut self) -> i16 {
        self.emg.read()
    }
}
