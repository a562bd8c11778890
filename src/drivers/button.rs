//! Polled debounce for the start/stop momentary buttons.
//!
//! ## Hardware
//!
//! Active-low momentary switches with pull-ups.  The main loop reads the
//! raw level every iteration (no ISR) and feeds it to [`DebouncedButton`],
//! one instance per button.
//!
//! ## Debounce
//!
//! | Step                      | Condition                                     |
//! |---------------------------|-----------------------------------------------|
//! | Raw edge                  | level != `raw_last` → restart the window      |
//! | Commit                    | level steady for > window, level != `stable`  |
//! | Event                     | committed level is *pressed* (never release)  |
//!
//! The first poll only records the level.  A button held down at boot
//! therefore never produces a press until it is released and pressed again.

/// Emitted once per debounced idle → pressed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    /// Uptime at which the press was committed.
    pub at_ms: u64,
}

pub struct DebouncedButton {
    window_ms: u32,
    raw_last: bool,
    stable: bool,
    last_change_ms: u64,
    primed: bool,
}

impl DebouncedButton {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            raw_last: false,
            stable: false,
            last_change_ms: 0,
            primed: false,
        }
    }

    /// Feed the instantaneous level (`true` = pressed) sampled at `now_ms`.
    /// Returns a press event on a committed idle → pressed transition.
    pub fn poll(&mut self, pressed: bool, now_ms: u64) -> Option<PressEvent> {
        if !self.primed {
            self.primed = true;
            self.raw_last = pressed;
            self.stable = pressed;
            self.last_change_ms = now_ms;
            return None;
        }

        if pressed != self.raw_last {
            self.raw_last = pressed;
            self.last_change_ms = now_ms;
        }

        let steady_for = now_ms.saturating_sub(self.last_change_ms);
        if steady_for > u64::from(self.window_ms) && pressed != self.stable {
            self.stable = pressed;
            if pressed {
                return Some(PressEvent { at_ms: now_ms });
            }
        }
        None
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }
}
