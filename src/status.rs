//! Status surface: read-only rendering of acquisition state.
//!
//! Row 0 carries a banner, row 1 the latest raw sample:
//!
//! ```text
//!   ┌────────────────┐
//!   │Stopped         │   idle, after a stop (or at boot)
//!   │EMG:       1873 │
//!   └────────────────┘
//!   ┌────────────────┐
//!   │REC NO SD       │   active, storage open failed
//!   │EMG:       2051 │
//!   └────────────────┘
//! ```
//!
//! Character displays are slow, so the banner is written once per change
//! and only the value field is refreshed each iteration.  Display errors
//! are logged and dropped; nothing here can stall acquisition.

use core::fmt::Write;

use log::warn;

use crate::app::ports::DisplayPort;

/// What the banner row currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Stopped,
    Recording,
    RecordingNoStorage,
}

impl Banner {
    pub fn text(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Recording => "REC",
            Self::RecordingNoStorage => "REC NO SD",
        }
    }
}

/// Widest grid the surface formats for.
const MAX_COLS: usize = 40;

/// Renders state to a [`DisplayPort`] with banner throttling.
#[derive(Debug, Clone)]
pub struct StatusSurface {
    cols: u8,
    rows: u8,
    shown: Option<Banner>,
    last_value: Option<i16>,
    display_errors: u32,
}

impl StatusSurface {
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            cols: cols.min(MAX_COLS as u8),
            rows,
            shown: None,
            last_value: None,
            display_errors: 0,
        }
    }

    /// Forget the shown banner so the next render re-announces it.
    pub fn reset_banner(&mut self) {
        self.shown = None;
    }

    /// Render one iteration's worth of status.
    pub fn render(&mut self, display: &mut impl DisplayPort, banner: Banner, value: Option<i16>) {
        if self.shown != Some(banner) {
            let line = self.pad(banner.text());
            if self.put(display, &line, 0) {
                self.shown = Some(banner);
                // Value row is re-drawn below after a banner change.
                self.last_value = None;
            }
        }

        if self.rows < 2 {
            return;
        }
        if let Some(v) = value {
            if self.last_value != Some(v) {
                let mut field: heapless::String<MAX_COLS> = heapless::String::new();
                let _ = write!(field, "EMG: {:>10}", v);
                let line = self.pad(&field);
                if self.put(display, &line, 1) {
                    self.last_value = Some(v);
                }
            }
        }
    }

    pub fn shown_banner(&self) -> Option<Banner> {
        self.shown
    }

    /// Display writes that failed since boot.
    pub fn display_errors(&self) -> u32 {
        self.display_errors
    }

    fn pad(&self, text: &str) -> heapless::String<MAX_COLS> {
        let mut line: heapless::String<MAX_COLS> = heapless::String::new();
        for c in text.chars().take(self.cols as usize) {
            let _ = line.push(c);
        }
        while line.len() < self.cols as usize {
            let _ = line.push(' ');
        }
        line
    }

    fn put(&mut self, display: &mut impl DisplayPort, line: &str, row: u8) -> bool {
        match display.write(line, 0, row) {
            Ok(()) => true,
            Err(e) => {
                self.display_errors = self.display_errors.saturating_add(1);
                warn!("Status: display write failed on row {}: {}", row, e);
                false
            }
        }
    }
}
