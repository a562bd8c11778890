//! Sample buffer and flush policy.
//!
//! Every captured sample is appended to the open log target immediately;
//! this module only decides **when** a durable sync is forced.  Syncing on
//! every sample would stall the loop on the SD card; never syncing leaves an
//! unbounded window of unflushed data on power loss.  With a bound of N the
//! loss window on power failure is at most N-1 samples.
//!
//! ```text
//!   push ─▶ cursor += 1 ─┬─ cursor <  N ─▶ Continue
//!                        └─ cursor == N ─▶ cursor = 0, Flush
//! ```

use core::fmt::Write;

/// One timestamped EMG reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Milliseconds since the custom epoch.
    pub timestamp: u64,
    /// Raw ADC reading.
    pub value: i16,
}

/// Longest record: 20 digits + ',' + 6 chars + '\n'.
pub const RECORD_CAP: usize = 32;

impl Sample {
    pub const fn new(timestamp: u64, value: i16) -> Self {
        Self { timestamp, value }
    }

    /// Storage record: `timestamp,value\n`.
    pub fn to_record(&self) -> heapless::String<RECORD_CAP> {
        let mut line = heapless::String::new();
        // Fits by construction (see RECORD_CAP).
        let _ = writeln!(line, "{},{}", self.timestamp, self.value);
        line
    }
}

/// Outcome of [`SampleBuffer::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    Continue,
    /// The Nth sample since the last flush was pushed; force a sync now.
    Flush,
}

/// Counts samples since the last forced sync and keeps the latest one for
/// the status surface.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    flush_every: u32,
    cursor: u32,
    latest: Option<Sample>,
    total: u64,
}

impl SampleBuffer {
    /// `flush_every` of 0 is treated as 1 (sync every sample).
    pub fn new(flush_every: u32) -> Self {
        Self {
            flush_every: flush_every.max(1),
            cursor: 0,
            latest: None,
            total: 0,
        }
    }

    /// Record a captured sample.  The cursor resets in the same call that
    /// returns [`FlushDecision::Flush`], so it can never overrun N.
    pub fn push(&mut self, sample: Sample) -> FlushDecision {
        self.latest = Some(sample);
        self.total = self.total.saturating_add(1);
        self.cursor += 1;
        if self.cursor >= self.flush_every {
            self.cursor = 0;
            FlushDecision::Flush
        } else {
            FlushDecision::Continue
        }
    }

    /// Drop the flush cursor (session open / close).  The latest sample
    /// survives so the status surface keeps a value to show.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Samples pushed since the last flush or reset.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn flush_every(&self) -> u32 {
        self.flush_every
    }

    pub fn latest(&self) -> Option<Sample> {
        self.latest
    }

    /// Samples pushed since boot.
    pub fn total(&self) -> u64 {
        self.total
    }
}
