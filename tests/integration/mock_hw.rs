//! Mock collaborators for integration tests.
//!
//! Each mock records every call so tests can assert on the full history
//! without touching GPIO, the SD card or the radio.  [`Rig`] bundles one of
//! each and drives [`AppService`] on a scripted millisecond clock.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use emglogger::app::events::AppEvent;
use emglogger::app::ports::{
    ClockPort, DisplayPort, EventSink, InputId, InputPort, LinkPort, LinkState, LogHandle,
    LogStoragePort, SamplePort, TimeSyncPort, UploadPort, WallTime,
};
use emglogger::app::service::AppService;
use emglogger::clock::CUSTOM_EPOCH_SECS;
use emglogger::config::SystemConfig;
use emglogger::error::{ClockError, DisplayError, LinkError, StorageError, UploadError};
use emglogger::sample_buffer::Sample;

// ── Inputs + ADC ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockInputs {
    pub start: bool,
    pub stop: bool,
    pub value: i16,
    pub reads: u32,
}

impl InputPort for MockInputs {
    fn is_pressed(&mut self, input: InputId) -> bool {
        match input {
            InputId::Start => self.start,
            InputId::Stop => self.stop,
        }
    }
}

impl SamplePort for MockInputs {
    fn read_sample(&mut self) -> i16 {
        self.reads += 1;
        self.value
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Uptime and epoch-relative wall time move together unless a test
/// deliberately skews the wall clock.
///
/// A clock built with [`MockClock::unsynced`] reports wall time counted
/// from boot, the way the board does before network time arrives.
#[derive(Debug)]
pub struct MockClock {
    uptime_ms: Cell<u64>,
    epoch_ms: Cell<u64>,
    since_boot: bool,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            uptime_ms: Cell::new(0),
            epoch_ms: Cell::new(0),
            since_boot: false,
        }
    }

    pub fn unsynced() -> Self {
        Self {
            since_boot: true,
            ..Self::new()
        }
    }

    /// Set both uptime and epoch time to `ms`.
    pub fn set(&self, ms: u64) {
        self.uptime_ms.set(ms);
        self.epoch_ms.set(ms);
    }

    /// Move only the wall clock (e.g. a resync correcting it).
    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.set(ms);
    }
}

impl ClockPort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.uptime_ms.get()
    }

    fn wall_time(&self) -> WallTime {
        let ms = self.epoch_ms.get();
        let base = if self.since_boot { 0 } else { CUSTOM_EPOCH_SECS };
        WallTime {
            secs: base + ms / 1000,
            sub_ms: (ms % 1000) as u16,
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Open(String),
    Append(String),
    Sync,
    Close,
    Reinit,
}

/// In-memory storage keyed by file name.
#[derive(Debug, Default)]
pub struct MockStorage {
    pub calls: Vec<StorageCall>,
    pub files: HashMap<String, String>,
    pub fail_open: bool,
    pub fail_append: bool,
    open: Option<(u32, String)>,
    next_handle: u32,
}

impl MockStorage {
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn count(&self, pred: impl Fn(&StorageCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn syncs(&self) -> usize {
        self.count(|c| *c == StorageCall::Sync)
    }

    pub fn appends(&self) -> usize {
        self.count(|c| matches!(c, StorageCall::Append(_)))
    }

    /// Names passed to `open`, in order.
    pub fn opens(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                StorageCall::Open(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Timestamps recorded in `name`, in file order.
    pub fn timestamps(&self, name: &str) -> Vec<u64> {
        self.file(name)
            .unwrap_or_default()
            .lines()
            .filter_map(|l| l.split(',').next())
            .filter_map(|t| t.parse().ok())
            .collect()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn check(&self, handle: LogHandle) -> Result<String, StorageError> {
        match &self.open {
            Some((h, name)) if *h == handle.0 => Ok(name.clone()),
            _ => Err(StorageError::InvalidHandle),
        }
    }
}

impl LogStoragePort for MockStorage {
    fn open(&mut self, name: &str) -> Result<LogHandle, StorageError> {
        self.calls.push(StorageCall::Open(name.to_string()));
        if self.fail_open {
            return Err(StorageError::NotMounted);
        }
        if self.open.is_some() {
            return Err(StorageError::AlreadyOpen);
        }
        self.next_handle += 1;
        self.open = Some((self.next_handle, name.to_string()));
        self.files.entry(name.to_string()).or_default();
        Ok(LogHandle(self.next_handle))
    }

    fn append(&mut self, handle: LogHandle, record: &str) -> Result<(), StorageError> {
        self.calls.push(StorageCall::Append(record.to_string()));
        let name = self.check(handle)?;
        if self.fail_append {
            return Err(StorageError::WriteFailed);
        }
        if let Some(contents) = self.files.get_mut(&name) {
            contents.push_str(record);
        }
        Ok(())
    }

    fn sync(&mut self, handle: LogHandle) -> Result<(), StorageError> {
        self.calls.push(StorageCall::Sync);
        self.check(handle).map(|_| ())
    }

    fn close(&mut self, handle: LogHandle) -> Result<(), StorageError> {
        self.calls.push(StorageCall::Close);
        self.check(handle)?;
        self.open = None;
        Ok(())
    }

    fn reinit(&mut self) -> Result<(), StorageError> {
        self.calls.push(StorageCall::Reinit);
        Ok(())
    }
}

// ── Network link + time sync ──────────────────────────────────

#[derive(Debug)]
pub struct MockNet {
    pub state: LinkState,
    pub reconnect_ok: bool,
    pub sync_ok: bool,
    pub reconnects: u32,
    pub sync_calls: Vec<u32>,
}

impl MockNet {
    pub fn new() -> Self {
        Self {
            state: LinkState::Connected,
            reconnect_ok: true,
            sync_ok: true,
            reconnects: 0,
            sync_calls: Vec::new(),
        }
    }
}

impl LinkPort for MockNet {
    fn status(&self) -> LinkState {
        self.state
    }

    fn reconnect(&mut self) -> Result<(), LinkError> {
        self.reconnects += 1;
        if self.reconnect_ok {
            self.state = LinkState::Connected;
            Ok(())
        } else {
            self.state = LinkState::Failed;
            Err(LinkError::ConnectionFailed)
        }
    }
}

impl TimeSyncPort for MockNet {
    fn sync_clock(&mut self, timeout_ms: u32) -> Result<(), ClockError> {
        self.sync_calls.push(timeout_ms);
        if self.sync_ok {
            Ok(())
        } else {
            Err(ClockError::Timeout)
        }
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockDisplay {
    pub writes: Vec<(String, u8)>,
    pub clears: u32,
}

impl MockDisplay {
    /// Most recent text written to `row`, trailing padding stripped.
    pub fn last_on_row(&self, row: u8) -> Option<&str> {
        self.writes
            .iter()
            .rev()
            .find(|(_, r)| *r == row)
            .map(|(t, _)| t.trim_end())
    }
}

impl DisplayPort for MockDisplay {
    fn write(&mut self, text: &str, _column: u8, row: u8) -> Result<(), DisplayError> {
        self.writes.push((text.to_string(), row));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.clears += 1;
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last_stopped(&self) -> Option<&AppEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| matches!(e, AppEvent::SessionStopped { .. }))
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Uploader ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockUploader {
    pub batches: Vec<Vec<Sample>>,
    pub fail: Option<UploadError>,
}

impl UploadPort for MockUploader {
    fn submit(&mut self, batch: &[Sample]) -> Result<usize, UploadError> {
        self.batches.push(batch.to_vec());
        match self.fail {
            Some(e) => Err(e),
            None => Ok(batch.len()),
        }
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Boot time used by [`Rig::started`].
pub const BOOT_MS: u64 = 1_000;

pub struct Rig {
    pub app: AppService,
    pub inputs: MockInputs,
    pub clock: MockClock,
    pub storage: MockStorage,
    pub net: MockNet,
    pub display: MockDisplay,
    pub sink: RecordingSink,
}

impl Rig {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            app: AppService::new(config),
            inputs: MockInputs::default(),
            clock: MockClock::new(),
            storage: MockStorage::default(),
            net: MockNet::new(),
            display: MockDisplay::default(),
            sink: RecordingSink::default(),
        }
    }

    /// A rig booted at [`BOOT_MS`] with one priming tick, so the
    /// debouncers have recorded the released level.
    pub fn started(config: SystemConfig) -> Self {
        let mut rig = Self::new(config);
        rig.boot(BOOT_MS);
        rig.tick(BOOT_MS);
        rig
    }

    /// Like [`started`](Self::started), but the wall clock is never set:
    /// it counts from boot and every resync times out.
    pub fn started_unsynced(config: SystemConfig) -> Self {
        let mut rig = Self::new(config);
        rig.clock = MockClock::unsynced();
        rig.net.sync_ok = false;
        rig.boot(BOOT_MS);
        rig.tick(BOOT_MS);
        rig
    }

    pub fn boot(&mut self, ms: u64) {
        self.clock.set(ms);
        self.app
            .start(&self.clock, &mut self.net, &mut self.display, &mut self.sink);
    }

    /// One loop iteration at `ms`.
    pub fn tick(&mut self, ms: u64) {
        self.clock.set(ms);
        self.tick_here();
    }

    /// One loop iteration without moving the clock.
    pub fn tick_here(&mut self) {
        self.app.tick(
            &mut self.inputs,
            &self.clock,
            &mut self.storage,
            &mut self.net,
            &mut self.display,
            &mut self.sink,
        );
    }

    /// Hold the start button from `at_ms` and tick until the press commits
    /// at `commit_ms` (must be more than the debounce window later).
    pub fn press_start(&mut self, at_ms: u64, commit_ms: u64) {
        self.inputs.start = true;
        self.tick(at_ms);
        self.tick(commit_ms);
        self.inputs.start = false;
    }

    /// Same as [`press_start`](Self::press_start) for the stop button.
    pub fn press_stop(&mut self, at_ms: u64, commit_ms: u64) {
        self.inputs.stop = true;
        self.tick(at_ms);
        self.tick(commit_ms);
        self.inputs.stop = false;
    }

    /// Run a session producing exactly `samples` (at least one) samples
    /// 1 ms apart, starting with the start commit at `start_ms + 25`.  The
    /// stop's raw press rides on the last sampling tick and commits 25 ms
    /// later; two idle ticks then let both releases settle.  Returns the
    /// time of the last tick.
    pub fn run_session(&mut self, start_ms: u64, samples: u64) -> u64 {
        assert!(samples >= 1, "the start commit tick always samples");
        self.inputs.start = true;
        self.tick(start_ms);
        let mut t = start_ms + 25;
        for i in 1..=samples {
            self.inputs.stop = i == samples;
            self.tick(t);
            self.inputs.start = false;
            t += 1;
        }
        t += 24;
        self.tick(t);
        self.inputs.stop = false;
        t += 1;
        self.tick(t);
        t += 25;
        self.tick(t);
        t
    }
}
