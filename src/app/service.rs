//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the session FSM, the debouncers, the clock model,
//! the flush policy, the maintenance gates and the status surface.  All
//! I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────────┐ ──▶ LogStoragePort
//!  SamplePort ──▶ │          AppService          │ ──▶ DisplayPort
//!   ClockPort ──▶ │ debounce · FSM · flush · gates│ ──▶ EventSink
//! Link+TimeSync ◀▶└──────────────────────────────┘ ──▶ UploadPort
//! ```
//!
//! One call to [`AppService::tick`] is one loop iteration, always in this
//! order: poll inputs, gated maintenance, session transition, sample,
//! flush, status.

use core::fmt::Write;

use log::{debug, info, warn};

use crate::clock::ClockModel;
use crate::config::SystemConfig;
use crate::drivers::button::DebouncedButton;
use crate::fsm::context::{FsmContext, SessionCommand};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::sample_buffer::{FlushDecision, Sample, SampleBuffer};
use crate::scheduler::Scheduler;
use crate::status::{Banner, StatusSurface};

use super::events::{AppEvent, SessionStats};
use super::ports::{
    ClockPort, DisplayPort, EventSink, InputId, InputPort, LinkPort, LinkState, LogHandle,
    LogStoragePort, MaintenanceDelegate, MaintenanceTask, SamplePort, TimeSyncPort, UploadPort,
};
use crate::error::UploadError;

/// Longest session file name: 16-byte prefix, 20 digits, 8-byte extension.
pub type FileName = heapless::String<48>;

/// `<prefix><start_ts><ext>`, e.g. `emg_log_5000.txt`.
pub fn session_file_name(prefix: &str, start_ts: u64, ext: &str) -> FileName {
    let mut name = FileName::new();
    // Cannot overflow: prefix and ext are bounded by the config types.
    let _ = write!(name, "{}{}{}", prefix, start_ts, ext);
    name
}

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

/// One contiguous acquisition interval.
#[derive(Debug, Clone)]
pub struct Session {
    start_timestamp: u64,
    handle: Option<LogHandle>,
    file_name: FileName,
    last_timestamp: u64,
    stats: SessionStats,
}

impl Session {
    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    /// `false` when the log target failed to open (sampling-only session).
    pub fn has_storage(&self) -> bool {
        self.handle.is_some()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Timestamp of the most recent sample (start timestamp before any).
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    fsm: Fsm,
    ctx: FsmContext,
    start_button: DebouncedButton,
    stop_button: DebouncedButton,
    clock: ClockModel,
    scheduler: Scheduler,
    buffer: SampleBuffer,
    status: StatusSurface,
    session: Option<Session>,
    upload_batch: Vec<Sample>,
    upload_due: bool,
    iterations: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let fsm = Fsm::new(build_state_table(), StateId::Idle);
        let batch_capacity = if config.upload_enabled {
            usize::from(config.upload_batch_size)
        } else {
            0
        };

        Self {
            fsm,
            ctx: FsmContext::new(),
            start_button: DebouncedButton::new(config.debounce_ms),
            stop_button: DebouncedButton::new(config.debounce_ms),
            clock: ClockModel::new(),
            scheduler: Scheduler::new(
                config.link_check_interval_ms(),
                config.clock_resync_interval_ms(),
                0,
            ),
            buffer: SampleBuffer::new(config.flush_every_samples),
            status: StatusSurface::new(config.display_rows, config.display_cols),
            session: None,
            upload_batch: Vec::with_capacity(batch_capacity),
            upload_due: false,
            iterations: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot sequence: enter Idle, blocking initial clock resync, first
    /// status render.  Both maintenance gates start counting from here.
    pub fn start(
        &mut self,
        clock: &impl ClockPort,
        time_sync: &mut impl TimeSyncPort,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        self.fsm.start(&mut self.ctx);

        if let Err(e) = display.clear() {
            warn!("Status: display clear failed: {}", e);
        }

        let timeout_ms = self.config.clock_sync_timeout_ms();
        match self.clock.resync(clock, time_sync, timeout_ms) {
            Ok(()) => sink.emit(&AppEvent::ClockSynced {
                epoch_ms: self.clock.now_ms_since_epoch(clock),
            }),
            Err(_) => sink.emit(&AppEvent::ClockSyncTimeout),
        }

        let now = clock.uptime_ms();
        self.scheduler.mark_run(MaintenanceTask::LinkCheck, now);
        self.scheduler.mark_run(MaintenanceTask::ClockResync, now);

        self.render_status(display);

        sink.emit(&AppEvent::Started {
            synchronized: self.clock.is_synchronized(),
        });
        info!(
            "AppService started in {:?} (clock synchronised: {})",
            self.fsm.current_state(),
            self.clock.is_synchronized()
        );
    }

    /// Graceful-shutdown hook: closes an open session through the same
    /// path as a stop press.  No-op while idle.
    pub fn shutdown(&mut self, storage: &mut impl LogStoragePort, sink: &mut impl EventSink) {
        let prev = self.fsm.current_state();
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.apply_session_command(storage, sink);
        if prev != StateId::Idle {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: StateId::Idle,
            });
        }
        info!("AppService shut down");
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration.
    ///
    /// `hw` satisfies **both** [`InputPort`] and [`SamplePort`], and `net`
    /// both [`LinkPort`] and [`TimeSyncPort`], mirroring how the adapters
    /// are split on the board.
    pub fn tick(
        &mut self,
        hw: &mut (impl InputPort + SamplePort),
        clock: &impl ClockPort,
        storage: &mut impl LogStoragePort,
        net: &mut (impl LinkPort + TimeSyncPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        self.iterations += 1;

        // 1. Debounced inputs
        let uptime = clock.uptime_ms();
        let start = self
            .start_button
            .poll(hw.is_pressed(InputId::Start), uptime)
            .is_some();
        let stop = self
            .stop_button
            .poll(hw.is_pressed(InputId::Stop), uptime)
            .is_some();

        // 2. Gated maintenance (may block)
        {
            let mut runner = MaintenanceRunner {
                clock_model: &mut self.clock,
                clock,
                net: &mut *net,
                storage: &mut *storage,
                sink: &mut *sink,
                timeout_ms: self.config.clock_sync_timeout_ms(),
            };
            self.scheduler.tick(clock.uptime_ms(), &mut runner);
        }

        // 3. Session transition
        let now = self.clock.now_ms_since_epoch(clock);
        let prev = self.fsm.current_state();
        self.ctx.start_event = start;
        self.ctx.stop_event = stop;
        self.ctx.now_epoch_ms = now;
        self.fsm.tick(&mut self.ctx);
        self.ctx.clear_events();
        self.apply_session_command(storage, sink);

        let state = self.fsm.current_state();
        if state != prev {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: state,
            });
        }

        // 4. Sample + flush policy
        if state == StateId::Active {
            self.capture(hw, now, storage, sink);
        }

        // 5. Status
        self.render_status(display);
    }

    /// Submit the pending upload batch if it is full, or if a session just
    /// closed with a partial one.  The batch is dropped either way.
    ///
    /// Returns `None` when nothing was due.
    pub fn upload(
        &mut self,
        uploader: &mut impl UploadPort,
        sink: &mut impl EventSink,
    ) -> Option<Result<usize, UploadError>> {
        if !self.upload_due || self.upload_batch.is_empty() {
            return None;
        }
        self.upload_due = false;

        let result = uploader.submit(&self.upload_batch);
        let batch_len = self.upload_batch.len();
        self.upload_batch.clear();

        match result {
            Ok(count) => {
                debug!("Upload: {} of {} records accepted", count, batch_len);
                sink.emit(&AppEvent::UploadSubmitted { count });
            }
            Err(e) => {
                warn!("Upload: batch of {} dropped: {}", batch_len, e);
                sink.emit(&AppEvent::UploadFailed(e));
            }
        }
        Some(result)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// The open session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn clock(&self) -> &ClockModel {
        &self.clock
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn status(&self) -> &StatusSurface {
        &self.status
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Samples queued for the next upload.
    pub fn pending_upload(&self) -> &[Sample] {
        &self.upload_batch
    }

    /// Loop iterations executed since construction.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate the FSM's session command into storage calls.
    fn apply_session_command(&mut self, storage: &mut impl LogStoragePort, sink: &mut impl EventSink) {
        match self.ctx.take_command() {
            Some(SessionCommand::Open { start_ts }) => self.open_session(start_ts, storage, sink),
            Some(SessionCommand::Close) => self.close_session(storage, sink),
            None => {}
        }
    }

    fn open_session(&mut self, start_ts: u64, storage: &mut impl LogStoragePort, sink: &mut impl EventSink) {
        debug_assert!(self.session.is_none(), "session already open");

        let file_name = session_file_name(
            &self.config.log_file_prefix,
            start_ts,
            &self.config.log_file_ext,
        );
        self.buffer.reset();

        let handle = match storage.open(&file_name) {
            Ok(h) => {
                info!("Session: logging to {}", file_name);
                Some(h)
            }
            Err(e) => {
                warn!("Session: cannot open {} ({}), sampling without storage", file_name, e);
                sink.emit(&AppEvent::StorageOpenFailed);
                None
            }
        };

        sink.emit(&AppEvent::SessionStarted {
            start_timestamp: start_ts,
            file_name: if handle.is_some() {
                file_name.clone()
            } else {
                FileName::new()
            },
        });

        self.session = Some(Session {
            start_timestamp: start_ts,
            handle,
            file_name,
            last_timestamp: start_ts,
            stats: SessionStats::default(),
        });
    }

    fn close_session(&mut self, storage: &mut impl LogStoragePort, sink: &mut impl EventSink) {
        let Some(mut session) = self.session.take() else {
            warn!("Session: close requested with no open session");
            return;
        };

        if let Some(handle) = session.handle {
            session.stats.syncs += 1;
            if let Err(e) = storage.sync(handle) {
                session.stats.write_failures += 1;
                warn!("Session: final sync failed: {}", e);
            }
            if let Err(e) = storage.close(handle) {
                session.stats.write_failures += 1;
                warn!("Session: close failed: {}", e);
            }
        }

        self.buffer.reset();
        self.status.reset_banner();

        if self.config.upload_enabled && !self.upload_batch.is_empty() {
            self.upload_due = true;
        }

        info!(
            "Session: {} closed, {} samples, {} syncs, {} write failures",
            session.file_name, session.stats.samples, session.stats.syncs, session.stats.write_failures
        );
        sink.emit(&AppEvent::SessionStopped {
            start_timestamp: session.start_timestamp,
            stats: session.stats,
        });
    }

    /// Take one sample, append it, and apply the flush policy.
    fn capture(
        &mut self,
        hw: &mut impl SamplePort,
        now: u64,
        storage: &mut impl LogStoragePort,
        sink: &mut impl EventSink,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let value = hw.read_sample();
        // Never run backwards within a session, even across a resync.
        let timestamp = now.max(session.last_timestamp);
        session.last_timestamp = timestamp;
        session.stats.samples += 1;
        let sample = Sample::new(timestamp, value);

        if let Some(handle) = session.handle {
            if let Err(e) = storage.append(handle, &sample.to_record()) {
                session.stats.write_failures += 1;
                warn!("Session: append failed at {}: {}", timestamp, e);
                sink.emit(&AppEvent::StorageWriteFailed { timestamp });
            }
        }

        if self.buffer.push(sample) == FlushDecision::Flush {
            if let Some(handle) = session.handle {
                session.stats.syncs += 1;
                match storage.sync(handle) {
                    Ok(()) => sink.emit(&AppEvent::Flushed {
                        samples_in_session: session.stats.samples,
                    }),
                    Err(e) => {
                        session.stats.write_failures += 1;
                        warn!("Session: sync failed: {}", e);
                        sink.emit(&AppEvent::StorageWriteFailed { timestamp });
                    }
                }
            }
        }

        if self.config.upload_enabled {
            self.upload_batch.push(sample);
            if self.upload_batch.len() >= usize::from(self.config.upload_batch_size) {
                self.upload_due = true;
            }
        }
    }

    fn render_status(&mut self, display: &mut impl DisplayPort) {
        let banner = match (&self.session, self.fsm.current_state()) {
            (Some(s), StateId::Active) if s.has_storage() => Banner::Recording,
            (_, StateId::Active) => Banner::RecordingNoStorage,
            (_, StateId::Idle) => Banner::Stopped,
        };
        let value = self.buffer.latest().map(|s| s.value);
        self.status.render(display, banner, value);
    }
}

// ───────────────────────────────────────────────────────────────
// Maintenance delegate
// ───────────────────────────────────────────────────────────────

/// Borrows the collaborators for one scheduler pass.
struct MaintenanceRunner<'a, C, N, S, E> {
    clock_model: &'a mut ClockModel,
    clock: &'a C,
    net: &'a mut N,
    storage: &'a mut S,
    sink: &'a mut E,
    timeout_ms: u32,
}

impl<C, N, S, E> MaintenanceDelegate for MaintenanceRunner<'_, C, N, S, E>
where
    C: ClockPort,
    N: LinkPort + TimeSyncPort,
    S: LogStoragePort,
    E: EventSink,
{
    fn on_task_due(&mut self, task: MaintenanceTask, now_ms: u64) {
        match task {
            MaintenanceTask::LinkCheck => self.check_link(now_ms),
            MaintenanceTask::ClockResync => self.resync_clock(),
        }
    }
}

impl<C, N, S, E> MaintenanceRunner<'_, C, N, S, E>
where
    C: ClockPort,
    N: LinkPort + TimeSyncPort,
    S: LogStoragePort,
    E: EventSink,
{
    fn check_link(&mut self, now_ms: u64) {
        let state = self.net.status();
        if state == LinkState::Connected {
            debug!("Link: up at {}ms", now_ms);
            return;
        }

        warn!("Link: {:?} at {}ms, reconnecting", state, now_ms);
        self.sink.emit(&AppEvent::LinkUnavailable(state));
        match self.net.reconnect() {
            Ok(()) => {
                info!("Link: recovered");
                self.sink.emit(&AppEvent::LinkRecovered);
            }
            Err(e) => warn!("Link: reconnect failed: {}", e),
        }

        // Link flapping has been seen to disturb the SD bus.
        if let Err(e) = self.storage.reinit() {
            warn!("Link: storage re-init failed: {}", e);
        }
    }

    fn resync_clock(&mut self) {
        match self.clock_model.resync(self.clock, &mut *self.net, self.timeout_ms) {
            Ok(()) => self.sink.emit(&AppEvent::ClockSynced {
                epoch_ms: self.clock_model.now_ms_since_epoch(self.clock),
            }),
            Err(_) => self.sink.emit(&AppEvent::ClockSyncTimeout),
        }
    }
}
