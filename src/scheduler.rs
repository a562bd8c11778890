//! Time-gated maintenance scheduler.
//!
//! Two independent periodic tasks share the acquisition loop: the link
//! check-and-recover and the clock resync.  Each owns a [`Gate`]; when a
//! gate is due the scheduler advances it and notifies a
//! [`MaintenanceDelegate`].  The gate moves even if the task then fails,
//! so a dead link or an unreachable time server costs one attempt per
//! interval, never a retry storm.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  Scheduler::tick(now)                                     │
//! │                                                           │
//! │   ┌────────────┐  due?  ┌──────────────────────────────┐  │
//! │   │ link gate  │───────▶│ on_task_due(LinkCheck)       │  │
//! │   │  (10 s)    │        │   status → reconnect → reinit│  │
//! │   └────────────┘        └──────────────────────────────┘  │
//! │   ┌────────────┐  due?  ┌──────────────────────────────┐  │
//! │   │ clock gate │───────▶│ on_task_due(ClockResync)     │  │
//! │   │  (1 h)     │        │   blocking SNTP resync       │  │
//! │   └────────────┘        └──────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Both run synchronously: while a task runs, nothing is sampled.

use crate::app::ports::{MaintenanceDelegate, MaintenanceTask};
use log::debug;

// ═══════════════════════════════════════════════════════════════
//  Gate
// ═══════════════════════════════════════════════════════════════

/// Rate limiter for one periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    last_run_ms: u64,
    interval_ms: u64,
}

impl Gate {
    /// A gate whose first run is one interval after `start_ms`.
    pub fn new(interval_ms: u64, start_ms: u64) -> Self {
        Self {
            last_run_ms: start_ms,
            interval_ms,
        }
    }

    /// If at least one interval has elapsed since the last run, record
    /// `now_ms` as the new last run and return `true`.
    pub fn run_if_due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_run_ms) >= self.interval_ms {
            self.last_run_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the interval at `now_ms` (e.g. after an out-of-band run).
    pub fn mark_run(&mut self, now_ms: u64) {
        self.last_run_ms = now_ms;
    }

    pub fn last_run_ms(&self) -> u64 {
        self.last_run_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The maintenance scheduler.
///
/// Decoupled from the collaborators: it never touches the link or the
/// clock itself, it only decides *when* and hands off to the delegate.
pub struct Scheduler {
    link_gate: Gate,
    clock_gate: Gate,
    enabled: bool,
}

impl Scheduler {
    pub fn new(link_interval_ms: u64, clock_interval_ms: u64, start_ms: u64) -> Self {
        Self {
            link_gate: Gate::new(link_interval_ms, start_ms),
            clock_gate: Gate::new(clock_interval_ms, start_ms),
            enabled: true,
        }
    }

    /// Enable or disable all maintenance.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run whichever tasks are due at `now_ms`, link check first.
    /// Returns the number of tasks dispatched.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn MaintenanceDelegate) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut ran = 0;
        if self.link_gate.run_if_due(now_ms) {
            debug!("Scheduler: link check due at {}ms", now_ms);
            delegate.on_task_due(MaintenanceTask::LinkCheck, now_ms);
            ran += 1;
        }
        if self.clock_gate.run_if_due(now_ms) {
            debug!("Scheduler: clock resync due at {}ms", now_ms);
            delegate.on_task_due(MaintenanceTask::ClockResync, now_ms);
            ran += 1;
        }
        ran
    }

    /// Gate of `task`, for inspection.
    pub fn gate(&self, task: MaintenanceTask) -> &Gate {
        match task {
            MaintenanceTask::LinkCheck => &self.link_gate,
            MaintenanceTask::ClockResync => &self.clock_gate,
        }
    }

    /// Restart `task`'s interval (e.g. after the boot-time resync).
    pub fn mark_run(&mut self, task: MaintenanceTask, now_ms: u64) {
        match task {
            MaintenanceTask::LinkCheck => self.link_gate.mark_run(now_ms),
            MaintenanceTask::ClockResync => self.clock_gate.mark_run(now_ms),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
