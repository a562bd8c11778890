//! Integration tests for gated maintenance: link check-and-recover and
//! clock resync, as seen through the acquisition loop.

use super::mock_hw::{BOOT_MS, Rig, StorageCall};

use emglogger::app::events::AppEvent;
use emglogger::app::ports::{LinkState, MaintenanceTask};
use emglogger::config::SystemConfig;
use emglogger::fsm::StateId;

const LINK_MS: u64 = 10_000;
const CLOCK_MS: u64 = 3_600_000;

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_resync_success_marks_clock_synchronized() {
    let rig = Rig::started(SystemConfig::default());

    assert!(rig.app.clock().is_synchronized());
    assert_eq!(rig.net.sync_calls, vec![30_000]);
    assert!(rig.sink.events.contains(&AppEvent::Started { synchronized: true }));
    assert_eq!(rig.app.clock().last_resync_epoch_ms(), Some(BOOT_MS));
}

#[test]
fn boot_resync_timeout_still_enters_idle() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.net.sync_ok = false;
    rig.boot(BOOT_MS);

    assert!(!rig.app.clock().is_synchronized());
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::ClockSyncTimeout), 1);
    assert!(rig.sink.events.contains(&AppEvent::Started { synchronized: false }));
}

#[test]
fn boot_restarts_both_gates() {
    let rig = Rig::started(SystemConfig::default());
    let sched = rig.app.scheduler();
    assert_eq!(sched.gate(MaintenanceTask::LinkCheck).last_run_ms(), BOOT_MS);
    assert_eq!(sched.gate(MaintenanceTask::ClockResync).last_run_ms(), BOOT_MS);
}

// ── Link check ────────────────────────────────────────────────

#[test]
fn healthy_link_is_checked_without_side_effects() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.tick(BOOT_MS + LINK_MS);

    assert_eq!(rig.net.reconnects, 0);
    assert!(rig.storage.calls.is_empty());
    assert_eq!(
        rig.app.scheduler().gate(MaintenanceTask::LinkCheck).last_run_ms(),
        BOOT_MS + LINK_MS
    );
}

#[test]
fn dropped_link_reconnects_and_reinitialises_storage() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.net.state = LinkState::Disconnected;

    rig.tick(BOOT_MS + LINK_MS - 1);
    assert_eq!(rig.net.reconnects, 0, "not due yet");

    rig.tick(BOOT_MS + LINK_MS);
    assert_eq!(rig.net.reconnects, 1);
    assert_eq!(rig.storage.count(|c| *c == StorageCall::Reinit), 1);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::LinkUnavailable(LinkState::Disconnected)));
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LinkRecovered), 1);
}

#[test]
fn failed_reconnect_waits_a_full_interval() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.net.state = LinkState::Disconnected;
    rig.net.reconnect_ok = false;

    let first = BOOT_MS + LINK_MS;
    for t in (first..first + LINK_MS).step_by(50) {
        rig.tick(t);
    }
    assert_eq!(rig.net.reconnects, 1, "no retry storm");
    assert_eq!(rig.storage.count(|c| *c == StorageCall::Reinit), 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::LinkRecovered), 0);

    rig.tick(first + LINK_MS);
    assert_eq!(rig.net.reconnects, 2);
    assert!(rig.sink.events.contains(&AppEvent::LinkUnavailable(LinkState::Failed)));
}

#[test]
fn reinit_keeps_the_open_session_writing() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.press_start(2_000, 2_030);
    rig.net.state = LinkState::Disconnected;

    rig.tick(BOOT_MS + LINK_MS);
    rig.tick(BOOT_MS + LINK_MS + 1);

    assert_eq!(rig.app.state(), StateId::Active);
    assert!(rig.storage.is_open());
    assert_eq!(rig.storage.appends(), 3);
    let reinit_at = rig
        .storage
        .calls
        .iter()
        .position(|c| *c == StorageCall::Reinit);
    let last_append = rig
        .storage
        .calls
        .iter()
        .rposition(|c| matches!(c, StorageCall::Append(_)));
    assert!(reinit_at < last_append);
}

#[test]
fn a_blocked_loop_runs_each_task_once_on_return() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.net.state = LinkState::Idle;
    rig.tick(BOOT_MS + 5 * LINK_MS);
    assert_eq!(rig.net.reconnects, 1);
}

// ── Clock resync ──────────────────────────────────────────────

#[test]
fn clock_resync_runs_hourly() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.tick(BOOT_MS + CLOCK_MS - 1);
    assert_eq!(rig.net.sync_calls.len(), 1, "boot only");

    rig.tick(BOOT_MS + CLOCK_MS);
    assert_eq!(rig.net.sync_calls.len(), 2);
    assert_eq!(rig.app.clock().resync_attempts(), 2);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ClockSynced { .. })),
        2
    );
}

#[test]
fn later_resync_recovers_from_boot_timeout() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.net.sync_ok = false;
    rig.boot(BOOT_MS);
    assert!(!rig.app.clock().is_synchronized());

    rig.net.sync_ok = true;
    rig.tick(BOOT_MS + CLOCK_MS);
    assert!(rig.app.clock().is_synchronized());
}

#[test]
fn failed_resync_keeps_synchronized_flag() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.net.sync_ok = false;
    rig.tick(BOOT_MS + CLOCK_MS);

    assert!(rig.app.clock().is_synchronized());
    assert_eq!(rig.sink.count(|e| *e == AppEvent::ClockSyncTimeout), 1);
    assert_eq!(
        rig.app.scheduler().gate(MaintenanceTask::ClockResync).last_run_ms(),
        BOOT_MS + CLOCK_MS,
        "gate advances even on failure"
    );
}

#[test]
fn link_check_runs_before_clock_resync() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.net.state = LinkState::Disconnected;
    rig.tick(BOOT_MS + CLOCK_MS);

    let unavailable = rig
        .sink
        .events
        .iter()
        .position(|e| matches!(e, AppEvent::LinkUnavailable(_)));
    let synced = rig
        .sink
        .events
        .iter()
        .rposition(|e| matches!(e, AppEvent::ClockSynced { .. }));
    assert!(unavailable.is_some());
    assert!(unavailable < synced);
}
