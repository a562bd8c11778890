//! Integration tests for the input → session → storage pipeline.
//!
//! Drive [`AppService`](emglogger::app::service::AppService) through whole
//! sessions against the recording mocks and assert on what reached storage,
//! the status surface and the event sink.

use super::mock_hw::{BOOT_MS, MockClock, MockUploader, Rig, StorageCall};

use emglogger::app::events::{AppEvent, SessionStats};
use emglogger::config::SystemConfig;
use emglogger::error::UploadError;
use emglogger::fsm::StateId;
use emglogger::status::Banner;

// ── Happy path ────────────────────────────────────────────────

#[test]
fn three_samples_land_in_timestamped_file() {
    let mut rig = Rig::started(SystemConfig::default());

    rig.inputs.start = true;
    rig.tick(4_975);
    assert_eq!(rig.app.state(), StateId::Idle, "press not yet debounced");

    rig.inputs.value = 100;
    rig.tick(5_000);
    assert_eq!(rig.app.state(), StateId::Active);
    rig.inputs.start = false;

    rig.inputs.value = 110;
    rig.tick(5_010);
    rig.inputs.value = 120;
    rig.inputs.stop = true;
    rig.tick(5_020);
    assert_eq!(rig.app.state(), StateId::Active, "stop not yet debounced");

    rig.tick(5_045);
    assert_eq!(rig.app.state(), StateId::Idle);

    assert_eq!(
        rig.storage.file("emg_log_5000.txt"),
        Some("5000,100\n5010,110\n5020,120\n")
    );
    assert_eq!(rig.storage.calls.last(), Some(&StorageCall::Close));
    assert!(!rig.storage.is_open());

    match rig.sink.last_stopped() {
        Some(AppEvent::SessionStopped {
            start_timestamp,
            stats,
        }) => {
            assert_eq!(*start_timestamp, 5_000);
            assert_eq!(
                *stats,
                SessionStats {
                    samples: 3,
                    syncs: 1,
                    write_failures: 0,
                }
            );
        }
        other => panic!("expected SessionStopped, got {:?}", other),
    }
}

#[test]
fn start_event_and_first_sample_share_an_iteration() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.inputs.value = 7;
    rig.press_start(2_000, 2_030);

    assert_eq!(rig.storage.appends(), 1);
    assert_eq!(rig.app.session().map(|s| s.last_timestamp()), Some(2_030));
    assert_eq!(rig.app.session().map(|s| s.file_name()), Some("emg_log_2030.txt"));
}

#[test]
fn bouncing_start_press_is_ignored() {
    let mut rig = Rig::started(SystemConfig::default());
    // Contact chatter every 5 ms for 100 ms, never stable for > 20 ms.
    for i in 0..20u64 {
        rig.inputs.start = i % 2 == 0;
        rig.tick(2_000 + i * 5);
    }
    rig.inputs.start = false;
    rig.tick(2_200);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.storage.calls.is_empty());
}

#[test]
fn start_held_through_boot_does_not_open_session() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.inputs.start = true;
    rig.boot(1_000);
    rig.tick(1_000);
    rig.tick(1_500);
    rig.tick(3_000);
    assert_eq!(rig.app.state(), StateId::Idle);

    // Release, then a real press.
    rig.inputs.start = false;
    rig.tick(3_100);
    rig.tick(3_150);
    rig.press_start(3_200, 3_230);
    assert_eq!(rig.app.state(), StateId::Active);
}

// ── Redundant presses ─────────────────────────────────────────

#[test]
fn second_start_while_active_is_a_no_op() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.press_start(2_000, 2_030);
    rig.tick(2_040);
    rig.tick(2_070);
    rig.press_start(2_100, 2_130);

    assert_eq!(rig.app.state(), StateId::Active);
    assert_eq!(rig.storage.count(|c| matches!(c, StorageCall::Open(_))), 1);
    assert_eq!(rig.app.session().map(|s| s.start_timestamp()), Some(2_030));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SessionStarted { .. })),
        1
    );
}

#[test]
fn stop_while_idle_is_a_no_op() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.press_stop(2_000, 2_030);

    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.storage.calls.is_empty());
    assert_eq!(rig.sink.last_stopped(), None);
}

#[test]
fn simultaneous_press_while_idle_starts_a_session() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.inputs.start = true;
    rig.inputs.stop = true;
    rig.tick(2_000);
    rig.tick(2_030);

    assert_eq!(rig.app.state(), StateId::Active);
}

#[test]
fn consecutive_sessions_use_separate_files() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.inputs.value = 1;
    let end = rig.run_session(2_000, 2);
    rig.inputs.value = 2;
    rig.run_session(end + 1_000, 3);

    let first = rig.storage.file("emg_log_2025.txt").map(|f| f.lines().count());
    let second = rig
        .storage
        .file(&format!("emg_log_{}.txt", end + 1_025))
        .map(|f| f.lines().count());
    assert_eq!(first, Some(2));
    assert_eq!(second, Some(3));
    assert_eq!(rig.storage.count(|c| *c == StorageCall::Close), 2);
}

// ── Flush policy ──────────────────────────────────────────────

#[test]
fn full_flush_interval_forces_one_sync() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.press_start(2_000, 2_030);
    for i in 1..1_500u64 {
        rig.tick(2_030 + i);
    }

    assert_eq!(rig.app.session().map(|s| s.stats().samples), Some(1_500));
    assert_eq!(rig.storage.syncs(), 1);
    assert_eq!(rig.app.buffer().cursor(), 0);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::Flushed {
            samples_in_session: 1_500
        }),
        1
    );

    rig.tick(3_600);
    assert_eq!(rig.app.buffer().cursor(), 1);
    assert_eq!(rig.storage.syncs(), 1);
}

#[test]
fn stop_forces_final_sync_before_close() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.run_session(2_000, 10);

    let tail: Vec<_> = rig.storage.calls.iter().rev().take(2).collect();
    assert_eq!(tail, vec![&StorageCall::Close, &StorageCall::Sync]);
    assert_eq!(rig.app.buffer().cursor(), 0);
}

// ── Storage failures ──────────────────────────────────────────

#[test]
fn open_failure_samples_without_writing() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.storage.fail_open = true;
    rig.inputs.value = 42;

    rig.press_start(2_000, 2_030);
    for t in 2_031..2_040 {
        rig.tick(t);
    }

    assert_eq!(rig.app.state(), StateId::Active);
    assert_eq!(rig.storage.appends(), 0);
    assert_eq!(rig.storage.syncs(), 0);
    assert_eq!(rig.app.buffer().total(), 10);
    assert_eq!(rig.app.buffer().latest().map(|s| s.value), Some(42));
    assert_eq!(rig.app.session().map(|s| s.has_storage()), Some(false));
    assert_eq!(rig.sink.count(|e| *e == AppEvent::StorageOpenFailed), 1);

    assert_eq!(rig.app.status().shown_banner(), Some(Banner::RecordingNoStorage));
    assert_eq!(rig.display.last_on_row(0), Some("REC NO SD"));
    assert_eq!(rig.display.last_on_row(1), Some("EMG:         42"));

    // Stop still returns to Idle without touching storage.
    rig.press_stop(2_040, 2_070);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.storage.count(|c| *c == StorageCall::Close), 0);
    assert_eq!(rig.display.last_on_row(0), Some("Stopped"));
}

#[test]
fn write_failures_are_reported_and_sampling_continues() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.storage.fail_append = true;
    rig.run_session(2_000, 4);

    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::StorageWriteFailed { .. })),
        4
    );
    match rig.sink.last_stopped() {
        Some(AppEvent::SessionStopped { stats, .. }) => {
            assert_eq!(stats.samples, 4);
            assert_eq!(stats.write_failures, 4);
        }
        other => panic!("expected SessionStopped, got {:?}", other),
    }
}

// ── Timestamps ────────────────────────────────────────────────

#[test]
fn timestamps_never_run_backwards_within_a_session() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.inputs.value = 5;
    rig.press_start(10_000, 10_030);
    rig.tick(10_040);

    // Wall clock corrected backwards by a resync mid-session.
    rig.clock.set(10_050);
    rig.clock.set_epoch_ms(9_000);
    rig.tick_here();
    rig.clock.set_epoch_ms(10_100);
    rig.tick_here();

    let contents = rig.storage.file("emg_log_10030.txt").unwrap_or_default();
    let stamps: Vec<u64> = contents
        .lines()
        .filter_map(|l| l.split(',').next())
        .filter_map(|t| t.parse().ok())
        .collect();
    assert_eq!(stamps, vec![10_030, 10_040, 10_040, 10_100]);
}

// ── Unsynchronised clock ──────────────────────────────────────

#[test]
fn unsynced_sessions_get_distinct_files_and_real_time_stamps() {
    let mut rig = Rig::started_unsynced(SystemConfig::default());
    assert!(!rig.app.clock().is_synchronized());

    rig.press_start(5_000, 5_250);
    for i in 1..10u64 {
        rig.tick(5_250 + i * 300);
    }
    rig.press_stop(8_400, 8_430);
    rig.tick(8_500);
    rig.tick(8_550);

    rig.press_start(60_000, 60_250);
    rig.tick(60_251);
    rig.press_stop(60_300, 60_330);

    assert_eq!(rig.storage.opens(), vec!["emg_log_5250.txt", "emg_log_60250.txt"]);

    let mut first: Vec<u64> = (0..10u64).map(|i| 5_250 + i * 300).collect();
    first.push(8_400);
    assert_eq!(rig.storage.timestamps("emg_log_5250.txt"), first);
    assert_eq!(
        rig.storage.timestamps("emg_log_60250.txt"),
        vec![60_250, 60_251, 60_300]
    );
    assert!(!rig.app.clock().is_synchronized());
}

#[test]
fn unsynced_name_reused_after_reboot_keeps_earlier_records() {
    let mut rig = Rig::started_unsynced(SystemConfig::default());
    rig.inputs.value = 1;
    rig.run_session(2_000, 2);
    let storage = std::mem::take(&mut rig.storage);

    // Same boot-relative timing after a reboot yields the same name.
    let mut rebooted = Rig::new(SystemConfig::default());
    rebooted.clock = MockClock::unsynced();
    rebooted.net.sync_ok = false;
    rebooted.storage = storage;
    rebooted.boot(BOOT_MS);
    rebooted.tick(BOOT_MS);
    rebooted.inputs.value = 2;
    rebooted.run_session(2_000, 2);

    assert_eq!(rebooted.storage.opens(), vec!["emg_log_2025.txt", "emg_log_2025.txt"]);
    assert_eq!(
        rebooted.storage.file("emg_log_2025.txt"),
        Some("2025,1\n2026,1\n2025,2\n2026,2\n")
    );
}

// ── Status surface ────────────────────────────────────────────

#[test]
fn banner_follows_session_state() {
    let mut rig = Rig::started(SystemConfig::default());
    assert_eq!(rig.display.clears, 1);
    assert_eq!(rig.display.last_on_row(0), Some("Stopped"));

    rig.press_start(2_000, 2_030);
    assert_eq!(rig.display.last_on_row(0), Some("REC"));

    let banner_writes = rig.display.writes.iter().filter(|(_, r)| *r == 0).count();
    for t in 2_031..2_100 {
        rig.tick(t);
    }
    assert_eq!(
        rig.display.writes.iter().filter(|(_, r)| *r == 0).count(),
        banner_writes,
        "banner must not be rewritten every iteration"
    );

    rig.press_stop(2_100, 2_130);
    assert_eq!(rig.display.last_on_row(0), Some("Stopped"));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_closes_open_session() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.press_start(2_000, 2_030);
    rig.tick(2_031);

    rig.app.shutdown(&mut rig.storage, &mut rig.sink);

    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.storage.is_open());
    assert_eq!(rig.storage.file("emg_log_2030.txt"), Some("2030,0\n2031,0\n"));
    assert!(rig.sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Active,
        to: StateId::Idle,
    }));
    assert!(rig.sink.last_stopped().is_some());
}

#[test]
fn shutdown_while_idle_touches_nothing() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.app.shutdown(&mut rig.storage, &mut rig.sink);
    assert!(rig.storage.calls.is_empty());
    assert_eq!(rig.sink.last_stopped(), None);
}

// ── Upload batching ───────────────────────────────────────────

fn upload_config(batch: u16) -> SystemConfig {
    SystemConfig {
        upload_enabled: true,
        upload_batch_size: batch,
        ..SystemConfig::default()
    }
}

#[test]
fn full_batch_is_submitted_and_cleared() {
    let mut rig = Rig::started(upload_config(3));
    let mut uploader = MockUploader::default();

    rig.press_start(2_000, 2_030);
    assert_eq!(rig.app.upload(&mut uploader, &mut rig.sink), None);
    rig.tick(2_031);
    rig.tick(2_032);

    assert_eq!(rig.app.upload(&mut uploader, &mut rig.sink), Some(Ok(3)));
    assert!(rig.app.pending_upload().is_empty());
    assert_eq!(uploader.batches.len(), 1);
    assert_eq!(
        uploader.batches[0].iter().map(|s| s.timestamp).collect::<Vec<_>>(),
        vec![2_030, 2_031, 2_032]
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::UploadSubmitted { count: 3 }), 1);
}

#[test]
fn partial_batch_is_submitted_on_stop() {
    let mut rig = Rig::started(upload_config(100));
    let mut uploader = MockUploader::default();

    rig.run_session(2_000, 5);
    assert_eq!(rig.app.upload(&mut uploader, &mut rig.sink), Some(Ok(5)));
    assert_eq!(rig.app.upload(&mut uploader, &mut rig.sink), None);
}

#[test]
fn failed_batch_is_dropped_not_retried() {
    let mut rig = Rig::started(upload_config(2));
    let mut uploader = MockUploader {
        fail: Some(UploadError::Rejected(500)),
        ..MockUploader::default()
    };

    rig.press_start(2_000, 2_030);
    rig.tick(2_031);
    assert_eq!(
        rig.app.upload(&mut uploader, &mut rig.sink),
        Some(Err(UploadError::Rejected(500)))
    );
    assert!(rig.app.pending_upload().is_empty());
    assert_eq!(rig.app.upload(&mut uploader, &mut rig.sink), None);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::UploadFailed(UploadError::Rejected(500))),
        1
    );
}

#[test]
fn upload_disabled_queues_nothing() {
    let mut rig = Rig::started(SystemConfig::default());
    let mut uploader = MockUploader::default();
    rig.run_session(2_000, 50);
    assert!(rig.app.pending_upload().is_empty());
    assert_eq!(rig.app.upload(&mut uploader, &mut rig.sink), None);
    assert!(uploader.batches.is_empty());
}
