// tests/shutdown.rs

use std::time::Duration;

use procfleet::probe::ProcessControl;
use procfleet::shutdown::Orchestrator;
use procfleet::store::{MemoryStatusStore, RecordStatus, Transition};
use procfleet_test_utils::builders::running_record;
use procfleet_test_utils::fakes::{Behaviour, FakeProcessControl, SentSignal};
use procfleet_test_utils::init_tracing;

const KILL_DELAY: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn cooperative_processes_end_terminated() {
    init_tracing();
    let store = MemoryStatusStore::with_records(vec![
        running_record("openocd", 100),
        running_record("saleae", 101),
    ]);
    let control = FakeProcessControl::new()
        .with_process(100, Behaviour::ExitsOnTerm)
        .with_process(101, Behaviour::ExitsOnTerm);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();

    let after_close = store.snapshot();
    for record in &after_close {
        assert_eq!(record.status, RecordStatus::TerminateRequested);
        assert!(record.sigterm_time.is_some());
    }

    let report = orchestrator.verify_termination(KILL_DELAY).await.unwrap();
    assert_eq!(report.count(RecordStatus::Terminated), 2);
    assert!(report.all_stopped());

    for record in store.snapshot() {
        assert_eq!(record.status, RecordStatus::Terminated);
        assert!(record.sigkill_time.is_none());
    }
    assert_eq!(
        control.signals(),
        vec![(100, SentSignal::Term), (101, SentSignal::Term)]
    );
}

#[tokio::test(start_paused = true)]
async fn stubborn_process_is_killed() {
    let store = MemoryStatusStore::with_records(vec![running_record("qemu", 200)]);
    let control = FakeProcessControl::new().with_process(200, Behaviour::ExitsOnKill);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();
    orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    let record = &store.snapshot()[0];
    assert_eq!(record.status, RecordStatus::Killed);
    assert!(record.sigterm_time.is_some());
    assert!(record.sigkill_time.is_some());
    assert_eq!(
        control.signals(),
        vec![(200, SentSignal::Term), (200, SentSignal::Kill)]
    );
}

#[tokio::test(start_paused = true)]
async fn unkillable_process_ends_in_kill_failed() {
    let store = MemoryStatusStore::with_records(vec![
        running_record("qemu", 300),
        running_record("openocd", 301),
    ]);
    let control = FakeProcessControl::new()
        .with_process(300, Behaviour::Unkillable)
        .with_process(301, Behaviour::ExitsOnTerm);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();
    let report = orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    assert_eq!(report.kill_failed, vec!["qemu".to_string()]);
    assert!(!report.all_stopped());

    let records = store.snapshot();
    assert_eq!(records[0].status, RecordStatus::KillFailed);
    assert_eq!(records[1].status, RecordStatus::Terminated);
}

#[tokio::test(start_paused = true)]
async fn kill_delay_is_waited_before_the_final_probe() {
    let store = MemoryStatusStore::with_records(vec![running_record("qemu", 400)]);
    let control = FakeProcessControl::new().with_process(400, Behaviour::ExitsOnKill);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();

    let started = tokio::time::Instant::now();
    orchestrator
        .verify_termination(Duration::from_secs(7))
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn zombies_count_as_gone_with_a_note() {
    let store = MemoryStatusStore::with_records(vec![
        running_record("a", 500),
        running_record("b", 501),
    ]);
    let control = FakeProcessControl::new()
        .with_process(500, Behaviour::ZombieOnTerm)
        .with_process(501, Behaviour::ZombieOnKill);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();
    orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    // A zombie still resolves, it just never runs again.
    assert!(control.pid_alive(500));

    let records = store.snapshot();
    assert_eq!(records[0].status, RecordStatus::Terminated);
    assert!(records[0].note.as_deref().unwrap().contains("zombie"));
    assert_eq!(records[1].status, RecordStatus::Killed);
    assert!(records[1].note.as_deref().unwrap().contains("zombie"));
}

#[tokio::test(start_paused = true)]
async fn already_gone_process_is_left_unchanged_then_terminated() {
    // pid 600 is unknown to the fake, i.e. it no longer exists.
    let store = MemoryStatusStore::with_records(vec![running_record("stale", 600)]);
    let control = FakeProcessControl::new();

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();

    let record = &store.snapshot()[0];
    assert_eq!(record.status, RecordStatus::Running);
    assert!(record.sigterm_time.is_none());
    assert!(control.signals().is_empty());

    orchestrator.verify_termination(KILL_DELAY).await.unwrap();
    assert_eq!(store.snapshot()[0].status, RecordStatus::Terminated);
}

#[tokio::test(start_paused = true)]
async fn closing_twice_does_not_signal_again() {
    let store = MemoryStatusStore::with_records(vec![running_record("a", 700)]);
    let control = FakeProcessControl::new().with_process(700, Behaviour::Unkillable);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();
    orchestrator.close_applications().unwrap();

    assert_eq!(control.signals(), vec![(700, SentSignal::Term)]);
    assert_eq!(
        orchestrator.records()[0].status,
        RecordStatus::TerminateRequested
    );
    assert_eq!(store.snapshot(), orchestrator.records());
}

#[tokio::test(start_paused = true)]
async fn terminal_records_from_earlier_runs_are_skipped() {
    let mut old = running_record("old", 800);
    old.transition(Transition::GracefulSent).unwrap();
    old.transition(Transition::ConfirmedGone).unwrap();

    let store = MemoryStatusStore::with_records(vec![old.clone()]);
    // The pid got reused by an unrelated process.
    let control = FakeProcessControl::new().with_process(800, Behaviour::ExitsOnTerm);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();
    orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    assert!(control.signals().is_empty());
    assert_eq!(store.snapshot(), vec![old]);
}

#[tokio::test(start_paused = true)]
async fn store_is_persisted_after_each_operation() {
    let store = MemoryStatusStore::with_records(vec![running_record("a", 900)]);
    let control = FakeProcessControl::new().with_process(900, Behaviour::ExitsOnTerm);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();
    assert_eq!(store.rewrite_count(), 1);

    orchestrator.verify_termination(KILL_DELAY).await.unwrap();
    assert_eq!(store.rewrite_count(), 2);
}

fn terminate_requested(name: &str, pid: u32) -> procfleet::store::ProcessRecord {
    let mut record = running_record(name, pid);
    record.transition(Transition::GracefulSent).unwrap();
    record.sigterm_time = Some("09:31:00.000".into());
    record
}

#[tokio::test(start_paused = true)]
async fn sigterm_error_does_not_stop_the_batch() {
    let store = MemoryStatusStore::with_records(vec![
        running_record("stuck", 1),
        running_record("openocd", 100),
    ]);
    let control = FakeProcessControl::new()
        .errors_on(1, SentSignal::Term)
        .with_process(100, Behaviour::ExitsOnTerm);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    orchestrator.close_applications().unwrap();

    let records = store.snapshot();
    assert_eq!(records[0].status, RecordStatus::Running);
    assert_eq!(records[1].status, RecordStatus::TerminateRequested);
    assert_eq!(control.signals(), vec![(100, SentSignal::Term)]);
    assert_eq!(orchestrator.signal_errors().len(), 1);
    assert_eq!(orchestrator.signal_errors()[0].0, "stuck");
    assert_eq!(store.rewrite_count(), 1);

    let report = orchestrator.verify_termination(KILL_DELAY).await.unwrap();
    assert_eq!(store.snapshot()[1].status, RecordStatus::Terminated);
    assert_eq!(report.left_running, vec!["stuck".to_string()]);
    assert_eq!(report.signal_errors.len(), 1);
    assert!(!report.all_stopped());
    assert_eq!(report.problems().len(), 2);
    assert_eq!(store.snapshot(), orchestrator.records());
}

#[tokio::test(start_paused = true)]
async fn sigkill_error_leaves_record_retryable() {
    let store = MemoryStatusStore::with_records(vec![
        terminate_requested("stuck", 1),
        terminate_requested("qemu", 200),
    ]);
    let control = FakeProcessControl::new()
        .errors_on(1, SentSignal::Kill)
        .with_process(200, Behaviour::ExitsOnKill);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    let report = orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    let records = store.snapshot();
    assert_eq!(records[0].status, RecordStatus::TerminateRequested);
    assert!(records[0].sigkill_time.is_none());
    assert_eq!(records[1].status, RecordStatus::Killed);
    assert_eq!(report.signal_errors[0].0, "stuck");
    assert!(!report.all_stopped());

    // A later pass tries again instead of skipping the record.
    orchestrator.verify_termination(KILL_DELAY).await.unwrap();
    assert_eq!(store.snapshot()[0].status, RecordStatus::TerminateRequested);
    assert_eq!(store.rewrite_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn interrupted_kill_is_finished_on_the_next_pass() {
    let mut pending = terminate_requested("qemu", 300);
    pending.transition(Transition::KillSent).unwrap();
    let mut vanished = terminate_requested("saleae", 301);
    vanished.transition(Transition::KillSent).unwrap();

    let store = MemoryStatusStore::with_records(vec![pending, vanished]);
    let control = FakeProcessControl::new().with_process(300, Behaviour::ExitsOnKill);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    let report = orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    assert_eq!(report.count(RecordStatus::Killed), 2);
    assert!(report.all_stopped());
    assert_eq!(control.signals(), vec![(300, SentSignal::Kill)]);
}

#[tokio::test(start_paused = true)]
async fn unsignalled_live_process_is_reported() {
    let store = MemoryStatusStore::with_records(vec![running_record("late", 400)]);
    let control = FakeProcessControl::new().with_process(400, Behaviour::ExitsOnTerm);

    let mut orchestrator = Orchestrator::load(&store, &control).unwrap();
    let report = orchestrator.verify_termination(KILL_DELAY).await.unwrap();

    assert_eq!(store.snapshot()[0].status, RecordStatus::Running);
    assert_eq!(report.left_running, vec!["late".to_string()]);
    assert!(!report.all_stopped());
    assert!(control.signals().is_empty());
}
