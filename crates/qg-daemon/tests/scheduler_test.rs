mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{ts, unit, MockTracker};
use qg_core::checkpoint::CheckpointStore;
use qg_core::error::PipelineError;
use qg_core::types::{AnalysisResult, ChangeUnit, PipelineRun};
use qg_daemon::detector::ChangeDetector;
use qg_daemon::orchestrator::UnitProcessor;
use qg_daemon::scheduler::{CycleOutcome, Scheduler};
use qg_harness::shutdown::ShutdownSignal;
use tempfile::TempDir;
use tokio::sync::Notify;

const CHECKPOINT: &str = "2024-01-01T00:00:00Z";

/// Processor that records units and can pause, fail or trigger shutdown.
#[derive(Default)]
struct StubProcessor {
    seen: Mutex<Vec<u64>>,
    fail: Vec<u64>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    shutdown_on_first: Option<ShutdownSignal>,
}

impl StubProcessor {
    fn seen(&self) -> Vec<u64> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl UnitProcessor for StubProcessor {
    async fn process_unit(&self, unit: &ChangeUnit) -> Result<PipelineRun, PipelineError> {
        self.seen.lock().unwrap().push(unit.number);
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }
        if let Some(shutdown) = &self.shutdown_on_first {
            shutdown.trigger();
        }
        if self.fail.contains(&unit.number) {
            return Err(PipelineError::Remote("list files failed".into()));
        }
        Ok(PipelineRun::new(unit.number, AnalysisResult::default()))
    }
}

struct Fixture {
    scheduler: Arc<Scheduler>,
    store: CheckpointStore,
    _dir: TempDir,
}

fn fixture(
    tracker: Arc<MockTracker>,
    processor: Arc<StubProcessor>,
    shutdown: ShutdownSignal,
) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("last-check"), chrono::Duration::hours(24));
    store.save(ts(CHECKPOINT)).unwrap();

    let scheduler = Scheduler::new(
        store.clone(),
        ChangeDetector::new(tracker, 50),
        processor,
        Duration::from_secs(3600),
        shutdown,
    );
    Fixture {
        scheduler: Arc::new(scheduler),
        store,
        _dir: dir,
    }
}

fn two_units() -> Arc<MockTracker> {
    Arc::new(MockTracker::new(vec![
        unit(1, "2024-01-01T01:00:00Z"),
        unit(2, "2024-01-01T02:00:00Z"),
    ]))
}

#[tokio::test]
async fn completed_cycle_advances_checkpoint_to_start_time() {
    let processor = Arc::new(StubProcessor::default());
    let fx = fixture(two_units(), processor.clone(), ShutdownSignal::new());

    let before = Utc::now();
    let outcome = fx.scheduler.run_cycle().await;
    let after = Utc::now();

    assert_eq!(outcome, CycleOutcome::Completed { units: 2, failed: 0 });
    assert_eq!(processor.seen(), vec![2, 1]);
    let saved = fx.store.read().unwrap().unwrap();
    assert!(saved >= before - chrono::Duration::seconds(1) && saved <= after);
    assert_eq!(fx.scheduler.cycles(), 1);
}

#[tokio::test]
async fn unit_failures_do_not_stop_the_cycle() {
    let processor = Arc::new(StubProcessor {
        fail: vec![2],
        ..Default::default()
    });
    let fx = fixture(two_units(), processor.clone(), ShutdownSignal::new());

    let outcome = fx.scheduler.run_cycle().await;

    assert_eq!(outcome, CycleOutcome::Completed { units: 2, failed: 1 });
    assert_eq!(processor.seen(), vec![2, 1]);
    assert!(fx.store.read().unwrap().unwrap() > ts(CHECKPOINT));
}

#[tokio::test]
async fn detection_failure_keeps_checkpoint() {
    let tracker = two_units();
    tracker.fail_listing.store(true, Ordering::SeqCst);
    let processor = Arc::new(StubProcessor::default());
    let fx = fixture(tracker, processor.clone(), ShutdownSignal::new());

    let outcome = fx.scheduler.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::DetectionFailed(_)));
    assert!(processor.seen().is_empty());
    assert_eq!(fx.store.read().unwrap(), Some(ts(CHECKPOINT)));
}

#[tokio::test]
async fn shutdown_cancels_at_unit_boundary_without_advancing() {
    let shutdown = ShutdownSignal::new();
    let processor = Arc::new(StubProcessor {
        shutdown_on_first: Some(shutdown.clone()),
        ..Default::default()
    });
    let fx = fixture(two_units(), processor.clone(), shutdown);

    let outcome = fx.scheduler.run_cycle().await;

    assert_eq!(outcome, CycleOutcome::Cancelled { processed: 1 });
    assert_eq!(processor.seen(), vec![2]);
    assert_eq!(fx.store.read().unwrap(), Some(ts(CHECKPOINT)));
}

#[tokio::test]
async fn overlapping_cycle_is_skipped() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let processor = Arc::new(StubProcessor {
        gate: Some((started.clone(), release.clone())),
        ..Default::default()
    });
    let tracker = Arc::new(MockTracker::new(vec![unit(1, "2024-01-01T01:00:00Z")]));
    let shutdown = ShutdownSignal::new();
    let fx = fixture(tracker, processor, shutdown.clone());

    let first = {
        let scheduler = fx.scheduler.clone();
        tokio::spawn(async move { scheduler.run_cycle().await })
    };
    started.notified().await;
    assert_eq!(shutdown.in_flight(), 1);

    assert_eq!(fx.scheduler.run_cycle().await, CycleOutcome::Skipped);

    release.notify_one();
    let outcome = first.await.unwrap();
    assert_eq!(outcome, CycleOutcome::Completed { units: 1, failed: 0 });
    assert_eq!(shutdown.in_flight(), 0);
    assert_eq!(fx.scheduler.cycles(), 1);
}

#[tokio::test]
async fn run_fires_immediately_and_stops_on_shutdown() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let processor = Arc::new(StubProcessor {
        gate: Some((started.clone(), release.clone())),
        ..Default::default()
    });
    let tracker = Arc::new(MockTracker::new(vec![unit(1, "2024-01-01T01:00:00Z")]));
    let shutdown = ShutdownSignal::new();
    let fx = fixture(tracker, processor, shutdown.clone());

    let handle = {
        let scheduler = fx.scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };
    started.notified().await;
    shutdown.trigger();
    release.notify_one();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler stops after shutdown")
        .unwrap();
    assert_eq!(fx.scheduler.cycles(), 1);
    assert!(shutdown.wait_for_drain(Duration::from_secs(1)).await.is_complete());
}
