mod common;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{file, unit, MockTracker};
use qg_core::config::Config;
use qg_core::fakes::ScriptedRunner;
use qg_core::process::{CommandError, CommandRunner, ToolOutput};
use qg_daemon::daemon::Daemon;
use qg_daemon::scheduler::CycleOutcome;
use qg_harness::report::ReportArtifact;
use qg_harness::shutdown::DrainResult;

fn config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.repository.path = dir.path().display().to_string();
    config.state.checkpoint_path = dir.path().join("state/last-check").display().to_string();
    config.state.report_path = dir.path().join("state/report.json").display().to_string();
    config
}

#[tokio::test]
async fn single_cycle_processes_recent_unit() {
    let dir = tempfile::tempdir().unwrap();
    let mut recent = unit(42, "2024-01-01T00:00:00Z");
    recent.created_at = Utc::now() - chrono::Duration::hours(1);
    let tracker = Arc::new(MockTracker::new(vec![recent]).with_files(42, vec![file("src/a.ts", 3, 1)]));
    let runner = Arc::new(ScriptedRunner::new("main"));

    let daemon = Daemon::with_parts(config(&dir), tracker.clone(), runner.clone()).unwrap();
    let outcome = daemon.run_once().await;

    assert_eq!(outcome, CycleOutcome::Completed { units: 1, failed: 0 });
    assert_eq!(tracker.comments().len(), 1);
    assert_eq!(runner.current_branch(), "main");

    let report = ReportArtifact::read(&dir.path().join("state/report.json")).unwrap();
    assert_eq!(report.unit, 42);
    assert!(dir.path().join("state/last-check").exists());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.harness.checks.clear();
    let result = Daemon::with_parts(
        cfg,
        Arc::new(MockTracker::default()),
        Arc::new(ScriptedRunner::new("main")),
    );
    assert!(result.is_err());
}

/// Blocks the calling thread on `npm ci`, like a hung install.
struct HangingRunner {
    inner: ScriptedRunner,
    started: Arc<AtomicBool>,
    hold: Duration,
}

impl CommandRunner for HangingRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ToolOutput, CommandError> {
        if program == "npm" && args.first() == Some(&"ci") {
            self.started.store(true, Ordering::SeqCst);
            std::thread::sleep(self.hold);
        }
        self.inner.run(dir, program, args)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn drain_timeout_returns_while_a_tool_is_still_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.daemon.drain_timeout_secs = 1;

    let mut recent = unit(9, "2024-01-01T00:00:00Z");
    recent.created_at = Utc::now() - chrono::Duration::minutes(5);
    let tracker = Arc::new(MockTracker::new(vec![recent]).with_files(9, vec![file("src/a.ts", 2, 0)]));
    let started = Arc::new(AtomicBool::new(false));
    let runner = Arc::new(HangingRunner {
        inner: ScriptedRunner::new("main"),
        started: started.clone(),
        hold: Duration::from_secs(4),
    });

    let daemon = Daemon::with_parts(cfg, tracker, runner).unwrap();
    let shutdown = daemon.shutdown_handle();
    tokio::spawn(async move {
        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.trigger();
    });

    let drained = tokio::time::timeout(Duration::from_secs(3), daemon.run())
        .await
        .expect("run returns once the drain timeout expires")
        .unwrap();
    assert_eq!(drained, DrainResult::Timeout { in_flight: 1 });
}

#[tokio::test]
async fn idle_daemon_drains_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = Daemon::with_parts(
        config(&dir),
        Arc::new(MockTracker::default()),
        Arc::new(ScriptedRunner::new("main")),
    )
    .unwrap();
    daemon.shutdown_handle().trigger();

    let drained = tokio::time::timeout(Duration::from_secs(5), daemon.run())
        .await
        .expect("run returns after shutdown")
        .unwrap();
    assert_eq!(drained, DrainResult::Drained);
}
