use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use qg_core::checkpoint::CheckpointStore;
use qg_harness::shutdown::ShutdownSignal;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn, Instrument};

use crate::detector::ChangeDetector;
use crate::orchestrator::UnitProcessor;

// ---------------------------------------------------------------------------
// CycleOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every detected unit was handed to the processor; the checkpoint moved.
    Completed { units: usize, failed: usize },
    /// Another cycle was still running.
    Skipped,
    /// Shutdown interrupted the cycle; the checkpoint was left alone.
    Cancelled { processed: usize },
    DetectionFailed(String),
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Runs detection cycles on a fixed interval, one at a time.
pub struct Scheduler {
    checkpoint: CheckpointStore,
    detector: ChangeDetector,
    processor: Arc<dyn UnitProcessor>,
    interval: Duration,
    shutdown: ShutdownSignal,
    cycle_lock: Mutex<()>,
    cycles: AtomicU64,
}

impl Scheduler {
    pub fn new(
        checkpoint: CheckpointStore,
        detector: ChangeDetector,
        processor: Arc<dyn UnitProcessor>,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            checkpoint,
            detector,
            processor,
            interval,
            shutdown,
            cycle_lock: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    /// Number of cycles started so far (skipped cycles excluded).
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Fire a cycle now, then every `interval` until shutdown.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.run_cycle().await;
                    info!(?outcome, "cycle finished");
                }
            }
        }
    }

    /// Run one detection cycle unless one is already in progress.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_running) = self.cycle_lock.try_lock() else {
            warn!("previous cycle still running, skipping tick");
            return CycleOutcome::Skipped;
        };
        let _in_flight = self.shutdown.enter();
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;

        self.cycle_body()
            .instrument(qg_telemetry::spans::cycle_span(cycle))
            .await
    }

    async fn cycle_body(&self) -> CycleOutcome {
        let started_at = Utc::now();
        let since = self.checkpoint.load();
        info!(since = %since.to_rfc3339(), "cycle started");

        let units = match self.detector.detect(since).await {
            Ok(units) => units,
            Err(e) => {
                error!(error = %e, "change detection failed, checkpoint not advanced");
                return CycleOutcome::DetectionFailed(e.to_string());
            }
        };

        let mut failed = 0;
        for (processed, unit) in units.iter().enumerate() {
            if self.shutdown.is_shutting_down() {
                warn!(processed, remaining = units.len() - processed, "cycle cancelled");
                return CycleOutcome::Cancelled { processed };
            }
            if let Err(e) = self.processor.process_unit(unit).await {
                failed += 1;
                error!(unit = unit.number, error = %e, "unit processing failed");
            }
        }

        match self.checkpoint.save(started_at) {
            Ok(()) => info!(checkpoint = %started_at.to_rfc3339(), "checkpoint advanced"),
            Err(e) => error!(error = %e, "failed to save checkpoint"),
        }
        CycleOutcome::Completed {
            units: units.len(),
            failed,
        }
    }
}
