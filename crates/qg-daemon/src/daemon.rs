use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use qg_analyzer::StaticAnalyzer;
use qg_core::checkpoint::CheckpointStore;
use qg_core::config::{expand_home, Config};
use qg_core::git::Git;
use qg_core::process::{CommandRunner, SystemRunner};
use qg_harness::harness::TestHarness;
use qg_harness::shutdown::{DrainResult, ShutdownSignal};
use qg_integrations::github::client::GitHubClient;
use qg_integrations::UnitTracker;
use tracing::{info, warn};

use crate::detector::ChangeDetector;
use crate::notifier::LogNotifier;
use crate::orchestrator::Orchestrator;
use crate::scheduler::{CycleOutcome, Scheduler};

/// The quality-gate daemon: one scheduler plus shutdown coordination.
pub struct Daemon {
    scheduler: Arc<Scheduler>,
    shutdown: ShutdownSignal,
    drain_timeout: Duration,
}

impl Daemon {
    /// Wire the daemon against GitHub and real subprocesses.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = GitHubClient::from_settings(&config.github)
            .context("failed to create GitHub client")?;
        Self::with_parts(config, Arc::new(client), Arc::new(SystemRunner))
    }

    /// Wire the daemon with explicit tracker and process runner.
    pub fn with_parts(
        config: Config,
        tracker: Arc<dyn UnitTracker>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let interval = config.schedule.interval()?;

        let repo_dir = expand_home(&config.repository.path);
        let prefix = config.repository.branch_prefix.clone();
        let git = Git::new(
            Arc::clone(&runner),
            &repo_dir,
            &config.repository.remote,
            &config.repository.baseline_branch,
        );

        let harness = TestHarness::new(git.clone(), &prefix, config.harness.checks.clone())
            .with_report(expand_home(&config.state.report_path));
        let analyzer = StaticAnalyzer::from_config(&repo_dir, &config.analyzer, runner)
            .context("failed to build static analyzer")?;
        let remediation = crate::remediation::RemediationWorkflow::new(
            git,
            Arc::clone(&tracker),
            &prefix,
            config.remediation.clone(),
        );
        let orchestrator = Orchestrator::new(
            Arc::clone(&tracker),
            harness,
            analyzer,
            remediation,
            config.pipeline.clone(),
            Arc::new(LogNotifier::new(config.notifications.clone())),
        );

        let checkpoint = CheckpointStore::new(
            expand_home(&config.state.checkpoint_path),
            chrono::Duration::hours(config.state.lookback_hours),
        );
        let shutdown = ShutdownSignal::new();
        let scheduler = Scheduler::new(
            checkpoint,
            ChangeDetector::new(tracker, config.github.per_page),
            Arc::new(orchestrator),
            interval,
            shutdown.clone(),
        );

        Ok(Self {
            scheduler: Arc::new(scheduler),
            shutdown,
            drain_timeout: Duration::from_secs(config.daemon.drain_timeout_secs),
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Run exactly one cycle.
    pub async fn run_once(&self) -> CycleOutcome {
        self.scheduler.run_cycle().await
    }

    /// Run until the shutdown signal fires, then drain the in-flight cycle.
    ///
    /// On [`DrainResult::Timeout`] the scheduler task is aborted, but a tool
    /// call already blocking a worker thread keeps running; the caller has to
    /// end the process to stop waiting on it.
    pub async fn run(&self) -> Result<DrainResult> {
        info!("qgate daemon starting");
        let scheduler = Arc::clone(&self.scheduler);
        let handle = tokio::spawn(async move { scheduler.run().await });

        self.shutdown.cancelled().await;
        let drained = self.shutdown.wait_for_drain(self.drain_timeout).await;
        match &drained {
            DrainResult::Drained => {
                handle.await.context("scheduler task failed")?;
                info!("qgate daemon stopped");
            }
            DrainResult::Timeout { in_flight } => {
                warn!(in_flight, "drain timed out, aborting scheduler");
                handle.abort();
            }
        }
        Ok(drained)
    }
}
