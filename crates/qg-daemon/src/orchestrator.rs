//! The per-unit pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use qg_analyzer::StaticAnalyzer;
use qg_core::config::PipelineConfig;
use qg_core::error::PipelineError;
use qg_core::types::{AnalysisResult, ChangeUnit, PipelineRun, RemediationSummary, RunOutcome};
use qg_harness::harness::TestHarness;
use qg_integrations::UnitTracker;
use tracing::{info, warn, Instrument};

use crate::comment;
use crate::notifier::Notifier;
use crate::remediation::{should_remediate, RemediationWorkflow};

/// Processes one unit end to end. The scheduler only sees this seam.
#[async_trait]
pub trait UnitProcessor: Send + Sync {
    async fn process_unit(&self, unit: &ChangeUnit) -> Result<PipelineRun, PipelineError>;
}

pub struct Orchestrator {
    tracker: Arc<dyn UnitTracker>,
    harness: TestHarness,
    analyzer: StaticAnalyzer,
    remediation: RemediationWorkflow,
    pipeline: PipelineConfig,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        tracker: Arc<dyn UnitTracker>,
        harness: TestHarness,
        analyzer: StaticAnalyzer,
        remediation: RemediationWorkflow,
        pipeline: PipelineConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tracker,
            harness,
            analyzer,
            remediation,
            pipeline,
            notifier,
        }
    }

    async fn run_pipeline(&self, unit: &ChangeUnit) -> Result<PipelineRun, PipelineError> {
        let files = self
            .tracker
            .list_changed_files(unit.number)
            .await
            .map_err(|e| PipelineError::Remote(e.to_string()))?;
        let analysis = AnalysisResult::from_files(&files);
        info!(
            files = analysis.file_count,
            additions = analysis.additions,
            deletions = analysis.deletions,
            critical = analysis.critical_files.len(),
            "unit analysed"
        );

        let mut run = PipelineRun::new(unit.number, analysis);

        if !self.pipeline.test_on_new_unit {
            info!("testing disabled for new units, skipping");
            self.notifier.notify(unit, &run).await;
            return Ok(run);
        }

        let outcome = self.harness.run(unit);
        run.outcome = if outcome.passed {
            RunOutcome::Passed
        } else {
            RunOutcome::Failed
        };
        run.checks = outcome.checks.clone();

        let body = comment::render_report(&run, &outcome);
        if let Err(e) = self.tracker.post_comment(unit.number, &body).await {
            warn!(error = %e, "failed to post report comment");
        }

        if should_remediate(
            outcome.passed,
            self.pipeline.remediation_enabled,
            &run.analysis,
            self.remediation.config(),
        ) {
            self.analyze_and_remediate(unit, &mut run).await;
        }

        self.notifier.notify(unit, &run).await;
        Ok(run)
    }

    async fn analyze_and_remediate(&self, unit: &ChangeUnit, run: &mut PipelineRun) {
        let suggestions = match self.harness.checkout_unit(unit.number) {
            Ok(scope) => {
                let found = self.analyzer.analyze();
                drop(scope);
                found
            }
            Err(e) => {
                warn!(error = %e, "could not check out unit for analysis");
                run.remediation = Some(RemediationSummary::Failed {
                    stage: "analysis".into(),
                    error: e.to_string(),
                });
                return;
            }
        };

        let outcome = self.remediation.run(unit, &suggestions).await;
        run.suggestions = suggestions;
        run.remediation = Some(outcome.summary());
    }
}

#[async_trait]
impl UnitProcessor for Orchestrator {
    async fn process_unit(&self, unit: &ChangeUnit) -> Result<PipelineRun, PipelineError> {
        let span = qg_telemetry::spans::unit_span(unit.number);
        self.run_pipeline(unit).instrument(span).await
    }
}
