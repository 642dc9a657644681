//! Automated-fix workflow for a passing unit.
//!
//! ```text
//! Baseline → BranchCreated → FixesApplied → DiffChecked
//!          → Committed → Pushed → RemoteUnitOpened → Baseline
//! ```
//!
//! All work happens inside a [`BranchGuard`](qg_core::git::BranchGuard)
//! scope, so the baseline branch is checked out again however the attempt
//! ends.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use qg_core::config::RemediationConfig;
use qg_core::git::Git;
use qg_core::types::{AnalysisResult, ChangeUnit, RemediationSummary, Suggestion};
use qg_integrations::types::NewUnit;
use qg_integrations::UnitTracker;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// States and outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationState {
    Baseline,
    BranchCreated,
    FixesApplied,
    DiffChecked,
    Committed,
    Pushed,
    RemoteUnitOpened,
}

impl fmt::Display for RemediationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Baseline => "baseline",
            Self::BranchCreated => "branch_created",
            Self::FixesApplied => "fixes_applied",
            Self::DiffChecked => "diff_checked",
            Self::Committed => "committed",
            Self::Pushed => "pushed",
            Self::RemoteUnitOpened => "remote_unit_opened",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationResult {
    /// The fixers produced no diff.
    NoChanges,
    Opened {
        number: u64,
        html_url: String,
    },
    /// `stage` is the state the workflow failed to reach.
    Failed {
        stage: RemediationState,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationOutcome {
    pub branch: String,
    pub result: RemediationResult,
    /// States visited, starting and ending at `Baseline`.
    pub trail: Vec<RemediationState>,
}

impl RemediationOutcome {
    pub fn summary(&self) -> RemediationSummary {
        match &self.result {
            RemediationResult::NoChanges => RemediationSummary::NoChanges,
            RemediationResult::Opened { number, .. } => RemediationSummary::Opened {
                number: *number,
                branch: self.branch.clone(),
            },
            RemediationResult::Failed { stage, error } => RemediationSummary::Failed {
                stage: stage.to_string(),
                error: error.clone(),
            },
        }
    }
}

/// Remediation runs only for passing units that are large enough to be worth
/// a mechanical clean-up.
pub fn should_remediate(
    tests_passed: bool,
    enabled: bool,
    analysis: &AnalysisResult,
    config: &RemediationConfig,
) -> bool {
    tests_passed
        && enabled
        && (analysis.file_count > config.min_files || analysis.additions > config.min_additions)
}

// ---------------------------------------------------------------------------
// RemediationWorkflow
// ---------------------------------------------------------------------------

pub struct RemediationWorkflow {
    git: Git,
    tracker: Arc<dyn UnitTracker>,
    branch_prefix: String,
    config: RemediationConfig,
}

impl RemediationWorkflow {
    pub fn new(
        git: Git,
        tracker: Arc<dyn UnitTracker>,
        branch_prefix: impl Into<String>,
        config: RemediationConfig,
    ) -> Self {
        Self {
            git,
            tracker,
            branch_prefix: branch_prefix.into(),
            config,
        }
    }

    pub fn config(&self) -> &RemediationConfig {
        &self.config
    }

    /// `<prefix>/fix-unit-<n>-<yyyymmddHHMMSS>`
    pub fn branch_name(prefix: &str, number: u64, at: DateTime<Utc>) -> String {
        format!("{prefix}/fix-unit-{number}-{}", at.format("%Y%m%d%H%M%S"))
    }

    pub async fn run(&self, unit: &ChangeUnit, suggestions: &[Suggestion]) -> RemediationOutcome {
        let branch = Self::branch_name(&self.branch_prefix, unit.number, Utc::now());
        let mut trail = vec![RemediationState::Baseline];
        info!(unit = unit.number, %branch, "remediation started");

        let result = self.attempt(unit, suggestions, &branch, &mut trail).await;
        trail.push(RemediationState::Baseline);

        match &result {
            RemediationResult::Opened { number, html_url } => {
                info!(unit = unit.number, opened = number, %html_url, "remediation unit opened")
            }
            RemediationResult::NoChanges => info!(unit = unit.number, "fixers produced no changes"),
            RemediationResult::Failed { stage, error } => {
                error!(unit = unit.number, %stage, %error, "remediation failed")
            }
        }

        RemediationOutcome {
            branch,
            result,
            trail,
        }
    }

    async fn attempt(
        &self,
        unit: &ChangeUnit,
        suggestions: &[Suggestion],
        branch: &str,
        trail: &mut Vec<RemediationState>,
    ) -> RemediationResult {
        use RemediationState::*;

        let failed = |stage, error: String| RemediationResult::Failed { stage, error };

        // Restores the baseline on every return below.
        let scope = self.git.scope();

        let unit_ref = Git::unit_ref(&self.branch_prefix, unit.number);
        let created = self
            .git
            .fetch_unit(unit.number, &unit_ref)
            .and_then(|()| self.git.create_branch(branch, &unit_ref));
        if let Err(e) = created {
            return failed(BranchCreated, e.to_string());
        }
        trail.push(BranchCreated);

        self.apply_fixes();
        trail.push(FixesApplied);

        match self.git.has_changes() {
            Ok(true) => trail.push(DiffChecked),
            Ok(false) => {
                trail.push(DiffChecked);
                return RemediationResult::NoChanges;
            }
            Err(e) => return failed(DiffChecked, e.to_string()),
        }

        let committed = self
            .git
            .add_all()
            .and_then(|()| self.git.commit(&self.config.commit_message(unit.number)));
        if let Err(e) = committed {
            return failed(Committed, e.to_string());
        }
        trail.push(Committed);

        if let Err(e) = self.git.push(branch) {
            return failed(Pushed, e.to_string());
        }
        trail.push(Pushed);

        let request = NewUnit {
            title: format!("Automated fixes for #{}", unit.number),
            head: branch.to_string(),
            base: unit.source_branch.clone(),
            body: qg_analyzer::description::render(unit.number, suggestions),
        };
        let opened = match self.tracker.open_unit(request).await {
            Ok(opened) => opened,
            Err(e) => return failed(RemoteUnitOpened, e.to_string()),
        };
        trail.push(RemoteUnitOpened);

        if let Err(e) = scope.restore() {
            error!(error = %e, "failed to restore baseline after remediation");
        }
        RemediationResult::Opened {
            number: opened.number,
            html_url: opened.html_url,
        }
    }

    /// Formatter then lint auto-fix; failures are logged and ignored.
    fn apply_fixes(&self) {
        for (label, command) in [
            ("formatter", &self.config.formatter_command),
            ("lint-fix", &self.config.lint_fix_command),
        ] {
            if command.is_empty() {
                continue;
            }
            match self.git.runner().run_line(self.git.repo_dir(), command) {
                Ok(output) if output.success() => info!(fixer = label, "fixer applied"),
                Ok(output) => warn!(
                    fixer = label,
                    detail = %output.failure_detail(),
                    "fixer exited non-zero, continuing"
                ),
                Err(e) => warn!(fixer = label, error = %e, "fixer could not run, continuing"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn analysis(file_count: usize, additions: u64) -> AnalysisResult {
        AnalysisResult {
            file_count,
            additions,
            ..Default::default()
        }
    }

    #[test]
    fn branch_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            RemediationWorkflow::branch_name("qgate", 42, at),
            "qgate/fix-unit-42-20240309140507"
        );
    }

    #[test]
    fn trigger_predicate() {
        let cfg = RemediationConfig::default();
        assert!(should_remediate(true, true, &analysis(11, 0), &cfg));
        assert!(should_remediate(true, true, &analysis(1, 201), &cfg));
        assert!(!should_remediate(true, true, &analysis(10, 200), &cfg));
        assert!(!should_remediate(false, true, &analysis(50, 5000), &cfg));
        assert!(!should_remediate(true, false, &analysis(50, 5000), &cfg));
    }

    #[test]
    fn summary_uses_stage_names() {
        let outcome = RemediationOutcome {
            branch: "qgate/fix-unit-1-20240101000000".into(),
            result: RemediationResult::Failed {
                stage: RemediationState::Pushed,
                error: "rejected".into(),
            },
            trail: vec![RemediationState::Baseline],
        };
        assert_eq!(
            outcome.summary(),
            RemediationSummary::Failed {
                stage: "pushed".into(),
                error: "rejected".into()
            }
        );
    }
}
