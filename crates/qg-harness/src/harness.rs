use std::path::PathBuf;
use std::time::Instant;

use qg_core::config::{CheckSpec, OutputPolicy};
use qg_core::git::{BranchGuard, Git};
use qg_core::process::ToolOutput;
use qg_core::types::{ChangeUnit, CheckResult, CheckStatus};
use tracing::{debug, error, info, warn};

use crate::lint_output::{self, LintVerdict};
use crate::report::ReportArtifact;

// ---------------------------------------------------------------------------
// HarnessOutcome
// ---------------------------------------------------------------------------

/// Result of one harness run against a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessOutcome {
    /// One result per executed check, in execution order.
    pub checks: Vec<CheckResult>,
    /// `false` when setup failed or a critical check failed.
    pub passed: bool,
    /// `"<name>: <detail>"` for every failure, setup included.
    pub errors: Vec<String>,
    /// Number of checks configured, executed or not.
    pub declared: usize,
}

impl HarnessOutcome {
    fn setup_failed(declared: usize, detail: String) -> Self {
        Self {
            checks: Vec::new(),
            passed: false,
            errors: vec![format!("setup: {detail}")],
            declared,
        }
    }

    pub fn executed(&self) -> usize {
        self.checks.len()
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

/// Runs the configured checks, in order, on a unit's checkout.
///
/// A failing critical check stops the run; advisory failures are recorded
/// and execution continues. The working tree is back on the baseline branch
/// whenever [`run`](Self::run) returns.
pub struct TestHarness {
    git: Git,
    branch_prefix: String,
    checks: Vec<CheckSpec>,
    report_path: Option<PathBuf>,
}

impl TestHarness {
    pub fn new(git: Git, branch_prefix: impl Into<String>, checks: Vec<CheckSpec>) -> Self {
        Self {
            git,
            branch_prefix: branch_prefix.into(),
            checks,
            report_path: None,
        }
    }

    /// Write a [`ReportArtifact`] to `path` after every run.
    pub fn with_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    pub fn checks(&self) -> &[CheckSpec] {
        &self.checks
    }

    /// Fetch and check out the unit, returning the scope that restores the
    /// baseline branch.
    pub fn checkout_unit(&self, number: u64) -> qg_core::git::Result<BranchGuard<'_>> {
        let unit_ref = Git::unit_ref(&self.branch_prefix, number);
        let scope = self.git.scope();
        self.git.fetch_unit(number, &unit_ref)?;
        self.git.checkout(&unit_ref)?;
        debug!(unit = number, branch = %unit_ref, "unit checked out");
        Ok(scope)
    }

    pub fn run(&self, unit: &ChangeUnit) -> HarnessOutcome {
        let declared = self.checks.len();
        info!(unit = unit.number, checks = declared, "starting test harness");

        let outcome = match self.checkout_unit(unit.number) {
            Ok(scope) => {
                let outcome = self.run_checks(declared);
                if let Err(e) = scope.restore() {
                    error!(unit = unit.number, error = %e, "failed to restore baseline after checks");
                }
                outcome
            }
            Err(e) => {
                error!(unit = unit.number, error = %e, "harness setup failed");
                HarnessOutcome::setup_failed(declared, e.to_string())
            }
        };

        info!(
            unit = unit.number,
            passed = outcome.passed,
            executed = outcome.executed(),
            declared,
            "test harness finished"
        );
        self.write_report(unit.number, &outcome);
        outcome
    }

    fn run_checks(&self, declared: usize) -> HarnessOutcome {
        let mut outcome = HarnessOutcome {
            checks: Vec::with_capacity(declared),
            passed: true,
            errors: Vec::new(),
            declared,
        };

        for spec in &self.checks {
            let result = qg_telemetry::spans::check_span(&spec.name, spec.critical)
                .in_scope(|| self.run_check(spec));

            if let Some(detail) = &result.error {
                outcome.errors.push(format!("{}: {detail}", spec.name));
            }
            let abort = spec.critical && !result.passed();
            outcome.checks.push(result);

            if abort {
                warn!(check = %spec.name, "critical check failed, skipping remaining checks");
                outcome.passed = false;
                break;
            }
        }

        outcome
    }

    fn run_check(&self, spec: &CheckSpec) -> CheckResult {
        let start = Instant::now();
        let error = match self
            .git
            .runner()
            .run_line(self.git.repo_dir(), &spec.command)
        {
            Ok(output) => evaluate(spec.policy, &output),
            Err(e) => Some(e.to_string()),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let status = if error.is_none() {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        match &error {
            None => info!(check = %spec.name, duration_ms, "check passed"),
            Some(detail) if spec.critical => {
                error!(check = %spec.name, duration_ms, %detail, "critical check failed")
            }
            Some(detail) => warn!(check = %spec.name, duration_ms, %detail, "advisory check failed"),
        }

        CheckResult {
            name: spec.name.clone(),
            status,
            duration_ms,
            critical: spec.critical,
            error,
        }
    }

    fn write_report(&self, unit: u64, outcome: &HarnessOutcome) {
        let Some(path) = &self.report_path else {
            return;
        };
        match ReportArtifact::new(unit, outcome).write(path) {
            Ok(()) => debug!(path = %path.display(), "report written"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write report"),
        }
    }
}

/// Decide a check's failure detail from its process result; `None` = passed.
pub fn evaluate(policy: OutputPolicy, output: &ToolOutput) -> Option<String> {
    if output.success() {
        return None;
    }
    match policy {
        OutputPolicy::ExitCode => Some(output.failure_detail()),
        OutputPolicy::WarningsTolerated => match lint_output::classify(&output.combined()) {
            LintVerdict::Clean => {
                debug!(exit_code = output.exit_code, "non-zero exit with warnings only");
                None
            }
            LintVerdict::Errors(n) => Some(format!("{n} error(s) reported, {}", output.failure_detail())),
            LintVerdict::NoOutput => Some(output.failure_detail()),
        },
    }
}
