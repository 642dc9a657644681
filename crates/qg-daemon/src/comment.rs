//! Markdown bodies for the report comment posted on each tested unit.

use std::fmt::Write;

use qg_core::types::{CheckStatus, PipelineRun};
use qg_harness::harness::HarnessOutcome;

/// Render the pass or fail comment for a harness run.
pub fn render_report(run: &PipelineRun, outcome: &HarnessOutcome) -> String {
    if outcome.passed {
        render_pass(run, outcome)
    } else {
        render_fail(run, outcome)
    }
}

fn render_pass(run: &PipelineRun, outcome: &HarnessOutcome) -> String {
    let mut out = String::from("## ✅ Quality gate passed\n\n");
    write_stats(&mut out, run);

    let _ = writeln!(out, "\n| Check | Status | Duration |");
    out.push_str("|---|---|---|\n");
    for check in &outcome.checks {
        let status = match check.status {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
        };
        let _ = writeln!(out, "| {} | {status} | {} ms |", check.name, check.duration_ms);
    }
    out
}

fn render_fail(run: &PipelineRun, outcome: &HarnessOutcome) -> String {
    let mut out = String::from("## ❌ Quality gate failed\n\n");
    let _ = writeln!(
        out,
        "{} of {} checks ran.\n\n**Errors:**\n",
        outcome.executed(),
        outcome.declared
    );
    for error in &outcome.errors {
        let _ = writeln!(out, "- `{error}`");
    }
    out.push('\n');
    write_stats(&mut out, run);
    out
}

fn write_stats(out: &mut String, run: &PipelineRun) {
    let a = &run.analysis;
    let _ = writeln!(out, "- **Files changed:** {}", a.file_count);
    let _ = writeln!(
        out,
        "- **Lines changed:** {} (+{} / -{})",
        a.changed_lines(),
        a.additions,
        a.deletions
    );
    let _ = writeln!(out, "- **Test files:** {}", a.test_files.len());

    if !a.critical_files.is_empty() {
        let _ = writeln!(out, "\n**Critical files:**\n");
        for path in &a.critical_files {
            let _ = writeln!(out, "- `{path}`");
        }
    }
}

#[cfg(test)]
mod tests {
    use qg_core::types::{AnalysisResult, ChangedFile, CheckResult};

    use super::*;

    fn run_with(paths: &[&str]) -> PipelineRun {
        let files: Vec<ChangedFile> = paths
            .iter()
            .map(|p| ChangedFile {
                path: p.to_string(),
                status: "added".into(),
                additions: 10,
                deletions: 1,
            })
            .collect();
        PipelineRun::new(7, AnalysisResult::from_files(&files))
    }

    fn check(name: &str, status: CheckStatus) -> CheckResult {
        CheckResult {
            name: name.into(),
            status,
            duration_ms: 12,
            critical: true,
            error: None,
        }
    }

    #[test]
    fn pass_comment_lists_stats_and_checks() {
        let run = run_with(&["src/a.ts", "db/migrations/001_init.sql", "src/a.test.ts"]);
        let outcome = HarnessOutcome {
            checks: vec![check("build", CheckStatus::Passed), check("lint", CheckStatus::Passed)],
            passed: true,
            errors: vec![],
            declared: 2,
        };
        let body = render_report(&run, &outcome);
        assert!(body.contains("Quality gate passed"));
        assert!(body.contains("**Files changed:** 3"));
        assert!(body.contains("(+30 / -3)"));
        assert!(body.contains("**Test files:** 1"));
        assert!(body.contains("`db/migrations/001_init.sql`"));
        assert!(body.contains("| build | passed | 12 ms |"));
        assert!(body.contains("| lint | passed | 12 ms |"));
    }

    #[test]
    fn fail_comment_lists_errors() {
        let run = run_with(&["src/a.ts"]);
        let outcome = HarnessOutcome {
            checks: vec![check("build", CheckStatus::Failed)],
            passed: false,
            errors: vec!["build: exited with code 2".into()],
            declared: 5,
        };
        let body = render_report(&run, &outcome);
        assert!(body.contains("Quality gate failed"));
        assert!(body.contains("1 of 5 checks ran"));
        assert!(body.contains("- `build: exited with code 2`"));
        assert!(!body.contains("| Check |"));
    }
}
