use std::sync::Arc;

use chrono::Utc;
use qg_core::config::{CheckSpec, OutputPolicy};
use qg_core::fakes::ScriptedRunner;
use qg_core::git::Git;
use qg_core::process::ToolOutput;
use qg_core::types::ChangeUnit;
use qg_harness::report::ReportArtifact;
use qg_harness::TestHarness;

// ===========================================================================
// Test helpers
// ===========================================================================

fn unit(number: u64) -> ChangeUnit {
    ChangeUnit {
        number,
        title: format!("Unit {number}"),
        source_branch: "feature/login".to_string(),
        base_branch: "main".to_string(),
        author: "dev".to_string(),
        created_at: Utc::now(),
        html_url: format!("https://github.com/acme/shop/pull/{number}"),
    }
}

fn harness(runner: &Arc<ScriptedRunner>, checks: Vec<CheckSpec>) -> TestHarness {
    let git = Git::new(runner.clone(), "/repo", "origin", "main");
    TestHarness::new(git, "qgate", checks)
}

fn five_checks() -> Vec<CheckSpec> {
    vec![
        CheckSpec::critical("install", &["npm", "ci"]),
        CheckSpec::critical("build", &["npm", "run", "build"]),
        CheckSpec::advisory("lint", &["npx", "eslint", "."]),
        CheckSpec::critical("type-check", &["npx", "tsc"]),
        CheckSpec::critical("test", &["npm", "test"]),
    ]
}

// ===========================================================================
// Ordering and abort semantics
// ===========================================================================

#[test]
fn all_checks_pass() {
    let runner = Arc::new(ScriptedRunner::new("main"));
    let outcome = harness(&runner, five_checks()).run(&unit(1));

    assert!(outcome.passed);
    assert_eq!(outcome.checks.len(), 5);
    assert!(outcome.errors.is_empty());
    let names: Vec<&str> = outcome.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["install", "build", "lint", "type-check", "test"]);
}

#[test]
fn critical_failure_at_second_check_stops_the_run() {
    let runner = Arc::new(ScriptedRunner::new("main").fail(
        &["npm", "run", "build"],
        1,
        "Module not found: ./missing",
    ));
    let outcome = harness(&runner, five_checks()).run(&unit(2));

    assert!(!outcome.passed);
    assert_eq!(outcome.checks.len(), 2);
    assert!(outcome.checks[0].passed());
    assert!(!outcome.checks[1].passed());
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("build: "));
    assert!(!runner.ran(&["npx", "tsc"]));
    assert_eq!(runner.current_branch(), "main");
}

#[test]
fn advisory_failures_are_recorded_but_do_not_fail_the_run() {
    let checks = vec![
        CheckSpec::critical("build", &["npm", "run", "build"]),
        CheckSpec::advisory("lint", &["npx", "eslint", "."]),
        CheckSpec::advisory("audit", &["npm", "audit"]),
        CheckSpec::critical("test", &["npm", "test"]),
    ];
    let runner = Arc::new(
        ScriptedRunner::new("main")
            .fail(&["npx", "eslint"], 1, "2 errors")
            .fail(&["npm", "audit"], 1, "high severity vulnerability"),
    );
    let outcome = harness(&runner, checks).run(&unit(3));

    assert!(outcome.passed);
    assert_eq!(outcome.checks.len(), 4);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].starts_with("lint: "));
    assert!(outcome.errors[1].starts_with("audit: "));
}

#[test]
fn lint_warnings_are_tolerated_under_policy() {
    let warnings_only = ToolOutput {
        exit_code: 1,
        stdout: r#"[{"filePath":"/repo/src/a.ts","errorCount":0,"warningCount":4,"messages":[]}]"#
            .to_string(),
        stderr: String::new(),
    };
    let checks = vec![CheckSpec::critical("lint", &["npx", "eslint", "."])
        .with_policy(OutputPolicy::WarningsTolerated)];
    let runner = Arc::new(ScriptedRunner::new("main").on(&["npx", "eslint"], warnings_only));

    let outcome = harness(&runner, checks).run(&unit(4));
    assert!(outcome.passed);
    assert!(outcome.checks[0].passed());
}

#[test]
fn missing_tool_fails_the_check_with_spawn_detail() {
    let runner = Arc::new(ScriptedRunner::new("main").spawn_error(&["npm", "ci"]));
    let outcome = harness(&runner, five_checks()).run(&unit(5));

    assert!(!outcome.passed);
    assert_eq!(outcome.checks.len(), 1);
    let detail = outcome.checks[0].error.as_deref().unwrap();
    assert!(detail.contains("failed to spawn `npm`"));
}

// ===========================================================================
// Branch restoration
// ===========================================================================

#[test]
fn checks_run_on_the_unit_ref_and_baseline_is_restored() {
    let runner = Arc::new(ScriptedRunner::new("main"));
    harness(&runner, five_checks()).run(&unit(9));

    let commands = runner.commands();
    let fetch = commands
        .iter()
        .position(|c| c.starts_with(&["git".into(), "fetch".into()]))
        .unwrap();
    let checkout = commands
        .iter()
        .position(|c| c == &["git", "checkout", "qgate/unit-9"])
        .unwrap();
    let install = commands.iter().position(|c| c == &["npm", "ci"]).unwrap();
    assert!(fetch < checkout && checkout < install);
    assert_eq!(commands.last().unwrap(), &["git", "checkout", "main"]);
    assert_eq!(runner.current_branch(), "main");
}

#[test]
fn fetch_failure_is_a_setup_error_and_leaves_baseline() {
    let runner = Arc::new(ScriptedRunner::new("main").fail(
        &["git", "fetch"],
        128,
        "fatal: couldn't find remote ref pull/6/head",
    ));
    let outcome = harness(&runner, five_checks()).run(&unit(6));

    assert!(!outcome.passed);
    assert!(outcome.checks.is_empty());
    assert_eq!(outcome.declared, 5);
    assert!(outcome.errors[0].starts_with("setup: "));
    assert!(!runner.ran(&["npm"]));
    assert_eq!(runner.current_branch(), "main");
}

#[test]
fn checkout_failure_still_restores_baseline() {
    let runner = Arc::new(ScriptedRunner::new("main").fail(
        &["git", "checkout", "qgate/unit-8"],
        1,
        "error: pathspec did not match",
    ));
    let outcome = harness(&runner, five_checks()).run(&unit(8));

    assert!(!outcome.passed);
    assert!(runner.ran(&["git", "checkout", "main"]));
    assert_eq!(runner.current_branch(), "main");
}

// ===========================================================================
// Report artifact
// ===========================================================================

#[test]
fn report_is_written_after_each_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("test-report.json");
    let runner = Arc::new(ScriptedRunner::new("main").fail(&["npm", "run", "build"], 1, "boom"));

    harness(&runner, five_checks())
        .with_report(&path)
        .run(&unit(11));

    let report = ReportArtifact::read(&path).unwrap();
    assert_eq!(report.unit, 11);
    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.skipped, 3);
    assert_eq!(report.summary.pass_rate, 20.0);
    assert_eq!(report.results.len(), 2);

    // overwritten by the next run
    let clean = Arc::new(ScriptedRunner::new("main"));
    harness(&clean, five_checks()).with_report(&path).run(&unit(12));
    let report = ReportArtifact::read(&path).unwrap();
    assert_eq!(report.unit, 12);
    assert_eq!(report.summary.pass_rate, 100.0);
}

#[test]
fn unwritable_report_path_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let runner = Arc::new(ScriptedRunner::new("main"));
    let outcome = harness(&runner, five_checks())
        .with_report(blocker.join("report.json"))
        .run(&unit(13));
    assert!(outcome.passed);
}
