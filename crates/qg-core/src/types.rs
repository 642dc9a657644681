use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChangeUnit
// ---------------------------------------------------------------------------

/// A proposed change tracked by the remote system (a pull request).
///
/// Read-only to the pipeline: only the remote side ever mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeUnit {
    pub number: u64,
    pub title: String,
    /// Head ref the unit proposes to merge.
    pub source_branch: String,
    /// Ref the unit targets.
    pub base_branch: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub html_url: String,
}

/// A file touched by a change unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

const CRITICAL_BASENAMES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.toml",
    "Cargo.lock",
    "Dockerfile",
    "docker-compose.yml",
    "tsconfig.json",
    ".env",
    "Makefile",
];

const CONFIG_SUFFIXES: &[&str] = &[".js", ".ts", ".mjs", ".cjs", ".json"];

const MIGRATION_DIRS: &[&str] = &["migrations", "migration", "migrate"];

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__"];

/// Summary of a unit's file list.
///
/// Derived purely from the changed files; never mutated once computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_count: usize,
    pub additions: u64,
    pub deletions: u64,
    /// Build, config, lock and migration files.
    pub critical_files: BTreeSet<String>,
    pub test_files: BTreeSet<String>,
}

impl AnalysisResult {
    pub fn from_files(files: &[ChangedFile]) -> Self {
        let mut result = AnalysisResult {
            file_count: files.len(),
            ..Default::default()
        };

        for file in files {
            result.additions += file.additions;
            result.deletions += file.deletions;
            if is_critical_path(&file.path) {
                result.critical_files.insert(file.path.clone());
            }
            if is_test_path(&file.path) {
                result.test_files.insert(file.path.clone());
            }
        }

        result
    }

    /// Total changed lines (additions + deletions).
    pub fn changed_lines(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// Returns `true` for build, configuration, lock and migration files.
pub fn is_critical_path(path: &str) -> bool {
    let basename = basename(path);
    if CRITICAL_BASENAMES.contains(&basename) {
        return true;
    }

    if let Some(idx) = basename.find(".config.") {
        let suffix = &basename[idx + ".config".len()..];
        if CONFIG_SUFFIXES.contains(&suffix) {
            return true;
        }
    }

    if path.contains(".github/workflows/") {
        return true;
    }

    if basename.to_ascii_lowercase().contains("migration") {
        return true;
    }

    directories(path).any(|d| MIGRATION_DIRS.iter().any(|m| d.eq_ignore_ascii_case(m)))
}

/// Returns `true` for test sources.
pub fn is_test_path(path: &str) -> bool {
    let basename = basename(path);
    if basename.contains(".test.") || basename.contains(".spec.") {
        return true;
    }

    if let Some((stem, _ext)) = basename.rsplit_once('.') {
        if stem.ends_with("_test") {
            return true;
        }
    }

    directories(path).any(|d| TEST_DIRS.contains(&d))
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn directories(path: &str) -> impl Iterator<Item = &str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    parts.pop();
    parts.into_iter()
}

// ---------------------------------------------------------------------------
// CheckResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
}

/// Outcome of one executed harness check. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub duration_ms: u64,
    pub critical: bool,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Refactor,
    Improvement,
    Cleanup,
    Consistency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{label}")
    }
}

/// One heuristic finding from the static analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    /// `None` for project-level findings.
    pub file: Option<String>,
    /// 1-based line number.
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
    pub remediation: String,
}

impl Suggestion {
    pub fn new(
        kind: SuggestionKind,
        severity: Severity,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file: None,
            line: None,
            message: message.into(),
            severity,
            remediation: remediation.into(),
        }
    }

    /// Anchor the suggestion at a file and optional line.
    pub fn at(mut self, file: impl Into<String>, line: Option<usize>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

// ---------------------------------------------------------------------------
// PipelineRun
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Passed,
    Failed,
    /// Testing is disabled for new units.
    Skipped,
}

/// What the remediation attempt for a unit ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RemediationSummary {
    Opened { number: u64, branch: String },
    NoChanges,
    Failed { stage: String, error: String },
}

/// Everything one orchestrator invocation produced for a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub unit_number: u64,
    pub analysis: AnalysisResult,
    pub checks: Vec<CheckResult>,
    pub suggestions: Vec<Suggestion>,
    pub outcome: RunOutcome,
    pub remediation: Option<RemediationSummary>,
}

impl PipelineRun {
    pub fn new(unit_number: u64, analysis: AnalysisResult) -> Self {
        Self {
            unit_number,
            analysis,
            checks: Vec::new(),
            suggestions: Vec::new(),
            outcome: RunOutcome::Skipped,
            remediation: None,
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed())
    }
}
