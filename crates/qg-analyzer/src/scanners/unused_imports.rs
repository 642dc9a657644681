use std::path::{Path, PathBuf};
use std::sync::Arc;

use qg_core::process::CommandRunner;
use qg_core::types::{Severity, Suggestion, SuggestionKind};
use serde::Deserialize;
use tracing::debug;

use crate::analyzer::{relative_path, ScanError, Scanner, SourceFile};

const NAME: &str = "unused-import";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LintFile {
    file_path: String,
    #[serde(default)]
    messages: Vec<LintMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LintMessage {
    rule_id: Option<String>,
    message: String,
    line: Option<usize>,
}

impl LintMessage {
    fn is_unused_binding(&self) -> bool {
        let rule = self.rule_id.as_deref().unwrap_or_default();
        rule.ends_with("no-unused-vars")
            && (self.message.contains("import") || self.message.contains("defined but never used"))
    }
}

/// Reports unused imports using the project's own linter.
///
/// Runs the configured command (ESLint with `--format json`) from the
/// repository root; the scanned files are not inspected directly.
pub struct UnusedImportScanner {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    command: Vec<String>,
}

impl UnusedImportScanner {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>, command: Vec<String>) -> Self {
        Self {
            runner,
            root: root.into(),
            command,
        }
    }

    fn parse(&self, stdout: &str) -> Result<Vec<Suggestion>, ScanError> {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Err(ScanError::Output {
                scanner: NAME,
                message: "no output".into(),
            });
        }

        let report: Vec<LintFile> = serde_json::from_str(trimmed).map_err(|e| ScanError::Output {
            scanner: NAME,
            message: e.to_string(),
        })?;

        let mut out = Vec::new();
        for file in report {
            let findings: Vec<&LintMessage> =
                file.messages.iter().filter(|m| m.is_unused_binding()).collect();
            let Some(first) = findings.first() else {
                continue;
            };
            let path = relative_path(&self.root, Path::new(&file.file_path));
            out.push(
                Suggestion::new(
                    SuggestionKind::Cleanup,
                    Severity::Low,
                    format!("{} unused import(s) or binding(s)", findings.len()),
                    "Remove the unused imports and variables",
                )
                .at(path, first.line),
            );
        }
        Ok(out)
    }
}

impl Scanner for UnusedImportScanner {
    fn name(&self) -> &'static str {
        NAME
    }

    fn scan(&self, _files: &[SourceFile]) -> Result<Vec<Suggestion>, ScanError> {
        let output = self
            .runner
            .run_line(&self.root, &self.command)
            .map_err(|source| ScanError::Tool {
                scanner: NAME,
                source,
            })?;
        // the rule is promoted to error, so a non-zero exit is expected
        debug!(exit_code = output.exit_code, "unused-import lint finished");
        self.parse(&output.stdout)
    }
}
