use std::path::Path;

use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The external command could not be run at all.
///
/// A command that runs and exits non-zero is *not* an error: see [`ToolOutput`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// ToolOutput
// ---------------------------------------------------------------------------

/// Captured result of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convenience constructor for an exit code with empty streams.
    pub fn with_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// stdout followed by stderr, for tools that split findings across both.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Short human-readable failure detail (last non-empty stderr/stdout lines).
    pub fn failure_detail(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let tail: Vec<&str> = source
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .rev()
            .take(5)
            .collect();
        if tail.is_empty() {
            return format!("exited with code {}", self.exit_code);
        }
        let mut lines = tail;
        lines.reverse();
        format!("exited with code {}: {}", self.exit_code, lines.join(" | "))
    }
}

// ---------------------------------------------------------------------------
// CommandRunner trait (for testability)
// ---------------------------------------------------------------------------

/// Abstraction over external process execution so it can be mocked in tests.
///
/// Calls block until the process exits.
pub trait CommandRunner: Send + Sync {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ToolOutput, CommandError>;

    /// Run a full command line (first element is the program).
    fn run_line(&self, dir: &Path, command: &[String]) -> Result<ToolOutput, CommandError> {
        let (program, rest) = command.split_first().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.run(dir, program, &args)
    }
}

/// Real runner that shells out via `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ToolOutput, CommandError> {
        debug!(program, ?args, dir = %dir.display(), "running command");

        let output = std::process::Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
